//! Invoker race semantics and the gRPC-backed services, against fake
//! transports on paused time.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gateway::{
    CallContext, CancelReason, ContextOverrides, ErrorKind, GatewayError, Page, SearchRequest,
    SearchService, TransactionId, TransportErrorKind,
};
use rpc::{GrpcSearchService, Invoker, Transport};
use wire::pb::common::{Context, Error};
use wire::pb::discover::{Catalog, DiscoverRequest, OnDiscoverMessage, OnDiscoverResponse};

// ---------------------------------------------------------------------------
// Fake transport
// ---------------------------------------------------------------------------

enum Reply {
    Catalogs(usize),
    Business(&'static str),
    Fail(TransportErrorKind),
}

struct FakeDiscover {
    delay: Duration,
    reply: Reply,
    calls: AtomicU32,
    completed: AtomicU32,
    seen: Mutex<Vec<DiscoverRequest>>,
}

impl FakeDiscover {
    fn new(delay: Duration, reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            delay,
            reply,
            calls: AtomicU32::new(0),
            completed: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transport<DiscoverRequest, OnDiscoverResponse> for FakeDiscover {
    fn target(&self) -> &str {
        "fake-discovery"
    }

    async fn call(&self, request: DiscoverRequest) -> Result<OnDiscoverResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let context = request.context.clone();
        self.seen.lock().unwrap().push(request);
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);

        match &self.reply {
            Reply::Catalogs(n) => Ok(OnDiscoverResponse {
                context,
                message: Some(OnDiscoverMessage {
                    catalogs: (0..*n)
                        .map(|i| Catalog {
                            id: format!("catalog-{i}"),
                            ..Catalog::default()
                        })
                        .collect(),
                }),
                error: None,
            }),
            Reply::Business(code) => Ok(OnDiscoverResponse {
                context,
                message: None,
                error: Some(Error {
                    code: code.to_string(),
                    message: "rejected by provider".into(),
                    http_status: 0,
                }),
            }),
            Reply::Fail(kind) => Err(GatewayError::transport(*kind, "fake failure")),
        }
    }
}

fn invoker(fake: &Arc<FakeDiscover>) -> Invoker<DiscoverRequest, OnDiscoverResponse> {
    Invoker::new(fake.clone())
}

fn request() -> DiscoverRequest {
    DiscoverRequest {
        context: Some(Context {
            transaction_id: "t1".into(),
            message_id: "m1".into(),
            ..Context::default()
        }),
        message: None,
    }
}

// ---------------------------------------------------------------------------
// Invoker
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn completed_call_returns_its_response() {
    let fake = FakeDiscover::new(Duration::from_millis(50), Reply::Catalogs(2));
    let invoker = invoker(&fake);

    let response = invoker.invoke(&CallContext::new(), request()).await.unwrap();

    assert_eq!(response.message.unwrap().catalogs.len(), 2);
    assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_returns_immediately_and_discards_the_late_result() {
    let fake = FakeDiscover::new(Duration::from_secs(1), Reply::Catalogs(1));
    let invoker = invoker(&fake);
    let ctx = CallContext::new();

    let trigger = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.cancel();
    });

    let started = tokio::time::Instant::now();
    let err = invoker.invoke(&ctx, request()).await.unwrap_err();
    assert_eq!(err, GatewayError::cancelled(CancelReason::Requested));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(fake.completed.load(Ordering::SeqCst), 0);

    // The abandoned call still runs to completion; nobody receives it.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(fake.completed.load(Ordering::SeqCst), 1);
    assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn context_deadline_is_a_transport_deadline_error() {
    let fake = FakeDiscover::new(Duration::from_secs(30), Reply::Catalogs(1));
    let invoker = invoker(&fake);
    let ctx = CallContext::new().with_timeout(Duration::from_secs(15));

    let err = invoker.invoke(&ctx, request()).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(matches!(
        err,
        GatewayError::Transport {
            kind: TransportErrorKind::DeadlineExceeded,
            ..
        }
    ));
    assert!(!ctx.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn completion_before_cancellation_wins() {
    let fake = FakeDiscover::new(Duration::from_millis(10), Reply::Catalogs(1));
    let invoker = invoker(&fake);
    let ctx = CallContext::new();

    let trigger = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.cancel();
    });

    assert!(invoker.invoke(&ctx, request()).await.is_ok());
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(ctx.is_cancelled());
    assert_eq!(fake.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn already_cancelled_context_never_sends() {
    let fake = FakeDiscover::new(Duration::from_millis(10), Reply::Catalogs(1));
    let invoker = invoker(&fake);
    let ctx = CallContext::new();
    ctx.cancel();

    let err = invoker.invoke(&ctx, request()).await.unwrap_err();

    assert!(err.is_cancelled());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn transport_failures_propagate_unchanged() {
    let fake = FakeDiscover::new(
        Duration::from_millis(10),
        Reply::Fail(TransportErrorKind::Unavailable),
    );
    let invoker = invoker(&fake);

    let err = invoker.invoke(&CallContext::new(), request()).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(err.http_status(), 502);
}

// ---------------------------------------------------------------------------
// GrpcSearchService
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn search_service_stamps_context_and_maps_response() {
    let fake = FakeDiscover::new(Duration::from_millis(5), Reply::Catalogs(3));
    let service = GrpcSearchService::new(fake.clone(), ContextOverrides::default());
    let ctx = CallContext::new().with_transaction_id(TransactionId::new("t1").unwrap());

    let response = service
        .search(&ctx, Page::default(), &SearchRequest::near(12.9716, 77.5946, 5000.0))
        .await
        .unwrap();

    assert_eq!(response.total, 3);
    assert_eq!(response.per_page, 20);

    let seen = fake.seen.lock().unwrap();
    let context = seen[0].context.as_ref().unwrap();
    assert_eq!(context.transaction_id, "t1");
    assert!(!context.message_id.is_empty());
    assert_eq!(context.action, "discover");
}

#[tokio::test(start_paused = true)]
async fn search_service_surfaces_business_errors() {
    let fake = FakeDiscover::new(Duration::from_millis(5), Reply::Business("NO_CATALOG"));
    let service = GrpcSearchService::new(fake, ContextOverrides::default());

    let err = service
        .search(&CallContext::new(), Page::default(), &SearchRequest::by_evse("evse-1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Business);
    assert!(!err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn untranslatable_search_is_never_sent() {
    let fake = FakeDiscover::new(Duration::from_millis(5), Reply::Catalogs(1));
    let service = GrpcSearchService::new(fake.clone(), ContextOverrides::default());

    let err = service
        .search(&CallContext::new(), Page::default(), &SearchRequest::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Translation);
    assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
}
