//! Durable capability services over fake transports.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gateway::{
    CallContext, ContextOverrides, ErrorKind, EstimateRequest, EstimateService, GatewayError,
    MessageId, OperationKind, Page, RequestMeta, SearchRequest, SearchService, TaskQueue,
    TransactionId, TransportErrorKind, WorkflowId,
};
use rpc::Transport;
use tokio::time::Instant;
use wire::pb::common::Error;
use wire::pb::discover::{Catalog, DiscoverRequest, OnDiscoverMessage, OnDiscoverResponse};
use wire::pb::select::{OnSelectMessage, OnSelectResponse, Order, SelectRequest};
use workflow::{
    DiscoverOrchestrator, DurableEstimateService, DurableOptions, DurableSearchService,
    OrchestratorConfig, SelectOrchestrator, WorkflowStatus,
};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Fails the first `failures` sends with `Unavailable`, then answers.
struct FlakyDiscover {
    failures: u32,
    delay: Duration,
    calls: AtomicU32,
    seen: Mutex<Vec<(DiscoverRequest, Instant)>>,
}

impl FlakyDiscover {
    fn new(failures: u32, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            failures,
            delay,
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transport<DiscoverRequest, OnDiscoverResponse> for FlakyDiscover {
    fn target(&self) -> &str {
        "flaky-discovery"
    }

    async fn call(&self, request: DiscoverRequest) -> Result<OnDiscoverResponse, GatewayError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let context = request.context.clone();
        self.seen.lock().unwrap().push((request, Instant::now()));
        tokio::time::sleep(self.delay).await;

        if call <= self.failures {
            return Err(GatewayError::transport(
                TransportErrorKind::Unavailable,
                "connection refused",
            ));
        }
        Ok(OnDiscoverResponse {
            context,
            message: Some(OnDiscoverMessage {
                catalogs: vec![Catalog {
                    id: "catalog-1".into(),
                    ..Catalog::default()
                }],
            }),
            error: None,
        })
    }
}

/// Answers every select with an error block.
struct RejectingSelect {
    calls: AtomicU32,
}

#[async_trait]
impl Transport<SelectRequest, OnSelectResponse> for RejectingSelect {
    fn target(&self) -> &str {
        "rejecting-select"
    }

    async fn call(&self, request: SelectRequest) -> Result<OnSelectResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(OnSelectResponse {
            context: request.context,
            message: None,
            error: Some(Error {
                code: "OFFER_EXPIRED".into(),
                message: "offer is no longer valid".into(),
                http_status: 409,
            }),
        })
    }
}

/// Answers every select with a fixed order.
struct QuotingSelect;

#[async_trait]
impl Transport<SelectRequest, OnSelectResponse> for QuotingSelect {
    fn target(&self) -> &str {
        "quoting-select"
    }

    async fn call(&self, request: SelectRequest) -> Result<OnSelectResponse, GatewayError> {
        Ok(OnSelectResponse {
            context: request.context,
            message: Some(OnSelectMessage {
                order: Some(Order {
                    id: "order-7".into(),
                    order_status: "quoted_price".into(),
                    ..Order::default()
                }),
            }),
            error: None,
        })
    }
}

fn discover_orchestrator(transport: Arc<FlakyDiscover>) -> Arc<DiscoverOrchestrator> {
    Arc::new(DurableSearchService::orchestrator(
        transport,
        OrchestratorConfig::default(),
    ))
}

fn select_orchestrator(
    transport: Arc<dyn Transport<SelectRequest, OnSelectResponse>>,
) -> Arc<SelectOrchestrator> {
    Arc::new(DurableEstimateService::orchestrator(
        transport,
        OrchestratorConfig::default(),
    ))
}

fn durable_options() -> DurableOptions {
    DurableOptions {
        task_queue: TaskQueue::new("ev-gateway").unwrap(),
        execution_timeout: None,
        overrides: ContextOverrides::default(),
    }
}

fn t1_m1() -> RequestMeta {
    RequestMeta {
        transaction_id: TransactionId::new("t1"),
        message_id: MessageId::new("m1"),
        ..RequestMeta::default()
    }
}

fn nearby_search() -> SearchRequest {
    SearchRequest {
        meta: t1_m1(),
        ..SearchRequest::near(12.9716, 77.5946, 5000.0)
    }
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn persistent_transport_failure_fails_after_three_attempts() {
    let transport = FlakyDiscover::new(u32::MAX, Duration::ZERO);
    let orchestrator = discover_orchestrator(transport.clone());
    let service = DurableSearchService::new(Arc::clone(&orchestrator), durable_options());

    let err = service
        .search(&CallContext::new(), Page::default(), &nearby_search())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 3);

    let id = WorkflowId::derive(
        OperationKind::Discovery,
        &TransactionId::new("t1").unwrap(),
        &MessageId::new("m1").unwrap(),
    );
    assert_eq!(id.as_str(), "discovery-t1-m1");
    assert!(matches!(
        orchestrator.status(&id),
        Some(WorkflowStatus::Failed { .. })
    ));

    let seen = transport.seen.lock().unwrap();
    let message_ids: Vec<String> = seen
        .iter()
        .map(|(req, _)| req.context.as_ref().unwrap().message_id.clone())
        .collect();
    assert_eq!(message_ids[0], "m1");
    assert_ne!(message_ids[1], message_ids[0]);
    assert_ne!(message_ids[2], message_ids[1]);

    for (request, _) in seen.iter() {
        assert_eq!(request.context.as_ref().unwrap().transaction_id, "t1");
        let message = request.message.as_ref().unwrap();
        assert_eq!(
            message.geometry.as_ref().unwrap().coordinates,
            vec![12.9716, 77.5946]
        );
        assert_eq!(message.distance_meters, Some(5000.0));
    }

    let first_gap = seen[1].1 - seen[0].1;
    let second_gap = seen[2].1 - seen[1].1;
    assert!(first_gap >= Duration::from_secs(1) && first_gap < Duration::from_millis(1100));
    assert!(second_gap >= Duration::from_secs(2) && second_gap < Duration::from_millis(2100));
}

#[tokio::test(start_paused = true)]
async fn transient_failure_recovers_on_retry() {
    let transport = FlakyDiscover::new(1, Duration::ZERO);
    let service =
        DurableSearchService::new(discover_orchestrator(transport.clone()), durable_options());

    let response = service
        .search(&CallContext::new(), Page::new(Some(2), Some(10)), &nearby_search())
        .await
        .unwrap();

    assert_eq!(response.total, 1);
    assert_eq!(response.page, 2);
    assert_eq!(response.per_page, 10);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_identical_requests_share_one_execution() {
    let transport = FlakyDiscover::new(0, Duration::from_millis(100));
    let service =
        DurableSearchService::new(discover_orchestrator(transport.clone()), durable_options());
    let ctx = CallContext::new();
    let request = nearby_search();

    let (a, b) = tokio::join!(
        service.search(&ctx, Page::default(), &request),
        service.search(&ctx, Page::default(), &request),
    );

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn untranslatable_search_never_submits() {
    let transport = FlakyDiscover::new(0, Duration::ZERO);
    let service =
        DurableSearchService::new(discover_orchestrator(transport.clone()), durable_options());

    let err = service
        .search(&CallContext::new(), Page::default(), &SearchRequest::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Translation);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Estimate
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn estimate_business_error_is_not_retried() {
    let transport = Arc::new(RejectingSelect {
        calls: AtomicU32::new(0),
    });
    let service =
        DurableEstimateService::new(select_orchestrator(transport.clone()), durable_options());
    let request = EstimateRequest {
        evse_id: "evse-1".into(),
        ..EstimateRequest::default()
    };

    let err = service
        .estimate(&CallContext::new(), &request)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::Business {
            code: "OFFER_EXPIRED".into(),
            message: "offer is no longer valid".into(),
            status: Some(409),
        }
    );
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn estimate_translates_the_order_back() {
    let service = DurableEstimateService::new(
        select_orchestrator(Arc::new(QuotingSelect)),
        durable_options(),
    );
    let request = EstimateRequest {
        evse_id: "evse-1".into(),
        ..EstimateRequest::default()
    };

    let response = service.estimate(&CallContext::new(), &request).await.unwrap();

    assert_eq!(response.order.id, "order-7");
    assert_eq!(response.order.status, "quoted_price");
}
