//! Fallback ordering, nesting and policy behaviour with scripted services.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dispatch::{
    FallbackEstimateService, FallbackPolicy, FallbackSearchService, MockEstimateService,
};
use gateway::{
    CallContext, CancelReason, EstimateRequest, EstimateResponse, EstimateService, GatewayError,
    Page, SearchRequest, SearchResponse, SearchService, TransactionId, TransportErrorKind,
};

/// A search service that answers from a script and records every call.
struct Scripted {
    name: &'static str,
    outcome: Result<usize, GatewayError>,
    delay: Duration,
    calls: AtomicU32,
    log: Arc<Mutex<Vec<String>>>,
}

impl Scripted {
    fn new(
        name: &'static str,
        outcome: Result<usize, GatewayError>,
        log: &Arc<Mutex<Vec<String>>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            outcome,
            delay: Duration::from_millis(5),
            calls: AtomicU32::new(0),
            log: Arc::clone(log),
        })
    }
}

#[async_trait]
impl SearchService for Scripted {
    async fn search(
        &self,
        ctx: &CallContext,
        page: Page,
        _request: &SearchRequest,
    ) -> Result<SearchResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:start:{}", self.name, ctx.transaction_id()));
        tokio::time::sleep(self.delay).await;
        self.log.lock().unwrap().push(format!("{}:end", self.name));
        self.outcome.clone().map(|total| SearchResponse {
            total,
            page: page.page,
            per_page: page.per_page,
            catalogs: Vec::new(),
        })
    }
}

fn unavailable() -> GatewayError {
    GatewayError::transport(TransportErrorKind::Unavailable, "connection refused")
}

fn ctx() -> CallContext {
    CallContext::new().with_transaction_id(TransactionId::new("t1").unwrap())
}

#[tokio::test(start_paused = true)]
async fn secondary_runs_after_primary_fails_with_same_context() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = Scripted::new("primary", Err(unavailable()), &log);
    let secondary = Scripted::new("secondary", Ok(7), &log);
    let service = FallbackSearchService::new(primary.clone(), secondary.clone());

    let resp = service
        .search(&ctx(), Page::default(), &SearchRequest::by_evse("evse-1"))
        .await
        .unwrap();

    assert_eq!(resp.total, 7);
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "primary:start:t1".to_string(),
            "primary:end".to_string(),
            "secondary:start:t1".to_string(),
            "secondary:end".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn secondary_is_not_called_when_primary_succeeds() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = Scripted::new("primary", Ok(1), &log);
    let secondary = Scripted::new("secondary", Ok(2), &log);
    let service = FallbackSearchService::new(primary.clone(), secondary.clone());

    let resp = service
        .search(&ctx(), Page::default(), &SearchRequest::by_evse("evse-1"))
        .await
        .unwrap();

    assert_eq!(resp.total, 1);
    assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn secondary_error_is_returned_verbatim() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = Scripted::new("primary", Err(unavailable()), &log);
    let secondary = Scripted::new(
        "secondary",
        Err(GatewayError::business("NO_INVENTORY", "sold out")),
        &log,
    );
    let service = FallbackSearchService::new(primary, secondary);

    let err = service
        .search(&ctx(), Page::default(), &SearchRequest::by_evse("evse-1"))
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::business("NO_INVENTORY", "sold out"));
}

#[tokio::test(start_paused = true)]
async fn chains_nest() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let a = Scripted::new("a", Err(unavailable()), &log);
    let b = Scripted::new("b", Err(unavailable()), &log);
    let c = Scripted::new("c", Ok(3), &log);
    let inner = Arc::new(FallbackSearchService::new(b.clone(), c.clone()));
    let outer = FallbackSearchService::new(a.clone(), inner);

    let resp = outer
        .search(&ctx(), Page::default(), &SearchRequest::by_evse("evse-1"))
        .await
        .unwrap();

    assert_eq!(resp.total, 3);
    for service in [&a, &b, &c] {
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn cancellation_never_falls_back() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = Scripted::new(
        "primary",
        Err(GatewayError::cancelled(CancelReason::Requested)),
        &log,
    );
    let secondary = Scripted::new("secondary", Ok(1), &log);
    let service = FallbackSearchService::new(primary, secondary.clone());

    let err = service
        .search(&ctx(), Page::default(), &SearchRequest::by_evse("evse-1"))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn transport_only_policy_returns_business_errors() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = Scripted::new("primary", Err(GatewayError::business("E1", "rejected")), &log);
    let secondary = Scripted::new("secondary", Ok(1), &log);
    let service = FallbackSearchService::new(primary, secondary.clone())
        .with_policy(FallbackPolicy::TransportOnly);

    let err = service
        .search(&ctx(), Page::default(), &SearchRequest::by_evse("evse-1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), gateway::ErrorKind::Business);
    assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn default_policy_falls_back_on_business_errors() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let primary = Scripted::new("primary", Err(GatewayError::business("E1", "rejected")), &log);
    let secondary = Scripted::new("secondary", Ok(1), &log);
    let service = FallbackSearchService::new(primary, secondary.clone());

    assert!(service
        .search(&ctx(), Page::default(), &SearchRequest::by_evse("evse-1"))
        .await
        .is_ok());
    assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
}

struct FailingEstimate;

#[async_trait]
impl EstimateService for FailingEstimate {
    async fn estimate(
        &self,
        _ctx: &CallContext,
        _request: &EstimateRequest,
    ) -> Result<EstimateResponse, GatewayError> {
        Err(GatewayError::transport(TransportErrorKind::Reset, "stream reset"))
    }
}

#[tokio::test]
async fn estimate_falls_back_to_mock() {
    let service = FallbackEstimateService::new(
        Arc::new(FailingEstimate),
        Arc::new(MockEstimateService::new()),
    );

    let resp = service
        .estimate(&CallContext::new(), &EstimateRequest::default())
        .await
        .unwrap();

    assert_eq!(resp.order.id, "1231208-id");
}

#[tokio::test(start_paused = true)]
async fn translation_errors_never_fall_back() {
    for policy in [FallbackPolicy::AnyError, FallbackPolicy::TransportOnly] {
        let log = Arc::new(Mutex::new(Vec::new()));
        let primary = Scripted::new(
            "primary",
            Err(GatewayError::translation("estimate requires an evse_id")),
            &log,
        );
        let secondary = Scripted::new("secondary", Ok(1), &log);
        let service = FallbackSearchService::new(primary, secondary.clone()).with_policy(policy);

        let err = service
            .search(&ctx(), Page::default(), &SearchRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), gateway::ErrorKind::Translation);
        assert_eq!(err.http_status(), 400);
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }
}

struct UntranslatableEstimate;

#[async_trait]
impl EstimateService for UntranslatableEstimate {
    async fn estimate(
        &self,
        _ctx: &CallContext,
        _request: &EstimateRequest,
    ) -> Result<EstimateResponse, GatewayError> {
        Err(GatewayError::translation("estimate requires an evse_id"))
    }
}

#[tokio::test]
async fn estimate_without_evse_is_not_answered_by_mock() {
    let service = FallbackEstimateService::new(
        Arc::new(UntranslatableEstimate),
        Arc::new(MockEstimateService::new()),
    );

    let err = service
        .estimate(&CallContext::new(), &EstimateRequest::default())
        .await
        .unwrap_err();

    assert_eq!(err.http_status(), 400);
}
