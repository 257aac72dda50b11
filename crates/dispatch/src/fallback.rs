//! Primary/secondary fallback.
//!
//! A fallback service calls its primary with the caller's context. If the
//! primary fails with an error the [`FallbackPolicy`] accepts, the failure is
//! logged at `warn` and the secondary is called with the same request and
//! context; its outcome is returned verbatim. The primary is never retried
//! and the two are never called concurrently.
//!
//! Cancellation and translation failures never fall back. A cancelled caller
//! has stopped waiting, and a request that cannot be translated is invalid
//! for every backend, so both propagate at once.
//!
//! Fallback services implement the capability traits themselves and nest
//! freely.

use std::sync::Arc;

use async_trait::async_trait;
use gateway::{
    CallContext, EstimateRequest, EstimateResponse, EstimateService, GatewayError, Page,
    SearchRequest, SearchResponse, SearchService,
};
use serde::{Deserialize, Serialize};

/// Which primary failures hand the request to the secondary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Transport and business errors.
    #[default]
    AnyError,
    /// Transport errors only; business errors are returned.
    TransportOnly,
}

impl FallbackPolicy {
    /// Returns `true` if `err` from the primary should trigger the secondary.
    pub fn should_fall_back(self, err: &GatewayError) -> bool {
        match err {
            GatewayError::Cancelled { .. } | GatewayError::Translation { .. } => false,
            GatewayError::Transport { .. } => true,
            GatewayError::Business { .. } => self == Self::AnyError,
        }
    }
}

fn log_fallback(operation: &'static str, ctx: &CallContext, err: &GatewayError) {
    tracing::warn!(
        operation,
        transaction_id = %ctx.transaction_id(),
        error_kind = %err.kind(),
        error = %err,
        "Primary service failed, falling back to secondary service"
    );
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

pub struct FallbackSearchService {
    primary: Arc<dyn SearchService>,
    secondary: Arc<dyn SearchService>,
    policy: FallbackPolicy,
}

impl FallbackSearchService {
    pub fn new(primary: Arc<dyn SearchService>, secondary: Arc<dyn SearchService>) -> Self {
        Self {
            primary,
            secondary,
            policy: FallbackPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl SearchService for FallbackSearchService {
    async fn search(
        &self,
        ctx: &CallContext,
        page: Page,
        request: &SearchRequest,
    ) -> Result<SearchResponse, GatewayError> {
        match self.primary.search(ctx, page, request).await {
            Ok(response) => Ok(response),
            Err(err) if self.policy.should_fall_back(&err) => {
                log_fallback("search", ctx, &err);
                self.secondary.search(ctx, page, request).await
            }
            Err(err) => Err(err),
        }
    }
}

// ---------------------------------------------------------------------------
// Estimate
// ---------------------------------------------------------------------------

pub struct FallbackEstimateService {
    primary: Arc<dyn EstimateService>,
    secondary: Arc<dyn EstimateService>,
    policy: FallbackPolicy,
}

impl FallbackEstimateService {
    pub fn new(primary: Arc<dyn EstimateService>, secondary: Arc<dyn EstimateService>) -> Self {
        Self {
            primary,
            secondary,
            policy: FallbackPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[async_trait]
impl EstimateService for FallbackEstimateService {
    async fn estimate(
        &self,
        ctx: &CallContext,
        request: &EstimateRequest,
    ) -> Result<EstimateResponse, GatewayError> {
        match self.primary.estimate(ctx, request).await {
            Ok(response) => Ok(response),
            Err(err) if self.policy.should_fall_back(&err) => {
                log_fallback("estimate", ctx, &err);
                self.secondary.estimate(ctx, request).await
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::{CancelReason, TransportErrorKind};

    #[test]
    fn policy_decisions() {
        let transport = GatewayError::transport(TransportErrorKind::Reset, "reset");
        let business = GatewayError::business("E", "no");
        let translation = GatewayError::translation("bad");
        let cancelled = GatewayError::cancelled(CancelReason::DeadlineExceeded);

        assert!(FallbackPolicy::AnyError.should_fall_back(&transport));
        assert!(FallbackPolicy::AnyError.should_fall_back(&business));
        assert!(!FallbackPolicy::AnyError.should_fall_back(&translation));
        assert!(!FallbackPolicy::AnyError.should_fall_back(&cancelled));

        assert!(FallbackPolicy::TransportOnly.should_fall_back(&transport));
        assert!(!FallbackPolicy::TransportOnly.should_fall_back(&business));
        assert!(!FallbackPolicy::TransportOnly.should_fall_back(&translation));
        assert!(!FallbackPolicy::TransportOnly.should_fall_back(&cancelled));
    }

    #[test]
    fn policy_deserializes_from_snake_case() {
        let policy: FallbackPolicy = serde_json::from_str("\"transport_only\"").unwrap();
        assert_eq!(policy, FallbackPolicy::TransportOnly);
        assert_eq!(FallbackPolicy::default(), FallbackPolicy::AnyError);
    }
}
