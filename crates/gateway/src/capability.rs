//! Capability ports.
//!
//! The gateway exposes two capabilities to its HTTP-facing callers. Each is a
//! dyn-compatible async trait so that the gRPC-backed, mock, fallback and
//! durable variants are interchangeable behind `Arc<dyn …>` and can be
//! nested (a fallback whose primary is a durable service, for instance).

use async_trait::async_trait;

use crate::{
    CallContext, EstimateRequest, EstimateResponse, GatewayError, Page, SearchRequest,
    SearchResponse,
};

/// Charger discovery.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Searches for chargers matching `request`.
    ///
    /// `page` is echoed back in the response.
    ///
    /// # Errors
    ///
    /// Any [`GatewayError`] variant; see the error taxonomy for which layer
    /// produces which.
    async fn search(
        &self,
        ctx: &CallContext,
        page: Page,
        request: &SearchRequest,
    ) -> Result<SearchResponse, GatewayError>;
}

/// Price estimation for a charging session.
#[async_trait]
pub trait EstimateService: Send + Sync {
    /// Requests a quote for `request`.
    ///
    /// # Errors
    ///
    /// Any [`GatewayError`] variant.
    async fn estimate(
        &self,
        ctx: &CallContext,
        request: &EstimateRequest,
    ) -> Result<EstimateResponse, GatewayError>;
}
