//! Capability services backed by a direct RPC.
//!
//! Each call stamps the request, translates it, sends it once through the
//! [`Invoker`], interprets any business error in the response and
//! translates the response back. Failures are logged at `error` and
//! returned unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use gateway::{
    CallContext, ContextOverrides, EstimateRequest, EstimateResponse, EstimateService,
    GatewayError, Page, SearchRequest, SearchResponse, SearchService,
};
use wire::pb::discover::{DiscoverRequest, OnDiscoverResponse};
use wire::pb::select::{OnSelectResponse, SelectRequest};
use wire::{business_error, estimate, search, WireStamp};

use crate::invoker::{Invoker, Transport};

fn log_failure(operation: &'static str, ctx: &CallContext, err: &GatewayError) {
    tracing::error!(
        operation,
        transaction_id = %ctx.transaction_id(),
        error_kind = %err.kind(),
        error = %err,
        "gRPC {operation} call failed"
    );
}

/// Search over `DiscoveryService/Discover`.
pub struct GrpcSearchService {
    invoker: Invoker<DiscoverRequest, OnDiscoverResponse>,
    overrides: ContextOverrides,
}

impl GrpcSearchService {
    pub fn new(
        transport: Arc<dyn Transport<DiscoverRequest, OnDiscoverResponse>>,
        overrides: ContextOverrides,
    ) -> Self {
        Self {
            invoker: Invoker::new(transport),
            overrides,
        }
    }

    async fn run(
        &self,
        ctx: &CallContext,
        page: Page,
        request: &SearchRequest,
    ) -> Result<SearchResponse, GatewayError> {
        let stamp = WireStamp::for_context(ctx);
        let wire_request = search::to_wire(request, &self.overrides, &stamp)?;
        let response = self.invoker.invoke(ctx, wire_request).await?;
        if let Some(err) = business_error(&response) {
            return Err(err);
        }
        Ok(search::to_domain(&response, page))
    }
}

#[async_trait]
impl SearchService for GrpcSearchService {
    async fn search(
        &self,
        ctx: &CallContext,
        page: Page,
        request: &SearchRequest,
    ) -> Result<SearchResponse, GatewayError> {
        self.run(ctx, page, request)
            .await
            .inspect_err(|e| log_failure("search", ctx, e))
    }
}

/// Estimate over `SelectService/Select`.
pub struct GrpcEstimateService {
    invoker: Invoker<SelectRequest, OnSelectResponse>,
    overrides: ContextOverrides,
}

impl GrpcEstimateService {
    pub fn new(
        transport: Arc<dyn Transport<SelectRequest, OnSelectResponse>>,
        overrides: ContextOverrides,
    ) -> Self {
        Self {
            invoker: Invoker::new(transport),
            overrides,
        }
    }

    async fn run(
        &self,
        ctx: &CallContext,
        request: &EstimateRequest,
    ) -> Result<EstimateResponse, GatewayError> {
        let stamp = WireStamp::for_context(ctx);
        let wire_request = estimate::to_wire(request, &self.overrides, &stamp)?;
        let response = self.invoker.invoke(ctx, wire_request).await?;
        if let Some(err) = business_error(&response) {
            return Err(err);
        }
        Ok(estimate::to_domain(&response))
    }
}

#[async_trait]
impl EstimateService for GrpcEstimateService {
    async fn estimate(
        &self,
        ctx: &CallContext,
        request: &EstimateRequest,
    ) -> Result<EstimateResponse, GatewayError> {
        self.run(ctx, request)
            .await
            .inspect_err(|e| log_failure("estimate", ctx, e))
    }
}
