//! Capability services that run each call as a durable execution.
//!
//! The request is translated once, then submitted under a workflow id derived
//! from the operation kind and the wire context's transaction and message
//! ids. Re-submitting the same logical request attaches to the running
//! execution instead of starting a second one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gateway::{
    CallContext, ContextOverrides, EstimateRequest, EstimateResponse, EstimateService,
    GatewayError, MessageId, OperationKind, Page, SearchRequest, SearchResponse, SearchService,
    TaskQueue, TransactionId, WorkflowId,
};
use rpc::{Invoker, Transport};
use wire::pb::discover::{DiscoverRequest, OnDiscoverResponse};
use wire::pb::select::{OnSelectResponse, SelectRequest};
use wire::{estimate, search, WireRequest, WireStamp};

use crate::activity::InvokeActivity;
use crate::orchestrator::{Orchestrator, OrchestratorConfig, StartOptions};

pub type DiscoverOrchestrator = Orchestrator<InvokeActivity<DiscoverRequest, OnDiscoverResponse>>;
pub type SelectOrchestrator = Orchestrator<InvokeActivity<SelectRequest, OnSelectResponse>>;

/// Submission settings shared by both durable services.
#[derive(Debug, Clone)]
pub struct DurableOptions {
    pub task_queue: TaskQueue,
    pub execution_timeout: Option<Duration>,
    pub overrides: ContextOverrides,
}

/// Builds the start options for a translated request.
fn start_options(
    kind: OperationKind,
    request: &impl WireRequest,
    options: &DurableOptions,
) -> Result<StartOptions, GatewayError> {
    let context = request
        .context()
        .ok_or_else(|| GatewayError::translation("translated request has no context"))?;
    let transaction_id = TransactionId::new(context.transaction_id.clone())
        .ok_or_else(|| GatewayError::translation("translated request has no transaction id"))?;
    let message_id = MessageId::new(context.message_id.clone())
        .ok_or_else(|| GatewayError::translation("translated request has no message id"))?;

    let mut start = StartOptions::new(
        WorkflowId::derive(kind, &transaction_id, &message_id),
        options.task_queue.clone(),
    )
    .with_transaction_id(transaction_id);
    start.execution_timeout = options.execution_timeout;
    Ok(start)
}

fn log_failure(operation: &'static str, ctx: &CallContext, err: &GatewayError) {
    tracing::error!(
        operation,
        transaction_id = %ctx.transaction_id(),
        error_kind = %err.kind(),
        error = %err,
        "Durable {operation} failed"
    );
}

// ---------------------------------------------------------------------------

pub struct DurableSearchService {
    orchestrator: Arc<DiscoverOrchestrator>,
    options: DurableOptions,
}

impl DurableSearchService {
    /// An orchestrator whose unit of work is one discover RPC.
    pub fn orchestrator(
        transport: Arc<dyn Transport<DiscoverRequest, OnDiscoverResponse>>,
        config: OrchestratorConfig,
    ) -> DiscoverOrchestrator {
        Orchestrator::new(InvokeActivity::new("discover", Invoker::new(transport)), config)
    }

    pub fn new(orchestrator: Arc<DiscoverOrchestrator>, options: DurableOptions) -> Self {
        Self {
            orchestrator,
            options,
        }
    }

    async fn run(
        &self,
        ctx: &CallContext,
        page: Page,
        request: &SearchRequest,
    ) -> Result<SearchResponse, GatewayError> {
        let stamp = WireStamp::for_context(ctx);
        let wire_request = search::to_wire(request, &self.options.overrides, &stamp)?;
        let start = start_options(OperationKind::Discovery, &wire_request, &self.options)?;

        let handle = self.orchestrator.submit(start, wire_request);
        let response = self.orchestrator.await_result(&handle, ctx).await?;
        Ok(search::to_domain(&response, page))
    }
}

#[async_trait]
impl SearchService for DurableSearchService {
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

// ---------------------------------------------------------------------------

pub struct DurableEstimateService {
    orchestrator: Arc<SelectOrchestrator>,
    options: DurableOptions,
}

impl DurableEstimateService {
    /// An orchestrator whose unit of work is one select RPC.
    pub fn orchestrator(
        transport: Arc<dyn Transport<SelectRequest, OnSelectResponse>>,
        config: OrchestratorConfig,
    ) -> SelectOrchestrator {
        Orchestrator::new(InvokeActivity::new("select", Invoker::new(transport)), config)
    }

    pub fn new(orchestrator: Arc<SelectOrchestrator>, options: DurableOptions) -> Self {
        Self {
            orchestrator,
            options,
        }
    }

    async fn run(
        &self,
        ctx: &CallContext,
        request: &EstimateRequest,
    ) -> Result<EstimateResponse, GatewayError> {
        let stamp = WireStamp::for_context(ctx);
        let wire_request = estimate::to_wire(request, &self.options.overrides, &stamp)?;
        let start = start_options(OperationKind::Estimate, &wire_request, &self.options)?;

        let handle = self.orchestrator.submit(start, wire_request);
        let response = self.orchestrator.await_result(&handle, ctx).await?;
        Ok(estimate::to_domain(&response))
    }
}

#[async_trait]
impl EstimateService for DurableEstimateService {
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
