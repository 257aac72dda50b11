//! Builds the capability services from configuration.
//!
//! Per capability:
//!
//! ```text
//! address ok, direct   ──► GrpcService ────┐
//! address ok, durable  ──► DurableService ─┴─► Fallback(primary, Mock) if fallback_to_mock
//! address unusable     ──► Mock
//! ```

use std::sync::Arc;

use dispatch::{
    FallbackEstimateService, FallbackSearchService, MockEstimateService, MockSearchService,
};
use gateway::{ConfigurationError, EstimateService, SearchService};
use rpc::{
    connect_lazy, DiscoverTransport, GrpcEstimateService, GrpcSearchService, SelectTransport,
};
use workflow::{
    DiscoverOrchestrator, DurableEstimateService, DurableOptions, DurableSearchService,
    SelectOrchestrator,
};

use crate::config::{DispatchMode, GatewayConfig};

pub struct Services {
    pub search: Arc<dyn SearchService>,
    pub estimate: Arc<dyn EstimateService>,
    discover_orchestrator: Option<Arc<DiscoverOrchestrator>>,
    select_orchestrator: Option<Arc<SelectOrchestrator>>,
}

impl Services {
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Invalid workflow settings. An unusable upstream address is not an
    /// error; that capability is served by its mock instead.
    pub fn build(config: &GatewayConfig) -> Result<Self, ConfigurationError> {
        let durable = match config.dispatch.mode {
            DispatchMode::Direct => None,
            DispatchMode::Durable => Some(DurableOptions {
                task_queue: config.workflow.task_queue()?,
                execution_timeout: config.workflow.execution_timeout(),
                overrides: config.context.clone(),
            }),
        };

        let (search, discover_orchestrator) = search_service(config, durable.as_ref())?;
        let (estimate, select_orchestrator) = estimate_service(config, durable.as_ref())?;

        tracing::info!(
            mode = ?config.dispatch.mode,
            fallback_to_mock = config.dispatch.fallback_to_mock,
            fallback_policy = ?config.dispatch.fallback_policy,
            "Capability services ready"
        );

        Ok(Self {
            search,
            estimate,
            discover_orchestrator,
            select_orchestrator,
        })
    }

    pub fn is_durable(&self) -> bool {
        self.discover_orchestrator.is_some() || self.select_orchestrator.is_some()
    }

    /// Stops any workflow executions still running.
    pub async fn shutdown(&self) {
        if let Some(orchestrator) = &self.discover_orchestrator {
            orchestrator.shutdown().await;
        }
        if let Some(orchestrator) = &self.select_orchestrator {
            orchestrator.shutdown().await;
        }
    }
}

fn search_service(
    config: &GatewayConfig,
    durable: Option<&DurableOptions>,
) -> Result<(Arc<dyn SearchService>, Option<Arc<DiscoverOrchestrator>>), ConfigurationError> {
    let upstream = &config.discovery;
    let channel = match connect_lazy(&upstream.address, &upstream.grpc("discovery")) {
        Ok(channel) => channel,
        Err(e) => {
            tracing::warn!(error = %e, "Discovery upstream unusable, serving search from mock");
            return Ok((Arc::new(MockSearchService::new()), None));
        }
    };
    let transport = Arc::new(DiscoverTransport::discover(
        channel,
        upstream.address.clone(),
        upstream.rpc_timeout(),
    ));

    let mut orchestrator = None;
    let primary: Arc<dyn SearchService> = match durable {
        None => Arc::new(GrpcSearchService::new(transport, config.context.clone())),
        Some(options) => {
            let engine = Arc::new(DurableSearchService::orchestrator(
                transport,
                config.workflow.orchestrator()?,
            ));
            orchestrator = Some(Arc::clone(&engine));
            Arc::new(DurableSearchService::new(engine, options.clone()))
        }
    };

    if !config.dispatch.fallback_to_mock {
        return Ok((primary, orchestrator));
    }
    let service = FallbackSearchService::new(primary, Arc::new(MockSearchService::new()))
        .with_policy(config.dispatch.fallback_policy);
    Ok((Arc::new(service), orchestrator))
}

fn estimate_service(
    config: &GatewayConfig,
    durable: Option<&DurableOptions>,
) -> Result<(Arc<dyn EstimateService>, Option<Arc<SelectOrchestrator>>), ConfigurationError> {
    let upstream = &config.select;
    let channel = match connect_lazy(&upstream.address, &upstream.grpc("select")) {
        Ok(channel) => channel,
        Err(e) => {
            tracing::warn!(error = %e, "Select upstream unusable, serving estimates from mock");
            return Ok((Arc::new(MockEstimateService::new()), None));
        }
    };
    let transport = Arc::new(SelectTransport::select(
        channel,
        upstream.address.clone(),
        upstream.rpc_timeout(),
    ));

    let mut orchestrator = None;
    let primary: Arc<dyn EstimateService> = match durable {
        None => Arc::new(GrpcEstimateService::new(transport, config.context.clone())),
        Some(options) => {
            let engine = Arc::new(DurableEstimateService::orchestrator(
                transport,
                config.workflow.orchestrator()?,
            ));
            orchestrator = Some(Arc::clone(&engine));
            Arc::new(DurableEstimateService::new(engine, options.clone()))
        }
    };

    if !config.dispatch.fallback_to_mock {
        return Ok((primary, orchestrator));
    }
    let service = FallbackEstimateService::new(primary, Arc::new(MockEstimateService::new()))
        .with_policy(config.dispatch.fallback_policy);
    Ok((Arc::new(service), orchestrator))
}
