//! Gateway configuration.
//!
//! Sources, later overriding earlier:
//! 1. `evgw.toml` in the working directory (if present)
//! 2. the file given by `--config` or `EVGW_CONFIG` (must exist)
//! 3. `EVGW__`-prefixed environment variables, `__` between path segments,
//!    e.g. `EVGW__DISCOVERY__ADDRESS=discovery:50051`

use std::path::Path;
use std::time::Duration;

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use dispatch::FallbackPolicy;
use gateway::{ConfigurationError, ContextOverrides, RetryPolicy, TaskQueue};
use rpc::GrpcClientConfig;
use serde::{Deserialize, Serialize};
use workflow::{OrchestratorConfig, DEFAULT_TASK_QUEUE};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "evgw.toml";
/// Environment variable naming an extra configuration file.
pub const CONFIG_ENV_VAR: &str = "EVGW_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "EVGW";
/// Environment variable holding the log filter directive.
pub const LOG_ENV_VAR: &str = "EVGW_LOG";

const DEFAULT_UPSTREAM_ADDRESS: &str = "localhost:50051";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub discovery: UpstreamConfig,
    pub select: UpstreamConfig,
    /// End-to-end deadline for one inbound request.
    pub request_timeout_ms: u64,
    pub dispatch: DispatchConfig,
    pub workflow: WorkflowConfig,
    /// Deployment values for the outbound wire context.
    pub context: ContextOverrides,
    pub telemetry: TelemetryConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            discovery: UpstreamConfig::default(),
            select: UpstreamConfig::default(),
            request_timeout_ms: 15_000,
            dispatch: DispatchConfig::default(),
            workflow: WorkflowConfig::default(),
            context: ContextOverrides::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// One downstream gRPC service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// `host:port` or a full `http(s)://` URI.
    pub address: String,
    pub connect_timeout_ms: u64,
    pub rpc_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_UPSTREAM_ADDRESS.to_string(),
            connect_timeout_ms: 5_000,
            rpc_timeout_ms: 10_000,
        }
    }
}

impl UpstreamConfig {
    pub fn grpc(&self, service_name: &'static str) -> GrpcClientConfig {
        GrpcClientConfig::new(service_name)
            .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .with_rpc_timeout(Duration::from_millis(self.rpc_timeout_ms))
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}

/// How capability calls reach their upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// One RPC per request.
    #[default]
    Direct,
    /// Each request runs as a retried workflow execution.
    Durable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub mode: DispatchMode,
    /// Serve from the static mock when the upstream call fails.
    pub fallback_to_mock: bool,
    pub fallback_policy: FallbackPolicy,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Direct,
            fallback_to_mock: true,
            fallback_policy: FallbackPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub task_queue: String,
    pub activity_timeout_ms: u64,
    /// How long a finished execution stays attachable.
    pub retention_ms: u64,
    /// Bound on a whole execution. Unbounded when absent.
    pub execution_timeout_ms: Option<u64>,
    pub retry: RetryConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            task_queue: DEFAULT_TASK_QUEUE.to_string(),
            activity_timeout_ms: 30_000,
            retention_ms: 600_000,
            execution_timeout_ms: None,
            retry: RetryConfig::default(),
        }
    }
}

impl WorkflowConfig {
    pub fn task_queue(&self) -> Result<TaskQueue, ConfigurationError> {
        TaskQueue::new(self.task_queue.clone())
            .ok_or_else(|| ConfigurationError::new("workflow.task_queue must not be empty"))
    }

    pub fn execution_timeout(&self) -> Option<Duration> {
        self.execution_timeout_ms.map(Duration::from_millis)
    }

    pub fn orchestrator(&self) -> Result<OrchestratorConfig, ConfigurationError> {
        if self.activity_timeout_ms == 0 {
            return Err(ConfigurationError::new(
                "workflow.activity_timeout_ms must be positive",
            ));
        }
        Ok(OrchestratorConfig {
            retry: self.retry.policy()?,
            activity_timeout: Duration::from_millis(self.activity_timeout_ms),
            retention: Duration::from_millis(self.retention_ms),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub initial_interval_ms: u64,
    pub backoff_coefficient: f64,
    pub maximum_interval_ms: u64,
    pub maximum_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_interval_ms: 1_000,
            backoff_coefficient: 2.0,
            maximum_interval_ms: 60_000,
            maximum_attempts: 3,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> Result<RetryPolicy, ConfigurationError> {
        RetryPolicy::new(
            Duration::from_millis(self.initial_interval_ms),
            self.backoff_coefficient,
            Duration::from_millis(self.maximum_interval_ms),
            self.maximum_attempts,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// OTLP gRPC collector, e.g. `http://localhost:4317`. Spans are only
    /// exported when set.
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            otlp_endpoint: None,
            service_name: "ev-gateway".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from the default file, `path`, and the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false));

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Self::build(builder.add_source(
            Environment::with_prefix(CONFIG_ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        ))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
