//! Durable orchestrator for the EV-charging gateway.
//!
//! Runs capability calls as executions that outlive the request that started
//! them: each execution has a deterministic id, retries transient failures
//! under a [`gateway::RetryPolicy`], and can be awaited by any number of
//! callers.
//!
//! ## Architectural Layer
//!
//! **Application.** Builds on the `rpc` invoker for the unit of work and on
//! `wire` for translation. State lives in memory; nothing here persists.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`state`] | `ExecutionState`, `WorkflowStatus`, the retry decision |
//! | [`activity`] | `Activity` trait, `InvokeActivity` |
//! | [`orchestrator`] | `Orchestrator`, `StartOptions`, `WorkflowHandle` |
//! | [`durable`] | `DurableSearchService`, `DurableEstimateService` |

pub mod activity;
pub mod durable;
pub mod orchestrator;
pub mod state;

pub use activity::{Activity, InvokeActivity};
pub use durable::{
    DiscoverOrchestrator, DurableEstimateService, DurableOptions, DurableSearchService,
    SelectOrchestrator,
};
pub use orchestrator::{
    Orchestrator, OrchestratorConfig, StartOptions, WorkflowHandle, DEFAULT_ACTIVITY_TIMEOUT,
    DEFAULT_RETENTION, DEFAULT_TASK_QUEUE,
};
pub use state::{decide, Decision, ExecutionState, WorkflowStatus};
