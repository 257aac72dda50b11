//! In-process durable orchestrator.
//!
//! Each execution is keyed by a [`WorkflowId`] and runs its activity on a
//! dedicated task until it completes, fails terminally or exhausts its retry
//! policy. Progress is published on a `watch` channel; any number of callers
//! may hold a [`WorkflowHandle`] and wait on it.
//!
//! Executions are detached from their submitters: a caller that stops
//! waiting does not stop the execution. Only [`Orchestrator::shutdown`]
//! cancels running attempts.
//!
//! Persistence across process restarts is not provided; the registry lives
//! in memory. Terminal executions stay attachable for
//! [`OrchestratorConfig::retention`], after which the next `submit` drops
//! them. [`Orchestrator::evict_terminal`] drops every terminal execution at
//! once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Duration;

use gateway::{
    CallContext, CancelReason, GatewayError, RetryPolicy, TaskQueue, TransactionId,
    TransportErrorKind, WorkflowId,
};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use crate::activity::Activity;
use crate::state::{decide, Decision, ExecutionState, WorkflowStatus};

/// Default deadline of a single activity attempt.
pub const DEFAULT_ACTIVITY_TIMEOUT: Duration = Duration::from_secs(30);

/// Default task queue name.
pub const DEFAULT_TASK_QUEUE: &str = "ev-gateway";

/// Default time a terminal execution stays registered.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(600);

fn duration_to_u64_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Options and handles
// ---------------------------------------------------------------------------

/// Orchestrator-wide settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub retry: RetryPolicy,
    /// Deadline of each activity attempt (start-to-close).
    pub activity_timeout: Duration,
    /// How long a terminal execution stays registered, so a re-submission
    /// within the window attaches to its result.
    pub retention: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            activity_timeout: DEFAULT_ACTIVITY_TIMEOUT,
            retention: DEFAULT_RETENTION,
        }
    }
}

/// Per-execution submission options.
#[derive(Debug, Clone)]
pub struct StartOptions {
    pub id: WorkflowId,
    pub task_queue: TaskQueue,
    /// Bound on the whole execution, across all attempts and backoffs.
    pub execution_timeout: Option<Duration>,
    /// Correlation id for the execution's attempts. Generated if absent.
    pub transaction_id: Option<TransactionId>,
}

impl StartOptions {
    pub fn new(id: WorkflowId, task_queue: TaskQueue) -> Self {
        Self {
            id,
            task_queue,
            execution_timeout: None,
            transaction_id: None,
        }
    }

    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = Some(timeout);
        self
    }

    pub fn with_transaction_id(mut self, transaction_id: TransactionId) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }
}

/// Read-only reference to an execution.
#[derive(Debug, Clone)]
pub struct WorkflowHandle<O> {
    id: WorkflowId,
    task_queue: TaskQueue,
    state: watch::Receiver<ExecutionState<O>>,
}

impl<O> WorkflowHandle<O> {
    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn task_queue(&self) -> &TaskQueue {
        &self.task_queue
    }

    /// Current status (non-blocking).
    pub fn status(&self) -> WorkflowStatus {
        self.state.borrow().status()
    }
}

struct Execution<O> {
    task_queue: TaskQueue,
    state: watch::Receiver<ExecutionState<O>>,
    /// Set by the execution task just before it publishes a terminal state.
    finished_at: Arc<OnceLock<Instant>>,
}

impl<O> Execution<O> {
    fn expired(&self, now: Instant, retention: Duration) -> bool {
        self.finished_at
            .get()
            .is_some_and(|finished| now.saturating_duration_since(*finished) >= retention)
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<A: Activity> {
    activity: Arc<A>,
    config: OrchestratorConfig,
    executions: Mutex<HashMap<WorkflowId, Execution<A::Output>>>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
}

impl<A: Activity> Orchestrator<A> {
    pub fn new(activity: A, config: OrchestratorConfig) -> Self {
        Self {
            activity: Arc::new(activity),
            config,
            executions: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<WorkflowId, Execution<A::Output>>> {
        // The map holds only receivers; a panic mid-insert leaves it usable.
        self.executions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts an execution, or attaches to the one already registered under
    /// `options.id`. Never blocks on the execution itself.
    ///
    /// Must be called inside a tokio runtime.
    pub fn submit(&self, options: StartOptions, input: A::Input) -> WorkflowHandle<A::Output> {
        let mut executions = self.registry();
        let now = Instant::now();
        let before = executions.len();
        executions.retain(|_, e| !e.expired(now, self.config.retention));
        let expired = before - executions.len();
        if expired > 0 {
            tracing::debug!(expired, "Dropped expired workflow executions");
        }

        if let Some(existing) = executions.get(&options.id) {
            tracing::info!(
                workflow_id = %options.id,
                status = %existing.state.borrow().status(),
                "Attached to existing workflow execution"
            );
            return WorkflowHandle {
                id: options.id,
                task_queue: existing.task_queue.clone(),
                state: existing.state.clone(),
            };
        }

        let (tx, rx) = watch::channel(ExecutionState::Submitted);
        let finished_at = Arc::new(OnceLock::new());
        executions.insert(
            options.id.clone(),
            Execution {
                task_queue: options.task_queue.clone(),
                state: rx.clone(),
                finished_at: Arc::clone(&finished_at),
            },
        );
        drop(executions);

        let handle = WorkflowHandle {
            id: options.id.clone(),
            task_queue: options.task_queue.clone(),
            state: rx,
        };

        let transaction_id = options
            .transaction_id
            .clone()
            .unwrap_or_else(TransactionId::generate);
        let span = tracing::info_span!(
            "workflow_execution",
            workflow_id = %options.id,
            task_queue = %options.task_queue,
            activity = self.activity.name(),
            transaction_id = %transaction_id,
        );

        let run = Execute {
            activity: Arc::clone(&self.activity),
            config: self.config.clone(),
            shutdown: self.shutdown.clone(),
            transaction_id,
        };
        let execution_timeout = options.execution_timeout;
        self.tracker.spawn(
            async move {
                tracing::info!("Workflow execution started");
                let terminal = run.until_terminal(&tx, input, execution_timeout).await;
                match &terminal {
                    ExecutionState::Failed(err) => {
                        tracing::error!(
                            error = %err,
                            error_kind = %err.kind(),
                            "Workflow execution failed"
                        )
                    }
                    _ => tracing::info!("Workflow execution completed"),
                }
                let _ = finished_at.set(Instant::now());
                tx.send_replace(terminal);
            }
            .instrument(span),
        );

        handle
    }

    /// Waits for the execution behind `handle` to reach a terminal state.
    ///
    /// Stopping the wait, by cancellation or deadline of `ctx`, leaves the
    /// execution running.
    ///
    /// # Errors
    ///
    /// - The execution's terminal error, verbatim, if it failed.
    /// - [`GatewayError::Cancelled`] if `ctx` is cancelled or its deadline
    ///   passes first.
    pub async fn await_result(
        &self,
        handle: &WorkflowHandle<A::Output>,
        ctx: &CallContext,
    ) -> Result<A::Output, GatewayError> {
        let mut state = handle.state.clone();
        loop {
            match &*state.borrow_and_update() {
                ExecutionState::Completed(output) => return Ok(output.clone()),
                ExecutionState::Failed(err) => return Err(err.clone()),
                _ => {}
            }

            tokio::select! {
                biased;
                reason = ctx.done() => {
                    tracing::info!(
                        workflow_id = %handle.id,
                        reason = %reason,
                        "Stopped waiting for workflow execution"
                    );
                    return Err(GatewayError::cancelled(reason));
                }
                changed = state.changed() => {
                    if changed.is_err() {
                        return match &*state.borrow() {
                            ExecutionState::Completed(output) => Ok(output.clone()),
                            ExecutionState::Failed(err) => Err(err.clone()),
                            _ => Err(GatewayError::transport(
                                TransportErrorKind::Other,
                                format!("workflow {} ended without a result", handle.id),
                            )),
                        };
                    }
                }
            }
        }
    }

    /// Status of the execution registered under `id`, if any.
    pub fn status(&self, id: &WorkflowId) -> Option<WorkflowStatus> {
        self.registry().get(id).map(|e| e.state.borrow().status())
    }

    /// Drops terminal executions from the registry and returns how many were
    /// removed. Handles already given out keep working.
    pub fn evict_terminal(&self) -> usize {
        let mut executions = self.registry();
        let before = executions.len();
        executions.retain(|_, e| !e.state.borrow().is_terminal());
        before - executions.len()
    }

    /// Cancels running attempts and backoffs, then waits for every execution
    /// task to publish its terminal state.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        self.tracker.wait().await;
    }
}

// ---------------------------------------------------------------------------
// Execution loop
// ---------------------------------------------------------------------------

struct Execute<A> {
    activity: Arc<A>,
    config: OrchestratorConfig,
    shutdown: CancellationToken,
    transaction_id: TransactionId,
}

impl<A: Activity> Execute<A> {
    async fn until_terminal(
        &self,
        tx: &watch::Sender<ExecutionState<A::Output>>,
        input: A::Input,
        execution_timeout: Option<Duration>,
    ) -> ExecutionState<A::Output> {
        let attempts = self.attempts(tx, &input);
        match execution_timeout {
            None => attempts.await,
            Some(limit) => match tokio::time::timeout(limit, attempts).await {
                Ok(state) => state,
                Err(_) => ExecutionState::Failed(GatewayError::transport(
                    TransportErrorKind::DeadlineExceeded,
                    format!(
                        "execution did not finish within {}ms",
                        duration_to_u64_ms(limit)
                    ),
                )),
            },
        }
    }

    async fn attempts(
        &self,
        tx: &watch::Sender<ExecutionState<A::Output>>,
        input: &A::Input,
    ) -> ExecutionState<A::Output> {
        let mut attempt = 1;
        loop {
            tx.send_replace(ExecutionState::Running { attempt });

            let err = match self.attempt(attempt, input).await {
                Ok(output) => return ExecutionState::Completed(output),
                Err(err) => err,
            };

            match decide(&self.config.retry, attempt, &err) {
                Decision::Fail => return ExecutionState::Failed(err),
                Decision::Retry { backoff } => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.config.retry.maximum_attempts(),
                        backoff_ms = duration_to_u64_ms(backoff),
                        error = %err,
                        "Activity attempt failed, retrying"
                    );
                    tx.send_replace(ExecutionState::Retrying { attempt, backoff });
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = self.shutdown.cancelled() => {
                            return ExecutionState::Failed(GatewayError::cancelled(
                                CancelReason::Requested,
                            ));
                        }
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, attempt: u32, input: &A::Input) -> Result<A::Output, GatewayError> {
        let timeout = self.config.activity_timeout;
        let ctx = CallContext::with_token(self.shutdown.child_token())
            .with_transaction_id(self.transaction_id.clone())
            .with_timeout(timeout);

        match tokio::time::timeout(timeout, self.activity.execute(&ctx, attempt, input)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::transport(
                TransportErrorKind::DeadlineExceeded,
                format!(
                    "{} attempt {attempt} exceeded {}ms",
                    self.activity.name(),
                    duration_to_u64_ms(timeout)
                ),
            )),
        }
    }
}
