//! Execution state machine.
//!
//! ```text
//! Submitted ──► Running(1) ──► Completed
//!                  │    ▲
//!          transport    │ backoff elapsed
//!              error    │
//!                  ▼    │
//!              Retrying(n) ──► ... ──► Failed
//! ```
//!
//! The decision after a failed attempt is a pure function of the retry
//! policy, the attempt number and the error: only transport errors are
//! retried, and only while attempts remain.

use std::fmt;
use std::time::Duration;

use gateway::{GatewayError, RetryPolicy};

/// Observable state of one execution, published on its watch channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionState<O> {
    Submitted,
    Running { attempt: u32 },
    Retrying { attempt: u32, backoff: Duration },
    Completed(O),
    Failed(GatewayError),
}

impl<O> ExecutionState<O> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    /// The state without its payload.
    pub fn status(&self) -> WorkflowStatus {
        match self {
            Self::Submitted => WorkflowStatus::Submitted,
            Self::Running { attempt } => WorkflowStatus::Running { attempt: *attempt },
            Self::Retrying { attempt, backoff } => WorkflowStatus::Retrying {
                attempt: *attempt,
                backoff: *backoff,
            },
            Self::Completed(_) => WorkflowStatus::Completed,
            Self::Failed(err) => WorkflowStatus::Failed {
                error: err.clone(),
            },
        }
    }
}

/// Payload-free view of an [`ExecutionState`], returned by status queries.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowStatus {
    Submitted,
    Running { attempt: u32 },
    /// Attempt `attempt` failed; the next one starts after `backoff`.
    Retrying { attempt: u32, backoff: Duration },
    Completed,
    Failed { error: GatewayError },
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => f.write_str("submitted"),
            Self::Running { attempt } => write!(f, "running (attempt {attempt})"),
            Self::Retrying { attempt, backoff } => {
                write!(f, "retrying after attempt {attempt} in {}ms", backoff.as_millis())
            }
            Self::Completed => f.write_str("completed"),
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// What to do after attempt number `attempt` failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retry { backoff: Duration },
    Fail,
}

pub fn decide(policy: &RetryPolicy, attempt: u32, error: &GatewayError) -> Decision {
    if error.is_retryable() && policy.allows_retry_after(attempt) {
        Decision::Retry {
            backoff: policy.backoff(attempt),
        }
    } else {
        Decision::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::{CancelReason, TransportErrorKind};

    #[test]
    fn transport_errors_retry_until_attempts_run_out() {
        let policy = RetryPolicy::default();
        let err = GatewayError::transport(TransportErrorKind::Unavailable, "down");

        assert_eq!(
            decide(&policy, 1, &err),
            Decision::Retry {
                backoff: Duration::from_secs(1)
            }
        );
        assert_eq!(
            decide(&policy, 2, &err),
            Decision::Retry {
                backoff: Duration::from_secs(2)
            }
        );
        assert_eq!(decide(&policy, 3, &err), Decision::Fail);
    }

    #[test]
    fn non_transport_errors_fail_immediately() {
        let policy = RetryPolicy::default();
        assert_eq!(decide(&policy, 1, &GatewayError::business("E", "no")), Decision::Fail);
        assert_eq!(decide(&policy, 1, &GatewayError::translation("bad")), Decision::Fail);
        assert_eq!(
            decide(&policy, 1, &GatewayError::cancelled(CancelReason::Requested)),
            Decision::Fail
        );
    }

    #[test]
    fn terminal_states() {
        assert!(!ExecutionState::<()>::Submitted.is_terminal());
        assert!(!ExecutionState::<()>::Running { attempt: 1 }.is_terminal());
        assert!(ExecutionState::Completed(()).is_terminal());
        assert!(ExecutionState::<()>::Failed(GatewayError::translation("x"))
            .status()
            .is_terminal());
    }
}
