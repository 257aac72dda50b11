//! Per-request call context.
//!
//! A [`CallContext`] travels with a logical operation through every layer:
//! it carries the transaction id shared by all attempts, the caller's
//! deadline and the cancellation token. Cancellation flows strictly top-down:
//! a [`CallContext::child`] is cancelled when its parent is, never the
//! reverse.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{CancelReason, TransactionId};

/// Cancellation, deadline and correlation for one logical operation.
#[derive(Debug, Clone)]
pub struct CallContext {
    transaction_id: TransactionId,
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl CallContext {
    /// Creates a context with a freshly generated transaction id, no
    /// deadline and a new cancellation token.
    pub fn new() -> Self {
        Self {
            transaction_id: TransactionId::generate(),
            deadline: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a context whose cancellation is driven by `token`.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..Self::new()
        }
    }

    /// Replaces the transaction id with a caller-supplied one.
    pub fn with_transaction_id(mut self, transaction_id: TransactionId) -> Self {
        self.transaction_id = transaction_id;
        self
    }

    /// Sets the deadline to `timeout` from now, keeping an earlier deadline
    /// if one is already set.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.with_deadline(candidate)
    }

    /// Sets an absolute deadline, keeping an earlier one if already set.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Derives a context that shares the transaction id and deadline and is
    /// cancelled whenever this one is.
    pub fn child(&self) -> Self {
        Self {
            transaction_id: self.transaction_id.clone(),
            deadline: self.deadline,
            cancel: self.cancel.child_token(),
        }
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline, `None` if there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancels this context and every child derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the context is cancelled or its deadline passes.
    ///
    /// Never resolves for a context with neither.
    pub async fn done(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => CancelReason::Requested,
                    _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
                }
            }
            None => {
                self.cancel.cancelled().await;
                CancelReason::Requested
            }
        }
    }
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new()
    }
}
