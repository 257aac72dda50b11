//! Cancellable invocation of a single remote call.
//!
//! The transport call runs on its own task and delivers into a single-slot
//! `oneshot`. The caller races that slot against its cancellation token and
//! deadline:
//!
//! ```text
//!            ┌──────────── spawn ────────────┐
//! invoke ──► │ transport.call(request) ──► tx │
//!            └────────────────────────────────┘
//!   select! { rx | ctx cancelled | ctx deadline }  ──►  exactly one outcome
//! ```
//!
//! When cancellation or the deadline wins, `invoke` returns at once and the
//! spawned call is left to finish; its send into the dropped slot fails and
//! the result is discarded. Connection lifetime belongs to the transport
//! handle, not to the invocation.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use gateway::{CallContext, CancelReason, GatewayError, TransportErrorKind};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::Instrument;
use wire::{business_error, WireRequest, WireResponse};

// ---------------------------------------------------------------------------
// Transport seam
// ---------------------------------------------------------------------------

/// The raw request/response exchange with one downstream service.
///
/// Implementations report only transport-level failures; a response that
/// carries a business error is still `Ok`.
#[async_trait]
pub trait Transport<Req, Resp>: Send + Sync + 'static {
    /// Name of the remote endpoint, for logs.
    fn target(&self) -> &str;

    async fn call(&self, request: Req) -> Result<Resp, GatewayError>;
}

// ---------------------------------------------------------------------------
// Attempt record
// ---------------------------------------------------------------------------

/// How one physical send resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success,
    TransportError(TransportErrorKind),
    BusinessError { code: String },
    /// A codec or transport rejected the payload itself.
    TranslationError,
    Cancelled(CancelReason),
}

impl AttemptOutcome {
    fn from_result<Resp: WireResponse>(result: &Result<Resp, GatewayError>) -> Self {
        match result {
            Ok(response) => match business_error(response) {
                Some(GatewayError::Business { code, .. }) => Self::BusinessError { code },
                _ => Self::Success,
            },
            Err(GatewayError::Transport { kind, .. }) => Self::TransportError(*kind),
            Err(GatewayError::Cancelled { reason }) => Self::Cancelled(*reason),
            Err(GatewayError::Business { code, .. }) => Self::BusinessError { code: code.clone() },
            Err(GatewayError::Translation { .. }) => Self::TranslationError,
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::TransportError(kind) => write!(f, "transport error ({kind})"),
            Self::BusinessError { code } => write!(f, "business error {code}"),
            Self::TranslationError => f.write_str("translation error"),
            Self::Cancelled(reason) => write!(f, "{reason}"),
        }
    }
}

/// One physical send: created when the call is spawned, resolved when the
/// caller's race completes, then logged and dropped.
#[derive(Debug, Clone)]
pub struct CallAttempt {
    pub target: String,
    pub attempt: u32,
    pub deadline: Option<Instant>,
    pub message_id: String,
    pub outcome: Option<AttemptOutcome>,
}

impl CallAttempt {
    fn resolve<Resp: WireResponse>(&mut self, result: &Result<Resp, GatewayError>) {
        self.outcome = Some(AttemptOutcome::from_result(result));
    }

    fn log(&self) {
        let outcome = self
            .outcome
            .as_ref()
            .map_or_else(|| "unresolved".to_string(), ToString::to_string);
        match &self.outcome {
            Some(AttemptOutcome::Success) | Some(AttemptOutcome::BusinessError { .. }) => {
                tracing::debug!(
                    target_service = %self.target,
                    attempt = self.attempt,
                    message_id = %self.message_id,
                    outcome = %outcome,
                    "RPC attempt completed"
                );
            }
            Some(AttemptOutcome::Cancelled(_)) => {
                tracing::info!(
                    target_service = %self.target,
                    attempt = self.attempt,
                    message_id = %self.message_id,
                    outcome = %outcome,
                    "RPC attempt abandoned by caller"
                );
            }
            _ => {
                tracing::warn!(
                    target_service = %self.target,
                    attempt = self.attempt,
                    message_id = %self.message_id,
                    outcome = %outcome,
                    "RPC attempt failed"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Invoker
// ---------------------------------------------------------------------------

/// Runs transport calls under a [`CallContext`], yielding exactly one outcome
/// per invocation.
pub struct Invoker<Req, Resp> {
    transport: Arc<dyn Transport<Req, Resp>>,
}

impl<Req, Resp> Clone for Invoker<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<Req, Resp> Invoker<Req, Resp>
where
    Req: WireRequest,
    Resp: WireResponse,
{
    pub fn new(transport: Arc<dyn Transport<Req, Resp>>) -> Self {
        Self { transport }
    }

    pub fn target(&self) -> &str {
        self.transport.target()
    }

    /// Sends `request` once as the first attempt.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Cancelled`] with [`CancelReason::Requested`] if the
    ///   context is cancelled first.
    /// - [`GatewayError::Transport`] with
    ///   [`TransportErrorKind::DeadlineExceeded`] if the context deadline
    ///   passes first.
    /// - Any transport failure reported by the call itself.
    pub async fn invoke(&self, ctx: &CallContext, request: Req) -> Result<Resp, GatewayError> {
        self.invoke_attempt(ctx, 1, request).await
    }

    /// Sends `request` once, labelled as attempt number `attempt`.
    ///
    /// # Errors
    ///
    /// As for [`Invoker::invoke`].
    pub async fn invoke_attempt(
        &self,
        ctx: &CallContext,
        attempt: u32,
        request: Req,
    ) -> Result<Resp, GatewayError> {
        let mut record = CallAttempt {
            target: self.transport.target().to_string(),
            attempt,
            deadline: ctx.deadline(),
            message_id: request.message_id().unwrap_or_default().to_string(),
            outcome: None,
        };

        let span = tracing::debug_span!(
            "rpc_invoke",
            target_service = %record.target,
            transaction_id = %ctx.transaction_id(),
            message_id = %record.message_id,
            attempt,
        );

        let result = self.race(ctx, request).instrument(span.clone()).await;

        let _entered = span.enter();
        record.resolve(&result);
        record.log();
        result
    }

    async fn race(&self, ctx: &CallContext, request: Req) -> Result<Resp, GatewayError> {
        if ctx.is_cancelled() {
            return Err(GatewayError::cancelled(CancelReason::Requested));
        }
        if ctx.remaining().is_some_and(|left| left.is_zero()) {
            return Err(deadline_exceeded());
        }

        let (tx, rx) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        tokio::spawn(
            async move {
                let result = transport.call(request).await;
                // The receiver is gone once the caller stopped waiting.
                let _ = tx.send(result);
            }
            .in_current_span(),
        );

        let deadline = ctx.deadline();
        tokio::select! {
            biased;
            _ = ctx.cancellation_token().cancelled() => {
                Err(GatewayError::cancelled(CancelReason::Requested))
            }
            _ = sleep_until(deadline) => Err(deadline_exceeded()),
            delivered = rx => match delivered {
                Ok(result) => result,
                Err(_) => Err(GatewayError::transport(
                    TransportErrorKind::Other,
                    "call task ended without delivering a result",
                )),
            },
        }
    }
}

fn deadline_exceeded() -> GatewayError {
    GatewayError::transport(
        TransportErrorKind::DeadlineExceeded,
        "call did not complete before the request deadline",
    )
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
