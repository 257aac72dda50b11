//! Error taxonomy for the dispatch subsystem.
//!
//! Every layer (translator, invoker, fallback dispatcher, orchestrator)
//! reports failures as a [`GatewayError`]. The variant is the contract:
//! callers decide whether to retry, fall back or surface the error purely
//! from the variant, never by inspecting messages.
//!
//! | Variant | Retried by orchestrator | Triggers fallback | HTTP |
//! |---------|-------------------------|-------------------|------|
//! | `Translation` | no | no | 400 |
//! | `Transport` | yes | yes | 502 |
//! | `Business` | no | policy-dependent | payload status |
//! | `Cancelled` | no | no | 499 / 504 |

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Transport error classification
// ---------------------------------------------------------------------------

/// Why a transport-level call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    /// Connection refused or the service is temporarily unavailable.
    Unavailable,
    /// The call did not complete before its deadline.
    DeadlineExceeded,
    /// The stream was reset or aborted mid-call.
    Reset,
    /// Any other non-OK transport status.
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unavailable => "unavailable",
            Self::DeadlineExceeded => "deadline exceeded",
            Self::Reset => "stream reset",
            Self::Other => "transport failure",
        };
        f.write_str(s)
    }
}

/// Why a call was abandoned by its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The caller cancelled explicitly (client abort, shutdown).
    Requested,
    /// The caller's own deadline elapsed while waiting.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("cancelled by caller"),
            Self::DeadlineExceeded => f.write_str("caller deadline exceeded"),
        }
    }
}

/// Coarse error label, used for log fields and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Translation,
    Transport,
    Business,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Translation => "translation",
            Self::Transport => "transport",
            Self::Business => "business",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Gateway errors
// ---------------------------------------------------------------------------

/// A failure of one logical dispatch operation.
///
/// `Clone` because a durable execution's terminal error is handed to every
/// caller awaiting that execution.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum GatewayError {
    /// The domain request cannot be mapped to a wire schema.
    ///
    /// Produced by: schema translator (e.g. neither an EVSE id nor a
    /// geo-point was supplied). Never retried.
    #[error("Request cannot be translated: {reason}")]
    Translation {
        /// Which input was malformed.
        reason: String,
    },

    /// The downstream service could not be reached, reset the stream, or did
    /// not answer before the deadline.
    ///
    /// Produced by: cancellable invoker, gRPC transports, orchestrator
    /// timeouts. Retried by the orchestrator; triggers fallback.
    #[error("Transport error ({kind}): {message}")]
    Transport {
        /// Classification of the failure.
        kind: TransportErrorKind,
        /// Diagnostic detail from the transport.
        message: String,
    },

    /// The downstream service answered with a well-formed failure.
    ///
    /// Produced by: response interpretation in the gRPC-backed services and
    /// the orchestrator's unit of work. Never retried.
    #[error("Business error {code}: {message}")]
    Business {
        /// Downstream error code, verbatim.
        code: String,
        /// Downstream error message, verbatim.
        message: String,
        /// HTTP status encoded by the downstream payload, when present.
        status: Option<u16>,
    },

    /// The caller abandoned the operation.
    #[error("Operation {reason}")]
    Cancelled {
        /// Explicit cancellation or caller deadline.
        reason: CancelReason,
    },
}

impl GatewayError {
    /// Shorthand for a [`GatewayError::Translation`].
    pub fn translation(reason: impl Into<String>) -> Self {
        Self::Translation {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`GatewayError::Transport`].
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for a [`GatewayError::Business`] without an HTTP status.
    pub fn business(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Business {
            code: code.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Shorthand for a [`GatewayError::Cancelled`].
    pub fn cancelled(reason: CancelReason) -> Self {
        Self::Cancelled { reason }
    }

    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Translation { .. } => ErrorKind::Translation,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Business { .. } => ErrorKind::Business,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Returns `true` if re-sending the same request may succeed.
    ///
    /// Only transport failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns `true` if this error is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// HTTP status the HTTP-facing caller should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Translation { .. } => 400,
            Self::Transport { .. } => 502,
            Self::Business { status, .. } => status.unwrap_or(422),
            Self::Cancelled {
                reason: CancelReason::Requested,
            } => 499,
            Self::Cancelled {
                reason: CancelReason::DeadlineExceeded,
            } => 504,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// A configuration value violates an invariant.
///
/// Produced at load time; the gateway never starts with an invalid config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Configuration error: {message}")]
pub struct ConfigurationError {
    /// Description of the configuration problem.
    pub message: String,
}

impl ConfigurationError {
    /// Creates a new configuration error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(GatewayError::transport(TransportErrorKind::Unavailable, "refused").is_retryable());
        assert!(!GatewayError::business("NO_INVENTORY", "sold out").is_retryable());
        assert!(!GatewayError::translation("no locator").is_retryable());
        assert!(!GatewayError::cancelled(CancelReason::Requested).is_retryable());
    }

    #[test]
    fn http_status_mapping() {
        assert_eq!(GatewayError::translation("x").http_status(), 400);
        assert_eq!(
            GatewayError::transport(TransportErrorKind::Reset, "x").http_status(),
            502
        );
        assert_eq!(GatewayError::business("E", "x").http_status(), 422);
        let with_status = GatewayError::Business {
            code: "E".into(),
            message: "x".into(),
            status: Some(409),
        };
        assert_eq!(with_status.http_status(), 409);
        assert_eq!(
            GatewayError::cancelled(CancelReason::DeadlineExceeded).http_status(),
            504
        );
        assert_eq!(GatewayError::cancelled(CancelReason::Requested).http_status(), 499);
    }

    #[test]
    fn display_includes_business_code_verbatim() {
        let err = GatewayError::business("NO_INVENTORY", "no connectors free");
        assert_eq!(err.to_string(), "Business error NO_INVENTORY: no connectors free");
        assert_eq!(err.kind(), ErrorKind::Business);
    }
}
