//! Newtype identifiers for the dispatch domain.
//!
//! Transaction ids, message ids and workflow ids are all strings on the wire,
//! but mixing them up silently breaks idempotency: a workflow keyed by a
//! message id where a transaction id was expected attaches to the wrong
//! execution. Each identity therefore gets its own newtype.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Identifies one logical operation across every attempt, retry and
    /// fallback made on its behalf.
    ///
    /// Supplied once by the caller or generated exactly once when the
    /// [`crate::CallContext`] is created.
    TransactionId
}

impl TransactionId {
    /// Generates a fresh random transaction id (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

string_id! {
    /// Identifies one physical send. Regenerated for every re-send.
    MessageId
}

impl MessageId {
    /// Generates a fresh random message id (UUID v4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

string_id! {
    /// Names the queue a durable execution is routed to.
    TaskQueue
}

// ---------------------------------------------------------------------------
// Operation kinds
// ---------------------------------------------------------------------------

/// The capability an outbound call exercises.
///
/// Used as the first component of a [`WorkflowId`] and as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Charger discovery (search engine).
    Discovery,
    /// Price estimate (select engine).
    Estimate,
}

impl OperationKind {
    /// Returns the stable lower-case label used in ids and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Estimate => "estimate",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Workflow ids
// ---------------------------------------------------------------------------

/// Identifies one durable execution.
///
/// Always derived from `(operation kind, transaction id, message id)` so that
/// re-submitting the same logical request yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Derives the workflow id for a logical request.
    pub fn derive(
        kind: OperationKind,
        transaction_id: &TransactionId,
        message_id: &MessageId,
    ) -> Self {
        Self(format!("{kind}-{transaction_id}-{message_id}"))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
