//! Dispatch domain for the EV-charging gateway.
//!
//! This crate contains the domain request and response models, the capability
//! ports every backend variant implements, the error taxonomy, the retry
//! schedule and the per-request call context. Transport and workflow crates
//! implement the traits defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate performs no I/O. It uses
//! tokio only for deadlines and tokio-util only for cancellation tokens.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype ids (`TransactionId`, `MessageId`, `WorkflowId`, ...) |
//! | [`types`] | Search and estimate models, `Page`, `RequestMeta`, `ContextOverrides` |
//! | [`capability`] | `SearchService` and `EstimateService` ports |
//! | [`context`] | `CallContext`: transaction id, deadline, cancellation |
//! | [`errors`] | `GatewayError` taxonomy and `ConfigurationError` |
//! | [`retry`] | `RetryPolicy` exponential capped schedule |

pub mod capability;
pub mod context;
pub mod errors;
pub mod identifiers;
pub mod retry;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use capability::{EstimateService, SearchService};
pub use context::CallContext;
pub use errors::{CancelReason, ConfigurationError, ErrorKind, GatewayError, TransportErrorKind};
pub use identifiers::{MessageId, OperationKind, TaskQueue, TransactionId, WorkflowId};
pub use retry::RetryPolicy;
pub use types::{
    Address, Amount, ApplicableQuantity, AvailabilityWindow, BuyerFinderFee, CancellationFee,
    CancellationPolicy, Catalog, Connector, ConnectorAttributes, ContextOverrides, Descriptor,
    Energy, EstimateRequest, EstimateResponse, ExternalRef, Offer, OfferAttributes, OrderInfo,
    Page, Price, PriceComponent, Provider, Rating, RequestMeta, SearchFilters, SearchRequest,
    SearchResponse, SearchSort, TimeWindow, Timestamp, Validity, Vehicle,
};
