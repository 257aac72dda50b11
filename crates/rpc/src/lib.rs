//! RPC adapter for the EV-charging gateway.
//!
//! Sends translated wire requests to the discovery and select services over
//! tonic, with per-call cancellation and deadlines, and exposes the result as
//! the [`gateway::SearchService`] and [`gateway::EstimateService`] ports.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Channel setup, status classification and the
//! cancellable race live here. The `gateway` crate sees only its capability
//! traits.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`invoker`] | `Transport` seam, `Invoker`, `CallAttempt` |
//! | [`client`] | `GrpcClientConfig`, lazy channels, `GrpcTransport` |
//! | [`service`] | `GrpcSearchService`, `GrpcEstimateService` |

pub mod client;
pub mod invoker;
pub mod service;

pub use client::{
    connect_lazy, status_to_error, DiscoverTransport, GrpcClientConfig, GrpcTransport,
    SelectTransport,
};
pub use invoker::{AttemptOutcome, CallAttempt, Invoker, Transport};
pub use service::{GrpcEstimateService, GrpcSearchService};
