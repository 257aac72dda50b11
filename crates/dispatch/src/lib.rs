//! Fallback dispatch for the EV-charging gateway.
//!
//! Wraps a primary capability service with a secondary one and provides the
//! static mock services that usually serve as that secondary.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Sequences calls between implementations of the
//! [`gateway`] capability ports. Contains no domain rules and no I/O of its
//! own.

pub mod fallback;
pub mod mock;

pub use fallback::{FallbackEstimateService, FallbackPolicy, FallbackSearchService};
pub use mock::{MockEstimateService, MockSearchService};
