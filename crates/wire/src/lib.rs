//! Schema translator for the EV-charging gateway.
//!
//! Maps the gateway's domain models to and from the protobuf schemas of the
//! downstream `discover` and `select` services. Translation is pure: the only
//! non-deterministic inputs (message id, send time, generated transaction id)
//! arrive through a [`WireStamp`], and the only failure is
//! [`gateway::GatewayError::Translation`] for malformed input.
//!
//! ## Architectural Layer
//!
//! **Adapter (pure).** No I/O and no async. The `rpc` crate moves the
//! messages defined here over tonic channels.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`pb`] | Hand-written prost messages for `common`, `discover`, `select` |
//! | [`envelope`] | Context defaults, `WireStamp`, restamping, business errors |
//! | [`search`] | Search ↔ discover mapping |
//! | [`estimate`] | Estimate ↔ select mapping |

pub mod envelope;
pub mod estimate;
pub mod pb;
pub mod search;

pub use envelope::{business_error, ContextDefaults, WireRequest, WireResponse, WireStamp};
