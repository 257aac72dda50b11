//! Protobuf messages for the downstream services.
//!
//! Written by hand with the `prost` derive rather than generated at build
//! time, so the workspace builds without `protoc`. These definitions are the
//! gateway's own wire contract: the field numbers are assigned here and are
//! not a mirror of any upstream `.proto` file. Upstream services must be
//! built against the same numbering, and a field number never changes once
//! released. Field names follow Rust conventions where the natural name is a
//! keyword (`type` becomes `kind`).

pub mod common;
pub mod discover;
pub mod select;
