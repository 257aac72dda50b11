//! `common` package: envelope shared by every service.

/// Routing and correlation metadata attached to every request and echoed on
/// every response.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Context {
    #[prost(string, tag = "1")]
    pub version: String,
    #[prost(string, tag = "2")]
    pub action: String,
    #[prost(string, tag = "3")]
    pub domain: String,
    /// Requester (buyer application) id.
    #[prost(string, tag = "4")]
    pub bap_id: String,
    /// Requester (buyer application) callback URI.
    #[prost(string, tag = "5")]
    pub bap_uri: String,
    /// Provider platform id; filled by responders.
    #[prost(string, tag = "6")]
    pub bpp_id: String,
    #[prost(string, tag = "7")]
    pub bpp_uri: String,
    #[prost(string, tag = "8")]
    pub transaction_id: String,
    #[prost(string, tag = "9")]
    pub message_id: String,
    /// RFC 3339 send time.
    #[prost(string, tag = "10")]
    pub timestamp: String,
    /// ISO 8601 duration, e.g. `PT30S`.
    #[prost(string, tag = "11")]
    pub ttl: String,
}

/// A well-formed failure reported by a downstream service.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Error {
    #[prost(string, tag = "1")]
    pub code: String,
    #[prost(string, tag = "2")]
    pub message: String,
    /// HTTP status the downstream wants surfaced, `0` when unspecified.
    #[prost(uint32, tag = "3")]
    pub http_status: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TimeWindow {
    #[prost(string, tag = "1")]
    pub start: String,
    #[prost(string, tag = "2")]
    pub end: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Descriptor {
    #[prost(string, tag = "1")]
    pub name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Validity {
    #[prost(string, tag = "1")]
    pub start_date: String,
    #[prost(string, tag = "2")]
    pub end_date: String,
}
