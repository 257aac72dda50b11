//! gRPC channel configuration and the unary transport over it.
//!
//! Channels are created lazily: a well-formed address never fails at
//! start-up, and the first call establishes the connection. Only a malformed
//! address is rejected up front, which lets the composition root serve that
//! capability from its mock instead.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use gateway::{ConfigurationError, GatewayError, TransportErrorKind};
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};

use crate::invoker::Transport;

/// Fully-qualified path of the discovery RPC.
pub const DISCOVER_PATH: &str = "/discover.DiscoveryService/Discover";

/// Fully-qualified path of the select RPC.
pub const SELECT_PATH: &str = "/select.SelectService/Select";

fn duration_to_u64_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Transport settings for one upstream service.
#[derive(Debug, Clone)]
pub struct GrpcClientConfig {
    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,

    /// Timeout applied to each RPC, on top of the caller's own deadline.
    pub rpc_timeout: Duration,

    /// Service name for tracing.
    pub service_name: &'static str,
}

impl Default for GrpcClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            rpc_timeout: Duration::from_secs(10),
            service_name: "grpc_client",
        }
    }
}

impl GrpcClientConfig {
    pub fn new(service_name: &'static str) -> Self {
        Self {
            service_name,
            ..Default::default()
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }
}

/// Build a tonic `Endpoint` with timeouts and HTTP/2 keepalive.
fn build_endpoint(address: &str, cfg: &GrpcClientConfig) -> Result<Endpoint, ConfigurationError> {
    if address.trim().is_empty() {
        return Err(ConfigurationError::new(format!(
            "{}: upstream address is empty",
            cfg.service_name
        )));
    }
    let uri = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };

    let endpoint = Endpoint::from_shared(uri)
        .map_err(|e| ConfigurationError::new(format!("invalid address '{address}': {e}")))?
        .connect_timeout(cfg.connect_timeout)
        .timeout(cfg.rpc_timeout)
        .tcp_keepalive(Some(Duration::from_secs(30)))
        .http2_keep_alive_interval(Duration::from_secs(30))
        .keep_alive_timeout(Duration::from_secs(10))
        .keep_alive_while_idle(true);

    Ok(endpoint)
}

/// Creates a lazily-connecting channel to `address`.
///
/// Bare `host:port` addresses are treated as plaintext `http://`. Must be
/// called inside a tokio runtime.
///
/// # Errors
///
/// Returns [`ConfigurationError`] if the address cannot be parsed as a URI.
pub fn connect_lazy(address: &str, cfg: &GrpcClientConfig) -> Result<Channel, ConfigurationError> {
    let endpoint = build_endpoint(address, cfg)?;
    tracing::info!(
        service_name = cfg.service_name,
        address,
        connect_timeout_ms = duration_to_u64_ms(cfg.connect_timeout),
        rpc_timeout_ms = duration_to_u64_ms(cfg.rpc_timeout),
        "gRPC channel configured"
    );
    Ok(endpoint.connect_lazy())
}

// ---------------------------------------------------------------------------
// Status classification
// ---------------------------------------------------------------------------

/// Maps a non-OK gRPC status to a transport error.
pub fn status_to_error(status: &Status) -> GatewayError {
    let kind = match status.code() {
        Code::Unavailable => TransportErrorKind::Unavailable,
        Code::DeadlineExceeded => TransportErrorKind::DeadlineExceeded,
        Code::Cancelled | Code::Aborted => TransportErrorKind::Reset,
        _ => TransportErrorKind::Other,
    };
    GatewayError::transport(kind, format!("{:?}: {}", status.code(), status.message()))
}

// ---------------------------------------------------------------------------
// Unary transport
// ---------------------------------------------------------------------------

/// A unary RPC on a shared tonic [`Channel`].
///
/// The channel is cloned per call; tonic multiplexes calls over the
/// underlying connection.
pub struct GrpcTransport<Req, Resp> {
    channel: Channel,
    path: &'static str,
    target: String,
    rpc_timeout: Duration,
    _messages: PhantomData<fn(Req) -> Resp>,
}

/// Transport for `DiscoveryService/Discover`.
pub type DiscoverTransport =
    GrpcTransport<wire::pb::discover::DiscoverRequest, wire::pb::discover::OnDiscoverResponse>;

/// Transport for `SelectService/Select`.
pub type SelectTransport =
    GrpcTransport<wire::pb::select::SelectRequest, wire::pb::select::OnSelectResponse>;

impl<Req, Resp> GrpcTransport<Req, Resp> {
    pub fn new(
        channel: Channel,
        path: &'static str,
        target: impl Into<String>,
        rpc_timeout: Duration,
    ) -> Self {
        Self {
            channel,
            path,
            target: target.into(),
            rpc_timeout,
            _messages: PhantomData,
        }
    }
}

impl DiscoverTransport {
    pub fn discover(channel: Channel, target: impl Into<String>, rpc_timeout: Duration) -> Self {
        Self::new(channel, DISCOVER_PATH, target, rpc_timeout)
    }
}

impl SelectTransport {
    pub fn select(channel: Channel, target: impl Into<String>, rpc_timeout: Duration) -> Self {
        Self::new(channel, SELECT_PATH, target, rpc_timeout)
    }
}

#[async_trait]
impl<Req, Resp> Transport<Req, Resp> for GrpcTransport<Req, Resp>
where
    Req: prost::Message + Send + Sync + 'static,
    Resp: prost::Message + Default + Send + Sync + 'static,
{
    fn target(&self) -> &str {
        &self.target
    }

    async fn call(&self, request: Req) -> Result<Resp, GatewayError> {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready().await.map_err(|e| {
            GatewayError::transport(
                TransportErrorKind::Unavailable,
                format!("{} not ready: {e}", self.target),
            )
        })?;

        let mut request = tonic::Request::new(request);
        request.set_timeout(self.rpc_timeout);
        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let path = PathAndQuery::from_static(self.path);

        let call = grpc.unary(request, path, codec);
        match tokio::time::timeout(self.rpc_timeout, call).await {
            Ok(Ok(response)) => Ok(response.into_inner()),
            Ok(Err(status)) => Err(status_to_error(&status)),
            Err(_) => Err(GatewayError::transport(
                TransportErrorKind::DeadlineExceeded,
                format!(
                    "{} did not answer within {}ms",
                    self.target,
                    duration_to_u64_ms(self.rpc_timeout)
                ),
            )),
        }
    }
}
