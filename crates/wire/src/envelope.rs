//! Wire envelope handling: context construction, restamping and business
//! error extraction.
//!
//! Every outbound request carries a [`Context`]. Its fields are resolved
//! with a fixed precedence, applied per field and only to empty values:
//!
//! 1. the explicit per-request value ([`RequestMeta`]),
//! 2. the deployment override ([`ContextOverrides`]),
//! 3. the capability constant ([`ContextDefaults`]).

use gateway::{
    CallContext, ContextOverrides, GatewayError, MessageId, RequestMeta, Timestamp, TransactionId,
};

use crate::pb::common::{Context, Error};
use crate::pb::discover::{DiscoverRequest, OnDiscoverResponse};
use crate::pb::select::{OnSelectResponse, SelectRequest};

// ---------------------------------------------------------------------------
// Stamp
// ---------------------------------------------------------------------------

/// The non-deterministic values of one physical send.
///
/// Produced outside the translator so translation stays a pure function.
#[derive(Debug, Clone, PartialEq)]
pub struct WireStamp {
    pub transaction_id: TransactionId,
    pub message_id: MessageId,
    pub timestamp: Timestamp,
}

impl WireStamp {
    /// Stamps a first send for `ctx`: the context's transaction id, a fresh
    /// message id and the current time.
    pub fn for_context(ctx: &CallContext) -> Self {
        Self {
            transaction_id: ctx.transaction_id().clone(),
            message_id: MessageId::generate(),
            timestamp: Timestamp::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Capability constants used when neither the request nor the deployment
/// supplies a context value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextDefaults {
    pub version: &'static str,
    pub action: &'static str,
    pub domain: &'static str,
    pub requester_id: &'static str,
    pub requester_uri: &'static str,
    pub ttl: &'static str,
}

fn resolve(explicit: Option<&str>, overridden: Option<&str>, constant: &str) -> String {
    explicit
        .filter(|v| !v.is_empty())
        .or_else(|| overridden.filter(|v| !v.is_empty()))
        .unwrap_or(constant)
        .to_string()
}

/// Builds the outbound context for one send.
///
/// `bpp_id` and `bpp_uri` are left empty; responders fill them.
pub fn build_context(
    defaults: &ContextDefaults,
    overrides: &ContextOverrides,
    meta: &RequestMeta,
    stamp: &WireStamp,
) -> Context {
    let transaction_id = meta
        .transaction_id
        .as_ref()
        .unwrap_or(&stamp.transaction_id)
        .to_string();
    let message_id = meta
        .message_id
        .as_ref()
        .unwrap_or(&stamp.message_id)
        .to_string();

    Context {
        version: resolve(meta.version.as_deref(), overrides.version.as_deref(), defaults.version),
        action: defaults.action.to_string(),
        domain: resolve(meta.domain.as_deref(), overrides.domain.as_deref(), defaults.domain),
        bap_id: resolve(
            meta.requester_id.as_deref(),
            overrides.requester_id.as_deref(),
            defaults.requester_id,
        ),
        bap_uri: resolve(
            meta.requester_uri.as_deref(),
            overrides.requester_uri.as_deref(),
            defaults.requester_uri,
        ),
        bpp_id: String::new(),
        bpp_uri: String::new(),
        transaction_id,
        message_id,
        timestamp: stamp.timestamp.to_rfc3339(),
        ttl: resolve(meta.ttl.as_deref(), overrides.ttl.as_deref(), defaults.ttl),
    }
}

/// Reads the context fields a caller may have set explicitly.
///
/// Empty wire fields become `None`. `action` and the responder fields are
/// not part of [`RequestMeta`] and are dropped.
pub fn meta_from_context(context: Option<&Context>) -> RequestMeta {
    let Some(c) = context else {
        return RequestMeta::default();
    };
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
    RequestMeta {
        version: non_empty(&c.version),
        domain: non_empty(&c.domain),
        requester_id: non_empty(&c.bap_id),
        requester_uri: non_empty(&c.bap_uri),
        transaction_id: TransactionId::new(c.transaction_id.clone()),
        message_id: MessageId::new(c.message_id.clone()),
        ttl: non_empty(&c.ttl),
    }
}

// ---------------------------------------------------------------------------
// Request / response envelopes
// ---------------------------------------------------------------------------

/// An outbound request that carries a [`Context`].
pub trait WireRequest: Clone + Send + Sync + 'static {
    fn context(&self) -> Option<&Context>;

    fn context_mut(&mut self) -> &mut Context;

    /// The message id currently stamped on the request.
    fn message_id(&self) -> Option<&str> {
        self.context()
            .map(|c| c.message_id.as_str())
            .filter(|id| !id.is_empty())
    }

    /// Prepares the request for a re-send: new message id and send time.
    /// The transaction id is left untouched.
    fn restamp(&mut self, message_id: &MessageId, timestamp: Timestamp) {
        let context = self.context_mut();
        context.message_id = message_id.to_string();
        context.timestamp = timestamp.to_rfc3339();
    }
}

/// An inbound response that may carry a well-formed failure.
pub trait WireResponse: Send + 'static {
    fn context(&self) -> Option<&Context>;

    fn error(&self) -> Option<&Error>;
}

impl WireRequest for DiscoverRequest {
    fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    fn context_mut(&mut self) -> &mut Context {
        self.context.get_or_insert_with(Context::default)
    }
}

impl WireRequest for SelectRequest {
    fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    fn context_mut(&mut self) -> &mut Context {
        self.context.get_or_insert_with(Context::default)
    }
}

impl WireResponse for OnDiscoverResponse {
    fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }
}

impl WireResponse for OnSelectResponse {
    fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }
}

/// Interprets the response's error block.
///
/// Returns [`GatewayError::Business`] with the downstream code and message
/// verbatim, or `None` if the block is absent or entirely empty. An
/// `http_status` outside `100..=599` is ignored.
pub fn business_error(response: &impl WireResponse) -> Option<GatewayError> {
    let error = response.error()?;
    if error.code.is_empty() && error.message.is_empty() {
        return None;
    }
    let status = u16::try_from(error.http_status)
        .ok()
        .filter(|s| (100..=599).contains(s));
    Some(GatewayError::Business {
        code: error.code.clone(),
        message: error.message.clone(),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: ContextDefaults = ContextDefaults {
        version: "1.0.0",
        action: "discover",
        domain: "default.domain",
        requester_id: "1",
        requester_uri: "default.uri",
        ttl: "PT30S",
    };

    fn stamp() -> WireStamp {
        WireStamp {
            transaction_id: TransactionId::new("stamp-txn").unwrap(),
            message_id: MessageId::new("stamp-msg").unwrap(),
            timestamp: Timestamp::now(),
        }
    }

    #[test]
    fn explicit_beats_override_beats_constant() {
        let overrides = ContextOverrides {
            domain: Some("override.domain".into()),
            ttl: Some("PT10S".into()),
            ..ContextOverrides::default()
        };
        let meta = RequestMeta {
            ttl: Some("PT5S".into()),
            ..RequestMeta::default()
        };

        let context = build_context(&DEFAULTS, &overrides, &meta, &stamp());

        assert_eq!(context.ttl, "PT5S");
        assert_eq!(context.domain, "override.domain");
        assert_eq!(context.bap_uri, "default.uri");
        assert_eq!(context.action, "discover");
        assert!(context.bpp_id.is_empty());
    }

    #[test]
    fn empty_explicit_values_do_not_shadow_defaults() {
        let meta = RequestMeta {
            domain: Some(String::new()),
            ..RequestMeta::default()
        };
        let context = build_context(&DEFAULTS, &ContextOverrides::default(), &meta, &stamp());
        assert_eq!(context.domain, "default.domain");
    }

    #[test]
    fn ids_come_from_meta_then_stamp() {
        let context = build_context(
            &DEFAULTS,
            &ContextOverrides::default(),
            &RequestMeta::default(),
            &stamp(),
        );
        assert_eq!(context.transaction_id, "stamp-txn");
        assert_eq!(context.message_id, "stamp-msg");

        let meta = RequestMeta {
            transaction_id: TransactionId::new("t1"),
            message_id: MessageId::new("m1"),
            ..RequestMeta::default()
        };
        let context = build_context(&DEFAULTS, &ContextOverrides::default(), &meta, &stamp());
        assert_eq!(context.transaction_id, "t1");
        assert_eq!(context.message_id, "m1");
    }

    #[test]
    fn restamp_changes_message_id_only() {
        let mut request = DiscoverRequest {
            context: Some(build_context(
                &DEFAULTS,
                &ContextOverrides::default(),
                &RequestMeta::default(),
                &stamp(),
            )),
            message: None,
        };
        let fresh = MessageId::new("resend-2").unwrap();
        request.restamp(&fresh, Timestamp::now());

        assert_eq!(request.message_id(), Some("resend-2"));
        assert_eq!(request.context().unwrap().transaction_id, "stamp-txn");
    }

    #[test]
    fn business_error_requires_content() {
        let mut response = OnSelectResponse::default();
        assert!(business_error(&response).is_none());

        response.error = Some(Error::default());
        assert!(business_error(&response).is_none());

        response.error = Some(Error {
            code: "NO_INVENTORY".into(),
            message: "no connectors free".into(),
            http_status: 409,
        });
        assert_eq!(
            business_error(&response),
            Some(GatewayError::Business {
                code: "NO_INVENTORY".into(),
                message: "no connectors free".into(),
                status: Some(409),
            })
        );

        response.error = Some(Error {
            code: "E".into(),
            message: String::new(),
            http_status: 70_000,
        });
        assert_eq!(
            business_error(&response).map(|e| e.http_status()),
            Some(422)
        );
    }
}
