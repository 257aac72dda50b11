//! Domain request and response models.
//!
//! These are the gateway's internal representation of a charger search and a
//! price estimate. Field names are the gateway's own; the wire schemas live in
//! the `wire` crate and are reached only through the schema translator.
//!
//! `Option` is used wherever absent, empty and zero mean different things on
//! the wire: geo-coordinates, distance, filters and time windows.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{GatewayError, MessageId, TransactionId};

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC instant, serialised as RFC 3339 with second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wraps an existing `DateTime<Utc>`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Formats as `2025-01-27T10:00:00Z`.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Default page number for search results.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size for search results.
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Largest accepted page size.
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination echoed back in search responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    /// Builds a page from optional caller input, applying defaults and
    /// clamping `per_page` to `1..=100`.
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p,
            _ => DEFAULT_PAGE,
        };
        let per_page = match per_page {
            Some(0) | None => DEFAULT_PER_PAGE,
            Some(n) => n.min(MAX_PER_PAGE),
        };
        Self { page, per_page }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire context inputs
// ---------------------------------------------------------------------------

/// Explicit per-request values for the outbound wire context.
///
/// Every field is optional; an empty field falls back to the configured
/// [`ContextOverrides`] and then to the capability's constants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestMeta {
    pub version: Option<String>,
    pub domain: Option<String>,
    pub requester_id: Option<String>,
    pub requester_uri: Option<String>,
    pub transaction_id: Option<TransactionId>,
    pub message_id: Option<MessageId>,
    pub ttl: Option<String>,
}

impl RequestMeta {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Deployment-wide replacements for the capability constants.
///
/// Loaded from the `context` configuration section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOverrides {
    pub version: Option<String>,
    pub domain: Option<String>,
    pub requester_id: Option<String>,
    pub requester_uri: Option<String>,
    pub ttl: Option<String>,
}

// ---------------------------------------------------------------------------
// Shared value objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vehicle {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub make: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub model: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

impl Vehicle {
    /// `true` when no sub-field carries a value.
    pub fn is_empty(&self) -> bool {
        self.make.is_empty() && self.model.is_empty() && self.kind.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeWindow {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub start: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub end: String,
}

impl TimeWindow {
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Energy {
    pub value: f64,
    pub unit: String,
}

impl Energy {
    pub fn is_empty(&self) -> bool {
        self.value == 0.0 && self.unit.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub value: f64,
    pub currency: String,
}

impl Amount {
    pub fn is_empty(&self) -> bool {
        self.value == 0.0 && self.currency.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validity {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityWindow {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub value: f64,
    pub count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub name: String,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub cpo: Option<String>,
    pub connector_type: Option<String>,
    pub max_power_kw: Option<f64>,
    pub amenities: Vec<String>,
    pub vehicle: Option<Vehicle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSort {
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

/// A charger search.
///
/// Exactly one locator is expected: an EVSE id, or a geo-point with a
/// positive radius. [`SearchRequest::validate`] enforces the HTTP-facing
/// rule; the translator only rejects requests with no locator at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evse_id: Option<String>,
    /// `[latitude, longitude]`, order preserved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_coordinates: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<SearchFilters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SearchSort>,
    #[serde(skip_serializing_if = "RequestMeta::is_empty")]
    pub meta: RequestMeta,
}

impl SearchRequest {
    /// Search by EVSE id.
    pub fn by_evse(evse_id: impl Into<String>) -> Self {
        Self {
            evse_id: Some(evse_id.into()),
            ..Self::default()
        }
    }

    /// Search within `distance_meters` of `[lat, lon]`.
    pub fn near(lat: f64, lon: f64, distance_meters: f64) -> Self {
        Self {
            geo_coordinates: Some(vec![lat, lon]),
            distance_meters: Some(distance_meters),
            ..Self::default()
        }
    }

    /// Checks that the request names exactly one kind of locator.
    ///
    /// Accepts a non-empty `evse_id`, or a two-element `geo_coordinates`
    /// together with a positive `distance_meters`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Translation`] otherwise.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let has_evse = self.evse_id.as_deref().is_some_and(|id| !id.is_empty());
        let has_geo = self.geo_coordinates.as_ref().is_some_and(|c| c.len() == 2)
            && self.distance_meters.is_some_and(|d| d > 0.0);

        match (has_evse, has_geo) {
            (true, false) | (false, true) => Ok(()),
            (true, true) => Err(GatewayError::translation(
                "provide either evse_id or geo_coordinates with distance_meters, not both",
            )),
            (false, false) => Err(GatewayError::translation(
                "either evse_id or geo_coordinates (length 2) with a positive distance_meters is required",
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub name: String,
    #[serde(rename = "geo_coordinates")]
    pub geo_coordinates: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub descriptor: Descriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorAttributes {
    pub connector_type: String,
    #[serde(rename = "maxPowerKW")]
    pub max_power_kw: f64,
    #[serde(rename = "minPowerKW")]
    pub min_power_kw: f64,
    pub socket_count: u32,
    pub reservation_supported: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ocpp_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub evse_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub parking_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub connector_id: String,
    pub power_type: String,
    pub connector_format: String,
    pub charging_speed: String,
    pub status: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub amenity_feature: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub roaming_network: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub id: String,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub availability_window: Vec<AvailabilityWindow>,
    pub connector_attributes: ConnectorAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicableQuantity {
    pub unit_text: String,
    pub unit_code: String,
    pub unit_quantity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub currency: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicable_quantity: Option<ApplicableQuantity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerFinderFee {
    pub fee_type: String,
    pub fee_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_finder_fee: Option<BuyerFinderFee>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub idle_fee_policy: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: String,
    pub descriptor: Descriptor,
    pub items: Vec<String>,
    pub price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity: Option<Validity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub accepted_payment_method: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_attributes: Option<OfferAttributes>,
    pub provider: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub id: String,
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    pub connectors: Vec<Connector>,
    pub offers: Vec<Offer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
    pub catalogs: Vec<Catalog>,
}

impl SearchResponse {
    /// An empty result page.
    pub fn empty(page: Page) -> Self {
        Self {
            total: 0,
            page: page.page,
            per_page: page.per_page,
            catalogs: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Estimate
// ---------------------------------------------------------------------------

/// A price estimate for charging at one connector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateRequest {
    pub evse_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    pub connector_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<Energy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(skip_serializing_if = "RequestMeta::is_empty")]
    pub meta: RequestMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderInfo {
    pub id: String,
    pub mode: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceComponent {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    pub currency: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancellationFee {
    pub percentage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalRef {
    pub mimetype: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<CancellationFee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<ExternalRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub order: OrderInfo,
    pub amount: Amount,
    pub duration_in_minutes: String,
    pub percentage_of_battery_charged: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<Energy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity: Option<Validity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub price_components: Vec<PriceComponent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<CancellationPolicy>,
}
