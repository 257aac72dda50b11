//! `discover` package: `DiscoveryService/Discover`.

use super::common::{Context, Descriptor, Error, TimeWindow, Validity};

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DiscoverRequest {
    #[prost(message, optional, tag = "1")]
    pub context: Option<Context>,
    #[prost(message, optional, tag = "2")]
    pub message: Option<Message>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Message {
    #[prost(message, optional, tag = "1")]
    pub geometry: Option<Geometry>,
    #[prost(double, optional, tag = "2")]
    pub distance_meters: Option<f64>,
    #[prost(string, tag = "3")]
    pub evse_id: String,
    #[prost(message, optional, tag = "4")]
    pub time_window: Option<TimeWindow>,
}

/// GeoJSON-style geometry. Only `Point` is produced by the gateway.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Geometry {
    #[prost(string, tag = "1")]
    pub kind: String,
    #[prost(double, repeated, tag = "2")]
    pub coordinates: Vec<f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnDiscoverResponse {
    #[prost(message, optional, tag = "1")]
    pub context: Option<Context>,
    #[prost(message, optional, tag = "2")]
    pub message: Option<OnDiscoverMessage>,
    #[prost(message, optional, tag = "3")]
    pub error: Option<Error>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnDiscoverMessage {
    #[prost(message, repeated, tag = "1")]
    pub catalogs: Vec<Catalog>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Catalog {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "2")]
    pub descriptor: Option<Descriptor>,
    #[prost(message, optional, tag = "3")]
    pub validity: Option<Validity>,
    #[prost(message, repeated, tag = "4")]
    pub items: Vec<Item>,
    #[prost(message, repeated, tag = "5")]
    pub offers: Vec<Offer>,
    #[prost(message, optional, tag = "6")]
    pub provider: Option<Provider>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Provider {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "2")]
    pub descriptor: Option<Descriptor>,
    #[prost(message, optional, tag = "3")]
    pub location: Option<Location>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Location {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(double, repeated, tag = "2")]
    pub coordinates: Vec<f64>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Item {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(bool, tag = "2")]
    pub is_active: bool,
    #[prost(message, repeated, tag = "3")]
    pub availability_window: Vec<AvailabilityWindow>,
    #[prost(message, optional, tag = "4")]
    pub rating: Option<Rating>,
    #[prost(message, optional, tag = "5")]
    pub item_attributes: Option<ItemAttributes>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AvailabilityWindow {
    #[prost(string, tag = "1")]
    pub start_time: String,
    #[prost(string, tag = "2")]
    pub end_time: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Rating {
    #[prost(double, tag = "1")]
    pub value: f64,
    #[prost(uint32, tag = "2")]
    pub count: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ItemAttributes {
    #[prost(string, tag = "1")]
    pub connector_type: String,
    #[prost(double, tag = "2")]
    pub max_power_kw: f64,
    #[prost(double, tag = "3")]
    pub min_power_kw: f64,
    #[prost(uint32, tag = "4")]
    pub socket_count: u32,
    #[prost(bool, tag = "5")]
    pub reservation_supported: bool,
    #[prost(string, tag = "6")]
    pub ocpp_id: String,
    #[prost(string, tag = "7")]
    pub evse_id: String,
    #[prost(string, tag = "8")]
    pub parking_type: String,
    #[prost(string, tag = "9")]
    pub connector_id: String,
    #[prost(string, tag = "10")]
    pub power_type: String,
    #[prost(string, tag = "11")]
    pub connector_format: String,
    #[prost(string, tag = "12")]
    pub charging_speed: String,
    #[prost(string, tag = "13")]
    pub station_status: String,
    #[prost(string, repeated, tag = "14")]
    pub amenity_feature: Vec<String>,
    #[prost(string, tag = "15")]
    pub roaming_network: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Offer {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "2")]
    pub descriptor: Option<Descriptor>,
    #[prost(string, repeated, tag = "3")]
    pub items: Vec<String>,
    #[prost(message, optional, tag = "4")]
    pub price: Option<Price>,
    #[prost(message, optional, tag = "5")]
    pub validity: Option<Validity>,
    #[prost(string, repeated, tag = "6")]
    pub accepted_payment_method: Vec<String>,
    #[prost(message, optional, tag = "7")]
    pub offer_attributes: Option<OfferAttributes>,
    #[prost(string, tag = "8")]
    pub provider: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Price {
    #[prost(string, tag = "1")]
    pub currency: String,
    #[prost(double, tag = "2")]
    pub value: f64,
    #[prost(message, optional, tag = "3")]
    pub applicable_quantity: Option<ApplicableQuantity>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ApplicableQuantity {
    #[prost(string, tag = "1")]
    pub unit_text: String,
    #[prost(string, tag = "2")]
    pub unit_code: String,
    #[prost(double, tag = "3")]
    pub unit_quantity: f64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OfferAttributes {
    #[prost(message, optional, tag = "1")]
    pub buyer_finder_fee: Option<BuyerFinderFee>,
    #[prost(string, tag = "2")]
    pub idle_fee_policy: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BuyerFinderFee {
    #[prost(string, tag = "1")]
    pub fee_type: String,
    #[prost(double, tag = "2")]
    pub fee_value: f64,
}
