//! `select` package: `SelectService/Select`.

use super::common::{Context, Error, TimeWindow, Validity};

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SelectRequest {
    #[prost(message, optional, tag = "1")]
    pub context: Option<Context>,
    #[prost(message, optional, tag = "2")]
    pub message: Option<Message>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Message {
    #[prost(string, tag = "1")]
    pub evse_id: String,
    #[prost(string, tag = "2")]
    pub connector_id: String,
    #[prost(string, tag = "3")]
    pub offer_id: String,
    #[prost(message, optional, tag = "4")]
    pub vehicle: Option<Vehicle>,
    #[prost(message, optional, tag = "5")]
    pub time_window: Option<TimeWindow>,
    #[prost(message, optional, tag = "6")]
    pub energy: Option<Energy>,
    #[prost(message, optional, tag = "7")]
    pub amount: Option<Amount>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Vehicle {
    #[prost(string, tag = "1")]
    pub make: String,
    #[prost(string, tag = "2")]
    pub model: String,
    #[prost(string, tag = "3")]
    pub kind: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Energy {
    #[prost(double, tag = "1")]
    pub value: f64,
    #[prost(string, tag = "2")]
    pub unit: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Amount {
    #[prost(double, tag = "1")]
    pub value: f64,
    #[prost(string, tag = "2")]
    pub currency: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnSelectResponse {
    #[prost(message, optional, tag = "1")]
    pub context: Option<Context>,
    #[prost(message, optional, tag = "2")]
    pub message: Option<OnSelectMessage>,
    #[prost(message, optional, tag = "3")]
    pub error: Option<Error>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OnSelectMessage {
    #[prost(message, optional, tag = "1")]
    pub order: Option<Order>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Order {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub order_status: String,
    #[prost(message, optional, tag = "3")]
    pub fulfillment: Option<Fulfillment>,
    #[prost(message, optional, tag = "4")]
    pub order_value: Option<OrderValue>,
    #[prost(message, repeated, tag = "5")]
    pub order_items: Vec<OrderItem>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Fulfillment {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub mode: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OrderValue {
    #[prost(string, tag = "1")]
    pub currency: String,
    #[prost(double, tag = "2")]
    pub value: f64,
    #[prost(message, repeated, tag = "3")]
    pub components: Vec<PriceComponent>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PriceComponent {
    #[prost(string, tag = "1")]
    pub kind: String,
    #[prost(double, tag = "2")]
    pub value: f64,
    #[prost(string, tag = "3")]
    pub currency: String,
    #[prost(string, tag = "4")]
    pub description: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct OrderItem {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "2")]
    pub accepted_offer: Option<AcceptedOffer>,
    /// Energy quoted for this item, when the provider reports it.
    #[prost(message, optional, tag = "3")]
    pub quantity: Option<Energy>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AcceptedOffer {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(message, optional, tag = "2")]
    pub validity: Option<Validity>,
}
