//! Estimate ↔ `select` translation.

use gateway::{
    Amount, ContextOverrides, Energy, EstimateRequest, EstimateResponse, GatewayError, OrderInfo,
    PriceComponent, TimeWindow, Validity, Vehicle,
};

use crate::envelope::{build_context, meta_from_context, ContextDefaults, WireStamp};
use crate::pb::common;
use crate::pb::select::{self as pb, OnSelectResponse, SelectRequest};

/// Context constants for the `select` action.
pub const DEFAULTS: ContextDefaults = ContextDefaults {
    version: "1.0.0",
    action: "select",
    domain: "bhim.com",
    requester_id: "1",
    requester_uri: "bhim.com",
    ttl: "PT30S",
};

/// Maps a domain estimate request to a `SelectRequest`.
///
/// Vehicle, time window, energy and amount are sent only when at least one
/// of their sub-fields carries a value.
///
/// # Errors
///
/// [`GatewayError::Translation`] when `evse_id` is empty.
pub fn to_wire(
    request: &EstimateRequest,
    overrides: &ContextOverrides,
    stamp: &WireStamp,
) -> Result<SelectRequest, GatewayError> {
    if request.evse_id.is_empty() {
        return Err(GatewayError::translation("estimate needs an evse_id"));
    }

    let message = pb::Message {
        evse_id: request.evse_id.clone(),
        connector_id: request.connector_id.clone(),
        offer_id: request.offer_id.clone().unwrap_or_default(),
        vehicle: request
            .vehicle
            .as_ref()
            .filter(|v| !v.is_empty())
            .map(|v| pb::Vehicle {
                make: v.make.clone(),
                model: v.model.clone(),
                kind: v.kind.clone(),
            }),
        time_window: request
            .time_window
            .as_ref()
            .filter(|tw| !tw.is_empty())
            .map(|tw| common::TimeWindow {
                start: tw.start.clone(),
                end: tw.end.clone(),
            }),
        energy: request
            .energy
            .as_ref()
            .filter(|e| !e.is_empty())
            .map(|e| pb::Energy {
                value: e.value,
                unit: e.unit.clone(),
            }),
        amount: request
            .amount
            .as_ref()
            .filter(|a| !a.is_empty())
            .map(|a| pb::Amount {
                value: a.value,
                currency: a.currency.clone(),
            }),
    };

    Ok(SelectRequest {
        context: Some(build_context(&DEFAULTS, overrides, &request.meta, stamp)),
        message: Some(message),
    })
}

/// Reads a full wire-format select request back into a domain request.
pub fn from_wire(request: &SelectRequest) -> EstimateRequest {
    let message = request.message.clone().unwrap_or_default();

    EstimateRequest {
        evse_id: message.evse_id,
        vehicle: message.vehicle.map(|v| Vehicle {
            make: v.make,
            model: v.model,
            kind: v.kind,
        }),
        connector_id: message.connector_id,
        time_window: message.time_window.map(|tw| TimeWindow {
            start: tw.start,
            end: tw.end,
        }),
        energy: message.energy.map(|e| Energy {
            value: e.value,
            unit: e.unit,
        }),
        offer_id: (!message.offer_id.is_empty()).then_some(message.offer_id),
        amount: message.amount.map(|a| Amount {
            value: a.value,
            currency: a.currency,
        }),
        meta: meta_from_context(request.context.as_ref()),
    }
}

/// Maps a select response to a domain estimate.
///
/// A response without an order yields the default estimate. Validity comes
/// from the first order item whose accepted offer has one; energy from the
/// first item that reports a quantity.
pub fn to_domain(response: &OnSelectResponse) -> EstimateResponse {
    let Some(order) = response.message.as_ref().and_then(|m| m.order.as_ref()) else {
        return EstimateResponse::default();
    };

    let mut estimate = EstimateResponse {
        order: OrderInfo {
            id: order.id.clone(),
            mode: order
                .fulfillment
                .as_ref()
                .map(|f| f.mode.clone())
                .unwrap_or_default(),
            status: order.order_status.clone(),
        },
        ..EstimateResponse::default()
    };

    if let Some(value) = order.order_value.as_ref() {
        estimate.amount = Amount {
            value: value.value,
            currency: value.currency.clone(),
        };
        estimate.price_components = value
            .components
            .iter()
            .map(|c| PriceComponent {
                kind: c.kind.clone(),
                value: c.value,
                currency: c.currency.clone(),
                description: c.description.clone(),
            })
            .collect();
    }

    estimate.validity = order
        .order_items
        .iter()
        .find_map(|item| item.accepted_offer.as_ref()?.validity.as_ref())
        .map(|v| Validity {
            start_date: v.start_date.clone(),
            end_date: v.end_date.clone(),
        });

    estimate.energy = order
        .order_items
        .iter()
        .find_map(|item| item.quantity.as_ref())
        .map(|q| Energy {
            value: q.value,
            unit: q.unit.clone(),
        });

    estimate
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::{MessageId, Timestamp, TransactionId};

    fn stamp() -> WireStamp {
        WireStamp {
            transaction_id: TransactionId::new("t1").unwrap(),
            message_id: MessageId::new("m1").unwrap(),
            timestamp: Timestamp::now(),
        }
    }

    fn request() -> EstimateRequest {
        EstimateRequest {
            evse_id: "IN*ECO*BTM*01*CCS2*A".into(),
            connector_id: "1".into(),
            ..EstimateRequest::default()
        }
    }

    #[test]
    fn empty_nested_objects_are_omitted() {
        let mut req = request();
        req.vehicle = Some(Vehicle::default());
        req.energy = Some(Energy::default());
        req.time_window = Some(TimeWindow::default());

        let message = to_wire(&req, &ContextOverrides::default(), &stamp())
            .unwrap()
            .message
            .unwrap();
        assert!(message.vehicle.is_none());
        assert!(message.energy.is_none());
        assert!(message.time_window.is_none());
        assert!(message.amount.is_none());
    }

    #[test]
    fn partially_filled_vehicle_is_sent() {
        let mut req = request();
        req.vehicle = Some(Vehicle {
            make: "Tata".into(),
            ..Vehicle::default()
        });
        let message = to_wire(&req, &ContextOverrides::default(), &stamp())
            .unwrap()
            .message
            .unwrap();
        assert_eq!(message.vehicle.unwrap().make, "Tata");
    }

    #[test]
    fn select_context_uses_select_action() {
        let wire = to_wire(&request(), &ContextOverrides::default(), &stamp()).unwrap();
        let context = wire.context.unwrap();
        assert_eq!(context.action, "select");
        assert_eq!(context.version, "1.0.0");
        assert_eq!(context.transaction_id, "t1");
    }

    #[test]
    fn missing_evse_is_a_translation_error() {
        let err = to_wire(&EstimateRequest::default(), &ContextOverrides::default(), &stamp())
            .unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn order_without_message_yields_default() {
        assert_eq!(to_domain(&OnSelectResponse::default()), EstimateResponse::default());
    }
}
