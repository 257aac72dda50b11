//! Search ↔ `discover` translation.

use gateway::{
    Address, ApplicableQuantity, AvailabilityWindow, BuyerFinderFee, Catalog, Connector,
    ConnectorAttributes, ContextOverrides, Descriptor, GatewayError, Offer, OfferAttributes, Page,
    Price, Provider, Rating, SearchRequest, SearchResponse, TimeWindow, Validity,
};

use crate::envelope::{build_context, meta_from_context, ContextDefaults, WireStamp};
use crate::pb::common;
use crate::pb::discover::{self as pb, DiscoverRequest, OnDiscoverResponse};

/// Geometry type emitted for geo queries.
pub const GEOMETRY_POINT: &str = "Point";

/// Context constants for the `discover` action.
pub const DEFAULTS: ContextDefaults = ContextDefaults {
    version: "1.0.0",
    action: "discover",
    domain: "bhim.com",
    requester_id: "1",
    requester_uri: "bhim.com",
    ttl: "PT30S",
};

// ---------------------------------------------------------------------------
// Egress
// ---------------------------------------------------------------------------

/// Maps a domain search to a `DiscoverRequest`.
///
/// Filters and sort have no wire counterpart and are not sent.
///
/// # Errors
///
/// [`GatewayError::Translation`] when `geo_coordinates` is non-empty but not
/// exactly two values, or when the request has neither an EVSE id nor a
/// geo-point.
pub fn to_wire(
    request: &SearchRequest,
    overrides: &ContextOverrides,
    stamp: &WireStamp,
) -> Result<DiscoverRequest, GatewayError> {
    let geometry = match request.geo_coordinates.as_deref() {
        None | Some([]) => None,
        Some(coords @ [_, _]) => Some(pb::Geometry {
            kind: GEOMETRY_POINT.to_string(),
            coordinates: coords.to_vec(),
        }),
        Some(other) => {
            return Err(GatewayError::translation(format!(
                "geo_coordinates must hold exactly [latitude, longitude], got {} values",
                other.len()
            )))
        }
    };

    let evse_id = request.evse_id.clone().unwrap_or_default();
    if evse_id.is_empty() && geometry.is_none() {
        return Err(GatewayError::translation(
            "search needs an evse_id or geo_coordinates",
        ));
    }

    let message = pb::Message {
        geometry,
        distance_meters: request.distance_meters,
        evse_id,
        time_window: request
            .time_window
            .as_ref()
            .filter(|tw| !tw.is_empty())
            .map(|tw| common::TimeWindow {
                start: tw.start.clone(),
                end: tw.end.clone(),
            }),
    };

    Ok(DiscoverRequest {
        context: Some(build_context(&DEFAULTS, overrides, &request.meta, stamp)),
        message: Some(message),
    })
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Reads a full wire-format discover request back into a domain search.
///
/// The context's explicit values land in `meta`; the locator and time
/// window are mapped field by field. Geometry types other than `Point` are
/// read by their coordinates only.
pub fn from_wire(request: &DiscoverRequest) -> SearchRequest {
    let message = request.message.clone().unwrap_or_default();

    let geo_coordinates = message
        .geometry
        .map(|g| g.coordinates)
        .filter(|c| !c.is_empty());

    SearchRequest {
        evse_id: (!message.evse_id.is_empty()).then_some(message.evse_id),
        geo_coordinates,
        distance_meters: message.distance_meters,
        time_window: message.time_window.map(|tw| TimeWindow {
            start: tw.start,
            end: tw.end,
        }),
        filters: None,
        sort: None,
        meta: meta_from_context(request.context.as_ref()),
    }
}

/// Maps a discover response to a search result page.
///
/// A response without a message yields an empty page. `total` is the number
/// of catalogs returned.
pub fn to_domain(response: &OnDiscoverResponse, page: Page) -> SearchResponse {
    let Some(message) = response.message.as_ref() else {
        return SearchResponse::empty(page);
    };

    let catalogs: Vec<Catalog> = message.catalogs.iter().map(catalog_to_domain).collect();

    SearchResponse {
        total: catalogs.len(),
        page: page.page,
        per_page: page.per_page,
        catalogs,
    }
}

fn descriptor(d: Option<&common::Descriptor>) -> Descriptor {
    Descriptor {
        name: d.map(|d| d.name.clone()).unwrap_or_default(),
    }
}

fn validity(v: &common::Validity) -> Validity {
    Validity {
        start_date: v.start_date.clone(),
        end_date: v.end_date.clone(),
    }
}

fn catalog_to_domain(catalog: &pb::Catalog) -> Catalog {
    // Older responders send no provider block; the catalog id and descriptor
    // then stand in for it.
    let provider = match catalog.provider.as_ref() {
        Some(p) => Provider {
            id: p.id.clone(),
            descriptor: descriptor(p.descriptor.as_ref()),
            address: p.location.as_ref().map(|l| Address {
                name: l.name.clone(),
                geo_coordinates: l.coordinates.clone(),
            }),
        },
        None => Provider {
            id: catalog.id.clone(),
            descriptor: descriptor(catalog.descriptor.as_ref()),
            address: None,
        },
    };

    let rating = catalog
        .items
        .first()
        .and_then(|item| item.rating.as_ref())
        .map(|r| Rating {
            value: r.value,
            count: r.count,
        });

    Catalog {
        id: catalog.id.clone(),
        provider,
        rating,
        connectors: catalog.items.iter().map(item_to_connector).collect(),
        offers: catalog.offers.iter().map(offer_to_domain).collect(),
    }
}

fn item_to_connector(item: &pb::Item) -> Connector {
    let connector_attributes = item
        .item_attributes
        .as_ref()
        .map(|a| ConnectorAttributes {
            connector_type: a.connector_type.clone(),
            max_power_kw: a.max_power_kw,
            min_power_kw: a.min_power_kw,
            socket_count: a.socket_count,
            reservation_supported: a.reservation_supported,
            ocpp_id: a.ocpp_id.clone(),
            evse_id: a.evse_id.clone(),
            parking_type: a.parking_type.clone(),
            connector_id: a.connector_id.clone(),
            power_type: a.power_type.clone(),
            connector_format: a.connector_format.clone(),
            charging_speed: a.charging_speed.clone(),
            status: a.station_status.clone(),
            amenity_feature: a.amenity_feature.clone(),
            roaming_network: a.roaming_network.clone(),
        })
        .unwrap_or_default();

    Connector {
        id: item.id.clone(),
        is_active: item.is_active,
        availability_window: item
            .availability_window
            .iter()
            .map(|w| AvailabilityWindow {
                start_time: w.start_time.clone(),
                end_time: w.end_time.clone(),
            })
            .collect(),
        connector_attributes,
    }
}

fn offer_to_domain(offer: &pb::Offer) -> Offer {
    let price = offer
        .price
        .as_ref()
        .map(|p| Price {
            currency: p.currency.clone(),
            value: p.value,
            applicable_quantity: p.applicable_quantity.as_ref().map(|q| ApplicableQuantity {
                unit_text: q.unit_text.clone(),
                unit_code: q.unit_code.clone(),
                unit_quantity: q.unit_quantity,
            }),
        })
        .unwrap_or_default();

    let offer_attributes = offer.offer_attributes.as_ref().map(|a| OfferAttributes {
        buyer_finder_fee: a.buyer_finder_fee.as_ref().map(|f| BuyerFinderFee {
            fee_type: f.fee_type.clone(),
            fee_value: f.fee_value,
        }),
        idle_fee_policy: a.idle_fee_policy.clone(),
    });

    Offer {
        id: offer.id.clone(),
        descriptor: descriptor(offer.descriptor.as_ref()),
        items: offer.items.clone(),
        price,
        validity: offer.validity.as_ref().map(validity),
        accepted_payment_method: offer.accepted_payment_method.clone(),
        offer_attributes,
        provider: offer.provider.clone(),
    }
}
