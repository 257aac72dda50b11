//! Static capability services.
//!
//! Return a fixed, realistic payload for every request. Used as the
//! secondary behind a fallback and as the sole implementation when no
//! upstream is configured.

use async_trait::async_trait;
use gateway::{
    Address, Amount, ApplicableQuantity, AvailabilityWindow, BuyerFinderFee, CallContext,
    CancellationFee, CancellationPolicy, Catalog, Connector, ConnectorAttributes, Descriptor,
    Energy, EstimateRequest, EstimateResponse, EstimateService, ExternalRef, GatewayError, Offer,
    OfferAttributes, OrderInfo, Page, Price, PriceComponent, Provider, Rating, SearchRequest,
    SearchResponse, SearchService, Validity,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct MockSearchService;

impl MockSearchService {
    pub fn new() -> Self {
        Self
    }
}

fn sample_catalog() -> Catalog {
    Catalog {
        id: "catalog-ev-charging-001".into(),
        provider: Provider {
            id: "ecopower-charging".into(),
            descriptor: Descriptor {
                name: "EcoPower Charging Pvt Ltd".into(),
            },
            address: Some(Address {
                name: "MG JVLR Jogeshwari Caves Road".into(),
                geo_coordinates: vec![12.9716, 77.5946],
            }),
        },
        rating: Some(Rating {
            value: 4.5,
            count: 128,
        }),
        connectors: vec![Connector {
            id: "ev-charger-ccs2-001".into(),
            is_active: true,
            availability_window: vec![AvailabilityWindow {
                start_time: "06:00:00".into(),
                end_time: "22:00:00".into(),
            }],
            connector_attributes: ConnectorAttributes {
                connector_type: "CCS2".into(),
                max_power_kw: 60.0,
                min_power_kw: 5.0,
                socket_count: 2,
                reservation_supported: true,
                status: "Available".into(),
                charging_speed: "FAST".into(),
                power_type: "DC".into(),
                connector_format: "CABLE".into(),
                ..ConnectorAttributes::default()
            },
        }],
        offers: vec![Offer {
            id: "offer-ccs2-60kw-kwh".into(),
            descriptor: Descriptor {
                name: "Per-kWh Tariff - CCS2 60kW".into(),
            },
            items: vec!["ev-charger-ccs2-001".into()],
            price: Price {
                currency: "INR".into(),
                value: 18.0,
                applicable_quantity: Some(ApplicableQuantity {
                    unit_text: "Kilowatt Hour".into(),
                    unit_code: "KWH".into(),
                    unit_quantity: 1.0,
                }),
            },
            validity: Some(Validity {
                start_date: "2025-10-01T00:00:00Z".into(),
                end_date: "2026-03-31T23:59:59Z".into(),
            }),
            accepted_payment_method: vec!["UPI".into(), "Card".into(), "Wallet".into()],
            offer_attributes: Some(OfferAttributes {
                buyer_finder_fee: Some(BuyerFinderFee {
                    fee_type: "PERCENTAGE".into(),
                    fee_value: 2.5,
                }),
                idle_fee_policy: "₹2/min after 10 min post-charge".into(),
            }),
            provider: "ecopower-charging".into(),
        }],
    }
}

#[async_trait]
impl SearchService for MockSearchService {
    async fn search(
        &self,
        ctx: &CallContext,
        page: Page,
        _request: &SearchRequest,
    ) -> Result<SearchResponse, GatewayError> {
        tracing::debug!(transaction_id = %ctx.transaction_id(), "Serving search from mock");
        let catalogs = vec![sample_catalog()];
        Ok(SearchResponse {
            total: catalogs.len(),
            page: page.page,
            per_page: page.per_page,
            catalogs,
        })
    }
}

// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct MockEstimateService;

impl MockEstimateService {
    pub fn new() -> Self {
        Self
    }
}

fn component(kind: &str, value: f64, description: &str) -> PriceComponent {
    PriceComponent {
        kind: kind.into(),
        value,
        currency: "INR".into(),
        description: description.into(),
    }
}

#[async_trait]
impl EstimateService for MockEstimateService {
    async fn estimate(
        &self,
        ctx: &CallContext,
        _request: &EstimateRequest,
    ) -> Result<EstimateResponse, GatewayError> {
        tracing::debug!(transaction_id = %ctx.transaction_id(), "Serving estimate from mock");
        Ok(EstimateResponse {
            order: OrderInfo {
                id: "1231208-id".into(),
                mode: "reservation".into(),
                status: "quoted_price".into(),
            },
            amount: Amount {
                value: 128.64,
                currency: "INR".into(),
            },
            duration_in_minutes: "15".into(),
            percentage_of_battery_charged: "80".into(),
            energy: Some(Energy {
                value: 30.0,
                unit: "kWh".into(),
            }),
            validity: Some(Validity {
                start_date: "2025-01-27T00:00:00Z".into(),
                end_date: "2025-04-27T23:59:59Z".into(),
            }),
            price_components: vec![
                component("UNIT", 100.0, "Base charging session cost (100 INR)"),
                component("SURCHARGE", 20.0, "Surge price (20%)"),
                component("DISCOUNT", -15.0, "Offer discount (15%)"),
                component("FEE", 10.0, "Service fee"),
                component("FEE", 13.64, "Overcharge estimation"),
                component("Pending Payment", 0.64, "Pending payment"),
            ],
            cancellation: Some(CancellationPolicy {
                fee: Some(CancellationFee {
                    percentage: "30".into(),
                }),
                external_ref: Some(ExternalRef {
                    mimetype: "text/html".into(),
                    url: "https://example-company.com/charge/tnc.html".into(),
                }),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_search_echoes_page() {
        let resp = MockSearchService::new()
            .search(
                &CallContext::new(),
                Page::new(Some(4), Some(5)),
                &SearchRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(resp.total, 1);
        assert_eq!(resp.page, 4);
        assert_eq!(resp.per_page, 5);
    }

    #[tokio::test]
    async fn mock_estimate_is_a_full_quote() {
        let resp = MockEstimateService::new()
            .estimate(&CallContext::new(), &EstimateRequest::default())
            .await
            .unwrap();
        assert_eq!(resp.order.status, "quoted_price");
        assert_eq!(resp.amount.currency, "INR");
        assert_eq!(resp.price_components.len(), 6);
        assert!(resp.cancellation.is_some());
    }
}
