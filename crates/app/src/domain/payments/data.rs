//! Payments Data

use crate::domain::{
    orders::{
        data::NewOrderItem,
        records::{OrderRecord, OrderUuid, ShippingAddress},
    },
    pricing::PriceBreakdown,
};

/// Hosted checkout settings shared by every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    /// ISO currency code in lower case, e.g. `inr`.
    pub currency: String,

    /// Storefront origin the processor redirects back to.
    pub frontend_url: String,

    /// Country recorded when a session carries none.
    pub default_country: String,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            currency: "inr".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            default_country: "India".to_string(),
        }
    }
}

impl CheckoutSettings {
    #[must_use]
    pub fn success_url(&self) -> String {
        format!(
            "{}/payment-success?session_id={{CHECKOUT_SESSION_ID}}",
            self.frontend_url.trim_end_matches('/')
        )
    }

    #[must_use]
    pub fn cancel_url(&self) -> String {
        format!("{}/checkout", self.frontend_url.trim_end_matches('/'))
    }
}

/// A request to pay for cart contents, or for an existing unpaid order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckoutSession {
    pub items: Vec<NewOrderItem>,
    pub shipping_address: Option<ShippingAddress>,
    pub order_uuid: Option<OrderUuid>,
    pub client_prices: Option<PriceBreakdown>,
}

/// A session the customer can be redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionCreated {
    pub session_id: String,
    pub url: Option<String>,
    pub prices: PriceBreakdown,
}

/// How a verified session was reflected in the orders table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconciliationOutcome {
    /// A new paid order was rebuilt from the session.
    Created,

    /// The order named by the session was marked paid.
    MarkedPaid,

    /// The session had already been reconciled.
    AlreadyReconciled,
}

impl ReconciliationOutcome {
    /// Metric label: whether a new order row was written.
    #[must_use]
    pub const fn metric_label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::MarkedPaid | Self::AlreadyReconciled => "existing",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub order: OrderRecord,
    pub outcome: ReconciliationOutcome,
}
