//! Payment processor boundary.

use std::collections::BTreeMap;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

/// One line on the hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLineItem {
    pub name: String,
    /// Minor units per unit.
    pub unit_amount: u64,
    pub quantity: u32,
}

/// Everything needed to open a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub line_items: Vec<CheckoutLineItem>,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

/// A hosted checkout session as the processor reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    /// `paid`, `unpaid` or `no_payment_required`.
    pub payment_status: String,
    pub amount_total: Option<u64>,
    pub customer_email: Option<String>,
    pub metadata: BTreeMap<String, String>,
    /// Only populated when the session is retrieved.
    pub line_items: Vec<SessionLineItem>,
}

impl CheckoutSession {
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }
}

/// A purchased line as recorded on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
    pub description: String,
    pub quantity: u32,
    /// Minor units for the whole line.
    pub amount_total: u64,
}

/// Hosted checkout operations.
#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted checkout session.
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError>;

    /// Fetch a session with its line items.
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, GatewayError>;
}

/// Errors that can occur when talking to the payment processor.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The processor rejected the request parameters.
    #[error("payment processor rejected the request: {0}")]
    InvalidRequest(String),

    /// The configured credentials were refused.
    #[error("payment processor authentication failed")]
    Authentication,

    #[error("checkout session not found")]
    NotFound,

    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from payment processor: {0}")]
    UnexpectedResponse(String),
}
