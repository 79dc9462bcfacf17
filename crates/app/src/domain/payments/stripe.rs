//! Stripe Checkout client.

use std::{collections::BTreeMap, fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};

use crate::domain::payments::gateway::{
    CheckoutSession, CheckoutSessionRequest, GatewayError, PaymentGateway, SessionLineItem,
};

/// Production API root.
pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Largest page the line item listing returns.
const LINE_ITEMS_PAGE_SIZE: u32 = 100;

/// Configuration for talking to Stripe.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key, sent as a bearer token.
    pub secret_key: String,

    /// API root, overridable for stripe-mock in local setups.
    pub api_base: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"**redacted**")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// HTTP client for the Checkout Sessions API.
#[derive(Debug, Clone)]
pub struct StripeClient {
    config: StripeConfig,
    http: Client,
}

impl StripeClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StripeConfig) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { config, http })
    }

    fn sessions_url(&self) -> String {
        format!(
            "{}/v1/checkout/sessions",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let response = self
            .http
            .post(self.sessions_url())
            .bearer_auth(&self.config.secret_key)
            .form(&checkout_form(&request))
            .send()
            .await?;

        let session: StripeSession = parse_response(response).await?;

        Ok(session.into())
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, GatewayError> {
        if session_id.is_empty() || !session_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(GatewayError::NotFound);
        }

        let response = self
            .http
            .get(format!("{}/{session_id}", self.sessions_url()))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await?;

        let session: StripeSession = parse_response(response).await?;

        let mut session: CheckoutSession = session.into();
        session.line_items = self.list_line_items(session_id).await?;

        Ok(session)
    }
}

impl StripeClient {
    /// Every line item of a session, following the list cursor page by page.
    async fn list_line_items(&self, session_id: &str) -> Result<Vec<SessionLineItem>, GatewayError> {
        let url = format!("{}/{session_id}/line_items", self.sessions_url());

        let mut items = Vec::new();
        let mut starting_after: Option<String> = None;

        loop {
            let mut query = vec![("limit", LINE_ITEMS_PAGE_SIZE.to_string())];

            if let Some(cursor) = &starting_after {
                query.push(("starting_after", cursor.clone()));
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.config.secret_key)
                .query(&query)
                .send()
                .await?;

            let page: StripeList<StripeLineItem> = parse_response(response).await?;

            starting_after = page.next_cursor().map(str::to_string);
            items.extend(page.data.into_iter().map(SessionLineItem::from));

            if starting_after.is_none() {
                return Ok(items);
            }
        }
    }
}

/// Flatten a session request into Stripe's bracketed form encoding.
fn checkout_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];

    if let Some(email) = &request.customer_email {
        form.push(("customer_email".to_string(), email.clone()));
    }

    for (index, item) in request.line_items.iter().enumerate() {
        let prefix = format!("line_items[{index}]");

        form.push((
            format!("{prefix}[price_data][currency]"),
            request.currency.clone(),
        ));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        form.push((
            format!("{prefix}[price_data][unit_amount]"),
            item.unit_amount.to_string(),
        ));
        form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
    }

    for (key, value) in &request.metadata {
        form.push((format!("metadata[{key}]"), value.clone()));
    }

    form
}

async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = response
        .json::<StripeErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error.message)
        .unwrap_or_else(|| status.to_string());

    Err(status_error(status, message))
}

fn status_error(status: StatusCode, message: String) -> GatewayError {
    match status {
        StatusCode::BAD_REQUEST => GatewayError::InvalidRequest(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Authentication,
        StatusCode::NOT_FOUND => GatewayError::NotFound,
        _ => GatewayError::UnexpectedResponse(format!(
            "request failed with status {status}: {message}"
        )),
    }
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    payment_status: String,
    amount_total: Option<u64>,
    customer_email: Option<String>,
    customer_details: Option<StripeCustomerDetails>,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct StripeCustomerDetails {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeList<T> {
    data: Vec<T>,
    #[serde(default)]
    has_more: bool,
}

impl StripeList<StripeLineItem> {
    /// Id to pass as `starting_after` for the next page, if there is one.
    fn next_cursor(&self) -> Option<&str> {
        if !self.has_more {
            return None;
        }

        self.data.last().map(|item| item.id.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct StripeLineItem {
    id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    quantity: Option<u32>,
    amount_total: u64,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl From<StripeSession> for CheckoutSession {
    fn from(session: StripeSession) -> Self {
        let customer_email = session
            .customer_details
            .and_then(|details| details.email)
            .or(session.customer_email);

        Self {
            id: session.id,
            url: session.url,
            payment_status: session.payment_status,
            amount_total: session.amount_total,
            customer_email,
            metadata: session.metadata,
            line_items: Vec::new(),
        }
    }
}

impl From<StripeLineItem> for SessionLineItem {
    fn from(item: StripeLineItem) -> Self {
        Self {
            description: item.description.unwrap_or_default(),
            quantity: item.quantity.unwrap_or(1),
            amount_total: item.amount_total,
        }
    }
}
