//! Payments service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rustc_hash::FxHashMap;
use sqlx::{Postgres, Transaction};
use tracing::{debug, error, info, warn};

use crate::{
    database::Db,
    domain::{
        carts::repositories::PgCartsRepository,
        orders::{
            data::{OrderItemDraft, PaymentUpdate},
            records::{OrderRecord, OrderUuid, ShippingAddress},
            repositories::{PgOrderItemsRepository, PgOrdersRepository},
        },
        payments::{
            data::{
                CheckoutSessionCreated, CheckoutSettings, NewCheckoutSession, Reconciliation,
                ReconciliationOutcome,
            },
            errors::PaymentsServiceError,
            gateway::{CheckoutLineItem, CheckoutSession, CheckoutSessionRequest, PaymentGateway},
            reconcile::{SessionMetadata, checkout_metadata, draft_from_session},
        },
        pricing::{PriceBreakdown, PricingPolicy, SHIPPING_LINE_LABEL, items_subtotal},
        products::{
            records::{ProductRecord, ProductUuid},
            repository::PgProductsRepository,
        },
        users::records::{Actor, UserRecord, UserUuid},
    },
};

/// What a checkout session charges for, before the tax and shipping lines.
#[derive(Debug)]
struct CheckoutPlan {
    line_items: Vec<CheckoutLineItem>,
    manifest: Vec<(ProductUuid, u32)>,
    prices: PriceBreakdown,
    shipping_address: ShippingAddress,
}

#[derive(Clone)]
pub struct PgPaymentsService {
    db: Db,
    policy: PricingPolicy,
    settings: CheckoutSettings,
    gateway: Arc<dyn PaymentGateway>,
    orders_repository: PgOrdersRepository,
    items_repository: PgOrderItemsRepository,
    products_repository: PgProductsRepository,
    carts_repository: PgCartsRepository,
}

impl PgPaymentsService {
    #[must_use]
    pub fn new(
        db: Db,
        policy: PricingPolicy,
        settings: CheckoutSettings,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            db,
            policy,
            settings,
            gateway,
            orders_repository: PgOrdersRepository::new(),
            items_repository: PgOrderItemsRepository::new(),
            products_repository: PgProductsRepository::new(),
            carts_repository: PgCartsRepository::new(),
        }
    }

    async fn with_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut order: OrderRecord,
    ) -> Result<OrderRecord, PaymentsServiceError> {
        self.items_repository
            .attach_items(tx, std::slice::from_mut(&mut order))
            .await?;

        Ok(order)
    }

    /// Price the requested items from the catalog.
    async fn cart_checkout(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: &NewCheckoutSession,
    ) -> Result<CheckoutPlan, PaymentsServiceError> {
        let shipping_address = validate_checkout(request)?;

        let product_uuids: Vec<ProductUuid> = request
            .items
            .iter()
            .map(|item| item.product_uuid)
            .collect();

        let products: FxHashMap<ProductUuid, ProductRecord> = self
            .products_repository
            .get_products(tx, &product_uuids)
            .await?
            .into_iter()
            .map(|product| (product.uuid, product))
            .collect();

        let mut line_items = Vec::with_capacity(request.items.len() + 2);

        for item in &request.items {
            let product = products
                .get(&item.product_uuid)
                .ok_or(PaymentsServiceError::ProductNotFound(item.product_uuid))?;

            if let Some(client_unit_price) = item.client_unit_price
                && client_unit_price != product.effective_price()
            {
                warn!(
                    product_uuid = %product.uuid,
                    client_unit_price,
                    server_unit_price = product.effective_price(),
                    "client unit price differs from catalog price"
                );
            }

            line_items.push(CheckoutLineItem {
                name: product.name.clone(),
                unit_amount: product.effective_price(),
                quantity: item.quantity,
            });
        }

        let prices = self.policy.quote(items_subtotal(
            line_items
                .iter()
                .map(|line| (line.unit_amount, line.quantity)),
        ));

        let manifest = request
            .items
            .iter()
            .map(|item| (item.product_uuid, item.quantity))
            .collect();

        Ok(CheckoutPlan {
            line_items,
            manifest,
            prices,
            shipping_address,
        })
    }

    /// Charge exactly what an existing unpaid order recorded. Items sent with
    /// the request are ignored.
    async fn order_checkout(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: &UserRecord,
        order: OrderUuid,
        request: &NewCheckoutSession,
    ) -> Result<CheckoutPlan, PaymentsServiceError> {
        let order = self
            .orders_repository
            .get_order(tx, order)
            .await
            .map_err(|error| match error {
                sqlx::Error::RowNotFound => PaymentsServiceError::OrderNotFound,
                error => error.into(),
            })?;

        if !customer.actor().may_access(order.user_uuid) {
            return Err(PaymentsServiceError::Forbidden);
        }

        if order.is_paid {
            return Err(PaymentsServiceError::OrderAlreadyPaid);
        }

        if !order.status.accepts_online_payment() {
            return Err(PaymentsServiceError::OrderNotPayable(order.status));
        }

        let order = self.with_items(tx, order).await?;

        if !request.items.is_empty() {
            debug!(
                order_uuid = %order.uuid,
                requested_lines = request.items.len(),
                "charging the stored order instead of the requested items"
            );
        }

        let line_items = order
            .items
            .iter()
            .map(|item| CheckoutLineItem {
                name: item.name.clone(),
                unit_amount: item.unit_price,
                quantity: item.quantity,
            })
            .collect();

        let manifest = order
            .items
            .iter()
            .filter_map(|item| Some((item.product_uuid?, item.quantity)))
            .collect();

        Ok(CheckoutPlan {
            line_items,
            manifest,
            prices: order.prices,
            shipping_address: order.shipping_address,
        })
    }

    async fn already_reconciled(
        &self,
        mut tx: Transaction<'_, Postgres>,
        actor: Actor,
        order: OrderRecord,
    ) -> Result<Reconciliation, PaymentsServiceError> {
        if !actor.may_access(order.user_uuid) {
            return Err(PaymentsServiceError::Forbidden);
        }

        let order = self.with_items(&mut tx, order).await?;

        tx.commit().await?;

        let reconciliation = Reconciliation {
            order,
            outcome: ReconciliationOutcome::AlreadyReconciled,
        };

        record_outcome(&reconciliation);

        Ok(reconciliation)
    }

    /// Mark the order named in the session metadata as paid.
    ///
    /// The order must still accept payment and the session must have charged
    /// its exact total; anything else is left for manual handling.
    async fn mark_named_order_paid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        actor: Actor,
        session: &CheckoutSession,
        order: OrderRecord,
        now: Timestamp,
    ) -> Result<Reconciliation, PaymentsServiceError> {
        if !actor.may_access(order.user_uuid) {
            return Err(PaymentsServiceError::Forbidden);
        }

        if order.is_paid {
            return Ok(Reconciliation {
                order: self.with_items(tx, order).await?,
                outcome: ReconciliationOutcome::AlreadyReconciled,
            });
        }

        if !order.status.accepts_online_payment() {
            error!(
                order_uuid = %order.uuid,
                session_id = %session.id,
                status = %order.status,
                "paid session names an order that no longer accepts payment"
            );

            return Err(PaymentsServiceError::OrderNotPayable(order.status));
        }

        if session.amount_total != Some(order.prices.total) {
            error!(
                order_uuid = %order.uuid,
                session_id = %session.id,
                expected = order.prices.total,
                charged = ?session.amount_total,
                "paid session amount does not match order total"
            );

            return Err(PaymentsServiceError::AmountMismatch {
                expected: order.prices.total,
                charged: session.amount_total,
            });
        }

        let payment = PaymentUpdate {
            reference: session.id.clone(),
            status: Some(session.payment_status.clone()),
            update_time: Some(now.to_string()),
            email: session.customer_email.clone(),
        };

        let paid = self
            .orders_repository
            .mark_paid(tx, order.uuid, &payment, now)
            .await?
            .ok_or(PaymentsServiceError::OrderNotFound)?;

        Ok(Reconciliation {
            order: self.with_items(tx, paid).await?,
            outcome: ReconciliationOutcome::MarkedPaid,
        })
    }
}

impl std::fmt::Debug for PgPaymentsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgPaymentsService")
            .field("policy", &self.policy)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PaymentsService for PgPaymentsService {
    #[tracing::instrument(
        name = "payments.create_checkout_session",
        skip(self, customer, request),
        fields(user_uuid = %customer.uuid, order_uuid = ?request.order_uuid, session_id),
        err
    )]
    async fn create_checkout_session(
        &self,
        customer: UserRecord,
        request: NewCheckoutSession,
    ) -> Result<CheckoutSessionCreated, PaymentsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let plan = match request.order_uuid {
            Some(order) => {
                self.order_checkout(&mut tx, &customer, order, &request)
                    .await?
            }
            None => self.cart_checkout(&mut tx, &request).await?,
        };

        tx.commit().await?;

        let CheckoutPlan {
            mut line_items,
            manifest,
            prices,
            shipping_address,
        } = plan;

        if let Some(client) = request.client_prices
            && client != prices
        {
            warn!(
                client_total = client.total,
                server_total = prices.total,
                "client price breakdown differs from server quote"
            );
        }

        line_items.push(CheckoutLineItem {
            name: self.policy.tax_line_label(),
            unit_amount: prices.tax,
            quantity: 1,
        });

        if prices.shipping > 0 {
            line_items.push(CheckoutLineItem {
                name: SHIPPING_LINE_LABEL.to_string(),
                unit_amount: prices.shipping,
                quantity: 1,
            });
        }

        let session = self
            .gateway
            .create_checkout_session(CheckoutSessionRequest {
                line_items,
                currency: self.settings.currency.clone(),
                success_url: self.settings.success_url(),
                cancel_url: self.settings.cancel_url(),
                customer_email: Some(customer.email.clone()),
                metadata: checkout_metadata(
                    customer.uuid,
                    request.order_uuid,
                    &shipping_address,
                    prices,
                    &manifest,
                ),
            })
            .await?;

        tracing::Span::current().record("session_id", session.id.as_str());
        info!(total = prices.total, "checkout session created");

        Ok(CheckoutSessionCreated {
            session_id: session.id,
            url: session.url,
            prices,
        })
    }

    #[tracing::instrument(
        name = "payments.verify_session",
        skip(self, actor),
        fields(user_uuid = %actor.uuid, outcome),
        err
    )]
    async fn verify_session(
        &self,
        actor: Actor,
        session_id: String,
    ) -> Result<Reconciliation, PaymentsServiceError> {
        let session = self
            .gateway
            .retrieve_checkout_session(session_id.trim())
            .await?;

        if !session.is_paid() {
            return Err(PaymentsServiceError::PaymentIncomplete {
                status: session.payment_status,
            });
        }

        let metadata = SessionMetadata::parse(&session.metadata, &self.settings.default_country);
        let owner: UserUuid = metadata.user.unwrap_or(actor.uuid);

        if !actor.may_access(owner) {
            return Err(PaymentsServiceError::Forbidden);
        }

        let now = Timestamp::now();
        let mut tx = self.db.begin_transaction().await?;

        if let Some(existing) = self
            .orders_repository
            .find_by_payment_reference(&mut tx, &session.id)
            .await?
        {
            return self.already_reconciled(tx, actor, existing).await;
        }

        if let Some(order_uuid) = metadata.order
            && let Some(order) = self.orders_repository.lock_order(&mut tx, order_uuid).await?
        {
            let reconciliation = self
                .mark_named_order_paid(&mut tx, actor, &session, order, now)
                .await?;

            tx.commit().await?;

            record_outcome(&reconciliation);

            return Ok(reconciliation);
        }

        let draft = draft_from_session(&session, &metadata, owner, &self.policy, now);

        let Some(mut created) = self.orders_repository.insert_order(&mut tx, &draft).await? else {
            let existing = self
                .orders_repository
                .find_by_payment_reference(&mut tx, &session.id)
                .await?
                .ok_or(PaymentsServiceError::NotFound)?;

            return self.already_reconciled(tx, actor, existing).await;
        };

        created.items = self
            .items_repository
            .insert_items(&mut tx, created.uuid, &draft.items)
            .await?;

        for (product, quantity) in settled_quantities(&draft.items) {
            self.products_repository
                .settle_stock(&mut tx, product, quantity)
                .await?;
        }

        self.carts_repository.clear_for_user(&mut tx, owner).await?;

        tx.commit().await?;

        let reconciliation = Reconciliation {
            order: created,
            outcome: ReconciliationOutcome::Created,
        };

        record_outcome(&reconciliation);

        Ok(reconciliation)
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Price the items server-side and open a hosted checkout session.
    async fn create_checkout_session(
        &self,
        customer: UserRecord,
        request: NewCheckoutSession,
    ) -> Result<CheckoutSessionCreated, PaymentsServiceError>;

    /// Reconcile a completed session into exactly one paid order.
    async fn verify_session(
        &self,
        actor: Actor,
        session_id: String,
    ) -> Result<Reconciliation, PaymentsServiceError>;
}

fn validate_checkout(request: &NewCheckoutSession) -> Result<ShippingAddress, PaymentsServiceError> {
    if request.items.is_empty() {
        return Err(PaymentsServiceError::EmptyCart);
    }

    if request.items.iter().any(|item| item.quantity == 0) {
        return Err(PaymentsServiceError::InvalidQuantity);
    }

    request
        .shipping_address
        .clone()
        .filter(ShippingAddress::is_complete)
        .ok_or(PaymentsServiceError::MissingShippingAddress)
}

fn settled_quantities(items: &[OrderItemDraft]) -> Vec<(ProductUuid, u32)> {
    let mut totals: FxHashMap<ProductUuid, u32> = FxHashMap::default();

    for item in items {
        if let Some(product) = item.product_uuid {
            let total = totals.entry(product).or_default();
            *total = total.saturating_add(item.quantity);
        }
    }

    let mut totals: Vec<(ProductUuid, u32)> = totals.into_iter().collect();
    totals.sort_unstable_by_key(|(uuid, _)| *uuid);
    totals
}

fn record_outcome(reconciliation: &Reconciliation) {
    tracing::Span::current().record("outcome", reconciliation.outcome.metric_label());

    info!(
        order_uuid = %reconciliation.order.uuid,
        outcome = ?reconciliation.outcome,
        "payment reconciled"
    );
}
