//! Session metadata and order reconstruction.
//!
//! A checkout session carries just enough metadata to rebuild the order it
//! paid for when no order row exists yet. Everything here is pure.

use std::collections::BTreeMap;

use jiff::Timestamp;

use crate::domain::{
    orders::{
        data::{OrderDraft, OrderItemDraft},
        records::{OrderUuid, PaymentDetails, ShippingAddress},
    },
    payments::gateway::{CheckoutSession, SessionLineItem},
    pricing::{PriceBreakdown, PricingPolicy, SHIPPING_LINE_LABEL},
    products::records::ProductUuid,
    users::records::UserUuid,
};

pub(crate) const USER_KEY: &str = "userId";
pub(crate) const ORDER_KEY: &str = "orderId";
pub(crate) const STREET_KEY: &str = "shippingAddress";
pub(crate) const CITY_KEY: &str = "city";
pub(crate) const STATE_KEY: &str = "state";
pub(crate) const ZIP_KEY: &str = "zip";
pub(crate) const COUNTRY_KEY: &str = "country";
pub(crate) const PHONE_KEY: &str = "phone";
pub(crate) const ITEMS_PRICE_KEY: &str = "itemsPrice";
pub(crate) const TAX_PRICE_KEY: &str = "taxPrice";
pub(crate) const SHIPPING_PRICE_KEY: &str = "shippingPrice";
pub(crate) const MANIFEST_KEY: &str = "items";

/// Longest value the processor accepts for a single metadata key.
pub(crate) const METADATA_VALUE_LIMIT: usize = 500;

/// Payment method recorded on orders rebuilt from a session.
pub(crate) const HOSTED_PAYMENT_METHOD: &str = "stripe";

/// Name used when a session has no usable line items.
pub(crate) const GENERIC_ITEM_NAME: &str = "Order payment";

/// Metadata attached to a new checkout session.
pub(crate) fn checkout_metadata(
    user: UserUuid,
    order: Option<OrderUuid>,
    address: &ShippingAddress,
    prices: PriceBreakdown,
    manifest: &[(ProductUuid, u32)],
) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    let mut put = |key: &str, value: &str| {
        metadata.insert(key.to_string(), truncate_value(value).to_string());
    };

    put(USER_KEY, &user.to_string());
    put(STREET_KEY, &address.street);
    put(CITY_KEY, &address.city);
    put(STATE_KEY, &address.state);
    put(ZIP_KEY, &address.zip);
    put(COUNTRY_KEY, &address.country);
    put(PHONE_KEY, &address.phone);
    put(ITEMS_PRICE_KEY, &prices.items.to_string());
    put(TAX_PRICE_KEY, &prices.tax.to_string());
    put(SHIPPING_PRICE_KEY, &prices.shipping.to_string());

    if let Some(order) = order {
        put(ORDER_KEY, &order.to_string());
    }

    if let Some(manifest) = encode_manifest(manifest) {
        put(MANIFEST_KEY, &manifest);
    }

    metadata
}

/// `uuid:quantity` pairs joined by `;`, or `None` when too long to attach.
pub(crate) fn encode_manifest(items: &[(ProductUuid, u32)]) -> Option<String> {
    let encoded = items
        .iter()
        .map(|(product, quantity)| format!("{product}:{quantity}"))
        .collect::<Vec<_>>()
        .join(";");

    (!encoded.is_empty() && encoded.len() <= METADATA_VALUE_LIMIT).then_some(encoded)
}

/// Inverse of [`encode_manifest`]. Malformed entries are skipped.
pub(crate) fn decode_manifest(value: &str) -> Vec<(ProductUuid, u32)> {
    value
        .split(';')
        .filter_map(|entry| {
            let (product, quantity) = entry.split_once(':')?;
            let product = product.parse().ok()?;
            let quantity = quantity.trim().parse().ok()?;

            (quantity > 0).then_some((product, quantity))
        })
        .collect()
}

fn truncate_value(value: &str) -> &str {
    if value.len() <= METADATA_VALUE_LIMIT {
        return value;
    }

    let end = (0..=METADATA_VALUE_LIMIT)
        .rev()
        .find(|&end| value.is_char_boundary(end))
        .unwrap_or(0);

    value.get(..end).unwrap_or_default()
}

/// What a session's metadata says about the order it paid for.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct SessionMetadata {
    pub(crate) user: Option<UserUuid>,
    pub(crate) order: Option<OrderUuid>,
    pub(crate) address: ShippingAddress,
    pub(crate) prices: Option<PriceBreakdown>,
    pub(crate) manifest: Vec<(ProductUuid, u32)>,
}

impl SessionMetadata {
    pub(crate) fn parse(metadata: &BTreeMap<String, String>, default_country: &str) -> Self {
        let text = |key: &str| {
            metadata
                .get(key)
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        let amount = |key: &str| metadata.get(key).and_then(|value| value.trim().parse().ok());

        let country = Some(text(COUNTRY_KEY))
            .filter(|country| !country.is_empty())
            .unwrap_or_else(|| default_country.to_string());

        let prices = match (
            amount(ITEMS_PRICE_KEY),
            amount(TAX_PRICE_KEY),
            amount(SHIPPING_PRICE_KEY),
        ) {
            (Some(items), Some(tax), Some(shipping)) => {
                Some(PriceBreakdown::from_parts(items, tax, shipping))
            }
            _ => None,
        };

        Self {
            user: metadata.get(USER_KEY).and_then(|value| value.parse().ok()),
            order: metadata.get(ORDER_KEY).and_then(|value| value.parse().ok()),
            address: ShippingAddress {
                street: text(STREET_KEY),
                city: text(CITY_KEY),
                state: text(STATE_KEY),
                zip: text(ZIP_KEY),
                country,
                phone: text(PHONE_KEY),
            },
            prices,
            manifest: metadata
                .get(MANIFEST_KEY)
                .map(|value| decode_manifest(value))
                .unwrap_or_default(),
        }
    }
}

/// The product lines of a session, without the tax and shipping lines that
/// checkout appends after them. Only exact labels in the trailing positions
/// count, so a product that happens to be named like a tax line is kept.
pub(crate) fn product_lines<'a>(
    lines: &'a [SessionLineItem],
    policy: &PricingPolicy,
) -> &'a [SessionLineItem] {
    let lines = match lines {
        [rest @ .., last] if last.description == SHIPPING_LINE_LABEL => rest,
        _ => lines,
    };

    match lines {
        [rest @ .., last] if last.description == policy.tax_line_label() => rest,
        _ => lines,
    }
}

/// Split a line total over `quantity` units without losing the remainder:
/// some units carry one extra minor unit so the parts sum back exactly.
pub(crate) fn split_line_total(amount_total: u64, quantity: u32) -> Vec<(u64, u32)> {
    let quantity = quantity.max(1);
    let base = amount_total / u64::from(quantity);
    let remainder = amount_total % u64::from(quantity);

    // remainder < quantity, so it fits
    let heavier = u32::try_from(remainder).unwrap_or(0);

    [(base, quantity - heavier), (base + 1, heavier)]
        .into_iter()
        .filter(|(_, units)| *units > 0)
        .collect()
}

/// Rebuild a paid order from a completed session.
///
/// Tax and shipping lines are dropped from the items. Product references are
/// attached only when the manifest lines up one-to-one with what remains.
/// Metadata prices are trusted only when they are consistent and add up to
/// what was actually charged; otherwise the whole charge counts as items.
pub(crate) fn draft_from_session(
    session: &CheckoutSession,
    metadata: &SessionMetadata,
    user: UserUuid,
    policy: &PricingPolicy,
    paid_at: Timestamp,
) -> OrderDraft {
    let lines = product_lines(&session.line_items, policy);

    let products: Vec<Option<ProductUuid>> = if lines.len() == metadata.manifest.len() {
        metadata
            .manifest
            .iter()
            .map(|(product, _)| Some(*product))
            .collect()
    } else {
        vec![None; lines.len()]
    };

    let line_sum: u64 = lines.iter().map(|line| line.amount_total).sum();
    let charged = session.amount_total.unwrap_or(line_sum);

    let mut items: Vec<OrderItemDraft> = lines
        .iter()
        .zip(products)
        .flat_map(|(line, product_uuid)| {
            let name = Some(line.description.trim())
                .filter(|name| !name.is_empty())
                .unwrap_or(GENERIC_ITEM_NAME)
                .to_string();

            split_line_total(line.amount_total, line.quantity)
                .into_iter()
                .map(move |(unit_price, quantity)| OrderItemDraft {
                    product_uuid,
                    name: name.clone(),
                    image: None,
                    unit_price,
                    quantity,
                    size: None,
                    color: None,
                })
        })
        .collect();

    if items.is_empty() {
        items.push(OrderItemDraft {
            product_uuid: None,
            name: GENERIC_ITEM_NAME.to_string(),
            image: None,
            unit_price: charged,
            quantity: 1,
            size: None,
            color: None,
        });
    }

    let prices = metadata
        .prices
        .filter(|prices| prices.is_consistent() && prices.total == charged)
        .unwrap_or_else(|| PriceBreakdown::from_parts(charged, 0, 0));

    OrderDraft {
        uuid: OrderUuid::new(),
        user_uuid: user,
        items,
        shipping_address: metadata.address.clone(),
        payment_method: HOSTED_PAYMENT_METHOD.to_string(),
        prices,
        paid_at: Some(paid_at),
        payment: PaymentDetails {
            reference: Some(session.id.clone()),
            status: Some(session.payment_status.clone()),
            email: session.customer_email.clone(),
            update_time: Some(paid_at.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "1 Going Merry Way".to_string(),
            city: "Mumbai".to_string(),
            state: "MH".to_string(),
            zip: "400001".to_string(),
            country: "India".to_string(),
            phone: "9999999999".to_string(),
        }
    }

    fn line(description: &str, quantity: u32, amount_total: u64) -> SessionLineItem {
        SessionLineItem {
            description: description.to_string(),
            quantity,
            amount_total,
        }
    }

    #[test]
    fn manifest_decoding_skips_malformed_entries() {
        let product = ProductUuid::new();
        let value = format!("{product}:2;garbage;{}:0;not-a-uuid:1", ProductUuid::new());

        assert_eq!(decode_manifest(&value), vec![(product, 2)]);
    }

    #[test]
    fn oversized_manifest_is_omitted() {
        let items: Vec<(ProductUuid, u32)> = (0..20).map(|_| (ProductUuid::new(), 1)).collect();

        assert!(encode_manifest(&items).is_none());
        assert!(encode_manifest(&items[..3]).is_some());
        assert!(encode_manifest(&[]).is_none());
    }

    #[test]
    fn metadata_round_trips_through_parse() {
        let user = UserUuid::new();
        let order = OrderUuid::new();
        let product = ProductUuid::new();
        let prices = PriceBreakdown::from_parts(480_000, 86_400, 0);

        let metadata = checkout_metadata(user, Some(order), &address(), prices, &[(product, 2)]);
        let parsed = SessionMetadata::parse(&metadata, "India");

        assert_eq!(parsed.user, Some(user));
        assert_eq!(parsed.order, Some(order));
        assert_eq!(parsed.address, address());
        assert_eq!(parsed.prices, Some(prices));
        assert_eq!(parsed.manifest, vec![(product, 2)]);
    }

    #[test]
    fn long_values_are_truncated_on_a_char_boundary() {
        let street = "é".repeat(400);
        let metadata = checkout_metadata(
            UserUuid::new(),
            None,
            &ShippingAddress {
                street,
                ..address()
            },
            PriceBreakdown::default(),
            &[],
        );

        let stored = metadata.get(STREET_KEY).map(String::len).unwrap_or_default();

        assert!(stored <= METADATA_VALUE_LIMIT);
        assert!(stored >= METADATA_VALUE_LIMIT - 1);
    }

    #[test]
    fn draft_excludes_synthetic_lines_and_links_products() {
        let policy = PricingPolicy::default();
        let user = UserUuid::new();
        let product = ProductUuid::new();
        let prices = PriceBreakdown::from_parts(480_000, 86_400, 0);

        let session = CheckoutSession {
            id: "cs_test_1".to_string(),
            payment_status: "paid".to_string(),
            amount_total: Some(566_400),
            customer_email: Some("luffy@example.com".to_string()),
            metadata: checkout_metadata(user, None, &address(), prices, &[(product, 4)]),
            line_items: vec![
                line("Straw Hat", 4, 480_000),
                line(&policy.tax_line_label(), 1, 86_400),
            ],
            ..CheckoutSession::default()
        };

        let metadata = SessionMetadata::parse(&session.metadata, "India");
        let draft = draft_from_session(&session, &metadata, user, &policy, Timestamp::now());

        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].product_uuid, Some(product));
        assert_eq!(draft.items[0].unit_price, 120_000);
        assert_eq!(draft.prices, prices);
        assert_eq!(draft.payment.reference.as_deref(), Some("cs_test_1"));
        assert_eq!(draft.payment_method, HOSTED_PAYMENT_METHOD);
        assert!(draft.paid_at.is_some());
    }

    #[test]
    fn product_named_like_a_tax_line_keeps_its_reference() {
        let policy = PricingPolicy::default();
        let user = UserUuid::new();
        let product = ProductUuid::new();
        let prices = PriceBreakdown::from_parts(100_000, 18_000, 5_000);

        let session = CheckoutSession {
            id: "cs_test_gst".to_string(),
            payment_status: "paid".to_string(),
            amount_total: Some(123_000),
            metadata: checkout_metadata(user, None, &address(), prices, &[(product, 1)]),
            line_items: vec![
                line("GST (Goods) Sticker Pack", 1, 100_000),
                line("GST (18%)", 1, 18_000),
                line(SHIPPING_LINE_LABEL, 1, 5_000),
            ],
            ..CheckoutSession::default()
        };

        let metadata = SessionMetadata::parse(&session.metadata, "India");
        let draft = draft_from_session(&session, &metadata, user, &policy, Timestamp::now());

        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].name, "GST (Goods) Sticker Pack");
        assert_eq!(draft.items[0].product_uuid, Some(product));
        assert_eq!(draft.prices, prices);
    }

    #[test]
    fn tax_label_before_a_product_line_is_not_trimmed() {
        let policy = PricingPolicy::default();
        let lines = vec![line("GST (18%)", 1, 180), line("Poster", 1, 1_000)];

        assert_eq!(product_lines(&lines, &policy), lines.as_slice());
    }

    #[test]
    fn uneven_line_totals_keep_every_minor_unit() {
        assert_eq!(split_line_total(1_000, 3), vec![(333, 2), (334, 1)]);
        assert_eq!(split_line_total(480_000, 4), vec![(120_000, 4)]);
        assert_eq!(split_line_total(5, 0), vec![(5, 1)]);
    }

    #[test]
    fn uneven_line_is_split_into_exact_items() {
        let policy = PricingPolicy::default();
        let user = UserUuid::new();
        let product = ProductUuid::new();
        let prices = PriceBreakdown::from_parts(1_000, 180, 5_000);

        let session = CheckoutSession {
            id: "cs_test_split".to_string(),
            payment_status: "paid".to_string(),
            amount_total: Some(6_180),
            metadata: checkout_metadata(user, None, &address(), prices, &[(product, 3)]),
            line_items: vec![
                line("Keychain", 3, 1_000),
                line("GST (18%)", 1, 180),
                line(SHIPPING_LINE_LABEL, 1, 5_000),
            ],
            ..CheckoutSession::default()
        };

        let metadata = SessionMetadata::parse(&session.metadata, "India");
        let draft = draft_from_session(&session, &metadata, user, &policy, Timestamp::now());

        let line_sum: u64 = draft
            .items
            .iter()
            .map(|item| item.unit_price * u64::from(item.quantity))
            .sum();
        let units: u32 = draft.items.iter().map(|item| item.quantity).sum();

        assert_eq!(line_sum, 1_000);
        assert_eq!(units, 3);
        assert!(draft.items.iter().all(|item| item.product_uuid == Some(product)));
    }

    #[test]
    fn sparse_session_falls_back_to_a_single_generic_item() {
        let session = CheckoutSession {
            id: "cs_test_2".to_string(),
            payment_status: "paid".to_string(),
            amount_total: Some(12_345),
            ..CheckoutSession::default()
        };

        let metadata = SessionMetadata::parse(&session.metadata, "India");
        let draft = draft_from_session(
            &session,
            &metadata,
            UserUuid::new(),
            &PricingPolicy::default(),
            Timestamp::now(),
        );

        assert_eq!(draft.items.len(), 1);
        assert_eq!(draft.items[0].name, GENERIC_ITEM_NAME);
        assert_eq!(draft.items[0].unit_price, 12_345);
        assert_eq!(draft.prices, PriceBreakdown::from_parts(12_345, 0, 0));
        assert_eq!(draft.shipping_address.country, "India");
        assert!(draft.shipping_address.street.is_empty());
    }

    #[test]
    fn metadata_prices_that_disagree_with_the_charge_are_ignored() {
        let mut metadata = SessionMetadata::parse(&BTreeMap::new(), "India");
        metadata.prices = Some(PriceBreakdown::from_parts(1_000, 180, 50));

        let session = CheckoutSession {
            id: "cs_test_3".to_string(),
            payment_status: "paid".to_string(),
            amount_total: Some(2_000),
            line_items: vec![line("Poster", 2, 2_000)],
            ..CheckoutSession::default()
        };

        let draft = draft_from_session(
            &session,
            &metadata,
            UserUuid::new(),
            &PricingPolicy::default(),
            Timestamp::now(),
        );

        assert_eq!(draft.prices, PriceBreakdown::from_parts(2_000, 0, 0));
        assert_eq!(draft.items[0].product_uuid, None);
        assert_eq!(draft.items[0].unit_price, 1_000);
    }
}
