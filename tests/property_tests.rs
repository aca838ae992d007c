//! Property-based tests for pricing, slugs, pagination and status rules.
//!
//! These tests use proptest to verify invariants across a wide range of inputs,
//! helping to catch edge cases that unit tests might miss.

use flyshop_api::entities::{OrderStatus, PaymentStatus, ShippingStatus};
use flyshop_api::services::ledger::unit_price;
use flyshop_api::services::order_status::{cancelled_triad, check_status_update};
use flyshop_api::services::orders::{OrderQuote, PricedLine};
use flyshop_api::services::{page_bounds, slug};
use flyshop_api::PaginatedResponse;
use proptest::prelude::*;
use uuid::Uuid;

fn order_status_strategy() -> impl Strategy<Value = OrderStatus> {
    prop_oneof![
        Just(OrderStatus::Pending),
        Just(OrderStatus::Processing),
        Just(OrderStatus::Shipped),
        Just(OrderStatus::Delivered),
        Just(OrderStatus::Canceled),
    ]
}

fn payment_status_strategy() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Pending),
        Just(PaymentStatus::Paid),
        Just(PaymentStatus::Failed),
        Just(PaymentStatus::Refunded),
    ]
}

fn shipping_status_strategy() -> impl Strategy<Value = ShippingStatus> {
    prop_oneof![
        Just(ShippingStatus::Pending),
        Just(ShippingStatus::Shipped),
        Just(ShippingStatus::Delivered),
        Just(ShippingStatus::Returned),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn discounted_price_stays_within_bounds(price in 1i64..10_000_000, discount in 0i32..=100) {
        let final_price = unit_price(price, Some(discount));
        prop_assert!(final_price >= 0);
        prop_assert!(final_price <= price);
    }

    #[test]
    fn no_discount_means_list_price(price in 1i64..10_000_000) {
        prop_assert_eq!(unit_price(price, None), price);
        prop_assert_eq!(unit_price(price, Some(0)), price);
    }

    #[test]
    fn deeper_discounts_never_cost_more(price in 1i64..1_000_000, a in 0i32..=100, b in 0i32..=100) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(unit_price(price, Some(high)) <= unit_price(price, Some(low)));
    }

    #[test]
    fn order_total_is_subtotal_plus_shipping(
        lines in prop::collection::vec((1i64..5_000, 1i32..20), 1..6),
        shipping in 0i64..10_000,
    ) {
        let priced: Vec<PricedLine> = lines
            .iter()
            .map(|(unit, qty)| PricedLine {
                product_id: Uuid::new_v4(),
                product_name: "line".to_string(),
                quantity: *qty,
                unit_price: *unit,
            })
            .collect();
        let subtotal: i64 = lines.iter().map(|(unit, qty)| unit * i64::from(*qty)).sum();
        let quote = OrderQuote { lines: priced, subtotal };
        prop_assert_eq!(quote.total(shipping).unwrap(), subtotal + shipping);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn slugs_are_url_safe(input in "\\PC{0,60}") {
        let slug = slug::slugify(&input);
        prop_assert!(slug.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
        prop_assert!(!slug.starts_with('-'));
        prop_assert!(!slug.ends_with('-'));
        prop_assert!(!slug.contains("--"));
    }

    #[test]
    fn slugify_is_idempotent(input in "[A-Za-z0-9 _.,!-]{0,60}") {
        let once = slug::slugify(&input);
        prop_assert_eq!(slug::slugify(&once), once);
    }
}

proptest! {
    #[test]
    fn page_bounds_are_clamped(page in proptest::option::of(0u64..10_000), limit in proptest::option::of(0u64..10_000)) {
        let (page, limit) = page_bounds(page, limit);
        prop_assert!(page >= 1);
        prop_assert!((1..=100).contains(&limit));
    }

    #[test]
    fn total_pages_cover_every_item(total in 0u64..100_000, limit in 1u64..=100) {
        let page: PaginatedResponse<()> = PaginatedResponse::new(Vec::new(), total, 1, limit);
        prop_assert!(page.total_pages * limit >= total);
        prop_assert!(page.total_pages == 0 || (page.total_pages - 1) * limit < total);
    }

    #[test]
    fn status_updates_never_reach_or_leave_canceled(
        current in order_status_strategy(),
        next in order_status_strategy(),
    ) {
        let result = check_status_update(current, Some(next));
        if current != next && (next == OrderStatus::Canceled || current == OrderStatus::Canceled) {
            prop_assert!(result.is_err());
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn cancellation_never_leaves_a_pending_or_paid_payment(
        payment in payment_status_strategy(),
        shipping in shipping_status_strategy(),
    ) {
        let triad = cancelled_triad(payment, shipping);
        prop_assert_eq!(triad.status, OrderStatus::Canceled);
        prop_assert!(matches!(triad.payment_status, PaymentStatus::Refunded | PaymentStatus::Failed));
        prop_assert_ne!(triad.shipping_status, ShippingStatus::Shipped);
    }
}
