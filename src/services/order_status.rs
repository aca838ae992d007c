//! Rules for the order status triad.
//!
//! Order, payment and shipping statuses are independent enums; the only
//! place they move together is cancellation.

use crate::entities::{OrderStatus, PaymentStatus, ShippingStatus};
use crate::errors::ServiceError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusTriad {
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_status: ShippingStatus,
}

impl StatusTriad {
    /// Every new order starts here.
    pub const INITIAL: StatusTriad = StatusTriad {
        status: OrderStatus::Pending,
        payment_status: PaymentStatus::Pending,
        shipping_status: ShippingStatus::Pending,
    };
}

pub fn can_cancel(status: OrderStatus) -> bool {
    matches!(status, OrderStatus::Pending | OrderStatus::Processing)
}

pub fn ensure_cancellable(status: OrderStatus) -> Result<(), ServiceError> {
    if can_cancel(status) {
        Ok(())
    } else {
        Err(ServiceError::InvalidStatus(format!(
            "Cannot cancel order in {} status",
            status
        )))
    }
}

/// Whether `from -> to` follows the normal fulfilment path
/// PENDING -> PROCESSING -> SHIPPED -> DELIVERED, or is a permitted cancellation.
pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match (from, to) {
        (a, b) if a == b => true,
        (Pending, Processing) | (Processing, Shipped) | (Shipped, Delivered) => true,
        (Pending | Processing, Canceled) => true,
        _ => false,
    }
}

/// Triad after a cancellation: payment is refunded if it was captured and
/// marked failed otherwise; a shipped parcel is marked returned.
pub fn cancelled_triad(payment: PaymentStatus, shipping: ShippingStatus) -> StatusTriad {
    StatusTriad {
        status: OrderStatus::Canceled,
        payment_status: match payment {
            PaymentStatus::Paid => PaymentStatus::Refunded,
            _ => PaymentStatus::Failed,
        },
        shipping_status: match shipping {
            ShippingStatus::Shipped => ShippingStatus::Returned,
            other => other,
        },
    }
}

/// Guards the free-form status update path.
///
/// CANCELED can only be reached through cancellation (which restocks), and a
/// cancelled order cannot be revived since its stock has already been returned.
pub fn check_status_update(
    current: OrderStatus,
    requested: Option<OrderStatus>,
) -> Result<(), ServiceError> {
    let Some(next) = requested else {
        return Ok(());
    };

    if next == current {
        return Ok(());
    }

    if next == OrderStatus::Canceled {
        return Err(ServiceError::InvalidStatus(
            "Use the cancel operation to cancel an order".to_string(),
        ));
    }

    if current == OrderStatus::Canceled {
        return Err(ServiceError::InvalidStatus(format!(
            "Cannot change status of a CANCELED order to {}",
            next
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use sea_orm::Iterable;

    #[test]
    fn only_pending_and_processing_are_cancellable() {
        let cancellable: Vec<_> = OrderStatus::iter().filter(|s| can_cancel(*s)).collect();
        assert_eq!(
            cancellable,
            vec![OrderStatus::Pending, OrderStatus::Processing]
        );
    }

    #[rstest]
    #[case(OrderStatus::Shipped)]
    #[case(OrderStatus::Delivered)]
    #[case(OrderStatus::Canceled)]
    fn cancellation_error_names_current_status(#[case] status: OrderStatus) {
        let err = ensure_cancellable(status).unwrap_err();
        assert_matches!(err, ServiceError::InvalidStatus(msg) if msg == format!("Cannot cancel order in {} status", status));
    }

    #[rstest]
    #[case(PaymentStatus::Paid, ShippingStatus::Shipped, PaymentStatus::Refunded, ShippingStatus::Returned)]
    #[case(PaymentStatus::Pending, ShippingStatus::Pending, PaymentStatus::Failed, ShippingStatus::Pending)]
    #[case(PaymentStatus::Failed, ShippingStatus::Delivered, PaymentStatus::Failed, ShippingStatus::Delivered)]
    #[case(PaymentStatus::Refunded, ShippingStatus::Returned, PaymentStatus::Failed, ShippingStatus::Returned)]
    fn cancelled_triad_maps_payment_and_shipping(
        #[case] payment: PaymentStatus,
        #[case] shipping: ShippingStatus,
        #[case] expected_payment: PaymentStatus,
        #[case] expected_shipping: ShippingStatus,
    ) {
        let triad = cancelled_triad(payment, shipping);
        assert_eq!(triad.status, OrderStatus::Canceled);
        assert_eq!(triad.payment_status, expected_payment);
        assert_eq!(triad.shipping_status, expected_shipping);
    }

    #[test]
    fn nothing_leaves_canceled() {
        for to in OrderStatus::iter().filter(|s| *s != OrderStatus::Canceled) {
            assert!(!is_valid_transition(OrderStatus::Canceled, to));
        }
        assert!(is_valid_transition(OrderStatus::Pending, OrderStatus::Processing));
        assert!(!is_valid_transition(OrderStatus::Shipped, OrderStatus::Canceled));
    }

    #[test]
    fn status_update_guards() {
        assert!(check_status_update(OrderStatus::Pending, None).is_ok());
        assert!(check_status_update(OrderStatus::Pending, Some(OrderStatus::Delivered)).is_ok());
        assert!(check_status_update(OrderStatus::Delivered, Some(OrderStatus::Processing)).is_ok());
        assert_matches!(
            check_status_update(OrderStatus::Pending, Some(OrderStatus::Canceled)),
            Err(ServiceError::InvalidStatus(_))
        );
        assert_matches!(
            check_status_update(OrderStatus::Canceled, Some(OrderStatus::Pending)),
            Err(ServiceError::InvalidStatus(_))
        );
        assert!(check_status_update(OrderStatus::Canceled, Some(OrderStatus::Canceled)).is_ok());
    }
}
