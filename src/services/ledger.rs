//! Inventory & pricing ledger.
//!
//! Stock mutations are single-statement conditional updates, so each one is
//! atomic at the row level and can be composed inside a caller's transaction.

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionTrait};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::product::{self, Entity as ProductEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Post-discount unit price, rounded half away from zero to whole currency units.
///
/// `discount` is a percentage; values outside `0..=100` are clamped.
pub fn unit_price(price: i64, discount: Option<i32>) -> i64 {
    let pct = match discount {
        Some(d) if d > 0 => d.min(100),
        _ => return price,
    };

    let discounted = Decimal::from(price) * Decimal::from(100 - pct) / Decimal::ONE_HUNDRED;
    discounted
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(price)
}

fn insufficient_stock(product: &product::Model, requested: i32) -> ServiceError {
    ServiceError::InsufficientStock(format!(
        "Not enough stock for product {}. Available: {}, Requested: {}",
        product.name, product.stock, requested
    ))
}

#[derive(Clone)]
pub struct InventoryLedger {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl InventoryLedger {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    pub async fn get_product<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
    ) -> Result<Option<product::Model>, ServiceError> {
        Ok(ProductEntity::find_by_id(product_id).one(conn).await?)
    }

    /// Checks availability without mutating anything.
    pub fn ensure_available(product: &product::Model, quantity: i32) -> Result<(), ServiceError> {
        if product.stock < quantity {
            return Err(insufficient_stock(product, quantity));
        }
        Ok(())
    }

    /// `stock = stock - qty WHERE id = ? AND stock >= qty`.
    ///
    /// Zero affected rows means the product vanished or a concurrent writer
    /// drained it; the two cases are told apart by re-reading the row.
    pub async fn decrement_stock<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        let result = ProductEntity::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).sub(quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::Stock.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 1 {
            return Ok(());
        }

        match Self::get_product(conn, product_id).await? {
            None => Err(ServiceError::NotFound(format!(
                "Product with ID {} not found",
                product_id
            ))),
            Some(current) => {
                warn!(
                    product_id = %product_id,
                    available = current.stock,
                    requested = quantity,
                    "Conditional stock decrement rejected"
                );
                metrics::counter!("flyshop_inventory.stock_conflicts", 1);
                Err(insufficient_stock(&current, quantity))
            }
        }
    }

    pub async fn increment_stock<C: ConnectionTrait>(
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        let result = ProductEntity::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).add(quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product_id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product with ID {} not found",
                product_id
            )));
        }
        Ok(())
    }

    /// Manual stock correction by a signed delta. Never drives stock below zero.
    #[instrument(skip(self), fields(product_id = %product_id, delta))]
    pub async fn adjust_stock(
        &self,
        product_id: Uuid,
        delta: i32,
    ) -> Result<product::Model, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for stock adjustment");
            ServiceError::DatabaseError(e)
        })?;

        let current = Self::get_product(&txn, product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        if delta < 0 {
            let removal = delta.checked_neg().ok_or_else(|| {
                ServiceError::BadRequest("Stock adjustment out of range".to_string())
            })?;
            if current.stock < removal {
                return Err(ServiceError::BadRequest(format!(
                    "Stock cannot go below zero. Available: {}, Adjustment: {}",
                    current.stock, delta
                )));
            }
            Self::decrement_stock(&txn, product_id, removal).await?;
        } else if delta > 0 {
            if current.stock.checked_add(delta).is_none() {
                return Err(ServiceError::BadRequest(
                    "Stock adjustment out of range".to_string(),
                ));
            }
            Self::increment_stock(&txn, product_id, delta).await?;
        }

        let updated = Self::get_product(&txn, product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit stock adjustment");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            old_stock = current.stock,
            new_stock = updated.stock,
            "Stock adjusted"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .publish(Event::StockAdjusted {
                    product_id,
                    old_stock: current.stock,
                    new_stock: updated.stock,
                })
                .await;
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1000, None, 1000)]
    #[case(1000, Some(0), 1000)]
    #[case(1000, Some(10), 900)]
    #[case(3500, Some(15), 2975)]
    #[case(999, Some(50), 500)]
    #[case(5, Some(50), 3)]
    #[case(1000, Some(100), 0)]
    #[case(1000, Some(150), 0)]
    #[case(1000, Some(-5), 1000)]
    fn unit_price_applies_percentage_discount(
        #[case] price: i64,
        #[case] discount: Option<i32>,
        #[case] expected: i64,
    ) {
        assert_eq!(unit_price(price, discount), expected);
    }

    fn product(stock: i32) -> product::Model {
        let now = Utc::now();
        product::Model {
            id: Uuid::new_v4(),
            name: "Adams #14".into(),
            slug: "adams-14".into(),
            description: "Classic dry fly".into(),
            price: 3500,
            stock,
            discount: None,
            category_id: Uuid::new_v4(),
            attributes: None,
            is_featured: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn ensure_available_reports_stock_in_message() {
        let err = InventoryLedger::ensure_available(&product(2), 5).unwrap_err();
        match err {
            ServiceError::InsufficientStock(msg) => {
                assert!(msg.contains("Adams #14"));
                assert!(msg.contains("Available: 2"));
                assert!(msg.contains("Requested: 5"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(InventoryLedger::ensure_available(&product(5), 5).is_ok());
    }
}
