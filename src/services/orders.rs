//! Order transaction manager.
//!
//! Creation and cancellation validate everything up front, then apply all
//! writes (order rows and stock movements) inside one database transaction.

use chrono::{DateTime, Utc};
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::db::{DatabaseAccess, DbPool};
use crate::entities::{
    address, order, order_item, product, product_image, user, OrderStatus, PaymentMethod,
    PaymentStatus, ShippingMethod, ShippingStatus,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::customers::CustomerDirectory;
use crate::services::ledger::{unit_price, InventoryLedger};
use crate::services::order_status::{self, StatusTriad};
use crate::services::{page_bounds, SortOrder};
use crate::PaginatedResponse;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub address_id: Uuid,
    pub payment_method: PaymentMethod,
    pub shipping_method: ShippingMethod,
    #[validate(range(min = 0, message = "Shipping cost cannot be negative"))]
    pub shipping_cost: i64,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub shipping_status: Option<ShippingStatus>,
    #[validate(length(min = 1, max = 64))]
    pub tracking_number: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Total,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub user_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub shipping_status: Option<ShippingStatus>,
    /// Inclusive lower bound on `created_at`
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub end_date: Option<DateTime<Utc>>,
    pub sort_by: Option<OrderSortField>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&user::Model> for UserSummary {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email.clone(),
            first_name: model.first_name.clone(),
            last_name: model.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItemView {
    #[serde(flatten)]
    pub item: order_item::Model,
    pub product: Option<ProductSnapshot>,
}

/// Order with its user summary, address and priced lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderAggregate {
    #[serde(flatten)]
    pub order: order::Model,
    pub user: UserSummary,
    pub address: address::Model,
    pub items: Vec<OrderItemView>,
}

/// A validated order line, priced at the moment of checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
}

impl PricedLine {
    pub fn line_total(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuote {
    pub lines: Vec<PricedLine>,
    pub subtotal: i64,
}

impl OrderQuote {
    pub fn total(&self, shipping_cost: i64) -> Result<i64, ServiceError> {
        self.subtotal
            .checked_add(shipping_cost)
            .ok_or_else(|| ServiceError::BadRequest("Order total is out of range".to_string()))
    }
}

fn ensure_items_well_formed(request: &CreateOrderRequest) -> Result<(), ServiceError> {
    if request.items.is_empty() {
        return Err(ServiceError::BadRequest(
            "Order must contain at least one item".to_string(),
        ));
    }
    if let Some(bad) = request.items.iter().find(|item| item.quantity <= 0) {
        return Err(ServiceError::BadRequest(format!(
            "Quantity for product {} must be a positive integer",
            bad.product_id
        )));
    }
    if request.shipping_cost < 0 {
        return Err(ServiceError::BadRequest(
            "Shipping cost cannot be negative".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    db: DatabaseAccess,
    event_sender: Option<Arc<EventSender>>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db: DatabaseAccess::new(db_pool.clone()),
            db_pool,
            event_sender,
        }
    }

    /// Resolves and prices every requested line, in input order.
    ///
    /// Stock is checked against the running total per product, so repeated
    /// lines for one product are judged together. Fails on the first missing
    /// product or short stock without writing anything.
    pub async fn quote_items<C: ConnectionTrait>(
        conn: &C,
        items: &[OrderItemInput],
    ) -> Result<OrderQuote, ServiceError> {
        let mut lines = Vec::with_capacity(items.len());
        let mut subtotal: i64 = 0;
        let mut requested: HashMap<Uuid, i32> = HashMap::new();

        for item in items {
            let product = InventoryLedger::get_product(conn, item.product_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Product with ID {} not found",
                        item.product_id
                    ))
                })?;

            let wanted = requested.entry(product.id).or_insert(0);
            *wanted = wanted.checked_add(item.quantity).ok_or_else(|| {
                ServiceError::BadRequest("Order quantity is out of range".to_string())
            })?;
            InventoryLedger::ensure_available(&product, *wanted)?;

            let line = PricedLine {
                product_id: product.id,
                product_name: product.name,
                quantity: item.quantity,
                unit_price: unit_price(product.price, product.discount),
            };
            subtotal = line
                .line_total()
                .and_then(|total| subtotal.checked_add(total))
                .ok_or_else(|| {
                    ServiceError::BadRequest("Order subtotal is out of range".to_string())
                })?;
            lines.push(line);
        }

        Ok(OrderQuote { lines, subtotal })
    }

    #[instrument(skip(self, request), fields(user_id = %user_id, item_count = request.items.len()))]
    pub async fn create_order(
        &self,
        user_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderAggregate, ServiceError> {
        ensure_items_well_formed(&request)?;
        let db = &*self.db_pool;

        CustomerDirectory::require_user(db, user_id).await?;
        CustomerDirectory::require_address_for_user(db, request.address_id, user_id).await?;

        let quote = Self::quote_items(db, &request.items).await?;
        let total = quote.total(request.shipping_cost)?;

        let order_id = Uuid::new_v4();
        let now = Utc::now();
        let initial = StatusTriad::INITIAL;
        let order_model = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(user_id),
            address_id: Set(request.address_id),
            payment_method: Set(request.payment_method),
            shipping_method: Set(request.shipping_method),
            shipping_cost: Set(request.shipping_cost),
            subtotal: Set(quote.subtotal),
            total: Set(total),
            notes: Set(request.notes),
            status: Set(initial.status),
            payment_status: Set(initial.payment_status),
            shipping_status: Set(initial.shipping_status),
            tracking_number: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let lines = quote.lines.clone();

        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    order_model.insert(txn).await?;

                    for line in &lines {
                        order_item::ActiveModel {
                            id: Set(Uuid::new_v4()),
                            order_id: Set(order_id),
                            product_id: Set(line.product_id),
                            quantity: Set(line.quantity),
                            price: Set(line.unit_price),
                            created_at: Set(now),
                        }
                        .insert(txn)
                        .await?;
                    }

                    for line in &lines {
                        InventoryLedger::decrement_stock(txn, line.product_id, line.quantity)
                            .await?;
                    }

                    Ok(())
                })
            })
            .await?;

        counter!("flyshop_orders.created", 1);
        info!(
            order_id = %order_id,
            subtotal = quote.subtotal,
            total,
            "Order created"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .publish(Event::OrderCreated {
                    order_id,
                    user_id,
                    total,
                })
                .await;

            let product_ids: Vec<Uuid> = quote.lines.iter().map(|l| l.product_id).collect();
            match product::Entity::find()
                .filter(product::Column::Id.is_in(product_ids))
                .filter(product::Column::Stock.eq(0))
                .all(db)
                .await
            {
                Ok(depleted) => {
                    for p in depleted {
                        sender.publish(Event::StockDepleted(p.id)).await;
                    }
                }
                Err(e) => warn!(error = %e, "Failed to check for depleted products"),
            }
        }

        self.get_order(order_id).await
    }

    #[instrument(skip(self, request), fields(order_id = %order_id))]
    pub async fn update_status(
        &self,
        order_id: Uuid,
        request: UpdateOrderStatusRequest,
    ) -> Result<OrderAggregate, ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for status update");
            ServiceError::DatabaseError(e)
        })?;

        let current = order::Entity::find_by_id(order_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        order_status::check_status_update(current.status, request.status)?;

        if let Some(next) = request.status {
            if !order_status::is_valid_transition(current.status, next) {
                warn!(
                    from = %current.status,
                    to = %next,
                    "Order status moved outside the usual fulfilment path"
                );
            }
        }

        let mut changes = order::ActiveModel {
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(status) = request.status {
            changes.status = Set(status);
        }
        if let Some(payment_status) = request.payment_status {
            changes.payment_status = Set(payment_status);
        }
        if let Some(shipping_status) = request.shipping_status {
            changes.shipping_status = Set(shipping_status);
        }
        if let Some(tracking_number) = request.tracking_number {
            changes.tracking_number = Set(Some(tracking_number));
        }
        if let Some(notes) = request.notes {
            changes.notes = Set(Some(notes));
        }

        // Guarded on the status we validated against, so a concurrent
        // cancellation cannot be overwritten.
        let result = order::Entity::update_many()
            .set(changes)
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(current.status))
            .exec(&txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(
                "Order was modified concurrently; retry the update".to_string(),
            ));
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit status update");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            old_status = %current.status,
            new_status = ?request.status,
            "Order status fields updated"
        );

        if let (Some(sender), Some(new_status)) = (&self.event_sender, request.status) {
            if new_status != current.status {
                sender
                    .publish(Event::OrderStatusChanged {
                        order_id,
                        old_status: current.status,
                        new_status,
                    })
                    .await;
            }
        }

        self.get_order(order_id).await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: Uuid) -> Result<OrderAggregate, ServiceError> {
        let db = &*self.db_pool;

        let current = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        order_status::ensure_cancellable(current.status)?;

        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .all(db)
            .await?;
        let restocked_units: i64 = items.iter().map(|i| i64::from(i.quantity)).sum();
        let triad = order_status::cancelled_triad(current.payment_status, current.shipping_status);

        self.db
            .transaction::<_, (), ServiceError>(move |txn| {
                Box::pin(async move {
                    // Flip the status first: of two racing cancellations only
                    // one can match the cancellable states and restock.
                    let flipped = order::Entity::update_many()
                        .set(order::ActiveModel {
                            status: Set(triad.status),
                            payment_status: Set(triad.payment_status),
                            shipping_status: Set(triad.shipping_status),
                            updated_at: Set(Utc::now()),
                            ..Default::default()
                        })
                        .filter(order::Column::Id.eq(order_id))
                        .filter(
                            order::Column::Status
                                .is_in([OrderStatus::Pending, OrderStatus::Processing]),
                        )
                        .exec(txn)
                        .await?;

                    if flipped.rows_affected == 0 {
                        let status = order::Entity::find_by_id(order_id)
                            .one(txn)
                            .await?
                            .map(|o| o.status)
                            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
                        return order_status::ensure_cancellable(status).and(Err(
                            ServiceError::Conflict("Order was modified concurrently".to_string()),
                        ));
                    }

                    for item in &items {
                        InventoryLedger::increment_stock(txn, item.product_id, item.quantity)
                            .await?;
                    }

                    Ok(())
                })
            })
            .await?;

        counter!("flyshop_orders.cancelled", 1);
        info!(restocked_units, "Order cancelled");

        if let Some(sender) = &self.event_sender {
            sender
                .publish(Event::OrderCancelled {
                    order_id,
                    restocked_units,
                })
                .await;
        }

        self.get_order(order_id).await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: Uuid) -> Result<OrderAggregate, ServiceError> {
        let db = &*self.db_pool;
        let order = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        load_aggregates(db, vec![order])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::InternalError("Order aggregate missing".to_string()))
    }

    #[instrument(skip(self, query))]
    pub async fn list_orders(
        &self,
        query: OrderListQuery,
    ) -> Result<PaginatedResponse<OrderAggregate>, ServiceError> {
        let (page, limit) = page_bounds(query.page, query.limit);

        let mut select = order::Entity::find();
        if let Some(user_id) = query.user_id {
            select = select.filter(order::Column::UserId.eq(user_id));
        }
        if let Some(status) = query.status {
            select = select.filter(order::Column::Status.eq(status));
        }
        if let Some(payment_status) = query.payment_status {
            select = select.filter(order::Column::PaymentStatus.eq(payment_status));
        }
        if let Some(shipping_status) = query.shipping_status {
            select = select.filter(order::Column::ShippingStatus.eq(shipping_status));
        }
        if let Some(start) = query.start_date {
            select = select.filter(order::Column::CreatedAt.gte(start));
        }
        if let Some(end) = query.end_date {
            select = select.filter(order::Column::CreatedAt.lte(end));
        }

        let column = match query.sort_by.unwrap_or_default() {
            OrderSortField::CreatedAt => order::Column::CreatedAt,
            OrderSortField::UpdatedAt => order::Column::UpdatedAt,
            OrderSortField::Total => order::Column::Total,
        };
        let select = select
            .order_by(column, query.sort_order.unwrap_or_default().into())
            .order_by_asc(order::Column::Id);

        self.paginate(select, page, limit).await
    }

    /// Orders placed by one user, newest first.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_user_orders(
        &self,
        user_id: Uuid,
        page: Option<u64>,
        limit: Option<u64>,
        status: Option<OrderStatus>,
    ) -> Result<PaginatedResponse<OrderAggregate>, ServiceError> {
        let (page, limit) = page_bounds(page, limit);

        let mut select = order::Entity::find().filter(order::Column::UserId.eq(user_id));
        if let Some(status) = status {
            select = select.filter(order::Column::Status.eq(status));
        }
        let select = select
            .order_by_desc(order::Column::CreatedAt)
            .order_by_asc(order::Column::Id);

        self.paginate(select, page, limit).await
    }

    async fn paginate(
        &self,
        select: Select<order::Entity>,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<OrderAggregate>, ServiceError> {
        let db = &*self.db_pool;
        let paginator = select.paginate(db, limit);
        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page - 1).await?;
        let items = load_aggregates(db, orders).await?;

        Ok(PaginatedResponse::new(items, total, page, limit))
    }
}

/// Batch-loads users, addresses, items, products and main images for `orders`.
async fn load_aggregates<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<order::Model>,
) -> Result<Vec<OrderAggregate>, ServiceError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let user_ids: HashSet<Uuid> = orders.iter().map(|o| o.user_id).collect();
    let address_ids: HashSet<Uuid> = orders.iter().map(|o| o.address_id).collect();

    let users: HashMap<Uuid, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let addresses: HashMap<Uuid, address::Model> = address::Entity::find()
        .filter(address::Column::Id.is_in(address_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.is_in(order_ids))
        .order_by_asc(order_item::Column::CreatedAt)
        .all(conn)
        .await?;

    let product_ids: HashSet<Uuid> = items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, product::Model> = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let main_images: HashMap<Uuid, String> = product_image::Entity::find()
        .filter(product_image::Column::ProductId.is_in(product_ids))
        .filter(product_image::Column::IsMain.eq(true))
        .all(conn)
        .await?
        .into_iter()
        .map(|img| (img.product_id, img.url))
        .collect();

    let mut items_by_order: HashMap<Uuid, Vec<OrderItemView>> = HashMap::new();
    for item in items {
        let product = products.get(&item.product_id).map(|p| ProductSnapshot {
            id: p.id,
            name: p.name.clone(),
            slug: p.slug.clone(),
            image_url: main_images.get(&p.id).cloned(),
        });
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderItemView { item, product });
    }

    orders
        .into_iter()
        .map(|order| {
            let user = users.get(&order.user_id).ok_or_else(|| {
                ServiceError::InternalError(format!("Order {} references a missing user", order.id))
            })?;
            let address = addresses.get(&order.address_id).cloned().ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "Order {} references a missing address",
                    order.id
                ))
            })?;
            let items = items_by_order.remove(&order.id).unwrap_or_default();

            Ok(OrderAggregate {
                user: UserSummary::from(user),
                address,
                items,
                order,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(items: Vec<OrderItemInput>, shipping_cost: i64) -> CreateOrderRequest {
        CreateOrderRequest {
            address_id: Uuid::new_v4(),
            payment_method: PaymentMethod::CreditCard,
            shipping_method: ShippingMethod::Standard,
            shipping_cost,
            notes: None,
            items,
        }
    }

    #[test]
    fn empty_item_list_is_rejected() {
        assert_matches!(
            ensure_items_well_formed(&request(vec![], 0)),
            Err(ServiceError::BadRequest(_))
        );
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let items = vec![
            OrderItemInput {
                product_id: Uuid::new_v4(),
                quantity: 2,
            },
            OrderItemInput {
                product_id: Uuid::new_v4(),
                quantity: 0,
            },
        ];
        assert_matches!(
            ensure_items_well_formed(&request(items, 0)),
            Err(ServiceError::BadRequest(msg)) if msg.contains("positive")
        );
    }

    #[test]
    fn negative_shipping_cost_is_rejected() {
        let items = vec![OrderItemInput {
            product_id: Uuid::new_v4(),
            quantity: 1,
        }];
        assert_matches!(
            ensure_items_well_formed(&request(items, -1)),
            Err(ServiceError::BadRequest(_))
        );
    }

    #[test]
    fn quote_total_adds_shipping() {
        let quote = OrderQuote {
            lines: vec![PricedLine {
                product_id: Uuid::new_v4(),
                product_name: "Adams #14".into(),
                quantity: 2,
                unit_price: 900,
            }],
            subtotal: 1800,
        };
        assert_eq!(quote.total(500).unwrap(), 2300);
        assert_matches!(quote.total(i64::MAX), Err(ServiceError::BadRequest(_)));
    }

    #[test]
    fn create_request_validation_requires_items() {
        let req = request(vec![], 0);
        assert!(req.validate().is_err());
    }

    #[test]
    fn shipping_cost_must_be_supplied() {
        let body = serde_json::json!({
            "address_id": Uuid::new_v4(),
            "payment_method": "CASH_ON_DELIVERY",
            "shipping_method": "PICKUP",
            "items": [{"product_id": Uuid::new_v4(), "quantity": 1}]
        });
        let err = serde_json::from_value::<CreateOrderRequest>(body).unwrap_err();
        assert!(err.to_string().contains("shipping_cost"));
    }

    #[test]
    fn update_request_deserializes_upper_case_enums() {
        let req: UpdateOrderStatusRequest = serde_json::from_str(
            r#"{"status":"PROCESSING","payment_status":"PAID","tracking_number":"CL123"}"#,
        )
        .unwrap();
        assert_eq!(req.status, Some(OrderStatus::Processing));
        assert_eq!(req.payment_status, Some(PaymentStatus::Paid));
        assert_eq!(req.shipping_status, None);
    }
}
