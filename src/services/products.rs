use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::db::DbPool;
use crate::entities::{category, order_item, product, product_image};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::categories::ilike;
use crate::services::ledger::{unit_price, InventoryLedger};
use crate::services::{page_bounds, slug, SortOrder};
use crate::PaginatedResponse;

fn validate_attributes(value: &Value) -> Result<(), ValidationError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(ValidationError::new("attributes_must_be_object"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,
    #[validate(range(min = 1, message = "Price must be positive"))]
    pub price: i64,
    #[serde(default)]
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    pub category_id: Uuid,
    #[validate(custom = "validate_attributes")]
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<Value>,
    #[serde(default)]
    pub is_featured: bool,
    #[validate(range(min = 0, max = 100))]
    pub discount: Option<i32>,
    #[validate(length(min = 1, max = 120))]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Price must be positive"))]
    pub price: Option<i64>,
    pub category_id: Option<Uuid>,
    #[validate(custom = "validate_attributes")]
    #[schema(value_type = Option<Object>)]
    pub attributes: Option<Value>,
    pub is_featured: Option<bool>,
    /// Absent leaves the discount as is, `null` clears it.
    #[serde(default, deserialize_with = "explicit_null")]
    #[validate(range(min = 0, max = 100))]
    #[schema(value_type = Option<i32>)]
    pub discount: Option<Option<i32>>,
    #[validate(length(min = 1, max = 120))]
    pub slug: Option<String>,
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Signed stock correction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    pub quantity: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortField {
    #[default]
    CreatedAt,
    Price,
    Name,
    Stock,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub category_id: Option<Uuid>,
    /// Case-insensitive match on name or description
    pub search: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub is_featured: Option<bool>,
    pub sort_by: Option<ProductSortField>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<category::Model> for CategorySummary {
    fn from(model: category::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductListItem {
    #[serde(flatten)]
    pub product: product::Model,
    /// Price after discount
    pub final_price: i64,
    pub category: Option<CategorySummary>,
    pub main_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: product::Model,
    pub final_price: i64,
    pub category: Option<CategorySummary>,
    pub images: Vec<product_image::Model>,
}

async fn slug_taken<C: ConnectionTrait>(
    conn: &C,
    candidate: &str,
    exclude: Option<Uuid>,
) -> Result<bool, ServiceError> {
    let mut query = product::Entity::find().filter(product::Column::Slug.eq(candidate));
    if let Some(id) = exclude {
        query = query.filter(product::Column::Id.ne(id));
    }
    Ok(query.count(conn).await? > 0)
}

async fn unique_slug<C: ConnectionTrait>(
    conn: &C,
    base: String,
    exclude: Option<Uuid>,
) -> Result<String, ServiceError> {
    if slug_taken(conn, &base, exclude).await? {
        Ok(slug::with_collision_suffix(&base))
    } else {
        Ok(base)
    }
}

#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    ledger: InventoryLedger,
    event_sender: Option<Arc<EventSender>>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            ledger: InventoryLedger::new(db_pool.clone(), event_sender.clone()),
            db_pool,
            event_sender,
        }
    }

    async fn ensure_category_exists(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let exists = category::Entity::find_by_id(category_id)
            .one(&*self.db_pool)
            .await?
            .is_some();
        if !exists {
            return Err(ServiceError::BadRequest("Category not found".to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self, query))]
    pub async fn list_products(
        &self,
        query: ProductListQuery,
    ) -> Result<PaginatedResponse<ProductListItem>, ServiceError> {
        let db = &*self.db_pool;
        let (page, limit) = page_bounds(query.page, query.limit);

        if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
            if min > max {
                return Err(ServiceError::BadRequest(
                    "min_price cannot exceed max_price".to_string(),
                ));
            }
        }

        let mut select = product::Entity::find();
        if let Some(category_id) = query.category_id {
            select = select.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            select = select.filter(
                sea_orm::Condition::any()
                    .add(ilike((product::Entity, product::Column::Name), term))
                    .add(ilike((product::Entity, product::Column::Description), term)),
            );
        }
        if let Some(min) = query.min_price {
            select = select.filter(product::Column::Price.gte(min));
        }
        if let Some(max) = query.max_price {
            select = select.filter(product::Column::Price.lte(max));
        }
        if let Some(featured) = query.is_featured {
            select = select.filter(product::Column::IsFeatured.eq(featured));
        }

        let column = match query.sort_by.unwrap_or_default() {
            ProductSortField::CreatedAt => product::Column::CreatedAt,
            ProductSortField::Price => product::Column::Price,
            ProductSortField::Name => product::Column::Name,
            ProductSortField::Stock => product::Column::Stock,
        };
        let paginator = select
            .order_by(column, query.sort_order.unwrap_or_default().into())
            .order_by_asc(product::Column::Id)
            .paginate(db, limit);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page - 1).await?;

        let category_ids: Vec<Uuid> = products.iter().map(|p| p.category_id).collect();
        let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();

        let categories: HashMap<Uuid, category::Model> = category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let main_images: HashMap<Uuid, String> = product_image::Entity::find()
            .filter(product_image::Column::ProductId.is_in(product_ids))
            .filter(product_image::Column::IsMain.eq(true))
            .all(db)
            .await?
            .into_iter()
            .map(|img| (img.product_id, img.url))
            .collect();

        let items = products
            .into_iter()
            .map(|product| ProductListItem {
                final_price: unit_price(product.price, product.discount),
                category: categories
                    .get(&product.category_id)
                    .cloned()
                    .map(CategorySummary::from),
                main_image: main_images.get(&product.id).cloned(),
                product,
            })
            .collect();

        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    async fn detail(&self, product: product::Model) -> Result<ProductDetail, ServiceError> {
        let db = &*self.db_pool;
        let category = category::Entity::find_by_id(product.category_id)
            .one(db)
            .await?
            .map(CategorySummary::from);
        let images = product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product.id))
            .order_by_desc(product_image::Column::IsMain)
            .order_by_asc(product_image::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(ProductDetail {
            final_price: unit_price(product.price, product.discount),
            category,
            images,
            product,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: Uuid) -> Result<ProductDetail, ServiceError> {
        let product = InventoryLedger::get_product(&*self.db_pool, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
        self.detail(product).await
    }

    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<ProductDetail, ServiceError> {
        let product = product::Entity::find()
            .filter(product::Column::Slug.eq(slug))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
        self.detail(product).await
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductDetail, ServiceError> {
        let db = &*self.db_pool;
        self.ensure_category_exists(request.category_id).await?;

        let base = slug::resolve(&request.name, request.slug.as_deref())?;
        let slug = unique_slug(db, base, None).await?;

        let now = Utc::now();
        let created = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            slug: Set(slug),
            description: Set(request.description),
            price: Set(request.price),
            stock: Set(request.stock),
            discount: Set(request.discount),
            category_id: Set(request.category_id),
            attributes: Set(request.attributes),
            is_featured: Set(request.is_featured),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(product_id = %created.id, slug = %created.slug, "Product created");
        if let Some(sender) = &self.event_sender {
            sender.publish(Event::ProductCreated(created.id)).await;
        }

        self.detail(created).await
    }

    #[instrument(skip(self, request))]
    pub async fn update_product(
        &self,
        id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductDetail, ServiceError> {
        let db = &*self.db_pool;
        let existing = InventoryLedger::get_product(db, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        if let Some(category_id) = request.category_id {
            self.ensure_category_exists(category_id).await?;
        }

        let name_changed = request
            .name
            .as_deref()
            .is_some_and(|name| name != existing.name);
        let new_slug = match (&request.slug, &request.name) {
            (Some(supplied), _) => Some(slug::resolve(supplied, None)?),
            (None, Some(name)) if name_changed => Some(slug::resolve(name, None)?),
            _ => None,
        };

        let mut model: product::ActiveModel = existing.into();
        if let Some(base) = new_slug {
            model.slug = Set(unique_slug(db, base, Some(id)).await?);
        }
        if let Some(name) = request.name {
            model.name = Set(name);
        }
        if let Some(description) = request.description {
            model.description = Set(description);
        }
        if let Some(price) = request.price {
            model.price = Set(price);
        }
        if let Some(category_id) = request.category_id {
            model.category_id = Set(category_id);
        }
        if let Some(attributes) = request.attributes {
            model.attributes = Set(Some(attributes));
        }
        if let Some(is_featured) = request.is_featured {
            model.is_featured = Set(is_featured);
        }
        if let Some(discount) = request.discount {
            model.discount = Set(discount);
        }

        let updated = model.update(db).await?;
        info!(product_id = %id, "Product updated");
        self.detail(updated).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        InventoryLedger::get_product(db, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;

        let referenced = order_item::Entity::find()
            .filter(order_item::Column::ProductId.eq(id))
            .count(db)
            .await?;
        if referenced > 0 {
            return Err(ServiceError::BadRequest(
                "Cannot delete product that is part of existing orders".to_string(),
            ));
        }

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for product deletion");
            ServiceError::DatabaseError(e)
        })?;
        product_image::Entity::delete_many()
            .filter(product_image::Column::ProductId.eq(id))
            .exec(&txn)
            .await?;
        product::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(product_id = %id, "Product deleted");
        if let Some(sender) = &self.event_sender {
            sender.publish(Event::ProductDeleted(id)).await;
        }
        Ok(())
    }

    pub async fn adjust_stock(
        &self,
        id: Uuid,
        request: AdjustStockRequest,
    ) -> Result<product::Model, ServiceError> {
        self.ledger.adjust_stock(id, request.quantity).await
    }
}
