use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::{category, product};
use crate::errors::ServiceError;
use crate::services::{page_bounds, slug, SortOrder};
use crate::PaginatedResponse;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 120))]
    pub slug: Option<String>,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CategorySortField {
    #[default]
    Name,
    CreatedAt,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CategoryListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub parent_id: Option<Uuid>,
    /// Case-insensitive match on the category name
    pub search: Option<String>,
    pub sort_by: Option<CategorySortField>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryProductSummary {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub is_featured: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: category::Model,
    pub products: Vec<CategoryProductSummary>,
}

/// `lower(column) LIKE %term%`, portable across sqlite and postgres.
pub(crate) fn ilike<C>(column: C, term: &str) -> sea_orm::sea_query::SimpleExpr
where
    C: sea_orm::sea_query::IntoColumnRef,
{
    Expr::expr(Func::lower(Expr::col(column))).like(format!("%{}%", term.to_lowercase()))
}

async fn slug_taken<C: ConnectionTrait>(
    conn: &C,
    candidate: &str,
    exclude: Option<Uuid>,
) -> Result<bool, ServiceError> {
    let mut query = category::Entity::find().filter(category::Column::Slug.eq(candidate));
    if let Some(id) = exclude {
        query = query.filter(category::Column::Id.ne(id));
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
pub struct CategoryService {
    db_pool: Arc<DbPool>,
}

impl CategoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    async fn with_products(
        &self,
        categories: Vec<category::Model>,
    ) -> Result<Vec<CategoryView>, ServiceError> {
        let db = &*self.db_pool;
        let ids: Vec<Uuid> = categories.iter().map(|c| c.id).collect();

        let mut by_category: HashMap<Uuid, Vec<CategoryProductSummary>> = HashMap::new();
        if !ids.is_empty() {
            let products = product::Entity::find()
                .filter(product::Column::CategoryId.is_in(ids))
                .order_by_asc(product::Column::Name)
                .all(db)
                .await?;
            for p in products {
                by_category
                    .entry(p.category_id)
                    .or_default()
                    .push(CategoryProductSummary {
                        id: p.id,
                        name: p.name,
                        price: p.price,
                        is_featured: p.is_featured,
                    });
            }
        }

        Ok(categories
            .into_iter()
            .map(|category| CategoryView {
                products: by_category.remove(&category.id).unwrap_or_default(),
                category,
            })
            .collect())
    }

    #[instrument(skip(self, query))]
    pub async fn list_categories(
        &self,
        query: CategoryListQuery,
    ) -> Result<PaginatedResponse<CategoryView>, ServiceError> {
        let db = &*self.db_pool;
        let (page, limit) = page_bounds(query.page, query.limit);

        let mut select = category::Entity::find();
        if let Some(parent_id) = query.parent_id {
            select = select.filter(category::Column::ParentId.eq(parent_id));
        }
        if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            select = select.filter(ilike((category::Entity, category::Column::Name), term));
        }

        let column = match query.sort_by.unwrap_or_default() {
            CategorySortField::Name => category::Column::Name,
            CategorySortField::CreatedAt => category::Column::CreatedAt,
        };
        let order = query.sort_order.unwrap_or(SortOrder::Asc);
        let paginator = select
            .order_by(column, order.into())
            .order_by_asc(category::Column::Id)
            .paginate(db, limit);

        let total = paginator.num_items().await?;
        let categories = paginator.fetch_page(page - 1).await?;
        let items = self.with_products(categories).await?;

        Ok(PaginatedResponse::new(items, total, page, limit))
    }

    async fn single_view(&self, model: category::Model) -> Result<CategoryView, ServiceError> {
        self.with_products(vec![model])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::InternalError("Category view missing".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: Uuid) -> Result<CategoryView, ServiceError> {
        let model = category::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))?;
        self.single_view(model).await
    }

    #[instrument(skip(self))]
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<CategoryView, ServiceError> {
        let model = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))?;
        self.single_view(model).await
    }

    async fn ensure_parent_exists(&self, parent_id: Uuid) -> Result<(), ServiceError> {
        let exists = category::Entity::find_by_id(parent_id)
            .one(&*self.db_pool)
            .await?
            .is_some();
        if !exists {
            return Err(ServiceError::BadRequest(
                "Parent category not found".to_string(),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        let db = &*self.db_pool;

        if let Some(parent_id) = request.parent_id {
            self.ensure_parent_exists(parent_id).await?;
        }

        let base = slug::resolve(&request.name, request.slug.as_deref())?;
        let slug = unique_slug(db, base, None).await?;

        let now = Utc::now();
        let created = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            slug: Set(slug),
            description: Set(request.description),
            parent_id: Set(request.parent_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        info!(category_id = %created.id, slug = %created.slug, "Category created");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_category(
        &self,
        id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        let db = &*self.db_pool;
        let existing = category::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))?;

        if let Some(parent_id) = request.parent_id {
            if parent_id == id {
                return Err(ServiceError::BadRequest(
                    "A category cannot be its own parent".to_string(),
                ));
            }
            self.ensure_parent_exists(parent_id).await?;
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

        let mut model: category::ActiveModel = existing.into();
        if let Some(base) = new_slug {
            model.slug = Set(unique_slug(db, base, Some(id)).await?);
        }
        if let Some(name) = request.name {
            model.name = Set(name);
        }
        if let Some(description) = request.description {
            model.description = Set(Some(description));
        }
        if let Some(parent_id) = request.parent_id {
            model.parent_id = Set(Some(parent_id));
        }

        let updated = model.update(db).await?;
        info!(category_id = %id, "Category updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let existing = category::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Category not found".to_string()))?;

        let product_count = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(db)
            .await?;
        if product_count > 0 {
            return Err(ServiceError::BadRequest(format!(
                "Cannot delete category with {} associated products",
                product_count
            )));
        }

        let child_count = category::Entity::find()
            .filter(category::Column::ParentId.eq(id))
            .count(db)
            .await?;
        if child_count > 0 {
            return Err(ServiceError::BadRequest(format!(
                "Cannot delete category with {} subcategories",
                child_count
            )));
        }

        existing.delete(db).await?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
