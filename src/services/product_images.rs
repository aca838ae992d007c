//! Product gallery. At most one image per product is flagged as main.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::{DatabaseAccess, DbPool};
use crate::entities::{product, product_image};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddImageRequest {
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub url: String,
    #[serde(default)]
    pub is_main: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateImageRequest {
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub url: Option<String>,
    pub is_main: Option<bool>,
}

async fn clear_main<C: ConnectionTrait>(conn: &C, product_id: Uuid) -> Result<u64, ServiceError> {
    let result = product_image::Entity::update_many()
        .col_expr(product_image::Column::IsMain, Expr::value(false))
        .filter(product_image::Column::ProductId.eq(product_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

async fn find_image<C: ConnectionTrait>(
    conn: &C,
    image_id: Uuid,
) -> Result<product_image::Model, ServiceError> {
    product_image::Entity::find_by_id(image_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Image not found".to_string()))
}

#[derive(Clone)]
pub struct ProductImageService {
    db_pool: Arc<DbPool>,
    db: DatabaseAccess,
}

impl ProductImageService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            db: DatabaseAccess::new(db_pool.clone()),
            db_pool,
        }
    }

    /// Images of a product, main image first.
    #[instrument(skip(self))]
    pub async fn list_images(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<product_image::Model>, ServiceError> {
        let db = &*self.db_pool;
        if product::Entity::find_by_id(product_id).one(db).await?.is_none() {
            return Err(ServiceError::BadRequest("Product not found".to_string()));
        }

        Ok(product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(product_id))
            .order_by_desc(product_image::Column::IsMain)
            .order_by_asc(product_image::Column::CreatedAt)
            .all(db)
            .await?)
    }

    #[instrument(skip(self, request), fields(is_main = request.is_main))]
    pub async fn add_image(
        &self,
        product_id: Uuid,
        request: AddImageRequest,
    ) -> Result<product_image::Model, ServiceError> {
        if product::Entity::find_by_id(product_id)
            .one(&*self.db_pool)
            .await?
            .is_none()
        {
            return Err(ServiceError::BadRequest("Product not found".to_string()));
        }

        let image = product_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            url: Set(request.url),
            is_main: Set(request.is_main),
            created_at: Set(Utc::now()),
        };

        let created = self
            .db
            .transaction::<_, product_image::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    if request.is_main {
                        clear_main(txn, product_id).await?;
                    }
                    Ok(image.insert(txn).await?)
                })
            })
            .await?;

        info!(product_id = %product_id, image_id = %created.id, "Product image added");
        Ok(created)
    }

    #[instrument(skip(self, request))]
    pub async fn update_image(
        &self,
        image_id: Uuid,
        request: UpdateImageRequest,
    ) -> Result<product_image::Model, ServiceError> {
        let existing = find_image(&*self.db_pool, image_id).await?;
        let product_id = existing.product_id;
        if request.url.is_none() && request.is_main.is_none() {
            return Ok(existing);
        }

        let mut model: product_image::ActiveModel = existing.into();
        if let Some(url) = request.url {
            model.url = Set(url);
        }
        if let Some(is_main) = request.is_main {
            model.is_main = Set(is_main);
        }
        let promote = request.is_main == Some(true);

        let updated = self
            .db
            .transaction::<_, product_image::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    if promote {
                        clear_main(txn, product_id).await?;
                    }
                    Ok(model.update(txn).await?)
                })
            })
            .await?;

        info!(image_id = %image_id, "Product image updated");
        Ok(updated)
    }

    /// Clears every main flag of the product and marks `image_id`, atomically.
    #[instrument(skip(self))]
    pub async fn set_main_image(
        &self,
        image_id: Uuid,
    ) -> Result<product_image::Model, ServiceError> {
        let existing = find_image(&*self.db_pool, image_id).await?;
        let product_id = existing.product_id;

        let updated = self
            .db
            .transaction::<_, product_image::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    clear_main(txn, product_id).await?;
                    let mut model: product_image::ActiveModel = existing.into();
                    model.is_main = Set(true);
                    Ok(model.update(txn).await?)
                })
            })
            .await?;

        info!(product_id = %product_id, image_id = %image_id, "Main image changed");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_image(&self, image_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let existing = find_image(db, image_id).await?;
        existing.delete(db).await?;
        info!(image_id = %image_id, "Product image deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_request_rejects_malformed_url() {
        let req = AddImageRequest {
            url: "not a url".into(),
            is_main: false,
        };
        assert!(req.validate().is_err());

        let req = AddImageRequest {
            url: "https://cdn.flyshop.example/adams-14.jpg".into(),
            is_main: true,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn is_main_defaults_to_false() {
        let req: AddImageRequest =
            serde_json::from_str(r#"{"url":"https://cdn.flyshop.example/a.jpg"}"#).unwrap();
        assert!(!req.is_main);
    }
}
