//! User and address lookups consumed by the order workflow.

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::{address, user};
use crate::errors::ServiceError;

pub struct CustomerDirectory;

impl CustomerDirectory {
    pub async fn find_user_by_id<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find_by_id(user_id).one(conn).await?)
    }

    /// Resolves an address only when it belongs to `user_id`.
    pub async fn find_address_for_user<C: ConnectionTrait>(
        conn: &C,
        address_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<address::Model>, ServiceError> {
        Ok(address::Entity::find_by_id(address_id)
            .filter(address::Column::UserId.eq(user_id))
            .one(conn)
            .await?)
    }

    pub async fn require_user<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<user::Model, ServiceError> {
        Self::find_user_by_id(conn, user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    pub async fn require_address_for_user<C: ConnectionTrait>(
        conn: &C,
        address_id: Uuid,
        user_id: Uuid,
    ) -> Result<address::Model, ServiceError> {
        Self::find_address_for_user(conn, address_id, user_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(
                    "Address not found or does not belong to the user".to_string(),
                )
            })
    }
}
