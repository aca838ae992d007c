use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::entities::product_image;
use crate::errors::ServiceError;
use crate::handlers::common::{created, validate_input, JsonBody};
use crate::services::product_images::{AddImageRequest, UpdateImageRequest};
use crate::{ApiResponse, ApiResult, AppState};

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/images",
    tag = "Product Images",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Images, main image first", body = ApiResponse<Vec<product_image::Model>>),
        (status = 400, description = "Product not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_images(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> ApiResult<Vec<product_image::Model>> {
    let images = state.services.product_images.list_images(product_id).await?;
    Ok(Json(ApiResponse::success(images)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/images",
    tag = "Product Images",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = AddImageRequest,
    responses(
        (status = 201, description = "Image added", body = ApiResponse<product_image::Model>),
        (status = 400, description = "Invalid URL or unknown product", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn add_image(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    JsonBody(request): JsonBody<AddImageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<product_image::Model>>), ServiceError> {
    validate_input(&request)?;
    let image = state
        .services
        .product_images
        .add_image(product_id, request)
        .await?;
    Ok(created(image))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/images/{image_id}",
    tag = "Product Images",
    params(("image_id" = Uuid, Path, description = "Image ID")),
    request_body = UpdateImageRequest,
    responses(
        (status = 200, description = "Image updated", body = ApiResponse<product_image::Model>),
        (status = 404, description = "Image not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_image(
    State(state): State<AppState>,
    Path(image_id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateImageRequest>,
) -> ApiResult<product_image::Model> {
    validate_input(&request)?;
    let image = state
        .services
        .product_images
        .update_image(image_id, request)
        .await?;
    Ok(Json(ApiResponse::success(image)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/products/images/{image_id}/set-main",
    tag = "Product Images",
    params(("image_id" = Uuid, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image promoted to main", body = ApiResponse<product_image::Model>),
        (status = 404, description = "Image not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn set_main_image(
    State(state): State<AppState>,
    Path(image_id): Path<Uuid>,
) -> ApiResult<product_image::Model> {
    let image = state.services.product_images.set_main_image(image_id).await?;
    Ok(Json(ApiResponse::success(image)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/images/{image_id}",
    tag = "Product Images",
    params(("image_id" = Uuid, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Image deleted"),
        (status = 404, description = "Image not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_image(
    State(state): State<AppState>,
    Path(image_id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.product_images.delete_image(image_id).await?;
    Ok(Json(ApiResponse::message("Image deleted successfully")))
}
