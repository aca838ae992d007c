use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::entities::product;
use crate::errors::ServiceError;
use crate::handlers::common::{created, validate_input, JsonBody};
use crate::services::products::{
    AdjustStockRequest, CreateProductRequest, ProductDetail, ProductListItem, ProductListQuery,
    UpdateProductRequest,
};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "Products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Filtered product page", body = ApiResponse<PaginatedResponse<ProductListItem>>),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> ApiResult<PaginatedResponse<ProductListItem>> {
    let page = state.services.products.list_products(query).await?;
    Ok(Json(ApiResponse::success(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product with category and images", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<ProductDetail> {
    let detail = state.services.products.get_product(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/slug/{slug}",
    tag = "Products",
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product with category and images", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_product_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<ProductDetail> {
    let detail = state.services.products.get_product_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    post,
    path = "/api/v1/products",
    tag = "Products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductDetail>),
        (status = 400, description = "Invalid input or unknown category", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductDetail>>), ServiceError> {
    validate_input(&request)?;
    let detail = state.services.products.create_product(request).await?;
    Ok(created(detail))
}

#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateProductRequest>,
) -> ApiResult<ProductDetail> {
    validate_input(&request)?;
    let detail = state.services.products.update_product(id, request).await?;
    Ok(Json(ApiResponse::success(detail)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 400, description = "Product is referenced by orders", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.products.delete_product(id).await?;
    Ok(Json(ApiResponse::message("Product deleted successfully")))
}

/// Signed stock delta; the result may not drop below zero.
#[utoipa::path(
    patch,
    path = "/api/v1/products/{id}/stock",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ApiResponse<product::Model>),
        (status = 400, description = "Adjustment would make stock negative", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<AdjustStockRequest>,
) -> ApiResult<product::Model> {
    let model = state.services.products.adjust_stock(id, request).await?;
    Ok(Json(ApiResponse::success(model)))
}
