use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::entities::category;
use crate::errors::ServiceError;
use crate::handlers::common::{created, validate_input, JsonBody};
use crate::services::categories::{
    CategoryListQuery, CategoryView, CreateCategoryRequest, UpdateCategoryRequest,
};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "Categories",
    params(CategoryListQuery),
    responses(
        (status = 200, description = "Categories with their products", body = ApiResponse<PaginatedResponse<CategoryView>>),
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryListQuery>,
) -> ApiResult<PaginatedResponse<CategoryView>> {
    let page = state.services.categories.list_categories(query).await?;
    Ok(Json(ApiResponse::success(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = ApiResponse<CategoryView>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CategoryView> {
    let view = state.services.categories.get_category(id).await?;
    Ok(Json(ApiResponse::success(view)))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/slug/{slug}",
    tag = "Categories",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category", body = ApiResponse<CategoryView>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_category_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<CategoryView> {
    let view = state.services.categories.get_category_by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(view)))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "Categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<category::Model>),
        (status = 400, description = "Invalid input or unknown parent", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden"),
    ),
    security(("Bearer" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<category::Model>>), ServiceError> {
    validate_input(&request)?;
    let model = state.services.categories.create_category(request).await?;
    Ok(created(model))
}

#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<category::Model>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateCategoryRequest>,
) -> ApiResult<category::Model> {
    validate_input(&request)?;
    let model = state.services.categories.update_category(id, request).await?;
    Ok(Json(ApiResponse::success(model)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 400, description = "Category still has products or subcategories", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.categories.delete_category(id).await?;
    Ok(Json(ApiResponse::message("Category deleted successfully")))
}
