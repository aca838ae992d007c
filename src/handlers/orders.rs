use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::OrderStatus;
use crate::errors::ServiceError;
use crate::handlers::common::{created, validate_input, JsonBody};
use crate::services::orders::{
    CreateOrderRequest, OrderAggregate, OrderListQuery, UpdateOrderStatusRequest,
};
use crate::{ApiResponse, ApiResult, AppState, PaginatedResponse};

/// Query parameters for the caller's own order history
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MyOrdersQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<OrderStatus>,
}

/// Place an order for the authenticated user.
///
/// Stock is reserved and prices are captured in a single transaction.
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    tag = "Orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = ApiResponse<OrderAggregate>),
        (status = 400, description = "Invalid items, address or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
    ),
    security(("Bearer" = []))
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderAggregate>>), ServiceError> {
    validate_input(&request)?;
    let order = state
        .services
        .orders
        .create_order(user.user_id, request)
        .await?;
    Ok(created(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/my-orders",
    tag = "Orders",
    params(MyOrdersQuery),
    responses(
        (status = 200, description = "The caller's orders, newest first", body = ApiResponse<PaginatedResponse<OrderAggregate>>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("Bearer" = []))
)]
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<MyOrdersQuery>,
) -> ApiResult<PaginatedResponse<OrderAggregate>> {
    let page = state
        .services
        .orders
        .list_user_orders(user.user_id, query.page, query.limit, query.status)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    tag = "Orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Filtered orders", body = ApiResponse<PaginatedResponse<OrderAggregate>>),
        (status = 403, description = "Forbidden"),
    ),
    security(("Bearer" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<PaginatedResponse<OrderAggregate>> {
    let page = state.services.orders.list_orders(query).await?;
    Ok(Json(ApiResponse::success(page)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with user, address and items", body = ApiResponse<OrderAggregate>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderAggregate> {
    let order = state.services.orders.get_order(id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Set any subset of the status triad plus tracking number and notes.
#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/status",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<OrderAggregate>),
        (status = 400, description = "Invalid status change", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order changed concurrently", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateOrderStatusRequest>,
) -> ApiResult<OrderAggregate> {
    validate_input(&request)?;
    let order = state.services.orders.update_status(id, request).await?;
    Ok(Json(ApiResponse::success(order)))
}

#[utoipa::path(
    post,
    path = "/api/v1/orders/{id}/cancel",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled and stock restored", body = ApiResponse<OrderAggregate>),
        (status = 400, description = "Order can no longer be cancelled", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderAggregate> {
    let order = state.services.orders.cancel_order(id).await?;
    Ok(Json(ApiResponse::success_with_message(
        order,
        "Order cancelled successfully",
    )))
}
