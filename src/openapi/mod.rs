use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Flyshop API",
        version = "1.0.0",
        description = r#"
# Flyshop API

Catalog, customer accounts and order processing for a fly-fishing store.

## Authentication

Protected endpoints expect a JWT issued by `/api/v1/auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

## Money

Prices, subtotals, shipping costs and totals are integers in whole currency units.
Product discounts are whole percentages.

## Pagination

List endpoints accept `page` (default 1) and `limit` (default 20, max 100)
and return `{items, total, page, limit, total_pages}`.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Auth", description = "Registration, login and account endpoints"),
        (name = "Categories", description = "Category catalog endpoints"),
        (name = "Products", description = "Product catalog and stock endpoints"),
        (name = "Product Images", description = "Product gallery endpoints"),
        (name = "Orders", description = "Order placement and fulfillment endpoints"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        // Health
        crate::handlers::health::health_check,
        crate::handlers::health::api_status,

        // Auth
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::profile,
        crate::handlers::auth::change_password,

        // Categories
        crate::handlers::categories::list_categories,
        crate::handlers::categories::get_category,
        crate::handlers::categories::get_category_by_slug,
        crate::handlers::categories::create_category,
        crate::handlers::categories::update_category,
        crate::handlers::categories::delete_category,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::get_product_by_slug,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::adjust_stock,

        // Images
        crate::handlers::product_images::list_images,
        crate::handlers::product_images::add_image,
        crate::handlers::product_images::update_image,
        crate::handlers::product_images::set_main_image,
        crate::handlers::product_images::delete_image,

        // Orders
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_my_orders,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order_status,
        crate::handlers::orders::cancel_order,
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::services::SortOrder,

            // Entities
            crate::entities::category::Model,
            crate::entities::product::Model,
            crate::entities::product_image::Model,
            crate::entities::address::Model,
            crate::entities::order::Model,
            crate::entities::order_item::Model,
            crate::entities::UserRole,
            crate::entities::OrderStatus,
            crate::entities::PaymentStatus,
            crate::entities::ShippingStatus,
            crate::entities::PaymentMethod,
            crate::entities::ShippingMethod,

            // Auth types
            crate::auth::RegisterRequest,
            crate::auth::LoginRequest,
            crate::auth::ChangePasswordRequest,
            crate::auth::UserProfile,
            crate::auth::AuthResponse,

            // Catalog types
            crate::services::categories::CreateCategoryRequest,
            crate::services::categories::UpdateCategoryRequest,
            crate::services::categories::CategoryView,
            crate::services::categories::CategoryProductSummary,
            crate::services::products::CreateProductRequest,
            crate::services::products::UpdateProductRequest,
            crate::services::products::AdjustStockRequest,
            crate::services::products::ProductListItem,
            crate::services::products::ProductDetail,
            crate::services::products::CategorySummary,
            crate::services::product_images::AddImageRequest,
            crate::services::product_images::UpdateImageRequest,

            // Order types
            crate::services::orders::CreateOrderRequest,
            crate::services::orders::OrderItemInput,
            crate::services::orders::UpdateOrderStatusRequest,
            crate::services::orders::OrderAggregate,
            crate::services::orders::OrderItemView,
            crate::services::orders::ProductSnapshot,
            crate::services::orders::UserSummary,

            // Error types
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDocV1;

/// Registers the `Bearer` scheme referenced by protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Flyshop API"));
        assert!(json.contains("/api/v1/orders/{id}/cancel"));
        assert!(json.contains("/api/v1/products/images/{image_id}/set-main"));
        assert!(json.contains("\"Bearer\""));
    }
}
