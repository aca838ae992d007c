pub mod auth;
pub mod categories;
pub mod common;
pub mod health;
pub mod orders;
pub mod product_images;
pub mod products;

use std::sync::Arc;

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    categories::CategoryService, orders::OrderService, product_images::ProductImageService,
    products::ProductService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub product_images: Arc<ProductImageService>,
    pub orders: Arc<OrderService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Option<Arc<EventSender>>,
        auth: Arc<AuthService>,
    ) -> Self {
        Self {
            auth,
            categories: Arc::new(CategoryService::new(db_pool.clone())),
            products: Arc::new(ProductService::new(db_pool.clone(), event_sender.clone())),
            product_images: Arc::new(ProductImageService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(db_pool, event_sender)),
        }
    }
}
