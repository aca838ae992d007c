#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

use flyshop_api::{
    auth::hash_password,
    config::AppConfig,
    db,
    entities::{address, category, product, user, UserRole},
    events::{self, EventSender},
    services::categories::CreateCategoryRequest,
    services::products::CreateProductRequest,
    AppState,
};

pub const TEST_PASSWORD: &str = "Tippet-5x-Leader";

/// Application wired against a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir for test database");
        let db_path = db_dir.path().join("flyshop_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "test_secret_key_for_integration_runs_with_more_than_sixty_four_chars_0123456789"
                .to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, Some(event_sender));
        let router = flyshop_api::app_router(state.clone());

        Self {
            router,
            state,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    pub fn db(&self) -> &sea_orm::DatabaseConnection {
        &self.state.db
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Inserts an account with the given role and returns it with a signed token.
    pub async fn create_user(&self, role: UserRole) -> (user::Model, String) {
        let now = Utc::now();
        let email: String = SafeEmail().fake();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(format!("{}.{}", Uuid::new_v4().simple(), email.to_lowercase())),
            password_hash: Set(hash_password(TEST_PASSWORD).expect("hash password")),
            first_name: Set(FirstName().fake()),
            last_name: Set(LastName().fake()),
            phone: Set(None),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db())
        .await
        .expect("insert test user");

        let token = self
            .state
            .auth_service()
            .generate_token(&model)
            .expect("sign test token");
        (model, token)
    }

    pub async fn create_address(&self, user_id: Uuid) -> address::Model {
        address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            street: Set("12 Riffle Lane".to_string()),
            city: Set("Bozeman".to_string()),
            commune: Set(None),
            province: Set(None),
            region: Set("Montana".to_string()),
            zip_code: Set(Some("59715".to_string())),
            created_at: Set(Utc::now()),
        }
        .insert(self.db())
        .await
        .expect("insert test address")
    }

    pub async fn seed_category(&self, name: &str) -> category::Model {
        self.state
            .services
            .categories
            .create_category(CreateCategoryRequest {
                name: name.to_string(),
                description: Some(format!("{} for integration tests", name)),
                slug: None,
                parent_id: None,
            })
            .await
            .expect("seed category")
    }

    pub async fn seed_product(
        &self,
        category_id: Uuid,
        name: &str,
        price: i64,
        stock: i32,
        discount: Option<i32>,
    ) -> product::Model {
        self.state
            .services
            .products
            .create_product(CreateProductRequest {
                name: name.to_string(),
                description: format!("{} seeded for integration tests", name),
                price,
                stock,
                category_id,
                attributes: None,
                is_featured: false,
                discount,
                slug: None,
            })
            .await
            .expect("seed product")
            .product
    }

    pub async fn stock_of(&self, product_id: Uuid) -> i32 {
        product::Entity::find_by_id(product_id)
            .one(self.db())
            .await
            .expect("load product")
            .expect("product exists")
            .stock
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
