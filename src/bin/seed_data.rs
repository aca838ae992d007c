//! Seed data script - populates the database with the demo fly catalog
//!
//! Run with: cargo run --bin seed-data -- --admin-password <pw> --customer-password <pw>
//!
//! This creates:
//! - categories Moscas, Cañas, Carretes, Accesorios
//! - sub-categories Moscas Secas, Ninfas, Streamers under Moscas
//! - three flies, each with a main image
//! - an admin account and a customer account with one address
//!
//! Re-running skips anything whose slug or email already exists.

use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use flyshop_api::auth::hash_password;
use flyshop_api::db::{self, DbPool};
use flyshop_api::entities::{address, category, product, user, UserRole};
use flyshop_api::services::categories::{CategoryService, CreateCategoryRequest};
use flyshop_api::services::product_images::{AddImageRequest, ProductImageService};
use flyshop_api::services::products::{CreateProductRequest, ProductService};

#[derive(Parser)]
#[command(name = "seed-data", about = "Populate the flyshop database with demo data", version)]
struct Cli {
    #[arg(long, help = "Database URL; falls back to DATABASE_URL")]
    database_url: Option<String>,
    #[arg(long, default_value = "admin@flyfishing.cl")]
    admin_email: String,
    #[arg(long)]
    admin_password: String,
    #[arg(long, default_value = "cliente@example.com")]
    customer_email: String,
    #[arg(long)]
    customer_password: String,
}

struct SeedCategory {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
}

const TOP_LEVEL: [SeedCategory; 4] = [
    SeedCategory {
        name: "Moscas",
        slug: "moscas",
        description: "Moscas atadas a mano para pesca con mosca",
    },
    SeedCategory {
        name: "Cañas",
        slug: "canas",
        description: "Cañas para pesca con mosca",
    },
    SeedCategory {
        name: "Carretes",
        slug: "carretes",
        description: "Carretes para pesca con mosca",
    },
    SeedCategory {
        name: "Accesorios",
        slug: "accesorios",
        description: "Accesorios para pesca con mosca",
    },
];

// Children of "moscas".
const FLY_TYPES: [SeedCategory; 3] = [
    SeedCategory {
        name: "Moscas Secas",
        slug: "moscas-secas",
        description: "Moscas secas para pesca en superficie",
    },
    SeedCategory {
        name: "Ninfas",
        slug: "ninfas",
        description: "Moscas que imitan insectos bajo el agua",
    },
    SeedCategory {
        name: "Streamers",
        slug: "streamers",
        description: "Moscas que imitan peces y otros organismos acuáticos",
    },
];

struct SeedProduct {
    category_slug: &'static str,
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    price: i64,
    stock: i32,
    featured: bool,
    attributes: serde_json::Value,
}

fn seed_products() -> Vec<SeedProduct> {
    vec![
        SeedProduct {
            category_slug: "moscas-secas",
            name: "Adams #14",
            slug: "adams-14",
            description: "Mosca seca clásica, excelente imitación de efímeras con alas grises",
            price: 3500,
            stock: 50,
            featured: true,
            attributes: json!({
                "size": 14,
                "hook": "Dry Fly Hook",
                "materials": ["Gallo de León", "Pluma de Pato", "Hackle de Gallo"],
                "floatability": "Alta"
            }),
        },
        SeedProduct {
            category_slug: "ninfas",
            name: "Copper John #16",
            slug: "copper-john-16",
            description: "Ninfa efectiva en ríos chilenos, con cuerpo de alambre de cobre",
            price: 3800,
            stock: 40,
            featured: false,
            attributes: json!({
                "size": 16,
                "hook": "Nymph Hook",
                "materials": ["Alambre de Cobre", "Dubbing", "Bead Head"],
                "weight": "Media"
            }),
        },
        SeedProduct {
            category_slug: "streamers",
            name: "Woolly Bugger Negro #8",
            slug: "woolly-bugger-negro-8",
            description: "Streamer versátil para truchas y salmones en lagos y ríos de Chile",
            price: 4200,
            stock: 35,
            featured: true,
            attributes: json!({
                "size": 8,
                "hook": "Streamer Hook",
                "materials": ["Marabú", "Chenille", "Hackle de Gallo"],
                "weight": "Alta"
            }),
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let database_url = cli
        .database_url
        .clone()
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://flyshop.db?mode=rwc".to_string());

    info!("=== Flyshop Seed Data ===");
    info!("Connecting to database: {}", database_url);
    let pool = Arc::new(db::establish_connection(&database_url).await?);
    db::run_migrations(&pool).await?;

    info!("Creating categories...");
    let categories = CategoryService::new(pool.clone());
    let moscas_id = ensure_category(&pool, &categories, &TOP_LEVEL[0], None).await?;
    for seed in &TOP_LEVEL[1..] {
        ensure_category(&pool, &categories, seed, None).await?;
    }
    for seed in &FLY_TYPES {
        ensure_category(&pool, &categories, seed, Some(moscas_id)).await?;
    }

    info!("Creating products...");
    let products = ProductService::new(pool.clone(), None);
    let images = ProductImageService::new(pool.clone());
    for seed in seed_products() {
        let exists = product::Entity::find()
            .filter(product::Column::Slug.eq(seed.slug))
            .one(&*pool)
            .await?
            .is_some();
        if exists {
            info!("  product {} already exists, skipping", seed.slug);
            continue;
        }

        let category_id = category_id_by_slug(&pool, seed.category_slug)
            .await?
            .ok_or_else(|| anyhow::anyhow!("category {} missing", seed.category_slug))?;
        let detail = products
            .create_product(CreateProductRequest {
                name: seed.name.to_string(),
                description: seed.description.to_string(),
                price: seed.price,
                stock: seed.stock,
                category_id,
                attributes: Some(seed.attributes),
                is_featured: seed.featured,
                discount: None,
                slug: Some(seed.slug.to_string()),
            })
            .await?;
        images
            .add_image(
                detail.product.id,
                AddImageRequest {
                    url: format!("https://example.com/images/{}.jpg", detail.product.slug),
                    is_main: true,
                },
            )
            .await?;
        info!("  created product {}", detail.product.slug);
    }

    info!("Creating accounts...");
    create_account(
        &pool,
        &cli.admin_email,
        &cli.admin_password,
        ("Admin", "Usuario"),
        UserRole::Admin,
    )
    .await?;
    if let Some(customer_id) = create_account(
        &pool,
        &cli.customer_email,
        &cli.customer_password,
        ("Cliente", "Ejemplo"),
        UserRole::Customer,
    )
    .await?
    {
        address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(customer_id),
            street: Set("Av. Apoquindo 123".to_string()),
            city: Set("Santiago".to_string()),
            commune: Set(Some("Maipú".to_string())),
            province: Set(Some("Santiago".to_string())),
            region: Set("Región Metropolitana".to_string()),
            zip_code: Set(Some("7550000".to_string())),
            created_at: Set(Utc::now()),
        }
        .insert(&*pool)
        .await?;
    }

    info!("=== Seed Data Complete ===");
    info!("Try these API calls:");
    info!("  curl http://localhost:8080/api/v1/categories");
    info!("  curl http://localhost:8080/api/v1/products?is_featured=true");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

async fn category_id_by_slug(pool: &DbPool, slug: &str) -> anyhow::Result<Option<Uuid>> {
    Ok(category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .one(pool)
        .await?
        .map(|c| c.id))
}

async fn ensure_category(
    pool: &DbPool,
    service: &CategoryService,
    seed: &SeedCategory,
    parent_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    if let Some(id) = category_id_by_slug(pool, seed.slug).await? {
        info!("  category {} already exists, skipping", seed.slug);
        return Ok(id);
    }

    let created = service
        .create_category(CreateCategoryRequest {
            name: seed.name.to_string(),
            description: Some(seed.description.to_string()),
            slug: Some(seed.slug.to_string()),
            parent_id,
        })
        .await?;
    info!("  created category {}", created.slug);
    Ok(created.id)
}

/// Returns the new account id, or `None` when the email is already taken.
async fn create_account(
    pool: &DbPool,
    email: &str,
    password: &str,
    (first_name, last_name): (&str, &str),
    role: UserRole,
) -> anyhow::Result<Option<Uuid>> {
    let email = email.trim().to_lowercase();
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(pool)
        .await?;
    if existing.is_some() {
        info!("  {} already exists, skipping", email);
        return Ok(None);
    }

    let now = Utc::now();
    let created = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.clone()),
        password_hash: Set(hash_password(password)?),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        phone: Set(None),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(pool)
    .await?;
    info!("  created {} account {}", role, email);
    Ok(Some(created.id))
}
