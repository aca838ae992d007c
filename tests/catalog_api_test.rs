//! Category, product and image endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use flyshop_api::entities::UserRole;
use serde_json::json;

#[tokio::test]
async fn catalog_reads_are_public_and_writes_need_catalog_permission() {
    let app = TestApp::new().await;
    let (_, customer_token) = app.create_user(UserRole::Customer).await;

    let response = app.request(Method::GET, "/api/v1/categories", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json!({"name": "Wading Gear"});
    let response = app
        .request(Method::POST, "/api/v1/categories", Some(body.clone()), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(body),
            Some(&customer_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn category_slugs_are_generated_and_kept_unique() {
    let app = TestApp::new().await;
    let (_, staff_token) = app.create_user(UserRole::Staff).await;

    let mut slugs = Vec::new();
    for _ in 0..2 {
        let response = app
            .request(
                Method::POST,
                "/api/v1/categories",
                Some(json!({"name": "Fly Tying Materials"})),
                Some(&staff_token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = response_json(response).await;
        slugs.push(body["data"]["slug"].as_str().unwrap().to_string());
    }

    assert_eq!(slugs[0], "fly-tying-materials");
    assert_ne!(slugs[0], slugs[1]);
    assert!(slugs[1].starts_with("fly-tying-materials-"));

    let response = app
        .request(
            Method::GET,
            "/api/v1/categories/slug/fly-tying-materials",
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn category_with_products_or_children_cannot_be_deleted() {
    let app = TestApp::new().await;
    let (_, staff_token) = app.create_user(UserRole::Staff).await;
    let rods = app.seed_category("Rods").await;
    app.seed_product(rods.id, "Switch Rod 11ft", 540, 2, None).await;

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/categories/{}", rods.id),
            None,
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let parent = app.seed_category("Accessories").await;
    let response = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(json!({"name": "Nets", "parent_id": parent.id})),
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/categories/{}", parent.id),
            None,
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let empty = app.seed_category("Gift Cards").await;
    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/categories/{}", empty.id),
            None,
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn category_cannot_be_its_own_parent() {
    let app = TestApp::new().await;
    let (_, staff_token) = app.create_user(UserRole::Staff).await;
    let category = app.seed_category("Packs").await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/categories/{}", category.id),
            Some(json!({"parent_id": category.id})),
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_create_validates_and_reports_final_price() {
    let app = TestApp::new().await;
    let (_, staff_token) = app.create_user(UserRole::Staff).await;
    let category = app.seed_category("Reels").await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Click Pawl Reel",
                "description": "Classic click and pawl reel for light rods",
                "price": 155,
                "stock": 7,
                "category_id": category.id,
                "discount": 15,
                "attributes": {"arbor": "standard", "weight_oz": 3.1}
            })),
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["slug"], "click-pawl-reel");
    assert_eq!(body["data"]["final_price"], 132);
    assert_eq!(body["data"]["category"]["id"], category.id.to_string());

    for invalid in [
        json!({"name": "Cheap", "description": "too short", "price": 10, "category_id": category.id}),
        json!({"name": "Free Reel", "description": "A reel that costs nothing", "price": 0, "category_id": category.id}),
        json!({"name": "Odd Reel", "description": "Attributes must be an object", "price": 10, "category_id": category.id, "attributes": [1, 2]}),
    ] {
        let response = app
            .request(Method::POST, "/api/v1/products", Some(invalid), Some(&staff_token))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Orphan Reel",
                "description": "Points at a category that does not exist",
                "price": 10,
                "category_id": uuid::Uuid::new_v4()
            })),
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_listing_filters_and_searches() {
    let app = TestApp::new().await;
    let rods = app.seed_category("Rods").await;
    let flies = app.seed_category("Flies").await;
    app.seed_product(rods.id, "Bamboo Rod 7ft", 1200, 1, None).await;
    app.seed_product(rods.id, "Graphite Rod 9ft", 350, 5, None).await;
    app.seed_product(flies.id, "Hopper Pattern #10", 3, 40, None).await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/products?category_id={}", rods.id),
            None,
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 2);

    let response = app
        .request(Method::GET, "/api/v1/products?search=BAMBOO", None, None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["name"], "Bamboo Rod 7ft");

    let response = app
        .request(
            Method::GET,
            "/api/v1/products?min_price=100&max_price=500&sort_by=price&sort_order=asc",
            None,
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["price"], 350);

    let response = app
        .request(
            Method::GET,
            "/api/v1/products?min_price=500&max_price=100",
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(Method::GET, "/api/v1/products?limit=2&page=2", None, None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn stock_adjustment_cannot_go_negative() {
    let app = TestApp::new().await;
    let (_, staff_token) = app.create_user(UserRole::Staff).await;
    let category = app.seed_category("Lines").await;
    let line = app.seed_product(category.id, "Running Line", 45, 3, None).await;
    let uri = format!("/api/v1/products/{}/stock", line.id);

    let response = app
        .request(Method::PATCH, &uri, Some(json!({"quantity": 4})), Some(&staff_token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["data"]["stock"], 7);

    let response = app
        .request(Method::PATCH, &uri, Some(json!({"quantity": -8})), Some(&staff_token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.stock_of(line.id).await, 7);
}

#[tokio::test]
async fn product_update_leaves_stock_alone() {
    let app = TestApp::new().await;
    let (_, staff_token) = app.create_user(UserRole::Staff).await;
    let category = app.seed_category("Leaders").await;
    let leader = app.seed_product(category.id, "Tapered Leader 4X", 6, 5, None).await;

    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{}", leader.id),
            Some(json!({"name": "Tapered Leader 5X", "stock": 500})),
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["name"], "Tapered Leader 5X");
    assert_eq!(body["data"]["stock"], 5);
    assert_eq!(app.stock_of(leader.id).await, 5);
}

#[tokio::test]
async fn product_discount_can_be_cleared() {
    let app = TestApp::new().await;
    let (_, staff_token) = app.create_user(UserRole::Staff).await;
    let category = app.seed_category("Vests").await;
    let vest = app
        .seed_product(category.id, "Mesh Fishing Vest", 80, 2, Some(25))
        .await;
    let uri = format!("/api/v1/products/{}", vest.id);

    let response = app
        .request(Method::PUT, &uri, Some(json!({"is_featured": true})), Some(&staff_token))
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["discount"], 25);
    assert_eq!(body["data"]["final_price"], 60);

    let response = app
        .request(Method::PUT, &uri, Some(json!({"discount": null})), Some(&staff_token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert!(body["data"]["discount"].is_null());
    assert_eq!(body["data"]["final_price"], 80);

    let response = app
        .request(Method::PUT, &uri, Some(json!({"discount": 120})), Some(&staff_token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ordered_products_cannot_be_deleted() {
    let app = TestApp::new().await;
    let (_, staff_token) = app.create_user(UserRole::Staff).await;
    let (customer, _) = app.create_user(UserRole::Customer).await;
    let address = app.create_address(customer.id).await;
    let category = app.seed_category("Nets").await;
    let net = app.seed_product(category.id, "Rubber Mesh Net", 99, 4, None).await;
    let spare = app.seed_product(category.id, "Spare Net Bag", 19, 4, None).await;

    app.state
        .services
        .orders
        .create_order(
            customer.id,
            serde_json::from_value(json!({
                "address_id": address.id,
                "payment_method": "BANK_TRANSFER",
                "shipping_method": "EXPRESS",
                "shipping_cost": 0,
                "items": [{"product_id": net.id, "quantity": 1}]
            }))
            .unwrap(),
        )
        .await
        .expect("place order");

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/products/{}", net.id),
            None,
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/products/{}", spare.id),
            None,
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{}", spare.id),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn one_main_image_per_product() {
    let app = TestApp::new().await;
    let (_, staff_token) = app.create_user(UserRole::Staff).await;
    let category = app.seed_category("Vests").await;
    let vest = app.seed_product(category.id, "Mesh Vest", 120, 3, None).await;
    let images_uri = format!("/api/v1/products/{}/images", vest.id);

    let mut ids = Vec::new();
    for (url, is_main) in [
        ("https://img.example.com/vest-front.jpg", true),
        ("https://img.example.com/vest-back.jpg", true),
        ("https://img.example.com/vest-pocket.jpg", false),
    ] {
        let response = app
            .request(
                Method::POST,
                &images_uri,
                Some(json!({"url": url, "is_main": is_main})),
                Some(&staff_token),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        ids.push(response_json(response).await["data"]["id"].as_str().unwrap().to_string());
    }

    let response = app.request(Method::GET, &images_uri, None, None).await;
    let body = response_json(response).await;
    let images = body["data"].as_array().unwrap();
    assert_eq!(images.len(), 3);
    assert_eq!(images.iter().filter(|i| i["is_main"] == true).count(), 1);
    assert_eq!(images[0]["id"], ids[1]);

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/products/images/{}/set-main", ids[2]),
            None,
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.request(Method::GET, &images_uri, None, None).await;
    let body = response_json(response).await;
    let images = body["data"].as_array().unwrap();
    assert_eq!(images.iter().filter(|i| i["is_main"] == true).count(), 1);
    assert_eq!(images[0]["id"], ids[2]);

    let response = app
        .request(
            Method::POST,
            &images_uri,
            Some(json!({"url": "not a url"})),
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/products/images/{}", ids[0]),
            None,
            Some(&staff_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{}/images", uuid::Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
