use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use storefront::domain::aggregates::{GalleryImage, Product};
use storefront::http::{router, AppState};
use storefront::publisher::EventPublisher;
use storefront::store::MemoryStore;

fn product(id: i64, price: i64, discount: Option<i32>, colors: &[&str], age_days: i64) -> Product {
    Product {
        id,
        title: format!("Product {id}"),
        description: None,
        price,
        discount,
        thumbnail: Some(format!("/img/{id}.jpg")),
        colors: colors.iter().map(|c| c.to_string()).collect(),
        sizes: vec!["M".into()],
        category_id: Some(1),
        created_at: Utc::now() - Duration::days(age_days),
        gallery: vec![
            GalleryImage { id: id * 10, product_id: id, thumbnail: format!("/img/{id}-a.jpg"), created_at: Utc::now() },
            GalleryImage { id: id * 10 + 1, product_id: id, thumbnail: format!("/img/{id}-b.jpg"), created_at: Utc::now() },
        ],
    }
}

async fn setup() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    store.insert_product(product(5, 100_000, Some(10), &["black"], 3)).await;
    store.insert_product(product(6, 20_000, None, &["white"], 2)).await;
    store.insert_product(product(7, 55_000, Some(0), &["black", "white"], 1)).await;
    let app = router(AppState::new(store.clone(), EventPublisher::disabled()));
    (app, store)
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
    send_raw(app, method, uri, token, body.map(|b| b.to_string())).await
}

async fn send_raw(app: &Router, method: &str, uri: &str, token: Option<Uuid>, body: Option<String>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder.header("content-type", "application/json").body(Body::from(body)).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_health() {
    let (app, _) = setup().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_cart_requires_session() {
    let (app, _) = setup().await;
    assert_eq!(send(&app, "GET", "/cart", None, None).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(send(&app, "GET", "/cart", Some(Uuid::new_v4()), None).await.0, StatusCode::UNAUTHORIZED);
    // Identity is checked before the body.
    let (status, body) = send(&app, "POST", "/cart", None, Some(json!({"productId": 5, "quantity": 0}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_empty_cart() {
    let (app, store) = setup().await;
    let token = store.open_session(1).await;
    let (status, body) = send(&app, "GET", "/cart", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"cartItems": [], "totalQuantity": 0, "totalPrice": 0}));
}

#[tokio::test]
async fn test_add_to_cart_prices_with_discount() {
    let (app, store) = setup().await;
    let token = store.open_session(1).await;
    let (status, body) = send(&app, "POST", "/cart", Some(token), Some(json!({"productId": 5, "quantity": 2}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalQuantity"], 2);
    assert_eq!(body["totalPrice"], 180_000);
    let items = body["cartItems"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["lineTotal"], 180_000);
    assert_eq!(items[0]["product"]["effectivePrice"], 90_000);
    assert_eq!(items[0]["product"]["mainImage"]["thumbnail"], "/img/5-a.jpg");
    assert_eq!(items[0]["product"]["hoverImage"]["thumbnail"], "/img/5-b.jpg");
}

#[tokio::test]
async fn test_repeated_adds_merge_into_one_line() {
    let (app, store) = setup().await;
    let token = store.open_session(1).await;
    send(&app, "POST", "/cart", Some(token), Some(json!({"productId": 6, "quantity": 1}))).await;
    let (_, body) = send(&app, "POST", "/cart", Some(token), Some(json!({"productId": 6, "quantity": 4}))).await;
    assert_eq!(body["cartItems"].as_array().unwrap().len(), 1);
    assert_eq!(body["totalQuantity"], 5);
    assert_eq!(body["totalPrice"], 100_000);
}

#[tokio::test]
async fn test_concurrent_adds() {
    let (app, store) = setup().await;
    let token = store.open_session(1).await;
    let add = || send(&app, "POST", "/cart", Some(token), Some(json!({"productId": 5, "quantity": 1})));
    let ((a, _), (b, _)) = tokio::join!(add(), add());
    assert_eq!((a, b), (StatusCode::OK, StatusCode::OK));
    let (_, body) = send(&app, "GET", "/cart", Some(token), None).await;
    assert_eq!(body["cartItems"].as_array().unwrap().len(), 1);
    assert_eq!(body["totalQuantity"], 2);
}

#[tokio::test]
async fn test_add_validation() {
    let (app, store) = setup().await;
    let token = Some(store.open_session(1).await);
    let (status, body) = send(&app, "POST", "/cart", token, Some(json!({"productId": 5, "quantity": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "quantity");
    assert_eq!(send(&app, "POST", "/cart", token, Some(json!({"productId": 5, "quantity": -2}))).await.0, StatusCode::BAD_REQUEST);
    assert_eq!(send(&app, "POST", "/cart", token, Some(json!({"productId": 5}))).await.0, StatusCode::BAD_REQUEST);
    assert_eq!(send(&app, "POST", "/cart", token, Some(json!({"productId": 5, "quantity": "2"}))).await.0, StatusCode::BAD_REQUEST);
    assert_eq!(send(&app, "POST", "/cart", token, Some(json!({"productId": 5, "quantity": 1, "price": 1}))).await.0, StatusCode::BAD_REQUEST);
    assert_eq!(send_raw(&app, "POST", "/cart", token, Some("{not json".into())).await.0, StatusCode::BAD_REQUEST);
    assert_eq!(send(&app, "POST", "/cart", token, Some(json!({"productId": 404, "quantity": 1}))).await.0, StatusCode::NOT_FOUND);
    let (_, body) = send(&app, "GET", "/cart", token, None).await;
    assert_eq!(body["totalQuantity"], 0);
}

#[tokio::test]
async fn test_update_quantity() {
    let (app, store) = setup().await;
    let token = Some(store.open_session(1).await);
    let (_, body) = send(&app, "POST", "/cart", token, Some(json!({"productId": 5, "quantity": 2}))).await;
    let item_id = body["cartItems"][0]["id"].as_i64().unwrap();
    let uri = format!("/cart/{item_id}");

    let (status, _) = send(&app, "PATCH", &uri, token, Some(json!({"quantity": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(send(&app, "GET", "/cart", token, None).await.1["totalQuantity"], 2);

    let (status, body) = send(&app, "PATCH", &uri, token, Some(json!({"quantity": 7}))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    assert_eq!(send(&app, "PUT", &uri, token, Some(json!({"quantity": 3}))).await.0, StatusCode::OK);
    let (_, cart) = send(&app, "GET", "/cart", token, None).await;
    assert_eq!(cart["totalQuantity"], 3);
    assert_eq!(cart["totalPrice"], 270_000);

    let (status, body) = send(&app, "PATCH", "/cart/abc", token, Some(json!({"quantity": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["field"], "path");
    assert_eq!(send(&app, "PATCH", "/cart/999999", token, Some(json!({"quantity": 1}))).await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_users_items_are_hidden() {
    let (app, store) = setup().await;
    let owner = Some(store.open_session(1).await);
    let intruder = Some(store.open_session(2).await);
    let (_, body) = send(&app, "POST", "/cart", owner, Some(json!({"productId": 6, "quantity": 2}))).await;
    let uri = format!("/cart/{}", body["cartItems"][0]["id"]);

    let (patch_status, patch_body) = send(&app, "PATCH", &uri, intruder, Some(json!({"quantity": 9}))).await;
    let (missing_status, missing_body) = send(&app, "PATCH", "/cart/999999", intruder, Some(json!({"quantity": 9}))).await;
    assert_eq!(patch_status, StatusCode::NOT_FOUND);
    assert_eq!((patch_status, patch_body), (missing_status, missing_body));
    assert_eq!(send(&app, "DELETE", &uri, intruder, None).await.0, StatusCode::NOT_FOUND);

    let (_, cart) = send(&app, "GET", "/cart", owner, None).await;
    assert_eq!(cart["totalQuantity"], 2);
}

#[tokio::test]
async fn test_remove_item() {
    let (app, store) = setup().await;
    let token = Some(store.open_session(1).await);
    send(&app, "POST", "/cart", token, Some(json!({"productId": 5, "quantity": 1}))).await;
    let (_, body) = send(&app, "POST", "/cart", token, Some(json!({"productId": 6, "quantity": 1}))).await;
    let uri = format!("/cart/{}", body["cartItems"][1]["id"]);

    assert_eq!(send(&app, "DELETE", &uri, token, None).await.0, StatusCode::OK);
    assert_eq!(send(&app, "DELETE", &uri, token, None).await.0, StatusCode::NOT_FOUND);
    let (_, cart) = send(&app, "GET", "/cart", token, None).await;
    assert_eq!(cart["cartItems"].as_array().unwrap().len(), 1);
    assert_eq!(cart["totalPrice"], 90_000);
}

#[tokio::test]
async fn test_storage_failure_is_generic_500() {
    let (app, store) = setup().await;
    let token = Some(store.open_session(1).await);
    store.set_unavailable(true);
    let (status, body) = send(&app, "GET", "/products/5", token, None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "INTERNAL_ERROR");
    assert!(!body["message"].as_str().unwrap().contains("unavailable"));
}

fn address(street: &str, is_default: bool) -> Value {
    json!({
        "firstName": "Hoa", "lastName": "Pham", "phone": "0987654321", "street": street,
        "city": "Hue", "country": "VN", "zipCode": "530000", "isDefault": is_default
    })
}

#[tokio::test]
async fn test_address_default_selection() {
    let (app, store) = setup().await;
    let token = Some(store.open_session(1).await);
    let (status, a) = send(&app, "POST", "/address", token, Some(address("1 Hung Vuong", true))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, b) = send(&app, "POST", "/address", token, Some(address("2 Hung Vuong", true))).await;

    let (_, list) = send(&app, "GET", "/address", token, None).await;
    let defaults: Vec<&Value> = list.as_array().unwrap().iter().filter(|x| x["isDefault"] == true).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0]["id"], b["id"]);

    let uri = format!("/address/{}", a["id"]);
    let (status, updated) = send(&app, "PUT", &uri, token, Some(address("1 Hung Vuong", true))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["isDefault"], true);
    let (_, list) = send(&app, "GET", "/address", token, None).await;
    assert_eq!(list[0]["id"], a["id"]);
    assert_eq!(list[1]["isDefault"], false);
}

#[tokio::test]
async fn test_address_validation_and_ownership() {
    let (app, store) = setup().await;
    let owner = Some(store.open_session(1).await);
    let other = Some(store.open_session(2).await);
    let mut missing_city = address("3 Le Duan", false);
    missing_city["city"] = json!("");
    let (status, body) = send(&app, "POST", "/address", owner, Some(missing_city)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "city");

    let (_, created) = send(&app, "POST", "/address", owner, Some(address("3 Le Duan", false))).await;
    let uri = format!("/address/{}", created["id"]);
    assert_eq!(send(&app, "PUT", &uri, other, Some(address("x", true))).await.0, StatusCode::NOT_FOUND);
    assert_eq!(send(&app, "DELETE", &uri, other, None).await.0, StatusCode::NOT_FOUND);
    assert_eq!(send(&app, "DELETE", &uri, owner, None).await.0, StatusCode::OK);
    assert_eq!(send(&app, "GET", "/address", owner, None).await.1, json!([]));
    assert_eq!(send(&app, "POST", "/address", None, Some(address("x", false))).await.0, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_product_listing() {
    let (app, _) = setup().await;
    let (status, body) = send(&app, "GET", "/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["products"].as_array().unwrap().iter().map(|p| p["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![7, 6, 5]);
    assert_eq!(body["pagination"], json!({"currentPage": 1, "totalPages": 1, "totalCount": 3, "limit": 12}));

    let (_, body) = send(&app, "GET", "/products?color=black&sort=priceAsc", None, None).await;
    let ids: Vec<i64> = body["products"].as_array().unwrap().iter().map(|p| p["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![7, 5]);

    let (_, body) = send(&app, "GET", "/products?sort=priceDesc&limit=1&page=2", None, None).await;
    assert_eq!(body["products"][0]["id"], 7);
    assert_eq!(body["pagination"]["totalPages"], 3);

    let (_, body) = send(&app, "GET", "/products?minPrice=30000&maxPrice=60000", None, None).await;
    assert_eq!(body["pagination"]["totalCount"], 1);
}

#[tokio::test]
async fn test_product_listing_falls_back_to_defaults() {
    let (app, _) = setup().await;
    let (status, body) = send(&app, "GET", "/products?sort=foo&page=abc&limit=0", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["products"].as_array().unwrap().iter().map(|p| p["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![7, 6, 5]);
    assert_eq!(body["pagination"]["currentPage"], 1);
    assert_eq!(body["pagination"]["limit"], 12);

    let (status, body) = send(&app, "GET", "/products?minPrice=cheap", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["field"], "query");
}

#[tokio::test]
async fn test_product_detail() {
    let (app, _) = setup().await;
    let (status, body) = send(&app, "GET", "/products/5", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 100_000);
    assert_eq!(body["effectivePrice"], 90_000);
    assert_eq!(body["gallery"].as_array().unwrap().len(), 2);
    assert_eq!(send(&app, "GET", "/products/999", None, None).await.0, StatusCode::NOT_FOUND);
    let (status, body) = send(&app, "GET", "/products/shirt", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "path");
}

#[tokio::test]
async fn test_create_product_with_gallery() {
    let (app, store) = setup().await;
    let token = Some(store.open_session(1).await);
    let draft = json!({
        "title": "Silk scarf", "price": 50_000, "discount": 20, "colors": ["red"],
        "galleryUrls": ["/img/scarf-a.jpg", "/img/scarf-b.jpg"]
    });
    assert_eq!(send(&app, "POST", "/products", None, Some(draft.clone())).await.0, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "POST", "/products", token, Some(draft)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["effectivePrice"], 40_000);
    assert_eq!(body["mainImage"]["thumbnail"], "/img/scarf-a.jpg");
    assert_eq!(body["hoverImage"]["thumbnail"], "/img/scarf-b.jpg");

    let id = body["id"].as_i64().unwrap();
    let (status, body) = send(&app, "GET", &format!("/products/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Silk scarf");
    let (_, body) = send(&app, "POST", "/cart", token, Some(json!({"productId": id, "quantity": 2}))).await;
    assert_eq!(body["totalPrice"], 80_000);
}

#[tokio::test]
async fn test_create_product_validation() {
    let (app, store) = setup().await;
    let token = Some(store.open_session(1).await);
    for draft in [
        json!({"price": 1000}),
        json!({"title": " ", "price": 1000}),
        json!({"title": "Hat", "price": -1}),
        json!({"title": "Hat", "price": 1000, "discount": 101}),
        json!({"title": "Hat", "price": 1000, "galleryUrls": [""]}),
        json!({"title": "Hat", "price": 1000, "stock": 3}),
    ] {
        let (status, body) = send(&app, "POST", "/products", token, Some(draft.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{draft}");
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
    assert_eq!(send(&app, "GET", "/products", None, None).await.1["pagination"]["totalCount"], 3);
}

#[tokio::test]
async fn test_update_profile() {
    let (app, store) = setup().await;
    let token = Some(store.open_session(1).await);
    let other = Some(store.open_session(2).await);
    assert_eq!(send(&app, "PUT", "/profile", None, Some(json!({"phone": "0900000000"}))).await.0, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "PUT", "/profile", token, Some(json!({"phone": "0900000000", "company": "Hang Bac Tailors"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["phone"], "0900000000");

    let (_, body) = send(&app, "PUT", "/profile", token, Some(json!({"phone": "", "address": "12 Hang Bac"}))).await;
    assert_eq!(body["user"]["phone"], "0900000000");
    assert_eq!(body["user"]["address"], "12 Hang Bac");
    assert_eq!(body["user"]["company"], "Hang Bac Tailors");

    // Identity comes from the session, never from the body.
    let (status, _) = send(&app, "PUT", "/profile", other, Some(json!({"email": "user1@storefront.test", "phone": "1"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = send(&app, "PUT", "/profile", other, Some(json!({}))).await;
    assert_eq!(body["user"]["id"], 2);
    assert!(body["user"]["phone"].is_null());
}

#[tokio::test]
async fn test_product_removed_from_catalog_leaves_cart() {
    let (app, store) = setup().await;
    let token = Some(store.open_session(1).await);
    send(&app, "POST", "/cart", token, Some(json!({"productId": 6, "quantity": 1}))).await;
    store.remove_product(6).await;
    let (_, cart) = send(&app, "GET", "/cart", token, None).await;
    assert_eq!(cart["totalQuantity"], 0);
    assert_eq!(send(&app, "POST", "/cart", token, Some(json!({"productId": 6, "quantity": 1}))).await.0, StatusCode::NOT_FOUND);
}
