use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use marketplace_engine::{
    db_types::{Cart, CartItem},
    mkp_api::cart_objects::{CartLine, ClearCartOutcome},
    traits::CartError,
    CartApi,
};
use mkp_common::Money;
use serde_json::json;

use super::{
    helpers::{sample_product, send, timestamp, user_bearer},
    mocks::MockCartManager,
};
use crate::routes::{AddToCartRoute, ClearCartRoute, MyCartRoute, RemoveCartItemRoute, UpdateCartItemRoute};

fn configure(cfg: &mut ServiceConfig, db: MockCartManager) {
    cfg.service(MyCartRoute::<MockCartManager>::new())
        .service(AddToCartRoute::<MockCartManager>::new())
        .service(UpdateCartItemRoute::<MockCartManager>::new())
        .service(RemoveCartItemRoute::<MockCartManager>::new())
        .service(ClearCartRoute::<MockCartManager>::new())
        .app_data(web::Data::new(CartApi::new(db)));
}

fn cart_item(id: i64, product_id: i64, quantity: i64) -> CartItem {
    CartItem { id, cart_id: 10, product_id, quantity, added_at: timestamp() }
}

#[actix_web::test]
async fn view_cart_computes_totals() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCartManager::new();
    db.expect_fetch_or_create_cart()
        .withf(|id| *id == 3)
        .returning(|user_id| Ok(Cart { id: 10, user_id, created_at: timestamp(), updated_at: timestamp() }));
    db.expect_fetch_cart_lines().withf(|id| *id == 10).returning(|_| {
        Ok(vec![
            CartLine::new(cart_item(1, 8, 2), sample_product(8, 2, "Radio", Money::from_cents(2550))).unwrap(),
            CartLine::new(cart_item(2, 9, 1), sample_product(9, 2, "Kettle", Money::from_units(10))).unwrap(),
        ])
    });
    let req = TestRequest::get().uri("/cart").insert_header(("Authorization", user_bearer(3)));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 10);
    assert_eq!(body["user"], 3);
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["total_price"], "61.00");
    assert_eq!(body["items"][0]["total_price"], "51.00");
    assert_eq!(body["items"][1]["product"]["title"], "Kettle");
}

#[actix_web::test]
async fn cart_requires_a_token() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/cart");
    let (status, _) = send(req, |cfg| configure(cfg, MockCartManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn add_to_cart() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCartManager::new();
    db.expect_add_item_to_cart()
        .withf(|user, product, qty| *user == 3 && *product == 8 && *qty == 1)
        .returning(|_, product_id, _| Ok(cart_item(1, product_id, 2)));
    let req = TestRequest::post()
        .uri("/cart")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(json!({"product_id": 8}));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Item added to cart successfully");
    assert_eq!(body["cart_item"]["product_id"], 8);
    assert_eq!(body["cart_item"]["quantity"], 2);
}

#[actix_web::test]
async fn add_unavailable_product() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCartManager::new();
    db.expect_add_item_to_cart().returning(|_, product_id, _| Err(CartError::ProductUnavailable(product_id)));
    let req = TestRequest::post()
        .uri("/cart")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(json!({"product_id": 99, "quantity": 1}));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found or already sold");
}

#[actix_web::test]
async fn quantities_must_be_positive() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/cart")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(json!({"product_id": 8, "quantity": 0}));
    let (status, body) = send(req, |cfg| configure(cfg, MockCartManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["quantity"].is_array());

    let req = TestRequest::patch()
        .uri("/cart/items/1")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(json!({"quantity": -2}));
    let (status, _) = send(req, |cfg| configure(cfg, MockCartManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let req = TestRequest::post()
        .uri("/cart")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(json!({"product_id": 8, "quantity": 2305843009213693952i64}));
    let (status, body) = send(req, |cfg| configure(cfg, MockCartManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["quantity"][0], "Ensure this value is less than or equal to 1000000.");
}

#[actix_web::test]
async fn update_cart_item() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCartManager::new();
    db.expect_update_cart_item()
        .withf(|user, item, qty| *user == 3 && *item == 1 && *qty == 4)
        .returning(|_, item, qty| Ok(Some(cart_item(item, 8, qty))));
    let req = TestRequest::patch()
        .uri("/cart/items/1")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(json!({"quantity": 4}));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "product_id": 8, "quantity": 4}));

    // Someone else's cart item looks the same as a missing one
    let mut db = MockCartManager::new();
    db.expect_update_cart_item().returning(|_, _, _| Ok(None));
    let req = TestRequest::patch()
        .uri("/cart/items/77")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(json!({"quantity": 4}));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Cart item not found");
}

#[actix_web::test]
async fn remove_cart_item() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCartManager::new();
    db.expect_remove_cart_item().withf(|user, item| *user == 3 && *item == 1).returning(|_, _| Ok(true));
    let req = TestRequest::delete().uri("/cart/items/1").insert_header(("Authorization", user_bearer(3)));
    let (status, _) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let mut db = MockCartManager::new();
    db.expect_remove_cart_item().returning(|_, _| Ok(false));
    let req = TestRequest::delete().uri("/cart/items/2").insert_header(("Authorization", user_bearer(3)));
    let (status, _) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn clear_cart() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCartManager::new();
    db.expect_clear_cart().withf(|user| *user == 3).returning(|_| Ok(ClearCartOutcome::Cleared(2)));
    let req = TestRequest::delete().uri("/cart/clear").insert_header(("Authorization", user_bearer(3)));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cart cleared successfully");

    let mut db = MockCartManager::new();
    db.expect_clear_cart().returning(|_| Ok(ClearCartOutcome::NoCart));
    let req = TestRequest::delete().uri("/cart/clear").insert_header(("Authorization", user_bearer(4)));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cart is already empty");
}
