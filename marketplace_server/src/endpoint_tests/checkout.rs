use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::NaiveDate;
use marketplace_engine::{
    db_types::{Purchase, PurchaseItem, PurchaseStatus},
    mkp_api::purchase_objects::PurchaseLine,
    CheckoutApi,
};
use mkp_common::Money;
use serde_json::json;

use super::{
    helpers::{sample_product, send, timestamp, user_bearer},
    mocks::MockPurchaseManager,
};
use crate::routes::{CheckoutRoute, PurchaseHistoryRoute, PurchaseRoute};

fn configure(cfg: &mut ServiceConfig, db: MockPurchaseManager) {
    cfg.service(CheckoutRoute::<MockPurchaseManager>::new())
        .service(PurchaseHistoryRoute::<MockPurchaseManager>::new())
        .service(PurchaseRoute::<MockPurchaseManager>::new())
        .app_data(web::Data::new(CheckoutApi::new(db)));
}

fn purchase(id: i64, buyer_id: i64, total: Money) -> Purchase {
    Purchase {
        id,
        order_number: format!("ECO-{id:08X}"),
        buyer_id,
        shipping_address: "1 Long Street, Cape Town".into(),
        payment_method: "card".into(),
        total_amount: total,
        status: PurchaseStatus::Completed,
        created_at: timestamp(),
        completed_at: Some(timestamp()),
    }
}

fn purchase_line(purchase_id: i64, product_id: i64, price: Money) -> PurchaseLine {
    let item = PurchaseItem { id: product_id * 10, purchase_id, product_id, quantity: 1, price_at_purchase: price };
    let mut product = sample_product(product_id, 2, "Radio", price);
    product.is_sold = true;
    PurchaseLine::new(item, product).unwrap()
}

fn checkout_body(total: &str) -> serde_json::Value {
    json!({
        "shipping_address": "1 Long Street, Cape Town",
        "payment_method": "card",
        "total_amount": total,
        "items": [{"product_id": 8, "quantity": 1}, {"product_id": 9, "quantity": 1}]
    })
}

fn available_products(db: &mut MockPurchaseManager) {
    db.expect_fetch_available_products().withf(|ids| ids.to_vec() == vec![8, 9]).returning(|_| {
        Ok(vec![
            sample_product(8, 2, "Radio", Money::from_units(25)),
            sample_product(9, 2, "Kettle", Money::from_cents(1050)),
        ])
    });
}

#[actix_web::test]
async fn checkout_succeeds() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPurchaseManager::new();
    available_products(&mut db);
    db.expect_insert_purchase()
        .withf(|p| {
            p.buyer_id == 3 &&
                p.total_amount == Money::from_cents(3550) &&
                p.items.len() == 2 &&
                p.order_number.starts_with("ECO-")
        })
        .returning(|p| Ok(purchase(40, p.buyer_id, p.total_amount)));
    db.expect_fetch_purchase_lines().withf(|id| *id == 40).returning(|id| {
        Ok(vec![purchase_line(id, 8, Money::from_units(25)), purchase_line(id, 9, Money::from_cents(1050))])
    });
    let req = TestRequest::post()
        .uri("/purchases")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(checkout_body("35.50"));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 40);
    assert_eq!(body["buyer"], 3);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["total_amount"], "35.50");
    assert_eq!(body["items"][1]["price_at_purchase"], "10.50");
    assert_eq!(body["items"][0]["product"]["is_sold"], true);
}

#[actix_web::test]
async fn one_cent_difference_is_tolerated() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPurchaseManager::new();
    available_products(&mut db);
    db.expect_insert_purchase()
        .withf(|p| p.total_amount == Money::from_cents(3550))
        .returning(|p| Ok(purchase(41, p.buyer_id, p.total_amount)));
    db.expect_fetch_purchase_lines().returning(|_| Ok(vec![]));
    let req = TestRequest::post()
        .uri("/purchases")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(checkout_body("35.49"));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_amount"], "35.50");
}

#[actix_web::test]
async fn total_mismatch() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPurchaseManager::new();
    available_products(&mut db);
    let req = TestRequest::post()
        .uri("/purchases")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(checkout_body("30.00"));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Total amount mismatch");
    assert_eq!(body["fields"]["total_amount"], json!(["Expected 35.50, but got 30.00."]));
}

#[actix_web::test]
async fn sold_product_blocks_checkout() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPurchaseManager::new();
    db.expect_fetch_available_products()
        .returning(|_| Ok(vec![sample_product(8, 2, "Radio", Money::from_units(25))]));
    let req = TestRequest::post()
        .uri("/purchases")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(checkout_body("35.50"));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Product 9 not found or already sold");
    assert!(body["fields"]["items"].is_array());
}

#[actix_web::test]
async fn checkout_validation() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/purchases")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(json!({"items": []}));
    let (status, body) = send(req, |cfg| configure(cfg, MockPurchaseManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["shipping_address", "payment_method", "total_amount", "items"] {
        assert!(body["fields"][field].is_array(), "expected an error for {field}");
    }

    let mut body = checkout_body("0.00");
    body["items"] = json!([{"product_id": 8, "quantity": 2305843009213693952i64}]);
    let req = TestRequest::post().uri("/purchases").insert_header(("Authorization", user_bearer(3))).set_json(body);
    let (status, body) = send(req, |cfg| configure(cfg, MockPurchaseManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["items"].is_array());
}

#[actix_web::test]
async fn purchase_history() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPurchaseManager::new();
    db.expect_search_purchases()
        .withf(|filter, paging| {
            filter.buyer_id == Some(3) &&
                filter.status == Some(PurchaseStatus::Completed) &&
                filter.date_from == NaiveDate::from_ymd_opt(2024, 1, 1) &&
                filter.date_to.is_none() &&
                paging.page() == 1
        })
        .returning(|_, _| Ok((vec![purchase(40, 3, Money::from_units(25))], 1)));
    db.expect_fetch_purchase_lines().returning(|id| Ok(vec![purchase_line(id, 8, Money::from_units(25))]));
    let req = TestRequest::get()
        .uri("/purchases/history?status=completed&date_from=2024-01-01")
        .insert_header(("Authorization", user_bearer(3)));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["order_number"], "ECO-00000028");
    assert_eq!(body["results"][0]["items"][0]["total_price"], "25.00");
}

#[actix_web::test]
async fn purchase_history_bad_date() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get()
        .uri("/purchases/history?date_to=yesterday")
        .insert_header(("Authorization", user_bearer(3)));
    let (status, body) = send(req, |cfg| configure(cfg, MockPurchaseManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["date_to"].is_array());
}

#[actix_web::test]
async fn purchases_are_private() {
    let _ = env_logger::try_init().ok();
    let mut db = MockPurchaseManager::new();
    db.expect_fetch_purchase().returning(|id| Ok(Some(purchase(id, 3, Money::from_units(25)))));
    db.expect_fetch_purchase_lines().returning(|id| Ok(vec![purchase_line(id, 8, Money::from_units(25))]));
    let req = TestRequest::get().uri("/purchases/40").insert_header(("Authorization", user_bearer(3)));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 40);

    let mut db = MockPurchaseManager::new();
    db.expect_fetch_purchase().returning(|id| Ok(Some(purchase(id, 3, Money::from_units(25)))));
    let req = TestRequest::get().uri("/purchases/40").insert_header(("Authorization", user_bearer(4)));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Purchase not found");
}
