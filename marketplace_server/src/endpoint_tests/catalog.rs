use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use marketplace_engine::{
    db_types::{Category, ProductCondition, ProductImage},
    mkp_api::product_objects::SortOrder,
    CatalogApi,
};
use mkp_common::Money;
use serde_json::json;

use super::{
    helpers::{admin_bearer, sample_product, send, timestamp, user_bearer},
    mocks::MockCatalogManager,
};
use crate::routes::{
    AddProductImageRoute,
    CategoriesRoute,
    CreateCategoryRoute,
    CreateProductRoute,
    DeleteProductRoute,
    MyListingsRoute,
    PatchProductRoute,
    ProductImagesRoute,
    ProductRoute,
    ProductsRoute,
    SearchRoute,
    UpdateProductRoute,
};

fn configure(cfg: &mut ServiceConfig, db: MockCatalogManager) {
    cfg.service(CategoriesRoute::<MockCatalogManager>::new())
        .service(CreateCategoryRoute::<MockCatalogManager>::new())
        .service(ProductsRoute::<MockCatalogManager>::new())
        .service(CreateProductRoute::<MockCatalogManager>::new())
        .service(MyListingsRoute::<MockCatalogManager>::new())
        .service(ProductRoute::<MockCatalogManager>::new())
        .service(UpdateProductRoute::<MockCatalogManager>::new())
        .service(PatchProductRoute::<MockCatalogManager>::new())
        .service(DeleteProductRoute::<MockCatalogManager>::new())
        .service(ProductImagesRoute::<MockCatalogManager>::new())
        .service(AddProductImageRoute::<MockCatalogManager>::new())
        .service(SearchRoute::<MockCatalogManager>::new())
        .app_data(web::Data::new(CatalogApi::new(db)));
}

fn electronics() -> Category {
    Category {
        id: 1,
        name: "Electronics".into(),
        slug: "electronics".into(),
        description: String::new(),
        icon: String::new(),
        product_count: 2,
        created_at: timestamp(),
    }
}

#[actix_web::test]
async fn list_categories() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCatalogManager::new();
    db.expect_fetch_categories().returning(|| Ok(vec![electronics()]));
    let req = TestRequest::get().uri("/categories");
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["slug"], "electronics");
    assert_eq!(body[0]["product_count"], 2);
}

#[actix_web::test]
async fn only_admins_create_categories() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/categories")
        .insert_header(("Authorization", user_bearer(2)))
        .set_json(json!({"name": "Home & Garden"}));
    let (status, _) = send(req, |cfg| configure(cfg, MockCatalogManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut db = MockCatalogManager::new();
    db.expect_insert_category().withf(|c| c.name == "Home & Garden" && c.slug == "home-garden").returning(|c| {
        Ok(Category { id: 2, name: c.name, slug: c.slug, product_count: 0, ..electronics() })
    });
    let req = TestRequest::post()
        .uri("/categories")
        .insert_header(("Authorization", admin_bearer(1)))
        .set_json(json!({"name": "Home & Garden"}));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 2);
    assert_eq!(body["slug"], "home-garden");
}

#[actix_web::test]
async fn list_products_with_filters() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCatalogManager::new();
    db.expect_search_products()
        .withf(|filter, paging| {
            filter.category.as_deref() == Some("electronics") &&
                filter.min_price == Some(Money::from_units(10)) &&
                filter.condition == Some(ProductCondition::Good) &&
                filter.sort == SortOrder::PriceAsc &&
                paging.page() == 2 &&
                paging.page_size() == 1
        })
        .returning(|_, _| Ok((vec![sample_product(8, 2, "Radio", Money::from_units(25))], 3)));
    let req = TestRequest::get()
        .uri("/products?category=electronics&min_price=10&condition=good&sort=price_asc&page=2&page_size=1");
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["next"], 3);
    assert_eq!(body["previous"], 1);
    let product = &body["results"][0];
    assert_eq!(product["title"], "Radio");
    assert_eq!(product["price"], "25.00");
    assert_eq!(product["category"], 1);
    assert_eq!(product["seller"], json!({"id": 2, "username": "user2"}));
}

#[actix_web::test]
async fn list_products_bad_filters() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/products?min_price=cheap&condition=mint");
    let (status, body) = send(req, |cfg| configure(cfg, MockCatalogManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["min_price"].is_array());
    assert!(body["fields"]["condition"].is_array());
}

#[actix_web::test]
async fn page_out_of_range() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCatalogManager::new();
    db.expect_search_products().returning(|_, _| Ok((vec![], 3)));
    let req = TestRequest::get().uri("/products?page=5");
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Invalid page.");

    let req = TestRequest::get().uri("/products?page=zero");
    let (status, _) = send(req, |cfg| configure(cfg, MockCatalogManager::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn product_detail_counts_a_view() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCatalogManager::new();
    db.expect_fetch_product_for_view().withf(|id| *id == 8).times(1).returning(|_| {
        let mut product = sample_product(8, 2, "Radio", Money::from_units(25));
        product.view_count = 1;
        Ok(Some(product))
    });
    let req = TestRequest::get().uri("/products/8");
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["view_count"], 1);

    let mut db = MockCatalogManager::new();
    db.expect_fetch_product_for_view().returning(|_| Ok(None));
    let req = TestRequest::get().uri("/products/99");
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product not found");
}

#[actix_web::test]
async fn create_product() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCatalogManager::new();
    db.expect_fetch_category().withf(|id| *id == 1).returning(|_| Ok(Some(electronics())));
    db.expect_insert_product()
        .withf(|p| p.seller_id == 4 && p.title == "Lamp" && p.price == Money::from_cents(1999) && p.quantity == 1)
        .returning(|p| Ok(sample_product(12, p.seller_id, &p.title, p.price)));
    let req = TestRequest::post().uri("/products").insert_header(("Authorization", user_bearer(4))).set_json(json!({
        "title": "Lamp",
        "description": "Reading lamp",
        "category": 1,
        "price": "19.99",
        "location": "Cape Town"
    }));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 12);
    assert_eq!(body["seller"]["id"], 4);
    assert_eq!(body["price"], "19.99");
}

#[actix_web::test]
async fn create_product_needs_auth_and_valid_fields() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/products").set_json(json!({"title": "Lamp"}));
    let (status, _) = send(req, |cfg| configure(cfg, MockCatalogManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::post()
        .uri("/products")
        .insert_header(("Authorization", user_bearer(4)))
        .set_json(json!({"title": "", "price": "-1"}));
    let (status, body) = send(req, |cfg| configure(cfg, MockCatalogManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["title", "description", "category", "price"] {
        assert!(body["fields"][field].is_array(), "expected an error for {field}");
    }
}

#[actix_web::test]
async fn only_the_seller_may_change_a_product() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCatalogManager::new();
    db.expect_fetch_product().returning(|id| Ok(Some(sample_product(id, 2, "Radio", Money::from_units(25)))));
    let req = TestRequest::patch()
        .uri("/products/8")
        .insert_header(("Authorization", user_bearer(3)))
        .set_json(json!({"price": "5"}));
    let (status, _) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut db = MockCatalogManager::new();
    db.expect_fetch_product().returning(|id| Ok(Some(sample_product(id, 2, "Radio", Money::from_units(25)))));
    db.expect_update_product()
        .withf(|id, update| *id == 8 && update.price == Some(Money::from_units(5)) && update.title.is_none())
        .returning(|id, _| Ok(Some(sample_product(id, 2, "Radio", Money::from_units(5)))));
    let req = TestRequest::put()
        .uri("/products/8")
        .insert_header(("Authorization", user_bearer(2)))
        .set_json(json!({"price": "5"}));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], "5.00");
}

#[actix_web::test]
async fn delete_product() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCatalogManager::new();
    db.expect_fetch_product().returning(|id| Ok(Some(sample_product(id, 2, "Radio", Money::from_units(25)))));
    db.expect_delete_product().withf(|id| *id == 8).times(1).returning(|_| Ok(true));
    let req = TestRequest::delete().uri("/products/8").insert_header(("Authorization", user_bearer(2)));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let mut db = MockCatalogManager::new();
    db.expect_fetch_product().returning(|id| Ok(Some(sample_product(id, 2, "Radio", Money::from_units(25)))));
    let req = TestRequest::delete().uri("/products/8").insert_header(("Authorization", user_bearer(5)));
    let (status, _) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn my_listings_are_not_mistaken_for_a_product_id() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCatalogManager::new();
    db.expect_search_products()
        .withf(|filter, _| filter.seller_id == Some(2) && filter.is_sold == Some(true))
        .returning(|_, _| {
            let mut product = sample_product(8, 2, "Radio", Money::from_units(25));
            product.is_sold = true;
            Ok((vec![product], 1))
        });
    let req = TestRequest::get().uri("/products/my-listings?status=sold").insert_header(("Authorization", user_bearer(2)));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["is_sold"], true);
}

#[actix_web::test]
async fn product_images() {
    let _ = env_logger::try_init().ok();
    let image = |id: i64, is_main: bool| ProductImage {
        id,
        product_id: 8,
        image_url: format!("https://img.example.com/{id}.jpg"),
        is_main,
        sort_order: id,
        alt_text: String::new(),
        created_at: timestamp(),
    };
    let mut db = MockCatalogManager::new();
    db.expect_fetch_product().returning(|id| Ok(Some(sample_product(id, 2, "Radio", Money::from_units(25)))));
    db.expect_fetch_product_images().withf(|id| *id == 8).returning(move |_| Ok(vec![image(1, true), image(2, false)]));
    let req = TestRequest::get().uri("/products/8/images");
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(body[0]["is_main"], true);

    let mut db = MockCatalogManager::new();
    db.expect_fetch_product().returning(|id| Ok(Some(sample_product(id, 2, "Radio", Money::from_units(25)))));
    db.expect_insert_product_image()
        .withf(|id, img| *id == 8 && img.is_main && img.image_url == "https://img.example.com/3.jpg")
        .returning(move |_, _| Ok(image(3, true)));
    let req = TestRequest::post()
        .uri("/products/8/images")
        .insert_header(("Authorization", user_bearer(2)))
        .set_json(json!({"image_url": "https://img.example.com/3.jpg", "is_main": true}));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 3);
}

#[actix_web::test]
async fn search_echoes_query_and_filters() {
    let _ = env_logger::try_init().ok();
    let mut db = MockCatalogManager::new();
    db.expect_search_products()
        .withf(|filter, _| {
            filter.search.as_deref() == Some("radio") &&
                filter.search_category_names &&
                filter.max_price == Some(Money::from_units(100))
        })
        .returning(|_, _| Ok((vec![sample_product(8, 2, "Radio", Money::from_units(25))], 1)));
    let req = TestRequest::get().uri("/search?q=radio&max_price=100&search=ignored");
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "radio");
    assert_eq!(body["count"], 1);
    assert_eq!(
        body["filters_applied"],
        json!({"category": null, "price_range": {"min": null, "max": "100.00"}, "condition": null})
    );
}
