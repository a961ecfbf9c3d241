use std::str::FromStr;

use cucumber::{then, when};
use marketplace_engine::mkp_api::{
    pagination::Pagination,
    product_objects::ProductUpdate,
    purchase_objects::{CheckoutRequest, LineItem, PurchaseQueryFilter},
};
use mkp_common::Money;

use crate::cucumber::MarketplaceWorld;

fn money(s: &str) -> Money {
    Money::from_str(s).expect("Not a valid amount")
}

#[when(expr = "'{word}' adds {int} '{word}' to the cart")]
async fn add_to_cart(world: &mut MarketplaceWorld, name: String, quantity: i64, title: String) {
    let user_id = world.user(&name).id;
    let product_id = world.product(&title).id;
    world.system().cart.add_item(user_id, product_id, quantity).await.expect("Error adding item to cart");
}

#[when(expr = "'{word}' tries to add {int} '{word}' to the cart")]
async fn try_add_to_cart(world: &mut MarketplaceWorld, name: String, quantity: i64, title: String) {
    let user_id = world.user(&name).id;
    let product_id = world.product(&title).id;
    let result = world.system().cart.add_item(user_id, product_id, quantity).await;
    world.last_error = result.err().map(|e| e.to_string());
}

#[when(expr = "'{word}' clears the cart")]
async fn clear_cart(world: &mut MarketplaceWorld, name: String) {
    let user_id = world.user(&name).id;
    world.system().cart.clear(user_id).await.expect("Error clearing cart");
}

#[when(expr = "'{word}' marks '{word}' as sold")]
async fn mark_sold(world: &mut MarketplaceWorld, seller: String, title: String) {
    let seller_id = world.user(&seller).id;
    let product_id = world.product(&title).id;
    let update = ProductUpdate { is_sold: Some(true), ..Default::default() };
    world.system().catalog.update_product(seller_id, product_id, update).await.expect("Error updating product");
}

#[when(expr = "'{word}' reprices '{word}' to {word}")]
async fn reprice(world: &mut MarketplaceWorld, seller: String, title: String, price: String) {
    let seller_id = world.user(&seller).id;
    let product_id = world.product(&title).id;
    let update = ProductUpdate { price: Some(money(&price)), ..Default::default() };
    world.system().catalog.update_product(seller_id, product_id, update).await.expect("Error updating product");
}

#[when(expr = "'{word}' checks out the cart declaring {word}")]
async fn checkout_cart(world: &mut MarketplaceWorld, name: String, total: String) {
    let user_id = world.user(&name).id;
    let cart = world.system().cart.view(user_id).await.expect("Error fetching cart");
    let items = cart.items.iter().map(|l| LineItem { product_id: l.product.id, quantity: l.quantity }).collect();
    let request = checkout_request(items, &total, Some(cart.id));
    checkout(world, user_id, request).await;
}

#[when(expr = "'{word}' buys '{word}' declaring {word}")]
async fn buy_product(world: &mut MarketplaceWorld, name: String, title: String, total: String) {
    let user_id = world.user(&name).id;
    let items = vec![LineItem { product_id: world.product(&title).id, quantity: 1 }];
    let request = checkout_request(items, &total, None);
    checkout(world, user_id, request).await;
}

fn checkout_request(items: Vec<LineItem>, total: &str, cart_id: Option<i64>) -> CheckoutRequest {
    CheckoutRequest {
        shipping_address: "1 Beach Road, Muizenberg".to_string(),
        payment_method: "card".to_string(),
        total_amount: Some(money(total)),
        items,
        cart_id,
    }
}

async fn checkout(world: &mut MarketplaceWorld, user_id: i64, request: CheckoutRequest) {
    let result = world.system().checkout.checkout(user_id, request).await;
    match result {
        Ok(purchase) => {
            world.last_purchase = Some(purchase);
            world.last_error = None;
        },
        Err(e) => {
            world.last_purchase = None;
            world.last_error = Some(e.to_string());
        },
    }
}

#[then(expr = "the cart of '{word}' holds {int} items worth {word}")]
async fn cart_contents(world: &mut MarketplaceWorld, name: String, count: i64, total: String) {
    let user_id = world.user(&name).id;
    let cart = world.system().cart.view(user_id).await.expect("Error fetching cart");
    assert_eq!(cart.total_items, count, "Wrong number of items in cart");
    assert_eq!(cart.total_price, money(&total), "Wrong cart total");
}

#[then(expr = "the last operation failed with {string}")]
async fn last_error(world: &mut MarketplaceWorld, message: String) {
    assert_eq!(world.last_error.as_deref(), Some(message.as_str()));
}

#[then("the checkout succeeds")]
async fn checkout_succeeded(world: &mut MarketplaceWorld) {
    assert!(world.last_purchase.is_some(), "Checkout failed: {:?}", world.last_error);
}

#[then(expr = "the purchase total is {word}")]
async fn purchase_total(world: &mut MarketplaceWorld, total: String) {
    let purchase = world.last_purchase.as_ref().expect("No purchase was made");
    assert_eq!(purchase.total_amount, money(&total));
}

#[then(expr = "'{word}' is sold")]
async fn is_sold(world: &mut MarketplaceWorld, title: String) {
    let product = world.system().catalog.product(world.product(&title).id).await.expect("Error fetching product");
    assert!(product.is_sold, "{title} should be sold");
}

#[then(expr = "'{word}' is still available")]
async fn is_available(world: &mut MarketplaceWorld, title: String) {
    let product = world.system().catalog.product(world.product(&title).id).await.expect("Error fetching product");
    assert!(!product.is_sold, "{title} should not be sold");
}

#[then(expr = "'{word}' has made {int} purchases")]
async fn purchase_count(world: &mut MarketplaceWorld, name: String, count: i64) {
    let user_id = world.user(&name).id;
    let history = world
        .system()
        .checkout
        .history(user_id, PurchaseQueryFilter::default(), Pagination::default())
        .await
        .expect("Error fetching purchase history");
    assert_eq!(history.count, count);
}
