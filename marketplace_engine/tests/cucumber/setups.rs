use std::str::FromStr;

use cucumber::given;
use marketplace_engine::test_utils::seed::{seed_product, seed_user};
use mkp_common::Money;

use crate::cucumber::{marketplace_world::MarketplaceSystem, MarketplaceWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut MarketplaceWorld) {
    let system = MarketplaceSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a user named '{word}'")]
async fn a_user(world: &mut MarketplaceWorld, name: String) {
    let user = seed_user(&world.system().db, &name).await;
    world.users.insert(name, user);
}

#[given(expr = "'{word}' lists a '{word}' for {word}")]
async fn a_listing(world: &mut MarketplaceWorld, seller: String, title: String, price: String) {
    let price = Money::from_str(&price).expect("Not a valid price");
    let seller_id = world.user(&seller).id;
    let product = seed_product(&world.system().db, seller_id, &title, price.cents()).await;
    world.products.insert(title, product);
}
