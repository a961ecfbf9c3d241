use std::collections::HashMap;

use cucumber::World;
use log::*;
use marketplace_engine::{
    db_types::{Product, User},
    mkp_api::purchase_objects::PurchaseDetail,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    CartApi,
    CatalogApi,
    CheckoutApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct MarketplaceWorld {
    pub system: Option<MarketplaceSystem>,
    pub users: HashMap<String, User>,
    pub products: HashMap<String, Product>,
    pub last_purchase: Option<PurchaseDetail>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct MarketplaceSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub catalog: CatalogApi<SqliteDatabase>,
    pub cart: CartApi<SqliteDatabase>,
    pub checkout: CheckoutApi<SqliteDatabase>,
}

impl MarketplaceWorld {
    pub fn system(&self) -> &MarketplaceSystem {
        self.system.as_ref().expect("Marketplace not initialised")
    }

    pub fn user(&self, name: &str) -> &User {
        self.users.get(name).unwrap_or_else(|| panic!("No user called {name}"))
    }

    pub fn product(&self, title: &str) -> &Product {
        self.products.get(title).unwrap_or_else(|| panic!("No product called {title}"))
    }
}

impl MarketplaceSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        Self {
            db_path: url,
            catalog: CatalogApi::new(db.clone()),
            cart: CartApi::new(db.clone()),
            checkout: CheckoutApi::new(db.clone()),
            db,
        }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
