use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use marketplace_engine::{
    traits::{AccountManagement, AuthManagement, CartManagement, CatalogManagement, PurchaseManagement},
    AccountApi,
    AuthApi,
    CartApi,
    CatalogApi,
    CheckoutApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        AddProductImageRoute,
        AddToCartRoute,
        CategoriesRoute,
        CheckoutRoute,
        ClearCartRoute,
        CreateCategoryRoute,
        CreateProductRoute,
        DeleteProductRoute,
        LoginRoute,
        LogoutRoute,
        MyCartRoute,
        MyDashboardRoute,
        MyListingsRoute,
        MyProfileRoute,
        PatchProductRoute,
        PatchProfileRoute,
        ProductImagesRoute,
        ProductRoute,
        ProductsRoute,
        PurchaseHistoryRoute,
        PurchaseRoute,
        RefreshTokenRoute,
        RegisterRoute,
        RemoveCartItemRoute,
        SearchRoute,
        UpdateCartItemRoute,
        UpdateProductRoute,
        UpdateProfileRoute,
        UpdateRolesRoute,
    },
};

pub const API_PREFIX: &str = "/api/v1";

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    }
    prepare_accounts(&db, &config).await?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Housekeeping on the account tables before the server starts taking requests.
async fn prepare_accounts(db: &SqliteDatabase, config: &ServerConfig) -> Result<(), ServerError> {
    let api = AuthApi::new(db.clone());
    match api.purge_expired_tokens().await {
        Ok(n) => debug!("🔐️ Purged {n} expired entries from the token blacklist"),
        Err(e) => warn!("🔐️ Could not purge expired tokens from the blacklist. {e}"),
    }
    if !config.admin_emails.is_empty() {
        let promoted = api.promote_admins(&config.admin_emails).await?;
        info!("🔐️ {promoted} of {} configured admin account(s) hold the admin role", config.admin_emails.len());
    }
    Ok(())
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let issuer = TokenIssuer::new(&config.auth);
        App::new()
            .wrap(JwtMiddlewareFactory::new(issuer.clone()))
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mkp::access_log"))
            .app_data(json_config())
            .app_data(query_config())
            .app_data(web::Data::new(AuthApi::new(db.clone())))
            .app_data(web::Data::new(AccountApi::new(db.clone())))
            .app_data(web::Data::new(CatalogApi::new(db.clone())))
            .app_data(web::Data::new(CartApi::new(db.clone())))
            .app_data(web::Data::new(CheckoutApi::new(db.clone())))
            .app_data(web::Data::new(issuer))
            .service(health)
            .service(web::scope(API_PREFIX).configure(configure_api::<SqliteDatabase>))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers every API route for backend `B`.
///
/// Order matters where a literal segment shares a prefix with a path parameter: `/products/my-listings` must be
/// registered before `/products/{id}`, and `/purchases/history` before `/purchases/{id}`.
pub fn configure_api<B>(cfg: &mut web::ServiceConfig)
where B: AccountManagement + AuthManagement + CatalogManagement + CartManagement + PurchaseManagement + 'static {
    cfg.service(RegisterRoute::<B>::new())
        .service(LoginRoute::<B>::new())
        .service(RefreshTokenRoute::<B>::new())
        .service(LogoutRoute::<B>::new())
        .service(MyProfileRoute::<B>::new())
        .service(UpdateProfileRoute::<B>::new())
        .service(PatchProfileRoute::<B>::new())
        .service(MyDashboardRoute::<B>::new())
        .service(UpdateRolesRoute::<B>::new())
        .service(CategoriesRoute::<B>::new())
        .service(CreateCategoryRoute::<B>::new())
        .service(ProductsRoute::<B>::new())
        .service(CreateProductRoute::<B>::new())
        .service(MyListingsRoute::<B>::new())
        .service(ProductRoute::<B>::new())
        .service(UpdateProductRoute::<B>::new())
        .service(PatchProductRoute::<B>::new())
        .service(DeleteProductRoute::<B>::new())
        .service(ProductImagesRoute::<B>::new())
        .service(AddProductImageRoute::<B>::new())
        .service(SearchRoute::<B>::new())
        .service(MyCartRoute::<B>::new())
        .service(AddToCartRoute::<B>::new())
        .service(UpdateCartItemRoute::<B>::new())
        .service(RemoveCartItemRoute::<B>::new())
        .service(ClearCartRoute::<B>::new())
        .service(CheckoutRoute::<B>::new())
        .service(PurchaseHistoryRoute::<B>::new())
        .service(PurchaseRoute::<B>::new());
}

/// Malformed JSON bodies are reported as 400s with the parser's message.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not parse request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not parse query string. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}
