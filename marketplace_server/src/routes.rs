//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two of glue belong in the engine, not here. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every engine call is async, so handlers only ever `await` the
//! database and never block the worker.
//!
//! Authentication: handlers that take a [`JwtClaims`] argument require a valid access token. Routes declared with
//! `where requires [...]` additionally require the listed roles.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use marketplace_engine::{
    db_types::{NewProductImage, Role},
    mkp_api::{
        account_objects::{Registration, UserProfileUpdate},
        cart_objects::ClearCartOutcome,
        product_objects::{ProductDraft, ProductUpdate},
        purchase_objects::CheckoutRequest,
    },
    traits::{AccountManagement, AuthManagement, CartManagement, CatalogManagement, PurchaseManagement},
    AccountApi,
    AuthApi,
    CartApi,
    CatalogApi,
    CheckoutApi,
};
use serde_json::json;

use crate::{
    auth::{JwtClaims, TokenIssuer, TokenKind},
    data_objects::{
        AddToCartRequest,
        AuthResponse,
        CartResponse,
        CategoryResponse,
        DashboardResponse,
        HistoryQuery,
        JsonResponse,
        LoginRequest,
        LogoutRequest,
        MyListingsQuery,
        NewCategoryRequest,
        ProductImageResponse,
        ProductQuery,
        ProductResponse,
        ProfileResponse,
        PurchaseResponse,
        RefreshRequest,
        RefreshResponse,
        RoleUpdateRequest,
        RoleUpdateResponse,
        SearchResponse,
        UpdateCartItemRequest,
    },
    errors::{AuthError, ServerError},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro.
// Several resources may share a path; the method guard picks the right one.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires [$($roles:expr),+])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/auth/register" impl AccountManagement, AuthManagement);
/// Creates a new account and logs the new user in.
///
/// The response carries the user, their roles and a fresh access/refresh token pair.
pub async fn register<B>(
    body: web::Json<Registration>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement + AuthManagement,
{
    let registration = body.into_inner();
    debug!("💻️ POST register for {}", registration.username);
    let account = api.register(registration).await?;
    let tokens = signer.issue_pair(account.user.id, &account.user.username, &account.roles)?;
    Ok(HttpResponse::Created().json(AuthResponse::new(account, tokens)))
}

route!(login => Post "/auth/login" impl AccountManagement, AuthManagement);
/// Exchanges an email address and password for a token pair. Wrong passwords and unknown email addresses get the
/// same response.
pub async fn login<B>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement + AuthManagement,
{
    let LoginRequest { email, password } = body.into_inner();
    trace!("💻️ POST login");
    let account = api.login(&email, password.reveal()).await?;
    let tokens = signer.issue_pair(account.user.id, &account.user.username, &account.roles)?;
    Ok(HttpResponse::Ok().json(AuthResponse::new(account, tokens)))
}

route!(refresh_token => Post "/auth/refresh" impl AccountManagement, AuthManagement);
/// Issues a new access token for a valid refresh token that has not been revoked. The roles in the new token are
/// read afresh from the store.
pub async fn refresh_token<B>(
    body: web::Json<RefreshRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement + AuthManagement,
{
    let verified = signer.validate(&body.refresh, TokenKind::Refresh)?;
    let claims = verified.claims;
    if api.is_token_revoked(&claims.jti).await? {
        info!("💻️ Revoked refresh token presented for user #{}", claims.sub);
        return Err(AuthError::RevokedToken.into());
    }
    let roles = api.roles_for_user(claims.sub).await?;
    let access = signer.issue(claims.sub, &claims.username, &roles, TokenKind::Access)?;
    Ok(HttpResponse::Ok().json(RefreshResponse { access }))
}

route!(logout => Post "/auth/logout" impl AccountManagement, AuthManagement);
/// Revokes the caller's refresh token.
pub async fn logout<B>(
    claims: JwtClaims,
    body: web::Json<LogoutRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement + AuthManagement,
{
    let verified = signer.validate(&body.refresh_token, TokenKind::Refresh).map_err(|e| {
        debug!("💻️ Logout with an invalid refresh token. {e}");
        ServerError::invalid_field("Invalid token", "refresh_token")
    })?;
    if verified.claims.sub != claims.sub {
        warn!("💻️ User #{} tried to revoke a refresh token belonging to user #{}", claims.sub, verified.claims.sub);
        return Err(ServerError::invalid_field("Invalid token", "refresh_token"));
    }
    api.revoke_token(&verified.claims.jti, claims.sub, verified.expires_at).await?;
    info!("💻️ User #{} logged out", claims.sub);
    Ok(HttpResponse::Ok().json(JsonResponse::new("Successfully logged out")))
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(my_profile => Get "/users/profile" impl AccountManagement);
pub async fn my_profile<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET profile for user #{}", claims.sub);
    let user = api.profile(claims.sub).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse { user, roles: claims.roles }))
}

route!(update_profile => Put "/users/profile" impl AccountManagement);
/// PUT and PATCH both apply a partial update: fields that are absent are left as they are.
pub async fn update_profile<B: AccountManagement>(
    claims: JwtClaims,
    body: web::Json<UserProfileUpdate>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ Updating profile for user #{}", claims.sub);
    let user = api.update_profile(claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ProfileResponse { user, roles: claims.roles }))
}

route!(patch_profile => Patch "/users/profile" impl AccountManagement);
pub async fn patch_profile<B: AccountManagement>(
    claims: JwtClaims,
    body: web::Json<UserProfileUpdate>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    update_profile(claims, body, api).await
}

route!(my_dashboard => Get "/users/dashboard" impl AccountManagement);
pub async fn my_dashboard<B: AccountManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET dashboard for user #{}", claims.sub);
    let dashboard = api.dashboard(claims.sub).await?;
    Ok(HttpResponse::Ok().json(DashboardResponse::from(dashboard)))
}

route!(update_roles => Post "/users/roles" impl AccountManagement, AuthManagement where requires [Role::Admin]);
/// Grants and revokes roles for one or more users. Admin only.
pub async fn update_roles<B>(
    claims: JwtClaims,
    body: web::Json<Vec<RoleUpdateRequest>>,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: AccountManagement + AuthManagement,
{
    let mut result = Vec::new();
    for request in body.into_inner() {
        info!(
            "💻️ Admin #{} updating roles for user #{}. Apply: {:?}. Revoke: {:?}",
            claims.sub, request.user_id, request.apply, request.revoke
        );
        let roles = api.update_roles(request.user_id, &request.apply, &request.revoke).await?;
        result.push(RoleUpdateResponse { user_id: request.user_id, roles });
    }
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Categories  ----------------------------------------------------
route!(categories => Get "/categories" impl CatalogManagement);
pub async fn categories<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET categories");
    let categories = api.categories().await?.into_iter().map(CategoryResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(categories))
}

route!(create_category => Post "/categories" impl CatalogManagement where requires [Role::Admin]);
pub async fn create_category<B: CatalogManagement>(
    body: web::Json<NewCategoryRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let NewCategoryRequest { name, description, icon } = body.into_inner();
    debug!("💻️ POST create category '{name}'");
    let category = api.create_category(&name, &description, &icon).await?;
    Ok(HttpResponse::Created().json(CategoryResponse::from(category)))
}

//----------------------------------------------   Products  ----------------------------------------------------
route!(products => Get "/products" impl CatalogManagement);
/// Lists unsold and sold products alike, filtered by the query string, sorted and paged.
pub async fn products<B: CatalogManagement>(
    query: web::Query<ProductQuery>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.filter()?;
    let pagination = query.paging.pagination()?;
    trace!("💻️ GET products. {filter}");
    let page = api.list_products(filter, pagination).await?;
    Ok(HttpResponse::Ok().json(page.map(ProductResponse::from)))
}

route!(create_product => Post "/products" impl CatalogManagement);
pub async fn create_product<B: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<ProductDraft>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST create product for user #{}", claims.sub);
    let product = api.create_product(claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

route!(my_listings => Get "/products/my-listings" impl CatalogManagement);
pub async fn my_listings<B: CatalogManagement>(
    claims: JwtClaims,
    query: web::Query<MyListingsQuery>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let status = query.status();
    let pagination = query.paging.pagination()?;
    debug!("💻️ GET listings for user #{} ({status:?})", claims.sub);
    let page = api.my_listings(claims.sub, status, pagination).await?;
    Ok(HttpResponse::Ok().json(page.map(ProductResponse::from)))
}

route!(product => Get "/products/{id}" impl CatalogManagement);
/// Product detail. Every call counts as a view.
pub async fn product<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ GET product #{id}");
    let product = api.view_product(id).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

route!(update_product => Put "/products/{id}" impl CatalogManagement);
/// PUT and PATCH both apply a partial update. Only the seller may update a product.
pub async fn update_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<ProductUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ Updating product #{id} for user #{}", claims.sub);
    let product = api.update_product(claims.sub, id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

route!(patch_product => Patch "/products/{id}" impl CatalogManagement);
pub async fn patch_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<ProductUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    update_product(claims, path, body, api).await
}

route!(delete_product => Delete "/products/{id}" impl CatalogManagement);
pub async fn delete_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    info!("💻️ User #{} is deleting product #{id}", claims.sub);
    api.delete_product(claims.sub, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

route!(product_images => Get "/products/{id}/images" impl CatalogManagement);
pub async fn product_images<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let images = api.product_images(id).await?.into_iter().map(ProductImageResponse::from).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(images))
}

route!(add_product_image => Post "/products/{id}/images" impl CatalogManagement);
pub async fn add_product_image<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<NewProductImage>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ User #{} adding an image to product #{id}", claims.sub);
    let image = api.add_product_image(claims.sub, id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ProductImageResponse::from(image)))
}

route!(search => Get "/search" impl CatalogManagement);
/// Free-text search over titles, descriptions and category names. The response echoes the query and filters.
pub async fn search<B: CatalogManagement>(
    query: web::Query<ProductQuery>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let mut filter = query.filter()?;
    filter.search = None;
    let pagination = query.paging.pagination()?;
    let q = query.q.as_deref().unwrap_or_default();
    trace!("💻️ GET search for '{q}'. {filter}");
    let results = api.search(q, filter, pagination).await?;
    let response = SearchResponse {
        page: results.page.map(ProductResponse::from),
        query: results.query,
        filters_applied: results.filters_applied,
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(my_cart => Get "/cart" impl CartManagement);
pub async fn my_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET cart for user #{}", claims.sub);
    let cart = api.view(claims.sub).await?;
    Ok(HttpResponse::Ok().json(CartResponse::from(cart)))
}

route!(add_to_cart => Post "/cart" impl CartManagement);
/// Adds a product to the caller's cart. Adding a product that is already in the cart increases its quantity.
pub async fn add_to_cart<B: CartManagement>(
    claims: JwtClaims,
    body: web::Json<AddToCartRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AddToCartRequest { product_id, quantity } = body.into_inner();
    debug!("💻️ User #{} adding {quantity} of product #{product_id} to their cart", claims.sub);
    let item = api.add_item(claims.sub, product_id, quantity).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": "Item added to cart successfully",
        "cart_item": {
            "id": item.id,
            "product_id": item.product_id,
            "quantity": item.quantity,
            "added_at": item.added_at,
        }
    })))
}

route!(update_cart_item => Patch "/cart/items/{id}" impl CartManagement);
pub async fn update_cart_item<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateCartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let item = api.update_item(claims.sub, id, body.quantity).await?;
    Ok(HttpResponse::Ok().json(json!({ "id": item.id, "product_id": item.product_id, "quantity": item.quantity })))
}

route!(remove_cart_item => Delete "/cart/items/{id}" impl CartManagement);
pub async fn remove_cart_item<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    api.remove_item(claims.sub, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

route!(clear_cart => Delete "/cart/clear" impl CartManagement);
pub async fn clear_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let message = match api.clear(claims.sub).await? {
        ClearCartOutcome::Cleared(_) => "Cart cleared successfully",
        ClearCartOutcome::NoCart => "Cart is already empty",
    };
    Ok(HttpResponse::Ok().json(JsonResponse::new(message)))
}

//----------------------------------------------   Purchases  ----------------------------------------------------
route!(checkout => Post "/purchases" impl PurchaseManagement);
/// Buys the listed products. The declared `total_amount` must match current prices to within a cent.
pub async fn checkout<B: PurchaseManagement>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST checkout for user #{}", claims.sub);
    let purchase = api.checkout(claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(PurchaseResponse::from(purchase)))
}

route!(purchase_history => Get "/purchases/history" impl PurchaseManagement);
pub async fn purchase_history<B: PurchaseManagement>(
    claims: JwtClaims,
    query: web::Query<HistoryQuery>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.filter(claims.sub)?;
    let pagination = query.paging.pagination()?;
    trace!("💻️ GET purchase history for user #{}", claims.sub);
    let page = api.history(claims.sub, filter, pagination).await?;
    Ok(HttpResponse::Ok().json(page.map(PurchaseResponse::from)))
}

route!(purchase => Get "/purchases/{id}" impl PurchaseManagement);
pub async fn purchase<B: PurchaseManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CheckoutApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let purchase = api.purchase(claims.sub, id).await?;
    Ok(HttpResponse::Ok().json(PurchaseResponse::from(purchase)))
}
