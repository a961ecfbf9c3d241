use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use marketplace_engine::{
    db_types::{Role, UserCredentials},
    helpers::hash_password,
    traits::AccountApiError,
    AuthApi,
};
use serde_json::json;

use super::{
    helpers::{admin_bearer, sample_user, send, test_issuer, user_bearer},
    mocks::MockAuthManager,
};
use crate::{
    auth::TokenKind,
    routes::{LoginRoute, LogoutRoute, RefreshTokenRoute, RegisterRoute, UpdateRolesRoute},
};

fn configure(cfg: &mut ServiceConfig, db: MockAuthManager) {
    cfg.service(RegisterRoute::<MockAuthManager>::new())
        .service(LoginRoute::<MockAuthManager>::new())
        .service(RefreshTokenRoute::<MockAuthManager>::new())
        .service(LogoutRoute::<MockAuthManager>::new())
        .service(UpdateRolesRoute::<MockAuthManager>::new())
        .app_data(web::Data::new(AuthApi::new(db)));
}

#[actix_web::test]
async fn register_returns_user_and_tokens() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_create_user()
        .withf(|user, roles| user.email == "alice@example.com" && roles == [Role::User])
        .returning(|user, _| {
            let mut u = sample_user(7, &user.username);
            u.email = user.email;
            Ok(u)
        });
    let body = json!({
        "email": "Alice@Example.com",
        "username": "alice",
        "password": "wonderland1",
        "password_confirm": "wonderland1"
    });
    let req = TestRequest::post().uri("/auth/register").set_json(body);
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 7);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["roles"], json!(["user"]));
    let access = body["access_token"].as_str().unwrap();
    let claims = test_issuer().validate(access, TokenKind::Access).unwrap().claims;
    assert_eq!(claims.sub, 7);
    assert_eq!(claims.username, "alice");
    assert!(test_issuer().validate(body["refresh_token"].as_str().unwrap(), TokenKind::Refresh).is_ok());
}

#[actix_web::test]
async fn register_rejects_bad_input() {
    let _ = env_logger::try_init().ok();
    let db = MockAuthManager::new();
    let body = json!({
        "email": "not-an-email",
        "username": "al",
        "password": "12345678",
        "password_confirm": "12345679"
    });
    let req = TestRequest::post().uri("/auth/register").set_json(body);
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["email", "username", "password", "password_confirm"] {
        assert!(body["fields"][field].is_array(), "{field} should have errors: {body}");
    }
}

#[actix_web::test]
async fn register_reports_taken_email() {
    let _ = env_logger::try_init().ok();
    let mut db = MockAuthManager::new();
    db.expect_create_user().returning(|_, _| {
        let errors = marketplace_engine::helpers::ValidationErrors::single("email", "A user with that email already exists.");
        Err(AccountApiError::ValidationError(errors))
    });
    let body = json!({
        "email": "alice@example.com",
        "username": "alice",
        "password": "wonderland1",
        "password_confirm": "wonderland1"
    });
    let req = TestRequest::post().uri("/auth/register").set_json(body);
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"]["email"][0], "A user with that email already exists.");
}

#[actix_web::test]
async fn login_checks_the_password() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("wonderland1").unwrap();
    let mut db = MockAuthManager::new();
    db.expect_fetch_credentials()
        .withf(|email| email == "alice@example.com")
        .returning(move |_| Ok(Some(UserCredentials { id: 7, password_hash: hash.clone() })));
    db.expect_fetch_user().withf(|id| *id == 7).returning(|_| Ok(Some(sample_user(7, "alice"))));
    db.expect_fetch_roles_for_user().withf(|id| *id == 7).returning(|_| Ok(vec![Role::User, Role::Admin]));

    let req = TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"email": "ALICE@example.com", "password": "wonderland1"}));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["roles"], json!(["user", "admin"]));
    let access = body["access_token"].as_str().unwrap();
    let claims = test_issuer().validate(access, TokenKind::Access).unwrap().claims;
    assert_eq!(claims.roles, vec![Role::User, Role::Admin]);
}

#[actix_web::test]
async fn login_failures_look_the_same() {
    let _ = env_logger::try_init().ok();
    let hash = hash_password("wonderland1").unwrap();
    let mut db = MockAuthManager::new();
    db.expect_fetch_credentials()
        .withf(|email| email == "alice@example.com")
        .returning(move |_| Ok(Some(UserCredentials { id: 7, password_hash: hash.clone() })));
    let db2 = {
        let mut db = MockAuthManager::new();
        db.expect_fetch_credentials().returning(|_| Ok(None));
        db
    };

    let req = TestRequest::post().uri("/auth/login").set_json(json!({"email": "alice@example.com", "password": "nope"}));
    let (wrong_password, body1) = send(req, |cfg| configure(cfg, db)).await;
    let req = TestRequest::post().uri("/auth/login").set_json(json!({"email": "bob@example.com", "password": "nope"}));
    let (unknown_email, body2) = send(req, |cfg| configure(cfg, db2)).await;
    assert_eq!(wrong_password, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email, StatusCode::UNAUTHORIZED);
    assert_eq!(body1, body2);
    assert_eq!(body1["error"], "Invalid credentials");
}

#[actix_web::test]
async fn refresh_issues_a_new_access_token() {
    let _ = env_logger::try_init().ok();
    let pair = test_issuer().issue_pair(7, "alice", &[Role::User]).unwrap();
    let mut db = MockAuthManager::new();
    db.expect_is_token_revoked().returning(|_| Ok(false));
    db.expect_fetch_roles_for_user().withf(|id| *id == 7).returning(|_| Ok(vec![Role::User]));
    let req = TestRequest::post().uri("/auth/refresh").set_json(json!({"refresh": pair.refresh_token}));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().unwrap();
    assert_eq!(test_issuer().validate(access, TokenKind::Access).unwrap().claims.sub, 7);
}

#[actix_web::test]
async fn refresh_rejects_revoked_and_access_tokens() {
    let _ = env_logger::try_init().ok();
    let pair = test_issuer().issue_pair(7, "alice", &[Role::User]).unwrap();
    let mut db = MockAuthManager::new();
    db.expect_is_token_revoked().returning(|_| Ok(true));
    let req = TestRequest::post().uri("/auth/refresh").set_json(json!({"refresh_token": pair.refresh_token}));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token is blacklisted");

    let db = MockAuthManager::new();
    let req = TestRequest::post().uri("/auth/refresh").set_json(json!({"refresh": pair.access_token}));
    let (status, _) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn logout_revokes_the_callers_refresh_token() {
    let _ = env_logger::try_init().ok();
    let pair = test_issuer().issue_pair(7, "alice", &[Role::User]).unwrap();
    let jti = test_issuer().validate(&pair.refresh_token, TokenKind::Refresh).unwrap().claims.jti;
    let mut db = MockAuthManager::new();
    db.expect_revoke_token().withf(move |id, user, _| id == jti && *user == 7).times(1).returning(|_, _, _| Ok(()));
    let req = TestRequest::post()
        .uri("/auth/logout")
        .insert_header(("Authorization", user_bearer(7)))
        .set_json(json!({"refresh_token": pair.refresh_token}));
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully logged out");
}

#[actix_web::test]
async fn logout_needs_a_token_of_your_own() {
    let _ = env_logger::try_init().ok();
    let pair = test_issuer().issue_pair(8, "mallory", &[Role::User]).unwrap();
    let req = TestRequest::post()
        .uri("/auth/logout")
        .insert_header(("Authorization", user_bearer(7)))
        .set_json(json!({"refresh_token": pair.refresh_token}));
    let (status, _) = send(req, |cfg| configure(cfg, MockAuthManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/auth/logout").set_json(json!({"refresh_token": pair.refresh_token}));
    let (status, body) = send(req, |cfg| configure(cfg, MockAuthManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication credentials were not provided.");
}

#[actix_web::test]
async fn invalid_bearer_tokens_are_rejected() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/auth/logout")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .set_json(json!({"refresh_token": "x"}));
    let (status, _) = send(req, |cfg| configure(cfg, MockAuthManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = TestRequest::post()
        .uri("/auth/logout")
        .insert_header(("Authorization", "Token abc"))
        .set_json(json!({"refresh_token": "x"}));
    let (status, _) = send(req, |cfg| configure(cfg, MockAuthManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn only_admins_update_roles() {
    let _ = env_logger::try_init().ok();
    let body = json!([{"user_id": 9, "apply": ["admin"]}]);
    let req = TestRequest::post().uri("/users/roles").insert_header(("Authorization", user_bearer(7))).set_json(&body);
    let (status, _) = send(req, |cfg| configure(cfg, MockAuthManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = TestRequest::post().uri("/users/roles").set_json(&body);
    let (status, _) = send(req, |cfg| configure(cfg, MockAuthManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let mut db = MockAuthManager::new();
    db.expect_fetch_user().withf(|id| *id == 9).returning(|_| Ok(Some(sample_user(9, "carol"))));
    db.expect_assign_roles().withf(|id, roles| *id == 9 && roles == [Role::Admin]).returning(|_, _| Ok(()));
    db.expect_remove_roles().returning(|_, _| Ok(0));
    db.expect_fetch_roles_for_user().withf(|id| *id == 9).returning(|_| Ok(vec![Role::User, Role::Admin]));
    let req = TestRequest::post().uri("/users/roles").insert_header(("Authorization", admin_bearer(1))).set_json(&body);
    let (status, body) = send(req, |cfg| configure(cfg, db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"user_id": 9, "roles": ["user", "admin"]}]));
}

#[actix_web::test]
async fn the_user_role_cannot_be_revoked() {
    let _ = env_logger::try_init().ok();
    let body = json!([{"user_id": 9, "revoke": ["user"]}]);
    let req = TestRequest::post().uri("/users/roles").insert_header(("Authorization", admin_bearer(1))).set_json(&body);
    let (status, body) = send(req, |cfg| configure(cfg, MockAuthManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "The user role cannot be removed");
}
