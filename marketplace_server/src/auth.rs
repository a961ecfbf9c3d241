//! Issuing and validating the bearer tokens that identify the acting user.
//!
//! Tokens are HS256-signed JWTs. Every successful login or registration yields a pair: a short-lived access token
//! that is presented on each request, and a longer-lived refresh token that can only be exchanged for a new access
//! token at `/auth/refresh`. Refresh tokens carry a unique id (`jti`) so that they can be revoked on logout.
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use futures::future::{ready, Ready};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    prelude::*,
};
use log::*;
use marketplace_engine::db_types::{Role, Roles};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

const JTI_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user id
    pub sub: i64,
    pub username: String,
    pub roles: Roles,
    pub kind: TokenKind,
    pub jti: String,
}

impl JwtClaims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Handlers that take a `JwtClaims` argument can only be reached with a valid access token.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingCredentials)))
    }
}

/// A token whose signature and expiry have been checked.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub claims: JwtClaims,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    key: Hs256Key,
    access_token_lifetime: Duration,
    refresh_token_lifetime: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TokenIssuer (key: ****, access: {}s, refresh: {}s)",
            self.access_token_lifetime.num_seconds(),
            self.refresh_token_lifetime.num_seconds()
        )
    }
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            key: Hs256Key::new(config.jwt_secret.reveal().as_bytes()),
            access_token_lifetime: config.access_token_lifetime,
            refresh_token_lifetime: config.refresh_token_lifetime,
        }
    }

    /// Issues a fresh access and refresh token for the user.
    pub fn issue_pair(&self, user_id: i64, username: &str, roles: &[Role]) -> Result<TokenPair, ServerError> {
        let access_token = self.issue(user_id, username, roles, TokenKind::Access)?;
        let refresh_token = self.issue(user_id, username, roles, TokenKind::Refresh)?;
        trace!("🔐️ Issued token pair for user #{user_id}");
        Ok(TokenPair { access_token, refresh_token })
    }

    pub fn issue(&self, user_id: i64, username: &str, roles: &[Role], kind: TokenKind) -> Result<String, ServerError> {
        let lifetime = match kind {
            TokenKind::Access => self.access_token_lifetime,
            TokenKind::Refresh => self.refresh_token_lifetime,
        };
        let custom = JwtClaims { sub: user_id, username: username.to_string(), roles: roles.to_vec(), kind, jti: new_jti() };
        let claims = Claims::new(custom).set_duration_and_issuance(&TimeOptions::default(), lifetime);
        let header = Header::empty().with_token_type("JWT");
        Hs256.token(&header, &claims, &self.key).map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))
    }

    /// Checks the token's signature, expiry and kind.
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<VerifiedToken, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let token = Hs256
            .validator::<JwtClaims>(&self.key)
            .validate(&untrusted)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let claims = token.claims();
        claims.validate_expiration(&TimeOptions::default()).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let expires_at = claims.expiration.ok_or_else(|| AuthError::InvalidToken("Token has no expiry".into()))?;
        if claims.custom.kind != expected {
            return Err(AuthError::InvalidToken("Token has wrong type".into()));
        }
        Ok(VerifiedToken { claims: claims.custom.clone(), expires_at })
    }
}

fn new_jti() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(JTI_LENGTH).map(char::from).collect()
}
