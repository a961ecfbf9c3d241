//! Bearer token middleware.
//!
//! Wrapped around the whole application. If a request carries an `Authorization: Bearer <token>` header, the token
//! must be a valid access token, and its claims are stored in the request extensions for handlers
//! (via the [`JwtClaims`] extractor) and for [`super::AclMiddlewareFactory`]. Requests without the header pass through
//! untouched, so that public endpoints remain reachable. A header that is present but invalid is always a 401.
use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::{JwtClaims, TokenIssuer, TokenKind},
    errors::{AuthError, ServerError},
};

const BEARER_PREFIX: &str = "Bearer ";

pub struct JwtMiddlewareFactory {
    issuer: TokenIssuer,
}

impl JwtMiddlewareFactory {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self { issuer }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { issuer: Rc::new(self.issuer.clone()), service: Rc::new(service) })
    }
}

pub struct JwtMiddlewareService<S> {
    issuer: Rc<TokenIssuer>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let issuer = Rc::clone(&self.issuer);
        Box::pin(async move {
            if let Some(header) = req.headers().get(AUTHORIZATION) {
                let claims = bearer_claims(&issuer, header.to_str().unwrap_or_default())?;
                trace!("🔐️ Request to {} authenticated as user #{}", req.path(), claims.sub);
                req.extensions_mut().insert(claims);
            }
            service.call(req).await
        })
    }
}

fn bearer_claims(issuer: &TokenIssuer, header: &str) -> Result<JwtClaims, ServerError> {
    let token = header.strip_prefix(BEARER_PREFIX).map(str::trim).filter(|t| !t.is_empty()).ok_or_else(|| {
        debug!("🔐️ Authorization header is not a bearer token");
        AuthError::InvalidToken("Authorization header must contain two space-delimited values".into())
    })?;
    let verified = issuer.validate(token, TokenKind::Access).map_err(|e| {
        debug!("🔐️ Rejected access token. {e}");
        e
    })?;
    Ok(verified.claims)
}
