use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use marketplace_engine::{
    helpers::ValidationErrors,
    AccountApiError,
    AuthApiError,
    CartError,
    CatalogError,
    CheckoutError,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("{0}")]
    ValidationError(String, ValidationErrors),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("Could not serialize access token. {0}")]
    CouldNotSerializeAccessToken(String),
}

impl ServerError {
    /// A validation error with per-field messages.
    pub fn invalid<S: Into<String>>(message: S, fields: ValidationErrors) -> Self {
        Self::ValidationError(message.into(), fields)
    }

    /// A validation error with a single message on a single field.
    pub fn invalid_field(message: &str, field: &str) -> Self {
        Self::ValidationError(message.to_string(), ValidationErrors::single(field, message))
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(..) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::CouldNotSerializeAccessToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::ValidationError(msg, fields) => json!({ "error": msg, "fields": fields }),
            Self::BackendError(msg) => {
                error!("💻️ Backend error: {msg}");
                json!({ "error": "An error occurred on the backend of the server." })
            },
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Given token not valid for any token type. {0}")]
    InvalidToken(String),
    #[error("Token is blacklisted")]
    RevokedToken,
    #[error("User account not found.")]
    AccountNotFound,
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            AuthApiError::UserNotFound(_) => Self::AuthenticationError(AuthError::AccountNotFound),
            AuthApiError::ValidationError(fields) => Self::invalid("Invalid registration data.", fields),
            AuthApiError::RoleNotAllowed(_) | AuthApiError::RoleLocked(_) => Self::PermissionDenied(e.to_string()),
            AuthApiError::PasswordError(e) => Self::BackendError(format!("Password error: {e}")),
            AuthApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::UserNotFound(_) => Self::NotFound("User not found".into()),
            AccountApiError::ValidationError(fields) => Self::invalid("Invalid profile data.", fields),
            AccountApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(_) => Self::NotFound("Product not found".into()),
            CatalogError::NotProductOwner { .. } => {
                Self::PermissionDenied("You do not have permission to perform this action.".into())
            },
            CatalogError::ValidationError(fields) => Self::invalid("Invalid catalog data.", fields),
            CatalogError::InvalidPage => Self::NotFound("Invalid page.".into()),
            CatalogError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<CartError> for ServerError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::ProductUnavailable(_) => Self::NotFound("Product not found or already sold".into()),
            CartError::ItemNotFound(_) => Self::NotFound("Cart item not found".into()),
            CartError::ValidationError(fields) => Self::invalid("Invalid cart data.", fields),
            CartError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::ValidationError(fields) => Self::invalid("Invalid purchase data.", fields),
            CheckoutError::ProductUnavailable(id) => {
                Self::invalid_field(&format!("Product {id} not found or already sold"), "items")
            },
            CheckoutError::PriceChanged(id) => {
                Self::invalid_field(&format!("The price of product {id} changed. Please review your order."), "items")
            },
            CheckoutError::TotalMismatch { declared, computed } => Self::invalid(
                "Total amount mismatch",
                ValidationErrors::single("total_amount", format!("Expected {computed}, but got {declared}.")),
            ),
            CheckoutError::PurchaseNotFound(_) => Self::NotFound("Purchase not found".into()),
            CheckoutError::InvalidPage => Self::NotFound("Invalid page.".into()),
            CheckoutError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}
