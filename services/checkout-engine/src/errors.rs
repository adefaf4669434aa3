use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use rust_decimal::Decimal;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, CheckoutEngineError>;

#[derive(Error, Debug)]
pub enum CheckoutEngineError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("NATS error: {0}")]
    Nats(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Insufficient funds: {deficit} more required (balance {current_balance}, total {required})")]
    InsufficientFunds {
        deficit: Decimal,
        current_balance: Decimal,
        required: Decimal,
    },

    #[error("Invalid customer details: {0}")]
    InvalidCustomer(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid line item #{index}: {reason}")]
    InvalidLineItem { index: usize, reason: String },

    #[error("Declared total must be a positive amount")]
    InvalidTotal,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Idempotency key {0} was already used for a different request")]
    IdempotencyConflict(String),

    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),

    /// Storage-side failure of an atomic unit. The cause is logged, not shown.
    #[error("Checkout failed, please try again later")]
    CheckoutFailed { cause: String },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for CheckoutEngineError {
    fn from(err: serde_json::Error) -> Self {
        CheckoutEngineError::Internal(format!("JSON serialization error: {}", err))
    }
}

impl CheckoutEngineError {
    /// True for failures of the storage layer rather than of the request.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            CheckoutEngineError::Database(_)
                | CheckoutEngineError::Migration(_)
                | CheckoutEngineError::InvariantViolation(_)
                | CheckoutEngineError::Internal(_)
        )
    }

    /// Collapse storage failures into an opaque [`CheckoutEngineError::CheckoutFailed`],
    /// logging the underlying cause. Request and business errors pass through.
    pub fn into_checkout_failure(self, operation: &str) -> Self {
        if self.is_storage() {
            error!(operation, cause = %self, "atomic unit rolled back");
            CheckoutEngineError::CheckoutFailed {
                cause: self.to_string(),
            }
        } else {
            self
        }
    }

    pub fn error_type(&self) -> &str {
        match self {
            CheckoutEngineError::Database(_) => "database_error",
            CheckoutEngineError::Migration(_) => "database_error",
            CheckoutEngineError::Nats(_) => "messaging_error",
            CheckoutEngineError::Validation(_) => "validation_error",
            CheckoutEngineError::UserNotFound(_) => "user_not_found",
            CheckoutEngineError::OrderNotFound(_) => "order_not_found",
            CheckoutEngineError::InsufficientFunds { .. } => "insufficient_funds",
            CheckoutEngineError::InvalidCustomer(_) => "invalid_customer",
            CheckoutEngineError::EmptyCart => "empty_cart",
            CheckoutEngineError::InvalidLineItem { .. } => "invalid_line_item",
            CheckoutEngineError::InvalidTotal => "invalid_total",
            CheckoutEngineError::InvalidAmount(_) => "invalid_amount",
            CheckoutEngineError::EmailTaken(_) => "email_taken",
            CheckoutEngineError::InvalidCredentials => "invalid_credentials",
            CheckoutEngineError::IdempotencyConflict(_) => "idempotency_conflict",
            CheckoutEngineError::InvariantViolation(_) => "internal_error",
            CheckoutEngineError::CheckoutFailed { .. } => "checkout_failed",
            CheckoutEngineError::Internal(_) => "internal_error",
        }
    }

    /// Message shown to API clients. Storage details stay in the logs.
    fn public_message(&self) -> String {
        if self.is_storage() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl ResponseError for CheckoutEngineError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            error!(kind = self.error_type(), "request failed: {}", self);
        }

        let mut body = json!({
            "success": false,
            "error": self.public_message(),
            "type": self.error_type(),
        });

        if let CheckoutEngineError::InsufficientFunds {
            deficit,
            current_balance,
            required,
        } = self
        {
            body["deficit"] = json!(deficit);
            body["currentBalance"] = json!(current_balance);
            body["required"] = json!(required);
        }

        HttpResponse::build(status_code).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            CheckoutEngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CheckoutEngineError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CheckoutEngineError::Nats(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CheckoutEngineError::Validation(_) => StatusCode::BAD_REQUEST,
            CheckoutEngineError::UserNotFound(_) => StatusCode::NOT_FOUND,
            CheckoutEngineError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            CheckoutEngineError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
            CheckoutEngineError::InvalidCustomer(_) => StatusCode::BAD_REQUEST,
            CheckoutEngineError::EmptyCart => StatusCode::BAD_REQUEST,
            CheckoutEngineError::InvalidLineItem { .. } => StatusCode::BAD_REQUEST,
            CheckoutEngineError::InvalidTotal => StatusCode::BAD_REQUEST,
            CheckoutEngineError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            CheckoutEngineError::EmailTaken(_) => StatusCode::CONFLICT,
            CheckoutEngineError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            CheckoutEngineError::IdempotencyConflict(_) => StatusCode::CONFLICT,
            CheckoutEngineError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CheckoutEngineError::CheckoutFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CheckoutEngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// True when `err` is a UNIQUE constraint failure in the database.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
