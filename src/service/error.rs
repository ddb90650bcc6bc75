// service/error.rs
use thiserror::Error;

use crate::error::HttpError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("User not found")]
    UserNotFound,

    #[error("Order with ID/Reference {0} not found")]
    OrderNotFound(String),

    #[error("Transaction not found")]
    TransactionNotFound,

    #[error("Insufficient balance")]
    InsufficientBalance { current: i64, requested: i64 },

    #[error("Please provide a valid amount")]
    InvalidAmount,

    #[error("Invalid status value: {0}")]
    InvalidStatus(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::UserNotFound
            | ServiceError::OrderNotFound(_)
            | ServiceError::TransactionNotFound => HttpError::not_found(error.to_string()),

            ServiceError::InsufficientBalance { .. }
            | ServiceError::InvalidAmount
            | ServiceError::InvalidStatus(_) => HttpError::bad_request(error.to_string()),

            ServiceError::Database(e) => HttpError::server_error(e.to_string()),
        }
    }
}
