//! Error types for order actions.

use resource_framework::ApiError;
use thiserror::Error;

/// Errors that can occur while changing an order's status or tracking.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderActionError {
    /// The target order does not exist.
    #[error("Order {0} not found")]
    OrderNotFound(u32),

    /// No target status was given.
    #[error("A target status id is required")]
    MissingStatus,

    /// The target status id does not exist.
    #[error("Order status {0} does not exist")]
    UnknownStatus(u32),

    /// Symbolic status codes cannot be resolved to ids.
    #[error("Order status codes are not supported, use a status id instead of `{0}`")]
    StatusCodeUnsupported(String),

    #[error("A non-empty tracking number is required")]
    MissingTrackingNumber,

    /// The legacy store reported an unsuccessful save.
    #[error("Could not persist {what} for order {order_id}")]
    PersistenceFailed { order_id: u32, what: &'static str },

    /// The request body does not decode into the action.
    #[error("Invalid order action payload: {0}")]
    InvalidPayload(String),

    /// The legacy store itself failed.
    #[error("Order store error: {0}")]
    Store(String),
}

impl From<OrderActionError> for ApiError {
    fn from(e: OrderActionError) -> Self {
        match e {
            OrderActionError::OrderNotFound(_) => ApiError::NotFound(e.to_string()),
            OrderActionError::MissingStatus
            | OrderActionError::UnknownStatus(_)
            | OrderActionError::StatusCodeUnsupported(_)
            | OrderActionError::MissingTrackingNumber => ApiError::InvalidArgument(e.to_string()),
            OrderActionError::InvalidPayload(message) => ApiError::Validation {
                field: "body".into(),
                message,
            },
            OrderActionError::PersistenceFailed { .. } | OrderActionError::Store(_) => {
                ApiError::PersistenceFailure(e.to_string())
            }
        }
    }
}
