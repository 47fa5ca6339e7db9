//! Error types for the Order actor.

use crate::orders::GuardError;
use thiserror::Error;

/// Why the backend refused an order request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderRejection {
    #[error("Order not found: {0}")]
    NotFound(String),

    /// A lifecycle guard failed.
    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error("Not authorized to access this order")]
    Forbidden,

    #[error("Please log in to continue")]
    Unauthenticated,

    #[error("No order items")]
    EmptyOrder,

    #[error("Invalid quantity for {0}")]
    InvalidQuantity(String),

    #[error("Invalid user: {0}")]
    InvalidUser(String),

    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Orders change only through lifecycle actions")]
    Immutable,

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
