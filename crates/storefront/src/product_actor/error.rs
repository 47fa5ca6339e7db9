//! Error types for the Product actor.

use thiserror::Error;

/// Errors that can occur during product operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),

    /// The requested quantity exceeds the available stock.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),

    #[error("{0}")]
    Validation(String),

    #[error("Rating must be between 1 and 5")]
    InvalidRating(u8),

    #[error("Product already reviewed")]
    AlreadyReviewed,

    #[error("Not authorized")]
    Forbidden,

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}
