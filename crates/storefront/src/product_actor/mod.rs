//! # Product Actor
//!
//! The catalog of the reference backend: products, their stock and their embedded
//! reviews.
//!
//! ## Custom Actions
//!
//! ```rust,ignore
//! // Current stock level (read-only)
//! let level = product_client.check_stock(id).await?;
//!
//! // Take stock for an order; fails when not enough is left
//! product_client.reserve_stock(id, 3).await?;
//!
//! // Give it back when the order is cancelled or cannot be placed
//! product_client.release_stock(id, 3).await?;
//! ```
//!
//! Reviews go through [`ProductAction::AddReview`], which keeps `rating` and
//! `num_reviews` in step with the review list.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::ProductClient;
use crate::model::Product;
use resource_framework::ResourceActor;

/// Creates the Product actor and its client.
pub fn new() -> (ResourceActor<Product>, ProductClient) {
    let (actor, generic_client) = ResourceActor::new(32);
    (actor, ProductClient::new(generic_client))
}
