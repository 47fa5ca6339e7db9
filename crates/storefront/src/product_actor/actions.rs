//! Custom actions for the Product actor.
//!
//! Handled by [`ResourceEntity::handle_action`](resource_framework::ResourceEntity::handle_action)
//! in [`super::entity`].

use crate::model::{Product, UserId};

/// Operations on a product beyond CRUD.
#[derive(Debug, Clone)]
pub enum ProductAction {
    /// Reads the stock level without changing it.
    CheckStock,
    /// Takes the given quantity out of stock.
    ///
    /// # Errors
    /// Fails if the requested amount exceeds available stock.
    ReserveStock(u32),
    /// Puts the given quantity back.
    ReleaseStock(u32),
    /// Appends a review; one per user.
    AddReview {
        author: UserId,
        name: String,
        rating: u8,
        comment: String,
    },
}

/// Results from ProductActions - variants match 1:1 with ProductAction.
#[derive(Debug, Clone)]
pub enum ProductActionResult {
    /// Current stock level.
    CheckStock(u32),
    /// Stock left after the reservation.
    ReserveStock(u32),
    /// Stock level after the release.
    ReleaseStock(u32),
    AddReview(Product),
}

/// Filter for listing products.
#[derive(Debug, Clone, Default)]
pub enum ProductFilter {
    #[default]
    All,
    /// Storefront search: keyword in the name or brand, optional category.
    Catalog {
        keyword: Option<String>,
        category: Option<String>,
    },
    Featured,
}
