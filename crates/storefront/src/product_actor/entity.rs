//! [`ResourceEntity`] implementation for [`Product`].
//!
//! Anyone may read and list products; creating, editing and deleting them is for
//! admins. Stock moves only on behalf of the system (the order actor).

use super::actions::{ProductAction, ProductActionResult, ProductFilter};
use super::error::ProductError;
use crate::clients::Principal;
use crate::model::{Product, ProductDraft, ProductId, ProductUpdate, Review};
use async_trait::async_trait;
use chrono::Utc;
use resource_framework::ResourceEntity;

fn require_admin(principal: &Principal) -> Result<(), ProductError> {
    if principal.is_privileged() {
        Ok(())
    } else {
        Err(ProductError::Forbidden)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl Product {
    fn recompute_rating(&mut self) {
        self.num_reviews = self.reviews.len() as u32;
        self.rating = if self.reviews.is_empty() {
            0.0
        } else {
            let sum: u32 = self.reviews.iter().map(|r| u32::from(r.rating)).sum();
            f64::from(sum) / f64::from(self.num_reviews)
        };
    }
}

#[async_trait]
impl ResourceEntity for Product {
    type Id = ProductId;
    type Create = ProductDraft;
    type Update = ProductUpdate;
    type Action = ProductAction;
    type ActionResult = ProductActionResult;
    type Query = ProductFilter;
    type Principal = Principal;
    type Context = ();
    type Error = ProductError;

    fn from_create_params(
        id: ProductId,
        draft: ProductDraft,
        principal: &Principal,
    ) -> Result<Self, ProductError> {
        require_admin(principal)?;
        if draft.name.trim().is_empty() {
            return Err(ProductError::Validation("Name is required".into()));
        }
        if draft.price.is_sign_negative() {
            return Err(ProductError::Validation("Price cannot be negative".into()));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            name: draft.name.trim().to_string(),
            description: draft.description,
            price: draft.price,
            count_in_stock: draft.count_in_stock,
            category: draft.category,
            brand: draft.brand,
            image: draft.image,
            rating: 0.0,
            num_reviews: 0,
            reviews: Vec::new(),
            featured: draft.featured,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    fn matches(&self, query: &ProductFilter, _principal: &Principal) -> bool {
        match query {
            ProductFilter::All => true,
            ProductFilter::Featured => self.featured,
            ProductFilter::Catalog { keyword, category } => {
                let keyword_hit = keyword.as_deref().map_or(true, |k| {
                    contains_ignore_case(&self.name, k) || contains_ignore_case(&self.brand, k)
                });
                let category_hit = category
                    .as_deref()
                    .map_or(true, |c| self.category.eq_ignore_ascii_case(c));
                keyword_hit && category_hit
            }
        }
    }

    async fn on_update(
        &mut self,
        update: ProductUpdate,
        principal: &Principal,
        _ctx: &(),
    ) -> Result<(), ProductError> {
        require_admin(principal)?;
        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(ProductError::Validation("Name is required".into()));
            }
            self.name = name.trim().to_string();
        }
        if let Some(price) = update.price {
            if price.is_sign_negative() {
                return Err(ProductError::Validation("Price cannot be negative".into()));
            }
            self.price = price;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(count) = update.count_in_stock {
            self.count_in_stock = count;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(brand) = update.brand {
            self.brand = brand;
        }
        if let Some(image) = update.image {
            self.image = image;
        }
        if let Some(featured) = update.featured {
            self.featured = featured;
        }
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn on_delete(&self, principal: &Principal, _ctx: &()) -> Result<(), ProductError> {
        require_admin(principal)
    }

    async fn handle_action(
        &mut self,
        action: ProductAction,
        principal: &Principal,
        _ctx: &(),
    ) -> Result<ProductActionResult, ProductError> {
        match action {
            ProductAction::CheckStock => Ok(ProductActionResult::CheckStock(self.count_in_stock)),
            ProductAction::ReserveStock(quantity) => {
                require_admin(principal)?;
                if quantity == 0 {
                    return Err(ProductError::InvalidQuantity(quantity));
                }
                if self.count_in_stock < quantity {
                    return Err(ProductError::InsufficientStock {
                        requested: quantity,
                        available: self.count_in_stock,
                    });
                }
                self.count_in_stock -= quantity;
                Ok(ProductActionResult::ReserveStock(self.count_in_stock))
            }
            ProductAction::ReleaseStock(quantity) => {
                require_admin(principal)?;
                self.count_in_stock = self.count_in_stock.saturating_add(quantity);
                Ok(ProductActionResult::ReleaseStock(self.count_in_stock))
            }
            ProductAction::AddReview {
                author,
                name,
                rating,
                comment,
            } => {
                if !principal.is(&author) {
                    return Err(ProductError::Forbidden);
                }
                if !(1..=5).contains(&rating) {
                    return Err(ProductError::InvalidRating(rating));
                }
                if self.reviewed_by(&author) {
                    return Err(ProductError::AlreadyReviewed);
                }
                self.reviews.push(Review {
                    user: Some(author),
                    name,
                    rating,
                    comment,
                    created_at: Some(Utc::now()),
                });
                self.recompute_rating();
                Ok(ProductActionResult::AddReview(self.clone()))
            }
        }
    }
}
