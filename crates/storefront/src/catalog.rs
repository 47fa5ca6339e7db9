//! # Catalog
//!
//! Product listing state: the filter the shopper is editing, the page it produced,
//! the category list and the product on screen. Filtering, sorting and paging are
//! done by the backend; this module only maps the filter to query parameters.

use crate::api::{ApiError, ProductApi};
use crate::model::{
    Product, ProductDraft, ProductId, ProductPage, ProductQuery, ProductUpdate, ReviewDraft,
};
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const ALL_CATEGORIES: &str = "All";
pub const PAGE_SIZE: u32 = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Newest,
    PriceLow,
    PriceHigh,
    NameAsc,
    NameDesc,
}

impl SortOrder {
    /// The backend's `sort` parameter.
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::Newest => "-createdAt",
            SortOrder::PriceLow => "price",
            SortOrder::PriceHigh => "-price",
            SortOrder::NameAsc => "name",
            SortOrder::NameDesc => "-name",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown sort order: {0}")]
pub struct UnknownSortOrder(String);

impl FromStr for SortOrder {
    type Err = UnknownSortOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortOrder::Newest),
            "price-low" => Ok(SortOrder::PriceLow),
            "price-high" => Ok(SortOrder::PriceHigh),
            "name-asc" => Ok(SortOrder::NameAsc),
            "name-desc" => Ok(SortOrder::NameDesc),
            other => Err(UnknownSortOrder(other.to_string())),
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SortOrder::Newest => "newest",
            SortOrder::PriceLow => "price-low",
            SortOrder::PriceHigh => "price-high",
            SortOrder::NameAsc => "name-asc",
            SortOrder::NameDesc => "name-desc",
        };
        f.write_str(label)
    }
}

/// The listing filter. Changing anything but the page goes back to page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogFilter {
    keyword: String,
    category: String,
    sort: SortOrder,
    page: u32,
    limit: u32,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            keyword: String::new(),
            category: ALL_CATEGORIES.to_string(),
            sort: SortOrder::default(),
            page: 1,
            limit: PAGE_SIZE,
        }
    }
}

impl CatalogFilter {
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn set_keyword(&mut self, keyword: impl Into<String>) {
        self.keyword = keyword.into();
        self.page = 1;
    }

    /// An empty category means all categories.
    pub fn set_category(&mut self, category: impl Into<String>) {
        let category = category.into();
        self.category = if category.trim().is_empty() {
            ALL_CATEGORIES.to_string()
        } else {
            category
        };
        self.page = 1;
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
        self.page = 1;
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit.max(1);
        self.page = 1;
    }

    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn to_query(&self) -> ProductQuery {
        let keyword = self.keyword.trim();
        ProductQuery {
            keyword: (!keyword.is_empty()).then(|| keyword.to_string()),
            category: (self.category != ALL_CATEGORIES).then(|| self.category.clone()),
            sort: Some(self.sort.as_param().to_string()),
            page: Some(self.page),
            limit: Some(self.limit),
        }
    }
}

/// Listing and product-detail state over a [`ProductApi`].
pub struct Catalog<A: ProductApi + ?Sized> {
    api: Arc<A>,
    filter: CatalogFilter,
    page: ProductPage,
    categories: Vec<String>,
    featured: Vec<Product>,
    current: Option<Product>,
    last_error: Option<String>,
}

impl<A: ProductApi + ?Sized> Catalog<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            filter: CatalogFilter::default(),
            page: ProductPage::default(),
            categories: Vec::new(),
            featured: Vec::new(),
            current: None,
            last_error: None,
        }
    }

    pub fn filter(&self) -> &CatalogFilter {
        &self.filter
    }

    /// Edit the filter, then call [`Catalog::refresh`].
    pub fn filter_mut(&mut self) -> &mut CatalogFilter {
        &mut self.filter
    }

    pub fn page(&self) -> &ProductPage {
        &self.page
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn featured(&self) -> &[Product] {
        &self.featured
    }

    pub fn current(&self) -> Option<&Product> {
        self.current.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Loads the page for the current filter.
    pub async fn refresh(&mut self) -> Result<&ProductPage, ApiError> {
        let query = self.filter.to_query();
        debug!(?query, "Loading products");
        let api = Arc::clone(&self.api);
        self.page = self.settle(api.list_products(query).await)?;
        Ok(&self.page)
    }

    /// Loads the category list, with [`ALL_CATEGORIES`] first.
    pub async fn load_categories(&mut self) -> Result<&[String], ApiError> {
        let api = Arc::clone(&self.api);
        let loaded = self.settle(api.categories().await)?;
        self.categories = std::iter::once(ALL_CATEGORIES.to_string())
            .chain(loaded.into_iter().filter(|c| c != ALL_CATEGORIES))
            .collect();
        Ok(&self.categories)
    }

    pub async fn load_featured(&mut self) -> Result<&[Product], ApiError> {
        let api = Arc::clone(&self.api);
        self.featured = self.settle(api.featured_products().await)?;
        Ok(&self.featured)
    }

    /// Loads a product and makes it current.
    pub async fn open(&mut self, id: &ProductId) -> Result<&Product, ApiError> {
        let api = Arc::clone(&self.api);
        let product = self.settle(api.product(id).await)?;
        let product: &Product = self.current.insert(product);
        Ok(product)
    }

    /// Whether the signed-in user may review the product. Any failure reads as "no".
    pub async fn can_review(&self, id: &ProductId) -> bool {
        match self.api.check_purchase(id).await {
            Ok(check) => check.is_paid,
            Err(e) => {
                debug!(product_id = %id, error = %e, "Purchase check failed");
                false
            }
        }
    }

    /// Submits a review and reloads the product so the new rating shows.
    pub async fn submit_review(
        &mut self,
        id: &ProductId,
        review: ReviewDraft,
    ) -> Result<&Product, ApiError> {
        let api = Arc::clone(&self.api);
        self.settle(api.submit_review(id, review).await)?;
        info!(product_id = %id, "Review submitted");
        self.open(id).await
    }

    pub async fn create_product(&mut self, draft: ProductDraft) -> Result<Product, ApiError> {
        let api = Arc::clone(&self.api);
        let product = self.settle(api.create_product(draft).await)?;
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    pub async fn update_product(
        &mut self,
        id: &ProductId,
        update: ProductUpdate,
    ) -> Result<Product, ApiError> {
        let api = Arc::clone(&self.api);
        let product = self.settle(api.update_product(id, update).await)?;
        self.replace(&product);
        Ok(product)
    }

    pub async fn delete_product(&mut self, id: &ProductId) -> Result<(), ApiError> {
        let api = Arc::clone(&self.api);
        self.settle(api.delete_product(id).await)?;
        self.page.products.retain(|p| &p.id != id);
        self.featured.retain(|p| &p.id != id);
        if self.current.as_ref().is_some_and(|p| &p.id == id) {
            self.current = None;
        }
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    fn replace(&mut self, product: &Product) {
        let cached = self
            .page
            .products
            .iter_mut()
            .chain(self.featured.iter_mut())
            .chain(self.current.iter_mut());
        for slot in cached.filter(|p| p.id == product.id) {
            *slot = product.clone();
        }
    }

    fn settle<T>(&mut self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => {
                warn!(error = %e, kind = ?e.kind, "Catalog request failed");
                self.last_error = Some(e.message.clone());
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_asks_for_the_newest_first_page() {
        let query = CatalogFilter::default().to_query();
        assert_eq!(query.keyword, None);
        assert_eq!(query.category, None);
        assert_eq!(query.sort.as_deref(), Some("-createdAt"));
        assert_eq!(query.page, Some(1));
        assert_eq!(query.limit, Some(PAGE_SIZE));
    }

    #[test]
    fn changing_the_filter_resets_the_page() {
        let mut filter = CatalogFilter::default();
        filter.set_page(3);
        filter.set_keyword("  lamp ");
        assert_eq!(filter.page(), 1);

        filter.set_page(2);
        filter.set_category("Lighting");
        filter.set_sort("price-high".parse().unwrap());
        let query = filter.to_query();

        assert_eq!(query.keyword.as_deref(), Some("lamp"));
        assert_eq!(query.category.as_deref(), Some("Lighting"));
        assert_eq!(query.sort.as_deref(), Some("-price"));
        assert_eq!(query.page, Some(1));
    }

    #[test]
    fn blank_category_means_all() {
        let mut filter = CatalogFilter::default();
        filter.set_category("Lighting");
        filter.set_category(" ");
        assert_eq!(filter.category(), ALL_CATEGORIES);
        assert_eq!(filter.to_query().category, None);
    }

    #[test]
    fn sort_orders_parse_from_their_labels() {
        for sort in [
            SortOrder::Newest,
            SortOrder::PriceLow,
            SortOrder::PriceHigh,
            SortOrder::NameAsc,
            SortOrder::NameDesc,
        ] {
            assert_eq!(sort.to_string().parse::<SortOrder>(), Ok(sort));
        }
        assert!("cheapest".parse::<SortOrder>().is_err());
    }
}
