//! # Storefront
//!
//! Client-side state for an e-commerce storefront: a cart per identity that survives
//! restarts, orders with a guarded lifecycle and optimistic admin updates, the
//! signed-in session, catalog filters, and the typed contract of the REST backend.
//!
//! ## Client state
//!
//! - [`cart`]: persisted cart store, one cart per identity.
//! - [`orders`]: lifecycle rules, order store, checkout.
//! - [`session`]: current user and bearer token.
//! - [`catalog`], [`admin`]: product listing and user management.
//! - [`api`]: the backend contract, over HTTP or in-process.
//! - [`storage`]: durable key/value records.
//!
//! ## Reference backend
//!
//! [`user_actor`], [`product_actor`] and [`order_actor`] host the backend's resources
//! on [`resource_framework`] actors; [`clients`] wraps their channels in typed calls.
//! [`lifecycle`] starts everything and shuts it down again.

pub mod admin;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod clients;
pub mod lifecycle;
pub mod model;
pub mod order_actor;
pub mod orders;
pub mod product_actor;
pub mod session;
pub mod storage;
pub mod user_actor;
