//! # Orders
//!
//! - [`lifecycle`]: the transition table and its guards, shared with the backend.
//! - [`OrderStore`]: cached order lists and the remote transitions, two of them
//!   optimistic ([`Optimistic`]).
//! - [`checkout`](checkout::checkout): pricing and placing an order from the cart.

mod book;
pub mod checkout;
mod error;
pub mod lifecycle;
mod optimistic;
mod store;

pub use book::OrderBook;
pub use checkout::{checkout, CheckoutError, CheckoutForm, PriceBreakdown, CREDIT_CARD};
pub use error::OrderError;
pub use lifecycle::{available_transitions, GuardError, Role, Stage, Transition};
pub use optimistic::Optimistic;
pub use store::OrderStore;
