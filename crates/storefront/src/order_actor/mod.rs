//! # Order Actor
//!
//! Orders of the reference backend and the authoritative side of the lifecycle rules.
//!
//! The actor depends on the User and Product actors, injected at `run()` time:
//!
//! ```rust,ignore
//! let (order_actor, order_client) = order_actor::new();
//! tokio::spawn(order_actor.run((user_client.clone(), product_client.clone())));
//! ```
//!
//! Placing an order checks the owner, reprices every line from the catalog, and
//! reserves stock line by line. If a line cannot be reserved, the lines already
//! reserved are released before the order is rejected. Cancelling releases the stock
//! again.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;

use crate::clients::OrderClient;
use crate::model::Order;
use resource_framework::ResourceActor;

/// Creates the Order actor and its client.
pub fn new() -> (ResourceActor<Order>, OrderClient) {
    let (actor, generic_client) = ResourceActor::new(32);
    (actor, OrderClient::new(generic_client))
}
