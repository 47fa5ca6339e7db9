//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the global subscriber: compact lines, no module
//! targets, level filter from `RUST_LOG`.
//!
//! ```bash
//! RUST_LOG=info cargo run --bin storefront-demo    # lifecycle and store events
//! RUST_LOG=debug cargo run --bin storefront-demo   # every actor request and response
//! ```
//!
//! With `RUST_LOG=info` a checkout reads roughly like:
//!
//! ```text
//! INFO Signed in user_id=user_2 admin=false
//! INFO Switching cart identity from=guest to=user-user_2
//! INFO Created entity_type="Order" id=order_1 size=1
//! INFO Order placed order_id=order_1 total=330.00
//! INFO Cart cleared identity=user-user_2
//! ```
//!
//! Client methods carry `#[instrument]` spans, so at `debug` the actor requests nest
//! under the call that issued them.

/// Installs the global `tracing` subscriber. Call once, at the start of `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
