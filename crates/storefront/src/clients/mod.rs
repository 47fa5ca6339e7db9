//! # Backend Clients
//!
//! Typed wrappers around the generic [`ResourceClient`](resource_framework::ResourceClient)
//! of each backend actor. Reads and deletes come from
//! [`ResourceHandle`](resource_framework::ResourceHandle); the wrappers add the
//! resource-specific calls and turn framework failures into the resource's own error.

mod order_client;
mod product_client;
mod user_client;

pub use order_client::OrderClient;
pub use product_client::ProductClient;
pub use user_client::UserClient;

use crate::model::{User, UserId};
use crate::orders::Role;

/// Who a backend request runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    /// The backend itself: seeding, token lookups, cross-actor calls.
    System,
    Customer(UserId),
    Admin(UserId),
}

impl Principal {
    pub fn for_user(user: &User) -> Self {
        if user.is_admin {
            Principal::Admin(user.id.clone())
        } else {
            Principal::Customer(user.id.clone())
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Principal::Customer(id) | Principal::Admin(id) => Some(id),
            Principal::Anonymous | Principal::System => None,
        }
    }

    /// Admins and the system itself.
    pub fn is_privileged(&self) -> bool {
        matches!(self, Principal::Admin(_) | Principal::System)
    }

    pub fn is(&self, user: &UserId) -> bool {
        self.user_id() == Some(user)
    }

    /// Lifecycle role; `None` for anonymous callers.
    pub fn role(&self) -> Option<Role> {
        match self {
            Principal::Customer(_) => Some(Role::Customer),
            Principal::Admin(_) | Principal::System => Some(Role::Admin),
            Principal::Anonymous => None,
        }
    }
}
