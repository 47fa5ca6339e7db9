//! Domain types shared by the client stores, the API layer and the reference backend.
//!
//! Wire names follow the storefront REST backend: camelCase fields and `_id` for
//! identifiers. Money is [`rust_decimal::Decimal`] and serializes as a JSON number.

pub mod order;
pub mod product;
pub mod user;

pub use order::*;
pub use product::*;
pub use user::*;

/// Declares a string-backed identifier.
///
/// Identifiers generated by the reference backend look like `user_3`; identifiers
/// coming from a remote backend are kept verbatim.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<u32> for $name {
            fn from(seq: u32) -> Self {
                Self(format!(concat!($prefix, "_{}"), seq))
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Type-safe identifier for users.
    UserId,
    "user"
);
string_id!(
    /// Type-safe identifier for products.
    ProductId,
    "product"
);
string_id!(
    /// Type-safe identifier for orders.
    OrderId,
    "order"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_ids_carry_their_prefix() {
        assert_eq!(UserId::from(3).to_string(), "user_3");
        assert_eq!(ProductId::from(1).as_str(), "product_1");
        assert_eq!(OrderId::from(12), OrderId::new("order_12"));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&OrderId::from(7)).unwrap();
        assert_eq!(json, "\"order_7\"");
        let back: OrderId = serde_json::from_str("\"64f1c0ffee\"").unwrap();
        assert_eq!(back.as_str(), "64f1c0ffee");
    }
}
