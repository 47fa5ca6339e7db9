//! # Durable Storage
//!
//! A small synchronous key/value store for client state: one cart record per identity,
//! the bearer token and the cached user profile.
//!
//! Keys are typed ([`StorageKey`]) so a guest cart and a user cart can never share a
//! record, whatever the user id looks like.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::cart::CartIdentity;
use crate::model::UserId;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

/// Key of a durable record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Cart(CartIdentity),
    Token,
    UserInfo,
}

impl StorageKey {
    pub fn is_cart(&self) -> bool {
        matches!(self, StorageKey::Cart(_))
    }

    /// File name used by [`FileStorage`].
    pub fn file_name(&self) -> String {
        match self {
            StorageKey::Cart(CartIdentity::Guest) => "cart-guest.json".to_string(),
            StorageKey::Cart(CartIdentity::User(id)) => {
                format!("cart-user-{}.json", hex::encode(id.as_str()))
            }
            StorageKey::Token => "token".to_string(),
            StorageKey::UserInfo => "user-info.json".to_string(),
        }
    }

    /// Inverse of [`StorageKey::file_name`]; `None` for files this store did not write.
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "cart-guest.json" => Some(StorageKey::Cart(CartIdentity::Guest)),
            "token" => Some(StorageKey::Token),
            "user-info.json" => Some(StorageKey::UserInfo),
            _ => {
                let encoded = name.strip_prefix("cart-user-")?.strip_suffix(".json")?;
                let raw = hex::decode(encoded).ok()?;
                let id = String::from_utf8(raw).ok()?;
                Some(StorageKey::Cart(CartIdentity::User(UserId::new(id))))
            }
        }
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKey::Cart(identity) => write!(f, "cart:{identity}"),
            StorageKey::Token => f.write_str("token"),
            StorageKey::UserInfo => f.write_str("user-info"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(key: impl Display, source: std::io::Error) -> Self {
        StorageError::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// Durable key/value storage.
pub trait Storage: Send + Sync {
    fn read(&self, key: &StorageKey) -> Result<Option<String>, StorageError>;

    fn write(&self, key: &StorageKey, value: &str) -> Result<(), StorageError>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &StorageKey) -> Result<(), StorageError>;

    /// Every key currently holding a record.
    fn keys(&self) -> Result<Vec<StorageKey>, StorageError>;

    /// Removes every cart record of every identity. Returns how many were removed.
    fn clear_carts(&self) -> Result<usize, StorageError> {
        let mut removed = 0;
        for key in self.keys()?.iter().filter(|k| k.is_cart()) {
            self.remove(key)?;
            removed += 1;
        }
        Ok(removed)
    }
}

/// Storage shared between the cart store and the session.
pub type SharedStorage = Arc<dyn Storage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_round_trip() {
        let keys = [
            StorageKey::Cart(CartIdentity::Guest),
            StorageKey::Cart(CartIdentity::User(UserId::new("guest"))),
            StorageKey::Cart(CartIdentity::User(UserId::new("../etc/passwd"))),
            StorageKey::Token,
            StorageKey::UserInfo,
        ];
        for key in keys {
            assert_eq!(StorageKey::from_file_name(&key.file_name()), Some(key));
        }
    }

    #[test]
    fn user_named_guest_does_not_collide_with_guest_cart() {
        let guest = StorageKey::Cart(CartIdentity::Guest);
        let user = StorageKey::Cart(CartIdentity::User(UserId::new("guest")));
        assert_ne!(guest.file_name(), user.file_name());
    }

    #[test]
    fn foreign_files_are_ignored() {
        assert_eq!(StorageKey::from_file_name("notes.txt"), None);
        assert_eq!(StorageKey::from_file_name("cart-user-zz.json"), None);
    }
}
