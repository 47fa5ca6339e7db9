//! Admin user management: the user list, deletion, promotion, and which of those
//! actions a UI should offer for a given row.

use crate::api::{ApiError, UserApi};
use crate::model::{User, UserId};
use std::sync::Arc;
use tracing::{info, warn};

/// Whether `viewer` may promote `user`. Only admins promote, and only non-admins.
pub fn can_promote(user: &User, viewer: Option<&User>) -> bool {
    viewer.is_some_and(|v| v.is_admin) && !user.is_admin
}

/// Whether `viewer` may delete `user`. Admins cannot delete themselves.
pub fn can_delete(user: &User, viewer: Option<&User>) -> bool {
    viewer.is_some_and(|v| v.is_admin && v.id != user.id)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserCounts {
    pub admins: usize,
    pub customers: usize,
}

impl UserCounts {
    pub fn of(users: &[User]) -> Self {
        let admins = users.iter().filter(|u| u.is_admin).count();
        Self {
            admins,
            customers: users.len() - admins,
        }
    }
}

/// The admin's view of all users.
pub struct UserAdmin<A: UserApi + ?Sized> {
    api: Arc<A>,
    users: Vec<User>,
    last_error: Option<String>,
}

impl<A: UserApi + ?Sized> UserAdmin<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            users: Vec::new(),
            last_error: None,
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn counts(&self) -> UserCounts {
        UserCounts::of(&self.users)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn reset(&mut self) {
        self.users.clear();
        self.last_error = None;
    }

    pub async fn refresh(&mut self) -> Result<&[User], ApiError> {
        let api = Arc::clone(&self.api);
        self.users = self.settle(api.list_users().await, "Failed to load users.")?;
        Ok(&self.users)
    }

    pub async fn delete(&mut self, id: &UserId) -> Result<(), ApiError> {
        let api = Arc::clone(&self.api);
        self.settle(
            api.delete_user(id).await,
            "Failed to delete user. Please try again.",
        )?;
        self.users.retain(|u| &u.id != id);
        info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Grants admin rights; the list entry is replaced by the server's profile.
    pub async fn promote(&mut self, id: &UserId) -> Result<User, ApiError> {
        let api = Arc::clone(&self.api);
        let promoted = self.settle(
            api.promote_to_admin(id).await,
            "Failed to promote user. Please try again.",
        )?;
        match self.users.iter_mut().find(|u| &u.id == id) {
            Some(slot) => *slot = promoted.clone(),
            None => self.users.push(promoted.clone()),
        }
        info!(user_id = %id, "User promoted to admin");
        Ok(promoted)
    }

    /// Authentication failures keep the normalized message; anything else shows
    /// `fallback`.
    fn settle<T>(&mut self, result: Result<T, ApiError>, fallback: &str) -> Result<T, ApiError> {
        match result {
            Ok(value) => {
                self.last_error = None;
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind, "User admin request failed");
                self.last_error = Some(if e.is_unauthorized() {
                    e.message.clone()
                } else {
                    fallback.to_string()
                });
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn user(seq: u32, is_admin: bool) -> User {
        User {
            id: UserId::from(seq),
            name: format!("User {seq}"),
            email: format!("user{seq}@example.com"),
            is_admin,
        }
    }

    struct FakeUsers(Mutex<Vec<User>>);

    #[async_trait]
    impl UserApi for FakeUsers {
        async fn list_users(&self) -> Result<Vec<User>, ApiError> {
            Ok(self.0.lock().unwrap().clone())
        }

        async fn delete_user(&self, id: &UserId) -> Result<(), ApiError> {
            let mut users = self.0.lock().unwrap();
            if !users.iter().any(|u| &u.id == id) {
                return Err(ApiError::from_response(404, r#"{"message":"User not found"}"#, false));
            }
            users.retain(|u| &u.id != id);
            Ok(())
        }

        async fn promote_to_admin(&self, id: &UserId) -> Result<User, ApiError> {
            let mut users = self.0.lock().unwrap();
            let found = users.iter_mut().find(|u| &u.id == id);
            let Some(found) = found else {
                return Err(ApiError::from_response(404, "", false));
            };
            found.is_admin = true;
            Ok(found.clone())
        }
    }

    #[test]
    fn promote_is_offered_only_for_non_admins() {
        let admin = user(1, true);
        assert!(can_promote(&user(2, false), Some(&admin)));
        assert!(!can_promote(&user(3, true), Some(&admin)));
        assert!(!can_promote(&user(2, false), Some(&user(4, false))));
        assert!(!can_promote(&user(2, false), None));
    }

    #[test]
    fn admins_are_not_offered_to_delete_themselves() {
        let admin = user(1, true);
        assert!(!can_delete(&admin, Some(&admin)));
        assert!(can_delete(&user(2, false), Some(&admin)));
    }

    #[tokio::test]
    async fn promotion_updates_the_listed_user() {
        let api = Arc::new(FakeUsers(Mutex::new(vec![user(1, true), user(2, false)])));
        let mut admin = UserAdmin::new(api);
        admin.refresh().await.unwrap();
        assert_eq!(admin.counts(), UserCounts { admins: 1, customers: 1 });

        let promoted = admin.promote(&UserId::from(2)).await.unwrap();

        assert!(promoted.is_admin);
        assert!(!can_promote(&admin.users()[1], Some(&user(1, true))));
        assert_eq!(admin.counts(), UserCounts { admins: 2, customers: 0 });
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_list_and_sets_a_message() {
        let api = Arc::new(FakeUsers(Mutex::new(vec![user(1, true)])));
        let mut admin = UserAdmin::new(api);
        admin.refresh().await.unwrap();

        assert!(admin.delete(&UserId::from(9)).await.is_err());

        assert_eq!(admin.users().len(), 1);
        assert_eq!(
            admin.last_error(),
            Some("Failed to delete user. Please try again.")
        );
    }
}
