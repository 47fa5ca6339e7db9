use super::UserId;
use serde::{Deserialize, Serialize};

/// A user profile as the storefront sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Credentials for `/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Payload for `/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Payload for `PUT /users/profile`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// A bearer token together with the profile it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Raw auth response. Backends either nest the profile under `user` or flatten its
/// fields next to `token`; both shapes are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
}

impl AuthResponse {
    pub fn nested(session: AuthSession) -> Self {
        Self {
            token: session.token,
            user: Some(session.user),
            id: None,
            name: None,
            email: None,
            is_admin: None,
        }
    }

    /// Returns `None` when neither shape carries a user id.
    pub fn into_session(self) -> Option<AuthSession> {
        let user = match self.user {
            Some(user) => user,
            None => User {
                id: self.id?,
                name: self.name.unwrap_or_default(),
                email: self.email.unwrap_or_default(),
                is_admin: self.is_admin.unwrap_or(false),
            },
        };
        Some(AuthSession {
            user,
            token: self.token,
        })
    }
}
