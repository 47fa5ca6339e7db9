//! [`ResourceEntity`] implementation for [`Account`].

use super::actions::{AccountAction, AccountActionResult, AccountQuery};
use super::error::UserError;
use crate::clients::Principal;
use crate::model::{User, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use resource_framework::ResourceEntity;
use sha2::{Digest, Sha256};
use std::fmt::Debug;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 6;

/// A user account as stored by the backend.
#[derive(Clone)]
pub struct Account {
    pub profile: User,
    password_digest: String,
    tokens: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("profile", &self.profile)
            .field("tokens", &self.tokens.len())
            .finish_non_exhaustive()
    }
}

/// Payload for creating an account.
#[derive(Clone)]
pub struct AccountCreate {
    pub name: String,
    pub email: String,
    pub password: String,
    pub admin: bool,
}

impl Debug for AccountCreate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountCreate")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

/// Profile changes. Absent fields are left unchanged.
#[derive(Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Debug for AccountUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountUpdate")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Trimmed, lower-cased email.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn digest(id: &UserId, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(id.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn valid_name(name: &str) -> Result<String, UserError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(UserError::invalid("name", "Name is required"));
    }
    Ok(name.to_string())
}

fn valid_email(email: &str) -> Result<String, UserError> {
    let email = normalize_email(email);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(UserError::invalid("email", "Please enter a valid email")),
    }
}

fn valid_password(password: &str) -> Result<&str, UserError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::invalid(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(password)
}

impl Account {
    fn issue_token(&mut self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.push(token.clone());
        token
    }

    fn may_manage(&self, principal: &Principal) -> bool {
        principal.is_privileged() || principal.is(&self.profile.id)
    }
}

#[async_trait]
impl ResourceEntity for Account {
    type Id = UserId;
    type Create = AccountCreate;
    type Update = AccountUpdate;
    type Action = AccountAction;
    type ActionResult = AccountActionResult;
    type Query = AccountQuery;
    type Principal = Principal;
    type Context = ();
    type Error = UserError;

    /// Validates the payload; only admins and the system may create admin accounts.
    fn from_create_params(
        id: UserId,
        params: AccountCreate,
        principal: &Principal,
    ) -> Result<Self, UserError> {
        if params.admin && !principal.is_privileged() {
            return Err(UserError::Forbidden);
        }
        let name = valid_name(&params.name)?;
        let email = valid_email(&params.email)?;
        let password_digest = digest(&id, valid_password(&params.password)?);
        Ok(Self {
            profile: User {
                id,
                name,
                email,
                is_admin: params.admin,
            },
            password_digest,
            tokens: Vec::new(),
            created_at: Utc::now(),
        })
    }

    fn authorize_read(&self, principal: &Principal) -> Result<(), UserError> {
        if self.may_manage(principal) {
            Ok(())
        } else {
            Err(UserError::Forbidden)
        }
    }

    fn matches(&self, query: &AccountQuery, principal: &Principal) -> bool {
        match query {
            AccountQuery::All => principal.is_privileged(),
            AccountQuery::Email(email) => {
                *principal == Principal::System && self.profile.email == normalize_email(email)
            }
            AccountQuery::Token(token) => {
                *principal == Principal::System && self.tokens.iter().any(|t| t == token)
            }
        }
    }

    async fn on_update(
        &mut self,
        update: AccountUpdate,
        principal: &Principal,
        _ctx: &(),
    ) -> Result<(), UserError> {
        if !self.may_manage(principal) {
            return Err(UserError::Forbidden);
        }
        if let Some(name) = update.name {
            self.profile.name = valid_name(&name)?;
        }
        if let Some(email) = update.email {
            self.profile.email = valid_email(&email)?;
        }
        if let Some(password) = update.password.filter(|p| !p.is_empty()) {
            self.password_digest = digest(&self.profile.id, valid_password(&password)?);
        }
        Ok(())
    }

    async fn on_delete(&self, principal: &Principal, _ctx: &()) -> Result<(), UserError> {
        if principal.is(&self.profile.id) && principal.is_privileged() {
            return Err(UserError::CannotDeleteSelf);
        }
        if !principal.is_privileged() {
            return Err(UserError::Forbidden);
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: AccountAction,
        principal: &Principal,
        _ctx: &(),
    ) -> Result<AccountActionResult, UserError> {
        match action {
            AccountAction::Authenticate { password } => {
                if digest(&self.profile.id, &password) != self.password_digest {
                    return Err(UserError::WrongPassword);
                }
                Ok(AccountActionResult::Authenticate(self.issue_token()))
            }
            AccountAction::IssueToken => {
                if !self.may_manage(principal) {
                    return Err(UserError::Forbidden);
                }
                Ok(AccountActionResult::IssueToken(self.issue_token()))
            }
            AccountAction::Promote => {
                if !principal.is_privileged() {
                    return Err(UserError::Forbidden);
                }
                if self.profile.is_admin {
                    return Err(UserError::AlreadyAdmin);
                }
                self.profile.is_admin = true;
                Ok(AccountActionResult::Promote(self.profile.clone()))
            }
        }
    }
}
