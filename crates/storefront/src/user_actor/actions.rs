//! Custom actions for the User actor.

use crate::model::User;

/// Account operations beyond CRUD.
#[derive(Debug, Clone)]
pub enum AccountAction {
    /// Verifies the password and issues a token.
    Authenticate { password: String },
    /// Issues a token without a password, for the system or the account itself.
    IssueToken,
    /// Grants admin rights.
    Promote,
}

/// Results from AccountActions - variants match 1:1 with AccountAction.
#[derive(Debug, Clone)]
pub enum AccountActionResult {
    Authenticate(String),
    IssueToken(String),
    Promote(User),
}

/// Filter for listing accounts.
#[derive(Debug, Clone)]
pub enum AccountQuery {
    All,
    /// Case-insensitive email match.
    Email(String),
    /// The account holding this bearer token.
    Token(String),
}
