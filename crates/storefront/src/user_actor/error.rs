use thiserror::Error;

/// Errors that can occur during account operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),

    /// A field failed validation.
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("User already exists")]
    EmailTaken,

    /// Unknown email at login.
    #[error("User not found")]
    UnknownEmail,

    #[error("Invalid password")]
    WrongPassword,

    #[error("Not authorized")]
    Forbidden,

    #[error("User is already an admin")]
    AlreadyAdmin,

    #[error("You cannot delete your own account")]
    CannotDeleteSelf,

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl UserError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        UserError::Validation {
            field,
            message: message.into(),
        }
    }
}
