use super::lifecycle::GuardError;
use crate::api::{ApiError, RemoteFailure};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    /// Refused locally; no request was sent.
    #[error(transparent)]
    Guard(#[from] GuardError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl RemoteFailure for OrderError {
    fn api_error(&self) -> Option<&ApiError> {
        match self {
            OrderError::Api(e) => Some(e),
            OrderError::Guard(_) => None,
        }
    }
}
