//! Normalization of remote failures into one error shape with a message fit for the
//! user and a per-field map for forms.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub const LOGIN_FAILED: &str = "Email or password is incorrect.";
pub const LOGIN_REQUIRED: &str = "Please log in to continue.";
pub const FORBIDDEN: &str = "You don't have permission to perform this action.";
pub const BAD_INPUT: &str = "Please check your input and try again.";
pub const NOT_FOUND: &str = "Not found.";
pub const SERVER_FAILED: &str = "Something went wrong on our side. Please try again.";
pub const NETWORK_FAILED: &str =
    "Unable to reach the server. Please check your connection and try again.";
pub const TIMED_OUT: &str = "The request timed out. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    Unauthorized,
    Forbidden,
    BadRequest,
    NotFound,
    Server,
    /// Any other non-success status.
    Status(u16),
    Network,
    Timeout,
    /// The response arrived but could not be decoded.
    Decode,
}

/// A normalized remote failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    pub field_errors: BTreeMap<String, String>,
}

/// Error body as sent by the backend. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub errors: Option<RawFieldErrors>,
}

impl ErrorBody {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    fn server_message(&self) -> Option<&str> {
        non_empty(self.message.as_deref()).or_else(|| non_empty(self.error.as_deref()))
    }
}

/// Validation errors: either a list of entries or a field → message object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawFieldErrors {
    List(Vec<FieldErrorEntry>),
    Map(BTreeMap<String, Value>),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldErrorEntry {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiError {
    /// Normalizes a non-success response.
    ///
    /// `is_login` marks the `/auth/login` endpoint, which gets credential-oriented
    /// messages and field hints.
    pub fn from_status(status: u16, body: ErrorBody, is_login: bool) -> Self {
        let server = body.server_message().map(str::to_string);
        let (kind, message) = match status {
            401 if is_login => (ApiErrorKind::Unauthorized, LOGIN_FAILED.to_string()),
            401 => (ApiErrorKind::Unauthorized, LOGIN_REQUIRED.to_string()),
            403 => (ApiErrorKind::Forbidden, FORBIDDEN.to_string()),
            400 => (
                ApiErrorKind::BadRequest,
                server.clone().unwrap_or_else(|| BAD_INPUT.to_string()),
            ),
            404 => (
                ApiErrorKind::NotFound,
                server.clone().unwrap_or_else(|| NOT_FOUND.to_string()),
            ),
            500.. if is_login => (ApiErrorKind::Server, LOGIN_FAILED.to_string()),
            500.. => (ApiErrorKind::Server, SERVER_FAILED.to_string()),
            other => (
                ApiErrorKind::Status(other),
                server
                    .clone()
                    .unwrap_or_else(|| format!("Request failed with status {other}.")),
            ),
        };

        let mut field_errors = normalize_field_errors(body.errors, server.as_deref());
        if is_login && field_errors.is_empty() {
            let hint = server.as_deref().unwrap_or_default().to_lowercase();
            if hint.contains("email") || hint.contains("user") || hint.contains("not found") {
                field_errors.insert("email".into(), "Incorrect email".into());
            } else {
                field_errors.insert("password".into(), "Incorrect password".into());
            }
        }

        Self {
            kind,
            message,
            field_errors,
        }
    }

    /// Normalizes a raw response body; unparseable bodies count as empty.
    pub fn from_response(status: u16, body: &str, is_login: bool) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();
        Self::from_status(status, parsed, is_login)
    }

    pub fn network(detail: impl std::fmt::Display) -> Self {
        tracing::debug!(%detail, "Transport failure");
        Self::plain(ApiErrorKind::Network, NETWORK_FAILED)
    }

    pub fn timeout() -> Self {
        Self::plain(ApiErrorKind::Timeout, TIMED_OUT)
    }

    pub fn decode(detail: impl std::fmt::Display) -> Self {
        tracing::warn!(%detail, "Undecodable response");
        Self::plain(ApiErrorKind::Decode, SERVER_FAILED)
    }

    fn plain(kind: ApiErrorKind, message: &str) -> Self {
        Self {
            kind,
            message: message.to_string(),
            field_errors: BTreeMap::new(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

fn normalize_field_errors(
    raw: Option<RawFieldErrors>,
    server: Option<&str>,
) -> BTreeMap<String, String> {
    match raw {
        None => BTreeMap::new(),
        Some(RawFieldErrors::List(entries)) => entries
            .into_iter()
            .map(|entry| {
                let key = [&entry.path, &entry.param, &entry.field]
                    .into_iter()
                    .find_map(|f| non_empty(f.as_deref()))
                    .unwrap_or("form");
                let message = [&entry.msg, &entry.message]
                    .into_iter()
                    .find_map(|f| non_empty(f.as_deref()))
                    .or(server)
                    .unwrap_or("Validation error");
                (key.to_string(), message.to_string())
            })
            .collect(),
        Some(RawFieldErrors::Map(map)) => map
            .into_iter()
            .map(|(field, value)| {
                let message = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (field, message)
            })
            .collect(),
    }
}

/// Blank strings count as absent.
fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.is_empty())
}

/// Errors that may wrap a remote failure.
///
/// The application container uses this to spot credential rejections in whatever
/// error a store returns.
pub trait RemoteFailure {
    fn api_error(&self) -> Option<&ApiError>;
}

impl RemoteFailure for ApiError {
    fn api_error(&self) -> Option<&ApiError> {
        Some(self)
    }
}
