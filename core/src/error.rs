//! Error taxonomy and user-facing messages for HTTP API calls.
//!
//! # Design
//! Every failure a caller can observe is one `HttpApiError` case. Each case
//! carries the remote service's display name (`api_label`) and a description
//! of the attempted action (`operation_label`); both are used verbatim when
//! rendering messages and are never re-derived.
//!
//! Rendering lives in `ErrorCatalog` so the host can substitute its own
//! application name. `HttpApiError`'s own message methods use the default
//! catalog.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sentence::convert_to_sentence;

/// Application name used when the host does not configure one.
pub const DEFAULT_APP_NAME: &str = "App";

/// Result of interpreting one HTTP exchange.
pub type ApiResult<T> = Result<T, HttpApiError>;

/// Human-facing labels identifying the remote service and the attempted
/// action, e.g. `"Gmail"` / `"retrieve the account profile"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationLabels {
    pub api_label: String,
    pub operation_label: String,
}

impl OperationLabels {
    pub fn new(api_label: impl Into<String>, operation_label: impl Into<String>) -> Self {
        Self {
            api_label: api_label.into(),
            operation_label: operation_label.into(),
        }
    }
}

/// Which kind of identifier the server rejected alongside the password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsernameKind {
    Username,
    EmailAddress,
}

impl UsernameKind {
    fn noun(self) -> &'static str {
        match self {
            UsernameKind::Username => "username",
            UsernameKind::EmailAddress => "email address",
        }
    }
}

/// Closed set of failures produced while talking to an HTTP API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpApiError {
    /// Transport-level failure before any HTTP response was received.
    Connection {
        api_label: String,
        operation_label: String,
        cause: String,
    },

    /// Unaccepted status code and no usable server error message.
    StatusCode {
        api_label: String,
        operation_label: String,
        status: u16,
    },

    /// Accepted status, but the body could not be parsed into the payload.
    InterpretResponse {
        api_label: String,
        operation_label: String,
    },

    /// Error status with a server-supplied message in the body.
    ErrorMessageFromServer {
        api_label: String,
        operation_label: String,
        message: Option<String>,
    },

    /// The transport returned neither a response nor an error.
    UnexpectedTransportResponse {
        api_label: String,
        operation_label: String,
    },

    /// A required stored credential could not be retrieved.
    CredentialRetrievalFailed {
        api_label: String,
        operation_label: String,
    },

    /// The server rejected the username/email and password combination.
    IncorrectPassword {
        api_label: String,
        operation_label: String,
        username_kind: UsernameKind,
    },

    /// Accepted status, but the content type is not a recognized JSON type.
    ResponseNotJson {
        api_label: String,
        operation_label: String,
        content_type: Option<String>,
    },
}

impl HttpApiError {
    pub fn connection(labels: &OperationLabels, cause: impl Into<String>) -> Self {
        HttpApiError::Connection {
            api_label: labels.api_label.clone(),
            operation_label: labels.operation_label.clone(),
            cause: cause.into(),
        }
    }

    pub fn status_code(labels: &OperationLabels, status: u16) -> Self {
        HttpApiError::StatusCode {
            api_label: labels.api_label.clone(),
            operation_label: labels.operation_label.clone(),
            status,
        }
    }

    pub fn interpret_response(labels: &OperationLabels) -> Self {
        HttpApiError::InterpretResponse {
            api_label: labels.api_label.clone(),
            operation_label: labels.operation_label.clone(),
        }
    }

    /// The message is normalized with [`convert_to_sentence`]; an empty
    /// message is stored as absent.
    pub fn error_message_from_server(labels: &OperationLabels, message: Option<&str>) -> Self {
        HttpApiError::ErrorMessageFromServer {
            api_label: labels.api_label.clone(),
            operation_label: labels.operation_label.clone(),
            message: convert_to_sentence(message),
        }
    }

    pub fn unexpected_transport_response(labels: &OperationLabels) -> Self {
        HttpApiError::UnexpectedTransportResponse {
            api_label: labels.api_label.clone(),
            operation_label: labels.operation_label.clone(),
        }
    }

    pub fn credential_retrieval_failed(labels: &OperationLabels) -> Self {
        HttpApiError::CredentialRetrievalFailed {
            api_label: labels.api_label.clone(),
            operation_label: labels.operation_label.clone(),
        }
    }

    pub fn incorrect_password(labels: &OperationLabels, username_kind: UsernameKind) -> Self {
        HttpApiError::IncorrectPassword {
            api_label: labels.api_label.clone(),
            operation_label: labels.operation_label.clone(),
            username_kind,
        }
    }

    pub fn response_not_json(labels: &OperationLabels, content_type: Option<String>) -> Self {
        HttpApiError::ResponseNotJson {
            api_label: labels.api_label.clone(),
            operation_label: labels.operation_label.clone(),
            content_type,
        }
    }

    pub fn api_label(&self) -> &str {
        match self {
            HttpApiError::Connection { api_label, .. }
            | HttpApiError::StatusCode { api_label, .. }
            | HttpApiError::InterpretResponse { api_label, .. }
            | HttpApiError::ErrorMessageFromServer { api_label, .. }
            | HttpApiError::UnexpectedTransportResponse { api_label, .. }
            | HttpApiError::CredentialRetrievalFailed { api_label, .. }
            | HttpApiError::IncorrectPassword { api_label, .. }
            | HttpApiError::ResponseNotJson { api_label, .. } => api_label,
        }
    }

    pub fn operation_label(&self) -> &str {
        match self {
            HttpApiError::Connection { operation_label, .. }
            | HttpApiError::StatusCode { operation_label, .. }
            | HttpApiError::InterpretResponse { operation_label, .. }
            | HttpApiError::ErrorMessageFromServer { operation_label, .. }
            | HttpApiError::UnexpectedTransportResponse { operation_label, .. }
            | HttpApiError::CredentialRetrievalFailed { operation_label, .. }
            | HttpApiError::IncorrectPassword { operation_label, .. }
            | HttpApiError::ResponseNotJson { operation_label, .. } => operation_label,
        }
    }

    /// HTTP status carried by the error, if the failure was status-driven.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpApiError::StatusCode { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn short_message(&self) -> String {
        ErrorCatalog::default().short_message(self)
    }

    pub fn detailed_message(&self) -> String {
        ErrorCatalog::default().detailed_message(self)
    }

    pub fn combined_message(&self) -> String {
        ErrorCatalog::default().combined_message(self)
    }
}

impl fmt::Display for HttpApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.combined_message())
    }
}

impl std::error::Error for HttpApiError {}

/// Renders `HttpApiError` values as short, detailed, and combined messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCatalog {
    app_name: String,
}

impl Default for ErrorCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_APP_NAME)
    }
}

impl ErrorCatalog {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// `"Unable to {operation_label}"` for every case.
    pub fn short_message(&self, error: &HttpApiError) -> String {
        format!("Unable to {}", error.operation_label())
    }

    pub fn detailed_message(&self, error: &HttpApiError) -> String {
        match error {
            HttpApiError::Connection {
                api_label, cause, ..
            } => format!("Could not connect to {api_label}. {cause}"),
            HttpApiError::StatusCode {
                api_label, status, ..
            } => status_code_message(api_label, *status),
            HttpApiError::InterpretResponse { api_label, .. } => {
                format!("{api_label} returned a response that could not be parsed.")
            }
            HttpApiError::ErrorMessageFromServer {
                api_label, message, ..
            } => convert_to_sentence(message.as_deref())
                .unwrap_or_else(|| format!("{api_label} did not provide an error message.")),
            HttpApiError::UnexpectedTransportResponse { api_label, .. } => format!(
                "An unexpected transport-level error occurred when communicating with {api_label}."
            ),
            HttpApiError::CredentialRetrievalFailed { .. } => {
                "The stored credential was not found.".to_string()
            }
            HttpApiError::IncorrectPassword {
                api_label,
                username_kind,
                ..
            } => format!(
                "{api_label} rejected the {} and password combination.",
                username_kind.noun()
            ),
            HttpApiError::ResponseNotJson {
                api_label,
                content_type,
                ..
            } => match content_type {
                Some(content_type) => format!(
                    "{api_label} returned a response with a MIME type of {content_type}. {} expected JSON.",
                    self.app_name
                ),
                None => format!(
                    "{api_label} returned a response without a Content-Type header. {} expected JSON.",
                    self.app_name
                ),
            },
        }
    }

    /// Short and detailed messages joined as `"{short}. {detailed}"`.
    pub fn combined_message(&self, error: &HttpApiError) -> String {
        format!(
            "{}. {}",
            self.short_message(error),
            self.detailed_message(error)
        )
    }
}

/// Branches are order-dependent: rate limiting and not-found win over the
/// generic 4xx range, and redirect codes are only reached below 400.
fn status_code_message(api_label: &str, status: u16) -> String {
    match status {
        420 | 429 => format!(
            "{api_label} rejected the request because too many requests have been sent within a short period of time."
        ),
        404 => format!("{api_label} rejected the request (not found)."),
        401 | 403 => format!(
            "{api_label} did not accept the credentials. Please try logging out and logging back in."
        ),
        400..=499 => format!("{api_label} rejected the request (status code {status})."),
        500.. => format!("{api_label} reported an internal server error (status code {status})."),
        301 | 302 | 303 | 307 | 308 => format!("{api_label} responded with a redirect."),
        _ => format!("{api_label} returned an unexpected status code ({status})."),
    }
}
