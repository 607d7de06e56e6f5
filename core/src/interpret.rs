//! Classification of a completed HTTP exchange into a payload or an error.
//!
//! # Design
//! The decision order is fixed:
//! 1. a transport error wins over every other signal;
//! 2. neither status nor transport error is the defensive "unexpected" case;
//! 3. an accepted status is decoded (JSON content type, JSON parse, caller
//!    decoder), or succeeds outright when the caller ignores the body;
//! 4. an error status (> 399) with a JSON body may carry a server message;
//! 5. anything else is reported by status code.
//!
//! JSON detection compares the raw content type literally against
//! `application/json` and `text/json`; parameters such as
//! `; charset=utf-8` are not stripped.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiResult, HttpApiError, OperationLabels};
use crate::http::HttpResponse;

pub const JSON_CONTENT_TYPES: [&str; 2] = ["application/json", "text/json"];

/// Statuses accepted when the caller ignores the response body.
pub const ACCEPTED_WITHOUT_BODY: [u16; 4] = [200, 201, 202, 204];

/// Statuses accepted for a JSON payload unless the caller says otherwise.
pub const DEFAULT_ACCEPTED_STATUS_CODES: [u16; 1] = [200];

/// A transport failure that happened before any HTTP response arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    description: String,
}

impl TransportError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    pub fn from_error<E: std::error::Error + ?Sized>(error: &E) -> Self {
        Self::new(error.to_string())
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Terminal state of one HTTP request attempt as the transport reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeOutcome {
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub body: Option<Vec<u8>>,
    pub transport_error: Option<TransportError>,
}

impl ExchangeOutcome {
    pub fn response(status: u16, content_type: Option<&str>, body: Option<Vec<u8>>) -> Self {
        Self {
            status: Some(status),
            content_type: content_type.map(str::to_owned),
            body,
            transport_error: None,
        }
    }

    pub fn transport_failure(error: TransportError) -> Self {
        Self {
            transport_error: Some(error),
            ..Self::default()
        }
    }
}

impl From<HttpResponse> for ExchangeOutcome {
    fn from(response: HttpResponse) -> Self {
        let content_type = response.content_type().map(str::to_owned);
        Self {
            status: Some(response.status),
            content_type,
            body: Some(response.body),
            transport_error: None,
        }
    }
}

impl From<TransportError> for ExchangeOutcome {
    fn from(error: TransportError) -> Self {
        Self::transport_failure(error)
    }
}

pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|content_type| JSON_CONTENT_TYPES.contains(&content_type))
}

/// Interprets an exchange whose successful response carries a JSON payload.
///
/// `decode` runs only for an accepted status with a JSON content type and a
/// body that parses as JSON; `extract_server_error` runs only for a status
/// above 399 with a JSON content type and a parseable body.
pub fn interpret_json<T, D, X>(
    outcome: &ExchangeOutcome,
    labels: &OperationLabels,
    accepted_status_codes: &[u16],
    decode: D,
    extract_server_error: X,
) -> ApiResult<T>
where
    D: FnOnce(&Value) -> Option<T>,
    X: FnOnce(&Value) -> Option<String>,
{
    let status = received_status(outcome, labels)?;
    if accepted_status_codes.contains(&status) {
        return decode_payload(outcome, labels, decode);
    }
    Err(reject_status(outcome, labels, status, extract_server_error))
}

/// Interprets an exchange whose successful response body is irrelevant.
/// Any of 200, 201, 202 or 204 succeeds.
pub fn interpret_ignoring_body<X>(
    outcome: &ExchangeOutcome,
    labels: &OperationLabels,
    extract_server_error: X,
) -> ApiResult<()>
where
    X: FnOnce(&Value) -> Option<String>,
{
    let status = received_status(outcome, labels)?;
    if ACCEPTED_WITHOUT_BODY.contains(&status) {
        return Ok(());
    }
    Err(reject_status(outcome, labels, status, extract_server_error))
}

/// Decoder that deserializes the JSON value into `T`, absent on mismatch.
pub fn decode_with<T: DeserializeOwned>() -> impl Fn(&Value) -> Option<T> {
    |value| T::deserialize(value).ok()
}

/// Extractor that reads a string at an RFC 6901 JSON pointer, e.g. `/error`.
pub fn error_at_pointer(pointer: &str) -> impl Fn(&Value) -> Option<String> + '_ {
    move |value| value.pointer(pointer).and_then(Value::as_str).map(str::to_owned)
}

/// Extractor for APIs whose error bodies carry no message.
pub fn no_error_message(_: &Value) -> Option<String> {
    None
}

fn received_status(outcome: &ExchangeOutcome, labels: &OperationLabels) -> ApiResult<u16> {
    if let Some(error) = &outcome.transport_error {
        tracing::debug!(api = %labels.api_label, %error, "transport failure");
        return Err(HttpApiError::connection(labels, error.description()));
    }
    outcome.status.ok_or_else(|| {
        tracing::warn!(
            api = %labels.api_label,
            "transport returned neither a response nor an error"
        );
        HttpApiError::unexpected_transport_response(labels)
    })
}

fn decode_payload<T, D>(
    outcome: &ExchangeOutcome,
    labels: &OperationLabels,
    decode: D,
) -> ApiResult<T>
where
    D: FnOnce(&Value) -> Option<T>,
{
    let content_type = outcome.content_type.as_deref();
    if !is_json_content_type(content_type) {
        tracing::debug!(api = %labels.api_label, content_type, "response is not JSON");
        return Err(HttpApiError::response_not_json(labels, outcome.content_type.clone()));
    }
    let json = outcome
        .body
        .as_deref()
        .and_then(|body| serde_json::from_slice::<Value>(body).ok())
        .ok_or_else(|| {
            tracing::debug!(api = %labels.api_label, "response body is not valid JSON");
            HttpApiError::interpret_response(labels)
        })?;
    decode(&json).ok_or_else(|| {
        tracing::debug!(api = %labels.api_label, "decoder rejected the response");
        HttpApiError::interpret_response(labels)
    })
}

fn reject_status<X>(
    outcome: &ExchangeOutcome,
    labels: &OperationLabels,
    status: u16,
    extract_server_error: X,
) -> HttpApiError
where
    X: FnOnce(&Value) -> Option<String>,
{
    if status > 399 {
        if let Some(message) = server_error_message(outcome, extract_server_error) {
            return HttpApiError::error_message_from_server(labels, Some(message.as_str()));
        }
    }
    tracing::debug!(api = %labels.api_label, status, "unaccepted status code");
    HttpApiError::status_code(labels, status)
}

/// Non-JSON error bodies are never handed to the extractor.
fn server_error_message<X>(outcome: &ExchangeOutcome, extract_server_error: X) -> Option<String>
where
    X: FnOnce(&Value) -> Option<String>,
{
    if !is_json_content_type(outcome.content_type.as_deref()) {
        return None;
    }
    let json: Value = serde_json::from_slice(outcome.body.as_deref()?).ok()?;
    extract_server_error(&json)
}
