//! Local HTTP API used to exercise the client core end to end.
//!
//! Every route reproduces one response shape the interpreter has to classify:
//! JSON payloads, non-JSON payloads, malformed JSON, JSON error bodies,
//! bare error statuses, redirects and basic-auth protected endpoints.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Credentials accepted by `POST /login`.
pub const VALID_USERNAME: &str = "ada";
pub const VALID_PASSWORD: &str = "correct";

/// Redirect target that no test server listens on.
pub const SECURE_REDIRECT_TARGET: &str = "https://localhost:9/profile";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: Uuid,
    pub criteria: String,
}

#[derive(Deserialize)]
pub struct CreateFilter {
    pub criteria: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Filter>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/profile", get(profile))
        .route("/profile.html", get(profile_html))
        .route("/profile/charset", get(profile_with_charset))
        .route("/broken", get(broken_json))
        .route("/missing", get(missing))
        .route("/missing.html", get(missing_html))
        .route("/rate-limited", get(rate_limited))
        .route("/unavailable", get(unavailable))
        .route("/filters", get(list_filters).post(create_filter))
        .route("/filters/{id}", delete(delete_filter))
        .route("/login", post(login))
        .route("/redirect/plain", get(redirect_plain))
        .route("/redirect/secure", get(redirect_secure))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn ada() -> Profile {
    Profile {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.test".to_string(),
    }
}

fn error_body(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

async fn profile() -> Json<Profile> {
    Json(ada())
}

async fn profile_html() -> Response {
    (
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body>Ada Lovelace</body></html>",
    )
        .into_response()
}

async fn profile_with_charset() -> Response {
    let body = serde_json::to_string(&ada()).unwrap_or_default();
    ([(header::CONTENT_TYPE, "application/json; charset=utf-8")], body).into_response()
}

async fn broken_json() -> Response {
    ([(header::CONTENT_TYPE, "application/json")], "{\"name\": ").into_response()
}

async fn missing() -> (StatusCode, Json<ErrorBody>) {
    error_body(StatusCode::NOT_FOUND, "no such resource")
}

async fn missing_html() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/html")],
        "<html><body>not found</body></html>",
    )
        .into_response()
}

async fn rate_limited() -> StatusCode {
    StatusCode::TOO_MANY_REQUESTS
}

async fn unavailable() -> (StatusCode, Json<ErrorBody>) {
    error_body(StatusCode::SERVICE_UNAVAILABLE, "down for maintenance")
}

async fn list_filters(State(db): State<Db>) -> Json<Vec<Filter>> {
    let filters = db.read().await;
    Json(filters.values().cloned().collect())
}

async fn create_filter(
    State(db): State<Db>,
    Json(input): Json<CreateFilter>,
) -> Result<(StatusCode, Json<Filter>), (StatusCode, Json<ErrorBody>)> {
    if input.criteria.trim().is_empty() {
        return Err(error_body(StatusCode::UNPROCESSABLE_ENTITY, "criteria is required"));
    }
    let filter = Filter {
        id: Uuid::new_v4(),
        criteria: input.criteria,
    };
    tracing::debug!(id = %filter.id, "created filter");
    db.write().await.insert(filter.id, filter.clone());
    Ok((StatusCode::CREATED, Json(filter)))
}

async fn delete_filter(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, Json<ErrorBody>)> {
    let mut filters = db.write().await;
    filters
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| error_body(StatusCode::NOT_FOUND, "filter not found"))
}

async fn login(headers: HeaderMap) -> Result<StatusCode, (StatusCode, Json<ErrorBody>)> {
    let credentials = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok());

    match credentials.as_deref().and_then(|c| c.split_once(':')) {
        Some((VALID_USERNAME, VALID_PASSWORD)) => Ok(StatusCode::NO_CONTENT),
        Some((username, _)) => {
            tracing::debug!(%username, "rejected login");
            Err(error_body(StatusCode::UNAUTHORIZED, "incorrect password"))
        }
        None => Err(error_body(StatusCode::UNAUTHORIZED, "credentials required")),
    }
}

async fn redirect_plain() -> Response {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/profile")]).into_response()
}

async fn redirect_secure() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, SECURE_REDIRECT_TARGET)]).into_response()
}
