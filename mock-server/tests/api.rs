use axum::http::{self, Request, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use mock_server::{app, ErrorBody, Filter, Profile, SECURE_REDIRECT_TARGET};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

fn login_request(username: &str, password: &str) -> Request<String> {
    let credentials = STANDARD.encode(format!("{username}:{password}"));
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(http::header::AUTHORIZATION, format!("Basic {credentials}"))
        .body(String::new())
        .unwrap()
}

fn content_type(response: &axum::response::Response) -> Option<&str> {
    response
        .headers()
        .get(http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

// --- payload shapes ---

#[tokio::test]
async fn profile_is_plain_json() {
    let resp = app().oneshot(get("/profile")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), Some("application/json"));
    let profile: Profile = body_json(resp).await;
    assert_eq!(profile.name, "Ada Lovelace");
}

#[tokio::test]
async fn profile_html_is_not_json() {
    let resp = app().oneshot(get("/profile.html")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), Some("text/html"));
}

#[tokio::test]
async fn charset_parameter_is_sent_verbatim() {
    let resp = app().oneshot(get("/profile/charset")).await.unwrap();
    assert_eq!(content_type(&resp), Some("application/json; charset=utf-8"));
    let profile: Profile = body_json(resp).await;
    assert_eq!(profile.email, "ada@example.test");
}

#[tokio::test]
async fn broken_body_does_not_parse() {
    let resp = app().oneshot(get("/broken")).await.unwrap();
    assert_eq!(content_type(&resp), Some("application/json"));
    let bytes = body_bytes(resp).await;
    assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());
}

// --- error statuses ---

#[tokio::test]
async fn missing_carries_json_error() {
    let resp = app().oneshot(get("/missing")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = body_json(resp).await;
    assert_eq!(body.error, "no such resource");
}

#[tokio::test]
async fn missing_html_is_not_json() {
    let resp = app().oneshot(get("/missing.html")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&resp), Some("text/html"));
}

#[tokio::test]
async fn rate_limited_has_empty_body() {
    let resp = app().oneshot(get("/rate-limited")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn unavailable_carries_json_error() {
    let resp = app().oneshot(get("/unavailable")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: ErrorBody = body_json(resp).await;
    assert_eq!(body.error, "down for maintenance");
}

// --- redirects ---

#[tokio::test]
async fn plain_redirect_points_at_profile() {
    let resp = app().oneshot(get("/redirect/plain")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.headers()[http::header::LOCATION], "/profile");
}

#[tokio::test]
async fn secure_redirect_points_at_https() {
    let resp = app().oneshot(get("/redirect/secure")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[http::header::LOCATION], SECURE_REDIRECT_TARGET);
}

// --- login ---

#[tokio::test]
async fn login_accepts_valid_credentials() {
    let resp = app().oneshot(login_request("ada", "correct")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let resp = app().oneshot(login_request("ada", "wrong")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: ErrorBody = body_json(resp).await;
    assert_eq!(body.error, "incorrect password");
}

#[tokio::test]
async fn login_without_credentials_is_unauthorized() {
    let resp = app()
        .oneshot(Request::builder().method("POST").uri("/login").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- filters ---

#[tokio::test]
async fn create_filter_rejects_blank_criteria() {
    let resp = app()
        .oneshot(json_request("POST", "/filters", r#"{"criteria":"  "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorBody = body_json(resp).await;
    assert_eq!(body.error, "criteria is required");
}

#[tokio::test]
async fn delete_unknown_filter_is_404_json() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/filters/00000000-0000-0000-0000-000000000000")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&resp), Some("application/json"));
}

#[tokio::test]
async fn filter_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(json_request("POST", "/filters", r#"{"criteria":"from:ada"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Filter = body_json(resp).await;
    assert_eq!(created.criteria, "from:ada");

    let resp = ServiceExt::ready(&mut app).await.unwrap().call(get("/filters")).await.unwrap();
    let filters: Vec<Filter> = body_json(resp).await;
    assert_eq!(filters, vec![created.clone()]);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(
            Request::builder()
                .method("DELETE")
                .uri(format!("/filters/{}", created.id))
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ServiceExt::ready(&mut app).await.unwrap().call(get("/filters")).await.unwrap();
    let filters: Vec<Filter> = body_json(resp).await;
    assert!(filters.is_empty());
}
