//! Stateless request builder and response interpreter for one remote API.
//!
//! # Design
//! `ApiClient` holds only configuration resolved at construction (labels,
//! base URL, redirect policy, trust validator, message catalog) and carries
//! no mutable state between calls. Each call is split into a `build_*`
//! method that produces an `HttpRequest` and an `interpret_*` method that
//! consumes the `ExchangeOutcome`; the host executes the round-trip in
//! between and consults `should_follow_redirect` / `evaluate_trust` from its
//! transport callbacks.

use rustls::pki_types::CertificateDer;
use rustls::RootCertStore;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiResult, ErrorCatalog, OperationLabels};
use crate::http::{HttpMethod, HttpRequest};
use crate::interpret::{self, ExchangeOutcome, DEFAULT_ACCEPTED_STATUS_CODES};
use crate::pinning::{PinnedServerCertVerifier, TrustDecision, TrustSetupError, TrustValidator};
use crate::redirect::RedirectPolicy;

#[derive(Debug, Clone)]
pub struct ApiClient {
    api_label: String,
    base_url: String,
    redirects: RedirectPolicy,
    trust: TrustValidator,
    catalog: ErrorCatalog,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            api_label: config.api_label.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            redirects: RedirectPolicy::new(config.redirects),
            trust: TrustValidator::new(config.pinning.resolve()),
            catalog: ErrorCatalog::new(config.app_name.clone()),
        }
    }

    pub fn api_label(&self) -> &str {
        &self.api_label
    }

    pub fn catalog(&self) -> &ErrorCatalog {
        &self.catalog
    }

    pub fn redirect_policy(&self) -> RedirectPolicy {
        self.redirects
    }

    pub fn trust_validator(&self) -> &TrustValidator {
        &self.trust
    }

    pub fn labels(&self, operation_label: &str) -> OperationLabels {
        OperationLabels::new(self.api_label.clone(), operation_label)
    }

    /// Joins `path` onto the base URL. Absolute `http`/`https` URLs with a
    /// host pass through unchanged; anything else, including paths like
    /// `values:batchGet` that parse with a made-up scheme, is joined.
    pub fn url(&self, path: &str) -> String {
        if is_absolute_http_url(path) {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn build_get(&self, path: &str) -> HttpRequest {
        HttpRequest::get(self.url(path))
    }

    pub fn build_post_json<B>(&self, path: &str, body: &B) -> Result<HttpRequest, serde_json::Error>
    where
        B: Serialize + ?Sized,
    {
        HttpRequest::new(HttpMethod::Post, self.url(path)).with_json_body(body)
    }

    /// Interprets a JSON exchange accepting only status 200 and ignoring any
    /// server-supplied error message.
    pub fn interpret_json<T, D>(
        &self,
        operation_label: &str,
        outcome: &ExchangeOutcome,
        decode: D,
    ) -> ApiResult<T>
    where
        D: FnOnce(&Value) -> Option<T>,
    {
        self.interpret_json_with_errors(
            operation_label,
            outcome,
            decode,
            interpret::no_error_message,
        )
    }

    pub fn interpret_json_with_errors<T, D, X>(
        &self,
        operation_label: &str,
        outcome: &ExchangeOutcome,
        decode: D,
        extract_server_error: X,
    ) -> ApiResult<T>
    where
        D: FnOnce(&Value) -> Option<T>,
        X: FnOnce(&Value) -> Option<String>,
    {
        interpret::interpret_json(
            outcome,
            &self.labels(operation_label),
            &DEFAULT_ACCEPTED_STATUS_CODES,
            decode,
            extract_server_error,
        )
    }

    pub fn interpret_ignoring_body<X>(
        &self,
        operation_label: &str,
        outcome: &ExchangeOutcome,
        extract_server_error: X,
    ) -> ApiResult<()>
    where
        X: FnOnce(&Value) -> Option<String>,
    {
        interpret::interpret_ignoring_body(
            outcome,
            &self.labels(operation_label),
            extract_server_error,
        )
    }

    pub fn should_follow_redirect(&self, source: Option<&Url>, destination: Option<&Url>) -> bool {
        self.redirects.should_follow(source, destination)
    }

    pub fn evaluate_trust(
        &self,
        chain: &[CertificateDer<'_>],
        system_trusted: bool,
    ) -> TrustDecision {
        self.trust.evaluate(chain, system_trusted)
    }

    /// rustls verifier enforcing this client's pins on top of `roots`.
    pub fn server_cert_verifier(
        &self,
        roots: RootCertStore,
    ) -> Result<PinnedServerCertVerifier, TrustSetupError> {
        PinnedServerCertVerifier::new(roots, self.trust.clone())
    }
}

fn is_absolute_http_url(path: &str) -> bool {
    Url::parse(path)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}
