//! C-ABI wrapper around `httpkit-core`.
//!
//! # Overview
//! Lets a native host (URLSession delegate, OkHttp interceptor, libcurl
//! callback) consult the core from its own transport: redirect decisions,
//! certificate pinning, request building and response interpretation.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Decisions (`httpkit_should_follow_redirect`, `httpkit_evaluate_trust`)
//!   fail closed: null arguments or a caught panic yield "do not follow" /
//!   `Reject`.
//! - Interpretation returns a single `FfiApiResult` envelope carrying an
//!   error code per error case and the three rendered messages.
//! - The C caller owns all returned pointers and must call the matching
//!   `httpkit_free_*` function to release them.

pub mod types;

use std::os::raw::c_char;
use std::panic::catch_unwind;

use httpkit_core::interpret::error_at_pointer;
use httpkit_core::redirect::RedirectPolicy;
use httpkit_core::{ApiClient, CertificateDer, ClientConfig};
use serde_json::Value;

use types::*;

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create an `ApiClient` from a JSON configuration document, e.g.
/// `{"api_label": "Gmail", "base_url": "https://gmail.googleapis.com"}`.
///
/// Returns null if `config_json` is null or invalid, or if an internal panic
/// occurs. The caller must free the returned pointer with
/// `httpkit_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_client_new(config_json: *const c_char) -> *mut FfiApiClient {
    catch_unwind(|| {
        let Some(json) = (unsafe { opt_str(config_json) }) else {
            return std::ptr::null_mut();
        };
        match ClientConfig::from_json_str(json) {
            Ok(config) => Box::into_raw(Box::new(FfiApiClient {
                inner: ApiClient::new(&config),
            })),
            Err(err) => {
                tracing::warn!(%err, "rejected client configuration");
                std::ptr::null_mut()
            }
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `httpkit_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_client_free(client: *mut FfiApiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Transport decisions
// ---------------------------------------------------------------------------

/// Whether to follow a redirect under the client's configured mode.
///
/// `source` and `destination` are nullable URL strings; null means absent.
/// Returns false if `client` is null.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_should_follow_redirect(
    client: *const FfiApiClient,
    source: *const c_char,
    destination: *const c_char,
) -> bool {
    catch_unwind(|| {
        if client.is_null() {
            return false;
        }
        let client = unsafe { &*client };
        let (source, destination) = unsafe { (opt_str(source), opt_str(destination)) };
        client
            .inner
            .redirect_policy()
            .should_follow_str(source, destination)
    })
    .unwrap_or(false)
}

/// Whether to follow a redirect under `mode` (an `FfiRedirectMode` value),
/// without a client. Unknown modes never follow.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_redirect_should_follow(
    mode: u32,
    source: *const c_char,
    destination: *const c_char,
) -> bool {
    catch_unwind(|| {
        let Some(mode) = redirect_mode_from_raw(mode) else {
            return false;
        };
        let (source, destination) = unsafe { (opt_str(source), opt_str(destination)) };
        RedirectPolicy::new(mode).should_follow_str(source, destination)
    })
    .unwrap_or(false)
}

/// Apply the client's pinning to the DER-encoded leaf certificate.
///
/// `system_trusted` is the verdict of the platform's standard trust
/// evaluation. A null `leaf_der` is an empty chain.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_evaluate_trust(
    client: *const FfiApiClient,
    leaf_der: *const u8,
    leaf_len: usize,
    system_trusted: bool,
) -> FfiTrustDecision {
    catch_unwind(|| {
        if client.is_null() {
            return FfiTrustDecision::Reject;
        }
        let client = unsafe { &*client };
        let chain: Vec<CertificateDer<'_>> = unsafe { opt_bytes(leaf_der, leaf_len) }
            .map(CertificateDer::from)
            .into_iter()
            .collect();
        client.inner.evaluate_trust(&chain, system_trusted).into()
    })
    .unwrap_or(FfiTrustDecision::Reject)
}

/// Base64 SHA-256 of the certificate's SubjectPublicKeyInfo, the value a
/// `public_key_hashes` pin is compared against.
///
/// Returns null if `der` is null or not a certificate. Free the result with
/// `httpkit_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_spki_sha256_base64(der: *const u8, len: usize) -> *mut c_char {
    catch_unwind(|| {
        unsafe { opt_bytes(der, len) }
            .and_then(httpkit_core::pinning::spki_sha256_base64)
            .map_or(std::ptr::null_mut(), |hash| to_c_string(hash))
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Build a GET request for `path` relative to the client's base URL.
///
/// Returns null if `client` or `path` is null.
/// The caller must free the returned pointer with `httpkit_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_build_get(
    client: *const FfiApiClient,
    path: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let Some(path) = (unsafe { opt_str(path) }) else {
            return std::ptr::null_mut();
        };
        FfiHttpRequest::from_core(client.inner.build_get(path))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build a POST request carrying `json_body` with a JSON content type.
///
/// Returns null if any argument is null or `json_body` is not valid JSON.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_build_post_json(
    client: *const FfiApiClient,
    path: *const c_char,
    json_body: *const c_char,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Some(path), Some(json_body)) = (unsafe { (opt_str(path), opt_str(json_body)) }) else {
            return std::ptr::null_mut();
        };
        let body: Value = match serde_json::from_str(json_body) {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(%err, "request body is not valid JSON");
                return std::ptr::null_mut();
            }
        };
        match client.inner.build_post_json(path, &body) {
            Ok(req) => FfiHttpRequest::from_core(req),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Interpret response functions
// ---------------------------------------------------------------------------

/// Interpret an exchange whose successful response is a JSON payload.
///
/// Only status 200 is accepted. On success `data` holds the parsed body
/// re-serialized as JSON text. `error_pointer` is an optional JSON pointer
/// (e.g. `/error`) at which error responses carry a server message.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_interpret_json(
    client: *const FfiApiClient,
    operation_label: *const c_char,
    response: *const FfiHttpResponse,
    error_pointer: *const c_char,
) -> *mut FfiApiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiApiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiApiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let Some(operation_label) = (unsafe { opt_str(operation_label) }) else {
            return FfiApiResult::null_arg("operation_label");
        };
        let outcome = unsafe { (*response).to_outcome() };
        let error_pointer = unsafe { opt_str(error_pointer) };

        let result = client.inner.interpret_json_with_errors(
            operation_label,
            &outcome,
            |value: &Value| serde_json::to_string(value).ok(),
            |value: &Value| error_pointer.and_then(|pointer| error_at_pointer(pointer)(value)),
        );
        match result {
            Ok(json) => FfiApiResult::ok(Some(json)),
            Err(err) => FfiApiResult::from_error(&client.inner, &err),
        }
    })
    .unwrap_or_else(|_| FfiApiResult::panic("panic in httpkit_interpret_json"))
}

/// Interpret an exchange whose successful response body is irrelevant.
///
/// Any of 200, 201, 202 or 204 succeeds with null `data`.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_interpret_ignoring_body(
    client: *const FfiApiClient,
    operation_label: *const c_char,
    response: *const FfiHttpResponse,
    error_pointer: *const c_char,
) -> *mut FfiApiResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiApiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiApiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let Some(operation_label) = (unsafe { opt_str(operation_label) }) else {
            return FfiApiResult::null_arg("operation_label");
        };
        let outcome = unsafe { (*response).to_outcome() };
        let error_pointer = unsafe { opt_str(error_pointer) };

        let extract = |value: &Value| {
            error_pointer.and_then(|pointer| error_at_pointer(pointer)(value))
        };
        let result = client
            .inner
            .interpret_ignoring_body(operation_label, &outcome, extract);
        match result {
            Ok(()) => FfiApiResult::ok(None),
            Err(err) => FfiApiResult::from_error(&client.inner, &err),
        }
    })
    .unwrap_or_else(|_| FfiApiResult::panic("panic in httpkit_interpret_ignoring_body"))
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by any `httpkit_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiHttpRequest::free(req) });
}

/// Free an `FfiApiResult` returned by any `httpkit_interpret_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_free_result(result: *mut FfiApiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| unsafe { FfiApiResult::free(result) });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn httpkit_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| unsafe { free_c_string(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
