//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type with C-compatible representations:
//! `*mut c_char` instead of `String`, pointer/length pairs instead of `Vec`,
//! and enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use httpkit_core::{
    ApiClient, ExchangeOutcome, HttpApiError, HttpMethod, HttpRequest, RedirectMode,
    TransportError, TrustDecision,
};

/// Opaque handle to an `ApiClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiApiClient {
    pub(crate) inner: ApiClient,
}

// ---------------------------------------------------------------------------
// Strings and byte buffers
// ---------------------------------------------------------------------------

/// Copies `s` into a heap C string. Interior NUL bytes are dropped.
pub(crate) fn to_c_string(s: impl Into<String>) -> *mut c_char {
    let mut s = s.into();
    s.retain(|c| c != '\0');
    CString::new(s).unwrap_or_default().into_raw()
}

/// Borrows a nullable, NUL-terminated UTF-8 string. Null and non-UTF-8
/// input both read as absent.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
pub(crate) unsafe fn opt_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

/// Borrows a nullable pointer/length byte buffer.
///
/// # Safety
/// `ptr` must be null or valid for reads of `len` bytes for `'a`.
pub(crate) unsafe fn opt_bytes<'a>(ptr: *const u8, len: usize) -> Option<&'a [u8]> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { std::slice::from_raw_parts(ptr, len) })
}

fn bytes_into_raw(bytes: Vec<u8>) -> (*mut u8, usize) {
    let len = bytes.len();
    let ptr = Box::into_raw(bytes.into_boxed_slice()) as *mut u8;
    (ptr, len)
}

/// Frees a buffer produced by `bytes_into_raw`.
///
/// # Safety
/// `ptr`/`len` must come from `bytes_into_raw` and not be freed twice.
pub(crate) unsafe fn free_bytes(ptr: *mut u8, len: usize) {
    if !ptr.is_null() {
        drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) });
    }
}

/// Frees a string produced by `to_c_string`. Null is ignored.
///
/// # Safety
/// `ptr` must come from `to_c_string` and not be freed twice.
pub(crate) unsafe fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}

// ---------------------------------------------------------------------------
// Redirects and trust
// ---------------------------------------------------------------------------

/// Redirect modes as raw discriminants accepted by
/// `httpkit_redirect_should_follow`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiRedirectMode {
    Always = 0,
    Never = 1,
    HttpsOnly = 2,
    HttpsOnlyWhenSourceIsHttps = 3,
}

/// Maps a raw mode from C. Unknown values yield `None`.
pub(crate) fn redirect_mode_from_raw(raw: u32) -> Option<RedirectMode> {
    match raw {
        x if x == FfiRedirectMode::Always as u32 => Some(RedirectMode::Always),
        x if x == FfiRedirectMode::Never as u32 => Some(RedirectMode::Never),
        x if x == FfiRedirectMode::HttpsOnly as u32 => Some(RedirectMode::HttpsOnly),
        x if x == FfiRedirectMode::HttpsOnlyWhenSourceIsHttps as u32 => {
            Some(RedirectMode::HttpsOnlyWhenSourceIsHttps)
        }
        _ => None,
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiTrustDecision {
    Reject = 0,
    Accept = 1,
}

impl From<TrustDecision> for FfiTrustDecision {
    fn from(decision: TrustDecision) -> Self {
        match decision {
            TrustDecision::Accept => FfiTrustDecision::Accept,
            TrustDecision::Reject => FfiTrustDecision::Reject,
        }
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `httpkit_build_*` functions and released with
/// `httpkit_free_request`. `body` is null when the request has no body.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut u8,
    pub body_len: usize,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let (body, body_len) = match req.body {
            Some(bytes) => bytes_into_raw(bytes),
            None => (std::ptr::null_mut(), 0),
        };

        let headers_len = req.headers.len() as u32;
        let headers = if req.headers.is_empty() {
            std::ptr::null_mut()
        } else {
            let ffi_headers: Box<[FfiHeader]> = req
                .headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: to_c_string(k),
                    value: to_c_string(v),
                })
                .collect();
            Box::into_raw(ffi_headers) as *mut FfiHeader
        };

        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            url: to_c_string(req.url),
            headers,
            headers_len,
            body,
            body_len,
        }))
    }

    /// Releases every allocation owned by the request, then the request.
    ///
    /// # Safety
    /// `req` must come from `from_core` and not be freed twice.
    pub(crate) unsafe fn free(req: *mut Self) {
        let req = unsafe { Box::from_raw(req) };
        unsafe {
            free_c_string(req.url);
            free_bytes(req.body, req.body_len);
        }
        if !req.headers.is_null() {
            let headers = unsafe {
                Box::from_raw(std::ptr::slice_from_raw_parts_mut(
                    req.headers,
                    req.headers_len as usize,
                ))
            };
            for header in headers.iter() {
                unsafe {
                    free_c_string(header.key);
                    free_c_string(header.value);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// Terminal state of one exchange, filled in by the C caller.
///
/// `status` is 0 when no HTTP response was received. `content_type`,
/// `body` and `transport_error` are nullable. The FFI layer reads but does
/// not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub content_type: *const c_char,
    pub body: *const u8,
    pub body_len: usize,
    pub transport_error: *const c_char,
}

impl FfiHttpResponse {
    /// # Safety
    /// Every non-null pointer field must be valid as documented on the type.
    pub(crate) unsafe fn to_outcome(&self) -> ExchangeOutcome {
        let (content_type, body, transport_error) = unsafe {
            (
                opt_str(self.content_type),
                opt_bytes(self.body, self.body_len),
                opt_str(self.transport_error),
            )
        };
        ExchangeOutcome {
            status: (self.status != 0).then_some(self.status),
            content_type: content_type.map(str::to_owned),
            body: body.map(<[u8]>::to_vec),
            transport_error: transport_error.map(TransportError::new),
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// One code per error case, plus the FFI-only failures.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Connection = 1,
    StatusCode = 2,
    InterpretResponse = 3,
    ErrorMessageFromServer = 4,
    UnexpectedTransportResponse = 5,
    CredentialRetrievalFailed = 6,
    IncorrectPassword = 7,
    ResponseNotJson = 8,
    NullArg = 9,
    Panic = 10,
}

impl From<&HttpApiError> for FfiErrorCode {
    fn from(err: &HttpApiError) -> Self {
        match err {
            HttpApiError::Connection { .. } => FfiErrorCode::Connection,
            HttpApiError::StatusCode { .. } => FfiErrorCode::StatusCode,
            HttpApiError::InterpretResponse { .. } => FfiErrorCode::InterpretResponse,
            HttpApiError::ErrorMessageFromServer { .. } => FfiErrorCode::ErrorMessageFromServer,
            HttpApiError::UnexpectedTransportResponse { .. } => {
                FfiErrorCode::UnexpectedTransportResponse
            }
            HttpApiError::CredentialRetrievalFailed { .. } => {
                FfiErrorCode::CredentialRetrievalFailed
            }
            HttpApiError::IncorrectPassword { .. } => FfiErrorCode::IncorrectPassword,
            HttpApiError::ResponseNotJson { .. } => FfiErrorCode::ResponseNotJson,
        }
    }
}

/// Result envelope for all interpret operations.
///
/// On success `error_code` is `Ok`, every message is null and `data` holds
/// the payload as JSON text (null for body-less operations).
/// On failure `data` is null, the three messages are rendered with the
/// client's catalog, and `http_status` is set for `StatusCode` errors.
#[repr(C)]
pub struct FfiApiResult {
    pub error_code: FfiErrorCode,
    pub short_message: *mut c_char,
    pub detailed_message: *mut c_char,
    pub combined_message: *mut c_char,
    pub http_status: u16,
    pub data: *mut c_char,
}

impl FfiApiResult {
    fn into_raw(self) -> *mut Self {
        Box::into_raw(Box::new(self))
    }

    fn empty(error_code: FfiErrorCode) -> Self {
        FfiApiResult {
            error_code,
            short_message: std::ptr::null_mut(),
            detailed_message: std::ptr::null_mut(),
            combined_message: std::ptr::null_mut(),
            http_status: 0,
            data: std::ptr::null_mut(),
        }
    }

    /// Success carrying a JSON payload, or no payload when `data` is `None`.
    pub(crate) fn ok(data: Option<String>) -> *mut Self {
        FfiApiResult {
            data: data.map_or(std::ptr::null_mut(), |json| to_c_string(json)),
            ..Self::empty(FfiErrorCode::Ok)
        }
        .into_raw()
    }

    pub(crate) fn from_error(client: &ApiClient, err: &HttpApiError) -> *mut Self {
        let catalog = client.catalog();
        FfiApiResult {
            short_message: to_c_string(catalog.short_message(err)),
            detailed_message: to_c_string(catalog.detailed_message(err)),
            combined_message: to_c_string(catalog.combined_message(err)),
            http_status: err.status().unwrap_or(0),
            ..Self::empty(err.into())
        }
        .into_raw()
    }

    /// Failure outside the error taxonomy; `message` fills every message slot.
    fn internal(error_code: FfiErrorCode, message: &str) -> *mut Self {
        FfiApiResult {
            short_message: to_c_string(message),
            detailed_message: to_c_string(message),
            combined_message: to_c_string(message),
            ..Self::empty(error_code)
        }
        .into_raw()
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::internal(FfiErrorCode::NullArg, &format!("null argument: {name}"))
    }

    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::internal(FfiErrorCode::Panic, msg)
    }

    /// # Safety
    /// `result` must come from one of the constructors above and not be
    /// freed twice.
    pub(crate) unsafe fn free(result: *mut Self) {
        let result = unsafe { Box::from_raw(result) };
        unsafe {
            free_c_string(result.short_message);
            free_c_string(result.detailed_message);
            free_c_string(result.combined_message);
            free_c_string(result.data);
        }
    }
}
