//! Platform-neutral HTTP client core.
//!
//! # Overview
//! Decides, without touching the network, what a host application's HTTP
//! transport should do and how to classify what it got back:
//! - `pinning`: accept or reject a server certificate chain, optionally
//!   pinned to known certificates or public-key hashes.
//! - `redirect`: whether to follow a redirect given the source and
//!   destination URLs.
//! - `interpret`: turn a finished exchange into a decoded payload or an
//!   `HttpApiError`, in a fixed decision order.
//! - `error`: the error taxonomy and its user-facing messages.
//!
//! # Design
//! - The host owns all I/O (host-does-IO pattern). `ApiClient` builds
//!   `HttpRequest` values and interprets `ExchangeOutcome` values.
//! - All decisions are pure functions of their inputs; no state is kept
//!   between calls, so every type here is safe to share across threads.
//! - Types use owned `String` / `Vec` fields so they map cleanly onto the
//!   C ABI exposed by the `httpkit-ffi` crate.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod interpret;
pub mod pinning;
pub mod redirect;
pub mod sentence;

pub use client::ApiClient;
pub use config::{ClientConfig, ConfigError, PinningSettings};
pub use error::{ApiResult, ErrorCatalog, HttpApiError, OperationLabels, UsernameKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use interpret::{ExchangeOutcome, TransportError};
pub use pinning::{PinnedServerCertVerifier, PinningConfig, TrustDecision, TrustValidator};
pub use redirect::{RedirectMode, RedirectPolicy, RedirectType};
pub use sentence::convert_to_sentence;

pub use rustls::pki_types::CertificateDer;
pub use rustls::RootCertStore;
