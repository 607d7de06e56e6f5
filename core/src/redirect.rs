//! Redirect-following policy.
//!
//! # Design
//! The transport consults `RedirectPolicy::should_follow` each time it is
//! about to follow a redirect. The decision depends only on the configured
//! `RedirectMode` and on whether the origin and destination URLs are present
//! and use the `https` scheme (case-insensitive). An absent URL is handled
//! separately from a non-https one.

use serde::{Deserialize, Serialize};
use url::Url;

/// How a client treats HTTP redirects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectMode {
    /// Follow every redirect.
    #[default]
    Always,
    /// Never follow a redirect.
    Never,
    /// Follow only redirects whose destination is https.
    HttpsOnly,
    /// Follow redirects to https, and any redirect away from a non-https
    /// origin (which was not secure to begin with).
    HttpsOnlyWhenSourceIsHttps,
}

/// Redirect decision for one client, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RedirectPolicy {
    mode: RedirectMode,
}

impl RedirectPolicy {
    pub const fn new(mode: RedirectMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> RedirectMode {
        self.mode
    }

    pub fn should_follow(&self, source: Option<&Url>, destination: Option<&Url>) -> bool {
        let follow = should_follow(self.mode, source, destination);
        tracing::debug!(
            mode = ?self.mode,
            source = source.map(Url::as_str),
            destination = destination.map(Url::as_str),
            follow,
            "redirect decision"
        );
        follow
    }

    /// Same decision for URLs that arrive as raw strings (e.g. from a native
    /// host). Only the scheme is inspected, so a malformed but present URL
    /// counts as present and non-https.
    pub fn should_follow_str(&self, source: Option<&str>, destination: Option<&str>) -> bool {
        decide(
            self.mode,
            source.map(scheme_is_https),
            destination.map(scheme_is_https),
        )
    }
}

/// Whether to follow a redirect from `source` to `destination` under `mode`.
pub fn should_follow(mode: RedirectMode, source: Option<&Url>, destination: Option<&Url>) -> bool {
    decide(mode, source.map(is_https), destination.map(is_https))
}

pub fn is_https(url: &Url) -> bool {
    url.scheme().eq_ignore_ascii_case("https")
}

fn scheme_is_https(raw: &str) -> bool {
    raw.trim_start()
        .split_once(':')
        .is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case("https"))
}

/// `None` means the URL is absent; `Some(secure)` carries its scheme check.
fn decide(mode: RedirectMode, source_https: Option<bool>, destination_https: Option<bool>) -> bool {
    match mode {
        RedirectMode::Always => true,
        RedirectMode::Never => false,
        RedirectMode::HttpsOnly => destination_https == Some(true),
        RedirectMode::HttpsOnlyWhenSourceIsHttps => {
            destination_https == Some(true) || source_https == Some(false)
        }
    }
}

/// Redirect classification of an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectType {
    Permanent,
    Temporary,
    NotRedirect,
}

impl RedirectType {
    pub fn from_status(status: u16) -> Self {
        match status {
            301 | 303 | 308 => RedirectType::Permanent,
            302 | 307 => RedirectType::Temporary,
            _ => RedirectType::NotRedirect,
        }
    }
}
