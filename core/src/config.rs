//! Client configuration loaded from JSON.
//!
//! ```json
//! {
//!   "api_label": "Feed Wrangler",
//!   "base_url": "https://api.example.test/v2",
//!   "app_name": "Filters",
//!   "redirects": "https_only",
//!   "pinning": { "mode": "public_key_hashes", "hashes": ["prM8...="] }
//! }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::DEFAULT_APP_NAME;
use crate::pinning::PinningConfig;
use crate::redirect::RedirectMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("api_label must not be empty")]
    EmptyApiLabel,
}

/// Settings for one remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_label: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub redirects: RedirectMode,
    #[serde(default)]
    pub pinning: PinningSettings,
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

impl ClientConfig {
    pub fn new(api_label: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_label: api_label.into(),
            base_url: base_url.into(),
            app_name: default_app_name(),
            redirects: RedirectMode::default(),
            pinning: PinningSettings::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.api_label.trim().is_empty() {
            return Err(ConfigError::EmptyApiLabel);
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

/// Serializable description of a pinning mode.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PinningSettings {
    #[default]
    None,
    CertificateFiles { paths: Vec<PathBuf> },
    PublicKeyHashes { hashes: Vec<String> },
}

impl PinningSettings {
    /// Loads pinned certificates from disk. Unreadable files are skipped so
    /// they can never match; with no readable file every chain is rejected.
    pub fn resolve(&self) -> PinningConfig {
        match self {
            PinningSettings::None => PinningConfig::None,
            PinningSettings::CertificateFiles { paths } => {
                let certificates: BTreeSet<Vec<u8>> = paths
                    .iter()
                    .filter_map(|path| match std::fs::read(path) {
                        Ok(der) => Some(der),
                        Err(err) => {
                            tracing::warn!(
                                path = %path.display(),
                                %err,
                                "skipping unreadable pinned certificate"
                            );
                            None
                        }
                    })
                    .collect();
                if certificates.is_empty() {
                    tracing::warn!(
                        "no pinned certificate could be read; every server will be rejected"
                    );
                }
                PinningConfig::CertificateFiles(certificates)
            }
            PinningSettings::PublicKeyHashes { hashes } => {
                PinningConfig::PublicKeyHashes(hashes.iter().cloned().collect())
            }
        }
    }
}
