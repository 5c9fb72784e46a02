//! Settings types for the pod manager.
//!
//! These structs map to the optional `halldyll.pods.yaml` file. Every field
//! has a default, so an empty file (or no file at all) is a valid setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

use super::credentials::FileCredentialStore;

/// `RunPod` GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.runpod.io/graphql";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Root settings structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiSettings,
    /// Credential persistence settings.
    #[serde(default)]
    pub credentials: CredentialSettings,
}

/// Remote API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSettings {
    /// GraphQL endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Credential persistence settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSettings {
    /// Custom location of the stored API key.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_endpoint() -> String {
    String::from(DEFAULT_ENDPOINT)
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Builds the credential store these settings point to.
    ///
    /// # Errors
    ///
    /// Returns an error if no custom path is set and the user config
    /// directory cannot be determined.
    pub fn credential_store(&self) -> Result<FileCredentialStore> {
        self.credentials
            .path
            .as_ref()
            .map_or_else(FileCredentialStore::new, |path| {
                Ok(FileCredentialStore::with_path(path))
            })
    }
}
