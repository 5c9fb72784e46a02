//! API key handling and persistence.
//!
//! The key is an opaque string passed explicitly to every remote call. Where
//! it is kept between runs is the business of a [`CredentialStore`], which is
//! only touched at the application boundary.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use crate::error::{ConfigError, HalldyllError, Result};

/// Directory under the user config dir holding Halldyll files.
const CONFIG_DIR: &str = "halldyll";

/// File name of the stored API key.
const CREDENTIAL_FILE: &str = "runpod_api_key";

/// Permissions of the key file on unix.
#[cfg(unix)]
const KEY_FILE_MODE: u32 = 0o600;

/// A `RunPod` API key.
///
/// Surrounding whitespace is dropped on construction. `Debug` never prints
/// the key itself.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credential(String);

impl Credential {
    /// Creates a credential from a raw key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.len() == key.len() {
            Self(key)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Returns the raw key, as sent in the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if no key is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the key with everything but the last four characters hidden.
    #[must_use]
    pub fn masked(&self) -> String {
        let count = self.0.chars().count();
        if count <= 4 {
            return "*".repeat(count);
        }
        let tail: String = self.0.chars().skip(count - 4).collect();
        format!("{}{tail}", "*".repeat(count - 4))
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            f.write_str("Credential(<empty>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

impl From<&str> for Credential {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for Credential {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

/// Persistence for the API key between runs.
pub trait CredentialStore: Send + Sync {
    /// Returns the stored key, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self) -> Result<Option<Credential>>;

    /// Stores a key, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn set(&self, credential: &Credential) -> Result<()>;

    /// Removes the stored key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn clear(&self) -> Result<()>;
}

/// File-backed credential store.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    /// Path to the key file.
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store at the default location (`<config dir>/halldyll/runpod_api_key`).
    ///
    /// # Errors
    ///
    /// Returns an error if the user config directory cannot be determined.
    pub fn new() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| HalldyllError::internal("Cannot determine user config directory"))?;
        Ok(Self::with_path(base.join(CONFIG_DIR).join(CREDENTIAL_FILE)))
    }

    /// Creates a store at a custom path.
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the key file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, message: impl Into<String>) -> HalldyllError {
        HalldyllError::Config(ConfigError::credential_store(&self.path, message))
    }

    /// Opens the key file for writing, readable by the owner only.
    ///
    /// The mode applies when the file is created; an existing file is
    /// narrowed to `0600` before anything is written to it.
    #[cfg(unix)]
    fn open_for_write(&self) -> std::io::Result<File> {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(KEY_FILE_MODE)
            .open(&self.path)?;
        file.set_permissions(std::fs::Permissions::from_mode(KEY_FILE_MODE))?;
        Ok(file)
    }

    #[cfg(not(unix))]
    fn open_for_write(&self) -> std::io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            debug!("No stored API key at: {}", self.path.display());
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| self.store_error(format!("Failed to read key file: {e}")))?;
        let credential = Credential::new(content);

        Ok((!credential.is_empty()).then_some(credential))
    }

    fn set(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| self.store_error(format!("Failed to create directory: {e}")))?;
        }

        self.open_for_write()
            .and_then(|mut file| file.write_all(credential.as_str().as_bytes()))
            .map_err(|e| self.store_error(format!("Failed to write key file: {e}")))?;

        info!("Stored API key at: {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .map_err(|e| self.store_error(format!("Failed to remove key file: {e}")))?;
            info!("Removed stored API key: {}", self.path.display());
        }
        Ok(())
    }
}

/// In-memory credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    value: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<Credential>> {
        Ok(self
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set(&self, credential: &Credential) -> Result<()> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
