//! Configuration module for the pod manager.
//!
//! This module handles all configuration-related functionality:
//! - Parsing the optional `halldyll.pods.yaml` settings file
//! - Environment and `.env` overrides
//! - Validation of the resolved settings
//! - API key persistence between runs

mod credentials;
mod parser;
mod settings;
mod validator;

pub use credentials::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use parser::{
    CREDENTIALS_PATH_ENV, ConfigParser, DEFAULT_CONFIG_FILES, ENDPOINT_ENV,
    TIMEOUT_ENV, find_config_file,
};
pub use settings::{ApiSettings, CredentialSettings, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, Settings};
pub use validator::{ConfigValidator, MAX_TIMEOUT_SECS, ValidationError, ValidationResult};
