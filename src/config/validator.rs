//! Settings validation.
//!
//! Checks the resolved settings before any client is built, so a typo in
//! the endpoint or an absurd timeout is reported up front rather than as a
//! confusing network failure.

use crate::error::{ConfigError, HalldyllError, Result};
use tracing::debug;

use super::settings::{ApiSettings, CredentialSettings, Settings};

/// Largest accepted request timeout in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// Validator for pod manager settings.
#[derive(Debug, Default)]
pub struct ConfigValidator;

/// Validation result containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of warnings (non-fatal issues).
    pub warnings: Vec<String>,
}

/// A single validation error.
#[derive(Debug)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// The error message.
    pub message: String,
}

impl ConfigValidator {
    /// Creates a new validator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates resolved settings.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if any check fails.
    pub fn validate(&self, settings: &Settings) -> Result<ValidationResult> {
        let mut result = ValidationResult::default();

        Self::validate_api(&settings.api, &mut result);
        Self::validate_credentials(&settings.credentials, &mut result);

        if result.errors.is_empty() {
            debug!("Settings validation passed");
            Ok(result)
        } else {
            let first_error = &result.errors[0];
            Err(HalldyllError::Config(ConfigError::validation(
                first_error.message.clone(),
                first_error.field.clone(),
            )))
        }
    }

    /// Validates API settings.
    fn validate_api(api: &ApiSettings, result: &mut ValidationResult) {
        let endpoint = api.endpoint.trim();
        if endpoint.is_empty() {
            result.errors.push(ValidationError {
                field: String::from("api.endpoint"),
                message: String::from("Endpoint cannot be empty"),
            });
        } else if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
            result.errors.push(ValidationError {
                field: String::from("api.endpoint"),
                message: format!("Endpoint '{endpoint}' must start with http:// or https://"),
            });
        } else if endpoint.starts_with("http://") {
            result
                .warnings
                .push(format!("Endpoint '{endpoint}' is not using TLS; the API key is sent in clear"));
        }

        if api.timeout_secs == 0 || api.timeout_secs > MAX_TIMEOUT_SECS {
            result.errors.push(ValidationError {
                field: String::from("api.timeout_secs"),
                message: format!(
                    "Timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds, got {}",
                    api.timeout_secs
                ),
            });
        }
    }

    /// Validates credential settings.
    fn validate_credentials(credentials: &CredentialSettings, result: &mut ValidationResult) {
        if credentials
            .path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            result.errors.push(ValidationError {
                field: String::from("credentials.path"),
                message: String::from("Credential path cannot be empty"),
            });
        }
    }
}

impl ValidationResult {
    /// Returns true if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_settings_are_valid() {
        let result = ConfigValidator::new()
            .validate(&Settings::default())
            .expect("defaults should validate");
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_rejects_bad_scheme() {
        let mut settings = Settings::default();
        settings.api.endpoint = String::from("ftp://api.runpod.io/graphql");
        assert!(ConfigValidator::new().validate(&settings).is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut settings = Settings::default();
        settings.api.timeout_secs = 0;
        let err = ConfigValidator::new()
            .validate(&settings)
            .expect_err("zero timeout should fail");
        assert!(err.to_string().contains("Timeout"));
    }

    #[test]
    fn test_rejects_empty_credential_path() {
        let mut settings = Settings::default();
        settings.credentials.path = Some(PathBuf::new());
        assert!(ConfigValidator::new().validate(&settings).is_err());
    }

    #[test]
    fn test_plain_http_is_a_warning() {
        let mut settings = Settings::default();
        settings.api.endpoint = String::from("http://localhost:8080/graphql");
        let result = ConfigValidator::new()
            .validate(&settings)
            .expect("http should validate");
        assert_eq!(result.warnings.len(), 1);
    }
}
