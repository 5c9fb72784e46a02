//! Error types for the Halldyll pod manager.
//!
//! This module provides the error hierarchy used by configuration loading,
//! credential persistence and the `RunPod` API layer, together with the
//! coarse [`ErrorClass`] that every client failure is reduced to.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Message reported whenever a remote call is attempted without an API key.
pub const MISSING_CREDENTIAL_MESSAGE: &str = "Runpod API key required";

/// Fallback message when the provider reports errors without a usable message.
pub const GENERIC_PROVIDER_ERROR: &str = "GraphQL error";

/// The main error type for the Halldyll pod manager.
#[derive(Debug, Error)]
pub enum HalldyllError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `RunPod` API errors.
    #[error("{0}")]
    RunPod(#[from] RunPodError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("Configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// Validation failed.
    #[error("Configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation error.
        message: String,
        /// Field that failed validation.
        field: Option<String>,
    },

    /// The credential store could not be read or written.
    #[error("Credential store error at {path}: {message}")]
    CredentialStore {
        /// Location of the credential file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },
}

/// `RunPod` API errors.
///
/// Each variant corresponds to exactly one [`ErrorClass`]. The `Display`
/// output is the message surfaced to the operator, so it keeps the HTTP
/// status, the transport wording or the provider's literal message intact.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunPodError {
    /// No API key was supplied.
    #[error("Runpod API key required")]
    MissingCredential,

    /// The provider refused the API key (HTTP 401/403).
    #[error("Runpod API error: {status} {status_text}")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        status_text: String,
    },

    /// Any other non-2xx HTTP status.
    #[error("Runpod API error: {status} {status_text}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        status_text: String,
    },

    /// The request never produced a response (DNS, connect, TLS, timeout,
    /// or no transport available on this host).
    #[error("{message}")]
    NetworkUnavailable {
        /// Transport-level description.
        message: String,
    },

    /// The GraphQL layer returned structured errors.
    #[error("{message}")]
    ProviderRejected {
        /// The first error message reported by the provider.
        message: String,
    },

    /// Anything else, such as an undecodable body.
    #[error("{message}")]
    Unknown {
        /// Description of the failure.
        message: String,
    },
}

/// Coarse classification of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorClass {
    /// The call was not attempted because no API key was available.
    MissingCredential,
    /// The provider rejected the API key.
    Unauthorized,
    /// The provider could not be reached, or answered with a non-2xx status.
    NetworkUnavailable,
    /// The provider answered with GraphQL errors.
    ProviderRejected,
    /// Unclassified failure.
    Unknown,
}

/// Result type alias for Halldyll operations.
pub type Result<T> = std::result::Result<T, HalldyllError>;

impl HalldyllError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the failure class of this error.
    ///
    /// Errors that did not come from the `RunPod` layer are [`ErrorClass::Unknown`].
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::RunPod(e) => e.class(),
            _ => ErrorClass::Unknown,
        }
    }

    /// Returns the operator-facing message for this error.
    ///
    /// `RunPod` errors are reported verbatim, without the category prefix.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::RunPod(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

impl ConfigError {
    /// Creates a validation error for a specific field.
    #[must_use]
    pub fn validation(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a credential store error.
    #[must_use]
    pub fn credential_store(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CredentialStore {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl RunPodError {
    /// Builds the error for a non-2xx HTTP status.
    ///
    /// 401 and 403 become [`RunPodError::Unauthorized`]; everything else is
    /// reported as a plain HTTP failure.
    #[must_use]
    pub fn from_status(status: u16, status_text: impl Into<String>) -> Self {
        let status_text = status_text.into();
        if status == 401 || status == 403 {
            Self::Unauthorized {
                status,
                status_text,
            }
        } else {
            Self::HttpStatus {
                status,
                status_text,
            }
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkUnavailable {
            message: message.into(),
        }
    }

    /// Creates a provider rejection error.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::ProviderRejected {
            message: message.into(),
        }
    }

    /// Creates an unclassified error.
    #[must_use]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Returns the failure class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::MissingCredential => ErrorClass::MissingCredential,
            Self::Unauthorized { .. } => ErrorClass::Unauthorized,
            Self::HttpStatus { .. } | Self::NetworkUnavailable { .. } => {
                ErrorClass::NetworkUnavailable
            }
            Self::ProviderRejected { .. } => ErrorClass::ProviderRejected,
            Self::Unknown { .. } => ErrorClass::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let class = match self {
            Self::MissingCredential => "missing credential",
            Self::Unauthorized => "unauthorized",
            Self::NetworkUnavailable => "network unavailable",
            Self::ProviderRejected => "provider rejected",
            Self::Unknown => "unknown",
        };
        write!(f, "{class}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            RunPodError::from_status(401, "Unauthorized").class(),
            ErrorClass::Unauthorized
        );
        assert_eq!(
            RunPodError::from_status(403, "Forbidden").class(),
            ErrorClass::Unauthorized
        );
        assert_eq!(
            RunPodError::from_status(502, "Bad Gateway").class(),
            ErrorClass::NetworkUnavailable
        );
    }

    #[test]
    fn test_status_message_keeps_code_and_text() {
        let err = RunPodError::from_status(500, "Internal Server Error");
        assert_eq!(err.to_string(), "Runpod API error: 500 Internal Server Error");
    }

    #[test]
    fn test_missing_credential_message() {
        assert_eq!(
            RunPodError::MissingCredential.to_string(),
            MISSING_CREDENTIAL_MESSAGE
        );
    }

    #[test]
    fn test_user_message_strips_nothing_from_provider_errors() {
        let err = HalldyllError::from(RunPodError::rejected("Unauthorized"));
        assert_eq!(err.user_message(), "Unauthorized");
        assert_eq!(err.class(), ErrorClass::ProviderRejected);
    }

    #[test]
    fn test_non_runpod_errors_are_unknown() {
        let err = HalldyllError::internal("boom");
        assert_eq!(err.class(), ErrorClass::Unknown);
    }
}
