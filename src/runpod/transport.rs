//! Transport layer for the `RunPod` GraphQL API.
//!
//! A [`Transport`] performs exactly one POST of a GraphQL body and turns the
//! reply into either the raw `data` payload or a classified [`RunPodError`].
//! It holds no per-request state and can be shared freely.

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::{Credential, DEFAULT_TIMEOUT_SECS};
use crate::error::{GENERIC_PROVIDER_ERROR, HalldyllError, Result, RunPodError};

use super::queries::GraphQLRequest;

/// Sends GraphQL requests to a `RunPod` endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` to `endpoint` authenticated with `credential`.
    ///
    /// Returns the `data` member of the response, or `Value::Null` if the
    /// provider sent none.
    ///
    /// # Errors
    ///
    /// - [`RunPodError::MissingCredential`] if `credential` is empty; no
    ///   request is made.
    /// - [`RunPodError::Unauthorized`] / [`RunPodError::HttpStatus`] on a
    ///   non-2xx status.
    /// - [`RunPodError::ProviderRejected`] if the body carries `errors`.
    /// - [`RunPodError::NetworkUnavailable`] if no response was received.
    async fn send(
        &self,
        endpoint: &str,
        credential: &Credential,
        request: &GraphQLRequest,
    ) -> std::result::Result<Value, RunPodError>;
}

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
struct GraphQLResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Value>,
}

/// Unwraps a decoded GraphQL response body.
///
/// A present, non-null `errors` member wins over `data`; its first element's
/// `message` is reported, or a generic message when there is none.
///
/// # Errors
///
/// Returns [`RunPodError::ProviderRejected`] when the body carries errors and
/// [`RunPodError::Unknown`] when it is not a GraphQL envelope at all.
pub fn unwrap_envelope(body: Value) -> std::result::Result<Value, RunPodError> {
    let envelope: GraphQLResponse = serde_json::from_value(body)
        .map_err(|e| RunPodError::unknown(format!("Invalid response from Runpod API: {e}")))?;

    if let Some(errors) = envelope.errors.filter(|e| !e.is_null()) {
        let message = errors
            .as_array()
            .and_then(|list| list.first())
            .and_then(|first| first.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_PROVIDER_ERROR);
        return Err(RunPodError::rejected(message));
    }

    Ok(envelope.data.unwrap_or(Value::Null))
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// HTTP client.
    client: Client,
    /// Request timeout, kept for error messages.
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a transport with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                HalldyllError::RunPod(RunPodError::network(format!(
                    "Failed to create HTTP client: {e}"
                )))
            })?;

        Ok(Self { client, timeout })
    }

    /// Maps a `reqwest` failure to the error taxonomy.
    fn classify(&self, error: &reqwest::Error) -> RunPodError {
        if error.is_timeout() {
            RunPodError::network(format!(
                "Runpod API request timed out after {}s",
                self.timeout.as_secs()
            ))
        } else if error.is_builder() {
            RunPodError::unknown(format!("Invalid request: {error}"))
        } else if error.is_decode() {
            RunPodError::unknown(format!("Invalid response from Runpod API: {error}"))
        } else {
            RunPodError::network(format!("Failed to fetch: {error}"))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        endpoint: &str,
        credential: &Credential,
        request: &GraphQLRequest,
    ) -> std::result::Result<Value, RunPodError> {
        if credential.is_empty() {
            return Err(RunPodError::MissingCredential);
        }

        debug!("Sending {} request to {endpoint}", request.operation_name);
        trace!("GraphQL document: {}", request.query);

        let response = self
            .client
            .post(endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, credential.as_str())
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            debug!("{} request failed with status {status}", request.operation_name);
            return Err(RunPodError::from_status(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            ));
        }

        let body: Value = response.json().await.map_err(|e| self.classify(&e))?;
        unwrap_envelope(body)
    }
}

/// Transport for hosts where no network bridge is available.
///
/// Every call fails with a [`RunPodError::NetworkUnavailable`] naming the
/// reason, so callers render an error instead of crashing.
#[derive(Debug, Clone)]
pub struct UnavailableTransport {
    /// Why the bridge is missing.
    reason: String,
}

impl UnavailableTransport {
    /// Creates an unavailable transport.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Transport for UnavailableTransport {
    async fn send(
        &self,
        _endpoint: &str,
        credential: &Credential,
        request: &GraphQLRequest,
    ) -> std::result::Result<Value, RunPodError> {
        if credential.is_empty() {
            return Err(RunPodError::MissingCredential);
        }

        debug!("Dropping {} request: bridge unavailable", request.operation_name);
        Err(RunPodError::network(format!(
            "Runpod bridge unavailable: {}",
            self.reason
        )))
    }
}
