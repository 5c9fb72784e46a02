//! `RunPod` API client implementation.
//!
//! The client composes a [`Transport`] with the fixed documents from
//! [`queries`](super::queries). Its three operations never fail: every error
//! is folded into the `{error}` branch of the returned outcome.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{ApiSettings, Credential, DEFAULT_ENDPOINT};
use crate::error::{Result, RunPodError};

use super::queries::{self, GraphQLRequest, ResumeBid};
use super::transport::{HttpTransport, Transport};
use super::types::{ActionOutcome, ActionResult, ListPodsOutcome, Pod};

/// `RunPod` API client.
#[derive(Clone)]
pub struct RunPodClient {
    /// Transport used for every request.
    transport: Arc<dyn Transport>,
    /// GraphQL endpoint.
    endpoint: String,
    /// Bid used when resuming pods.
    resume_bid: ResumeBid,
}

impl std::fmt::Debug for RunPodClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunPodClient")
            .field("endpoint", &self.endpoint)
            .field("resume_bid", &self.resume_bid)
            .finish_non_exhaustive()
    }
}

impl RunPodClient {
    /// Creates a client for the public `RunPod` endpoint over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Ok(Self::with_transport(
            Arc::new(HttpTransport::new()?),
            DEFAULT_ENDPOINT,
        ))
    }

    /// Creates an HTTP client from API settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_settings(settings: &ApiSettings) -> Result<Self> {
        let transport = HttpTransport::with_timeout(settings.timeout_secs)?;
        Ok(Self::with_transport(Arc::new(transport), &settings.endpoint))
    }

    /// Creates a client over an arbitrary transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn Transport>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            resume_bid: ResumeBid::default(),
        }
    }

    /// Returns the GraphQL endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends a request and decodes its `data` payload.
    ///
    /// A `null` payload decodes to `None`.
    async fn execute<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        request: GraphQLRequest,
    ) -> std::result::Result<Option<T>, RunPodError> {
        if credential.is_empty() {
            return Err(RunPodError::MissingCredential);
        }

        let data = self
            .transport
            .send(&self.endpoint, credential, &request)
            .await?;

        serde_json::from_value(data).map_err(|e| {
            RunPodError::unknown(format!(
                "Invalid {} response from Runpod API: {e}",
                request.operation_name
            ))
        })
    }

    /// Lists all pods of the account.
    ///
    /// An account without pods yields `Pods { pods: [] }`.
    pub async fn list_pods(&self, credential: &Credential) -> ListPodsOutcome {
        #[derive(Deserialize)]
        struct Response {
            #[serde(default)]
            myself: Option<MyselfResponse>,
        }
        #[derive(Deserialize)]
        struct MyselfResponse {
            #[serde(default)]
            pods: Option<Vec<Pod>>,
        }

        match self
            .execute::<Response>(credential, queries::list_pods())
            .await
        {
            Ok(response) => {
                let pods = response
                    .and_then(|r| r.myself)
                    .and_then(|m| m.pods)
                    .unwrap_or_default();
                debug!("Listed {} pods", pods.len());
                ListPodsOutcome::Pods { pods }
            }
            Err(e) => {
                warn!("Listing pods failed: {e}");
                ListPodsOutcome::failed(&e)
            }
        }
    }

    /// Resumes a stopped pod with a single-GPU low bid.
    pub async fn start_pod(&self, credential: &Credential, pod_id: &str) -> ActionOutcome {
        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "podBidResume")]
            pod: Option<ActionResult>,
        }

        info!("Starting pod {pod_id}");
        let result = self
            .execute::<Response>(credential, queries::resume_pod(pod_id, self.resume_bid))
            .await
            .and_then(|r| Self::require_result(r.and_then(|r| r.pod), pod_id));

        Self::settle("start", pod_id, result)
    }

    /// Stops a running pod.
    pub async fn stop_pod(&self, credential: &Credential, pod_id: &str) -> ActionOutcome {
        #[derive(Deserialize)]
        struct Response {
            #[serde(rename = "podStop")]
            pod: Option<ActionResult>,
        }

        info!("Stopping pod {pod_id}");
        let result = self
            .execute::<Response>(credential, queries::stop_pod(pod_id))
            .await
            .and_then(|r| Self::require_result(r.and_then(|r| r.pod), pod_id));

        Self::settle("stop", pod_id, result)
    }

    /// Rejects a mutation that answered with no pod.
    fn require_result(
        result: Option<ActionResult>,
        pod_id: &str,
    ) -> std::result::Result<ActionResult, RunPodError> {
        result.ok_or_else(|| RunPodError::unknown(format!("Runpod returned no result for pod {pod_id}")))
    }

    /// Folds a mutation result into an outcome, logging failures.
    fn settle(
        action: &str,
        pod_id: &str,
        result: std::result::Result<ActionResult, RunPodError>,
    ) -> ActionOutcome {
        match result {
            Ok(result) => {
                info!(
                    "Pod {} {action} accepted (desired status: {})",
                    result.id, result.desired_status
                );
                ActionOutcome::Done(result)
            }
            Err(e) => {
                warn!("Failed to {action} pod {pod_id}: {e}");
                ActionOutcome::failed(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorClass, MISSING_CREDENTIAL_MESSAGE};
    use crate::runpod::transport::MockTransport;
    use crate::runpod::types::PodStatus;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn mock_client(transport: MockTransport) -> RunPodClient {
        RunPodClient::with_transport(Arc::new(transport), "http://runpod.test/graphql")
    }

    async fn http_client(server: &MockServer) -> RunPodClient {
        let transport = HttpTransport::with_timeout(5).expect("transport");
        RunPodClient::with_transport(Arc::new(transport), format!("{}/graphql", server.uri()))
    }

    #[tokio::test]
    async fn test_empty_credential_never_reaches_transport() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let client = mock_client(transport);
        let empty = Credential::default();

        let listed = client.list_pods(&empty).await;
        assert_eq!(listed.error(), Some(MISSING_CREDENTIAL_MESSAGE));
        assert_eq!(listed.class(), Some(ErrorClass::MissingCredential));

        let started = client.start_pod(&empty, "p1").await;
        assert_eq!(started.error(), Some(MISSING_CREDENTIAL_MESSAGE));

        let stopped = client.stop_pod(&empty, "p1").await;
        assert_eq!(stopped.error(), Some(MISSING_CREDENTIAL_MESSAGE));
    }

    #[tokio::test]
    async fn test_list_pods_zero_pods_is_not_an_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_, _, _| Ok(json!({ "myself": { "pods": [] } })));

        let outcome = mock_client(transport).list_pods(&Credential::new("k1")).await;
        assert_eq!(outcome, ListPodsOutcome::Pods { pods: Vec::new() });
    }

    #[tokio::test]
    async fn test_list_pods_missing_path_is_empty() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_, _, _| Ok(json!({ "myself": null })));

        let outcome = mock_client(transport).list_pods(&Credential::new("k1")).await;
        assert_eq!(outcome.pods().map(<[Pod]>::len), Some(0));
    }

    #[tokio::test]
    async fn test_transport_errors_become_error_outcomes() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_, _, _| Err(RunPodError::network("Failed to fetch: connection refused")));

        let client = mock_client(transport);
        let outcome = client.stop_pod(&Credential::new("k1"), "p1").await;

        assert_eq!(outcome.error(), Some("Failed to fetch: connection refused"));
        assert_eq!(outcome.class(), Some(ErrorClass::NetworkUnavailable));
    }

    #[tokio::test]
    async fn test_null_mutation_result_is_an_error() {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_, _, _| Ok(json!({ "podBidResume": null })));

        let outcome = mock_client(transport)
            .start_pod(&Credential::new("k1"), "p1")
            .await;

        assert!(!outcome.is_done());
        assert_eq!(outcome.class(), Some(ErrorClass::Unknown));
    }

    #[tokio::test]
    async fn test_http_status_error_keeps_code_and_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = http_client(&server).await.list_pods(&Credential::new("k1")).await;
        let message = outcome.error().expect("500 should be an error");
        assert!(message.contains("500"));
        assert!(message.contains("Internal Server Error"));
    }

    #[tokio::test]
    async fn test_bad_key_rejected_by_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "errors": [{ "message": "Unauthorized" }] })),
            )
            .mount(&server)
            .await;

        let outcome = http_client(&server).await.list_pods(&Credential::new("bad")).await;
        assert_eq!(
            serde_json::to_value(&outcome).expect("serialize"),
            json!({ "error": "Unauthorized" })
        );
        assert_eq!(outcome.class(), Some(ErrorClass::ProviderRejected));
        assert!(outcome.pods().is_none());
    }

    #[tokio::test]
    async fn test_list_pods_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("query Pods"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "myself": { "pods": [
                    { "id": "p1", "name": "a", "desiredStatus": "RUNNING",
                      "runtime": { "uptimeInSeconds": 10, "gpus": [], "ports": [] } },
                    { "id": "p2", "name": null, "desiredStatus": "STOPPED", "runtime": null }
                ] } }
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = http_client(&server).await;
        let credential = Credential::new("k1");
        let first = client.list_pods(&credential).await;
        let second = client.list_pods(&credential).await;

        assert_eq!(first.pods().map(<[Pod]>::len), Some(2));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_start_then_list_reflects_running() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("podBidResume"))
            .and(body_string_contains("\"bidPerGpu\":0.2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "podBidResume": { "id": "p1", "desiredStatus": "RUNNING" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = http_client(&server).await;
        let outcome = client.start_pod(&Credential::new("k1"), "p1").await;

        assert_eq!(
            outcome,
            ActionOutcome::Done(ActionResult {
                id: String::from("p1"),
                desired_status: PodStatus::Running,
            })
        );
    }

    #[tokio::test]
    async fn test_stop_pod_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("podStop"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "podStop": { "id": "p1", "desiredStatus": "EXITED" } }
            })))
            .mount(&server)
            .await;

        let outcome = http_client(&server)
            .await
            .stop_pod(&Credential::new("k1"), "p1")
            .await;

        match outcome {
            ActionOutcome::Done(result) => {
                assert_eq!(result.desired_status, PodStatus::Other(String::from("EXITED")));
            }
            ActionOutcome::Error { error, .. } => panic!("unexpected error: {error}"),
        }
    }
}
