//! GraphQL documents for the `RunPod` API.
//!
//! The documents are fixed at compile time. Caller-supplied values only ever
//! travel in `variables`, never inside the query text.

use serde::Serialize;
use serde_json::json;

/// Bid per GPU used when resuming a pod.
pub const DEFAULT_BID_PER_GPU: f64 = 0.2;

/// GPU count used when resuming a pod.
pub const DEFAULT_GPU_COUNT: u32 = 1;

/// Lists every pod of the account with its runtime telemetry.
pub const LIST_PODS_QUERY: &str = r"
    query Pods {
        myself {
            pods {
                id
                name
                desiredStatus
                runtime {
                    uptimeInSeconds
                    gpus {
                        gpuUtilPercent
                        memoryUtilPercent
                    }
                    ports {
                        ip
                        publicPort
                        isIpPublic
                    }
                }
            }
        }
    }
";

/// Stops a pod.
pub const STOP_POD_MUTATION: &str = r"
    mutation StopPod($podId: String!) {
        podStop(input: { podId: $podId }) {
            id
            desiredStatus
        }
    }
";

/// Resumes a stopped pod with a bid.
pub const RESUME_POD_MUTATION: &str = r"
    mutation ResumePod($podId: String!, $bidPerGpu: Float!, $gpuCount: Int!) {
        podBidResume(input: { podId: $podId, bidPerGpu: $bidPerGpu, gpuCount: $gpuCount }) {
            id
            desiredStatus
        }
    }
";

/// A GraphQL request body: `{"query": ..., "variables": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQLRequest {
    /// Operation name, for logging.
    #[serde(skip)]
    pub operation_name: &'static str,
    /// Query document.
    pub query: &'static str,
    /// Variables, omitted when the document takes none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

/// Bid parameters for resuming a pod.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResumeBid {
    /// Bid per GPU in dollars per hour.
    pub bid_per_gpu: f64,
    /// Number of GPUs to resume with.
    pub gpu_count: u32,
}

impl Default for ResumeBid {
    fn default() -> Self {
        Self {
            bid_per_gpu: DEFAULT_BID_PER_GPU,
            gpu_count: DEFAULT_GPU_COUNT,
        }
    }
}

/// Builds the `Pods` query.
#[must_use]
pub const fn list_pods() -> GraphQLRequest {
    GraphQLRequest {
        operation_name: "Pods",
        query: LIST_PODS_QUERY,
        variables: None,
    }
}

/// Builds the `StopPod` mutation.
#[must_use]
pub fn stop_pod(pod_id: &str) -> GraphQLRequest {
    GraphQLRequest {
        operation_name: "StopPod",
        query: STOP_POD_MUTATION,
        variables: Some(json!({ "podId": pod_id })),
    }
}

/// Builds the `ResumePod` mutation.
#[must_use]
pub fn resume_pod(pod_id: &str, bid: ResumeBid) -> GraphQLRequest {
    GraphQLRequest {
        operation_name: "ResumePod",
        query: RESUME_POD_MUTATION,
        variables: Some(json!({
            "podId": pod_id,
            "bidPerGpu": bid.bid_per_gpu,
            "gpuCount": bid.gpu_count,
        })),
    }
}
