//! `RunPod` API types and data structures.
//!
//! This module defines the pod snapshot returned by the `Pods` query, the
//! result of the start/stop mutations, and the non-failing outcome shapes the
//! client hands back to its callers.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::config::Credential;
use crate::error::{ErrorClass, RunPodError};

/// A `RunPod` pod, as reported by the provider at the time of the last list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    /// Unique pod identifier.
    pub id: String,
    /// Pod name, if one was set.
    #[serde(default)]
    pub name: Option<String>,
    /// Target run state.
    #[serde(default)]
    pub desired_status: PodStatus,
    /// Runtime telemetry, absent while the pod is not running.
    #[serde(default)]
    pub runtime: Option<PodRuntime>,
}

/// Pod runtime information.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodRuntime {
    /// Uptime in seconds.
    #[serde(default)]
    pub uptime_in_seconds: Option<u64>,
    /// Per-GPU utilization samples.
    #[serde(default, deserialize_with = "null_as_default")]
    pub gpus: Vec<GpuSample>,
    /// Port bindings.
    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: Vec<PortBinding>,
}

/// GPU utilization sample.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpuSample {
    /// Compute utilization in percent.
    #[serde(default)]
    pub gpu_util_percent: Option<f64>,
    /// Memory utilization in percent.
    #[serde(default)]
    pub memory_util_percent: Option<f64>,
}

/// A port exposed by a pod.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortBinding {
    /// Address the port is reachable on.
    #[serde(default)]
    pub ip: Option<String>,
    /// Externally mapped port.
    #[serde(default)]
    pub public_port: Option<u16>,
    /// Whether `ip` is a public address.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_ip_public: bool,
}

/// Desired status of a pod.
///
/// Values other than `RUNNING` and `STOPPED` are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum PodStatus {
    /// `RUNNING`.
    Running,
    /// `STOPPED`.
    Stopped,
    /// Any other provider-defined value.
    Other(String),
}

/// Result of a successful start or stop mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    /// Identifier of the affected pod.
    pub id: String,
    /// Desired status reported right after the mutation.
    #[serde(default)]
    pub desired_status: PodStatus,
}

/// A pod action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Resume a stopped pod.
    Start,
    /// Stop a running pod.
    Stop,
}

/// A single start/stop request, alive for one round trip only.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    /// Correlation id for logs.
    pub request_id: Uuid,
    /// Requested operation.
    pub operation: Operation,
    /// Target pod.
    pub pod_id: String,
    /// API key used for the call.
    pub credential: Credential,
}

/// Outcome of [`list_pods`](super::RunPodClient::list_pods).
///
/// Serializes as `{"pods": [...]}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListPodsOutcome {
    /// The provider's current pod collection, possibly empty.
    Pods {
        /// Pods, in provider order.
        pods: Vec<Pod>,
    },
    /// The call failed.
    Error {
        /// Operator-facing message.
        error: String,
        /// Failure class.
        #[serde(skip_serializing)]
        class: ErrorClass,
    },
}

/// Outcome of [`start_pod`](super::RunPodClient::start_pod) and
/// [`stop_pod`](super::RunPodClient::stop_pod).
///
/// Serializes as `{"id": ..., "desiredStatus": ...}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionOutcome {
    /// The mutation was accepted.
    Done(ActionResult),
    /// The call failed.
    Error {
        /// Operator-facing message.
        error: String,
        /// Failure class.
        #[serde(skip_serializing)]
        class: ErrorClass,
    },
}

/// Deserializes `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Pod {
    /// Returns the name to display, falling back to the identifier.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.id)
    }

    /// Checks if the pod is meant to be running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        matches!(self.desired_status, PodStatus::Running)
    }

    /// Returns the operation that makes sense for the pod's current status.
    ///
    /// Running pods can be stopped; everything else can be started.
    #[must_use]
    pub const fn available_action(&self) -> Operation {
        if self.is_running() {
            Operation::Stop
        } else {
            Operation::Start
        }
    }

    /// Returns the uptime in seconds, if the pod reports any.
    #[must_use]
    pub fn uptime_secs(&self) -> Option<u64> {
        self.runtime.as_ref().and_then(|r| r.uptime_in_seconds)
    }

    /// Returns the first GPU sample, if any.
    #[must_use]
    pub fn primary_gpu(&self) -> Option<&GpuSample> {
        self.runtime.as_ref().and_then(|r| r.gpus.first())
    }

    /// Returns the `ip:port` pairs of publicly reachable port bindings.
    #[must_use]
    pub fn public_endpoints(&self) -> Vec<String> {
        self.runtime
            .iter()
            .flat_map(|r| r.ports.iter())
            .filter(|p| p.is_ip_public)
            .map(|p| {
                let ip = p.ip.as_deref().unwrap_or("-");
                p.public_port
                    .map_or_else(|| ip.to_string(), |port| format!("{ip}:{port}"))
            })
            .collect()
    }
}

impl PodStatus {
    /// Returns the provider's spelling of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "RUNNING",
            Self::Stopped => "STOPPED",
            Self::Other(s) => s,
        }
    }
}

impl Default for PodStatus {
    fn default() -> Self {
        Self::Other(String::from("UNKNOWN"))
    }
}

impl From<Option<String>> for PodStatus {
    fn from(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("RUNNING") => Self::Running,
            Some("STOPPED") => Self::Stopped,
            Some(other) => Self::Other(other.to_string()),
            None => Self::default(),
        }
    }
}

impl From<PodStatus> for String {
    fn from(status: PodStatus) -> Self {
        match status {
            PodStatus::Running => Self::from("RUNNING"),
            PodStatus::Stopped => Self::from("STOPPED"),
            PodStatus::Other(s) => s,
        }
    }
}

impl std::fmt::Display for PodStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            Self::Start => "start",
            Self::Stop => "stop",
        };
        write!(f, "{op}")
    }
}

impl ActionRequest {
    /// Creates a request with a fresh correlation id.
    #[must_use]
    pub fn new(operation: Operation, pod_id: impl Into<String>, credential: Credential) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            operation,
            pod_id: pod_id.into(),
            credential,
        }
    }
}

impl ListPodsOutcome {
    /// Builds the error outcome for a failed call.
    #[must_use]
    pub fn failed(error: &RunPodError) -> Self {
        Self::Error {
            error: error.to_string(),
            class: error.class(),
        }
    }

    /// Returns the pods if the call succeeded.
    #[must_use]
    pub fn pods(&self) -> Option<&[Pod]> {
        match self {
            Self::Pods { pods } => Some(pods),
            Self::Error { .. } => None,
        }
    }

    /// Returns the error message if the call failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Pods { .. } => None,
            Self::Error { error, .. } => Some(error),
        }
    }

    /// Returns the failure class if the call failed.
    #[must_use]
    pub const fn class(&self) -> Option<ErrorClass> {
        match self {
            Self::Pods { .. } => None,
            Self::Error { class, .. } => Some(*class),
        }
    }
}

impl ActionOutcome {
    /// Builds the error outcome for a failed call.
    #[must_use]
    pub fn failed(error: &RunPodError) -> Self {
        Self::Error {
            error: error.to_string(),
            class: error.class(),
        }
    }

    /// Returns true if the mutation was accepted.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Returns the error message if the call failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Done(_) => None,
            Self::Error { error, .. } => Some(error),
        }
    }

    /// Returns the failure class if the call failed.
    #[must_use]
    pub const fn class(&self) -> Option<ErrorClass> {
        match self {
            Self::Done(_) => None,
            Self::Error { class, .. } => Some(*class),
        }
    }
}
