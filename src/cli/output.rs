//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! pods, action results and errors in text or JSON.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::runpod::{
    ActionDisposition, ActionOutcome, ListPodsOutcome, Operation, Pod, PodSnapshot, PodStatus,
};

use super::commands::OutputFormat;

/// Message shown for an account without pods.
pub const NO_PODS_MESSAGE: &str = "No pods found for this account/API key.";

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Pod row for table display.
#[derive(Tabled)]
struct PodRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
    #[tabled(rename = "GPU (util/mem)")]
    gpu: String,
    #[tabled(rename = "Public ports")]
    ports: String,
    #[tabled(rename = "Action")]
    action: String,
}

impl From<&Pod> for PodRow {
    fn from(pod: &Pod) -> Self {
        let endpoints = pod.public_endpoints();
        Self {
            name: pod.display_name().to_string(),
            id: pod.id.clone(),
            status: format_status(&pod.desired_status),
            uptime: format_uptime(pod.uptime_secs()),
            gpu: format_gpu(pod),
            ports: if endpoints.is_empty() {
                String::from("-")
            } else {
                endpoints.join(", ")
            },
            action: pod.available_action().to_string(),
        }
    }
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the outcome of a list call.
    #[must_use]
    pub fn format_list(&self, outcome: &ListPodsOutcome) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(outcome).unwrap_or_default(),
            OutputFormat::Text => match outcome {
                ListPodsOutcome::Pods { pods } => Self::format_pods_text(pods),
                ListPodsOutcome::Error { error, .. } => Self::format_error_text(error),
            },
        }
    }

    /// Formats a pod snapshot, as published by the controller.
    #[must_use]
    pub fn format_snapshot(&self, snapshot: &PodSnapshot) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string(snapshot).unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = Self::format_pods_text(&snapshot.pods);
                if let Some(at) = snapshot.refreshed_at {
                    let _ = write!(
                        output,
                        "\n{}",
                        format!("Last refreshed {}", at.format("%Y-%m-%d %H:%M:%S UTC")).dimmed()
                    );
                }
                output
            }
        }
    }

    /// Formats pods as a table.
    fn format_pods_text(pods: &[Pod]) -> String {
        if pods.is_empty() {
            return String::from(NO_PODS_MESSAGE);
        }

        let rows: Vec<PodRow> = pods.iter().map(PodRow::from).collect();
        let running = pods.iter().filter(|p| p.is_running()).count();

        let mut output = Table::new(rows).to_string();
        let _ = write!(
            output,
            "\n\n{} pods ({} running, {} not running)",
            pods.len(),
            running.to_string().green(),
            pods.len() - running
        );
        output
    }

    /// Formats the result of a start or stop request.
    ///
    /// Text output appends `snapshot`, the pod list refreshed after the
    /// action, when there is one. JSON output is a single action outcome
    /// document and leaves the snapshot out.
    #[must_use]
    pub fn format_action(
        &self,
        operation: Operation,
        pod_id: &str,
        disposition: &ActionDisposition,
        snapshot: Option<&PodSnapshot>,
    ) -> String {
        match self.format {
            OutputFormat::Json => {
                let outcome = match disposition {
                    ActionDisposition::Succeeded(result) => ActionOutcome::Done(result.clone()),
                    ActionDisposition::Failed { error, class } => ActionOutcome::Error {
                        error: error.clone(),
                        class: *class,
                    },
                    ActionDisposition::Busy => {
                        return serde_json::json!({ "error": busy_message(pod_id) }).to_string();
                    }
                };
                serde_json::to_string_pretty(&outcome).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = match disposition {
                    ActionDisposition::Succeeded(result) => format!(
                        "{} {operation} requested for pod {} (desired status: {})",
                        "✓".green(),
                        result.id,
                        format_status(&result.desired_status)
                    ),
                    ActionDisposition::Failed { error, .. } => Self::format_error_text(error),
                    ActionDisposition::Busy => {
                        format!("{} {}", "⚠".yellow(), busy_message(pod_id))
                    }
                };
                if let Some(snapshot) = snapshot {
                    let _ = write!(output, "\n\n{}", self.format_snapshot(snapshot));
                }
                output
            }
        }
    }

    /// Formats an error message, with a hint when one applies.
    #[must_use]
    pub fn format_error(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => serde_json::json!({ "error": message }).to_string(),
            OutputFormat::Text => Self::format_error_text(message),
        }
    }

    fn format_error_text(message: &str) -> String {
        let mut output = format!("{} {message}", "✗".red());
        if let Some(hint) = hint_for(message) {
            let _ = write!(output, "\n  {}", hint.dimmed());
        }
        output
    }

    /// Formats a success message.
    #[must_use]
    pub fn format_success(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::json!({ "status": "success", "message": message }).to_string()
            }
            OutputFormat::Text => format!("{} {message}", "✓".green()),
        }
    }
}

/// Returns a hint for a user-facing error message, if one applies.
#[must_use]
pub fn hint_for(message: &str) -> Option<&'static str> {
    const AUTH_MARKERS: &[&str] = &["401", "403", "Unauthorized"];
    const NETWORK_MARKERS: &[&str] = &["Failed to fetch", "CORS", "timed out", "bridge unavailable"];

    if AUTH_MARKERS.iter().any(|m| message.contains(m)) {
        Some("Check that your Runpod API key is correct and still active.")
    } else if NETWORK_MARKERS.iter().any(|m| message.contains(m)) {
        Some("Check your network connection and that the Runpod API is reachable.")
    } else {
        None
    }
}

/// Formats an uptime as `"{h}h {m}m {s}s"`, or `-` when there is none.
#[must_use]
pub fn format_uptime(seconds: Option<u64>) -> String {
    match seconds {
        None | Some(0) => String::from("-"),
        Some(total) => {
            let hours = total / 3600;
            let minutes = (total % 3600) / 60;
            let secs = total % 60;
            format!("{hours}h {minutes}m {secs}s")
        }
    }
}

/// Formats a status with color.
fn format_status(status: &PodStatus) -> String {
    match status {
        PodStatus::Running => status.as_str().green().to_string(),
        PodStatus::Stopped => status.as_str().bright_black().to_string(),
        PodStatus::Other(other) => other.yellow().to_string(),
    }
}

/// Formats the first GPU sample as `util% / mem%`.
fn format_gpu(pod: &Pod) -> String {
    pod.primary_gpu().map_or_else(
        || String::from("-"),
        |gpu| {
            format!(
                "{} / {}",
                format_percent(gpu.gpu_util_percent),
                format_percent(gpu.memory_util_percent)
            )
        },
    )
}

fn format_percent(value: Option<f64>) -> String {
    value.map_or_else(|| String::from("-"), |v| format!("{v:.0}%"))
}

fn busy_message(pod_id: &str) -> String {
    format!("An action is already in progress for pod {pod_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::runpod::{ActionResult, GpuSample, PodRuntime, PortBinding};

    fn running_pod() -> Pod {
        Pod {
            id: String::from("p1"),
            name: Some(String::from("trainer")),
            desired_status: PodStatus::Running,
            runtime: Some(PodRuntime {
                uptime_in_seconds: Some(3725),
                gpus: vec![GpuSample {
                    gpu_util_percent: Some(87.4),
                    memory_util_percent: Some(40.0),
                }],
                ports: vec![PortBinding {
                    ip: Some(String::from("194.26.196.6")),
                    public_port: Some(41022),
                    is_ip_public: true,
                }],
            }),
        }
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Some(3725)), "1h 2m 5s");
        assert_eq!(format_uptime(Some(59)), "0h 0m 59s");
        assert_eq!(format_uptime(Some(0)), "-");
        assert_eq!(format_uptime(None), "-");
    }

    #[test]
    fn test_hint_for() {
        assert!(hint_for("Runpod API error: 401 Unauthorized").is_some_and(|h| h.contains("API key")));
        assert!(hint_for("Failed to fetch: dns error").is_some_and(|h| h.contains("network")));
        assert!(hint_for("Runpod API request timed out after 30s").is_some());
        assert!(hint_for("Pod not found").is_none());
    }

    #[test]
    fn test_pod_row() {
        let row = PodRow::from(&running_pod());
        assert_eq!(row.name, "trainer");
        assert_eq!(row.uptime, "1h 2m 5s");
        assert_eq!(row.gpu, "87% / 40%");
        assert_eq!(row.ports, "194.26.196.6:41022");
        assert_eq!(row.action, "stop");
    }

    #[test]
    fn test_empty_list_message() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let output = formatter.format_list(&ListPodsOutcome::Pods { pods: Vec::new() });
        assert_eq!(output, NO_PODS_MESSAGE);
    }

    #[test]
    fn test_text_table_contains_pod() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let output = formatter.format_list(&ListPodsOutcome::Pods {
            pods: vec![running_pod()],
        });
        assert!(output.contains("trainer"));
        assert!(output.contains("RUNNING"));
    }

    #[test]
    fn test_json_list_shape() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_list(&ListPodsOutcome::Error {
            error: String::from("Unauthorized"),
            class: ErrorClass::ProviderRejected,
        });
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(value, serde_json::json!({ "error": "Unauthorized" }));
    }

    fn refreshed_snapshot() -> PodSnapshot {
        PodSnapshot {
            pods: vec![running_pod()],
            refreshed_at: Some(chrono::Utc::now()),
        }
    }

    fn started() -> ActionDisposition {
        ActionDisposition::Succeeded(ActionResult {
            id: String::from("p1"),
            desired_status: PodStatus::Running,
        })
    }

    #[test]
    fn test_json_action_shapes() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let snapshot = refreshed_snapshot();
        let done = formatter.format_action(Operation::Start, "p1", &started(), Some(&snapshot));
        let value: serde_json::Value = serde_json::from_str(&done).expect("single json document");
        assert_eq!(value, serde_json::json!({ "id": "p1", "desiredStatus": "RUNNING" }));

        let busy = formatter.format_action(Operation::Stop, "p1", &ActionDisposition::Busy, None);
        let value: serde_json::Value = serde_json::from_str(&busy).expect("valid json");
        assert!(value["error"].as_str().is_some_and(|e| e.contains("p1")));
    }

    #[test]
    fn test_text_action_appends_snapshot() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let snapshot = refreshed_snapshot();

        let with_pods = formatter.format_action(Operation::Start, "p1", &started(), Some(&snapshot));
        assert!(with_pods.contains("requested for pod p1"));
        assert!(with_pods.contains("trainer"));
        assert!(with_pods.contains("Last refreshed"));

        let alone = formatter.format_action(Operation::Start, "p1", &started(), None);
        assert!(!alone.contains("trainer"));
    }
}
