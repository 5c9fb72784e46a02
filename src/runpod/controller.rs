//! Per-pod action state machine.
//!
//! The controller owns the `Idle`/`Pending` state of every pod, a shared
//! error channel and the latest pod snapshot. Front ends observe it through
//! `tokio::sync::watch` receivers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Credential;
use crate::error::ErrorClass;

use super::client::RunPodClient;
use super::types::{ActionOutcome, ActionRequest, ActionResult, ListPodsOutcome, Operation, Pod};

/// Prompt shown when a refresh is requested without an API key.
pub const MISSING_KEY_PROMPT: &str = "Please enter your Runpod API Key.";

/// Action state of a single pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionState {
    /// No action in flight.
    Idle,
    /// An action is in flight.
    Pending(Operation),
}

/// What happened to a requested action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionDisposition {
    /// The provider accepted the action.
    Succeeded(ActionResult),
    /// The action failed; the message was published on the error channel.
    Failed {
        /// Operator-facing message.
        error: String,
        /// Failure class.
        class: ErrorClass,
    },
    /// Another action was already in flight for the pod; nothing was sent.
    Busy,
}

/// The last successfully listed pod collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSnapshot {
    /// Pods, in provider order.
    pub pods: Vec<Pod>,
    /// When the collection was fetched, `None` before the first refresh.
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Drives start/stop actions and list refreshes for a front end.
#[derive(Debug)]
pub struct PodActionController {
    client: RunPodClient,
    states: Mutex<HashMap<String, Operation>>,
    pods: watch::Sender<PodSnapshot>,
    error: watch::Sender<Option<String>>,
    loading: AtomicUsize,
}

/// Marks a pod as pending for as long as it is alive.
struct PendingGuard<'a> {
    states: &'a Mutex<HashMap<String, Operation>>,
    pod_id: String,
}

impl<'a> PendingGuard<'a> {
    /// Moves `pod_id` to `Pending`, or returns `None` if it already is.
    fn acquire(
        states: &'a Mutex<HashMap<String, Operation>>,
        pod_id: &str,
        operation: Operation,
    ) -> Option<Self> {
        let mut map = states.lock().unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(pod_id) {
            return None;
        }
        map.insert(pod_id.to_string(), operation);
        Some(Self {
            states,
            pod_id: pod_id.to_string(),
        })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.pod_id);
    }
}

/// Counts an in-flight refresh.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl PodActionController {
    /// Creates a controller with an empty snapshot and no error.
    #[must_use]
    pub fn new(client: RunPodClient) -> Self {
        Self {
            client,
            states: Mutex::new(HashMap::new()),
            pods: watch::Sender::new(PodSnapshot::default()),
            error: watch::Sender::new(None),
            loading: AtomicUsize::new(0),
        }
    }

    /// Starts a pod unless an action is already in flight for it.
    pub async fn start_pod(&self, credential: &Credential, pod_id: &str) -> ActionDisposition {
        self.run(ActionRequest::new(Operation::Start, pod_id, credential.clone()))
            .await
    }

    /// Stops a pod unless an action is already in flight for it.
    pub async fn stop_pod(&self, credential: &Credential, pod_id: &str) -> ActionDisposition {
        self.run(ActionRequest::new(Operation::Stop, pod_id, credential.clone()))
            .await
    }

    /// Runs one action round trip.
    ///
    /// The pod stays `Pending` until the follow-up refresh has settled.
    async fn run(&self, request: ActionRequest) -> ActionDisposition {
        let Some(_pending) = PendingGuard::acquire(&self.states, &request.pod_id, request.operation)
        else {
            debug!(
                request_id = %request.request_id,
                "Pod {} busy, ignoring {}",
                request.pod_id,
                request.operation
            );
            return ActionDisposition::Busy;
        };

        info!(
            request_id = %request.request_id,
            "Requesting {} of pod {}",
            request.operation,
            request.pod_id
        );
        self.error.send_replace(None);

        let outcome = match request.operation {
            Operation::Start => {
                self.client
                    .start_pod(&request.credential, &request.pod_id)
                    .await
            }
            Operation::Stop => {
                self.client
                    .stop_pod(&request.credential, &request.pod_id)
                    .await
            }
        };

        match outcome {
            ActionOutcome::Done(result) => {
                self.error.send_replace(None);
                self.refresh(&request.credential).await;
                ActionDisposition::Succeeded(result)
            }
            ActionOutcome::Error { error, class } => {
                warn!(
                    request_id = %request.request_id,
                    "{} of pod {} failed ({class})",
                    request.operation,
                    request.pod_id
                );
                self.error.send_replace(Some(error.clone()));
                ActionDisposition::Failed { error, class }
            }
        }
    }

    /// Fetches the pod list and publishes the result.
    ///
    /// Success replaces the snapshot and clears the error. Failure publishes
    /// the error and keeps the previous snapshot.
    pub async fn refresh(&self, credential: &Credential) -> ListPodsOutcome {
        if credential.is_empty() {
            self.error.send_replace(Some(MISSING_KEY_PROMPT.to_string()));
            return ListPodsOutcome::Error {
                error: MISSING_KEY_PROMPT.to_string(),
                class: ErrorClass::MissingCredential,
            };
        }

        let _loading = LoadingGuard::new(&self.loading);
        let outcome = self.client.list_pods(credential).await;

        match &outcome {
            ListPodsOutcome::Pods { pods } => {
                info!("Refreshed {} pods", pods.len());
                self.pods.send_replace(PodSnapshot {
                    pods: pods.clone(),
                    refreshed_at: Some(Utc::now()),
                });
                self.error.send_replace(None);
            }
            ListPodsOutcome::Error { error, .. } => {
                self.error.send_replace(Some(error.clone()));
            }
        }

        outcome
    }

    /// Returns the action state of a pod.
    #[must_use]
    pub fn state_of(&self, pod_id: &str) -> ActionState {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pod_id)
            .map_or(ActionState::Idle, |op| ActionState::Pending(*op))
    }

    /// Returns true while a refresh is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    /// Returns a copy of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> PodSnapshot {
        self.pods.borrow().clone()
    }

    /// Returns the currently published error, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.error.borrow().clone()
    }

    /// Subscribes to snapshot updates.
    #[must_use]
    pub fn subscribe_pods(&self) -> watch::Receiver<PodSnapshot> {
        self.pods.subscribe()
    }

    /// Subscribes to error updates.
    #[must_use]
    pub fn subscribe_errors(&self) -> watch::Receiver<Option<String>> {
        self.error.subscribe()
    }
}
