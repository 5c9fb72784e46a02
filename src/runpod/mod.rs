//! `RunPod` API integration module.
//!
//! This module provides everything needed to talk to the `RunPod` GraphQL
//! API: the transport, the fixed request documents, the non-failing client
//! and the per-pod action controller.

mod client;
mod controller;
pub mod queries;
mod transport;
mod types;

pub use client::RunPodClient;
pub use controller::{
    ActionDisposition, ActionState, MISSING_KEY_PROMPT, PodActionController, PodSnapshot,
};
pub use queries::{GraphQLRequest, ResumeBid};
pub use transport::{HttpTransport, Transport, UnavailableTransport, unwrap_envelope};
pub use types::{
    ActionOutcome, ActionRequest, ActionResult, GpuSample, ListPodsOutcome, Operation, Pod,
    PodRuntime, PodStatus, PortBinding,
};
