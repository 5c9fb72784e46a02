// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Halldyll Pod Manager
//!
//! View, start and stop `RunPod` GPU pods with a single API key.
//!
//! ## Overview
//!
//! The crate is a thin, strongly typed client for the `RunPod` GraphQL API:
//!
//! - List every pod of an account with its uptime, GPU load and public ports
//! - Resume a stopped pod or stop a running one
//! - Keep at most one action in flight per pod
//! - Report every failure as a message plus a coarse [`error::ErrorClass`]
//!
//! ## Architecture
//!
//! 1. **Transport**: one authenticated POST per request ([`runpod::Transport`])
//! 2. **Client**: builds the fixed documents and never fails ([`runpod::RunPodClient`])
//! 3. **Controller**: per-pod action state and published snapshots ([`runpod::PodActionController`])
//!
//! ## Modules
//!
//! - [`config`]: Settings, `.env` loading and API key persistence
//! - [`runpod`]: `RunPod` API transport, client and controller
//! - [`error`]: Error types
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! # halldyll.pods.yaml
//! api:
//!   endpoint: https://api.runpod.io/graphql
//!   timeout_secs: 30
//! credentials:
//!   path: ~/.config/halldyll/runpod_api_key
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod runpod;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, Credential, CredentialStore, Settings};
pub use error::{ErrorClass, HalldyllError, Result, RunPodError};
pub use runpod::{
    ActionDisposition, ActionOutcome, ListPodsOutcome, Pod, PodActionController, PodStatus,
    RunPodClient,
};
