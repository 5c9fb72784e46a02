//! CLI module for the Halldyll pod manager.
//!
//! This module provides the command-line interface for listing,
//! starting and stopping `RunPod` pods.

mod commands;
mod output;
mod watch;

pub use commands::{Cli, Commands, KeyCommands, LogFormat, OutputFormat};
pub use output::{NO_PODS_MESSAGE, OutputFormatter, format_uptime, hint_for};
pub use watch::watch_until;
