//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Halldyll Pods - view, start and stop your `RunPod` GPU pods.
#[derive(Parser, Debug)]
#[command(name = "halldyll-pods")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the settings file.
    #[arg(short, long, global = true, env = "HALLDYLL_CONFIG")]
    pub config: Option<PathBuf>,

    /// `RunPod` API key (overrides the stored key).
    #[arg(long, global = true, env = "RUNPOD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Log format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all pods of the account.
    List,

    /// Start (resume) a stopped pod.
    Start {
        /// Pod identifier.
        pod_id: String,
    },

    /// Stop a running pod.
    Stop {
        /// Pod identifier.
        pod_id: String,
    },

    /// Refresh the pod list periodically.
    Watch {
        /// Seconds between refreshes.
        #[arg(short, long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
    },

    /// Manage the stored API key.
    Key {
        /// Key subcommand.
        #[command(subcommand)]
        command: KeyCommands,
    },
}

/// API key management subcommands.
#[derive(Subcommand, Debug)]
pub enum KeyCommands {
    /// Store an API key.
    Set {
        /// The `RunPod` API key.
        key: String,
    },

    /// Show the stored key, masked.
    Show,

    /// Remove the stored key.
    Clear,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Log format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_start() {
        let cli = Cli::try_parse_from(["halldyll-pods", "--output", "json", "start", "p1"])
            .expect("should parse");
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Start { ref pod_id } if pod_id == "p1"));
    }

    #[test]
    fn test_parse_key_set() {
        let cli = Cli::try_parse_from(["halldyll-pods", "key", "set", "abc"]).expect("should parse");
        assert!(matches!(
            cli.command,
            Commands::Key { command: KeyCommands::Set { ref key } } if key == "abc"
        ));
    }

    #[test]
    fn test_watch_rejects_zero_interval() {
        assert!(Cli::try_parse_from(["halldyll-pods", "watch", "--interval", "0"]).is_err());
    }
}
