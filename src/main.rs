//! Halldyll Pods CLI entrypoint.
//!
//! This is the main entrypoint for the halldyll-pods command-line tool.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use halldyll_pod_manager::cli::{
    Cli, Commands, KeyCommands, LogFormat, OutputFormatter, watch_until,
};
use halldyll_pod_manager::config::{
    ConfigParser, ConfigValidator, Credential, CredentialStore, Settings,
};
use halldyll_pod_manager::error::Result;
use halldyll_pod_manager::runpod::{
    ActionDisposition, Operation, PodActionController, RunPodClient,
};

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.log_format);

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool, format: LogFormat) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Main async entry point.
///
/// Returns `Ok(false)` when the command ran but the provider reported a failure.
async fn run(cli: Cli) -> Result<bool> {
    let formatter = OutputFormatter::new(cli.output);
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Commands::Key { command } => cmd_key(&settings, command, &formatter),
        Commands::List => {
            let credential = resolve_credential(cli.api_key, &settings)?;
            cmd_list(&settings, &credential, &formatter).await
        }
        Commands::Start { pod_id } => {
            let credential = resolve_credential(cli.api_key, &settings)?;
            cmd_action(&settings, &credential, Operation::Start, &pod_id, &formatter).await
        }
        Commands::Stop { pod_id } => {
            let credential = resolve_credential(cli.api_key, &settings)?;
            cmd_action(&settings, &credential, Operation::Stop, &pod_id, &formatter).await
        }
        Commands::Watch { interval } => {
            let credential = resolve_credential(cli.api_key, &settings)?;
            cmd_watch(&settings, &credential, interval, &formatter).await
        }
    }
}

/// Loads `.env`, resolves and validates the settings.
fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    let base = config_path
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let parser = ConfigParser::new().with_base_path(base);
    parser.load_dotenv()?;

    let settings = parser.resolve(config_path)?;
    let result = ConfigValidator::new().validate(&settings)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }

    debug!("Using endpoint {}", settings.api.endpoint);
    Ok(settings)
}

/// Resolves the API key: flag or environment first, then the store.
///
/// An absent key resolves to an empty credential; the client reports it.
fn resolve_credential(flag: Option<String>, settings: &Settings) -> Result<Credential> {
    if let Some(credential) = flag.map(Credential::new).filter(|c| !c.is_empty()) {
        debug!("Using API key from command line or environment");
        return Ok(credential);
    }

    let store = settings.credential_store()?;
    match store.get()? {
        Some(credential) => {
            debug!("Using stored API key from {}", store.path().display());
            Ok(credential)
        }
        None => Ok(Credential::default()),
    }
}

/// Builds a controller from the settings.
fn controller(settings: &Settings) -> Result<PodActionController> {
    Ok(PodActionController::new(RunPodClient::from_settings(
        &settings.api,
    )?))
}

/// List pods.
async fn cmd_list(
    settings: &Settings,
    credential: &Credential,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let controller = controller(settings)?;
    let outcome = controller.refresh(credential).await;

    emit(&formatter.format_list(&outcome))?;
    Ok(outcome.error().is_none())
}

/// Start or stop a pod.
async fn cmd_action(
    settings: &Settings,
    credential: &Credential,
    operation: Operation,
    pod_id: &str,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let controller = controller(settings)?;
    let disposition = match operation {
        Operation::Start => controller.start_pod(credential, pod_id).await,
        Operation::Stop => controller.stop_pod(credential, pod_id).await,
    };

    let succeeded = matches!(disposition, ActionDisposition::Succeeded(_));
    let refresh_error = if succeeded { controller.last_error() } else { None };
    let snapshot = (succeeded && refresh_error.is_none()).then(|| controller.snapshot());

    emit(&formatter.format_action(operation, pod_id, &disposition, snapshot.as_ref()))?;
    if let Some(error) = refresh_error {
        eprintln!("{}", formatter.format_error(&error));
    }
    Ok(succeeded)
}

/// Refresh the pod list until interrupted.
async fn cmd_watch(
    settings: &Settings,
    credential: &Credential,
    interval_secs: u64,
    formatter: &OutputFormatter,
) -> Result<bool> {
    let controller = controller(settings)?;
    info!("Refreshing every {interval_secs}s, press Ctrl-C to stop");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    watch_until(
        &controller,
        credential,
        Duration::from_secs(interval_secs),
        shutdown,
        |outcome, snapshot| match outcome.error() {
            Some(error) => {
                eprintln!("{}", formatter.format_error(error));
                Ok(())
            }
            None => emit(&formatter.format_snapshot(snapshot)),
        },
    )
    .await?;
    Ok(true)
}

/// Manage the stored API key.
fn cmd_key(settings: &Settings, command: KeyCommands, formatter: &OutputFormatter) -> Result<bool> {
    let store = settings.credential_store()?;

    match command {
        KeyCommands::Set { key } => {
            let credential = Credential::new(key);
            if credential.is_empty() {
                eprintln!("{}", formatter.format_error("API key cannot be empty"));
                return Ok(false);
            }
            store.set(&credential)?;
            emit(&formatter.format_success(&format!(
                "API key saved to {}",
                store.path().display()
            )))?;
        }
        KeyCommands::Show => match store.get()? {
            Some(credential) => emit(&formatter.format_success(&format!(
                "Stored API key: {}",
                credential.masked()
            )))?,
            None => {
                eprintln!("{}", formatter.format_error("No API key stored"));
                return Ok(false);
            }
        },
        KeyCommands::Clear => {
            store.clear()?;
            emit(&formatter.format_success("Stored API key removed"))?;
        }
    }

    Ok(true)
}

/// Writes command output to stdout.
fn emit(output: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}
