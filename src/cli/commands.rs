//! CLI command implementations
//!
//! `watch` runs the monitor until Ctrl-C or end of stdin. `check` is a
//! one-shot report over the snapshot file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::BufReader;

use crate::backend::{ClusterSnapshot, SnapshotBackend};
use crate::monitor::{
    evaluate, LostUserMonitor, MonitorConfig, ReplicaVerdict, Termination,
    OUTPUT_CAPACITY_DEFAULT,
};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_lost_user, write_response};

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cluster snapshot file (required)
    pub snapshot_path: PathBuf,

    /// Delay before the first re-check of a newly seen resource
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    /// Delay before re-checking a resource seen before
    #[serde(default = "default_existing_delay_secs")]
    pub existing_delay_secs: u64,

    #[serde(default = "default_output_capacity")]
    pub output_capacity: usize,

    /// trace, info, warn, error or fatal
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_initial_delay_secs() -> u64 {
    60
}
fn default_existing_delay_secs() -> u64 {
    45
}
fn default_output_capacity() -> usize {
    OUTPUT_CAPACITY_DEFAULT
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.snapshot_path.as_os_str().is_empty() {
            return Err(CliError::config_error("snapshot_path must not be empty"));
        }

        self.severity()?;

        self.to_monitor_config()
            .validate()
            .map_err(|e| CliError::config_error(e.to_string()))
    }

    pub fn to_monitor_config(&self) -> MonitorConfig {
        MonitorConfig::new()
            .with_delay(
                Duration::from_secs(self.initial_delay_secs),
                Duration::from_secs(self.existing_delay_secs),
            )
            .with_output_capacity(self.output_capacity)
    }

    pub fn severity(&self) -> CliResult<Severity> {
        match self.log_level.to_ascii_lowercase().as_str() {
            "trace" => Ok(Severity::Trace),
            "info" => Ok(Severity::Info),
            "warn" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(CliError::config_error(format!(
                "Invalid log_level: '{}'",
                other
            ))),
        }
    }
}

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Watch { config } => watch(&config),
        Command::Check { config } => check(&config),
    }
}

/// Run the monitor against the configured snapshot, reading may-promote
/// events from stdin.
pub fn watch(config_path: &Path) -> CliResult<()> {
    let config = load_and_announce(config_path)?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create runtime: {}", e)))?;
    let result = runtime.block_on(watch_until_done(config));
    // A blocking stdin read would otherwise keep the runtime alive.
    runtime.shutdown_background();

    result
}

async fn watch_until_done(config: Config) -> CliResult<()> {
    let backend = Arc::new(SnapshotBackend::new(
        config.snapshot_path.clone(),
        BufReader::new(tokio::io::stdin()),
    ));
    let (handle, mut lost) = LostUserMonitor::start(backend, config.to_monitor_config()).await?;

    let stop = handle.stop_handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.stop();
        }
    });

    while let Some(resource_name) = lost.recv().await {
        if let Err(e) = write_lost_user(&resource_name) {
            handle.stop();
            ctrl_c.abort();
            drop(lost);
            handle.join().await;
            return Err(e);
        }
    }

    let termination = handle.join().await;
    ctrl_c.abort();

    match termination {
        Termination::BackendFailure(error) => Err(CliError::backend_failure(&error)),
        Termination::Stopped | Termination::StreamEnded => Ok(()),
    }
}

/// Print quorum and promotion status for every resource definition
pub fn check(config_path: &Path) -> CliResult<()> {
    let config = load_and_announce(config_path)?;

    let content = fs::read_to_string(&config.snapshot_path).map_err(|e| {
        CliError::snapshot_error(format!(
            "Failed to read {}: {}",
            config.snapshot_path.display(),
            e
        ))
    })?;
    let snapshot =
        ClusterSnapshot::parse(&content).map_err(|e| CliError::snapshot_error(e.to_string()))?;

    write_response(check_report(&snapshot))
}

fn load_and_announce(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);

    let path = config_path.display().to_string();
    let snapshot = config.snapshot_path.display().to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("config", path.as_str()), ("snapshot", snapshot.as_str())],
    );

    Ok(config)
}

fn check_report(snapshot: &ClusterSnapshot) -> Value {
    let resources: Vec<Value> = snapshot
        .resource_definitions
        .iter()
        .map(|definition| {
            let replicas = snapshot.replicas(&definition.name).unwrap_or_default();
            let verdict = match evaluate(&replicas) {
                ReplicaVerdict::LayerMismatch(kind) => json!({
                    "status": "layer_mismatch",
                    "layer": kind.as_str(),
                }),
                ReplicaVerdict::Promotable => json!({ "status": "may_promote" }),
                ReplicaVerdict::Settled => json!({ "status": "settled" }),
            };

            json!({
                "resource": definition.name,
                "quorum": definition.quorum_enabled(),
                "replicas": replicas.len(),
                "verdict": verdict,
            })
        })
        .collect();

    json!({ "resources": resources })
}
