use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::device::uiautomator::{DEFAULT_HOST, DEFAULT_PORT};
use crate::engine::runner::RunOptions;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "apk-controller",
    version,
    about = "Drive an Android app through a scripted graph of screens"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: apk-controller.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a script against a connected device
    Run {
        /// Path to the script definition YAML file
        #[arg(long)]
        script: String,

        /// adb serial of the target device
        #[arg(long)]
        serial: Option<String>,

        /// Host of the forwarded uiautomator server
        #[arg(long)]
        host: Option<String>,

        /// Port of the forwarded uiautomator server
        #[arg(long)]
        port: Option<u16>,

        /// Replace previously exported screen data
        #[arg(long)]
        overwrite: bool,

        /// Directory for exported screen hierarchies (export is off without it)
        #[arg(long)]
        export_dir: Option<String>,

        /// Append a JSONL trace of every cycle to this file
        #[arg(long)]
        trace: Option<String>,

        /// Write the run report as JSON to this file
        #[arg(long)]
        report: Option<String>,

        /// Skip waiting for a start screen right after launching the app
        #[arg(long)]
        no_await_launch: bool,
    },

    /// Build a script and check its graph without touching a device
    Validate {
        /// Path to the script definition YAML file
        #[arg(long)]
        script: String,
    },

    /// Print the screens expected after an action
    Expected {
        /// Path to the script definition YAML file
        #[arg(long)]
        script: String,

        /// Screen the action is taken on
        #[arg(long)]
        screen: u32,

        /// Index of the action
        #[arg(long)]
        action: u32,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `apk-controller.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    pub serial: Option<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            serial: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub overwrite: bool,

    #[serde(default = "default_true")]
    pub await_launch: bool,

    pub export_dir: Option<String>,

    pub trace: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            overwrite: false,
            await_launch: true,
            export_dir: None,
            trace: None,
        }
    }
}

// Serde default helpers
fn default_host() -> String { DEFAULT_HOST.to_string() }
fn default_port() -> u16 { DEFAULT_PORT }
fn default_true() -> bool { true }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("apk-controller.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Settings for one `run` invocation after merging CLI flags over config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRun {
    pub host: String,
    pub port: u16,
    pub serial: Option<String>,
    pub options: RunOptions,
    pub export_dir: Option<String>,
    pub trace: Option<String>,
}

/// Merge `run` flags over the config file. Flags win; boolean flags can
/// only switch a setting on (`--overwrite`) or off (`--no-await-launch`).
#[allow(clippy::too_many_arguments)]
pub fn resolve_run(
    config: &AppConfig,
    serial: Option<&str>,
    host: Option<&str>,
    port: Option<u16>,
    overwrite: bool,
    export_dir: Option<&str>,
    trace: Option<&str>,
    no_await_launch: bool,
) -> ResolvedRun {
    ResolvedRun {
        host: host.unwrap_or(&config.device.host).to_string(),
        port: port.unwrap_or(config.device.port),
        serial: serial
            .map(str::to_string)
            .or_else(|| config.device.serial.clone()),
        options: RunOptions {
            overwrite: overwrite || config.run.overwrite,
            await_launch: !no_await_launch && config.run.await_launch,
        },
        export_dir: export_dir
            .map(str::to_string)
            .or_else(|| config.run.export_dir.clone()),
        trace: trace.map(str::to_string).or_else(|| config.run.trace.clone()),
    }
}
