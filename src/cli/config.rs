use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    inspector::agent::AgentConfig,
    locator::{formatter::Framework, generator::GeneratorConfig},
    panel::control_panel::PanelConfig,
    sync::channel::RetryPolicy,
};

pub const DEFAULT_CONFIG_FILE: &str = "selector-helper.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "selector-helper",
    version,
    about = "Pick stable test locators for DOM elements"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Target framework: cypress or playwright
    #[arg(long, global = true)]
    pub framework: Option<String>,

    /// Shared store file (default: from config, else in-memory)
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Path to config file (default: selector-helper.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List locator candidates for one element of a DOM snapshot
    Candidates {
        /// DOM snapshot JSON file
        #[arg(long)]
        dom: String,

        /// Selector resolving to exactly one element
        #[arg(long)]
        target: String,

        /// Print the candidates as JSON
        #[arg(long)]
        json: bool,
    },

    /// Format a single locator value as framework code
    Format {
        /// Candidate kind: css, placeholder, alt, text, css-path
        #[arg(long)]
        kind: String,

        #[arg(long)]
        value: String,
    },

    /// Inspect, click and capture an element end to end
    Capture {
        /// DOM snapshot JSON file
        #[arg(long)]
        dom: String,

        /// Selector resolving to exactly one element
        #[arg(long)]
        target: String,

        /// Pick this option from the captured list instead of the best one
        #[arg(long)]
        select: Option<usize>,

        /// Write one JSONL line per inspector transition
        #[arg(long)]
        trace: Option<String>,
    },

    /// Show the capture history
    History {
        /// Print the entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove the captured options and output
    Clear {
        /// Also forget the capture history
        #[arg(long)]
        history: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `selector-helper.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub framework: Framework,

    pub store_path: Option<String>,

    pub trace_path: Option<String>,

    #[serde(default)]
    pub inspector: InspectorSettings,

    #[serde(default)]
    pub panel: PanelSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectorSettings {
    #[serde(default = "default_flash_ms")]
    pub flash_ms: u64,

    #[serde(default = "default_descendant_limit")]
    pub descendant_limit: usize,

    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl Default for InspectorSettings {
    fn default() -> Self {
        Self {
            flash_ms: default_flash_ms(),
            descendant_limit: default_descendant_limit(),
            history_capacity: default_history_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelSettings {
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_status_ms")]
    pub status_ms: u64,

    #[serde(default = "default_copy_clear_ms")]
    pub copy_clear_ms: u64,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            status_ms: default_status_ms(),
            copy_clear_ms: default_copy_clear_ms(),
        }
    }
}

// Serde default helpers
fn default_flash_ms() -> u64 { 500 }
fn default_descendant_limit() -> usize { 10 }
fn default_history_capacity() -> usize { 50 }
fn default_retry_delay_ms() -> u64 { 100 }
fn default_status_ms() -> u64 { 2000 }
fn default_copy_clear_ms() -> u64 { 700 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load the YAML config. A missing default file yields defaults; an
/// explicitly named file that is missing, or any malformed file, is an error.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    let content = match std::fs::read_to_string(config_path) {
        Ok(c) => c,
        Err(e) if path.is_none() && e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: config_path.to_string(),
                source,
            });
        }
    };
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: config_path.to_string(),
        source,
    })
}

// ============================================================================
// Config Builders (merge config file into runtime settings)
// ============================================================================

impl AppConfig {
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            flash_duration: Duration::from_millis(self.inspector.flash_ms),
            history_capacity: self.inspector.history_capacity,
            generator: GeneratorConfig {
                descendant_limit: self.inspector.descendant_limit,
            },
        }
    }

    pub fn panel_config(&self) -> PanelConfig {
        PanelConfig {
            retry: RetryPolicy {
                retry_delay: Duration::from_millis(self.panel.retry_delay_ms),
            },
            status_duration: Duration::from_millis(self.panel.status_ms),
            copy_clear_delay: Duration::from_millis(self.panel.copy_clear_ms),
        }
    }
}
