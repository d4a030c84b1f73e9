use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{BackendGateway, HttpGateway, ServiceTag, SimulatedGateway};
use crate::constants::{DEFAULT_API_BASE_URL, SIMULATED_LATENCY_MS};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Session defaults
    #[serde(default)]
    pub session: SessionConfig,

    /// UI configuration
    #[serde(default)]
    pub ui: UIConfig,
}

/// Which backend implementation answers requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    #[default]
    Http,
    Simulated,
}

/// Backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub mode: BackendMode,
    /// Base URL of the advisory API server
    pub base_url: String,
    /// Optional client-side timeout; requests wait for the transport when unset
    pub request_timeout_secs: Option<u64>,
    /// Artificial reply delay for the simulated backend
    pub simulated_latency_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            mode: BackendMode::Http,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: None,
            simulated_latency_ms: SIMULATED_LATENCY_MS,
        }
    }
}

/// Session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Service selected when a session starts
    pub default_service: ServiceTag,
    /// Probe the backend once at startup
    pub check_health_on_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_service: ServiceTag::All,
            check_health_on_start: true,
        }
    }
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UIConfig {
    /// Offer example prompts on an empty conversation
    pub show_quick_prompts: bool,
    /// Show message timestamps
    pub show_timestamps: bool,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            show_quick_prompts: true,
            show_timestamps: true,
        }
    }
}

impl Config {
    /// Build the gateway this configuration describes
    pub fn gateway(&self) -> Result<Arc<dyn BackendGateway>> {
        let gateway: Arc<dyn BackendGateway> = match self.backend.mode {
            BackendMode::Http => Arc::new(HttpGateway::new(
                &self.backend.base_url,
                self.backend.request_timeout_secs.map(Duration::from_secs),
            )?),
            BackendMode::Simulated => Arc::new(SimulatedGateway::new(Duration::from_millis(
                self.backend.simulated_latency_ms,
            ))),
        };
        Ok(gateway)
    }
}

/// Load configuration from multiple sources
pub fn load_config() -> Result<Config> {
    let config_dir = get_config_dir()?;
    let global_config = config_dir.join("config.toml");
    let local_config = PathBuf::from(".finova/config.toml");

    load_config_from(&[global_config, local_config])
}

/// Merge defaults, the given TOML files (later wins) and `FINOVA_` environment variables
pub fn load_config_from(files: &[PathBuf]) -> Result<Config> {
    let mut figment = Figment::from(Serialized::defaults(Config::default()));

    for file in files {
        if file.exists() {
            figment = figment.merge(Toml::file(file));
        }
    }

    // FINOVA_BACKEND__BASE_URL -> backend.base_url
    figment = figment.merge(Env::prefixed("FINOVA_").split("__"));

    figment
        .extract()
        .context("Failed to load configuration")
}

/// Load a single explicit config file on top of the defaults
pub fn load_config_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    load_config_from(&[path.to_path_buf()])
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "finova") {
        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;
        Ok(config_dir.to_path_buf())
    } else {
        // Fallback to home directory
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        let config_dir = PathBuf::from(home).join(".config").join("finova");
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = if let Some(p) = path {
        p
    } else {
        get_config_dir()?.join("config.toml")
    };

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<PathBuf> {
    let config_dir = get_config_dir()?;
    let config_file = config_dir.join("config.toml");

    if !config_file.exists() {
        save_config(&Config::default(), Some(config_file.clone()))?;
        println!("Created default configuration at: {}", config_file.display());
    }

    // Create example local config
    let local_example = PathBuf::from(".finova/config.toml.example");
    if !local_example.exists() {
        if let Some(parent) = local_example.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let example_config = r#"# Finova Project Configuration
# This file overrides global settings for this directory

[backend]
mode = "http"            # or "simulated" for offline demos
base_url = "http://localhost:5001"
# request_timeout_secs = 120

[session]
default_service = "all"  # investment | advisor | research | all
check_health_on_start = true
"#;
        std::fs::write(&local_example, example_config)?;
        println!("Created example configuration at: {}", local_example.display());
    }

    Ok(config_file)
}
