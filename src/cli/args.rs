use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::app::{BackendMode, Config};
use crate::backend::ServiceTag;

#[derive(Parser, Debug)]
#[command(name = "finova")]
#[command(version)]
#[command(about = "Terminal client for the Finova financial advisory platform", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Base URL of the advisory API server
    #[arg(long, env = "FINOVA_BASE_URL")]
    pub base_url: Option<String>,

    /// Answer from the built-in simulated backend instead of the API server
    #[arg(long)]
    pub simulated: bool,

    /// Service to start with
    #[arg(short, long, value_enum)]
    pub service: Option<ServiceTag>,

    /// Non-interactive prompt to execute
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Output format for non-interactive mode
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, requires = "prompt")]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Layer command-line overrides on top of loaded configuration
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(url) = &self.base_url {
            config.backend.base_url = url.clone();
        }
        if self.simulated {
            config.backend.mode = BackendMode::Simulated;
        }
        if let Some(service) = self.service {
            config.session.default_service = service;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// Start a chat session (default)
    Chat,
    /// Check whether the API server and its agents are ready
    Health,
    /// Ask the API server to initialize its agents
    InitAgents,
    /// Upload documents to the knowledge base in one request
    Upload {
        /// Files to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List documents in the knowledge base
    Files,
    /// Show version information
    Version,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Text,
    /// JSON structured output
    Json,
}
