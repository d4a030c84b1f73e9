use anyhow::Result;
use colored::Colorize;
use tracing::info;

use crate::{
    app::{load_config, load_config_file, Config},
    cli::{handle_command, Cli},
    session::{SessionController, SessionState},
    tui::{run_ui, App},
    utils::log_progress,
};

/// Main runtime orchestrator
pub struct Orchestrator {
    cli: Cli,
    config: Config,
}

impl Orchestrator {
    /// Create a new orchestrator from CLI args
    pub fn new(cli: Cli) -> Result<Self> {
        let config = resolve_config(&cli)?;
        Ok(Self { cli, config })
    }

    /// Run the orchestrator
    pub async fn run(self) -> Result<()> {
        // Handle subcommands
        if let Some(command) = &self.cli.command {
            if handle_command(command, &self.config).await? {
                return Ok(()); // Command handled, exit
            }
            // Continue to chat for Commands::Chat
        }

        let gateway = self.config.gateway()?;
        println!(
            "💹 Starting Finova against {}",
            gateway.name().green()
        );

        let controller = SessionController::with_state(
            gateway,
            SessionState::new(self.config.session.default_service),
        );

        if self.config.session.check_health_on_start {
            log_progress(1, 1, "Checking API health");
            let status = controller.check_health().await;
            info!("Initial connectivity: {:?}", status);
        }

        let app = App::new(controller, self.config.ui.clone());
        run_ui(app).await
    }
}

/// Load configuration (explicit file, or the layered defaults) and apply CLI overrides
pub fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        load_config_file(config_path)?
    } else {
        match load_config() {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("⚠️  Failed to load config: {}. Using defaults.", e);
                Config::default()
            }
        }
    };
    cli.apply_to(&mut config);
    Ok(config)
}
