use anyhow::Result;
use colored::Colorize;
use futures::future::try_join_all;
use std::path::PathBuf;

use crate::{
    app::{init_config, Config},
    backend::UploadFile,
    session::{ConnectivityStatus, SessionController, UploadOutcome},
};

use super::Commands;

/// Handle CLI subcommands. Returns false when the chat UI should start.
pub async fn handle_command(command: &Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Initializing Finova configuration...");
            let path = init_config()?;
            println!("Configuration ready at {}", path.display());
            Ok(true)
        }
        Commands::Version => {
            show_version();
            Ok(true)
        }
        Commands::Health => {
            let controller = SessionController::new(config.gateway()?);
            let status = controller.check_health().await;
            print_status(&controller.gateway_name(), status);
            Ok(true)
        }
        Commands::InitAgents => {
            let controller = SessionController::new(config.gateway()?);
            println!("Initializing agents...");
            let status = controller.initialize_agents().await;
            print_status(&controller.gateway_name(), status);
            Ok(true)
        }
        Commands::Upload { paths } => {
            upload(paths, config).await?;
            Ok(true)
        }
        Commands::Files => {
            list_files(config).await?;
            Ok(true)
        }
        Commands::Chat => Ok(false), // Continue to chat interface
    }
}

/// Show version information
pub fn show_version() {
    println!("Finova v{}", env!("CARGO_PKG_VERSION"));
    println!("   Terminal client for the Finova financial advisory platform");
}

fn print_status(backend: &str, status: ConnectivityStatus) {
    let label = match status {
        ConnectivityStatus::Connected => format!("[OK] {}", status.label()).green(),
        ConnectivityStatus::AgentsNotReady | ConnectivityStatus::Unknown => {
            format!("[WARNING] {}", status.label()).yellow()
        }
        ConnectivityStatus::ApiDown | ConnectivityStatus::InitializationFailed => {
            format!("[ERROR] {}", status.label()).red()
        }
    };
    println!("  Backend: {}", backend);
    println!("  {}", label);
}

async fn upload(paths: &[PathBuf], config: &Config) -> Result<()> {
    let files = try_join_all(paths.iter().map(|p| UploadFile::from_path(p))).await?;
    let controller = SessionController::new(config.gateway()?);

    let outcome = controller.upload_files(files).await;
    if let Some(message) = controller.snapshot().last_message() {
        match outcome {
            UploadOutcome::Uploaded { .. } => println!("{}", message.text.green()),
            _ => println!("{}", message.text.red()),
        }
    }

    if outcome == UploadOutcome::Failed {
        anyhow::bail!("Upload failed");
    }
    Ok(())
}

async fn list_files(config: &Config) -> Result<()> {
    let controller = SessionController::new(config.gateway()?);
    let files = controller.refresh_files().await?;

    if files.is_empty() {
        println!("No documents in the knowledge base.");
    } else {
        println!("Knowledge base documents ({}):", files.len());
        for file in files {
            println!("  • {}", file.green());
        }
    }
    Ok(())
}
