use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use finova::{
    cli::Cli,
    runtime::{resolve_config, NonInteractiveRunner, Orchestrator},
    utils::init_logger,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.verbose {
        init_logger("info");
    }

    match cli.prompt.clone() {
        Some(prompt) => ask(cli, prompt).await,
        None => {
            Orchestrator::new(cli)?.run().await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// One-shot mode: send a single prompt, print the reply, exit
async fn ask(cli: Cli, prompt: String) -> Result<ExitCode> {
    let config = resolve_config(&cli)?;
    let runner = NonInteractiveRunner::new(&config)?;

    let result = runner.execute(prompt).await?;
    println!("{}", runner.format_result(&result, cli.output_format));

    // Error-flagged replies still print, but the exit code tells scripts it failed
    Ok(ExitCode::from(result.exit_code()))
}
