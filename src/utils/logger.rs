use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the stderr tracing subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_logger(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stderr keeps log lines out of the TUI and out of piped `-p` output
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

/// Startup step indicator, printed before the TUI takes the screen
pub fn log_progress(step: usize, total: usize, message: impl std::fmt::Display) {
    eprintln!("[{}/{}] {}", step, total, message);
}
