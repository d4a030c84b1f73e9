use anyhow::Result;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::{
    app::Config,
    backend::ServiceTag,
    cli::OutputFormat,
    session::{ConnectivityStatus, SessionController, SubmitOutcome},
};

/// Result of a non-interactive run
#[derive(Debug, Serialize, Deserialize)]
pub struct NonInteractiveResult {
    /// The prompt that was executed
    pub prompt: String,
    /// Service the prompt was sent to
    pub service: ServiceTag,
    /// The assistant's reply, or the error text shown instead
    pub response: String,
    /// True when the reply is an error message
    pub is_error: bool,
    /// Metadata about the execution
    pub metadata: ExecutionMetadata,
}

impl NonInteractiveResult {
    /// Process exit status: 1 when the reply is error-flagged
    pub fn exit_code(&self) -> u8 {
        u8::from(self.is_error)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Backend that answered
    pub backend: String,
    /// Connectivity observed before sending
    pub connectivity: Option<ConnectivityStatus>,
    /// Execution time in milliseconds
    pub duration_ms: u128,
}

/// Non-interactive runner for executing single prompts
pub struct NonInteractiveRunner {
    controller: SessionController,
    service: ServiceTag,
    check_health: bool,
}

impl NonInteractiveRunner {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_controller(
            SessionController::new(config.gateway()?),
            config.session.default_service,
            config.session.check_health_on_start,
        ))
    }

    pub fn with_controller(
        controller: SessionController,
        service: ServiceTag,
        check_health: bool,
    ) -> Self {
        Self {
            controller,
            service,
            check_health,
        }
    }

    /// Execute a single prompt and return the result
    pub async fn execute(&self, prompt: String) -> Result<NonInteractiveResult> {
        let start_time = std::time::Instant::now();

        let connectivity = if self.check_health {
            Some(self.controller.check_health().await)
        } else {
            None
        };

        let outcome = self.controller.submit_query(&prompt, self.service).await;
        let state = self.controller.snapshot();

        let (response, is_error) = match outcome {
            SubmitOutcome::Ignored => anyhow::bail!("Prompt is empty"),
            SubmitOutcome::Replied(id) | SubmitOutcome::Failed(id) => {
                let message = state
                    .messages
                    .iter()
                    .find(|m| m.id == id)
                    .ok_or_else(|| anyhow::anyhow!("Reply missing from session"))?;
                (message.text.clone(), message.is_error())
            }
        };

        Ok(NonInteractiveResult {
            prompt,
            service: self.service,
            response,
            is_error,
            metadata: ExecutionMetadata {
                backend: self.controller.gateway_name(),
                connectivity,
                duration_ms: start_time.elapsed().as_millis(),
            },
        })
    }

    /// Format the result for output
    pub fn format_result(&self, result: &NonInteractiveResult, format: OutputFormat) -> String {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(result)
                .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize result: {}\"}}", e)),
            OutputFormat::Text => {
                if result.is_error {
                    format!("{}", result.response.red())
                } else {
                    result.response.clone()
                }
            }
        }
    }
}
