use thiserror::Error;

/// Errors raised by the binary itself rather than by a backend call
#[derive(Error, Debug)]
pub enum FinovaError {
    #[error("No interactive terminal available")]
    NoTerminal,
}
