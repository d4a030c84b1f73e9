use thiserror::Error;

/// Failures a backend call can end in
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The request never reached the server
    #[error("Failed to fetch: {0}")]
    NetworkUnavailable(String),

    /// The server answered but has no agents loaded yet
    #[error("Agents not initialized: {0}")]
    AgentsNotInitialized(String),

    #[error("HTTP {status}: {message}")]
    HttpError { status: u16, message: String },

    /// The server refused to bring its agents up
    #[error("Initialization rejected with HTTP {status}: {message}")]
    InitializationRejected { status: u16, message: String },

    /// A 2xx response whose body did not match the contract
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl BackendError {
    /// True when the server could not be reached at all
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::NetworkUnavailable(_))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::HttpError {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::NetworkUnavailable(err.to_string())
        }
    }
}
