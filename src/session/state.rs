use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::backend::{ServiceTag, UploadRecord};

/// The client's belief about whether the backend can serve chat requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityStatus {
    #[default]
    Unknown,
    Connected,
    AgentsNotReady,
    ApiDown,
    InitializationFailed,
}

impl ConnectivityStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connected => "All systems online",
            Self::AgentsNotReady => "Agents not initialized",
            Self::ApiDown => "API server offline",
            Self::InitializationFailed => "Agent initialization failed",
            Self::Unknown => "Checking status...",
        }
    }

    pub fn is_online(&self) -> bool {
        *self == Self::Connected
    }
}

/// Everything one conversation session owns. Lives until the process exits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Append-only, insertion order is display order
    pub messages: Vec<Message>,
    /// True from a chat submit until its reply is appended
    pub pending_submission: bool,
    pub active_service: ServiceTag,
    /// Grows with every successful upload, never pruned
    pub uploads: Vec<UploadRecord>,
    pub uploading: bool,
    pub connectivity: ConnectivityStatus,
    pub draft_input: String,
}

impl SessionState {
    pub fn new(active_service: ServiceTag) -> Self {
        Self {
            active_service,
            ..Self::default()
        }
    }

    /// Whether the input control should take submissions
    pub fn input_enabled(&self) -> bool {
        !self.pending_submission && self.connectivity.is_online()
    }

    pub fn input_placeholder(&self) -> &'static str {
        if self.connectivity.is_online() {
            "Ask about investments, advisors, or market trends..."
        } else {
            "Please start the required servers first..."
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}
