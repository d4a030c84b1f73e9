use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::backend::ServiceTag;

static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Unique message token derived from creation time, strictly increasing within a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(u64);

impl MessageId {
    pub fn next() -> Self {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let previous = LAST_ID
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        Self(now.max(previous + 1))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

/// Error and success flags are mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageTone {
    #[default]
    Normal,
    Error,
    Success,
}

/// One entry in the conversation log. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    /// Local wall-clock time for display
    pub timestamp: String,
    pub tone: MessageTone,
    /// Service that produced an assistant reply
    pub service: Option<ServiceTag>,
}

impl Message {
    fn build(text: String, sender: Sender, tone: MessageTone, service: Option<ServiceTag>) -> Self {
        Self {
            id: MessageId::next(),
            text,
            sender,
            timestamp: Local::now().format("%-I:%M:%S %p").to_string(),
            tone,
            service,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::build(text.into(), Sender::User, MessageTone::Normal, None)
    }

    pub fn assistant(text: impl Into<String>, service: ServiceTag) -> Self {
        Self::build(text.into(), Sender::Assistant, MessageTone::Normal, Some(service))
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::build(text.into(), Sender::Assistant, MessageTone::Error, None)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::build(text.into(), Sender::Assistant, MessageTone::Success, None)
    }

    pub fn is_error(&self) -> bool {
        self.tone == MessageTone::Error
    }

    pub fn is_success(&self) -> bool {
        self.tone == MessageTone::Success
    }
}
