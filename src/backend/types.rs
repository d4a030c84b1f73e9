use anyhow::{Context, Result};
use bytes::Bytes;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Which specialised backend logic a query is steered towards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ServiceTag {
    Investment,
    Advisor,
    Research,
    All,
}

impl Default for ServiceTag {
    fn default() -> Self {
        Self::All
    }
}

impl ServiceTag {
    /// Every service in selector order
    pub const ALL: [ServiceTag; 4] = [Self::All, Self::Investment, Self::Advisor, Self::Research];

    /// Identifier sent over the wire
    pub fn id(&self) -> &'static str {
        match self {
            Self::Investment => "investment",
            Self::Advisor => "advisor",
            Self::Research => "research",
            Self::All => "all",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Investment => "Investment Planning",
            Self::Advisor => "Find Advisors",
            Self::Research => "Market Research",
            Self::All => "Smart Routing",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Investment => "Portfolio strategies and investment advice",
            Self::Advisor => "Discover qualified financial advisors",
            Self::Research => "Latest market trends and analysis",
            Self::All => "AI determines the best approach",
        }
    }

    /// Next service in selector order, wrapping around
    pub fn cycle(&self) -> Self {
        let idx = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for ServiceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ServiceTag {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "investment" => Ok(Self::Investment),
            "advisor" => Ok(Self::Advisor),
            "research" => Ok(Self::Research),
            "all" => Ok(Self::All),
            other => Err(format!(
                "Unknown service '{}'. Expected one of: investment, advisor, research, all",
                other
            )),
        }
    }
}

/// A file selected for upload to the knowledge base
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub contents: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }

    /// Read a file from disk, keeping only its final path component as the name
    pub async fn from_path(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .with_context(|| format!("{} has no file name", path.display()))?;
        Ok(Self::new(file_name, contents))
    }
}

/// Backend-confirmed metadata for a file accepted into the knowledge base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawUploadRecord")]
pub struct UploadRecord {
    pub file_name: String,
}

/// The server reports either bare file names or small objects
#[derive(Deserialize)]
#[serde(untagged)]
enum RawUploadRecord {
    Name(String),
    Detailed {
        #[serde(alias = "name", alias = "file_name")]
        filename: String,
    },
}

impl From<RawUploadRecord> for UploadRecord {
    fn from(raw: RawUploadRecord) -> Self {
        let file_name = match raw {
            RawUploadRecord::Name(name) => name,
            RawUploadRecord::Detailed { filename } => filename,
        };
        Self { file_name }
    }
}

/// Result of a health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub status: Option<String>,
    pub agents_initialized: bool,
}
