use async_trait::async_trait;

use super::error::BackendError;
use super::types::{HealthReport, ServiceTag, UploadFile, UploadRecord};

/// Capability the session controller uses to reach the advisory backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Submit user text and receive the assistant reply
    async fn chat(&self, message: &str, service: ServiceTag) -> Result<String, BackendError>;

    /// Send all files in one request; the reply lists what the server accepted
    async fn upload(&self, files: &[UploadFile]) -> Result<Vec<UploadRecord>, BackendError>;

    /// Probe whether the server and its agents are up
    async fn health(&self) -> Result<HealthReport, BackendError>;

    /// Ask the server to bring its agents up
    async fn initialize(&self) -> Result<(), BackendError>;

    /// Names of documents already in the knowledge base
    async fn list_files(&self) -> Result<Vec<String>, BackendError> {
        Ok(Vec::new())
    }

    /// Short label for status displays
    fn name(&self) -> &str;
}
