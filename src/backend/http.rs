use anyhow::Result;
use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::error::BackendError;
use super::traits::BackendGateway;
use super::types::{HealthReport, ServiceTag, UploadFile, UploadRecord};
use crate::constants::{
    AGENTS_NOT_INITIALIZED_MARKER, CHAT_PATH, FILES_PATH, HEALTH_PATH, INITIALIZE_PATH,
    UPLOAD_PATH,
};

/// Gateway to the advisory API server over HTTP
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway for the server at `base_url`.
    /// No timeout is applied unless one is given; calls resolve whenever the transport does.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a prepared request, mapping transport failures
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, BackendError> {
        request.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", self.base_url, e);
            BackendError::NetworkUnavailable(e.to_string())
        })
    }
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn chat(&self, message: &str, service: ServiceTag) -> Result<String, BackendError> {
        debug!("POST {} (service: {})", CHAT_PATH, service);
        let body = ChatRequest { message, service };
        let response = self
            .send(self.client.post(self.url(CHAT_PATH)).json(&body))
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &text));
        }

        let reply: ChatResponse = response.json().await?;
        Ok(reply.response)
    }

    async fn upload(&self, files: &[UploadFile]) -> Result<Vec<UploadRecord>, BackendError> {
        debug!("POST {} ({} files)", UPLOAD_PATH, files.len());
        let mut form = multipart::Form::new();
        for (index, file) in files.iter().enumerate() {
            let part = multipart::Part::bytes(file.contents.to_vec()).file_name(file.file_name.clone());
            form = form.part(format!("file{}", index), part);
        }

        let response = self
            .send(self.client.post(self.url(UPLOAD_PATH)).multipart(form))
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::HttpError {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &text),
            });
        }

        let reply: UploadResponse = response.json().await?;
        Ok(reply.uploaded_files)
    }

    async fn health(&self) -> Result<HealthReport, BackendError> {
        let response = self.send(self.client.get(self.url(HEALTH_PATH))).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::HttpError {
                status: status.as_u16(),
                message: format!("HTTP error! status: {}", status.as_u16()),
            });
        }

        Ok(response.json().await?)
    }

    async fn initialize(&self) -> Result<(), BackendError> {
        debug!("POST {}", INITIALIZE_PATH);
        let response = self.send(self.client.post(self.url(INITIALIZE_PATH))).await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StatusBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
            return Err(BackendError::InitializationRejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }

    async fn list_files(&self) -> Result<Vec<String>, BackendError> {
        let response = self.send(self.client.get(self.url(FILES_PATH))).await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BackendError::HttpError {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &text),
            });
        }

        let reply: FilesResponse = response.json().await?;
        Ok(reply.files)
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}

/// Pull the `error` field out of a failure body, falling back to the status code
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status))
}

/// Classify a non-success chat response
pub(crate) fn classify_failure(status: u16, body: &str) -> BackendError {
    let message = error_message(status, body);
    if message.contains(AGENTS_NOT_INITIALIZED_MARKER) {
        BackendError::AgentsNotInitialized(message)
    } else {
        BackendError::HttpError { status, message }
    }
}

// Wire structures for the advisory API

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    service: ServiceTag,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    uploaded_files: Vec<UploadRecord>,
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    files: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_agents_marker_is_detected() {
        let err = classify_failure(
            500,
            r#"{"error": "Agents not initialized. Please initialize agents first."}"#,
        );
        assert!(matches!(err, BackendError::AgentsNotInitialized(_)));
    }

    #[test]
    fn test_server_error_text_is_kept() {
        let err = classify_failure(400, r#"{"error": "Empty message"}"#);
        assert_eq!(
            err,
            BackendError::HttpError {
                status: 400,
                message: "Empty message".to_string()
            }
        );
    }

    #[test]
    fn test_non_json_failure_falls_back_to_status() {
        let err = classify_failure(502, "<html>Bad Gateway</html>");
        assert_eq!(
            err,
            BackendError::HttpError {
                status: 502,
                message: "HTTP error! status: 502".to_string()
            }
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let gateway = HttpGateway::new("http://localhost:5001/", None).unwrap();
        assert_eq!(gateway.url(CHAT_PATH), "http://localhost:5001/api/chat");
    }

    #[test]
    fn test_chat_request_body_shape() {
        let body = ChatRequest {
            message: "hello",
            service: ServiceTag::Research,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"message": "hello", "service": "research"}));
    }
}
