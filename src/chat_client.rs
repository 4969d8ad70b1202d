use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use crate::error::CompletionError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/api/chat";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    response: String,
}

/// Anything that can turn a query into a reply.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, query: &str) -> Result<String, CompletionError>;
}

pub struct ChatClient {
    endpoint: Url,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl CompletionBackend for ChatClient {
    async fn complete(&self, query: &str) -> Result<String, CompletionError> {
        let request_body = ChatRequest { query };

        debug!(endpoint = %self.endpoint, ?request_body, "Sending chat request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Chat request failed with status {}: {}", status, body);
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        debug!("Received chat response: {}", parsed.response);

        Ok(parsed.response)
    }
}
