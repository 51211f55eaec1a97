use crate::config::Config;
use crate::session::ConversationId;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body posted to the chat route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub prompt: String,
    pub conversation_id: ConversationId,
}

/// Body returned by the chat route
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: String,
}

/// Why a chat request did not produce a reply
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Anything that can turn a prompt into a reply
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_prompt(&self, request: &ChatRequest) -> Result<String, ApiError>;
}

/// Chat endpoint client over HTTP
#[derive(Clone)]
pub struct HttpChatClient {
    url: String,
    client: reqwest::Client,
}

impl HttpChatClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            url: config.chat_url(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatApi for HttpChatClient {
    async fn send_prompt(&self, request: &ChatRequest) -> Result<String, ApiError> {
        log::debug!(
            "POST {} conversation={} prompt_chars={}",
            self.url,
            request.conversation_id,
            request.prompt.chars().count()
        );

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(ApiError::Transport)?;

        let status = response.status();
        let body = response.text().await.map_err(ApiError::Transport)?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = serde_json::from_str(&body).map_err(ApiError::Decode)?;
        Ok(reply.message)
    }
}
