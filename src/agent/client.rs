//! HTTP client for the hosted agent builder.

use super::bindings::AgentDefinition;
use super::types::{ConverseReply, ConverseRequest, RawConverseResponse};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur when talking to the agent host.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unauthorized (status {status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,
}

/// The request/response boundary to a hosted agent.
#[async_trait]
pub trait AgentEndpoint: Send + Sync {
    /// Send one user turn and wait for the agent's reply.
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseReply, AgentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Created,
    Updated,
}

pub struct AgentBuilderClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AgentBuilderClient {
    /// # Arguments
    /// * `base_url` - Kibana URL, e.g. "https://abc.kb.us-central1.gcp.cloud.es.io".
    /// * `api_key` - Encoded API key.
    /// * `timeout` - Per-request timeout. Agent turns can run tools, so this
    ///   is usually much longer than the index timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Connection(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("Authorization", format!("ApiKey {}", self.api_key))
            .header("kbn-xsrf", "true")
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Response, AgentError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AgentError::Timeout
            } else {
                AgentError::Connection(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response.text().await.unwrap_or_default();
            return Err(AgentError::Unauthorized {
                status: status.as_u16(),
                message,
            });
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AgentError::RateLimited);
        }
        Ok(response)
    }

    async fn ensure_success(response: Response) -> Result<Response, AgentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Api {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(response)
    }

    /// `GET /api/agent_builder/agents/{id}`, `None` if the agent does not exist.
    pub async fn get_agent(&self, agent_id: &str) -> Result<Option<Value>, AgentError> {
        let path = format!("/api/agent_builder/agents/{}", urlencoding::encode(agent_id));
        let response = self.execute(self.request(Method::GET, &path)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::ensure_success(response).await?;
        response
            .json()
            .await
            .map(Some)
            .map_err(|e| AgentError::InvalidResponse(format!("Failed to parse agent: {}", e)))
    }

    /// Create the agent, or replace its configuration if it already exists.
    pub async fn upsert_agent(
        &self,
        agent: &AgentDefinition,
    ) -> Result<PublishOutcome, AgentError> {
        let outcome = if self.get_agent(&agent.id).await?.is_some() {
            let path = format!("/api/agent_builder/agents/{}", urlencoding::encode(&agent.id));
            let response = self
                .execute(
                    self.request(Method::PUT, &path)
                        .json(&agent.to_update_payload()),
                )
                .await?;
            Self::ensure_success(response).await?;
            PublishOutcome::Updated
        } else {
            let response = self
                .execute(
                    self.request(Method::POST, "/api/agent_builder/agents")
                        .json(&agent.to_payload()),
                )
                .await?;
            Self::ensure_success(response).await?;
            PublishOutcome::Created
        };

        info!(agent_id = %agent.id, outcome = ?outcome, "Published agent");
        Ok(outcome)
    }
}

#[async_trait]
impl AgentEndpoint for AgentBuilderClient {
    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseReply, AgentError> {
        debug!(
            agent_id = %request.agent_id,
            conversation_id = ?request.conversation_id,
            input_len = request.input.len(),
            "Sending converse request"
        );

        let response = self
            .execute(
                self.request(Method::POST, "/api/agent_builder/converse")
                    .json(request),
            )
            .await?;
        let response = Self::ensure_success(response).await?;
        let raw: RawConverseResponse = response.json().await.map_err(|e| {
            AgentError::InvalidResponse(format!("Failed to parse converse response: {}", e))
        })?;
        let reply = ConverseReply::from(raw);

        debug!(
            conversation_id = ?reply.conversation_id,
            tool_calls = reply.tool_calls.len(),
            "Received converse response"
        );
        Ok(reply)
    }
}
