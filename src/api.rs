//! HTTP client for the code-assistance backend

use crate::constants::API_PREFIX;
use crate::types::*;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, body read aborted.
    #[error("{0}")]
    Transport(String),
    /// Non-2xx reply; `body` is the parsed JSON, or the raw text as a JSON string.
    #[error("HTTP {status}")]
    Http {
        status: u16,
        body: serde_json::Value,
    },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The remote service the controller talks to.
#[async_trait]
pub trait CodeAssistant: Send + Sync {
    async fn run_code(&self, request: CodeRequest) -> ApiResult<RunResponse>;
    async fn debug(&self, request: CodeRequest) -> ApiResult<DebugResponse>;
    async fn comment(&self, request: CodeRequest) -> ApiResult<CommentResponse>;
    async fn comment_line(&self, request: CodeRequest) -> ApiResult<CommentResponse>;
    async fn health(&self) -> ApiResult<HealthResponse>;
}

pub struct Backend {
    client: reqwest::Client,
    base_url: String,
}

impl Backend {
    pub fn new(origin: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}{}", origin.trim().trim_end_matches('/'), API_PREFIX),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
            });
            warn!(status = %status, "Backend returned an error status");
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl CodeAssistant for Backend {
    async fn run_code(&self, request: CodeRequest) -> ApiResult<RunResponse> {
        // The run endpoint reports failures in the body, sometimes with a non-2xx status
        // and an `error` field; keep those as a RunResponse.
        match self
            .post_json::<_, RunResponse>(ActionKind::Run.endpoint(), &request)
            .await
        {
            Err(ApiError::Http { body, status }) => {
                match serde_json::from_value::<RunResponse>(body.clone()) {
                    Ok(run) if run.error.as_deref().is_some_and(|e| !e.is_empty()) => Ok(run),
                    _ => Err(ApiError::Http { status, body }),
                }
            }
            other => other,
        }
    }

    async fn debug(&self, request: CodeRequest) -> ApiResult<DebugResponse> {
        self.post_json(ActionKind::Debug.endpoint(), &request).await
    }

    async fn comment(&self, request: CodeRequest) -> ApiResult<CommentResponse> {
        self.post_json(ActionKind::Comment.endpoint(), &request).await
    }

    async fn comment_line(&self, request: CodeRequest) -> ApiResult<CommentResponse> {
        self.post_json(ActionKind::CommentLine.endpoint(), &request).await
    }

    async fn health(&self) -> ApiResult<HealthResponse> {
        let url = self.url("/health");
        let response = self.client.get(&url).send().await?;
        Self::read_json(response).await
    }
}
