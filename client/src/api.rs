//! HTTP client for the registration API.

use async_trait::async_trait;
use thiserror::Error;

use shared::{CreateRegistrationRequest, ErrorResponse, OverviewResponse, RegisterResponse};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The server rejected the input; the message is user-presentable
    #[error("{0}")]
    Rejected(String),

    #[error("Registration not found")]
    NotFound,

    /// The server accepted the connection but failed internally
    #[error("Server error: {0}")]
    Server(String),

    /// Transport-level failure; the operation may be retried
    #[error("Network error: {0}")]
    Network(String),
}

/// Seam between the flow and the REST surface. Production uses the reqwest
/// implementation below; tests substitute an in-memory one.
#[async_trait]
pub trait RegistrationApi: Send + Sync {
    async fn register(
        &self,
        request: CreateRegistrationRequest,
    ) -> Result<RegisterResponse, ApiError>;

    async fn fetch_overview(&self) -> Result<OverviewResponse, ApiError>;
}

pub struct HttpRegistrationApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRegistrationApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Map an error-status response onto the typed taxonomy
    async fn error_from_response(response: reqwest::Response) -> ApiError {
        let status = response.status();
        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.to_string());

        match status {
            reqwest::StatusCode::BAD_REQUEST => ApiError::Rejected(message),
            reqwest::StatusCode::NOT_FOUND => ApiError::NotFound,
            _ => ApiError::Server(message),
        }
    }
}

#[async_trait]
impl RegistrationApi for HttpRegistrationApi {
    async fn register(
        &self,
        request: CreateRegistrationRequest,
    ) -> Result<RegisterResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/api/register"))
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn fetch_overview(&self) -> Result<OverviewResponse, ApiError> {
        let response = self
            .client
            .get(self.url("/api/users"))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }
}
