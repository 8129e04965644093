use crate::{
    error::{AppError, Result},
    models::{ApiResponse, CreateItAccountRequest, Department, ItAccount},
};
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error: Unable to reach the server. Please check your connection.";

const STATUS_FALLBACK_PREFIX: &str = "API request failed with status";

/// Failure of a backend call. `status` is 0 when no HTTP response arrived.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn is_network(&self) -> bool {
        self.status == 0
    }

    /// A non-2xx response whose body carried no error message, typically a
    /// proxy answering while the backend is down.
    pub fn is_unexplained(&self) -> bool {
        self.status != 0 && self.message.starts_with(STATUS_FALLBACK_PREFIX)
    }

    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(0, "Request timed out")
        } else if err.is_connect() {
            Self::new(0, NETWORK_ERROR_MESSAGE)
        } else if err.is_request() {
            Self::new(0, err.to_string())
        } else {
            Self::new(500, "Unexpected error occurred")
        }
    }
}

/// JSON client for the admin backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| AppError::validation(&format!("Invalid API base URL {}: {}", base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(&format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> std::result::Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::new(0, format!("Invalid endpoint {}: {}", path, e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> std::result::Result<T, ApiError> {
        let url = self.endpoint(path)?;
        debug!("GET {}", url);
        self.send(self.http.get(url)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> std::result::Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("POST {}", url);
        self.send(self.http.post(url).json(body)).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<T, ApiError> {
        let response = request.send().await.map_err(ApiError::from_transport)?;
        let status = response.status().as_u16();

        if !response.status().is_success() {
            let body = response.json::<ApiResponse<serde_json::Value>>().await.ok();
            let message = body
                .and_then(|b| b.error_message())
                .unwrap_or_else(|| format!("{} {}", STATUS_FALLBACK_PREFIX, status));
            return Err(ApiError::new(status, message));
        }

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::from_transport(e)
                } else {
                    ApiError::new(500, "Unexpected error occurred")
                }
            })?;

        if !body.success {
            let message = body
                .error_message()
                .unwrap_or_else(|| "Request was not successful".to_string());
            return Err(ApiError::new(status, message));
        }

        body.data
            .ok_or_else(|| ApiError::new(500, "Response did not include data"))
    }

    pub async fn list_it_accounts(&self) -> std::result::Result<Vec<ItAccount>, ApiError> {
        self.get("/api/it-accounts").await
    }

    pub async fn list_departments(&self) -> std::result::Result<Vec<Department>, ApiError> {
        self.get("/api/departments").await
    }

    pub async fn create_it_account(
        &self,
        request: &CreateItAccountRequest,
    ) -> std::result::Result<ItAccount, ApiError> {
        self.post("/api/it-accounts", request).await
    }
}
