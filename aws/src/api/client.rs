use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::error::ApiError;

const TARGET_HEADER: &str = "X-Amz-Target";
const ERROR_TYPE_HEADER: &str = "x-amzn-ErrorType";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const JSON_1_1: &str = "application/x-amz-json-1.1";

/// Cognito Identity Provider API client (JSON 1.1 protocol)
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    endpoint: Url,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout_seconds: u64,
    pub insecure: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            insecure: false,
        }
    }
}

/// Error document returned by JSON 1.1 services
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    error_type: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}

/// Public regional endpoint of the Cognito user pools service
pub fn endpoint_for_region(region: &str) -> String {
    format!("https://cognito-idp.{}.amazonaws.com", region)
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(endpoint: &str) -> Result<Self, ApiError> {
        Self::with_config(endpoint, ClientConfig::default())
    }

    pub fn for_region(region: &str, config: ClientConfig) -> Result<Self, ApiError> {
        Self::with_config(&endpoint_for_region(region), config)
    }

    pub fn with_config(endpoint: &str, config: ClientConfig) -> Result<Self, ApiError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ApiError::InvalidEndpoint(format!(
                "unsupported scheme '{}' in {}",
                endpoint.scheme(),
                endpoint
            )));
        }

        let http_client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                endpoint,
            }),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Cognito user pool operations
    pub fn cognito(&self) -> crate::api::cognito::CognitoApi<'_> {
        crate::api::cognito::CognitoApi::new(self)
    }

    /// Invoke one service operation, e.g. "CreateGroup"
    pub async fn call<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        operation: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let payload = serde_json::to_vec(body)
            .map_err(|e| ApiError::ParseError(format!("Failed to encode request: {}", e)))?;

        tracing::debug!("POST {} to: {}", operation, self.inner.endpoint);
        let response = self
            .inner
            .http_client
            .post(self.inner.endpoint.clone())
            .header(CONTENT_TYPE, JSON_1_1)
            .header(TARGET_HEADER, format!("{}.{}", TARGET_PREFIX, operation))
            .body(payload)
            .send()
            .await?;

        if response.status().is_success() {
            self.parse_success_response(response).await
        } else {
            self.handle_error_response(response).await
        }
    }

    async fn parse_success_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::debug!("API response body: {}", text);

        // DeleteGroup answers with an empty body
        let text = if text.trim().is_empty() { "{}" } else { &text };
        serde_json::from_str::<T>(text).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}, body: {}", e, text);
            ApiError::ParseError(format!("Failed to parse response: {}", e))
        })
    }

    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let header_code = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let body = serde_json::from_str::<ErrorBody>(&text).ok();
        let code = body
            .as_ref()
            .and_then(|b| b.error_type.clone())
            .or(header_code)
            .map(|c| normalize_error_code(&c))
            .unwrap_or_else(|| format!("HTTP{}", status));
        let message = body.and_then(|b| b.message).unwrap_or(text);

        Err(ApiError::Service {
            status,
            code,
            message,
        })
    }
}

/// "com.amazonaws#ResourceNotFoundException:http://..." -> "ResourceNotFoundException"
fn normalize_error_code(raw: &str) -> String {
    let code = raw.rsplit('#').next().unwrap_or(raw);
    code.split(':').next().unwrap_or(code).trim().to_string()
}
