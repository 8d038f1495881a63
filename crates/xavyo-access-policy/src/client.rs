//! Access-policy HTTP client (reqwest-based).
//!
//! Implements [`PolicyApi`] and [`WorkspaceApi`] against the platform REST API:
//!
//! - `GET  {base}/api/access-policies/{policy_id}`
//! - `PUT  {base}/api/access-policies/{policy_id}`
//! - `GET  {base}/api/workspaces/{workspace_id}`

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::{PolicyApi, WorkspaceApi};
use crate::config::ClientConfig;
use crate::error::{PolicyError, PolicyResult};
use crate::models::{AccessPolicy, TargetWorkspace};

const POLICY_ENTITY: &str = "access policy";
const WORKSPACE_ENTITY: &str = "workspace";

/// HTTP client for the access-policy API.
#[derive(Clone)]
pub struct PolicyClient {
    /// Base URL of the platform API (e.g., "<https://pam.example.com>").
    base_url: Url,
    /// Static bearer token.
    api_token: String,
    /// Underlying HTTP client.
    http_client: Client,
}

impl std::fmt::Debug for PolicyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl PolicyClient {
    /// Create a new client.
    pub fn new(
        base_url: &str,
        api_token: impl Into<String>,
        timeout: Duration,
        tls_verify: bool,
    ) -> PolicyResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!tls_verify)
            .user_agent(concat!("xavyo-access-policy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PolicyError::InvalidConfig(format!("Failed to build HTTP client: {e}")))?;

        Self::with_http_client(base_url, api_token, http_client)
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    pub fn with_http_client(
        base_url: &str,
        api_token: impl Into<String>,
        http_client: Client,
    ) -> PolicyResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            PolicyError::InvalidConfig(format!("Invalid policy API URL '{base_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(PolicyError::InvalidConfig(format!(
                "Invalid policy API URL '{base_url}': not a base URL"
            )));
        }

        Ok(Self {
            base_url,
            api_token: api_token.into(),
            http_client,
        })
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build `{base}/api/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> PolicyResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PolicyError::InvalidConfig("policy API URL is not a base".to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    // ── Internal HTTP Methods ─────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url, entity: &str, id: &str) -> PolicyResult<T> {
        debug!("Policy API GET {}", url);
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        self.handle_response(response, entity, id).await
    }

    async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &AccessPolicy,
        entity: &str,
        id: &str,
    ) -> PolicyResult<Option<T>> {
        debug!("Policy API PUT {}", url);
        let response = self
            .http_client
            .put(url)
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        self.handle_response(response, entity, id).await.map(Some)
    }

    // ── Response Handling ─────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        entity: &str,
        id: &str,
    ) -> PolicyResult<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| PolicyError::ParseError(format!("Failed to parse {entity}: {e}")))
        } else {
            self.handle_error_response(response, entity, id).await
        }
    }

    async fn handle_error_response<T>(
        &self,
        response: reqwest::Response,
        entity: &str,
        id: &str,
    ) -> PolicyResult<T> {
        let status = response.status();

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());

        match status {
            StatusCode::NOT_FOUND => Err(PolicyError::not_found(entity, id)),
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Policy API rate limited, retry after {:?}s", retry_after);
                Err(PolicyError::RateLimited {
                    retry_after_secs: retry_after,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PolicyError::AuthError(
                format!("Authentication failed ({}): {body}", status.as_u16()),
            )),
            _ => {
                let detail = if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    body
                };
                Err(PolicyError::Api {
                    status: status.as_u16(),
                    detail,
                })
            }
        }
    }
}

#[async_trait]
impl PolicyApi for PolicyClient {
    async fn get_policy(&self, policy_id: &str) -> PolicyResult<AccessPolicy> {
        let url = self.endpoint(&["access-policies", policy_id])?;
        self.get(url, POLICY_ENTITY, policy_id).await
    }

    async fn update_policy(
        &self,
        policy_id: &str,
        policy: &AccessPolicy,
    ) -> PolicyResult<AccessPolicy> {
        policy.ensure_writable()?;
        let url = self.endpoint(&["access-policies", policy_id])?;
        let updated = self.put(url, policy, POLICY_ENTITY, policy_id).await?;
        Ok(updated.unwrap_or_else(|| policy.clone()))
    }
}

#[async_trait]
impl WorkspaceApi for PolicyClient {
    async fn get_workspace(&self, workspace_id: &str) -> PolicyResult<TargetWorkspace> {
        let url = self.endpoint(&["workspaces", workspace_id])?;
        self.get(url, WORKSPACE_ENTITY, workspace_id).await
    }
}

/// Build a [`PolicyClient`] from configuration.
pub fn build_policy_client(config: &ClientConfig) -> PolicyResult<PolicyClient> {
    PolicyClient::new(
        &config.base_url,
        config.api_token.clone(),
        config.request_timeout,
        config.tls_verify,
    )
}
