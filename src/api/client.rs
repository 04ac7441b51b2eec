//! API client for the PhenoPortal backend.
//!
//! Every request is intercepted before transmission: if the shared credential
//! store currently holds a bearer token, an `Authorization` header is
//! attached; otherwise the request goes out unauthenticated, which is what
//! lets the login endpoint itself flow through the same client.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::auth::CredentialStore;

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Observes every response that passes through an [`ApiClient`].
///
/// Hooks see the outcome of each request after it completes, which gives a
/// caller one central place to watch for credential rejections (401s) or to
/// record traffic in tests. Hooks must not block.
pub trait ResponseHook: Send + Sync {
    fn on_response(&self, method: &Method, path: &str, status: StatusCode);
}

/// Request client bound to one base API address.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    hooks: Vec<Arc<dyn ResponseHook>>,
}

impl ApiClient {
    /// Create a client bound to `base_url`, reading credentials from `store`.
    pub fn new(base_url: impl Into<String>, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            hooks: Vec::new(),
        })
    }

    /// Install a response hook. Hooks run in installation order.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn ResponseHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// GET `path` and deserialize the JSON response body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.get(self.url(path));
        let response = self.execute(request, Method::GET, path).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    /// POST a JSON `body` to `path` and deserialize the JSON response body.
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.client.post(self.url(path)).json(body);
        let response = self.execute(request, Method::POST, path).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    /// POST to `path` with no body, discarding any response body.
    pub async fn post_empty(&self, path: &str) -> Result<()> {
        let request = self.client.post(self.url(path));
        self.execute(request, Method::POST, path).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.store.token() {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        method: Method,
        path: &str,
    ) -> Result<reqwest::Response> {
        let response = request
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::Network)
            .with_context(|| format!("Failed to send {} request to {}", method, path))?;

        let status = response.status();
        debug!(%method, path, %status, "API response");
        for hook in &self.hooks {
            hook.on_response(&method, path, status);
        }

        Self::check_response(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }
}
