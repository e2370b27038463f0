//! Authenticated transport for the Nimbus REST API.
//!
//! One [`NimbusClient`] is shared by every concurrent caller. Each request
//! passes the rate limiter gate, carries the basic-auth credential pair and
//! the identifying client header, and has its response decoded or turned
//! into a typed [`HttpFailure`]. The transport itself never retries.

use crate::config::ClientConfig;
use crate::error::{Error, HttpFailure, Result};
use crate::limit::RateLimiter;
use crate::memo::Memoized;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Identifying header sent with every request.
const CLIENT_HEADER: &str = "X-Client";

/// Value for the identifying header and the user agent.
const CLIENT_VERSION: &str = concat!("nimbus-api/", env!("CARGO_PKG_VERSION"));

/// Endpoint answering with the caller's organization.
const IDENTITY_PATH: &str = "v1/me";

/// Maximum length of response body to log (avoids logging sensitive data).
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Shared client for the Nimbus REST API.
///
/// Cheap to clone; all clones share one rate limiter and one identity cache.
#[derive(Clone)]
pub struct NimbusClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    /// Base endpoint with trailing slashes already trimmed.
    base: String,
    limiter: RateLimiter,
    identity: Memoized<String, String>,
}

#[derive(Debug, Deserialize)]
struct IdentityResponse {
    #[serde(rename = "organizationId")]
    organization_id: String,
}

impl NimbusClient {
    /// Build a client from a validated configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let max_requests = NonZeroUsize::new(config.max_requests)
            .ok_or_else(|| Error::Config("max_requests must be at least 1".into()))?;
        let http = reqwest::Client::builder()
            .user_agent(CLIENT_VERSION)
            .build()?;
        let base = config.base_endpoint.trim_end_matches('/').to_string();
        let limiter = RateLimiter::new(max_requests, config.window);

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                base,
                limiter,
                identity: Memoized::new(),
            }),
        })
    }

    /// Build a client configured from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// GET `path` and decode the response body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, &[], None).await
    }

    /// GET `path` with query parameters.
    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.request(Method::GET, path, query, None).await
    }

    /// POST `body` to `path` and decode the response body.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, &[], Some(&body)).await
    }

    /// PUT `body` to `path` and decode the response body.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::PUT, path, &[], Some(&body)).await
    }

    /// PATCH `body` to `path` and decode the response body.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.request(Method::PATCH, path, &[], Some(&body)).await
    }

    /// DELETE `path`, ignoring any response body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request_raw(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    /// The caller's organization identifier.
    ///
    /// Resolved with one `GET v1/me` on first use and cached for the
    /// lifetime of the client, errors included. A new client starts fresh.
    pub async fn organization_id(&self) -> Result<String> {
        let client = self.clone();
        self.inner
            .identity
            .get_or_resolve(IDENTITY_PATH.to_string(), move |path| async move {
                let identity: IdentityResponse = client.get(&path).await?;
                Ok(identity.organization_id)
            })
            .await
    }

    /// The rate limiter gating this client's requests.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.inner.limiter
    }

    /// Page size used by `list_all`.
    pub(crate) fn page_size(&self) -> usize {
        self.inner.config.page_size
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base, path.trim_start_matches('/'))
    }

    /// Issue the request and decode the 2xx response body.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T> {
        let text = self.request_raw(method, path, query, body).await?;

        // 204 and other empty bodies decode as JSON null, which covers
        // `()` and `Option` destinations.
        if text.is_empty() {
            return Ok(serde_json::from_str("null")?);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Gate on the limiter, issue the request, and return the raw 2xx body.
    ///
    /// Fire-and-forget callers use this directly so a server that answers
    /// with a body does not force a decode.
    async fn request_raw(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<String> {
        match self.inner.config.wait_timeout {
            Some(timeout) => self.inner.limiter.acquire_timeout(timeout).await?,
            None => self.inner.limiter.acquire().await,
        }

        let url = self.endpoint_url(path);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .inner
            .http
            .request(method, &url)
            .basic_auth(
                &self.inner.config.credentials.api_key,
                Some(&self.inner.config.credentials.api_secret),
            )
            .header(CLIENT_HEADER, CLIENT_VERSION);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!("API error: {} - {}", status, sanitize_for_log(&text));
            return Err(Error::Http(HttpFailure::new(status, text)));
        }

        Ok(text)
    }
}

/// Truncate and strip a response body before it reaches the logs.
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..MAX_LOG_BODY_LENGTH],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}
