//! HTTP implementation of [`RemoteEndpoint`] and the named-endpoint client.

use std::sync::Arc;

use async_trait::async_trait;
use remotefields_core::{EndpointError, Record, RemoteEndpoint, Value};
use reqwest::StatusCode;
use tracing::debug;

use crate::config::ClientConfig;
use crate::middleware::EndpointExt;

/// Errors building a client or looking up its endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("unknown endpoint: {name}")]
    UnknownEndpoint { name: String },
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Anything that can hand out endpoint pairs by name.
///
/// Implemented by [`RemoteClient`]; serializer definitions compile against
/// this trait so they can be tested without a network.
pub trait EndpointSource {
    /// Endpoint pair serving `list` from endpoint `list` and `detail` from
    /// endpoint `detail`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownEndpoint`] if either name is not registered.
    fn endpoint(&self, list: &str, detail: &str) -> Result<Arc<dyn RemoteEndpoint>, ClientError>;
}

/// `GET`-based endpoint pair on a companion REST service.
///
/// - `list`: `GET {list_url}`, expecting a JSON array of objects.
/// - `detail`: `GET {detail_url}?pk={pk}`, expecting a JSON object.
///
/// 404 maps to [`EndpointError::NotFound`], 400 to
/// [`EndpointError::BadRequest`]; every other failure is a transport error.
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    http: reqwest::Client,
    list_url: String,
    detail_url: String,
    auth: Option<(String, Option<String>)>,
}

impl HttpEndpoint {
    /// Creates an endpoint pair sharing `http`'s connection pool.
    #[must_use]
    pub fn new(http: reqwest::Client, list_url: impl Into<String>, detail_url: impl Into<String>) -> Self {
        Self {
            http,
            list_url: list_url.into(),
            detail_url: detail_url.into(),
            auth: None,
        }
    }

    /// Sends HTTP basic auth with every request.
    #[must_use]
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.auth = Some((username.into(), password));
        self
    }

    async fn get_json(
        &self,
        url: &str,
        query: Option<(&str, String)>,
    ) -> Result<serde_json::Value, EndpointError> {
        let mut request = self.http.get(url);
        if let Some((username, password)) = &self.auth {
            request = request.basic_auth(username, password.as_ref());
        }
        if let Some(pair) = query {
            request = request.query(&[pair]);
        }

        let response = request.send().await.map_err(|e| EndpointError::Transport(e.into()))?;
        let status = response.status();
        debug!(url, status = status.as_u16(), "remote response");

        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    debug!(url, error = %err, "failed to read error response body");
                    format!("<unreadable body: {err}>")
                }
            };
            return Err(match status {
                StatusCode::NOT_FOUND => EndpointError::NotFound(body),
                StatusCode::BAD_REQUEST => EndpointError::BadRequest(body),
                _ => EndpointError::Transport(anyhow::anyhow!("HTTP {}: {}", status.as_u16(), body)),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| EndpointError::Transport(anyhow::Error::new(e).context("decode response body")))
    }
}

/// Renders a primary key for the `pk` query parameter.
fn pk_param(pk: &Value) -> String {
    match pk {
        Value::String(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        other => serde_json::Value::from(other.clone()).to_string(),
    }
}

fn into_record(json: serde_json::Value) -> Result<Record, EndpointError> {
    match Value::from(json) {
        Value::Map(record) => Ok(record),
        other => Err(EndpointError::Transport(anyhow::anyhow!(
            "expected a JSON object, got {other:?}"
        ))),
    }
}

#[async_trait]
impl RemoteEndpoint for HttpEndpoint {
    async fn list(&self) -> Result<Vec<Record>, EndpointError> {
        match self.get_json(&self.list_url, None).await? {
            serde_json::Value::Array(items) => items.into_iter().map(into_record).collect(),
            other => Err(EndpointError::Transport(anyhow::anyhow!(
                "expected a JSON array from {}, got {}",
                self.list_url,
                other
            ))),
        }
    }

    async fn detail(&self, pk: &Value) -> Result<Record, EndpointError> {
        let json = self.get_json(&self.detail_url, Some(("pk", pk_param(pk)))).await?;
        into_record(json)
    }
}

/// Client for one companion service, handing out endpoints by name.
///
/// All endpoints share one connection pool and the configured credentials,
/// and are wrapped with the timeout and tracing middleware.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl RemoteClient {
    /// Builds the client and its connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] if the HTTP client cannot be created
    /// (e.g., TLS backend initialization fails).
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url_for(&self, name: &str) -> Result<String, ClientError> {
        self.config
            .endpoints
            .get(name)
            .map(|path| self.config.url_for(path))
            .ok_or_else(|| ClientError::UnknownEndpoint {
                name: name.to_string(),
            })
    }

    /// Raw HTTP endpoint pair without middleware.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::UnknownEndpoint`] if either name is not registered.
    pub fn http_endpoint(&self, list: &str, detail: &str) -> Result<HttpEndpoint, ClientError> {
        let endpoint = HttpEndpoint::new(self.http.clone(), self.url_for(list)?, self.url_for(detail)?);
        Ok(match &self.config.username {
            Some(username) => endpoint.with_basic_auth(username.clone(), self.config.password.clone()),
            None => endpoint,
        })
    }
}

impl EndpointSource for RemoteClient {
    fn endpoint(&self, list: &str, detail: &str) -> Result<Arc<dyn RemoteEndpoint>, ClientError> {
        let endpoint = self
            .http_endpoint(list, detail)?
            .with_timeout(self.config.request_timeout)
            .traced(format!("{list}|{detail}"));
        Ok(Arc::new(endpoint))
    }
}
