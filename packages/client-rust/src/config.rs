//! Client configuration for the companion-service HTTP endpoints.

use std::collections::HashMap;
use std::time::Duration;

/// Connection settings and the named endpoint table of one companion service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service root; endpoint paths are joined onto it.
    pub base_url: String,
    /// Basic-auth user. No `Authorization` header is sent when `None`.
    pub username: Option<String>,
    /// Basic-auth password.
    pub password: Option<String>,
    /// Maximum time a single endpoint call may take.
    pub request_timeout: Duration,
    /// Maximum time to establish a TCP connection.
    pub connect_timeout: Duration,
    /// Endpoint name (e.g. `some__endpoint_list`) -> path relative to `base_url`.
    pub endpoints: HashMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/".to_string(),
            username: None,
            password: None,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            endpoints: HashMap::new(),
        }
    }
}

impl ClientConfig {
    /// Registers an endpoint path under `name`, replacing any previous entry.
    #[must_use]
    pub fn with_endpoint(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
        self.endpoints.insert(name.into(), path.into());
        self
    }

    /// Absolute URL for a path relative to `base_url`.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
