//! Timeout middleware for endpoints.
//!
//! Fails calls that exceed the configured duration with a transport error,
//! so a slow companion service aborts resolution instead of hanging it.

use std::time::Duration;

use async_trait::async_trait;
use remotefields_core::{EndpointError, Record, RemoteEndpoint, Value};

/// Endpoint wrapper that enforces a per-call timeout.
#[derive(Debug, Clone)]
pub struct TimeoutEndpoint<E> {
    inner: E,
    timeout: Duration,
}

impl<E> TimeoutEndpoint<E> {
    pub fn new(inner: E, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    fn elapsed(&self) -> EndpointError {
        #[allow(clippy::cast_possible_truncation)]
        let timeout_ms = self.timeout.as_millis() as u64;
        EndpointError::Transport(anyhow::anyhow!("endpoint call timed out after {timeout_ms}ms"))
    }
}

#[async_trait]
impl<E: RemoteEndpoint> RemoteEndpoint for TimeoutEndpoint<E> {
    async fn list(&self) -> Result<Vec<Record>, EndpointError> {
        match tokio::time::timeout(self.timeout, self.inner.list()).await {
            Ok(result) => result,
            Err(_elapsed) => Err(self.elapsed()),
        }
    }

    async fn detail(&self, pk: &Value) -> Result<Record, EndpointError> {
        match tokio::time::timeout(self.timeout, self.inner.detail(pk)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(self.elapsed()),
        }
    }
}
