//! Tracing middleware for endpoints.
//!
//! Records call duration and outcome using `tracing` spans, not a metrics crate.

use std::time::Instant;

use async_trait::async_trait;
use remotefields_core::{EndpointError, Record, RemoteEndpoint, Value};
use tracing::{info_span, Instrument};

/// Endpoint wrapper that records each call's duration and outcome.
#[derive(Debug, Clone)]
pub struct TracedEndpoint<E> {
    inner: E,
    name: String,
}

impl<E> TracedEndpoint<E> {
    pub fn new(inner: E, name: impl Into<String>) -> Self {
        Self {
            inner,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// `ok`, `miss` (lookup miss), or `error`.
fn outcome<T>(result: &Result<T, EndpointError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(err) if err.is_lookup_miss() => "miss",
        Err(_) => "error",
    }
}

fn record_outcome(endpoint: &str, call: &'static str, start: Instant, outcome: &'static str) {
    #[allow(clippy::cast_possible_truncation)]
    let duration_ms = start.elapsed().as_millis() as u64;
    tracing::Span::current().record("duration_ms", duration_ms);
    tracing::Span::current().record("outcome", outcome);
    tracing::info!(
        endpoint = endpoint,
        call = call,
        duration_ms = duration_ms,
        outcome = outcome,
        "endpoint call complete"
    );
}

#[async_trait]
impl<E: RemoteEndpoint> RemoteEndpoint for TracedEndpoint<E> {
    async fn list(&self) -> Result<Vec<Record>, EndpointError> {
        let span = info_span!(
            "endpoint",
            endpoint = %self.name,
            call = "list",
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );
        async {
            let start = Instant::now();
            let result = self.inner.list().await;
            record_outcome(&self.name, "list", start, outcome(&result));
            result
        }
        .instrument(span)
        .await
    }

    async fn detail(&self, pk: &Value) -> Result<Record, EndpointError> {
        let span = info_span!(
            "endpoint",
            endpoint = %self.name,
            call = "detail",
            pk = ?pk,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );
        async {
            let start = Instant::now();
            let result = self.inner.detail(pk).await;
            record_outcome(&self.name, "detail", start, outcome(&result));
            result
        }
        .instrument(span)
        .await
    }
}
