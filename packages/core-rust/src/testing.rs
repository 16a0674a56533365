//! Test doubles shared by the engine and composer tests.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::EndpointError;
use crate::traits::RemoteEndpoint;
use crate::types::{Record, Value};

/// Builds a record from a JSON object literal.
pub(crate) fn record(json: serde_json::Value) -> Record {
    match Value::from(json) {
        Value::Map(map) => map,
        other => panic!("expected a JSON object, got {other:?}"),
    }
}

/// How [`FakeEndpoint::detail`] answers a pk it does not know.
#[derive(Clone, Copy)]
pub(crate) enum Miss {
    NotFound,
    BadRequest,
    Transport,
}

/// In-memory remote service that counts and logs every call.
pub(crate) struct FakeEndpoint {
    records: Vec<Record>,
    miss: Miss,
    fail_list: bool,
    pub list_calls: AtomicU32,
    pub detail_calls: AtomicU32,
    pub detail_log: Mutex<Vec<Value>>,
}

impl FakeEndpoint {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            miss: Miss::NotFound,
            fail_list: false,
            list_calls: AtomicU32::new(0),
            detail_calls: AtomicU32::new(0),
            detail_log: Mutex::new(Vec::new()),
        }
    }

    /// The companion service of the original scenarios: things 2001..=2003.
    pub fn things() -> Self {
        Self::new(vec![
            record(serde_json::json!({"id": 2001, "name": "Name of the thing", "extra": "y"})),
            record(serde_json::json!({"id": 2002, "name": "Name of the thing"})),
            record(serde_json::json!({"id": 2003, "name": "Name of another thing"})),
        ])
    }

    pub fn with_miss(mut self, miss: Miss) -> Self {
        self.miss = miss;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn lists(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn details(&self) -> u32 {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteEndpoint for FakeEndpoint {
    async fn list(&self) -> Result<Vec<Record>, EndpointError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(EndpointError::Transport(anyhow::anyhow!("connection refused")));
        }
        Ok(self.records.clone())
    }

    async fn detail(&self, pk: &Value) -> Result<Record, EndpointError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.detail_log.lock().push(pk.clone());
        if let Some(found) = self.records.iter().find(|r| r.get("id") == Some(pk)) {
            return Ok(found.clone());
        }
        Err(match self.miss {
            Miss::NotFound => EndpointError::NotFound(format!("pk={pk:?}")),
            Miss::BadRequest => EndpointError::BadRequest("Invalid request".to_string()),
            Miss::Transport => EndpointError::Transport(anyhow::anyhow!("502 Bad Gateway")),
        })
    }
}
