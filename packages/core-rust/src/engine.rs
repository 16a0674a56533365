//! Remote field resolution engine.
//!
//! Enriches a [`RecordView`] with remote fields in three steps:
//!
//! 1. **Fetch**: one `list` call per field for a collection, one `detail`
//!    call per field for a single record (none when the join key is null).
//! 2. **Join**: match remote records to local records by primary key and
//!    project them into each field's output slot.
//! 3. **Strip**: drop every attribute that is neither declared for output nor
//!    a remote field's output, join keys included.
//!
//! Lookup misses (absent or null keys, unknown pks, not-found detail calls)
//! resolve to null. Spec mismatches and transport failures abort the call.

use std::collections::HashMap;

use futures_util::future::try_join_all;
use tracing::{debug, debug_span, warn, Instrument};

use crate::config::EngineConfig;
use crate::error::ResolveError;
use crate::field::RemoteFieldSpec;
use crate::types::{JoinKey, Record, Value};
use crate::view::RecordView;

/// Attribute every remote record is keyed by.
pub const REMOTE_ID: &str = "id";

/// Batch-joins remote data onto serialized records.
///
/// Holds no state between calls: every `resolve` builds and discards its own
/// remote-id index.
#[derive(Debug, Clone, Default)]
pub struct RemoteResolutionEngine {
    config: EngineConfig,
}

impl RemoteResolutionEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolves every field in `specs` onto `view` and returns the enriched view.
    ///
    /// `declared` is the caller's requested output field set. Every other
    /// attribute, join keys included, is removed from every record before
    /// returning; remote field outputs are always kept.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::MissingRemoteAttribute`] if a remote record lacks a
    ///   projected attribute (or `id` on the list path).
    /// - [`ResolveError::Endpoint`] if an endpoint fails with anything other
    ///   than a detail-path lookup miss.
    pub async fn resolve(
        &self,
        mut view: RecordView,
        specs: &[RemoteFieldSpec],
        declared: &[String],
    ) -> Result<RecordView, ResolveError> {
        let span = debug_span!(
            "resolve",
            collection = view.is_collection(),
            records = view.len(),
            fields = specs.len(),
        );

        async {
            match &mut view {
                RecordView::Collection(records) => self.resolve_collection(records, specs).await?,
                RecordView::Single(record) => self.resolve_single(record, specs).await?,
            }
            view.retain(|key| is_output(key, declared, specs));
            Ok::<_, ResolveError>(view)
        }
        .instrument(span)
        .await
    }

    async fn resolve_collection(
        &self,
        records: &mut [Record],
        specs: &[RemoteFieldSpec],
    ) -> Result<(), ResolveError> {
        // An empty collection still pays its one list call per field.
        let pending: Vec<&RemoteFieldSpec> = specs
            .iter()
            .filter(|spec| records.is_empty() || records.iter().any(|r| !spec.is_resolved_in(r)))
            .collect();

        let batches = if self.config.parallel_fetch {
            try_join_all(pending.iter().map(|spec| fetch_list(spec))).await?
        } else {
            let mut batches = Vec::with_capacity(pending.len());
            for spec in &pending {
                batches.push(fetch_list(spec).await?);
            }
            batches
        };

        for (spec, batch) in pending.into_iter().zip(batches) {
            let index = build_index(spec, batch)?;
            let mut misses = 0_usize;
            for record in records.iter_mut() {
                if spec.is_resolved_in(record) {
                    continue;
                }
                let value = match join_key(spec, record).and_then(|key| index.get(&key)) {
                    Some(remote) => spec.project(remote)?,
                    None => {
                        misses += 1;
                        Value::Null
                    }
                };
                record.insert(spec.name().to_string(), value);
            }
            debug!(
                field = spec.name(),
                indexed = index.len(),
                misses,
                "joined list batch"
            );
        }
        Ok(())
    }

    async fn resolve_single(
        &self,
        record: &mut Record,
        specs: &[RemoteFieldSpec],
    ) -> Result<(), ResolveError> {
        let mut pending: Vec<(&RemoteFieldSpec, Value)> = Vec::with_capacity(specs.len());
        for spec in specs {
            if spec.is_resolved_in(record) {
                debug!(field = spec.name(), "already expanded, skipping detail call");
                continue;
            }
            match join_key(spec, record) {
                Some(key) => pending.push((spec, Value::from(key))),
                None => {
                    record.insert(spec.name().to_string(), Value::Null);
                }
            }
        }

        let fetched = if self.config.parallel_fetch {
            try_join_all(pending.iter().map(|(spec, pk)| fetch_detail(spec, pk))).await?
        } else {
            let mut fetched = Vec::with_capacity(pending.len());
            for (spec, pk) in &pending {
                fetched.push(fetch_detail(spec, pk).await?);
            }
            fetched
        };

        for ((spec, _), remote) in pending.into_iter().zip(fetched) {
            let value = match remote {
                Some(remote) => spec.project(&remote)?,
                None => Value::Null,
            };
            record.insert(spec.name().to_string(), value);
        }
        Ok(())
    }
}

fn is_output(key: &str, declared: &[String], specs: &[RemoteFieldSpec]) -> bool {
    declared.iter().any(|d| d == key) || specs.iter().any(|s| s.name() == key)
}

/// Reads the join key of `spec` from `record`. Absent, null, and unjoinable
/// values yield `None`.
fn join_key(spec: &RemoteFieldSpec, record: &Record) -> Option<JoinKey> {
    match record.get(spec.local_key()) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let key = JoinKey::from_value(value);
            if key.is_none() {
                warn!(
                    field = spec.name(),
                    local_key = spec.local_key(),
                    "join key value cannot be used as a primary key; resolving to null"
                );
            }
            key
        }
    }
}

async fn fetch_list(spec: &RemoteFieldSpec) -> Result<Vec<Record>, ResolveError> {
    let batch = spec
        .endpoint()
        .list()
        .await
        .map_err(|source| ResolveError::Endpoint {
            field: spec.name().to_string(),
            source,
        })?;
    debug!(field = spec.name(), remote_records = batch.len(), "list call complete");
    Ok(batch)
}

/// Fetches one remote record. Lookup misses become `Ok(None)`.
async fn fetch_detail(spec: &RemoteFieldSpec, pk: &Value) -> Result<Option<Record>, ResolveError> {
    match spec.endpoint().detail(pk).await {
        Ok(remote) => Ok(Some(remote)),
        Err(err) if err.is_lookup_miss() => {
            debug!(field = spec.name(), pk = ?pk, error = %err, "detail lookup missed; resolving to null");
            Ok(None)
        }
        Err(source) => Err(ResolveError::Endpoint {
            field: spec.name().to_string(),
            source,
        }),
    }
}

/// Indexes a list batch by remote `id`. Duplicate ids keep the record that
/// comes last in the batch.
fn build_index(
    spec: &RemoteFieldSpec,
    batch: Vec<Record>,
) -> Result<HashMap<JoinKey, Record>, ResolveError> {
    let mut index = HashMap::with_capacity(batch.len());
    for remote in batch {
        let id = remote
            .get(REMOTE_ID)
            .ok_or_else(|| ResolveError::MissingRemoteAttribute {
                field: spec.name().to_string(),
                attribute: REMOTE_ID.to_string(),
            })?;
        let Some(key) = JoinKey::from_value(id) else {
            warn!(field = spec.name(), id = ?id, "remote id cannot be indexed; skipping record");
            continue;
        };
        if let Some(previous) = index.insert(key, remote) {
            warn!(
                field = spec.name(),
                id = ?previous.get(REMOTE_ID),
                "duplicate remote id in list batch; last record wins"
            );
        }
    }
    Ok(index)
}
