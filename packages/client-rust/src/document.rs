//! Serialize plain JSON documents through a [`Serializer`].

use std::sync::Arc;

use remotefields_core::{
    Instance, Model, RecordView, RemoteResolutionEngine, ResolveError, Serializer, Value,
};

/// Errors enriching a JSON document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document must be a JSON object or an array of objects, found {0}")]
    Shape(&'static str),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Int(_) | Value::Float(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Map(_) => "an object",
    }
}

/// Serializes `document` with `serializer`: an object as a single record,
/// an array of objects as a collection.
///
/// # Errors
///
/// Returns [`DocumentError::Shape`] for any other document shape, and
/// [`DocumentError::Resolve`] if resolution fails.
pub async fn enrich_document(
    serializer: &Serializer,
    engine: &RemoteResolutionEngine,
    document: Value,
) -> Result<RecordView, DocumentError> {
    match document {
        Value::Map(record) => Ok(serializer.serialize(engine, Instance::One(&record)).await?),
        Value::Array(items) => {
            let models = items
                .into_iter()
                .map(|item| match item {
                    Value::Map(record) => Ok(Arc::new(record) as Arc<dyn Model>),
                    other => Err(DocumentError::Shape(kind(&other))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(serializer.serialize(engine, Instance::Many(&models)).await?)
        }
        other => Err(DocumentError::Shape(kind(&other))),
    }
}
