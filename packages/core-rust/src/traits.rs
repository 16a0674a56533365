use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EndpointError;
use crate::types::{Record, Value};

/// Companion-service endpoint pair backing a remote field.
///
/// `list` serves the batch path (one call per collection), `detail` serves
/// the single-record path. Timeouts, retries, and auth belong to the
/// implementation; the resolution engine adds none.
#[async_trait]
pub trait RemoteEndpoint: Send + Sync {
    /// Fetch every remote record. Each record must carry an `id` attribute.
    async fn list(&self) -> Result<Vec<Record>, EndpointError>;

    /// Fetch the remote record whose primary key is `pk`.
    ///
    /// Report a missing object as [`EndpointError::NotFound`] or
    /// [`EndpointError::BadRequest`] so the engine can degrade it to null.
    async fn detail(&self, pk: &Value) -> Result<Record, EndpointError>;
}

#[async_trait]
impl<T: RemoteEndpoint + ?Sized> RemoteEndpoint for Arc<T> {
    async fn list(&self) -> Result<Vec<Record>, EndpointError> {
        (**self).list().await
    }

    async fn detail(&self, pk: &Value) -> Result<Record, EndpointError> {
        (**self).detail(pk).await
    }
}

/// Result of following a relation on a [`Model`].
pub enum Relation {
    /// The relation is unset.
    Null,
    /// To-one relation.
    One(Arc<dyn Model>),
    /// To-many relation, in relation order.
    Many(Vec<Arc<dyn Model>>),
}

/// In-process object a [`Serializer`](crate::compose::Serializer) reads from.
///
/// Local attributes and relations come from here without network access.
pub trait Model: Send + Sync {
    /// Value of a local attribute, or `None` if the object has no such attribute.
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Follow a relation by name.
    fn related(&self, name: &str) -> Relation;
}

/// A plain record acts as a model: nested maps are to-one relations and
/// arrays of maps are to-many relations.
impl Model for Record {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn related(&self, name: &str) -> Relation {
        match self.get(name) {
            Some(Value::Map(child)) => Relation::One(Arc::new(child.clone())),
            Some(Value::Array(items)) => Relation::Many(
                items
                    .iter()
                    .filter_map(Value::as_map)
                    .map(|child| Arc::new(child.clone()) as Arc<dyn Model>)
                    .collect(),
            ),
            _ => Relation::Null,
        }
    }
}
