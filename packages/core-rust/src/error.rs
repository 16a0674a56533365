//! Error taxonomy for remote field resolution.

/// Failure reported by a [`RemoteEndpoint`](crate::traits::RemoteEndpoint).
///
/// `NotFound` and `BadRequest` form the "lookup miss" class: on the detail
/// path they degrade the field to null. `Transport` always propagates.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("remote object not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("transport error: {0}")]
    Transport(#[from] anyhow::Error),
}

impl EndpointError {
    /// Whether this error means "no such remote object" rather than a failed call.
    #[must_use]
    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, EndpointError::NotFound(_) | EndpointError::BadRequest(_))
    }
}

/// Errors that abort a resolution or serialization call.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// A field or serializer declaration violates its contract.
    #[error("invalid specification for field `{field}`: {reason}")]
    InvalidSpecification { field: String, reason: String },

    /// A remote record lacks an attribute the field declares.
    #[error("remote record for field `{field}` is missing attribute `{attribute}`")]
    MissingRemoteAttribute { field: String, attribute: String },

    /// An endpoint failed in a way that is not a lookup miss.
    #[error("endpoint for field `{field}` failed: {source}")]
    Endpoint {
        field: String,
        #[source]
        source: EndpointError,
    },
}

impl ResolveError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ResolveError::InvalidSpecification {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
