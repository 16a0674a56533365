//! `RemoteFields` Core — remote field declarations, record views, the batch
//! resolution engine, and nested serializer composition.

pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod traits;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use compose::{Field, Instance, Serializer};
pub use config::EngineConfig;
pub use engine::{RemoteResolutionEngine, REMOTE_ID};
pub use error::{EndpointError, ResolveError};
pub use field::RemoteFieldSpec;
pub use traits::{Model, Relation, RemoteEndpoint};
pub use types::{JoinKey, Record, Value};
pub use view::RecordView;
