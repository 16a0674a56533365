//! Serializer definitions loaded from JSON.
//!
//! A definition names endpoints instead of holding them; [`SerializerDef::compile`]
//! binds the names against an [`EndpointSource`] and yields a core [`Serializer`].
//!
//! ```json
//! {
//!   "fields": [
//!     {"name": "id", "kind": "local"},
//!     {"name": "thing", "kind": "remote", "source": "thing_id",
//!      "remote_sources": ["id", "name"],
//!      "endpoints": {"list": "some__endpoint_list", "detail": "some__endpoint_detail"}}
//!   ]
//! }
//! ```

use std::sync::Arc;

use remotefields_core::{Field, RemoteFieldSpec, ResolveError, Serializer};
use serde::{Deserialize, Serialize};

use crate::endpoint::{ClientError, EndpointSource};

/// Errors loading or compiling a serializer definition.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("failed to parse serializer definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Spec(#[from] ResolveError),
}

/// Declared output fields of one serializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializerDef {
    pub fields: Vec<FieldDef>,
}

/// Endpoint names backing a remote field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointsDef {
    pub list: String,
    pub detail: String,
}

/// One declared field. `source` defaults to the field name where optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldDef {
    Local {
        name: String,
        #[serde(default)]
        source: Option<String>,
    },
    Remote {
        name: String,
        source: String,
        remote_sources: Vec<String>,
        #[serde(default)]
        flatten: bool,
        endpoints: EndpointsDef,
    },
    Nested {
        name: String,
        #[serde(default)]
        source: Option<String>,
        #[serde(default)]
        many: bool,
        serializer: SerializerDef,
    },
}

impl SerializerDef {
    /// Parses a definition from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::Parse`] on malformed JSON or an unknown field kind.
    pub fn from_json(text: &str) -> Result<Self, DefinitionError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Binds endpoint names and builds the serializer, nested ones included.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::Client`] for an unregistered endpoint name
    /// and [`DefinitionError::Spec`] for an invalid field or field set.
    pub fn compile(&self, endpoints: &dyn EndpointSource) -> Result<Serializer, DefinitionError> {
        let mut fields = Vec::with_capacity(self.fields.len());
        for def in &self.fields {
            let field = match def {
                FieldDef::Local { name, source } => {
                    Field::local_from(name, source.as_deref().unwrap_or(name))
                }
                FieldDef::Remote {
                    name,
                    source,
                    remote_sources,
                    flatten,
                    endpoints: names,
                } => {
                    let endpoint = endpoints.endpoint(&names.list, &names.detail)?;
                    let spec = if *flatten {
                        RemoteFieldSpec::flattened(name, source, remote_sources, endpoint)?
                    } else {
                        RemoteFieldSpec::new(name, source, remote_sources, endpoint)?
                    };
                    Field::Remote(spec)
                }
                FieldDef::Nested {
                    name,
                    source,
                    many,
                    serializer,
                } => Field::Nested {
                    name: name.clone(),
                    source: source.clone().unwrap_or_else(|| name.clone()),
                    serializer: Arc::new(serializer.compile(endpoints)?),
                    many: *many,
                },
            };
            fields.push(field);
        }
        Ok(Serializer::new(fields)?)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use remotefields_core::{EndpointError, Record, RemoteEndpoint, Value};

    use super::*;

    struct Offline;

    #[async_trait]
    impl RemoteEndpoint for Offline {
        async fn list(&self) -> Result<Vec<Record>, EndpointError> {
            Ok(Vec::new())
        }

        async fn detail(&self, pk: &Value) -> Result<Record, EndpointError> {
            Err(EndpointError::NotFound(format!("{pk:?}")))
        }
    }

    /// Knows only the `things__*` endpoint names.
    struct Names;

    impl EndpointSource for Names {
        fn endpoint(&self, list: &str, detail: &str) -> Result<Arc<dyn RemoteEndpoint>, ClientError> {
            for name in [list, detail] {
                if !name.starts_with("things__") {
                    return Err(ClientError::UnknownEndpoint {
                        name: name.to_string(),
                    });
                }
            }
            Ok(Arc::new(Offline))
        }
    }

    const PARENT: &str = r#"{
        "fields": [
            {"name": "id", "kind": "local"},
            {"name": "label", "kind": "local", "source": "title"},
            {"name": "thing_name", "kind": "remote", "source": "thing_id",
             "remote_sources": ["name"], "flatten": true,
             "endpoints": {"list": "things__list", "detail": "things__detail"}},
            {"name": "test_instances", "kind": "nested", "many": true,
             "serializer": {"fields": [
                {"name": "id", "kind": "local"},
                {"name": "thing", "kind": "remote", "source": "thing_id",
                 "remote_sources": ["id", "name"],
                 "endpoints": {"list": "things__list", "detail": "things__detail"}}
             ]}}
        ]
    }"#;

    #[test]
    fn parses_all_field_kinds() {
        let def = SerializerDef::from_json(PARENT).unwrap();
        assert_eq!(def.fields.len(), 4);
        assert_eq!(
            def.fields[1],
            FieldDef::Local {
                name: "label".into(),
                source: Some("title".into())
            }
        );
        assert!(matches!(def.fields[2], FieldDef::Remote { flatten: true, .. }));
        assert!(matches!(def.fields[3], FieldDef::Nested { many: true, .. }));
    }

    #[test]
    fn compiles_nested_serializers() {
        let serializer = SerializerDef::from_json(PARENT).unwrap().compile(&Names).unwrap();
        assert_eq!(serializer.declared(), ["id", "label", "thing_name", "test_instances"]);
        match &serializer.fields()[3] {
            Field::Nested {
                source,
                serializer,
                many,
                ..
            } => {
                assert_eq!(source, "test_instances");
                assert!(*many);
                assert_eq!(serializer.declared(), ["id", "thing"]);
            }
            other => panic!("expected nested field, got {other:?}"),
        }
    }

    #[test]
    fn unknown_endpoint_fails_compilation() {
        let text = PARENT.replace("things__detail", "widgets__detail");
        let err = SerializerDef::from_json(&text).unwrap().compile(&Names).unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::Client(ClientError::UnknownEndpoint { ref name }) if name == "widgets__detail"
        ));
    }

    #[test]
    fn flatten_with_two_attributes_fails_compilation() {
        let text = PARENT.replace(r#""remote_sources": ["name"]"#, r#""remote_sources": ["id", "name"]"#);
        let err = SerializerDef::from_json(&text).unwrap().compile(&Names).unwrap_err();
        assert!(matches!(
            err,
            DefinitionError::Spec(ResolveError::InvalidSpecification { ref field, .. }) if field == "thing_name"
        ));
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let err = SerializerDef::from_json(r#"{"fields": [{"name": "x", "kind": "magic"}]}"#).unwrap_err();
        assert!(matches!(err, DefinitionError::Parse(_)));
    }
}
