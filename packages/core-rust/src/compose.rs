//! Serializers composed of local, remote, and nested fields.
//!
//! A [`Serializer`] turns in-process [`Model`]s into a [`RecordView`] in an
//! explicit two-phase build:
//!
//! 1. **Gather**: read declared local fields, pre-expanded remote values, and
//!    the join keys remote fields need (the temporary working set).
//! 2. **Resolve**: hand the view to the [`RemoteResolutionEngine`], which
//!    fills remote fields and discards the working set.
//!
//! Nested fields are then filled by running the related objects through
//! their own serializer, which recursively repeats both phases.

use std::sync::Arc;

use futures_util::future::{try_join_all, BoxFuture};
use futures_util::FutureExt;
use tracing::debug;

use crate::engine::RemoteResolutionEngine;
use crate::error::ResolveError;
use crate::field::RemoteFieldSpec;
use crate::traits::{Model, Relation};
use crate::types::{Record, Value};
use crate::view::RecordView;

/// One declared output field.
#[derive(Debug, Clone)]
pub enum Field {
    /// Copied from the model's attribute `source`.
    Local { name: String, source: String },
    /// Fetched from a companion service at serialization time.
    Remote(RemoteFieldSpec),
    /// The related object(s) at relation `source`, serialized by `serializer`.
    Nested {
        name: String,
        source: String,
        serializer: Arc<Serializer>,
        many: bool,
    },
}

impl Field {
    /// Local field read from the attribute of the same name.
    pub fn local(name: impl Into<String>) -> Self {
        let name = name.into();
        Field::Local {
            source: name.clone(),
            name,
        }
    }

    pub fn local_from(name: impl Into<String>, source: impl Into<String>) -> Self {
        Field::Local {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Nested to-one relation read from the relation of the same name.
    pub fn nested(name: impl Into<String>, serializer: Arc<Serializer>) -> Self {
        let name = name.into();
        Field::Nested {
            source: name.clone(),
            name,
            serializer,
            many: false,
        }
    }

    /// Nested to-many relation read from the relation of the same name.
    pub fn nested_many(name: impl Into<String>, serializer: Arc<Serializer>) -> Self {
        let name = name.into();
        Field::Nested {
            source: name.clone(),
            name,
            serializer,
            many: true,
        }
    }

    /// Output name of the field.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Field::Local { name, .. } | Field::Nested { name, .. } => name,
            Field::Remote(spec) => spec.name(),
        }
    }
}

impl From<RemoteFieldSpec> for Field {
    fn from(spec: RemoteFieldSpec) -> Self {
        Field::Remote(spec)
    }
}

/// What to serialize: one object or an ordered collection.
#[derive(Clone, Copy)]
pub enum Instance<'a> {
    One(&'a dyn Model),
    Many(&'a [Arc<dyn Model>]),
}

/// Declared field set plus the remote fields it resolves.
#[derive(Debug)]
pub struct Serializer {
    fields: Vec<Field>,
    declared: Vec<String>,
    remote: Vec<RemoteFieldSpec>,
}

impl Serializer {
    /// Builds a serializer emitting `fields` in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidSpecification`] if no fields are
    /// declared or two fields share an output name.
    pub fn new(fields: Vec<Field>) -> Result<Self, ResolveError> {
        if fields.is_empty() {
            return Err(ResolveError::invalid("<serializer>", "no fields declared"));
        }
        let mut declared: Vec<String> = Vec::with_capacity(fields.len());
        for field in &fields {
            if declared.iter().any(|d| d == field.name()) {
                return Err(ResolveError::invalid(field.name(), "declared more than once"));
            }
            declared.push(field.name().to_string());
        }
        let remote = fields
            .iter()
            .filter_map(|field| match field {
                Field::Remote(spec) => Some(spec.clone()),
                _ => None,
            })
            .collect();
        Ok(Self {
            fields,
            declared,
            remote,
        })
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Output field names, in declaration order.
    #[must_use]
    pub fn declared(&self) -> &[String] {
        &self.declared
    }

    /// Serializes `instance`, resolving remote fields at every nesting level.
    ///
    /// A collection costs one `list` call per remote field; a single object
    /// one `detail` call per remote field with a non-null join key.
    ///
    /// # Errors
    ///
    /// Propagates any [`ResolveError`] from this serializer's resolution or
    /// from a nested serializer, and fails with
    /// [`ResolveError::InvalidSpecification`] when a to-one field meets a
    /// to-many relation.
    pub fn serialize<'a>(
        &'a self,
        engine: &'a RemoteResolutionEngine,
        instance: Instance<'a>,
    ) -> BoxFuture<'a, Result<RecordView, ResolveError>> {
        async move {
            let view = match instance {
                Instance::One(model) => RecordView::Single(self.gather(model)),
                Instance::Many(models) => RecordView::Collection(
                    models.iter().map(|model| self.gather(model.as_ref())).collect(),
                ),
            };
            let mut view = engine.resolve(view, &self.remote, &self.declared).await?;
            self.compose_nested(engine, instance, &mut view).await?;
            Ok(view)
        }
        .boxed()
    }

    /// Phase one: declared local values, placeholders that fix the output
    /// order, and the join keys remote fields read.
    fn gather(&self, model: &dyn Model) -> Record {
        let mut record = Record::with_capacity(self.fields.len() + self.remote.len());
        for field in &self.fields {
            let value = match field {
                Field::Local { source, .. } => model.attribute(source).unwrap_or(Value::Null),
                Field::Remote(spec) if spec.local_key() == spec.name() => {
                    model.attribute(spec.name()).unwrap_or(Value::Null)
                }
                Field::Remote(spec) => match model.attribute(spec.name()) {
                    Some(expanded @ Value::Map(_)) if !spec.is_flatten() => expanded,
                    _ => Value::Null,
                },
                Field::Nested { .. } => Value::Null,
            };
            record.insert(field.name().to_string(), value);
        }
        for spec in &self.remote {
            if record.contains_key(spec.local_key()) {
                continue;
            }
            if let Some(key) = model.attribute(spec.local_key()) {
                record.insert(spec.local_key().to_string(), key);
            }
        }
        record
    }

    async fn compose_nested(
        &self,
        engine: &RemoteResolutionEngine,
        instance: Instance<'_>,
        view: &mut RecordView,
    ) -> Result<(), ResolveError> {
        if !self.fields.iter().any(|f| matches!(f, Field::Nested { .. })) {
            return Ok(());
        }
        let models: Vec<&dyn Model> = match instance {
            Instance::One(model) => vec![model],
            Instance::Many(models) => models.iter().map(AsRef::as_ref).collect(),
        };

        let expanded = if engine.config().parallel_fetch {
            try_join_all(models.iter().map(|model| self.expand_relations(engine, *model))).await?
        } else {
            let mut expanded = Vec::with_capacity(models.len());
            for model in &models {
                expanded.push(self.expand_relations(engine, *model).await?);
            }
            expanded
        };

        for (record, values) in view.items_mut().iter_mut().zip(expanded) {
            for (name, value) in values {
                record.insert(name, value);
            }
        }
        Ok(())
    }

    /// Serializes every nested relation of one model.
    async fn expand_relations(
        &self,
        engine: &RemoteResolutionEngine,
        model: &dyn Model,
    ) -> Result<Vec<(String, Value)>, ResolveError> {
        let mut values = Vec::new();
        for field in &self.fields {
            let Field::Nested {
                name,
                source,
                serializer,
                many,
            } = field
            else {
                continue;
            };

            let value = match (model.related(source), *many) {
                (Relation::Null, false) => Value::Null,
                (Relation::Null, true) => Value::Array(Vec::new()),
                (Relation::One(child), false) => serializer
                    .serialize(engine, Instance::One(child.as_ref()))
                    .await?
                    .into_value(),
                (Relation::One(child), true) => {
                    serialize_each(serializer, engine, std::slice::from_ref(&child)).await?
                }
                (Relation::Many(children), true) if children.is_empty() => {
                    debug!(field = %name, "empty to-many relation");
                    Value::Array(Vec::new())
                }
                (Relation::Many(children), true) => {
                    serialize_each(serializer, engine, &children).await?
                }
                (Relation::Many(_), false) => {
                    return Err(ResolveError::invalid(
                        name,
                        "to-one field is backed by a to-many relation",
                    ));
                }
            };
            values.push((name.clone(), value));
        }
        Ok(values)
    }
}

/// Serializes each related object on its own, keeping relation order.
async fn serialize_each(
    serializer: &Serializer,
    engine: &RemoteResolutionEngine,
    children: &[Arc<dyn Model>],
) -> Result<Value, ResolveError> {
    let views = if engine.config().parallel_fetch {
        try_join_all(
            children
                .iter()
                .map(move |child| serializer.serialize(engine, Instance::One(child.as_ref()))),
        )
        .await?
    } else {
        let mut views = Vec::with_capacity(children.len());
        for child in children {
            views.push(serializer.serialize(engine, Instance::One(child.as_ref())).await?);
        }
        views
    };
    Ok(Value::Array(views.into_iter().map(RecordView::into_value).collect()))
}
