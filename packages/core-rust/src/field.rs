//! Remote field declarations.

use std::fmt;
use std::sync::Arc;

use crate::error::ResolveError;
use crate::traits::RemoteEndpoint;
use crate::types::{Record, Value};

/// Declaration of one remote-derived output field.
///
/// Immutable once built. Cloning is cheap: the endpoint is shared, so one
/// declaration can back any number of concurrent resolution calls.
#[derive(Clone)]
pub struct RemoteFieldSpec {
    name: String,
    local_key: String,
    remote_attributes: Vec<String>,
    flatten: bool,
    endpoint: Arc<dyn RemoteEndpoint>,
}

impl RemoteFieldSpec {
    /// Declares output field `name`, joined on local attribute `local_key`,
    /// projecting `remote_attributes` from records served by `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidSpecification`] if `remote_attributes`
    /// is empty or a key name is blank.
    pub fn new<I, S>(
        name: impl Into<String>,
        local_key: impl Into<String>,
        remote_attributes: I,
        endpoint: Arc<dyn RemoteEndpoint>,
    ) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = Self {
            name: name.into(),
            local_key: local_key.into(),
            remote_attributes: remote_attributes.into_iter().map(Into::into).collect(),
            flatten: false,
            endpoint,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Like [`RemoteFieldSpec::new`], but resolves to the single remote
    /// attribute's scalar instead of a mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidSpecification`] unless exactly one
    /// remote attribute is requested.
    pub fn flattened<I, S>(
        name: impl Into<String>,
        local_key: impl Into<String>,
        remote_attributes: I,
        endpoint: Arc<dyn RemoteEndpoint>,
    ) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = Self {
            name: name.into(),
            local_key: local_key.into(),
            remote_attributes: remote_attributes.into_iter().map(Into::into).collect(),
            flatten: true,
            endpoint,
        };
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<(), ResolveError> {
        if self.name.is_empty() {
            return Err(ResolveError::invalid(&self.name, "output name is empty"));
        }
        if self.local_key.is_empty() {
            return Err(ResolveError::invalid(&self.name, "join key is empty"));
        }
        if self.remote_attributes.is_empty() {
            return Err(ResolveError::invalid(
                &self.name,
                "at least one remote attribute is required",
            ));
        }
        if self.flatten && self.remote_attributes.len() != 1 {
            return Err(ResolveError::invalid(
                &self.name,
                format!(
                    "flatten requires exactly one remote attribute, got {}",
                    self.remote_attributes.len()
                ),
            ));
        }
        Ok(())
    }

    /// Output field name the resolved value is written under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local attribute supplying the join key.
    #[must_use]
    pub fn local_key(&self) -> &str {
        &self.local_key
    }

    /// Remote attributes to project, in output order.
    #[must_use]
    pub fn remote_attributes(&self) -> &[String] {
        &self.remote_attributes
    }

    #[must_use]
    pub fn is_flatten(&self) -> bool {
        self.flatten
    }

    #[must_use]
    pub fn endpoint(&self) -> &Arc<dyn RemoteEndpoint> {
        &self.endpoint
    }

    /// Projects a remote record into this field's output value.
    ///
    /// Flatten mode yields the single attribute's value; otherwise a mapping
    /// restricted to the declared attributes, in declared order.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MissingRemoteAttribute`] if the remote record
    /// lacks a declared attribute.
    pub fn project(&self, remote: &Record) -> Result<Value, ResolveError> {
        let lookup = |attribute: &String| {
            remote
                .get(attribute)
                .cloned()
                .ok_or_else(|| ResolveError::MissingRemoteAttribute {
                    field: self.name.clone(),
                    attribute: attribute.clone(),
                })
        };

        if self.flatten {
            return lookup(&self.remote_attributes[0]);
        }

        let mut projected = Record::with_capacity(self.remote_attributes.len());
        for attribute in &self.remote_attributes {
            projected.insert(attribute.clone(), lookup(attribute)?);
        }
        Ok(Value::Map(projected))
    }

    /// Whether `record` already holds this field's resolved value.
    ///
    /// A mapping in the output slot counts as pre-expanded. In flatten mode a
    /// non-null scalar counts once the join key itself is gone.
    pub(crate) fn is_resolved_in(&self, record: &Record) -> bool {
        match (self.flatten, record.get(&self.name)) {
            (false, Some(Value::Map(_))) => true,
            (true, Some(value)) => {
                !value.is_null()
                    && self.local_key != self.name
                    && !record.contains_key(&self.local_key)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for RemoteFieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteFieldSpec")
            .field("name", &self.name)
            .field("local_key", &self.local_key)
            .field("remote_attributes", &self.remote_attributes)
            .field("flatten", &self.flatten)
            .finish_non_exhaustive()
    }
}
