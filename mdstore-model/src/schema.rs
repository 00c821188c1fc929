use crate::error::{ModelError, ModelResult};
use crate::parser::Parser;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Default name of the server identity field.
pub const DEFAULT_KEY_ID: &str = "id";

/// Default name of the local identity field.
pub const DEFAULT_LID_FIELD: &str = "lid";

/// The serializable part of a model kind declaration.
///
/// Hosts may keep these in JSON config and turn them into a [`ModelKind`]
/// with [`ModelKind::from_schema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindSchema {
    pub name: String,
    /// Declared property names, in declaration order.
    pub props: Vec<String>,
    #[serde(default = "default_key_id")]
    pub key_id: String,
    #[serde(default = "default_lid_field")]
    pub lid_field: String,
    /// Whether instances of this kind go through the identity cache.
    #[serde(default)]
    pub cache: bool,
    /// Values used for declared properties missing from raw data.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub defaults: Map<String, Value>,
}

fn default_key_id() -> String {
    DEFAULT_KEY_ID.to_string()
}

fn default_lid_field() -> String {
    DEFAULT_LID_FIELD.to_string()
}

impl KindSchema {
    /// A schema with the default identity fields and caching off.
    pub fn new<I, S>(name: impl Into<String>, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            props: props.into_iter().map(Into::into).collect(),
            key_id: default_key_id(),
            lid_field: default_lid_field(),
            cache: false,
            defaults: Map::new(),
        }
    }

    fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::InvalidKind("name must not be empty".into()));
        }
        if self.key_id.is_empty() || self.lid_field.is_empty() {
            return Err(ModelError::InvalidKind(format!(
                "{}: identity field names must not be empty",
                self.name
            )));
        }
        if self.key_id == self.lid_field {
            return Err(ModelError::InvalidKind(format!(
                "{}: key_id and lid_field are both {:?}",
                self.name, self.key_id
            )));
        }

        let mut seen = HashSet::new();
        for prop in &self.props {
            if prop.is_empty() {
                return Err(ModelError::InvalidKind(format!(
                    "{}: empty property name",
                    self.name
                )));
            }
            if prop == &self.key_id || prop == &self.lid_field {
                return Err(ModelError::InvalidKind(format!(
                    "{}: property {prop:?} shadows an identity field",
                    self.name
                )));
            }
            if !seen.insert(prop.as_str()) {
                return Err(ModelError::InvalidKind(format!(
                    "{}: property {prop:?} declared twice",
                    self.name
                )));
            }
        }

        if let Some(orphan) = self.defaults.keys().find(|k| !seen.contains(k.as_str())) {
            return Err(ModelError::InvalidKind(format!(
                "{}: default given for undeclared property {orphan:?}",
                self.name
            )));
        }
        Ok(())
    }
}

/// A declared model kind: schema plus the named parsers it supports.
///
/// Built once and shared as `Arc<ModelKind>`; the field list never changes
/// after construction.
pub struct ModelKind {
    schema: KindSchema,
    parsers: HashMap<String, Arc<dyn Parser>>,
}

impl ModelKind {
    /// Starts declaring a kind with the given name.
    pub fn builder(name: impl Into<String>) -> ModelKindBuilder {
        ModelKindBuilder {
            schema: KindSchema::new(name, Vec::<String>::new()),
            parsers: HashMap::new(),
        }
    }

    /// Validates a schema loaded from elsewhere. The kind has no parsers.
    pub fn from_schema(schema: KindSchema) -> ModelResult<Self> {
        schema.validate()?;
        Ok(Self {
            schema,
            parsers: HashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Declared property names in declaration order.
    pub fn props(&self) -> &[String] {
        &self.schema.props
    }

    pub fn has_prop(&self, name: &str) -> bool {
        self.schema.props.iter().any(|p| p == name)
    }

    /// Name of the server identity field (`id` unless overridden).
    pub fn key_id(&self) -> &str {
        &self.schema.key_id
    }

    /// Name of the local identity field (`lid` unless overridden).
    pub fn lid_field(&self) -> &str {
        &self.schema.lid_field
    }

    pub fn is_cached(&self) -> bool {
        self.schema.cache
    }

    /// Value a declared property takes when raw data omits it.
    pub fn default_for(&self, prop: &str) -> Value {
        self.schema.defaults.get(prop).cloned().unwrap_or(Value::Null)
    }

    pub fn parser(&self, name: &str) -> Option<&Arc<dyn Parser>> {
        self.parsers.get(name)
    }

    pub fn schema(&self) -> &KindSchema {
        &self.schema
    }
}

impl fmt::Debug for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parsers: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        parsers.sort_unstable();
        f.debug_struct("ModelKind")
            .field("schema", &self.schema)
            .field("parsers", &parsers)
            .finish()
    }
}

/// Builder returned by [`ModelKind::builder`].
pub struct ModelKindBuilder {
    schema: KindSchema,
    parsers: HashMap<String, Arc<dyn Parser>>,
}

impl ModelKindBuilder {
    /// Declares one property.
    pub fn prop(mut self, name: impl Into<String>) -> Self {
        self.schema.props.push(name.into());
        self
    }

    /// Declares several properties in order.
    pub fn props<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema.props.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn key_id(mut self, field: impl Into<String>) -> Self {
        self.schema.key_id = field.into();
        self
    }

    pub fn lid_field(mut self, field: impl Into<String>) -> Self {
        self.schema.lid_field = field.into();
        self
    }

    /// Turns the identity cache on or off for this kind.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.schema.cache = enabled;
        self
    }

    pub fn default_value(mut self, prop: impl Into<String>, value: Value) -> Self {
        self.schema.defaults.insert(prop.into(), value);
        self
    }

    /// Registers a named parser usable through `CreateOptions::parser`.
    pub fn parser(mut self, name: impl Into<String>, parser: impl Parser + 'static) -> Self {
        self.parsers.insert(name.into(), Arc::new(parser));
        self
    }

    pub fn build(self) -> ModelResult<ModelKind> {
        self.schema.validate()?;
        Ok(ModelKind {
            schema: self.schema,
            parsers: self.parsers,
        })
    }
}
