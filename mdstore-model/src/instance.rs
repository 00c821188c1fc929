use crate::error::{ModelError, ModelResult};
use crate::schema::ModelKind;
use mdstore_types::{server_id, IdentityKey, LocalId};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// The current value of one declared property.
#[derive(Debug, Clone)]
pub enum Prop {
    /// Plain JSON (scalars, arrays, unmodelled objects).
    Value(Value),
    /// A reference to another model instance.
    Model(Model),
    /// A collection of model instances.
    Models(Vec<Model>),
}

impl Prop {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_model(&self) -> Option<&Model> {
        match self {
            Self::Model(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_models(&self) -> Option<&[Model]> {
        match self {
            Self::Models(ms) => Some(ms),
            _ => None,
        }
    }

    /// Full JSON snapshot; nested models are expanded, not dereferenced.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Value(v) => v.clone(),
            Self::Model(m) => m.to_json(),
            Self::Models(ms) => Value::Array(ms.iter().map(Model::to_json).collect()),
        }
    }
}

/// Models compare by reference, values structurally.
impl PartialEq for Prop {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Model(a), Self::Model(b)) => Model::ptr_eq(a, b),
            (Self::Models(a), Self::Models(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| Model::ptr_eq(x, y))
            }
            _ => false,
        }
    }
}

impl From<Value> for Prop {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<Model> for Prop {
    fn from(m: Model) -> Self {
        Self::Model(m)
    }
}

impl From<Vec<Model>> for Prop {
    fn from(ms: Vec<Model>) -> Self {
        Self::Models(ms)
    }
}

impl From<&str> for Prop {
    fn from(s: &str) -> Self {
        Self::Value(Value::String(s.to_string()))
    }
}

impl From<String> for Prop {
    fn from(s: String) -> Self {
        Self::Value(Value::String(s))
    }
}

impl From<i64> for Prop {
    fn from(n: i64) -> Self {
        Self::Value(Value::from(n))
    }
}

impl From<bool> for Prop {
    fn from(b: bool) -> Self {
        Self::Value(Value::Bool(b))
    }
}

#[derive(Debug, Default)]
struct ModelState {
    id: Option<Value>,
    props: HashMap<String, Prop>,
}

struct ModelInner {
    kind: Arc<ModelKind>,
    lid: LocalId,
    state: RwLock<ModelState>,
}

/// Handle to one canonical model instance.
///
/// Cloning the handle does not copy the instance: every clone observes the
/// same properties, and in-place merges from later pulls are visible through
/// all of them. Use [`Model::ptr_eq`] to test identity.
#[derive(Clone)]
pub struct Model(Arc<ModelInner>);

impl Model {
    /// A fresh instance with a new local id and every declared property set
    /// to its default.
    ///
    /// The instance is not cached: it cannot be found by its lid until it is
    /// registered. Use [`ModelFactory::new_model`](crate::ModelFactory::new_model)
    /// for a draft the cache knows about.
    pub fn new(kind: Arc<ModelKind>) -> Self {
        let props = kind
            .props()
            .iter()
            .map(|p| (p.clone(), Prop::Value(kind.default_for(p))))
            .collect();
        Self(Arc::new(ModelInner {
            kind,
            lid: LocalId::new(),
            state: RwLock::new(ModelState { id: None, props }),
        }))
    }

    /// Builds a new instance from raw data: identity plus every declared
    /// property, missing ones taking the kind's default.
    pub(crate) fn from_raw(kind: &Arc<ModelKind>, data: &Map<String, Value>) -> Self {
        let model = Self::new(Arc::clone(kind));
        model.merge(data);
        model
    }

    /// Returns true when both handles point at the same instance.
    pub fn ptr_eq(a: &Model, b: &Model) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub fn kind(&self) -> &Arc<ModelKind> {
        &self.0.kind
    }

    pub fn lid(&self) -> LocalId {
        self.0.lid
    }

    /// The server identity exactly as it arrived, if any.
    pub fn id(&self) -> Option<Value> {
        self.read().id.clone()
    }

    /// The server identity in canonical string form.
    pub fn id_str(&self) -> Option<String> {
        self.read().id.as_ref().and_then(server_id)
    }

    /// The key this instance is cached under right now.
    pub fn identity_key(&self) -> IdentityKey {
        match self.id_str() {
            Some(id) => IdentityKey::Server(id),
            None => IdentityKey::Local(self.lid()),
        }
    }

    pub fn get(&self, name: &str) -> Option<Prop> {
        self.read().props.get(name).cloned()
    }

    /// Plain JSON value of a property; `None` for missing or model-valued ones.
    pub fn get_value(&self, name: &str) -> Option<Value> {
        self.read()
            .props
            .get(name)
            .and_then(Prop::as_value)
            .cloned()
    }

    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get_value(name)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get_value(name).and_then(|v| v.as_i64())
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get_value(name).and_then(|v| v.as_f64())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get_value(name).and_then(|v| v.as_bool())
    }

    /// Overwrites one declared property.
    pub fn set(&self, name: &str, value: impl Into<Prop>) -> ModelResult<()> {
        if !self.0.kind.has_prop(name) {
            return Err(ModelError::UnknownProperty {
                kind: self.0.kind.name().to_string(),
                property: name.to_string(),
            });
        }
        self.write().props.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Property mapping plus the server id (when present), in declaration
    /// order. The local id is not included.
    pub fn shallow_copy(&self) -> Vec<(String, Prop)> {
        let kind = &self.0.kind;
        let state = self.read();
        let mut out = Vec::with_capacity(kind.props().len() + 1);
        if let Some(id) = &state.id {
            out.push((kind.key_id().to_string(), Prop::Value(id.clone())));
        }
        for name in kind.props() {
            if let Some(prop) = state.props.get(name) {
                out.push((name.clone(), prop.clone()));
            }
        }
        out
    }

    /// Full JSON snapshot: server id, local id and every property.
    pub fn to_json(&self) -> Value {
        let kind = &self.0.kind;
        let mut obj = Map::new();
        if let Some(id) = self.id() {
            obj.insert(kind.key_id().to_string(), id);
        }
        obj.insert(
            kind.lid_field().to_string(),
            Value::String(self.0.lid.to_string()),
        );
        for (name, prop) in self.shallow_copy() {
            if name != kind.key_id() {
                obj.insert(name, prop.to_json());
            }
        }
        Value::Object(obj)
    }

    /// Field-by-field overwrite from raw data. Only declared properties that
    /// are present in `data` are touched; the identity is adopted when the
    /// instance has none yet.
    pub(crate) fn merge(&self, data: &Map<String, Value>) {
        let kind = &self.0.kind;
        let mut state = self.write();

        if state.id.is_none() {
            if let Some(id) = data.get(kind.key_id()).filter(|v| server_id(v).is_some()) {
                state.id = Some(id.clone());
            }
        }

        for (name, value) in data {
            if kind.has_prop(name) {
                state.props.insert(name.clone(), Prop::Value(value.clone()));
            } else if name != kind.key_id() && name != kind.lid_field() {
                trace!(kind = kind.name(), field = %name, "ignoring undeclared field");
            }
        }
    }

    pub(crate) fn set_id(&self, id: Value) {
        self.write().id = Some(id);
    }

    fn read(&self) -> RwLockReadGuard<'_, ModelState> {
        self.0.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ModelState> {
        self.0.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("kind", &self.0.kind.name())
            .field("lid", &self.0.lid)
            .field("id", &self.id())
            .finish()
    }
}
