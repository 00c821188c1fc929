//! Serialization boundary.
//!
//! Outgoing payloads are dereferenced (nested objects replaced by their
//! identity) and then encoded by a [`Codec`]. Incoming text is decoded by the
//! same codec; the default [`JsonCodec`] never fails, handing undecodable
//! text back unchanged.

use mdstore_model::{Model, Prop};
use serde_json::{Map, Value};

/// Data attached to a request, captured when the request is built.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Plain JSON: a filter object, a list of ids, a body.
    Json(Value),
    /// Shallow copy of a model's properties (server id included).
    Fields(Vec<(String, Prop)>),
}

impl Payload {
    /// The dereferenced wire form of this payload.
    pub fn to_wire(&self, key_id: &str) -> Value {
        match self {
            Payload::Json(Value::Object(map)) => {
                let mut copy = map.clone();
                dereference(&mut copy, key_id);
                Value::Object(copy)
            }
            Payload::Json(Value::Array(items)) => {
                let mut copy = items.clone();
                copy.iter_mut().for_each(|item| dereference_value(item, key_id));
                Value::Array(copy)
            }
            Payload::Json(other) => other.clone(),
            Payload::Fields(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, prop)| (name.clone(), dereference_prop(prop, key_id)))
                    .collect(),
            ),
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Json(Value::Object(Map::new()))
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

impl From<&Model> for Payload {
    fn from(model: &Model) -> Self {
        Payload::Fields(model.shallow_copy())
    }
}

impl From<Model> for Payload {
    fn from(model: Model) -> Self {
        Payload::from(&model)
    }
}

/// Replaces every object-valued entry of `data` with the object's identity
/// (its `key_id` field) when it has a truthy one. Arrays and scalars are
/// left alone, as are objects without an identity. A top-level array payload
/// gets the same treatment per element.
pub fn dereference(data: &mut Map<String, Value>, key_id: &str) {
    data.values_mut()
        .for_each(|value| dereference_value(value, key_id));
}

fn dereference_value(value: &mut Value, key_id: &str) {
    let identity = match value {
        Value::Object(obj) => obj.get(key_id).filter(|id| truthy(id)).cloned(),
        _ => None,
    };
    if let Some(identity) = identity {
        *value = identity;
    }
}

fn dereference_prop(prop: &Prop, key_id: &str) -> Value {
    match prop {
        Prop::Value(Value::Object(obj)) => match obj.get(key_id).filter(|id| truthy(id)) {
            Some(identity) => identity.clone(),
            None => Value::Object(obj.clone()),
        },
        Prop::Value(other) => other.clone(),
        Prop::Model(model) => dereference_model(model),
        Prop::Models(models) => Value::Array(models.iter().map(dereference_model).collect()),
    }
}

fn dereference_model(model: &Model) -> Value {
    match model.id() {
        Some(id) if truthy(&id) => id,
        _ => model.to_json(),
    }
}

/// JSON truthiness: `null`, `false`, `0`, and `""` are falsy.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Outcome of decoding a response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The body decoded to structured data.
    Data(Value),
    /// The body could not be decoded; this is the original text.
    Degraded(String),
}

impl Decoded {
    /// Lenient view: degraded text becomes a JSON string.
    pub fn into_value(self) -> Value {
        match self {
            Decoded::Data(v) => v,
            Decoded::Degraded(text) => Value::String(text),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Decoded::Degraded(_))
    }
}

/// Encodes dereferenced payloads and decodes response bodies.
///
/// A custom codec replaces the default encoding and decoding entirely;
/// dereferencing always runs before [`encode`](Codec::encode) is called.
pub trait Codec: Send + Sync {
    /// Encodes an already dereferenced payload.
    fn encode(&self, payload: &Value) -> String;

    /// Decodes a body, reporting whether decoding degraded.
    fn decode_checked(&self, text: &str) -> Decoded;

    /// Decodes a body; never fails.
    fn decode(&self, text: &str) -> Value {
        self.decode_checked(text).into_value()
    }

    /// Content type sent with encoded bodies.
    fn content_type(&self) -> &str {
        "application/json"
    }
}

/// Canonical JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, payload: &Value) -> String {
        payload.to_string()
    }

    fn decode_checked(&self, text: &str) -> Decoded {
        match serde_json::from_str(text) {
            Ok(value) => Decoded::Data(value),
            Err(_) => Decoded::Degraded(text.to_string()),
        }
    }
}

/// Dereferences `payload` and encodes it with `codec`.
pub fn serialize(codec: &dyn Codec, payload: &Payload, key_id: &str) -> String {
    codec.encode(&payload.to_wire(key_id))
}
