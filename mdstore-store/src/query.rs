//! Query data for pulls.

use crate::codec::Payload;
use serde_json::{Map, Value};

/// What a pull asks the server for.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Query {
    /// Everything the endpoint returns.
    #[default]
    All,
    /// Specific identities; encoded positionally (`0=a&1=b`).
    Ids(Vec<Value>),
    /// Named filter parameters (`name=Test&age=111`).
    Filter(Map<String, Value>),
}

impl Query {
    pub fn ids<I, V>(ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Query::Ids(ids.into_iter().map(Into::into).collect())
    }

    /// Builds a filter from a JSON object. Non-objects mean "fetch all".
    pub fn filter(value: Value) -> Self {
        match value {
            Value::Object(map) => Query::Filter(map),
            _ => Query::All,
        }
    }
}

impl From<Query> for Payload {
    fn from(query: Query) -> Self {
        match query {
            Query::All => Payload::default(),
            Query::Ids(ids) => Payload::Json(Value::Array(ids)),
            Query::Filter(map) => Payload::Json(Value::Object(map)),
        }
    }
}

/// Flattens wire data into query-string pairs: array index → value,
/// object key → value. Strings are used as-is, `null` becomes empty and
/// everything else is rendered as JSON. Scalars produce no pairs.
pub fn query_params(data: &Value) -> Vec<(String, String)> {
    match data {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), param_text(v)))
            .collect(),
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), param_text(v))).collect(),
        _ => Vec::new(),
    }
}

fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
