//! Cache identity keys.

use crate::LocalId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The value an instance is deduplicated by inside one model kind.
///
/// A server id always wins over the local id once it is known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IdentityKey {
    /// Identity assigned by the server.
    Server(String),
    /// Identity generated locally before the first save.
    Local(LocalId),
}

impl IdentityKey {
    /// Builds a server key from a raw JSON identity value.
    ///
    /// Strings are used verbatim and numbers are rendered canonically, so
    /// `123` and `"123"` name the same entity. Anything else (null, empty
    /// string, bool, array, object) is not an identity.
    pub fn from_server_value(value: &Value) -> Option<Self> {
        server_id(value).map(Self::Server)
    }

    /// Builds a local key from a raw JSON `lid` value, if it parses.
    pub fn from_local_value(value: &Value) -> Option<Self> {
        value
            .as_str()
            .and_then(|s| LocalId::parse(s).ok())
            .map(Self::Local)
    }

    /// Returns true for server-assigned keys.
    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server(_))
    }
}

impl From<LocalId> for IdentityKey {
    fn from(lid: LocalId) -> Self {
        Self::Local(lid)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server(id) => write!(f, "id:{id}"),
            Self::Local(lid) => write!(f, "lid:{lid}"),
        }
    }
}

/// Normalises a raw JSON identity into its canonical string form.
pub fn server_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
