//! Store settings.

use crate::error::{StoreError, StoreResult};
use mdstore_model::DEFAULT_KEY_ID;
use serde::{Deserialize, Serialize};

/// Plain settings for a [`Store`](crate::Store).
///
/// Strategies (codec, hooks, transport) are injected through
/// [`StoreBuilder`](crate::StoreBuilder); only data lives here so it can be
/// loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Identity field used when dereferencing outgoing payloads.
    pub key_id: String,
    /// Marks every request as low priority.
    pub background: bool,
    /// Fail requests whose body cannot be decoded instead of passing the
    /// text through.
    pub strict_decoding: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            key_id: DEFAULT_KEY_ID.to_string(),
            background: false,
            strict_decoding: false,
        }
    }
}

impl StoreSettings {
    /// Parses settings from JSON; absent fields keep their defaults.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.key_id.trim().is_empty() {
            return Err(StoreError::Config("key_id must not be empty".into()));
        }
        Ok(())
    }
}
