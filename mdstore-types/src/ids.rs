//! Local identities.
//!
//! Every model instance gets a [`LocalId`] the moment it is constructed, long
//! before the server hands out a real id. Local ids are what the identity
//! cache keys unsaved instances by, and what a host echoes back in the `lid`
//! field so a later response can be matched to the draft it came from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Client-side identity of one model instance.
///
/// Never reused and never sent as the server id. Generated as UUID v7, so
/// ids of instances built later sort after earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalId(Uuid);

impl LocalId {
    /// A fresh id for a newly constructed instance.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Reads a `lid` echoed back in raw data.
    pub fn parse(s: &str) -> crate::Result<Self> {
        Uuid::parse_str(s).map(Self).map_err(Into::into)
    }

    /// Milliseconds since the Unix epoch at which the id was generated, for
    /// ids carrying a timestamp.
    pub fn created_at_ms(&self) -> Option<u64> {
        let (secs, nanos) = self.0.get_timestamp()?.to_unix();
        Some(secs * 1000 + u64::from(nanos) / 1_000_000)
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for LocalId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<LocalId> for Uuid {
    fn from(lid: LocalId) -> Self {
        lid.0
    }
}

impl FromStr for LocalId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}
