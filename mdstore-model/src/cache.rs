//! Per-kind identity cache.
//!
//! Maps `(kind name, identity key)` to the canonical [`Model`] for that
//! identity. Entries live until the host evicts or clears them.

use crate::error::{ModelError, ModelResult};
use crate::instance::Model;
use crate::schema::ModelKind;
use mdstore_types::IdentityKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::debug;

type Entries = HashMap<IdentityKey, Model>;

/// Identity cache shared by a [`ModelFactory`](crate::ModelFactory).
///
/// Each kind's entries sit behind their own mutex, so registration and
/// rekeying for one kind never interleave while different kinds proceed
/// independently. Kinds with caching disabled are never stored.
#[derive(Debug, Default)]
pub struct IdentityCache {
    kinds: RwLock<HashMap<String, Arc<Mutex<Entries>>>>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical instance for `key`, if one is cached.
    pub fn lookup(&self, kind: &ModelKind, key: &IdentityKey) -> Option<Model> {
        if !kind.is_cached() {
            return None;
        }
        let entries = self.existing(kind.name())?;
        let entries = lock(&entries);
        entries.get(key).cloned()
    }

    /// Installs `model` as the canonical instance for `key`.
    ///
    /// Returns `false` without storing anything when the kind does not cache.
    pub fn register(&self, kind: &ModelKind, key: IdentityKey, model: Model) -> bool {
        if !kind.is_cached() {
            debug!(kind = kind.name(), "caching disabled, not registering");
            return false;
        }
        let entries = self.entries(kind.name());
        debug!(kind = kind.name(), %key, "registering instance");
        lock(&entries).insert(key, model);
        true
    }

    /// Looks `key` up and, on a miss, registers the instance built by `make`,
    /// all under the kind's lock. Returns the instance and whether it was a
    /// hit. With caching disabled this always builds and never stores.
    pub fn resolve_or_insert<F>(&self, kind: &ModelKind, key: IdentityKey, make: F) -> (Model, bool)
    where
        F: FnOnce() -> Model,
    {
        self.resolve_or_adopt(kind, key, None, make)
    }

    /// Like [`resolve_or_insert`](Self::resolve_or_insert), but on a miss an
    /// instance cached under `draft` that has no server id yet is moved to
    /// `key` and returned as a hit instead of building a new one.
    pub fn resolve_or_adopt<F>(
        &self,
        kind: &ModelKind,
        key: IdentityKey,
        draft: Option<&IdentityKey>,
        make: F,
    ) -> (Model, bool)
    where
        F: FnOnce() -> Model,
    {
        if !kind.is_cached() {
            return (make(), false);
        }
        let entries = self.entries(kind.name());
        let mut entries = lock(&entries);
        if let Some(existing) = entries.get(&key) {
            debug!(kind = kind.name(), %key, "cache hit");
            return (existing.clone(), true);
        }
        let adopted = draft
            .filter(|draft| !draft.is_server())
            .and_then(|draft| entries.get(draft).map(|model| (draft, model.clone())))
            .filter(|(_, model)| model.id().is_none());
        if let Some((draft, model)) = adopted {
            entries.remove(draft);
            debug!(kind = kind.name(), from = %draft, to = %key, "adopted draft instance");
            entries.insert(key, model.clone());
            return (model, true);
        }
        debug!(kind = kind.name(), %key, "cache miss");
        let model = make();
        entries.insert(key, model.clone());
        (model, false)
    }

    /// Moves the entry under `old` to `new`, keeping the same instance.
    ///
    /// Returns `Ok(false)` when nothing is cached under `old`. Fails when a
    /// different instance already owns `new`.
    pub fn rekey(&self, kind: &ModelKind, old: &IdentityKey, new: IdentityKey) -> ModelResult<bool> {
        if !kind.is_cached() {
            return Ok(false);
        }
        let Some(entries) = self.existing(kind.name()) else {
            return Ok(false);
        };
        let mut entries = lock(&entries);
        let Some(model) = entries.get(old).cloned() else {
            return Ok(false);
        };
        if let Some(owner) = entries.get(&new) {
            if !Model::ptr_eq(owner, &model) {
                return Err(ModelError::IdentityConflict {
                    kind: kind.name().to_string(),
                    detail: format!("{new} is already cached for another instance"),
                });
            }
        }
        entries.remove(old);
        debug!(kind = kind.name(), from = %old, to = %new, "rekeyed instance");
        entries.insert(new, model);
        Ok(true)
    }

    /// Drops one entry, returning the instance that was cached.
    pub fn evict(&self, kind: &ModelKind, key: &IdentityKey) -> Option<Model> {
        let entries = self.existing(kind.name())?;
        let removed = lock(&entries).remove(key);
        removed
    }

    /// Drops every entry of one kind.
    pub fn clear_kind(&self, kind: &ModelKind) {
        if let Some(entries) = self.existing(kind.name()) {
            lock(&entries).clear();
        }
    }

    /// Drops every entry of every kind.
    pub fn clear(&self) {
        self.kinds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of cached instances of one kind.
    pub fn len(&self, kind: &ModelKind) -> usize {
        self.existing(kind.name())
            .map(|entries| lock(&entries).len())
            .unwrap_or(0)
    }

    /// Whether nothing at all is cached.
    pub fn is_empty(&self) -> bool {
        let kinds = self.kinds.read().unwrap_or_else(PoisonError::into_inner);
        kinds.values().all(|entries| lock(entries).is_empty())
    }

    fn existing(&self, kind: &str) -> Option<Arc<Mutex<Entries>>> {
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(kind)
            .cloned()
    }

    fn entries(&self, kind: &str) -> Arc<Mutex<Entries>> {
        if let Some(entries) = self.existing(kind) {
            return entries;
        }
        self.kinds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind.to_string())
            .or_default()
            .clone()
    }
}

fn lock(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}
