//! Builds and merges model instances from raw data.

use crate::cache::IdentityCache;
use crate::error::{ModelError, ModelResult};
use crate::instance::Model;
use crate::schema::ModelKind;
use mdstore_types::IdentityKey;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Per-call options for [`ModelFactory::create_models`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Name of a parser registered on the kind, applied to every element
    /// before identity resolution.
    pub parser: Option<String>,
}

impl CreateOptions {
    pub fn with_parser(name: impl Into<String>) -> Self {
        Self {
            parser: Some(name.into()),
        }
    }
}

/// Turns raw data into canonical model instances.
///
/// Owns an explicit [`IdentityCache`]; two factories built over separate
/// caches never share instances.
#[derive(Debug)]
pub struct ModelFactory {
    cache: Arc<IdentityCache>,
    kinds: RwLock<HashMap<String, Arc<ModelKind>>>,
}

impl Default for ModelFactory {
    fn default() -> Self {
        Self::new(Arc::new(IdentityCache::new()))
    }
}

impl ModelFactory {
    pub fn new(cache: Arc<IdentityCache>) -> Self {
        Self {
            cache,
            kinds: RwLock::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Arc<IdentityCache> {
        &self.cache
    }

    /// Registers a kind so it can be resolved by name later.
    pub fn register(&self, kind: ModelKind) -> ModelResult<Arc<ModelKind>> {
        let mut kinds = self.kinds.write().unwrap_or_else(PoisonError::into_inner);
        if kinds.contains_key(kind.name()) {
            return Err(ModelError::DuplicateKind(kind.name().to_string()));
        }
        let kind = Arc::new(kind);
        kinds.insert(kind.name().to_string(), Arc::clone(&kind));
        debug!(kind = kind.name(), cached = kind.is_cached(), "registered model kind");
        Ok(kind)
    }

    /// Looks up a registered kind.
    pub fn kind(&self, name: &str) -> Option<Arc<ModelKind>> {
        self.kinds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Returns the canonical instance for `raw`.
    ///
    /// The identity comes from the kind's id field, falling back to its lid
    /// field. Data carrying both an unknown id and the lid of a cached draft
    /// (an instance without a server id) resolves to that draft, which is
    /// rekeyed to the server id. On a cache hit the existing instance is updated in place with
    /// the fields present in `raw`; otherwise a new instance is built (and
    /// registered when the kind caches). Non-object input is treated as an
    /// empty object.
    pub fn create_model(&self, kind: &Arc<ModelKind>, raw: Value) -> Model {
        let data = match raw {
            Value::Object(map) => map,
            other => {
                warn!(kind = kind.name(), raw = %other, "raw model data is not an object");
                Map::new()
            }
        };

        if !kind.is_cached() {
            return Model::from_raw(kind, &data);
        }

        match resolve_key(kind, &data) {
            Some(key @ IdentityKey::Server(_)) => {
                let draft = data
                    .get(kind.lid_field())
                    .and_then(IdentityKey::from_local_value);
                let (model, hit) = self.cache.resolve_or_adopt(kind, key, draft.as_ref(), || {
                    Model::from_raw(kind, &data)
                });
                if hit {
                    model.merge(&data);
                }
                model
            }
            Some(key @ IdentityKey::Local(_)) => match self.cache.lookup(kind, &key) {
                Some(model) => {
                    debug!(kind = kind.name(), %key, "cache hit by local id");
                    model.merge(&data);
                    model
                }
                None => self.build_and_register(kind, &data),
            },
            None => self.build_and_register(kind, &data),
        }
    }

    /// A fresh draft instance, registered under its local id when the kind
    /// caches.
    pub fn new_model(&self, kind: &Arc<ModelKind>) -> Model {
        self.build_and_register(kind, &Map::new())
    }

    /// Applies [`create_model`](Self::create_model) to every element, keeping
    /// input order. Elements sharing an identity resolve to the same
    /// instance, later fields overwriting earlier ones.
    pub fn create_models<I>(
        &self,
        kind: &Arc<ModelKind>,
        raw: I,
        options: &CreateOptions,
    ) -> ModelResult<Vec<Model>>
    where
        I: IntoIterator<Item = Value>,
    {
        let parser = match &options.parser {
            Some(name) => Some(kind.parser(name).ok_or_else(|| ModelError::UnknownParser {
                kind: kind.name().to_string(),
                parser: name.clone(),
            })?),
            None => None,
        };

        Ok(raw
            .into_iter()
            .map(|element| {
                let element = match parser {
                    Some(parser) => parser.parse(element),
                    None => element,
                };
                self.create_model(kind, element)
            })
            .collect())
    }

    /// Gives an instance its server identity and moves its cache entry from
    /// the local key to the server key.
    ///
    /// Re-assigning the id an instance already has is a no-op.
    pub fn assign_id(&self, model: &Model, id: Value) -> ModelResult<()> {
        let kind = Arc::clone(model.kind());
        let new_key = IdentityKey::from_server_value(&id).ok_or_else(|| {
            ModelError::IdentityConflict {
                kind: kind.name().to_string(),
                detail: format!("{id} is not a valid identity"),
            }
        })?;

        match model.identity_key() {
            IdentityKey::Server(current) => {
                if new_key == IdentityKey::Server(current.clone()) {
                    return Ok(());
                }
                Err(ModelError::IdentityConflict {
                    kind: kind.name().to_string(),
                    detail: format!("instance already has id {current}, refusing {new_key}"),
                })
            }
            local => {
                if !self.cache.rekey(&kind, &local, new_key.clone())? {
                    if let Some(owner) = self.cache.lookup(&kind, &new_key) {
                        if !Model::ptr_eq(&owner, model) {
                            return Err(ModelError::IdentityConflict {
                                kind: kind.name().to_string(),
                                detail: format!("{new_key} is already cached for another instance"),
                            });
                        }
                    } else {
                        self.cache.register(&kind, new_key, model.clone());
                    }
                }
                model.set_id(id);
                Ok(())
            }
        }
    }

    /// Applies server data to an existing instance, typically the response
    /// to a save: a newly returned id is assigned (rekeying the cache entry)
    /// and the fields present overwrite the current ones.
    pub fn update(&self, model: &Model, raw: Value) -> ModelResult<()> {
        let data = match raw {
            Value::Object(map) => map,
            other => {
                warn!(kind = model.kind().name(), raw = %other, "update data is not an object");
                return Ok(());
            }
        };
        if let Some(id) = data.get(model.kind().key_id()) {
            if IdentityKey::from_server_value(id).is_some() {
                self.assign_id(model, id.clone())?;
            }
        }
        model.merge(&data);
        Ok(())
    }

    fn build_and_register(&self, kind: &Arc<ModelKind>, data: &Map<String, Value>) -> Model {
        let model = Model::from_raw(kind, data);
        let key = model.identity_key();
        self.cache.register(kind, key, model.clone());
        model
    }
}

fn resolve_key(kind: &ModelKind, data: &Map<String, Value>) -> Option<IdentityKey> {
    data.get(kind.key_id())
        .and_then(IdentityKey::from_server_value)
        .or_else(|| data.get(kind.lid_field()).and_then(IdentityKey::from_local_value))
}
