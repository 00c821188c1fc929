//! Request orchestration.
//!
//! [`Store`] builds a [`RequestDescriptor`] per call, hands it to the
//! configured [`Transport`], and for pulls routes the extracted response
//! through path extraction and the [`ModelFactory`].

use crate::codec::{Codec, JsonCodec, Payload};
use crate::config::StoreSettings;
use crate::descriptor::{DefaultHooks, RequestDescriptor, RequestHooks};
use crate::error::{StoreError, StoreResult};
use crate::path::extract_path;
use crate::query::Query;
use crate::transport::Transport;
use mdstore_model::{CreateOptions, Model, ModelFactory, ModelKind};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Options for [`Store::pull`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullOptions {
    /// Dotted path to the entity list inside an enveloped response.
    pub path: Option<String>,
    /// Parser registered on the kind, applied to every element.
    pub parser: Option<String>,
}

impl PullOptions {
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_parser(mut self, parser: impl Into<String>) -> Self {
        self.parser = Some(parser.into());
        self
    }
}

/// Per-call replacements for descriptor defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub method: Option<Method>,
    pub url: Option<String>,
    pub data: Option<Payload>,
    pub background: Option<bool>,
}

/// A pull's raw response alongside the models built from it.
#[derive(Debug, Clone)]
pub struct Pulled {
    pub response: Value,
    pub models: Vec<Model>,
}

struct StoreInner {
    transport: Arc<dyn Transport>,
    factory: Arc<ModelFactory>,
    codec: Arc<dyn Codec>,
    hooks: Arc<dyn RequestHooks>,
    settings: StoreSettings,
}

/// Entry point for network-backed model access. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

/// Builder returned by [`Store::builder`].
pub struct StoreBuilder {
    transport: Arc<dyn Transport>,
    factory: Option<Arc<ModelFactory>>,
    codec: Arc<dyn Codec>,
    hooks: Arc<dyn RequestHooks>,
    settings: StoreSettings,
}

impl StoreBuilder {
    /// Shares an existing factory (and its identity cache).
    pub fn factory(mut self, factory: Arc<ModelFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Replaces the JSON codec.
    pub fn codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    pub fn hooks(mut self, hooks: impl RequestHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> StoreResult<Store> {
        self.settings.validate()?;
        Ok(Store {
            inner: Arc::new(StoreInner {
                transport: self.transport,
                factory: self.factory.unwrap_or_default(),
                codec: self.codec,
                hooks: self.hooks,
                settings: self.settings,
            }),
        })
    }
}

impl Store {
    pub fn builder(transport: impl Transport + 'static) -> StoreBuilder {
        Self::builder_shared(Arc::new(transport))
    }

    /// Like [`builder`](Self::builder) for a transport the caller keeps a
    /// handle to.
    pub fn builder_shared(transport: Arc<dyn Transport>) -> StoreBuilder {
        StoreBuilder {
            transport,
            factory: None,
            codec: Arc::new(JsonCodec),
            hooks: Arc::new(DefaultHooks),
            settings: StoreSettings::default(),
        }
    }

    pub fn factory(&self) -> &Arc<ModelFactory> {
        &self.inner.factory
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.inner.settings
    }

    /// Builds the descriptor a request would dispatch, before overrides.
    pub fn descriptor(&self, url: &str, method: Method, data: Payload) -> RequestDescriptor {
        let settings = &self.inner.settings;
        RequestDescriptor {
            method,
            url: url.to_string(),
            data,
            background: settings.background,
            key_id: settings.key_id.clone(),
            strict_decoding: settings.strict_decoding,
            codec: Arc::clone(&self.inner.codec),
            hooks: Arc::clone(&self.inner.hooks),
        }
    }

    /// Issues one request and returns the extracted response value.
    pub async fn request(
        &self,
        url: &str,
        method: Method,
        data: impl Into<Payload>,
        overrides: Option<RequestOverrides>,
    ) -> StoreResult<Value> {
        let mut descriptor = self.descriptor(url, method, data.into());
        if let Some(overrides) = overrides {
            if let Some(method) = overrides.method {
                descriptor.method = method;
            }
            if let Some(url) = overrides.url {
                descriptor.url = url;
            }
            if let Some(data) = overrides.data {
                descriptor.data = data;
            }
            if let Some(background) = overrides.background {
                descriptor.background = background;
            }
        }
        descriptor.apply_hooks();

        debug!(method = %descriptor.method, url = %descriptor.url, "dispatching request");
        self.inner.transport.dispatch(descriptor).await
    }

    pub async fn get(
        &self,
        url: &str,
        data: impl Into<Payload>,
        overrides: Option<RequestOverrides>,
    ) -> StoreResult<Value> {
        self.request(url, Method::GET, data, overrides).await
    }

    pub async fn post(
        &self,
        url: &str,
        data: impl Into<Payload>,
        overrides: Option<RequestOverrides>,
    ) -> StoreResult<Value> {
        self.request(url, Method::POST, data, overrides).await
    }

    pub async fn put(
        &self,
        url: &str,
        data: impl Into<Payload>,
        overrides: Option<RequestOverrides>,
    ) -> StoreResult<Value> {
        self.request(url, Method::PUT, data, overrides).await
    }

    pub async fn destroy(
        &self,
        url: &str,
        data: impl Into<Payload>,
        overrides: Option<RequestOverrides>,
    ) -> StoreResult<Value> {
        self.request(url, Method::DELETE, data, overrides).await
    }

    /// Fetches raw entities and turns them into canonical models.
    pub async fn pull(
        &self,
        kind: &Arc<ModelKind>,
        url: &str,
        query: Query,
        options: &PullOptions,
    ) -> StoreResult<Vec<Model>> {
        Ok(self.pull_raw(kind, url, query, options).await?.models)
    }

    /// Like [`pull`](Self::pull), also returning the raw response.
    pub async fn pull_raw(
        &self,
        kind: &Arc<ModelKind>,
        url: &str,
        query: Query,
        options: &PullOptions,
    ) -> StoreResult<Pulled> {
        let response = self.get(url, query, None).await?;

        let list = match &options.path {
            Some(path) => match extract_path(&response, path) {
                Some(found) => found.clone(),
                None => {
                    warn!(kind = kind.name(), %url, %path, "path not found in response");
                    Value::Null
                }
            },
            None => response.clone(),
        };
        let list = self.decode_embedded(url, list)?;

        let create = CreateOptions {
            parser: options.parser.clone(),
        };
        let models = self
            .inner
            .factory
            .create_models(kind, into_elements(kind, list), &create)?;
        debug!(kind = kind.name(), %url, count = models.len(), "pulled models");
        Ok(Pulled { response, models })
    }

    /// Completion-style pull: `callback(error, response, models)`.
    pub async fn pull_with<F>(
        &self,
        kind: &Arc<ModelKind>,
        url: &str,
        query: Query,
        options: &PullOptions,
        callback: F,
    ) where
        F: FnOnce(Option<StoreError>, Option<Value>, Vec<Model>),
    {
        match self.pull_raw(kind, url, query, options).await {
            Ok(Pulled { response, models }) => callback(None, Some(response), models),
            Err(e) => callback(Some(e), None, Vec::new()),
        }
    }

    /// Runs a pull on the tokio runtime. The cache is populated even if the
    /// returned handle is dropped.
    pub fn spawn_pull(
        &self,
        kind: Arc<ModelKind>,
        url: impl Into<String>,
        query: Query,
        options: PullOptions,
    ) -> JoinHandle<StoreResult<Vec<Model>>> {
        let store = self.clone();
        let url = url.into();
        tokio::spawn(async move { store.pull(&kind, &url, query, &options).await })
    }

    /// Persists a model: `POST` before it has an id, `PUT` after. The
    /// response is merged into the instance and a newly returned id rekeys
    /// its cache entry.
    pub async fn save(&self, model: &Model, url: &str) -> StoreResult<()> {
        let method = if model.id_str().is_some() {
            Method::PUT
        } else {
            Method::POST
        };
        let response = self.request(url, method, model, None).await?;
        if !response.is_null() {
            self.inner.factory.update(model, response)?;
        }
        Ok(())
    }

    /// Entity lists nested as encoded text are decoded once more. Only text
    /// that opens an array or object is treated as encoded; any other string
    /// is returned as-is.
    fn decode_embedded(&self, url: &str, list: Value) -> StoreResult<Value> {
        match list {
            Value::String(text) if looks_encoded(&text) => {
                let descriptor = self.descriptor(url, Method::GET, Payload::default());
                descriptor.deserialize_checked(&text)
            }
            other => Ok(other),
        }
    }
}

fn looks_encoded(text: &str) -> bool {
    matches!(text.trim_start().as_bytes().first(), Some(b'[' | b'{'))
}

/// Normalises an extracted value into the list of raw entities.
fn into_elements(kind: &ModelKind, value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(_) => vec![value],
        Value::Null => Vec::new(),
        other => {
            warn!(kind = kind.name(), value = %other, "response is not an entity list");
            Vec::new()
        }
    }
}
