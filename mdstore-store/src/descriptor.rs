//! Per-request descriptors and the host hooks that shape them.

use crate::codec::{self, Codec, Decoded, Payload};
use crate::error::{StoreError, StoreResult};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// A response as seen by the transport, before extraction.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: String,
}

impl TransportResponse {
    /// A 200 response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Host overrides applied around every request.
///
/// All methods have defaults; implement only what the host needs.
pub trait RequestHooks: Send + Sync {
    /// Called before dispatch to add headers (auth, tracing). The content
    /// type is set after this runs.
    fn configure(&self, headers: &mut HeaderMap, descriptor: &RequestDescriptor) {
        let _ = (headers, descriptor);
    }

    /// Pulls the usable value out of a successful response.
    fn extract(
        &self,
        response: &TransportResponse,
        descriptor: &RequestDescriptor,
    ) -> StoreResult<Value> {
        default_extract(response, descriptor)
    }

    /// Last chance to rewrite the descriptor (e.g. move ids into the url)
    /// before it reaches the transport.
    fn configure_options(&self, descriptor: &mut RequestDescriptor) {
        let _ = descriptor;
    }
}

/// Hooks that keep every default.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl RequestHooks for DefaultHooks {}

/// Decodes the body with the descriptor's codec; empty bodies yield `null`.
pub fn default_extract(
    response: &TransportResponse,
    descriptor: &RequestDescriptor,
) -> StoreResult<Value> {
    if response.body.is_empty() {
        return Ok(Value::Null);
    }
    descriptor.deserialize_checked(&response.body)
}

/// Everything a transport needs to perform one exchange.
#[derive(Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub data: Payload,
    /// Hint that the request is low priority.
    pub background: bool,
    pub(crate) key_id: String,
    pub(crate) strict_decoding: bool,
    pub(crate) codec: Arc<dyn Codec>,
    pub(crate) hooks: Arc<dyn RequestHooks>,
}

impl RequestDescriptor {
    /// Name of the identity field used when dereferencing.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Dereferenced payload, before encoding.
    pub fn wire_data(&self) -> Value {
        self.data.to_wire(&self.key_id)
    }

    /// Dereferenced and encoded payload.
    pub fn serialize(&self) -> String {
        codec::serialize(self.codec.as_ref(), &self.data, &self.key_id)
    }

    /// Lenient decode; never fails.
    pub fn deserialize(&self, text: &str) -> Value {
        self.codec.decode(text)
    }

    /// Decode honouring strict mode: degraded text is an error when strict.
    pub fn deserialize_checked(&self, text: &str) -> StoreResult<Value> {
        match self.codec.decode_checked(text) {
            Decoded::Degraded(raw) if self.strict_decoding => Err(StoreError::Decode(raw)),
            Decoded::Degraded(raw) => {
                warn!(url = %self.url, "response body is not decodable, passing text through");
                Ok(Value::String(raw))
            }
            Decoded::Data(value) => Ok(value),
        }
    }

    /// Runs the host hook, then sets the codec's content type.
    pub fn configure(&self, headers: &mut HeaderMap) {
        self.hooks.configure(headers, self);
        if let Ok(content_type) = HeaderValue::from_str(self.codec.content_type()) {
            headers.insert(CONTENT_TYPE, content_type);
        }
    }

    /// Runs the host's extract hook (default: decode the body).
    pub fn extract(&self, response: &TransportResponse) -> StoreResult<Value> {
        self.hooks.extract(response, self)
    }

    pub(crate) fn apply_hooks(&mut self) {
        let hooks = Arc::clone(&self.hooks);
        hooks.configure_options(self);
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("data", &self.data)
            .field("background", &self.background)
            .field("key_id", &self.key_id)
            .field("strict_decoding", &self.strict_decoding)
            .finish_non_exhaustive()
    }
}
