//! Request orchestration and serialization boundary for mdstore.
//!
//! # Architecture
//!
//! A pull flows through these pieces:
//!
//! 1. **Store** builds a [`RequestDescriptor`] (method, url, payload, codec, hooks)
//! 2. **Transport** performs the exchange and extracts the response value
//! 3. **Path extraction** digs the entity list out of an envelope, if asked
//! 4. **ModelFactory** turns every element into a canonical [`Model`]
//!
//! Outgoing payloads pass through the [`codec`] module first: nested models
//! and objects are dereferenced to their identity, then encoded.
//!
//! # Example
//!
//! ```
//! use mdstore_model::ModelKind;
//! use mdstore_store::transport::mock::MockTransport;
//! use mdstore_store::{Method, PullOptions, Query, Store};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let transport = Arc::new(MockTransport::new());
//! transport.respond_json(Method::GET, "/user", json!([{"id": "u1", "name": "Foo"}]));
//!
//! let store = Store::builder_shared(transport).build().unwrap();
//! let user = store
//!     .factory()
//!     .register(ModelKind::builder("User").props(["name"]).cache(true).build().unwrap())
//!     .unwrap();
//!
//! let users = store.pull(&user, "/user", Query::All, &PullOptions::default()).await.unwrap();
//! assert_eq!(users[0].get_str("name").as_deref(), Some("Foo"));
//! # });
//! ```
//!
//! [`Model`]: mdstore_model::Model

pub mod codec;
mod config;
mod descriptor;
mod error;
mod http;
pub mod path;
pub mod query;
mod store;
pub mod transport;

pub use codec::{Codec, Decoded, JsonCodec, Payload};
pub use config::StoreSettings;
pub use descriptor::{default_extract, DefaultHooks, RequestDescriptor, RequestHooks, TransportResponse};
pub use error::{StoreError, StoreResult};
pub use http::HttpTransport;
pub use query::Query;
pub use reqwest::header::HeaderMap;
pub use reqwest::Method;
pub use store::{PullOptions, Pulled, RequestOverrides, Store, StoreBuilder};
pub use transport::Transport;
