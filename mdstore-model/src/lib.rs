//! Model layer for mdstore.
//!
//! Defines how raw object data becomes identity-tracked model instances:
//! - [`ModelKind`]: a declared schema (properties, identity fields, caching flag, parsers)
//! - [`Model`]: a shared handle to one canonical instance, with [`Prop`] values
//! - [`IdentityCache`]: per-kind map from identity key to canonical instance
//! - [`ModelFactory`]: builds instances, merging repeated data into cached ones
//!
//! Repeated data for a known identity never produces a second instance:
//!
//! ```
//! use mdstore_model::{Model, ModelFactory, ModelKind};
//! use serde_json::json;
//!
//! let factory = ModelFactory::default();
//! let user = factory
//!     .register(ModelKind::builder("User").props(["name"]).cache(true).build().unwrap())
//!     .unwrap();
//!
//! let a = factory.create_model(&user, json!({"id": "u1", "name": "Foo"}));
//! let b = factory.create_model(&user, json!({"id": "u1", "name": "Bar"}));
//! assert!(Model::ptr_eq(&a, &b));
//! assert_eq!(a.get_str("name").as_deref(), Some("Bar"));
//! ```

mod cache;
mod error;
mod factory;
mod instance;
mod parser;
mod schema;

pub use cache::IdentityCache;
pub use error::{ModelError, ModelResult};
pub use factory::{CreateOptions, ModelFactory};
pub use instance::{Model, Prop};
pub use parser::Parser;
pub use schema::{KindSchema, ModelKind, ModelKindBuilder, DEFAULT_KEY_ID, DEFAULT_LID_FIELD};
