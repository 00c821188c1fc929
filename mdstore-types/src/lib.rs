//! Identity types for mdstore.
//!
//! This crate defines the small set of types every other mdstore crate
//! agrees on:
//! - [`LocalId`]: the locally generated identity of a model instance (UUID v7)
//! - [`IdentityKey`]: the key an instance is cached under (server id or local id)

mod ids;
mod key;

pub use ids::LocalId;
pub use key::{server_id, IdentityKey};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
