//! Error types for model kinds and the model factory.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while declaring kinds or building model instances.
///
/// Malformed payloads are not errors: the factory degrades them and logs a
/// warning instead. These variants cover programming mistakes only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// The kind declaration is inconsistent.
    #[error("invalid model kind: {0}")]
    InvalidKind(String),

    /// A kind with this name is already registered.
    #[error("model kind already registered: {0}")]
    DuplicateKind(String),

    /// `create_models` was asked for a parser the kind does not declare.
    #[error("model kind {kind} has no parser named {parser}")]
    UnknownParser { kind: String, parser: String },

    /// A property outside the kind's declared list was written.
    #[error("model kind {kind} has no property {property}")]
    UnknownProperty { kind: String, property: String },

    /// Two instances would end up under the same identity.
    #[error("identity conflict in {kind}: {detail}")]
    IdentityConflict { kind: String, detail: String },
}
