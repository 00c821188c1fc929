use serde_json::Value;

/// Reshapes one raw element before identity resolution.
///
/// Parsers are registered by name on a [`ModelKind`](crate::ModelKind) and
/// selected per call through [`CreateOptions::parser`](crate::CreateOptions).
/// Typical use is flattening a wrapper envelope:
///
/// ```
/// use mdstore_model::Parser;
/// use serde_json::{json, Value};
///
/// let unwrap = |raw: Value| raw["wrap"].clone();
/// assert_eq!(unwrap.parse(json!({"wrap": {"title": "Foo"}})), json!({"title": "Foo"}));
/// ```
pub trait Parser: Send + Sync {
    /// Returns the reshaped element.
    fn parse(&self, raw: Value) -> Value;
}

impl<F> Parser for F
where
    F: Fn(Value) -> Value + Send + Sync,
{
    fn parse(&self, raw: Value) -> Value {
        self(raw)
    }
}
