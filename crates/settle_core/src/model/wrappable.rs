//! Serialization surrogate capability for opaque domain values.
//!
//! # Responsibility
//! - Let domain objects trade themselves for a compact storable payload.
//! - Keep the reconstruction contract explicit instead of reflective.
//!
//! # Invariants
//! - `type_reference` values stay stable across releases; persisted
//!   surrogates are resolved by them on load.
//! - `wrap` output must be enough for the registered unwrap function to
//!   rebuild an equivalent instance.

use serde_json::Value as JsonValue;
use std::any::Any;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Errors raised while wrapping or unwrapping a surrogate payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapError {
    /// Payload shape does not match what the type expects.
    InvalidPayload(String),
    /// The instance cannot produce a surrogate in its current state.
    NotWrappable(String),
}

impl Display for WrapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPayload(message) => write!(f, "invalid surrogate payload: {message}"),
            Self::NotWrappable(message) => write!(f, "value cannot be wrapped: {message}"),
        }
    }
}

impl Error for WrapError {}

/// Capability for values persisted through a compact surrogate.
///
/// Instead of encoding the object graph, only `(type_reference, wrap())`
/// is stored. Reconstruction happens through the unwrap function
/// registered for the same type reference, so a retrieved value is an
/// equivalent instance rebuilt from the payload, never the original.
pub trait Wrappable: Debug {
    /// Stable identifier resolved back to an unwrap function on load.
    fn type_reference(&self) -> &'static str;

    /// Produces the minimal payload persisted in place of this value.
    fn wrap(&self) -> Result<JsonValue, WrapError>;

    /// Upcast hook so callers can downcast retrieved instances.
    fn as_any(&self) -> &dyn Any;
}
