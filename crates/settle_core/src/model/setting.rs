//! Setting key/value shapes shared by cache, pipeline and repositories.
//!
//! # Responsibility
//! - Define the in-memory value held per setting key.
//! - Provide key validation used by repository write paths.
//!
//! # Invariants
//! - Blank keys never reach storage.
//! - Equality of wrapped values is defined by surrogate payload; two
//!   independently rebuilt instances with the same payload are equal.

use crate::model::wrappable::Wrappable;
use serde_json::Value as JsonValue;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Name a setting is persisted under.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type SettingKey = String;

/// In-memory value held by the settings cache.
///
/// Plain structured values are kept as decoded JSON trees. Domain
/// objects that cannot be encoded directly participate through the
/// [`Wrappable`] surrogate protocol and are held behind a shared handle.
#[derive(Debug, Clone)]
pub enum SettingValue {
    /// Decoded structured value.
    Value(JsonValue),
    /// Domain object persisted via its compact surrogate.
    Wrapped(Arc<dyn Wrappable>),
}

impl SettingValue {
    /// Wraps a domain object handle as a cache value.
    pub fn wrapped(instance: Arc<dyn Wrappable>) -> Self {
        Self::Wrapped(instance)
    }

    /// Returns the plain structured value, if this is one.
    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            Self::Value(value) => Some(value),
            Self::Wrapped(_) => None,
        }
    }

    /// Returns the wrapped domain object handle, if this is one.
    pub fn as_wrapped(&self) -> Option<&Arc<dyn Wrappable>> {
        match self {
            Self::Value(_) => None,
            Self::Wrapped(instance) => Some(instance),
        }
    }
}

impl From<JsonValue> for SettingValue {
    fn from(value: JsonValue) -> Self {
        Self::Value(value)
    }
}

impl PartialEq for SettingValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(left), Self::Value(right)) => left == right,
            (Self::Wrapped(left), Self::Wrapped(right)) => {
                if left.type_reference() != right.type_reference() {
                    return false;
                }
                // A failing wrap() compares unequal rather than panicking.
                match (left.wrap(), right.wrap()) {
                    (Ok(left), Ok(right)) => left == right,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

/// Validation error for setting keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingKeyError {
    Blank,
}

impl Display for SettingKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank => write!(f, "setting key must not be blank"),
        }
    }
}

impl Error for SettingKeyError {}

/// Rejects keys that are empty or whitespace-only.
pub fn validate_setting_key(key: &str) -> Result<(), SettingKeyError> {
    if key.trim().is_empty() {
        return Err(SettingKeyError::Blank);
    }
    Ok(())
}
