//! Surrogate envelope codec and unwrap registry.
//!
//! # Responsibility
//! - Encode wrapped values as a compact `{type, payload}` envelope.
//! - Resolve persisted type references to registered unwrap functions.
//!
//! # Invariants
//! - Only the envelope is persisted for a wrapped value, never the
//!   instance itself.
//! - Envelope field names stay one character long to keep rows small.
//! - Type references are validated once, at registration.

use crate::model::wrappable::{WrapError, Wrappable};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Persisted surrogate form of a wrapped value.
///
/// `c` carries the type reference, `d` the wrapped payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrapperEnvelope {
    pub c: String,
    pub d: JsonValue,
}

impl WrapperEnvelope {
    /// Captures the surrogate for one wrappable instance.
    pub fn capture(instance: &dyn Wrappable) -> Result<Self, WrapError> {
        Ok(Self {
            c: instance.type_reference().to_string(),
            d: instance.wrap()?,
        })
    }

    /// Returns the envelope when the decoded tree has exactly the
    /// envelope shape: an object with the two fields `c` (string) and `d`.
    pub fn from_decoded(value: &JsonValue) -> Option<Self> {
        let object = value.as_object()?;
        if object.len() != 2 {
            return None;
        }
        let type_reference = object.get("c")?.as_str()?;
        let payload = object.get("d")?;
        Some(Self {
            c: type_reference.to_string(),
            d: payload.clone(),
        })
    }
}

/// Unwrap function registered for one type reference.
///
/// Receives the persisted type reference and payload, returns the
/// rebuilt instance.
pub type UnwrapFn = fn(&str, JsonValue) -> Result<Arc<dyn Wrappable>, WrapError>;

/// Registration errors for the unwrap registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WrapperRegistryError {
    InvalidTypeReference(String),
    DuplicateTypeReference(String),
}

impl Display for WrapperRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTypeReference(value) => {
                write!(f, "type reference is invalid: {value}")
            }
            Self::DuplicateTypeReference(value) => {
                write!(f, "type reference already registered: {value}")
            }
        }
    }
}

impl Error for WrapperRegistryError {}

/// Maps persisted type references to unwrap functions.
#[derive(Debug, Default)]
pub struct WrapperRegistry {
    unwrappers: BTreeMap<String, UnwrapFn>,
}

impl WrapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one unwrap function under a stable type reference.
    pub fn register(
        &mut self,
        type_reference: &str,
        unwrap: UnwrapFn,
    ) -> Result<(), WrapperRegistryError> {
        let normalized = type_reference.trim().to_string();
        if !is_valid_type_reference(&normalized) {
            return Err(WrapperRegistryError::InvalidTypeReference(normalized));
        }
        if self.unwrappers.contains_key(normalized.as_str()) {
            return Err(WrapperRegistryError::DuplicateTypeReference(normalized));
        }

        self.unwrappers.insert(normalized, unwrap);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.unwrappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unwrappers.is_empty()
    }

    /// Returns sorted registered type references.
    pub fn type_references(&self) -> Vec<String> {
        self.unwrappers.keys().cloned().collect()
    }

    /// Returns the unwrap function for one type reference.
    pub fn resolve(&self, type_reference: &str) -> Option<UnwrapFn> {
        self.unwrappers.get(type_reference.trim()).copied()
    }
}

fn is_valid_type_reference(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    value.chars().all(|c| {
        c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' || c == '.'
    })
}
