//! Stored-blob to cache value deserializer.
//!
//! # Responsibility
//! - Decode stored text back into cache values.
//! - Resolve surrogate envelopes through the unwrap registry.
//!
//! # Invariants
//! - `None` in yields `None` out; a decoded JSON `null` is normalized
//!   to `None` as well.
//! - Non-strict mode degrades a corrupt row to `None` instead of
//!   failing the whole read path.

use crate::model::setting::SettingValue;
use crate::model::wrappable::WrapError;
use crate::serialize::wrapper::{WrapperEnvelope, WrapperRegistry};
use crate::serialize::StorageEncoding;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::warn;
use serde_json::Value as JsonValue;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DeserializeResult<T> = Result<T, DeserializeError>;

/// Decode or unwrap failure raised by the deserializer in strict mode.
#[derive(Debug)]
pub enum DeserializeError {
    Unescape(base64::DecodeError),
    InvalidText(std::string::FromUtf8Error),
    Decode(serde_json::Error),
    UnknownTypeReference(String),
    Unwrap(WrapError),
}

impl Display for DeserializeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unescape(err) => write!(f, "failed to reverse storage escaping: {err}"),
            Self::InvalidText(err) => write!(f, "unescaped setting is not valid UTF-8: {err}"),
            Self::Decode(err) => write!(f, "failed to decode stored setting: {err}"),
            Self::UnknownTypeReference(reference) => {
                write!(f, "no unwrap function registered for type reference `{reference}`")
            }
            Self::Unwrap(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DeserializeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unescape(err) => Some(err),
            Self::InvalidText(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::UnknownTypeReference(_) => None,
            Self::Unwrap(err) => Some(err),
        }
    }
}

impl From<base64::DecodeError> for DeserializeError {
    fn from(value: base64::DecodeError) -> Self {
        Self::Unescape(value)
    }
}

impl From<std::string::FromUtf8Error> for DeserializeError {
    fn from(value: std::string::FromUtf8Error) -> Self {
        Self::InvalidText(value)
    }
}

impl From<serde_json::Error> for DeserializeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

impl From<WrapError> for DeserializeError {
    fn from(value: WrapError) -> Self {
        Self::Unwrap(value)
    }
}

/// Deserializes stored text back into cache values.
pub struct SettingsDeserializer {
    registry: WrapperRegistry,
    encoding: StorageEncoding,
    strict: bool,
}

impl SettingsDeserializer {
    /// Creates a deserializer resolving surrogates through `registry`.
    ///
    /// With `strict` set, decode/unwrap failures are returned to the
    /// caller; otherwise the affected entry reads as `None`.
    pub fn new(registry: WrapperRegistry, encoding: StorageEncoding, strict: bool) -> Self {
        Self {
            registry,
            encoding,
            strict,
        }
    }

    pub fn registry(&self) -> &WrapperRegistry {
        &self.registry
    }

    pub fn encoding(&self) -> StorageEncoding {
        self.encoding
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Deserializes one stored value.
    pub fn deserialize(&self, stored: Option<&str>) -> DeserializeResult<Option<SettingValue>> {
        let Some(stored) = stored else {
            return Ok(None);
        };

        match self.deserialize_stored(stored) {
            Ok(value) => Ok(value),
            Err(err) if self.strict => Err(err),
            Err(err) => {
                warn!("event=setting_deserialize module=serialize status=degraded error={err}");
                Ok(None)
            }
        }
    }

    fn deserialize_stored(&self, stored: &str) -> DeserializeResult<Option<SettingValue>> {
        let decoded: JsonValue = serde_json::from_str(&self.unescape(stored)?)?;
        if decoded.is_null() {
            return Ok(None);
        }

        if let Some(envelope) = WrapperEnvelope::from_decoded(&decoded) {
            let unwrap = self
                .registry
                .resolve(&envelope.c)
                .ok_or_else(|| DeserializeError::UnknownTypeReference(envelope.c.clone()))?;
            let instance = unwrap(&envelope.c, envelope.d)?;
            return Ok(Some(SettingValue::Wrapped(instance)));
        }

        Ok(Some(SettingValue::Value(decoded)))
    }

    fn unescape(&self, stored: &str) -> DeserializeResult<String> {
        match self.encoding {
            StorageEncoding::Plain => Ok(stored.to_string()),
            StorageEncoding::Base64 => {
                let bytes = BASE64.decode(stored)?;
                Ok(String::from_utf8(bytes)?)
            }
        }
    }
}
