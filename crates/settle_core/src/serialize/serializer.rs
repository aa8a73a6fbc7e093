//! Cache value to stored-blob serializer.
//!
//! # Responsibility
//! - Turn cache values into opaque stored text.
//! - Apply the surrogate envelope before structural encoding.
//!
//! # Invariants
//! - `None` passes through untouched as the delete marker.
//! - Non-strict mode never propagates a wrap/encode failure; the entry
//!   degrades to `None` instead.

use crate::model::setting::SettingValue;
use crate::model::wrappable::WrapError;
use crate::serialize::wrapper::WrapperEnvelope;
use crate::serialize::StorageEncoding;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SerializeResult<T> = Result<T, SerializeError>;

/// Wrap or encode failure raised by the serializer in strict mode.
#[derive(Debug)]
pub enum SerializeError {
    Wrap(WrapError),
    Encode(serde_json::Error),
}

impl Display for SerializeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wrap(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode setting value: {err}"),
        }
    }
}

impl Error for SerializeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Wrap(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<WrapError> for SerializeError {
    fn from(value: WrapError) -> Self {
        Self::Wrap(value)
    }
}

impl From<serde_json::Error> for SerializeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Serializes cache values into storable text.
#[derive(Debug, Clone, Copy)]
pub struct SettingsSerializer {
    encoding: StorageEncoding,
    strict: bool,
}

impl SettingsSerializer {
    /// Creates a serializer for the given backend escape transform.
    ///
    /// With `strict` set, wrap/encode failures are returned to the
    /// caller; otherwise the failing entry is dropped from persistence.
    pub fn new(encoding: StorageEncoding, strict: bool) -> Self {
        Self { encoding, strict }
    }

    pub fn encoding(&self) -> StorageEncoding {
        self.encoding
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Serializes one cache value.
    ///
    /// `None` stays `None` so delete markers survive the save pipeline.
    pub fn serialize(&self, value: Option<&SettingValue>) -> SerializeResult<Option<String>> {
        let Some(value) = value else {
            return Ok(None);
        };

        match self.serialize_value(value) {
            Ok(stored) => Ok(Some(stored)),
            Err(err) if self.strict => Err(err),
            Err(err) => {
                warn!("event=setting_serialize module=serialize status=degraded error={err}");
                Ok(None)
            }
        }
    }

    fn serialize_value(&self, value: &SettingValue) -> SerializeResult<String> {
        let tree = match value {
            SettingValue::Value(inner) => inner.clone(),
            SettingValue::Wrapped(instance) => {
                serde_json::to_value(WrapperEnvelope::capture(instance.as_ref())?)?
            }
        };
        let encoded = serde_json::to_string(&tree)?;
        Ok(self.escape(encoded))
    }

    fn escape(&self, encoded: String) -> String {
        match self.encoding {
            StorageEncoding::Plain => encoded,
            StorageEncoding::Base64 => BASE64.encode(encoded),
        }
    }
}
