//! Core settings cache for Settle.
//! This crate is the single source of truth for settings semantics.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod serialize;
pub mod service;

pub use config::SettingsConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::setting::{validate_setting_key, SettingKey, SettingKeyError, SettingValue};
pub use model::wrappable::{WrapError, Wrappable};
pub use repo::memory_repo::MemorySettingsRepository;
pub use repo::settings_repo::{
    RepoError, RepoResult, SettingsRepository, SqliteSettingsRepository,
};
pub use serialize::deserializer::{DeserializeError, SettingsDeserializer};
pub use serialize::serializer::{SerializeError, SettingsSerializer};
pub use serialize::wrapper::{UnwrapFn, WrapperEnvelope, WrapperRegistry, WrapperRegistryError};
pub use serialize::StorageEncoding;
pub use service::settings_manager::{SettingsError, SettingsManager, SettingsResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
