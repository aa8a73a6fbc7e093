//! Settings cache manager.
//!
//! # Responsibility
//! - Own the in-memory settings cache and its load/dirty state.
//! - Orchestrate repository fetches with the serialize pipeline.
//!
//! # Invariants
//! - A cached entry (even `None`) is never re-fetched before `refresh`
//!   or `delete_all`.
//! - Locally cached entries always win over repository snapshots.
//! - `dirty` is true iff a `set_*` mutation has not been flushed yet.

use crate::config::SettingsConfig;
use crate::model::setting::{SettingKey, SettingValue};
use crate::repo::settings_repo::{RepoError, SettingsRepository};
use crate::serialize::deserializer::{DeserializeError, SettingsDeserializer};
use crate::serialize::serializer::{SerializeError, SettingsSerializer};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors surfaced by manager operations.
///
/// Repository failures pass through unchanged; the manager adds no
/// retry or backoff of its own.
#[derive(Debug)]
pub enum SettingsError {
    Repo(RepoError),
    Serialize(SerializeError),
    Deserialize(DeserializeError),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "{err}"),
            Self::Deserialize(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Serialize(err) => Some(err),
            Self::Deserialize(err) => Some(err),
        }
    }
}

impl From<RepoError> for SettingsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SerializeError> for SettingsError {
    fn from(value: SerializeError) -> Self {
        Self::Serialize(value)
    }
}

impl From<DeserializeError> for SettingsError {
    fn from(value: DeserializeError) -> Self {
        Self::Deserialize(value)
    }
}

/// Process-local cache in front of one settings repository.
///
/// One instance serves one logical unit of work. It is not internally
/// synchronized; concurrent callers need one manager each, or external
/// serialization.
pub struct SettingsManager<R: SettingsRepository> {
    repository: R,
    serializer: SettingsSerializer,
    deserializer: SettingsDeserializer,
    config: SettingsConfig,
    cache: BTreeMap<SettingKey, Option<SettingValue>>,
    loaded_all: bool,
    dirty: bool,
}

impl<R: SettingsRepository> SettingsManager<R> {
    /// Creates a manager with default configuration (lazy, non-strict).
    pub fn new(
        repository: R,
        serializer: SettingsSerializer,
        deserializer: SettingsDeserializer,
    ) -> Self {
        Self::with_config(repository, serializer, deserializer, SettingsConfig::default())
    }

    pub fn with_config(
        repository: R,
        serializer: SettingsSerializer,
        deserializer: SettingsDeserializer,
        config: SettingsConfig,
    ) -> Self {
        Self {
            repository,
            serializer,
            deserializer,
            config,
            cache: BTreeMap::new(),
            loaded_all: false,
            dirty: false,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn config(&self) -> SettingsConfig {
        self.config
    }

    /// True iff the cache holds at least one unflushed mutation.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// True once a full snapshot load has occurred for this instance.
    pub fn loaded_all(&self) -> bool {
        self.loaded_all
    }

    /// Returns one setting, fetching it lazily on first access.
    ///
    /// A cached `None` means the store was already asked and holds
    /// nothing; it is served locally without another repository read.
    pub fn get_one(&mut self, key: &str) -> SettingsResult<Option<SettingValue>> {
        self.autoload_if_needed()?;

        if let Some(value) = self.cache.get(key) {
            return Ok(value.clone());
        }
        if self.loaded_all {
            return Ok(None);
        }

        let raw = self.repository.get_item(key)?;
        let value = self.deserializer.deserialize(raw.as_deref())?;
        self.cache.insert(key.to_string(), value.clone());
        Ok(value)
    }

    /// Returns the requested keys, batching one fetch for cache misses.
    ///
    /// The result contains exactly the requested keys. Keys absent from
    /// both cache and store come back as `None` and stay cached that
    /// way, so later lookups skip the repository.
    pub fn get_many(
        &mut self,
        keys: &[SettingKey],
    ) -> SettingsResult<BTreeMap<SettingKey, Option<SettingValue>>> {
        self.autoload_if_needed()?;

        let missing: Vec<SettingKey> = keys
            .iter()
            .filter(|key| !self.cache.contains_key(*key))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if !missing.is_empty() && !self.loaded_all {
            let fetched = self.repository.get_items(&missing)?;
            for (key, raw) in fetched {
                let value = self.deserializer.deserialize(raw.as_deref())?;
                self.cache.insert(key, value);
            }
        }

        // Anything still unknown is confirmed absent; remember that.
        for key in keys {
            self.cache.entry(key.clone()).or_insert(None);
        }

        let mut result = BTreeMap::new();
        for key in keys {
            result.insert(key.clone(), self.cache.get(key).cloned().flatten());
        }
        Ok(result)
    }

    /// Defined as `get_one(key)` yielding a non-`None` value.
    pub fn has(&mut self, key: &str) -> SettingsResult<bool> {
        Ok(self.get_one(key)?.is_some())
    }

    /// Returns the full settings view, loading the snapshot once.
    ///
    /// Pending local entries win over the repository snapshot; a key
    /// already cached is never overwritten by a fetched value.
    pub fn all(&mut self) -> SettingsResult<&BTreeMap<SettingKey, Option<SettingValue>>> {
        if !self.loaded_all {
            let snapshot = self.repository.get_all()?;
            let fetched = snapshot.len();
            for (key, raw) in snapshot {
                if self.cache.contains_key(&key) {
                    continue;
                }
                let value = self.deserializer.deserialize(Some(raw.as_str()))?;
                self.cache.insert(key, value);
            }
            self.loaded_all = true;
            debug!(
                "event=settings_load_all module=manager status=ok fetched={fetched} cached={}",
                self.cache.len()
            );
        }

        Ok(&self.cache)
    }

    /// Writes one value into the cache; persistence waits for `save`.
    ///
    /// `None` is the delete marker flushed on the next `save`.
    pub fn set_one(&mut self, key: impl Into<SettingKey>, value: Option<SettingValue>) {
        self.cache.insert(key.into(), value);
        self.dirty = true;
    }

    /// Writes many values into the cache.
    ///
    /// An empty map is a no-op and leaves the dirty flag unchanged.
    pub fn set_many(&mut self, items: BTreeMap<SettingKey, Option<SettingValue>>) {
        if items.is_empty() {
            return;
        }

        for (key, value) in items {
            self.cache.insert(key, value);
        }
        self.dirty = true;
    }

    /// Flushes every cached entry through the serializer.
    ///
    /// Zero entries skip the repository, exactly one uses the
    /// single-item path, more use the batched path. The cache and
    /// `loaded_all` are untouched; `dirty` resets on success.
    pub fn save(&mut self) -> SettingsResult<()> {
        let mut items: BTreeMap<String, Option<String>> = BTreeMap::new();
        for (key, value) in &self.cache {
            items.insert(key.clone(), self.serializer.serialize(value.as_ref())?);
        }

        let count = items.len();
        if count == 1 {
            if let Some((key, value)) = items.into_iter().next() {
                self.repository.set_item(&key, value.as_deref())?;
            }
        } else if count > 1 {
            self.repository.set_items(&items)?;
        }
        self.dirty = false;

        if count > 0 {
            info!(
                "event=settings_save module=manager status=ok items={count} mode={}",
                if count == 1 { "single" } else { "batch" }
            );
        }
        Ok(())
    }

    /// Discards cache and state without touching the repository.
    ///
    /// Any unsaved mutation is lost.
    pub fn refresh(&mut self) {
        self.cache.clear();
        self.loaded_all = false;
        self.dirty = false;
    }

    /// Erases every persisted setting and leaves an empty, fully
    /// loaded cache with nothing pending.
    pub fn delete_all(&mut self) -> SettingsResult<()> {
        self.cache.clear();
        self.loaded_all = true;
        self.dirty = false;
        self.repository.delete_all()?;
        info!("event=settings_delete_all module=manager status=ok");
        Ok(())
    }

    fn autoload_if_needed(&mut self) -> SettingsResult<()> {
        if self.config.autoload && !self.loaded_all {
            self.all()?;
        }
        Ok(())
    }
}
