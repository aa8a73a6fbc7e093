//! In-memory settings repository for tests and debugging.
//!
//! # Responsibility
//! - Mirror the repository contract without touching disk.
//!
//! # Invariants
//! - State lives only as long as the instance; nothing survives it.
//! - `set_item(None)` removes the key, matching the delete contract.

use crate::model::setting::validate_setting_key;
use crate::repo::settings_repo::{RepoResult, SettingsRepository};
use crate::serialize::StorageEncoding;
use std::collections::BTreeMap;

/// Map-backed settings repository. Not for production use.
#[derive(Debug, Default)]
pub struct MemorySettingsRepository {
    storage: BTreeMap<String, String>,
}

impl MemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl SettingsRepository for MemorySettingsRepository {
    fn set_item(&mut self, key: &str, value: Option<&str>) -> RepoResult<()> {
        validate_setting_key(key)?;

        match value {
            None => {
                self.storage.remove(key);
            }
            Some(value) => {
                self.storage.insert(key.to_string(), value.to_string());
            }
        }

        Ok(())
    }

    fn set_items(&mut self, items: &BTreeMap<String, Option<String>>) -> RepoResult<()> {
        for key in items.keys() {
            validate_setting_key(key)?;
        }

        for (key, value) in items {
            match value {
                None => {
                    self.storage.remove(key);
                }
                Some(value) => {
                    self.storage.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(())
    }

    fn get_item(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.storage.get(key).cloned())
    }

    fn get_items(&self, keys: &[String]) -> RepoResult<BTreeMap<String, Option<String>>> {
        Ok(keys
            .iter()
            .map(|key| (key.clone(), self.storage.get(key).cloned()))
            .collect())
    }

    fn get_all(&self) -> RepoResult<BTreeMap<String, String>> {
        Ok(self.storage.clone())
    }

    fn delete_all(&mut self) -> RepoResult<()> {
        self.storage.clear();
        Ok(())
    }

    fn storage_encoding(&self) -> StorageEncoding {
        StorageEncoding::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::MemorySettingsRepository;
    use crate::repo::settings_repo::{RepoError, SettingsRepository};
    use std::collections::BTreeMap;

    #[test]
    fn set_item_with_none_removes_the_key() {
        let mut repo = MemorySettingsRepository::new();
        repo.set_item("a", Some("\"A\"")).expect("upsert");
        assert_eq!(repo.len(), 1);

        repo.set_item("a", None).expect("delete");
        assert!(repo.is_empty());
        assert_eq!(repo.get_item("a").expect("read"), None);
    }

    #[test]
    fn get_items_returns_exactly_the_requested_keys() {
        let mut repo = MemorySettingsRepository::new();
        repo.set_item("a", Some("\"A\"")).expect("upsert");

        let items = repo
            .get_items(&["a".to_string(), "b".to_string()])
            .expect("read");
        assert_eq!(items.len(), 2);
        assert_eq!(items.get("a"), Some(&Some("\"A\"".to_string())));
        assert_eq!(items.get("b"), Some(&None));
    }

    #[test]
    fn set_items_partitions_upserts_and_deletes() {
        let mut repo = MemorySettingsRepository::new();
        repo.set_item("old", Some("\"x\"")).expect("seed");

        let mut batch = BTreeMap::new();
        batch.insert("old".to_string(), None);
        batch.insert("new".to_string(), Some("\"y\"".to_string()));
        repo.set_items(&batch).expect("batch");

        assert_eq!(repo.get_item("old").expect("read"), None);
        assert_eq!(repo.get_item("new").expect("read"), Some("\"y\"".to_string()));
    }

    #[test]
    fn blank_keys_are_rejected() {
        let mut repo = MemorySettingsRepository::new();
        let err = repo.set_item("  ", Some("\"x\"")).expect_err("blank key");
        assert!(matches!(err, RepoError::Validation(_)));
    }
}
