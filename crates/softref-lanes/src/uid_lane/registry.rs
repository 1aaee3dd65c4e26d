// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A uid registry backed by a packed bincode index.
//!
//! The registry keeps both directions of the uid/path association in memory
//! so that soft references can be addressed by either half. It can be built
//! incrementally or loaded from an index produced by
//! [`UidRegistry::to_index_bytes`].

use ahash::AHashMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use softref_core::asset::{ResourceResolver, ResourceUid};

/// One persisted uid/path association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UidEntry {
    /// The stable uid.
    pub uid: ResourceUid,
    /// The path the uid currently points at.
    pub path: String,
}

/// The runtime uid/path table.
#[derive(Debug, Default)]
pub struct UidRegistry {
    by_uid: AHashMap<ResourceUid, String>,
    by_path: AHashMap<String, ResourceUid>,
}

impl UidRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a registry from the raw bytes of a packed index.
    ///
    /// # Errors
    /// Fails if the bytes are not a bincode-encoded list of [`UidEntry`].
    pub fn from_index_bytes(index_bytes: &[u8]) -> Result<Self> {
        let config = bincode::config::standard();
        let (entries, _): (Vec<UidEntry>, _) =
            bincode::serde::decode_from_slice(index_bytes, config)
                .context("Failed to decode uid index")?;

        let mut registry = Self::new();
        for entry in entries {
            registry.insert(entry.uid, entry.path);
        }
        log::debug!("UidRegistry loaded {} entries.", registry.len());
        Ok(registry)
    }

    /// Encodes the registry as a packed index, sorted by path.
    pub fn to_index_bytes(&self) -> Result<Vec<u8>> {
        let mut entries: Vec<UidEntry> = self
            .by_uid
            .iter()
            .map(|(uid, path)| UidEntry {
                uid: *uid,
                path: path.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        bincode::serde::encode_to_vec(&entries, bincode::config::standard())
            .context("Failed to encode uid index")
    }

    /// Registers `path` under the uid derived from it and returns that uid.
    pub fn register(&mut self, path: &str) -> ResourceUid {
        let uid = ResourceUid::from_path(path);
        self.insert(uid, path.to_string());
        uid
    }

    /// Associates `uid` with `path`, replacing any previous association of
    /// either half.
    pub fn insert(&mut self, uid: ResourceUid, path: String) {
        if let Some(old_path) = self.by_uid.insert(uid, path.clone()) {
            self.by_path.remove(&old_path);
        }
        if let Some(old_uid) = self.by_path.insert(path, uid) {
            if old_uid != uid {
                self.by_uid.remove(&old_uid);
            }
        }
    }

    /// Removes the association of `path`, returning its uid.
    pub fn remove_path(&mut self, path: &str) -> Option<ResourceUid> {
        let uid = self.by_path.remove(path)?;
        self.by_uid.remove(&uid);
        Some(uid)
    }

    /// Returns the number of associations.
    pub fn len(&self) -> usize {
        self.by_uid.len()
    }

    /// Returns `true` if the registry holds no associations.
    pub fn is_empty(&self) -> bool {
        self.by_uid.is_empty()
    }
}

impl ResourceResolver for UidRegistry {
    fn path_for(&self, uid: &str) -> Option<String> {
        let uid: ResourceUid = uid.parse().ok()?;
        self.by_uid.get(&uid).cloned()
    }

    fn uid_for(&self, path: &str) -> Option<String> {
        self.by_path.get(path).map(ResourceUid::to_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_both_directions() {
        let mut registry = UidRegistry::new();
        let uid = registry.register("res://a.txt");

        assert_eq!(registry.path_for(&uid.to_text()).as_deref(), Some("res://a.txt"));
        assert_eq!(registry.uid_for("res://a.txt"), Some(uid.to_text()));
        assert_eq!(registry.path_for("uid://X"), None);
        assert_eq!(registry.uid_for("res://b.txt"), None);
    }

    #[test]
    fn moving_a_uid_drops_the_old_path() {
        let mut registry = UidRegistry::new();
        let uid = ResourceUid::new();
        registry.insert(uid, "res://old.txt".to_string());
        registry.insert(uid, "res://new.txt".to_string());

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.uid_for("res://old.txt"), None);
        assert_eq!(registry.path_for(&uid.to_text()).as_deref(), Some("res://new.txt"));
    }

    #[test]
    fn index_survives_a_reload() -> Result<()> {
        let mut registry = UidRegistry::new();
        let a = registry.register("res://a.txt");
        registry.register("res://b.txt");
        registry.remove_path("res://b.txt");

        let reloaded = UidRegistry::from_index_bytes(&registry.to_index_bytes()?)?;
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.path_for(&a.to_text()).as_deref(), Some("res://a.txt"));
        Ok(())
    }

    #[test]
    fn garbage_index_is_an_error() {
        assert!(UidRegistry::from_index_bytes(&[0xff; 3]).is_err());
    }
}
