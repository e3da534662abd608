// src/cache.rs
//! Durable record of photos already imported, partitioned per server.
//!
//! The store is one JSON file shaped `{identity: {item: {recipe: name}}}`.
//! Persistence is best-effort: if the file cannot be read, parsed or
//! created, the cache logs a warning and keeps working in memory so the
//! import itself still runs.

use crate::error::AppError;
use crate::types::{ItemKey, ServerIdentity};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// What is remembered about an imported item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub recipe: String,
}

impl CacheRecord {
    pub fn for_recipe(name: impl Into<String>) -> Self {
        Self {
            recipe: name.into(),
        }
    }
}

type Partition = IndexMap<String, CacheRecord>;

/// Per-server map of imported items, backed by a JSON file.
#[derive(Debug)]
pub struct ImportCache {
    path: Option<PathBuf>,
    partitions: IndexMap<String, Partition>,
}

impl ImportCache {
    /// Loads the store at `path`, creating it if missing, and makes sure a
    /// partition exists for `identity`.
    ///
    /// Never fails: an unusable store degrades to an in-memory cache.
    pub fn open(path: impl AsRef<Path>, identity: &ServerIdentity) -> Self {
        let path = path.as_ref();

        let mut cache = match Self::load(path) {
            Ok(Some(partitions)) => {
                log::debug!("Loaded import cache from {}", path.display());
                Self {
                    path: Some(path.to_path_buf()),
                    partitions,
                }
            }
            Ok(None) => Self {
                path: Some(path.to_path_buf()),
                partitions: IndexMap::new(),
            },
            Err(e) => {
                log::warn!(
                    "Import cache {} is unusable, continuing without persistence: {}",
                    path.display(),
                    e
                );
                Self::in_memory()
            }
        };

        let created = cache.ensure_partition(identity);
        if created && cache.is_persistent() {
            if let Err(e) = cache.flush() {
                log::warn!(
                    "Cannot write import cache {}, continuing without persistence: {}",
                    path.display(),
                    e
                );
                cache.path = None;
            }
        }

        cache
    }

    /// A cache that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            partitions: IndexMap::new(),
        }
    }

    fn load(path: &Path) -> Result<Option<IndexMap<String, Partition>>, AppError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| AppError::Cache(format!("corrupt cache file: {}", e)))
    }

    /// Returns `true` if the partition had to be created.
    fn ensure_partition(&mut self, identity: &ServerIdentity) -> bool {
        if self.partitions.contains_key(identity.as_str()) {
            return false;
        }
        self.partitions
            .insert(identity.as_str().to_string(), Partition::new());
        true
    }

    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn has(&self, identity: &ServerIdentity, key: &ItemKey) -> bool {
        self.get(identity, key).is_some()
    }

    pub fn get(&self, identity: &ServerIdentity, key: &ItemKey) -> Option<&CacheRecord> {
        self.partitions
            .get(identity.as_str())
            .and_then(|partition| partition.get(key.as_str()))
    }

    /// Number of items recorded for one server.
    pub fn len(&self, identity: &ServerIdentity) -> usize {
        self.partitions
            .get(identity.as_str())
            .map_or(0, IndexMap::len)
    }

    /// Records an imported item. Call [`flush`](Self::flush) to persist it.
    pub fn record(&mut self, identity: &ServerIdentity, key: &ItemKey, record: CacheRecord) {
        self.partitions
            .entry(identity.as_str().to_string())
            .or_default()
            .insert(key.as_str().to_string(), record);
    }

    /// Writes the whole store to disk.
    ///
    /// The file is replaced atomically via a sibling temporary file. A no-op
    /// for in-memory caches.
    pub fn flush(&self) -> Result<(), AppError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.partitions)?;
        let tmp_path = temporary_sibling(path);
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;

        log::debug!("Flushed import cache to {}", path.display());
        Ok(())
    }
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
