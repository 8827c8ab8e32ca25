//! RocksDB-backed record storage
//!
//! Records are JSON documents under prefixed keys. Every read-modify-write
//! goes through [`Storage::atomic`], which serializes writers and commits
//! the collected changes as a single `WriteBatch`.

use crate::errors::{CasinoError, CasinoResult, StorageError};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    path::Path,
    sync::{Arc, Mutex},
};

#[derive(Clone)]
pub struct Storage {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl Storage {
    pub fn open<P: AsRef<Path>>(path: P) -> CasinoResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path)
            .map_err(|e| StorageError::DatabaseOpenFailed(e.to_string()))?;
        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Open with the storage section of the service config
    pub fn open_with_config(config: &crate::config::StorageConfig) -> CasinoResult<Self> {
        if config.clear_on_start && Path::new(&config.data_directory).exists() {
            tracing::warn!("Clearing database at {}", config.data_directory);
            std::fs::remove_dir_all(&config.data_directory)?;
        }
        std::fs::create_dir_all(&config.data_directory)?;
        Self::open(&config.data_directory)
    }

    pub fn get_raw(&self, key: &[u8]) -> CasinoResult<Option<Vec<u8>>> {
        self.db
            .get(key)
            .map_err(|e| StorageError::ReadFailed(e.to_string()).into())
    }

    /// Load and decode a JSON record
    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> CasinoResult<Option<T>> {
        let Some(bytes) = self.get_raw(key)? else {
            return Ok(None);
        };
        let value = serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::CorruptedData(format!(
                "Failed to decode {}: {}",
                String::from_utf8_lossy(key),
                e
            ))
        })?;
        Ok(Some(value))
    }

    /// All `(key, value)` pairs whose key starts with `prefix`, in key order
    pub fn scan_prefix(&self, prefix: &[u8]) -> CasinoResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut rows = Vec::new();
        for item in self.db.iterator(IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item.map_err(|e| StorageError::ReadFailed(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            rows.push((key.to_vec(), value.to_vec()));
        }
        Ok(rows)
    }

    /// Decode every record under `prefix`
    pub fn scan_records<T: DeserializeOwned>(&self, prefix: &[u8]) -> CasinoResult<Vec<T>> {
        self.scan_prefix(prefix)?
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_slice(&value).map_err(|e| {
                    CasinoError::from(StorageError::CorruptedData(format!(
                        "Failed to decode {}: {}",
                        String::from_utf8_lossy(&key),
                        e
                    )))
                })
            })
            .collect()
    }

    /// Run `f` with exclusive write access and commit its batch atomically.
    ///
    /// Nothing is written if `f` returns an error.
    pub fn atomic<T, F>(&self, f: F) -> CasinoResult<T>
    where
        F: FnOnce(&mut Txn<'_>) -> CasinoResult<T>,
    {
        // The lock guards no data; a section that panicked never wrote its batch.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut txn = Txn {
            storage: self,
            batch: WriteBatch::default(),
            staged: Vec::new(),
        };
        let out = f(&mut txn)?;
        self.db
            .write(txn.batch)
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(out)
    }
}

/// Pending changes inside [`Storage::atomic`].
///
/// Reads see values staged earlier in the same section.
pub struct Txn<'a> {
    storage: &'a Storage,
    batch: WriteBatch,
    staged: Vec<(Vec<u8>, Option<Vec<u8>>)>,
}

impl Txn<'_> {
    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> CasinoResult<Option<T>> {
        if let Some((_, staged)) = self.staged.iter().rev().find(|(k, _)| k == key) {
            return match staged {
                Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
                None => Ok(None),
            };
        }
        self.storage.get(key)
    }

    pub fn put<T: Serialize>(&mut self, key: &[u8], value: &T) -> CasinoResult<()> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| StorageError::WriteFailed(format!("Failed to encode record: {}", e)))?;
        self.batch.put(key, &bytes);
        self.staged.push((key.to_vec(), Some(bytes)));
        Ok(())
    }

    /// Store a key with an empty value (secondary indexes)
    pub fn put_marker(&mut self, key: &[u8]) {
        self.batch.put(key, b"");
        self.staged.push((key.to_vec(), Some(Vec::new())));
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.batch.delete(key);
        self.staged.push((key.to_vec(), None));
    }

    pub fn storage(&self) -> &Storage {
        self.storage
    }
}
