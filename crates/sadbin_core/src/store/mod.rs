//! Key-value persistence with per-key expiry.
//!
//! The engine only needs the small slice of Redis semantics described on
//! [`PasteStore`]; both implementations here follow that model so the
//! service behaves identically whichever one is configured.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::config::{Config, StoreBackend};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Field map stored under a hash key.
pub type FieldMap = BTreeMap<String, String>;

/// Remaining lifetime of a key as reported by [`PasteStore::get_ttl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// No such key (or it already expired).
    Missing,
    /// Key exists and never expires.
    Persistent,
    /// Key exists and expires after this many seconds.
    Expires(u64),
}

/// Value held under a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum StoredValue {
    Plain(Vec<u8>),
    Hash(FieldMap),
}

/// Backing store contract consumed by the paste engine.
///
/// Semantics:
/// - `set` replaces the value and clears any expiry.
/// - `hash_set_multi` merges fields into a hash and keeps an existing expiry.
/// - `set_expire(key, 0)` deletes the key; on a missing key it returns `false`.
/// - `persist` drops an expiry without touching the value.
/// - `hash_write` merges fields and sets the expiry as one atomic step,
///   replacing a plain value held under the key.
/// - Expired keys are invisible to every read.
///
/// Reading a hash key with `get` (or a plain key with `hash_get_all`) is a
/// type mismatch and reported as a storage error.
pub trait PasteStore: Send + Sync {
    /// Fetch a plain value.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;

    /// Store a plain value with no expiry.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), AppError>;

    /// Fetch every field of a hash; empty when the key is missing.
    fn hash_get_all(&self, key: &str) -> Result<FieldMap, AppError>;

    /// Set several hash fields at once.
    fn hash_set_multi(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), AppError>;

    /// Merge `fields` into the hash under `key` and apply `expire_after`
    /// (`None` never expires) in one step. A plain value under `key` is
    /// replaced. On error nothing is changed.
    fn hash_write(
        &self,
        key: &str,
        fields: &[(&str, &str)],
        expire_after: Option<u64>,
    ) -> Result<(), AppError>;

    /// Expire `key` after `seconds`. Returns `false` when the key is missing.
    fn set_expire(&self, key: &str, seconds: u64) -> Result<bool, AppError>;

    /// Remove any expiry from `key`. Returns `false` when the key is missing
    /// or had no expiry.
    fn persist(&self, key: &str) -> Result<bool, AppError>;

    /// Remaining lifetime of `key`.
    fn get_ttl(&self, key: &str) -> Result<KeyTtl, AppError>;

    /// Remove `key`. Returns `true` when something was removed.
    fn delete(&self, key: &str) -> Result<bool, AppError>;

    /// Whether `key` currently exists.
    fn exists(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.get_ttl(key)? != KeyTtl::Missing)
    }

    /// Physically drop expired entries. Returns how many were removed.
    fn purge_expired(&self) -> Result<usize, AppError> {
        Ok(0)
    }
}

/// Open the store selected by `config`.
///
/// # Errors
/// Returns an error when the redb file cannot be created or opened.
pub fn open_store(config: &Config) -> Result<Arc<dyn PasteStore>, AppError> {
    match config.store {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory paste store; pastes will not survive a restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Redb => {
            tracing::info!("Opening paste store at {}", config.db_path);
            Ok(Arc::new(RedbStore::open(&config.db_path)?))
        }
    }
}

/// Round a remaining lifetime to whole seconds, half up.
pub(crate) fn remaining_seconds(remaining_ms: u128) -> u64 {
    u64::try_from((remaining_ms + 500) / 1000).unwrap_or(u64::MAX)
}

pub(crate) fn wrong_type(key: &str) -> AppError {
    AppError::StorageMessage(format!(
        "Operation against key '{}' holding the wrong kind of value",
        key
    ))
}

/// Fields of `current` when it is a hash, otherwise an empty map.
pub(crate) fn hash_or_empty(current: Option<StoredValue>) -> FieldMap {
    match current {
        Some(StoredValue::Hash(fields)) => fields,
        Some(StoredValue::Plain(_)) | None => FieldMap::new(),
    }
}

pub(crate) fn merge_fields(target: &mut FieldMap, fields: &[(&str, &str)]) {
    for (field, value) in fields {
        target.insert((*field).to_string(), (*value).to_string());
    }
}
