//! Paste store backed by a redb file.

use super::{
    hash_or_empty, merge_fields, remaining_seconds, wrong_type, FieldMap, KeyTtl, PasteStore, StoredValue,
};
use crate::error::AppError;
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Store rows (`StoredEntry`, bincode-encoded).
const ENTRIES: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    value: StoredValue,
    /// Unix millis after which the entry is gone; `None` never expires.
    expires_at_ms: Option<i64>,
}

impl StoredEntry {
    fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at_ms.map_or(true, |at| at > now_ms)
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Unix millis `seconds` from now.
fn deadline_ms(seconds: u64) -> i64 {
    let offset_ms = i64::try_from(seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
    now_ms().saturating_add(offset_ms)
}

fn decode(bytes: &[u8]) -> Result<StoredEntry, AppError> {
    Ok(bincode::deserialize(bytes)?)
}

/// [`super::PasteStore`] persisting entries in a single redb table.
///
/// Expired rows are hidden from reads immediately and removed from disk by
/// [`PasteStore::purge_expired`].
pub struct RedbStore {
    db: Arc<redb::Database>,
}

impl RedbStore {
    /// Open (or create) the redb file at `path`, creating parent directories.
    ///
    /// # Errors
    /// Returns an error when the directory or database cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                AppError::StorageMessage(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    err
                ))
            })?;
        }
        let db = redb::Database::create(path)?;
        Self::from_shared(Arc::new(db))
    }

    /// Wrap an already-open database, creating the entries table if needed.
    ///
    /// # Errors
    /// Returns an error when table initialization fails.
    pub fn from_shared(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(ENTRIES)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Read the live entry under `key`.
    fn read_live(&self, key: &str) -> Result<Option<StoredEntry>, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ENTRIES)?;
        let Some(raw) = table.get(key)? else {
            return Ok(None);
        };
        let entry = decode(raw.value())?;
        Ok(entry.is_live(now_ms()).then_some(entry))
    }

    /// Run `mutate` against the live entry under `key` inside one write transaction.
    ///
    /// `mutate` receives `None` for missing or expired keys and returns the
    /// entry to write back (`None` deletes) alongside its result.
    fn update<T>(
        &self,
        key: &str,
        mutate: impl FnOnce(Option<StoredEntry>) -> Result<(Option<StoredEntry>, T), AppError>,
    ) -> Result<T, AppError> {
        let write_txn = self.db.begin_write()?;
        let result = {
            let mut table = write_txn.open_table(ENTRIES)?;
            let current = match table.get(key)? {
                Some(raw) => Some(decode(raw.value())?),
                None => None,
            };
            let current = current.filter(|entry| entry.is_live(now_ms()));
            let (next, result) = mutate(current)?;
            match next {
                Some(entry) => {
                    let encoded = bincode::serialize(&entry)?;
                    table.insert(key, encoded.as_slice())?;
                }
                None => {
                    table.remove(key)?;
                }
            }
            result
        };
        write_txn.commit()?;
        Ok(result)
    }
}

impl PasteStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        match self.read_live(key)?.map(|entry| entry.value) {
            None => Ok(None),
            Some(StoredValue::Plain(bytes)) => Ok(Some(bytes)),
            Some(StoredValue::Hash(_)) => Err(wrong_type(key)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), AppError> {
        self.update(key, |_| {
            let entry = StoredEntry {
                value: StoredValue::Plain(value.to_vec()),
                expires_at_ms: None,
            };
            Ok((Some(entry), ()))
        })
    }

    fn hash_get_all(&self, key: &str) -> Result<FieldMap, AppError> {
        match self.read_live(key)?.map(|entry| entry.value) {
            None => Ok(FieldMap::new()),
            Some(StoredValue::Hash(fields)) => Ok(fields),
            Some(StoredValue::Plain(_)) => Err(wrong_type(key)),
        }
    }

    fn hash_set_multi(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), AppError> {
        self.update(key, |current| {
            let mut entry = current.unwrap_or(StoredEntry {
                value: StoredValue::Hash(FieldMap::new()),
                expires_at_ms: None,
            });
            match &mut entry.value {
                StoredValue::Hash(existing) => merge_fields(existing, fields),
                StoredValue::Plain(_) => return Err(wrong_type(key)),
            }
            Ok((Some(entry), ()))
        })
    }

    fn hash_write(
        &self,
        key: &str,
        fields: &[(&str, &str)],
        expire_after: Option<u64>,
    ) -> Result<(), AppError> {
        self.update(key, |current| {
            if expire_after == Some(0) {
                return Ok((None, ()));
            }
            let mut merged = hash_or_empty(current.map(|entry| entry.value));
            merge_fields(&mut merged, fields);
            let entry = StoredEntry {
                value: StoredValue::Hash(merged),
                expires_at_ms: expire_after.map(deadline_ms),
            };
            Ok((Some(entry), ()))
        })
    }

    fn set_expire(&self, key: &str, seconds: u64) -> Result<bool, AppError> {
        self.update(key, |current| match current {
            None => Ok((None, false)),
            Some(_) if seconds == 0 => Ok((None, true)),
            Some(mut entry) => {
                entry.expires_at_ms = Some(deadline_ms(seconds));
                Ok((Some(entry), true))
            }
        })
    }

    fn persist(&self, key: &str) -> Result<bool, AppError> {
        self.update(key, |current| match current {
            Some(StoredEntry {
                value,
                expires_at_ms: Some(_),
            }) => Ok((
                Some(StoredEntry {
                    value,
                    expires_at_ms: None,
                }),
                true,
            )),
            other => Ok((other, false)),
        })
    }

    fn get_ttl(&self, key: &str) -> Result<KeyTtl, AppError> {
        Ok(match self.read_live(key)? {
            None => KeyTtl::Missing,
            Some(StoredEntry {
                expires_at_ms: None,
                ..
            }) => KeyTtl::Persistent,
            Some(StoredEntry {
                expires_at_ms: Some(at),
                ..
            }) => {
                let remaining = u128::try_from(at.saturating_sub(now_ms())).unwrap_or(0);
                KeyTtl::Expires(remaining_seconds(remaining))
            }
        })
    }

    fn delete(&self, key: &str) -> Result<bool, AppError> {
        self.update(key, |current| Ok((None, current.is_some())))
    }

    fn purge_expired(&self) -> Result<usize, AppError> {
        let now = now_ms();
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(ENTRIES)?;
            let mut expired = Vec::new();
            for row in table.iter()? {
                let (key, value) = row?;
                if !decode(value.value())?.is_live(now) {
                    expired.push(key.value().to_string());
                }
            }
            for key in &expired {
                table.remove(key.as_str())?;
            }
            expired.len()
        };
        write_txn.commit()?;
        if removed > 0 {
            tracing::debug!("Purged {} expired store entries", removed);
        }
        Ok(removed)
    }
}
