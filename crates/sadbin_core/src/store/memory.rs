//! In-process store used for ephemeral deployments and tests.

use super::{
    hash_or_empty, merge_fields, remaining_seconds, wrong_type, FieldMap, KeyTtl, PasteStore, StoredValue,
};
use crate::error::AppError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct Entry {
    value: StoredValue,
    deadline: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.deadline.map_or(true, |deadline| deadline > now)
    }
}

/// `HashMap`-backed [`PasteStore`] with monotonic-clock expiry.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::StorageMessage("Memory store lock poisoned".to_string()))
    }

    /// Lock the map and drop `key` first if it has expired.
    fn live(&self, key: &str) -> Result<MutexGuard<'_, HashMap<String, Entry>>, AppError> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        if entries.get(key).is_some_and(|entry| !entry.is_live(now)) {
            entries.remove(key);
        }
        Ok(entries)
    }
}

impl PasteStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let entries = self.live(key)?;
        match entries.get(key).map(|entry| &entry.value) {
            None => Ok(None),
            Some(StoredValue::Plain(bytes)) => Ok(Some(bytes.clone())),
            Some(StoredValue::Hash(_)) => Err(wrong_type(key)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), AppError> {
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Entry {
                value: StoredValue::Plain(value.to_vec()),
                deadline: None,
            },
        );
        Ok(())
    }

    fn hash_get_all(&self, key: &str) -> Result<FieldMap, AppError> {
        let entries = self.live(key)?;
        match entries.get(key).map(|entry| &entry.value) {
            None => Ok(FieldMap::new()),
            Some(StoredValue::Hash(fields)) => Ok(fields.clone()),
            Some(StoredValue::Plain(_)) => Err(wrong_type(key)),
        }
    }

    fn hash_set_multi(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), AppError> {
        let mut entries = self.live(key)?;
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: StoredValue::Hash(FieldMap::new()),
            deadline: None,
        });
        match &mut entry.value {
            StoredValue::Hash(existing) => {
                merge_fields(existing, fields);
                Ok(())
            }
            StoredValue::Plain(_) => Err(wrong_type(key)),
        }
    }

    fn hash_write(
        &self,
        key: &str,
        fields: &[(&str, &str)],
        expire_after: Option<u64>,
    ) -> Result<(), AppError> {
        let mut entries = self.live(key)?;
        if expire_after == Some(0) {
            entries.remove(key);
            return Ok(());
        }
        let mut merged = hash_or_empty(entries.remove(key).map(|entry| entry.value));
        merge_fields(&mut merged, fields);
        entries.insert(
            key.to_string(),
            Entry {
                value: StoredValue::Hash(merged),
                deadline: expire_after
                    .and_then(|seconds| Instant::now().checked_add(Duration::from_secs(seconds))),
            },
        );
        Ok(())
    }

    fn set_expire(&self, key: &str, seconds: u64) -> Result<bool, AppError> {
        let mut entries = self.live(key)?;
        if !entries.contains_key(key) {
            return Ok(false);
        }
        if seconds == 0 {
            entries.remove(key);
            return Ok(true);
        }
        if let Some(entry) = entries.get_mut(key) {
            entry.deadline = Instant::now().checked_add(Duration::from_secs(seconds));
        }
        Ok(true)
    }

    fn persist(&self, key: &str) -> Result<bool, AppError> {
        let mut entries = self.live(key)?;
        Ok(entries
            .get_mut(key)
            .and_then(|entry| entry.deadline.take())
            .is_some())
    }

    fn get_ttl(&self, key: &str) -> Result<KeyTtl, AppError> {
        let entries = self.live(key)?;
        Ok(match entries.get(key) {
            None => KeyTtl::Missing,
            Some(Entry { deadline: None, .. }) => KeyTtl::Persistent,
            Some(Entry {
                deadline: Some(deadline),
                ..
            }) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                KeyTtl::Expires(remaining_seconds(remaining.as_millis()))
            }
        })
    }

    fn delete(&self, key: &str) -> Result<bool, AppError> {
        let mut entries = self.live(key)?;
        Ok(entries.remove(key).is_some())
    }

    fn purge_expired(&self) -> Result<usize, AppError> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        Ok(before - entries.len())
    }
}
