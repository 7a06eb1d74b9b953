//! Shared test-only helpers for sadbin_core.

use crate::error::AppError;
use crate::language::{LanguageResolver, LexerCatalog};
use crate::service::PasteService;
use crate::store::{FieldMap, KeyTtl, MemoryStore, PasteStore, RedbStore};
use crate::Config;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Creates an isolated redb store and returns it with the temp dir.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing file.
///
/// # Panics
/// Panics if temp-dir creation or store initialization fails.
pub(crate) fn setup_temp_store() -> (RedbStore, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let store = RedbStore::open(temp_dir.path().join("nested").join("store.redb"))
        .expect("open redb store");
    (store, temp_dir)
}

/// Service over `store` with default limits and the bundled grammars.
pub(crate) fn service_over(store: Arc<dyn PasteStore>) -> PasteService {
    let languages = Arc::new(LanguageResolver::new(LexerCatalog::shared()));
    PasteService::new(&Config::default(), store, languages)
}

/// Memory store whose reads, writes or expiry updates can be switched to fail.
#[derive(Default)]
pub(crate) struct FlakyStore {
    pub(crate) inner: MemoryStore,
    pub(crate) fail_reads: AtomicBool,
    pub(crate) fail_writes: AtomicBool,
    /// Fails only operations that set or clear an expiry.
    pub(crate) fail_expiry: AtomicBool,
}

impl FlakyStore {
    fn check(&self, flag: &AtomicBool, op: &str) -> Result<(), AppError> {
        if flag.load(Ordering::SeqCst) {
            return Err(AppError::StorageMessage(format!("injected {} failure", op)));
        }
        Ok(())
    }

    fn read(&self) -> Result<(), AppError> {
        self.check(&self.fail_reads, "read")
    }

    fn write(&self) -> Result<(), AppError> {
        self.check(&self.fail_writes, "write")
    }

    fn expiry(&self) -> Result<(), AppError> {
        self.write()?;
        self.check(&self.fail_expiry, "expiry")
    }
}

impl PasteStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        self.read()?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), AppError> {
        self.write()?;
        self.inner.set(key, value)
    }

    fn hash_get_all(&self, key: &str) -> Result<FieldMap, AppError> {
        self.read()?;
        self.inner.hash_get_all(key)
    }

    fn hash_set_multi(&self, key: &str, fields: &[(&str, &str)]) -> Result<(), AppError> {
        self.write()?;
        self.inner.hash_set_multi(key, fields)
    }

    fn hash_write(
        &self,
        key: &str,
        fields: &[(&str, &str)],
        expire_after: Option<u64>,
    ) -> Result<(), AppError> {
        self.expiry()?;
        self.inner.hash_write(key, fields, expire_after)
    }

    fn set_expire(&self, key: &str, seconds: u64) -> Result<bool, AppError> {
        self.expiry()?;
        self.inner.set_expire(key, seconds)
    }

    fn persist(&self, key: &str) -> Result<bool, AppError> {
        self.expiry()?;
        self.inner.persist(key)
    }

    fn get_ttl(&self, key: &str) -> Result<KeyTtl, AppError> {
        self.read()?;
        self.inner.get_ttl(key)
    }

    fn delete(&self, key: &str) -> Result<bool, AppError> {
        self.write()?;
        self.inner.delete(key)
    }
}
