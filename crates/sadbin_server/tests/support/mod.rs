//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use sadbin_core::store::{MemoryStore, RedbStore};
use sadbin_server::{create_app, AppState, Config};
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) fn test_config() -> Config {
    Config {
        port: 0,
        max_paste_size: 1024,
        ..Config::default()
    }
}

/// Server over a fresh in-memory store; the store is returned for direct
/// inspection.
pub(crate) fn setup_test_server() -> (TestServer, Arc<MemoryStore>) {
    setup_test_server_with(test_config())
}

pub(crate) fn setup_test_server_with(config: Config) -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(config, store.clone());
    let server = TestServer::new(create_app(state)).expect("server");
    (server, store)
}

/// Server over a redb file in a temp dir that lives as long as the server.
pub(crate) fn setup_redb_test_server() -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let store = RedbStore::open(temp_dir.path().join("pastes.redb")).expect("open store");
    let state = AppState::new(test_config(), Arc::new(store));
    let server = TestServer::new(create_app(state)).expect("server");
    (server, temp_dir)
}
