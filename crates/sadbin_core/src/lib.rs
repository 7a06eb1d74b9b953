//! Core library for sadbin: content-addressed pastes with expiry and
//! syntax highlighting.

/// Content-derived paste ids.
pub mod address;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants.
pub mod constants;
/// Process-environment helpers for tests in every crate.
pub mod env;
/// Application error types (storage/domain).
pub mod error;
/// Lifetime catalog and display reconciliation.
pub mod expiry;
/// Language resolution and highlighting.
pub mod language;
/// Data models for submissions, records and views.
pub mod models;
/// The paste engine.
pub mod service;
/// Key-value stores with per-key expiry.
pub mod store;
#[cfg(test)]
mod test_support;
/// Submission field rules.
pub mod validation;

pub use config::Config;
pub use error::AppError;
pub use language::LanguageResolver;
pub use service::PasteService;
pub use store::{open_store, PasteStore};
