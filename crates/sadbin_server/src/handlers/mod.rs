//! HTTP request handlers.

/// Paste form and catalog endpoints.
pub mod paste;
