//! Paste data models.

pub mod paste;

pub use paste::{CreateOutcome, Paste, PasteView, Submission};
