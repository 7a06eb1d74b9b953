//! Shared constants used across sadbin crates.

/// Default HTTP port for the paste service.
pub const DEFAULT_PORT: u16 = 38480;

/// Default maximum paste size accepted at submission time (256 KiB).
pub const DEFAULT_MAX_PASTE_SIZE: usize = 256 * 1024;

/// Default paste lifetime in seconds (one year).
pub const DEFAULT_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Default maximum title length in characters.
pub const DEFAULT_MAX_TITLE_LENGTH: usize = 256;
/// Default maximum author length in characters.
pub const DEFAULT_MAX_AUTHOR_LENGTH: usize = 256;

/// Default interval between expired-key sweeps, in seconds.
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 60;

/// Duration selection sentinel meaning "never expire".
pub const NEVER_EXPIRE: i64 = -1;

/// Language hint sentinel meaning "guess from content".
pub const LANGUAGE_NONE: &str = "none";
/// Display label for [`LANGUAGE_NONE`] in language selectors.
pub const LANGUAGE_NONE_LABEL: &str = "Guess Language";

/// Lexer id used when nothing better can be determined.
pub const PLAIN_TEXT_LEXER: &str = "text";

/// Key prefix under which paste records live in the backing store.
pub const PASTE_KEY_PREFIX: &str = "paste:";

/// File name of the default redb store.
pub const REDB_FILE_NAME: &str = "pastes.redb";
