//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_MAX_AUTHOR_LENGTH, DEFAULT_MAX_PASTE_SIZE, DEFAULT_MAX_TITLE_LENGTH, DEFAULT_PORT,
    DEFAULT_PURGE_INTERVAL_SECS, DEFAULT_TTL_SECONDS, NEVER_EXPIRE, REDB_FILE_NAME,
};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Which backing store the service persists pastes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// redb file at [`Config::db_path`].
    Redb,
    /// Process-local map; everything is lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redb" | "" => Ok(Self::Redb),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

/// Runtime configuration for the paste service.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub port: u16,
    pub store: StoreBackend,
    pub max_paste_size: usize,
    /// Lifetime applied when a submission carries no duration; `-1` never expires.
    pub default_ttl: i64,
    pub max_title_length: usize,
    pub max_author_length: usize,
    pub purge_interval_secs: u64,
    pub allow_public_access: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            port: DEFAULT_PORT,
            store: StoreBackend::Redb,
            max_paste_size: DEFAULT_MAX_PASTE_SIZE,
            default_ttl: DEFAULT_TTL_SECONDS,
            max_title_length: DEFAULT_MAX_TITLE_LENGTH,
            max_author_length: DEFAULT_MAX_AUTHOR_LENGTH,
            purge_interval_secs: DEFAULT_PURGE_INTERVAL_SECS,
            allow_public_access: false,
        }
    }
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

fn default_db_path() -> String {
    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".cache")
        .join("sadbin")
        .join(REDB_FILE_NAME)
        .to_string_lossy()
        .to_string()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn env_parsed<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}='{}'", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

/// Accept `-1` (never) or a positive number of seconds.
fn sanitize_default_ttl(value: i64) -> i64 {
    if value == NEVER_EXPIRE || value > 0 {
        value
    } else {
        tracing::warn!(
            "DEFAULT_TTL must be -1 or positive, got {}; using {}",
            value,
            DEFAULT_TTL_SECONDS
        );
        DEFAULT_TTL_SECONDS
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing
    /// or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env::var("DB_PATH")
                .map(expand_tilde)
                .unwrap_or(defaults.db_path),
            port: env_parsed("PORT", defaults.port),
            store: env_parsed("STORE", defaults.store),
            max_paste_size: env_parsed("MAX_PASTE_SIZE", defaults.max_paste_size),
            default_ttl: sanitize_default_ttl(env_parsed("DEFAULT_TTL", defaults.default_ttl)),
            max_title_length: env_parsed("MAX_TITLE_LENGTH", defaults.max_title_length),
            max_author_length: env_parsed("MAX_AUTHOR_LENGTH", defaults.max_author_length),
            purge_interval_secs: env_parsed("PURGE_INTERVAL", defaults.purge_interval_secs)
                .max(1),
            allow_public_access: env_flag_enabled("ALLOW_PUBLIC_ACCESS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_env_flag, Config, StoreBackend};
    use crate::constants::{DEFAULT_MAX_PASTE_SIZE, DEFAULT_TTL_SECONDS};
    use crate::env::{env_lock, EnvGuard};

    #[test]
    fn parse_env_flag_accepts_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert_eq!(parse_env_flag(value), Some(true), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_accepts_falsy_values() {
        for value in ["", "0", "false", "FALSE", " no ", "off"] {
            assert_eq!(parse_env_flag(value), Some(false), "value: {}", value);
        }
    }

    #[test]
    fn parse_env_flag_rejects_unknown_values() {
        assert_eq!(parse_env_flag("maybe"), None);
        assert_eq!(parse_env_flag("enabled"), None);
    }

    #[test]
    fn from_env_applies_overrides_and_falls_back_on_garbage() {
        let _lock = env_lock().lock().expect("env lock");
        let _size = EnvGuard::set("MAX_PASTE_SIZE", "1024");
        let _store = EnvGuard::set("STORE", "memory");
        let _ttl = EnvGuard::set("DEFAULT_TTL", "not-a-number");
        let _path = EnvGuard::set("DB_PATH", "/tmp/sadbin-test.redb");
        let _public = EnvGuard::remove("ALLOW_PUBLIC_ACCESS");

        let config = Config::from_env();
        assert_eq!(config.max_paste_size, 1024);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.default_ttl, DEFAULT_TTL_SECONDS);
        assert_eq!(config.db_path, "/tmp/sadbin-test.redb");
        assert!(!config.allow_public_access);
    }

    #[test]
    fn from_env_accepts_never_as_default_ttl_but_not_zero() {
        let _lock = env_lock().lock().expect("env lock");
        {
            let _ttl = EnvGuard::set("DEFAULT_TTL", "-1");
            assert_eq!(Config::from_env().default_ttl, -1);
        }
        let _ttl = EnvGuard::set("DEFAULT_TTL", "0");
        assert_eq!(Config::from_env().default_ttl, DEFAULT_TTL_SECONDS);
    }

    #[test]
    fn defaults_match_documented_limits() {
        let config = Config::default();
        assert_eq!(config.max_paste_size, DEFAULT_MAX_PASTE_SIZE);
        assert_eq!(config.max_title_length, 256);
        assert_eq!(config.max_author_length, 256);
        assert_eq!(config.store, StoreBackend::Redb);
    }

    #[test]
    fn store_backend_parses_aliases() {
        assert_eq!("MEMORY".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("redb".parse::<StoreBackend>(), Ok(StoreBackend::Redb));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }
}
