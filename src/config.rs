//! Runtime configuration read from the environment.
//!
//! A `.env` file in the working directory is loaded first when present;
//! real environment variables win over it.

use std::path::PathBuf;

use crate::sites::allocator::DEFAULT_SCAN_PAGE_SIZE;

/// Path of the JSON table file.
pub const STORE_VAR: &str = "SITELEDGER_STORE";
/// Items requested per allocation scan page.
pub const SCAN_PAGE_SIZE_VAR: &str = "SITELEDGER_SCAN_PAGE_SIZE";
/// Attempts the CLI spends on a create that keeps losing id races.
pub const CREATE_ATTEMPTS_VAR: &str = "SITELEDGER_CREATE_ATTEMPTS";
/// Emit JSON log lines instead of human-readable ones.
pub const LOG_JSON_VAR: &str = "SITELEDGER_LOG_JSON";
/// Directory receiving port cassettes when set.
pub const RECORD_VAR: &str = "SITELEDGER_RECORD";

const DEFAULT_STORE: &str = ".siteledger/sites.json";

/// Resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// JSON table file backing the live store.
    pub store_path: PathBuf,
    /// Page size for allocation scans.
    pub scan_page_size: usize,
    /// Total create attempts, including the first.
    pub create_attempts: u32,
    /// Structured log output.
    pub log_json: bool,
    /// Cassette directory, when recording.
    pub record_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE),
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
            create_attempts: 1,
            log_json: false,
            record_dir: None,
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `.env` exists but cannot be read or parsed, or
    /// naming the variable whose value is invalid.
    pub fn from_env() -> Result<Self, String> {
        check_dotenv(dotenvy::dotenv())?;
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable whose value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            store_path: read(STORE_VAR).map_or(defaults.store_path, PathBuf::from),
            scan_page_size: read(SCAN_PAGE_SIZE_VAR)
                .map(|v| parse_positive(SCAN_PAGE_SIZE_VAR, &v))
                .transpose()?
                .unwrap_or(defaults.scan_page_size),
            create_attempts: read(CREATE_ATTEMPTS_VAR)
                .map(|v| parse_positive(CREATE_ATTEMPTS_VAR, &v))
                .transpose()?
                .unwrap_or(defaults.create_attempts),
            log_json: read(LOG_JSON_VAR)
                .map(|v| parse_bool(LOG_JSON_VAR, &v))
                .transpose()?
                .unwrap_or(defaults.log_json),
            record_dir: read(RECORD_VAR).map(PathBuf::from),
        })
    }
}

/// A missing `.env` is the normal case; anything else wrong with it is not.
fn check_dotenv(result: Result<PathBuf, dotenvy::Error>) -> Result<(), String> {
    match result {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(format!("failed to load .env: {err}")),
    }
}

fn parse_positive<T>(name: &str, value: &str) -> Result<T, String>
where
    T: std::str::FromStr + PartialOrd + From<u8>,
{
    match value.trim().parse::<T>() {
        Ok(n) if n >= T::from(1) => Ok(n),
        _ => Err(format!("{name} must be a positive integer, got `{value}`")),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(format!("{name} must be a boolean, got `{value}`")),
    }
}
