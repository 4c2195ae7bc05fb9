//! Configuration module for the catalog backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_PAGE_SIZE: usize = 20;
const DEFAULT_ERROR_SAMPLE: usize = 10;

/// Which document store backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreKind::Sqlite),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("unknown store backend {:?}", other)),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Admin key for the API (unset disables the gate)
    pub admin_key: Option<String>,
    /// Document store backend
    pub store: StoreKind,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Root of the import source tree
    pub data_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Page size used when a request does not ask for one
    pub page_size: usize,
    /// Per-bucket cap on reported import errors
    pub error_sample: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let admin_key = env::var("CATALOG_ADMIN_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let store = parse_or("CATALOG_STORE", StoreKind::Sqlite);

        let db_path = env::var("CATALOG_DB_PATH")
            .unwrap_or_else(|_| "./data/catalog.sqlite".to_string())
            .into();

        let data_dir = env::var("CATALOG_DATA_DIR")
            .unwrap_or_else(|_| "./public/data".to_string())
            .into();

        let bind_addr = parse_or("CATALOG_BIND_ADDR", default_bind_addr());

        let log_level = env::var("CATALOG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let page_size = parse_or("CATALOG_PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1);
        let error_sample = parse_or("CATALOG_ERROR_SAMPLE", DEFAULT_ERROR_SAMPLE);

        Self {
            admin_key,
            store,
            db_path,
            data_dir,
            bind_addr,
            log_level,
            page_size,
            error_sample,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Parse `var`, falling back to `default` when unset or invalid.
///
/// Runs before the tracing subscriber exists, so invalid values are reported
/// on stderr.
fn parse_or<T>(var: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                eprintln!("Ignoring invalid {}={:?} ({}), using default", var, raw, e);
                default
            }
        },
        Err(_) => default,
    }
}
