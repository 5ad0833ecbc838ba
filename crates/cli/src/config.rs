//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `ARWA_DATA_DIR` - Directory holding the cart file (default: `.arwa`)
//! - `ARWA_CART_KEY` - Storage key of the cart (default: `cart`)
//! - `ARWA_ERROR_POLICY` - `lenient` or `strict` (default: `lenient`)
//! - `ARWA_CATALOG` - Path to a product catalog JSON file
//! - `ARWA_WATCH_INTERVAL_MS` - Poll interval of `watch` (default: 500, min: 50)
//! - `ARWA_LOG_FORMAT` - `text` or `json` (default: `text`)

use std::path::PathBuf;
use std::time::Duration;

use arwa_shop_cart::{CartStore, ErrorPolicy, FileStorage};
use thiserror::Error;

const DEFAULT_DATA_DIR: &str = ".arwa";
const DEFAULT_WATCH_INTERVAL_MS: u64 = 500;
const MIN_WATCH_INTERVAL_MS: u64 = 50;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Cart CLI configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Directory of the file store
    pub data_dir: PathBuf,
    /// Storage key the cart is kept under
    pub cart_key: String,
    /// Treatment of malformed carts and invalid quantities
    pub error_policy: ErrorPolicy,
    /// Product catalog used to resolve product IDs
    pub catalog: Option<PathBuf>,
    /// How often `watch` checks for changes from other processes
    pub watch_interval: Duration,
    pub log_format: LogFormat,
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let error_policy = match get("ARWA_ERROR_POLICY") {
            Some(value) => value
                .parse::<ErrorPolicy>()
                .map_err(|e| ConfigError::InvalidEnvVar("ARWA_ERROR_POLICY".to_string(), e))?,
            None => ErrorPolicy::default(),
        };

        let watch_interval_ms = match get("ARWA_WATCH_INTERVAL_MS") {
            Some(value) => value.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("ARWA_WATCH_INTERVAL_MS".to_string(), e.to_string())
            })?,
            None => DEFAULT_WATCH_INTERVAL_MS,
        };
        if watch_interval_ms < MIN_WATCH_INTERVAL_MS {
            return Err(ConfigError::InvalidEnvVar(
                "ARWA_WATCH_INTERVAL_MS".to_string(),
                format!("must be at least {MIN_WATCH_INTERVAL_MS}"),
            ));
        }

        let log_format = match get("ARWA_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "ARWA_LOG_FORMAT".to_string(),
                    format!("expected `text` or `json`, got `{other}`"),
                ));
            }
        };

        Ok(Self {
            data_dir: get("ARWA_DATA_DIR").map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from),
            cart_key: get("ARWA_CART_KEY")
                .unwrap_or_else(|| CartStore::<FileStorage>::DEFAULT_KEY.to_string()),
            error_policy,
            catalog: get("ARWA_CATALOG").map(PathBuf::from),
            watch_interval: Duration::from_millis(watch_interval_ms),
            log_format,
        })
    }

    /// Open the file store and the cart on it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the data directory cannot be opened.
    pub fn open_store(&self) -> Result<CartStore<FileStorage>, arwa_shop_cart::StorageError> {
        let storage = FileStorage::open(&self.data_dir)?;
        Ok(CartStore::new(storage)
            .with_key(self.cart_key.clone())
            .with_policy(self.error_policy))
    }
}
