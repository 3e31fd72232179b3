use std::path::PathBuf;

use crate::pricing::{PriceTable, PriceTableError};

/// Name of the booking log inside the data directory.
pub const WAL_FILE_NAME: &str = "bookings.wal";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: {value:?} is not a valid {expected}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("SLOTBOOK_PRICES: {0}")]
    Prices(#[from] PriceTableError),
}

/// Daemon settings, read from `SLOTBOOK_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub metrics_port: Option<u16>,
    /// WAL appends between background compactions.
    pub compact_threshold: u64,
    pub prices: PriceTable,
    /// Drop bookings dated before today when the daemon starts.
    pub purge_on_startup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            metrics_port: None,
            compact_threshold: 1000,
            prices: PriceTable::default(),
            purge_on_startup: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset variables keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if let Some(dir) = lookup("SLOTBOOK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(port) = lookup("SLOTBOOK_METRICS_PORT") {
            config.metrics_port = Some(parse(&port, "SLOTBOOK_METRICS_PORT", "port number")?);
        }
        if let Some(threshold) = lookup("SLOTBOOK_COMPACT_THRESHOLD") {
            config.compact_threshold = parse(&threshold, "SLOTBOOK_COMPACT_THRESHOLD", "whole number")?;
        }
        if let Some(prices) = lookup("SLOTBOOK_PRICES") {
            config.prices = prices.parse()?;
        }
        if let Some(purge) = lookup("SLOTBOOK_PURGE_ON_STARTUP") {
            config.purge_on_startup = parse_flag(&purge, "SLOTBOOK_PURGE_ON_STARTUP")?;
        }
        Ok(config)
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join(WAL_FILE_NAME)
    }
}

fn parse<T: std::str::FromStr>(value: &str, var: &'static str, expected: &'static str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
        expected,
    })
}

fn parse_flag(value: &str, var: &'static str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            expected: "boolean",
        }),
    }
}
