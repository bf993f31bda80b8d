use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Record Store round-trip failures.
///
/// Any failure talking to the store collapses into one of these variants;
/// the ledger surfaces them to the UI and never retries on its own.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Network(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("store rejected the request: {0}")]
    Rejected(String),

    #[error("store request timed out after {0:?}")]
    Timeout(Duration),

    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store payload error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Ledger operation failures.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("authentication required")]
    AuthRequired,

    #[error("invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("insufficient holdings: selling {requested} exceeds balance of {held}")]
    InsufficientHoldings { requested: Decimal, held: Decimal },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;
