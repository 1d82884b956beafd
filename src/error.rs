//! Error types for the gold-melt library.

use thiserror::Error;

/// Errors that can occur while pricing, persisting, or proxying.
#[derive(Error, Debug)]
pub enum Error {
    /// Spot price rejected by the save action.
    #[error("enter a valid spot price greater than zero (got {0})")]
    InvalidSpot(f64),

    /// A render target has no surface for the requested output.
    #[error("render target is missing its {0} element")]
    MissingElement(&'static str),

    /// I/O error while reading or writing settings or cache entries.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML file could not be parsed.
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// JSON output could not be produced.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML file could not be written.
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// A manifest asset answered with a non-success status during install.
    #[error("failed to cache {path}: status {status}")]
    Install {
        /// Manifest path that failed.
        path: String,
        /// HTTP status returned by the origin.
        status: u16,
    },

    /// Cache storage refused or could not complete an operation.
    #[error("cache error: {0}")]
    Cache(String),

    /// Network fetch failed without an underlying HTTP client error.
    #[error("network error: {0}")]
    Network(String),

    /// Configuration value could not be interpreted.
    #[error("configuration error: {0}")]
    Config(String),
}

/// A specialized `Result` type for gold-melt operations.
pub type Result<T> = std::result::Result<T, Error>;
