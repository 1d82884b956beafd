//! Application configuration: where settings live and how the proxy runs.
//!
//! Loaded from `config.toml` in the user config directory. Every field has a
//! default, so a partial file is fine. A few environment variables override
//! the file for one-off runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::DiskCacheStorage;
use crate::store::FileStore;
use crate::{Error, Result};

/// Overrides the config file location.
pub const ENV_CONFIG: &str = "MELT_CONFIG";
/// Overrides `proxy.port`.
pub const ENV_PROXY_PORT: &str = "MELT_PROXY_PORT";
/// Overrides `proxy.origin`.
pub const ENV_ORIGIN: &str = "MELT_ORIGIN";

pub const DEFAULT_PROXY_PORT: u16 = 8787;

const TEMPLATE_HEADER: &str = "# gold-melt configuration\n\
# Delete a line to fall back to its default.\n\n";

/// Where persistent settings are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Settings file (spot, discount, PIN).
    pub path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: FileStore::default_path(),
        }
    }
}

/// Offline proxy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Origin the app assets are fetched from.
    pub origin: String,
    /// Directory holding the versioned caches.
    pub cache_dir: PathBuf,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PROXY_PORT,
            origin: "http://127.0.0.1:8080/".to_string(),
            cache_dir: DiskCacheStorage::default_root(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub settings: SettingsConfig,
    pub proxy: ProxyConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location, honouring `MELT_CONFIG`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        std::env::var_os(ENV_CONFIG).map_or_else(
            || {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("gold-melt")
                    .join("config.toml")
            },
            PathBuf::from,
        )
    }

    /// Reads the config at `path`, writing a commented template with the
    /// defaults first if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or created.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                let body = toml::to_string_pretty(&config)?;
                std::fs::write(path, format!("{TEMPLATE_HEADER}{body}"))?;
                log::info!("Created config template at {}", path.display());
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads the default config file and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or an override is malformed.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let config = Self::load_or_create(&path)?;
        log::debug!("Loaded config from {}", path.display());
        config.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `MELT_PROXY_PORT` and `MELT_ORIGIN` as returned by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the port override is not a valid port number.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(port) = lookup(ENV_PROXY_PORT) {
            self.proxy.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("{ENV_PROXY_PORT} is not a port: {port:?}")))?;
        }
        if let Some(origin) = lookup(ENV_ORIGIN) {
            self.proxy.origin = origin;
        }
        Ok(self)
    }

    /// Sets the settings file path.
    #[must_use]
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.path = path.into();
        self
    }

    /// Sets the proxy bind host.
    #[must_use]
    pub fn with_proxy_host(mut self, host: impl Into<String>) -> Self {
        self.proxy.host = host.into();
        self
    }

    /// Sets the proxy bind port.
    #[must_use]
    pub const fn with_proxy_port(mut self, port: u16) -> Self {
        self.proxy.port = port;
        self
    }

    /// Sets the asset origin.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.proxy.origin = origin.into();
        self
    }

    /// Sets the cache directory.
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.proxy.cache_dir = dir.into();
        self
    }
}
