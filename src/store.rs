//! Persistent key-value settings.
//!
//! Values are plain strings under fixed keys. The application only ever
//! creates or overwrites entries; nothing here deletes them.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::Result;

/// Last saved spot price, fixed two-decimal text.
pub const GOLD_SPOT: &str = "goldSpot";
/// Last saved discount percentage text.
pub const DISCOUNT_PCT: &str = "discountPct";
/// Four-character unlock PIN.
pub const APP_PIN: &str = "appPIN";
/// Legacy display toggle for the pre-1933 section.
pub const SHOW_PRE_1933: &str = "showPre33";
/// Legacy display toggle for the Gold Eagle section.
pub const SHOW_GOLD_EAGLE: &str = "showAGE";

/// String-valued key-value storage that survives across sessions.
pub trait SettingsStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: SettingsStore + ?Sized> SettingsStore for &mut S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// Display toggles kept readable for settings written by older layouts.
///
/// Current rendering always shows both sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyFlags {
    pub show_pre_1933: bool,
    pub show_gold_eagle: bool,
}

impl LegacyFlags {
    /// Reads both flags; only the exact value `"1"` counts as set.
    #[must_use]
    pub fn read(store: &impl SettingsStore) -> Self {
        let flag = |key| store.get(key).is_some_and(|v| v == "1");
        Self {
            show_pre_1933: flag(SHOW_PRE_1933),
            show_gold_eagle: flag(SHOW_GOLD_EAGLE),
        }
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert for seeding test fixtures.
    #[must_use]
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store backed by a flat TOML table on disk.
///
/// The whole table is read once on open; every `set` rewrites the file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        log::debug!("Opened settings at {} ({} keys)", path.display(), values.len());
        Ok(Self { path, values })
    }

    /// Returns the default settings location under the user data directory.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gold-melt")
            .join("settings.toml")
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the table atomically (write tmp + rename).
    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, toml::to_string(&self.values)?)?;

        // The PIN lives here in clear text; keep the file private to the user
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&tmp_path, perms)?;
        }

        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.persist()
    }
}
