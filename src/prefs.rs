use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories_next::ProjectDirs;

use crate::error::Error;

const QUALIFIER: &str = "org";
const ORGANIZATION: &str = "qrlabel";
const APPLICATION: &str = "qrlabel-pdf";
const PREFS_FILE: &str = "prefs.json";

/// Overrides the platform config directory.
pub const CONFIG_DIR_ENV: &str = "QRLABEL_CONFIG_DIR";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrefKey {
    UrlPrefix,
    LabelWidth,
    LabelHeight,
}

impl PrefKey {
    pub fn as_str(self) -> &'static str {
        match self {
            PrefKey::UrlPrefix => "google-form-url",
            PrefKey::LabelWidth => "label-width",
            PrefKey::LabelHeight => "label-height",
        }
    }
}

/// String preferences persisted as a flat JSON object. Every `set` writes
/// through to disk.
#[derive(Debug)]
pub struct PrefsStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl PrefsStore {
    /// Store at `$QRLABEL_CONFIG_DIR/prefs.json`, or the platform config dir.
    pub fn open_default() -> Result<Self, Error> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
                .map(|p| p.config_dir().to_path_buf())
                .ok_or_else(|| Error::Prefs("no config directory for this platform".into()))?,
        };
        Ok(Self::open(dir.join(PREFS_FILE)))
    }

    /// A missing or unreadable file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable preferences {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                log::warn!("Cannot read preferences {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: PrefKey) -> Option<&str> {
        self.values.get(key.as_str()).map(String::as_str)
    }

    pub fn set(&mut self, key: PrefKey, value: &str) -> Result<(), Error> {
        if self.get(key) == Some(value) {
            return Ok(());
        }
        self.values.insert(key.as_str().to_string(), value.to_string());
        self.flush()
    }

    fn flush(&self) -> Result<(), Error> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| Error::Prefs(e.to_string()))?;
        fs::write(&self.path, json)?;
        log::debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}
