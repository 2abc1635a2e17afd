//! On-disk shell configuration.
//!
//! Persisted as pretty JSON at `<config_dir>/config.json`. Loading is
//! forgiving: a missing or invalid file yields defaults rather than failing
//! startup, and the modules directory is created on the way in.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ShellError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the user's script modules.
    #[serde(default)]
    pub modules_dir: PathBuf,
    /// Directory aliases for `setdir` / `gotodir`.
    #[serde(default)]
    pub dirs: HashMap<String, String>,
    #[serde(default)]
    pub last_dir: String,
    #[serde(default)]
    pub theme: String,
    #[serde(default)]
    pub workspace: String,

    /// Directory this config was loaded from; `save` writes back here.
    #[serde(skip)]
    dir: PathBuf,
}

/// Platform config directory: `%APPDATA%\modsh` on Windows when APPDATA is
/// set, otherwise `$HOME/.modsh`.
pub fn config_dir() -> PathBuf {
    #[cfg(windows)]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata).join("modsh");
    }
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".modsh"),
        Err(_) => PathBuf::from(".modsh"),
    }
}

/// Path of the persistent REPL history, next to the config file.
pub fn history_file() -> PathBuf {
    config_dir().join("history")
}

impl Config {
    /// Load from the platform config directory.
    pub fn load() -> Result<Self, ShellError> {
        Self::load_from(&config_dir())
    }

    /// Load from `dir`, creating it and the modules directory when missing.
    pub fn load_from(dir: &Path) -> Result<Self, ShellError> {
        fs::create_dir_all(dir)?;
        let file = dir.join("config.json");
        let mut cfg = match fs::read(&file) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                log::warn!("ignoring invalid config {}: {e}", file.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        };
        cfg.dir = dir.to_path_buf();
        if cfg.modules_dir.as_os_str().is_empty() {
            cfg.modules_dir = dir.join("modules");
        }
        if cfg.theme.is_empty() {
            cfg.theme = "default".to_string();
        }
        fs::create_dir_all(&cfg.modules_dir)?;
        Ok(cfg)
    }

    /// Write back to the directory this config was loaded from.
    pub fn save(&self) -> Result<(), ShellError> {
        let dir = if self.dir.as_os_str().is_empty() {
            config_dir()
        } else {
            self.dir.clone()
        };
        self.save_to(&dir)
    }

    pub fn save_to(&self, dir: &Path) -> Result<(), ShellError> {
        fs::create_dir_all(dir)?;
        let bytes = serde_json::to_vec_pretty(self)?;
        fs::write(dir.join("config.json"), bytes)?;
        Ok(())
    }
}
