//! Settings for the `tsx` tool, read from the user config directory

use anyhow::{Context, Result};
use bevy_tsx_core::{AssetCheck, MissingTilePolicy, DEFAULT_CELL_SIZE};
use directories::ProjectDirs;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";

/// Why a settings file was not used
#[derive(Debug)]
pub enum SettingsError {
    /// The platform has no per-user config directory
    NoConfigDir,
    Unreadable { path: PathBuf, message: String },
    Malformed { path: PathBuf, message: String },
    UnknownLogLevel(String),
    ZeroCellSize,
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::NoConfigDir => write!(f, "No per-user config directory on this platform"),
            SettingsError::Unreadable { path, message } => {
                write!(f, "Cannot read {}: {}", path.display(), message)
            }
            SettingsError::Malformed { path, message } => {
                write!(f, "{} is not a valid settings file: {}", path.display(), message)
            }
            SettingsError::UnknownLogLevel(level) => write!(
                f,
                "Unknown log_level '{}', expected off, error, warn, info, debug or trace",
                level
            ),
            SettingsError::ZeroCellSize => write!(f, "cell_size must be at least 1"),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Persistent settings for the `tsx` tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory image sources are resolved against instead of the
    /// tileset file's own directory
    pub asset_root: Option<PathBuf>,
    /// Check referenced images during `validate`
    pub verify_assets: bool,
    /// Also decode images and compare their size
    pub check_dimensions: bool,
    /// Pixel size of one layout cell
    pub cell_size: u32,
    pub missing_tile_policy: MissingTilePolicy,
    /// One of off, error, warn, info, debug, trace
    pub log_level: String,
    /// Also write the log to this file
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            asset_root: None,
            verify_assets: false,
            check_dimensions: true,
            cell_size: DEFAULT_CELL_SIZE,
            missing_tile_policy: MissingTilePolicy::Error,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Settings {
    /// Per-user directory holding the settings file
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "bevy_tsx", "bevy_tsx").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join(SETTINGS_FILE))
    }

    /// Load settings from `path`, or from the config directory when `None`.
    ///
    /// Falls back to defaults and hands back the error, since logging is not
    /// set up yet when settings are read.
    pub fn load(path: Option<&Path>) -> (Self, Option<SettingsError>) {
        let result = match path {
            Some(path) => Self::load_from_file(path),
            None => Self::settings_path()
                .ok_or(SettingsError::NoConfigDir)
                .and_then(|path| Self::load_from_file(&path)),
        };
        match result {
            Ok(settings) => (settings, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Load and check settings from a file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let settings: Self =
            serde_json::from_str(&content).map_err(|e| SettingsError::Malformed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        settings.check()?;
        Ok(settings)
    }

    /// Reject values that parse as JSON but make no sense to the tool
    pub fn check(&self) -> Result<(), SettingsError> {
        if self.log_level.parse::<LevelFilter>().is_err() {
            return Err(SettingsError::UnknownLogLevel(self.log_level.clone()));
        }
        if self.cell_size == 0 {
            return Err(SettingsError::ZeroCellSize);
        }
        Ok(())
    }

    /// Write settings to the config directory and return the file written
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Log level, `Info` when the setting is not recognised
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    /// Which asset check `validate` runs, if any
    pub fn asset_check(&self) -> Option<AssetCheck> {
        if !self.verify_assets {
            None
        } else if self.check_dimensions {
            Some(AssetCheck::Dimensions)
        } else {
            Some(AssetCheck::Exists)
        }
    }
}
