use flowcanvas_graph::{PanelLayoutConfig, PanelWidths, ZoomConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::CANVAS_TARGET;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid {0} limits in settings file")]
    Invalid(&'static str),
    #[error("No configuration directory on this platform")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    pub zoom: ZoomConfig,
    pub panels: PanelLayoutConfig,
    pub debounce: DebounceSettings,
    /// Longest time overlay placement stays frozen while a panel opens.
    pub resync_max_suspend_ms: u64,
    /// Last panel widths, when the host chose to persist them.
    pub panel_widths: Option<PanelWidths>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceSettings {
    pub short_field_ms: u64,
    pub multi_line_field_ms: u64,
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self {
            short_field_ms: 200,
            multi_line_field_ms: 300,
        }
    }
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            zoom: ZoomConfig::default(),
            panels: PanelLayoutConfig::default(),
            debounce: DebounceSettings::default(),
            resync_max_suspend_ms: 4000,
            panel_widths: None,
        }
    }
}

impl CanvasSettings {
    pub fn resync_max_suspend(&self) -> Duration {
        Duration::from_millis(self.resync_max_suspend_ms)
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("flowcanvas").join("settings.json"))
    }

    /// Load from the platform config directory, falling back to defaults.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            tracing::warn!(target: CANVAS_TARGET, "No config directory, using default settings");
            return Self::default();
        };
        if !path.exists() {
            tracing::info!(target: CANVAS_TARGET, "Settings file not found, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => {
                tracing::info!(target: CANVAS_TARGET, "Settings loaded from {:?}", path);
                settings
            }
            Err(e) => {
                tracing::error!(target: CANVAS_TARGET, "Failed to load settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject limits the zoom and panel negotiators cannot work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.zoom.is_valid() {
            return Err(SettingsError::Invalid("zoom"));
        }
        if !self.panels.is_valid() {
            return Err(SettingsError::Invalid("panel"));
        }
        Ok(())
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::default_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
