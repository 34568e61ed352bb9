use crate::key_gestures::direction::{is_valid_threshold, DEFAULT_THRESHOLD_PX};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "gesture_settings.json";
pub const DEFAULT_GESTURE_DIR: &str = "gestures";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GestureSettings {
    /// Master switch. When `false` the manager never attaches.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// When enabled the logger is initialised at debug level.
    /// Defaults to `false` when the field is missing in the settings file.
    #[serde(default)]
    pub debug_logging: bool,
    /// Pointer travel in pixels below which a gesture resolves to the
    /// center slot.
    #[serde(default = "default_threshold_px")]
    pub threshold_px: f64,
    /// Directory holding one JSON document per gesture profile. Relative
    /// paths are resolved against the settings file's directory.
    #[serde(default = "default_gesture_dir")]
    pub gesture_dir: String,
    /// Optional log file. Logs only go to stderr when absent.
    #[serde(default)]
    pub log_file: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_threshold_px() -> f64 {
    DEFAULT_THRESHOLD_PX
}

fn default_gesture_dir() -> String {
    DEFAULT_GESTURE_DIR.to_string()
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            debug_logging: false,
            threshold_px: default_threshold_px(),
            gesture_dir: default_gesture_dir(),
            log_file: None,
        }
    }
}

impl GestureSettings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut settings: Self = serde_json::from_str(&content)?;
        if !is_valid_threshold(settings.threshold_px) {
            tracing::warn!(
                "threshold_px {} is invalid; using default {}",
                settings.threshold_px,
                DEFAULT_THRESHOLD_PX
            );
            settings.threshold_px = DEFAULT_THRESHOLD_PX;
        }
        Ok(settings)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Gesture directory, resolved relative to the settings file.
    pub fn gesture_dir(&self, settings_path: &Path) -> PathBuf {
        resolve_relative(settings_path, &self.gesture_dir)
    }

    pub fn log_file(&self, settings_path: &Path) -> Option<PathBuf> {
        self.log_file
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .map(|path| resolve_relative(settings_path, path))
    }
}

fn resolve_relative(settings_path: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let base_dir = settings_path.parent().unwrap_or_else(|| Path::new("."));
    base_dir.join(path)
}
