// Viewer tuning loaded from JSON.
//
// Lookup order:
// 1) explicit path (--config)
// 2) env TOUR_PANORAMA_CONFIG
// 3) <exe_dir>/assets/viewer.json
// 4) ./assets/viewer.json
// Nothing found → built-in defaults.

use crate::error::ConfigError;
use crate::hotspot::{default_hotspots, Hotspot, Pulse};
use crate::view_state::{DragSensitivity, ZOOM_RESOLUTION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "TOUR_PANORAMA_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub drag_yaw_per_px: f64,
    pub drag_pitch_per_px: f64,
    pub zoom_step: f64,
    /// Degrees added to yaw per animation frame while auto-rotating.
    pub auto_rotate_step_deg: f64,
    pub autoplay: bool,
    pub pulse: Pulse,
    pub hotspots: Vec<Hotspot>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            drag_yaw_per_px: 0.3,
            drag_pitch_per_px: 0.2,
            zoom_step: 0.2,
            auto_rotate_step_deg: 0.2,
            autoplay: true,
            pulse: Pulse::default(),
            hotspots: default_hotspots(),
        }
    }
}

impl ViewerConfig {
    pub fn drag_sensitivity(&self) -> DragSensitivity {
        DragSensitivity {
            yaw_per_px: self.drag_yaw_per_px,
            pitch_per_px: self.drag_pitch_per_px,
        }
    }

    pub fn from_json(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let cfg: ViewerConfig = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, path)
    }

    /// Resolves the config file and loads it, or returns defaults when none exists.
    /// An explicitly named file that cannot be read is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(p) = explicit {
            log::info!("using config {}", p.display());
            return Self::from_file(p);
        }
        if let Ok(v) = std::env::var(CONFIG_ENV) {
            if !v.trim().is_empty() {
                let p = PathBuf::from(v);
                log::info!("using config {} (from {CONFIG_ENV})", p.display());
                return Self::from_file(&p);
            }
        }
        match find_config_file() {
            Some(p) => {
                log::info!("using config {}", p.display());
                Self::from_file(&p)
            }
            None => {
                log::debug!("no viewer.json found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = [
            ("drag_yaw_per_px", self.drag_yaw_per_px),
            ("drag_pitch_per_px", self.drag_pitch_per_px),
            ("zoom_step", self.zoom_step),
            ("auto_rotate_step_deg", self.auto_rotate_step_deg),
            ("pulse.frequency_hz", self.pulse.frequency_hz),
        ];
        for (name, v) in rates {
            if !v.is_finite() || v <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be a positive number, got {v}")));
            }
        }
        if self.zoom_step < ZOOM_RESOLUTION {
            return Err(ConfigError::Invalid(format!(
                "zoom_step must be at least {ZOOM_RESOLUTION}, got {}",
                self.zoom_step
            )));
        }
        if !self.pulse.base_radius.is_finite() || !self.pulse.amplitude.is_finite() {
            return Err(ConfigError::Invalid("pulse radius must be finite".into()));
        }
        if let Some(h) = self.hotspots.iter().find(|h| !h.is_in_unit_square()) {
            return Err(ConfigError::Invalid(format!(
                "hotspot \"{}\" at ({}, {}) is outside the unit square",
                h.label, h.x, h.y
            )));
        }
        Ok(())
    }
}

fn find_config_file() -> Option<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("viewer.json");
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join("viewer.json");
    if p.exists() {
        return Some(p);
    }

    None
}
