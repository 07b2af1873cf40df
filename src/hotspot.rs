// Static overlay markers and their pulse animation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotspotCategory {
    Viewpoint,
    Info,
    Photo,
    Amenity,
    #[serde(other)]
    Other,
}

impl HotspotCategory {
    /// i18n key of the category name.
    pub fn label_key(self) -> &'static str {
        match self {
            HotspotCategory::Viewpoint => "hotspot.viewpoint",
            HotspotCategory::Info => "hotspot.info",
            HotspotCategory::Photo => "hotspot.photo",
            HotspotCategory::Amenity => "hotspot.amenity",
            HotspotCategory::Other => "hotspot.other",
        }
    }

    /// RGB used for the marker ring.
    pub fn color(self) -> [u8; 3] {
        match self {
            HotspotCategory::Viewpoint => [59, 130, 246],
            HotspotCategory::Info => [16, 185, 129],
            HotspotCategory::Photo => [236, 72, 153],
            HotspotCategory::Amenity => [245, 158, 11],
            HotspotCategory::Other => [255, 255, 255],
        }
    }
}

/// A decorative marker at a normalised position over the output surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub category: HotspotCategory,
}

impl Hotspot {
    pub fn new(x: f64, y: f64, label: impl Into<String>, category: HotspotCategory) -> Self {
        Self {
            x,
            y,
            label: label.into(),
            category,
        }
    }

    pub fn is_in_unit_square(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

pub fn default_hotspots() -> Vec<Hotspot> {
    vec![
        Hotspot::new(0.3, 0.4, "Main View", HotspotCategory::Viewpoint),
        Hotspot::new(0.6, 0.5, "Info Point", HotspotCategory::Info),
        Hotspot::new(0.8, 0.3, "Photo Spot", HotspotCategory::Photo),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pulse {
    pub base_radius: f64,
    pub amplitude: f64,
    pub frequency_hz: f64,
}

impl Default for Pulse {
    fn default() -> Self {
        Self {
            base_radius: 8.0,
            amplitude: 3.0,
            frequency_hz: 0.8,
        }
    }
}

impl Pulse {
    /// Marker radius in pixels at wall-clock time `t`.
    pub fn radius_at(&self, t: Duration) -> f64 {
        let phase = std::f64::consts::TAU * self.frequency_hz * t.as_secs_f64();
        (self.base_radius + self.amplitude * phase.sin()).max(0.0)
    }
}
