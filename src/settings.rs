//! Persisted host settings for the goniometer engine.

use crate::dsp::correlation::{
    CorrelationThresholds, DEFAULT_GOOD_THRESHOLD, DEFAULT_MODERATE_THRESHOLD,
};
use crate::dsp::goniometer::{
    ConfigError, DEFAULT_MAX_POINTS, DEFAULT_TRAIL_FRAMES, GoniometerConfig,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

pub fn config_dir() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gonioscope")
}

pub fn config_path() -> PathBuf {
    config_dir().join("settings.json")
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoniometerSettings {
    pub max_points: usize,
    pub trail_max_frames: usize,
    pub good_threshold: f32,
    pub moderate_threshold: f32,
}

impl Default for GoniometerSettings {
    fn default() -> Self {
        Self {
            max_points: DEFAULT_MAX_POINTS,
            trail_max_frames: DEFAULT_TRAIL_FRAMES,
            good_threshold: DEFAULT_GOOD_THRESHOLD,
            moderate_threshold: DEFAULT_MODERATE_THRESHOLD,
        }
    }
}

impl GoniometerSettings {
    /// Builds the engine config. Out-of-range values are rejected, never clamped.
    pub fn to_config(&self) -> Result<GoniometerConfig, ConfigError> {
        let config = GoniometerConfig {
            max_points: self.max_points,
            trail_max_frames: self.trail_max_frames,
            thresholds: CorrelationThresholds {
                good: self.good_threshold,
                moderate: self.moderate_threshold,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<GoniometerConfig> for GoniometerSettings {
    fn from(config: GoniometerConfig) -> Self {
        Self {
            max_points: config.max_points,
            trail_max_frames: config.trail_max_frames,
            good_threshold: config.thresholds.good,
            moderate_threshold: config.thresholds.moderate,
        }
    }
}

#[derive(Debug)]
pub struct SettingsManager {
    path: PathBuf,
    pub data: GoniometerSettings,
}

impl SettingsManager {
    pub fn load_or_default(path: PathBuf) -> Self {
        let data = fs::read_to_string(&path)
            .ok()
            .and_then(|s| {
                serde_json::from_str(&s)
                    .map_err(|e| warn!("[settings] parse error {path:?}: {e}"))
                    .ok()
            })
            .unwrap_or_default();
        Self { path, data }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &GoniometerSettings {
        &self.data
    }

    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating settings directory {dir:?}"))?;
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing settings to {:?}", self.path))
    }
}
