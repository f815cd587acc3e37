//! Player configuration.
//!
//! Stored as JSON. The path comes from `BIOCINE_CONFIG`, falling back to
//! `biocine.json` in the working directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::cine::offset::OffsetStacker;
use crate::cine::rewind::RewindSettings;
use crate::cine::viewport::ViewportWindower;

pub const CONFIG_ENV: &str = "BIOCINE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "biocine.json";
/// Largest snapshot width or height accepted from a config file.
pub const MAX_SNAPSHOT_SIDE: u32 = 8192;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CineConfig {
    pub playback: PlaybackConfig,
    pub rewind: RewindConfig,
    pub report: ReportConfig,
}

/// Reveal pacing and lane layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Reveal interval in milliseconds for a fresh lane.
    pub default_speed: u32,
    pub min_speed: u32,
    pub max_speed: u32,
    /// Number of samples kept in the rolling x window.
    pub window_samples: usize,
    pub y_padding: f64,
    /// Offset added per occupant when a signal is loaded.
    pub join_spacing: f64,
    /// Offset added per move into a lane.
    pub move_step: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_speed: 10,
            min_speed: 5,
            max_speed: 20,
            window_samples: 600,
            y_padding: 0.01,
            join_spacing: 2.0,
            move_step: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewindConfig {
    pub initial: f64,
    pub step: f64,
    pub slide_threshold: f64,
    /// Rewind timer interval as a multiple of the lane speed.
    pub interval_factor: u32,
}

impl Default for RewindConfig {
    fn default() -> Self {
        let settings = RewindSettings::default();
        Self {
            initial: settings.initial,
            step: settings.step,
            slide_threshold: settings.slide_threshold,
            interval_factor: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub snapshot_width: u32,
    pub snapshot_height: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("reports"),
            snapshot_width: 800,
            snapshot_height: 400,
        }
    }
}

impl CineConfig {
    pub fn validate(&self) -> Result<()> {
        let p = &self.playback;
        if p.min_speed == 0 || p.min_speed > p.max_speed {
            bail!("speed bounds {}..={} are invalid", p.min_speed, p.max_speed);
        }
        if !(p.min_speed..=p.max_speed).contains(&p.default_speed) {
            bail!(
                "default speed {} outside {}..={}",
                p.default_speed,
                p.min_speed,
                p.max_speed
            );
        }
        if p.window_samples == 0 {
            bail!("window_samples must be positive");
        }
        let r = &self.rewind;
        if r.step <= 0.0 || r.initial < 0.0 || r.interval_factor == 0 {
            bail!("rewind step and interval factor must be positive");
        }
        let (w, h) = (self.report.snapshot_width, self.report.snapshot_height);
        if w == 0 || h == 0 {
            bail!("snapshot size must be positive");
        }
        if w > MAX_SNAPSHOT_SIDE || h > MAX_SNAPSHOT_SIDE {
            bail!("snapshot size {w}x{h} exceeds {MAX_SNAPSHOT_SIDE}x{MAX_SNAPSHOT_SIDE}");
        }
        Ok(())
    }

    pub fn rewind_settings(&self) -> RewindSettings {
        RewindSettings {
            initial: self.rewind.initial,
            step: self.rewind.step,
            slide_threshold: self.rewind.slide_threshold,
        }
    }

    pub fn windower(&self) -> ViewportWindower {
        ViewportWindower::new(self.playback.window_samples, self.playback.y_padding)
    }

    pub fn stacker(&self) -> OffsetStacker {
        OffsetStacker::new(self.playback.join_spacing, self.playback.move_step)
    }
}

pub fn default_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load configuration from a JSON file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns default config.
pub fn load_config(path: &Path) -> CineConfig {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return CineConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<CineConfig>(&contents) {
            Ok(config) => match config.validate() {
                Ok(()) => {
                    log::info!(
                        "load_config: Loaded config - speed {} ms ({}..={}), window {}",
                        config.playback.default_speed,
                        config.playback.min_speed,
                        config.playback.max_speed,
                        config.playback.window_samples
                    );
                    config
                }
                Err(e) => {
                    log::warn!("load_config: Invalid config: {}, using defaults", e);
                    CineConfig::default()
                }
            },
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}, using defaults", e);
                CineConfig::default()
            }
        },
        Err(e) => {
            log::warn!(
                "load_config: Failed to read config file: {}, using defaults",
                e
            );
            CineConfig::default()
        }
    }
}

/// Save configuration as pretty-printed JSON, creating parent directories.
pub fn save_config(config: &CineConfig, path: &Path) -> Result<()> {
    log::info!("save_config: Saving to {:?}", path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CineConfig::default();
        assert_eq!(config.playback.default_speed, 10);
        assert_eq!((config.playback.min_speed, config.playback.max_speed), (5, 20));
        assert_eq!(config.playback.window_samples, 600);
        assert_eq!(config.rewind.interval_factor, 10);
        assert_eq!(config.report.output_dir, PathBuf::from("reports"));
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, r#"{ "playback": { "default_speed": 15 } }"#).unwrap();
        let config = load_config(&path);
        assert_eq!(config.playback.default_speed, 15);
        assert_eq!(config.playback.join_spacing, 2.0);
        assert_eq!(config.rewind.step, 0.001);
    }

    #[test]
    fn test_invalid_or_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path).playback.default_speed, 10);

        std::fs::write(&path, r#"{ "playback": { "default_speed": 50 } }"#).unwrap();
        assert_eq!(load_config(&path).playback.default_speed, 10);

        let missing = path.with_file_name("nope.json");
        assert_eq!(load_config(&missing).playback.max_speed, 20);
    }

    #[test]
    fn test_oversized_snapshot_is_rejected() {
        let mut config = CineConfig::default();
        config.report.snapshot_width = MAX_SNAPSHOT_SIDE;
        config.validate().unwrap();
        config.report.snapshot_height = MAX_SNAPSHOT_SIDE + 1;
        assert!(config.validate().is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, r#"{ "report": { "snapshot_width": 100000 } }"#).unwrap();
        assert_eq!(load_config(&path).report.snapshot_width, 800);
    }

    #[test]
    fn test_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(DEFAULT_CONFIG_FILE);
        let mut config = CineConfig::default();
        config.playback.move_step = 5.0;
        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).playback.move_step, 5.0);
    }
}
