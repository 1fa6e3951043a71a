use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::analysis::DEFAULT_STEP_SECS;
use crate::backend::BackendConfig;
use crate::playback::{DEFAULT_PLAYBACK_RATE, DEFAULT_WAVEFORM_WIDTH};

/// Application configuration loaded from TOML config file.
/// All fields have sensible defaults, so the config file is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Analysis and media backend endpoints.
    pub backend: BackendConfig,
    /// Chart geometry used by `render` and `compare`.
    pub chart: ChartConfig,
    /// Initial waveform width and playback rate for both transports.
    pub playback: PlaybackConfig,
    /// Seconds between consecutive analysis samples.
    pub sample_step_secs: f64,
    /// Number of parallel workers for `report`. 0 = auto-detect (cores / 2, min 1).
    pub workers: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            chart: ChartConfig::default(),
            playback: PlaybackConfig::default(),
            sample_step_secs: DEFAULT_STEP_SECS,
            workers: 0,
        }
    }
}

/// Chart size in pixels.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: f64,
    pub height: f64,
    /// Space reserved around the plot area for axes and glyphs.
    pub margin: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 320.0,
            margin: 40.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub width_px: u32,
    pub playback_rate: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            width_px: DEFAULT_WAVEFORM_WIDTH,
            playback_rate: DEFAULT_PLAYBACK_RATE,
        }
    }
}

impl AppConfig {
    /// Load config from `~/.config/riffcheck/config.toml`.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from an explicit path.
    /// Logs a warning if the file exists but can't be parsed.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// Sample step, falling back to the default for non-positive or
    /// non-finite values.
    pub fn resolve_step(&self) -> f64 {
        if self.sample_step_secs.is_finite() && self.sample_step_secs > 0.0 {
            self.sample_step_secs
        } else {
            DEFAULT_STEP_SECS
        }
    }

    /// Resolve worker count: 0 → auto-detect (cores / 2, min 1).
    pub fn resolve_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2);
            (cores / 2).max(1)
        }
    }

    /// Get the config file path.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.sample_step_secs, 0.5);
        assert_eq!(config.chart.width, 800.0);
        assert_eq!(config.playback.width_px, DEFAULT_WAVEFORM_WIDTH);
    }

    #[test]
    fn test_partial_sections() {
        let toml = r#"
            sample_step_secs = 0.25

            [backend]
            analysis_base_url = "https://analysis.example.com/api"

            [chart]
            width = 1200.0
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.resolve_step(), 0.25);
        assert_eq!(config.backend.analysis_base_url, "https://analysis.example.com/api");
        // Unset keys keep their defaults
        assert_eq!(config.backend.media_base_url, BackendConfig::default().media_base_url);
        assert_eq!(config.chart.width, 1200.0);
        assert_eq!(config.chart.height, 320.0);
    }

    #[test]
    fn test_non_positive_step_falls_back() {
        let config = AppConfig {
            sample_step_secs: 0.0,
            ..Default::default()
        };
        assert_eq!(config.resolve_step(), DEFAULT_STEP_SECS);

        let config: AppConfig = toml::from_str("sample_step_secs = inf").unwrap();
        assert_eq!(config.resolve_step(), DEFAULT_STEP_SECS);
    }

    #[test]
    fn test_resolve_workers() {
        let config = AppConfig {
            workers: 3,
            ..Default::default()
        };
        assert_eq!(config.resolve_workers(), 3);
        assert!(AppConfig::default().resolve_workers() >= 1);
    }

    #[test]
    fn test_load_from_bad_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "sample_step_secs = \"fast\"").unwrap();
        let config = AppConfig::load_from(&path);
        assert_eq!(config.sample_step_secs, DEFAULT_STEP_SECS);
    }
}
