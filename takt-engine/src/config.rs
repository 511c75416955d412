use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::duration::DurationResolver;
use crate::pace::PaceThresholds;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaktConfig {
    /// Base URL of the takt API server, e.g. "http://localhost:8000/api"
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Pace band multipliers applied to the category average.
    #[serde(default = "default_pace_fast")]
    pub pace_fast: f64,
    #[serde(default = "default_pace_normal")]
    pub pace_normal: f64,
    #[serde(default = "default_pace_slow")]
    pub pace_slow: f64,

    /// Durations above this many hours trigger a confirmation prompt
    /// instead of being rejected.
    #[serde(default = "default_long_session_hours")]
    pub long_session_hours: i64,

    /// Quiet window before a filter change actually fires its fetches,
    /// coalescing rapid successive changes into a single request.
    #[serde(default = "default_filter_debounce_ms")]
    pub filter_debounce_ms: u64,
}

fn default_api_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_pace_fast() -> f64 {
    0.8
}

fn default_pace_normal() -> f64 {
    1.2
}

fn default_pace_slow() -> f64 {
    1.5
}

fn default_long_session_hours() -> i64 {
    24
}

fn default_filter_debounce_ms() -> u64 {
    120
}

impl Default for TaktConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            pace_fast: default_pace_fast(),
            pace_normal: default_pace_normal(),
            pace_slow: default_pace_slow(),
            long_session_hours: default_long_session_hours(),
            filter_debounce_ms: default_filter_debounce_ms(),
        }
    }
}

impl TaktConfig {
    pub fn config_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Cannot determine config directory")?
            .join("takt")
            .join("config.toml"))
    }

    /// Load config from disk. Returns default config if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        Ok(config)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)?;
        std::fs::write(&path, raw)?;
        Ok(())
    }

    pub fn pace_thresholds(&self) -> PaceThresholds {
        PaceThresholds {
            fast: self.pace_fast,
            normal: self.pace_normal,
            slow: self.pace_slow,
        }
    }

    pub fn duration_resolver(&self) -> DurationResolver {
        DurationResolver::new(time::Duration::hours(self.long_session_hours))
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }
}
