//! Studio configuration.
//!
//! Values come from built-in defaults, then an optional JSON file, then
//! `SKETCHSTUDIO_*` environment variables.

use crate::color::Color;
use crate::scene::{DEFAULT_BACKGROUND, MAX_CANVAS_SIDE};
use crate::surface::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::tools::TEXT_REENTRY_GUARD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Prefix shared by all environment overrides.
pub const ENV_PREFIX: &str = "SKETCHSTUDIO_";

/// Endpoint of a locally running generation proxy.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3030/api/generate-design";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid endpoint URL {url:?}: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("{0}")]
    Validation(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings shared by the sketchpad, the exporter and the generation client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background: Color,
    /// Generation endpoint accepting `{prompt, sketchImage}`.
    pub endpoint: String,
    pub poll_interval_ms: u64,
    /// Re-entry guard for the text tool.
    pub text_guard_ms: u64,
    pub stroke_width: f64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            canvas_width: DEFAULT_WIDTH,
            canvas_height: DEFAULT_HEIGHT,
            background: DEFAULT_BACKGROUND,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            poll_interval_ms: 2000,
            text_guard_ms: TEXT_REENTRY_GUARD.as_millis() as u64,
            stroke_width: 5.0,
        }
    }
}

impl StudioConfig {
    /// Load a config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// `<config dir>/sketchstudio/config.json`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sketchstudio").join("config.json"))
    }

    /// Defaults, overlaid with the default config file when present, then
    /// with the process environment.
    pub fn load_default() -> ConfigResult<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => {
                log::debug!("loading config from {}", path.display());
                Self::load(&path)?
            }
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `SKETCHSTUDIO_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<()> {
        let get = |name: &str| {
            let key = format!("{ENV_PREFIX}{name}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, value)) = get("ENDPOINT") {
            self.endpoint = value;
        }
        if let Some((key, value)) = get("CANVAS_WIDTH") {
            self.canvas_width = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("CANVAS_HEIGHT") {
            self.canvas_height = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("BACKGROUND") {
            self.background = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("TEXT_GUARD_MS") {
            self.text_guard_ms = parse_value(&key, &value)?;
        }
        if let Some((key, value)) = get("STROKE_WIDTH") {
            self.stroke_width = parse_value(&key, &value)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let in_range = |side: u32| (1..=MAX_CANVAS_SIDE).contains(&side);
        if !in_range(self.canvas_width) || !in_range(self.canvas_height) {
            return Err(ConfigError::Validation(format!(
                "canvas dimensions must be between 1 and {}",
                MAX_CANVAS_SIDE
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "poll interval must be > 0".to_string(),
            ));
        }
        if self.stroke_width.is_nan() || self.stroke_width <= 0.0 {
            return Err(ConfigError::Validation(
                "stroke width must be > 0".to_string(),
            ));
        }
        self.endpoint_url()?;
        Ok(())
    }

    pub fn endpoint_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            url: self.endpoint.clone(),
            source,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn text_guard(&self) -> Duration {
        Duration::from_millis(self.text_guard_ms)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StudioConfig::default();
        assert_eq!(config.canvas_width, 800);
        assert_eq!(config.canvas_height, 600);
        assert_eq!(config.background, Color::WHITE);
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.text_guard(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r##"{"canvas_width": 1024, "background": "#fafafa"}"##).unwrap();

        let config = StudioConfig::load(&path).unwrap();
        assert_eq!(config.canvas_width, 1024);
        assert_eq!(config.canvas_height, 600);
        assert_eq!(config.background, Color::rgb(0xfa, 0xfa, 0xfa));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = StudioConfig {
            poll_interval_ms: 250,
            ..StudioConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(StudioConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SKETCHSTUDIO_ENDPOINT", "https://studio.example/api/generate-design"),
            ("SKETCHSTUDIO_POLL_INTERVAL_MS", "750"),
            ("SKETCHSTUDIO_BACKGROUND", "#000"),
        ]
        .into_iter()
        .collect();

        let mut config = StudioConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.endpoint, "https://studio.example/api/generate-design");
        assert_eq!(config.poll_interval_ms, 750);
        assert_eq!(config.background, Color::BLACK);
    }

    #[test]
    fn test_bad_override_is_reported() {
        let mut config = StudioConfig::default();
        let err = config
            .apply_overrides(|key| (key == "SKETCHSTUDIO_CANVAS_WIDTH").then(|| "wide".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_invalid_endpoint() {
        let config = StudioConfig {
            endpoint: "not a url".to_string(),
            ..StudioConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
    }
}
