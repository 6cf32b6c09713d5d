//! Server configuration from the environment.

use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

/// Default model version used for sketch-to-design predictions.
pub const DEFAULT_MODEL_VERSION: &str =
    "ac732df83cea7fff18b8472768c88ad041fa750ff7682a21affe81863cbe77e4";

const DEFAULT_ADDR: &str = "0.0.0.0:3030";
const DEFAULT_UPSTREAM: &str = "https://api.replicate.com";
const DEFAULT_PREDICTION_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Base URL of the predictions API.
    pub upstream: Url,
    /// `None` makes every generation request fail with 500.
    pub token: Option<String>,
    /// Externally visible base URL used in rewritten poll URLs. Relative
    /// poll URLs are returned when unset.
    pub public_url: Option<Url>,
    pub model_version: String,
    /// How long a created prediction stays pollable through the proxy.
    pub prediction_ttl: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let addr = get("SKETCHSTUDIO_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr.parse().map_err(|_| ConfigError::Invalid {
            key: "SKETCHSTUDIO_ADDR",
            value: addr.clone(),
        })?;

        let upstream = get("SKETCHSTUDIO_UPSTREAM").unwrap_or_else(|| DEFAULT_UPSTREAM.to_string());
        let upstream = Url::parse(&upstream).map_err(|_| ConfigError::Invalid {
            key: "SKETCHSTUDIO_UPSTREAM",
            value: upstream.clone(),
        })?;

        let public_url = get("SKETCHSTUDIO_PUBLIC_URL")
            .map(|url| {
                Url::parse(&url).map_err(|_| ConfigError::Invalid {
                    key: "SKETCHSTUDIO_PUBLIC_URL",
                    value: url.clone(),
                })
            })
            .transpose()?;

        let ttl = get("SKETCHSTUDIO_PREDICTION_TTL_SECS");
        let prediction_ttl = match ttl {
            Some(secs) => secs.parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "SKETCHSTUDIO_PREDICTION_TTL_SECS",
                value: secs.clone(),
            })?,
            None => DEFAULT_PREDICTION_TTL_SECS,
        };

        Ok(Self {
            addr,
            upstream,
            token: get("REPLICATE_API_TOKEN"),
            public_url,
            model_version: get("SKETCHSTUDIO_MODEL_VERSION")
                .unwrap_or_else(|| DEFAULT_MODEL_VERSION.to_string()),
            prediction_ttl: Duration::from_secs(prediction_ttl),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.addr.port(), 3030);
        assert_eq!(config.upstream.as_str(), "https://api.replicate.com/");
        assert!(config.token.is_none());
        assert_eq!(config.model_version, DEFAULT_MODEL_VERSION);
        assert_eq!(config.prediction_ttl, Duration::from_secs(1800));
    }

    #[test]
    fn test_prediction_ttl() {
        let lookup = |value: &'static str| {
            move |k: &str| (k == "SKETCHSTUDIO_PREDICTION_TTL_SECS").then(|| value.to_string())
        };
        let config = ServerConfig::from_lookup(lookup("90")).unwrap();
        assert_eq!(config.prediction_ttl, Duration::from_secs(90));
        assert!(ServerConfig::from_lookup(lookup("soon")).is_err());
    }

    #[test]
    fn test_blank_token_is_unset() {
        let config =
            ServerConfig::from_lookup(|k| (k == "REPLICATE_API_TOKEN").then(|| " ".to_string()))
                .unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_invalid_addr() {
        let err = ServerConfig::from_lookup(|k| (k == "SKETCHSTUDIO_ADDR").then(|| "nope".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("SKETCHSTUDIO_ADDR"));
    }
}
