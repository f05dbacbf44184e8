use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;

use crate::scan::request::{CoordinateSystem, IdPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    #[serde(default)]
    pub coordinates: CoordinateSystem,
    #[serde(default)]
    pub id_policy: IdPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout", deserialize_with = "duration")]
    pub request_timeout: Duration,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(5)
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_status_interval", deserialize_with = "duration")]
    pub status_interval: Duration,
    #[serde(default = "default_schedule_interval", deserialize_with = "duration")]
    pub schedule_interval: Duration,
    #[serde(default = "default_sidebar_interval", deserialize_with = "duration")]
    pub sidebar_interval: Duration,
    #[serde(default = "default_history_interval", deserialize_with = "duration")]
    pub history_interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            status_interval: default_status_interval(),
            schedule_interval: default_schedule_interval(),
            sidebar_interval: default_sidebar_interval(),
            history_interval: default_history_interval(),
        }
    }
}

fn default_status_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_schedule_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_sidebar_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_history_interval() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

/// Humantime durations (`10s`, `500ms`), rejecting zero since intervals must tick.
fn duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let parsed = humantime::parse_duration(&raw).map_err(serde::de::Error::custom)?;
    if parsed.is_zero() {
        return Err(serde::de::Error::custom("duration must be greater than zero"));
    }
    Ok(parsed)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config = Config::from_yaml("control:\n  base_url: http://srt.local:8080\n").unwrap();
        assert_eq!(config.control.base_url, "http://srt.local:8080");
        assert_eq!(config.control.request_timeout, Duration::from_secs(5));
        assert_eq!(config.polling.status_interval, Duration::from_secs(10));
        assert_eq!(config.polling.sidebar_interval, Duration::from_secs(30));
        assert_eq!(config.polling.history_interval, Duration::from_secs(30));
        assert_eq!(config.station.coordinates, CoordinateSystem::Equatorial);
        assert_eq!(config.station.id_policy, IdPolicy::ServerAssigned);
    }

    #[test]
    fn durations_are_humantime() {
        let config = Config::from_yaml(
            "station:
  coordinates: galactic
  id_policy: client_provisional
polling:
  status_interval: 2s 500ms
",
        )
        .unwrap();
        assert_eq!(config.polling.status_interval, Duration::from_millis(2500));
        assert_eq!(config.station.coordinates, CoordinateSystem::Galactic);
        assert_eq!(config.station.id_policy, IdPolicy::ClientProvisional);
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(Config::from_yaml("polling:\n  status_interval: 0s\n").is_err());
    }
}
