use crate::error::{ConfigErrorKind, InfraError};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// Where GLOBAL event deliveries run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// On the publishing thread.
    #[default]
    Inline,
    /// On the tokio blocking pool.
    Tokio,
    /// Queued and drained once per client tick.
    Tick,
}

impl FromStr for ExecutorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inline" => Ok(ExecutorKind::Inline),
            "tokio" => Ok(ExecutorKind::Tokio),
            "tick" => Ok(ExecutorKind::Tick),
            other => Err(format!("unknown executor '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaypointsConfig {
    /// Whether the waypoint mod is present.
    pub enabled: bool,
    pub prefix: String,
    pub command: String,
}

impl Default for WaypointsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            prefix: ".".to_string(),
            command: "waypoints".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hang every command under the `collar` literal.
    pub prefixed: bool,
    pub executor: ExecutorKind,
    pub player_name: String,
    pub tick_millis: u64,
    pub log_filter: String,
    pub waypoints: WaypointsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefixed: true,
            executor: ExecutorKind::Inline,
            player_name: "Steve".to_string(),
            tick_millis: 50,
            log_filter: "info".to_string(),
            waypoints: WaypointsConfig::default(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, InfraError> {
        let path = path.as_ref();
        let wrap = |source| InfraError::Config {
            path: path.to_path_buf(),
            source,
        };
        let data = std::fs::read_to_string(path).map_err(|e| wrap(ConfigErrorKind::Read(e)))?;
        let cfg: Self = toml::from_str(&data).map_err(|e| wrap(ConfigErrorKind::Parse(e)))?;
        Ok(cfg)
    }

    pub fn from_env() -> Result<Self, InfraError> {
        let _ = dotenvy::from_filename(".env");
        let d = Self::default();
        let cfg = Self {
            prefixed: env_parse("COLLAR_PREFIXED", d.prefixed)?,
            executor: env_parse("COLLAR_EXECUTOR", d.executor)?,
            player_name: std::env::var("COLLAR_PLAYER").unwrap_or(d.player_name),
            tick_millis: env_parse("COLLAR_TICK_MS", d.tick_millis)?,
            log_filter: std::env::var("RUST_LOG").unwrap_or(d.log_filter),
            waypoints: WaypointsConfig {
                enabled: env_parse("COLLAR_WAYPOINTS_ENABLED", d.waypoints.enabled)?,
                prefix: std::env::var("COLLAR_WAYPOINTS_PREFIX").unwrap_or(d.waypoints.prefix),
                command: std::env::var("COLLAR_WAYPOINTS_COMMAND").unwrap_or(d.waypoints.command),
            },
        };

        Ok(cfg)
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T, InfraError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse()
            .map_err(|e: T::Err| InfraError::Env(ConfigErrorKind::InvalidEnv(key.to_string(), e.to_string()))),
        Err(_) => Ok(default),
    }
}
