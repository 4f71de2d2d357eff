//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::game::camera::{MAX_PIXELS_PER_METER, MIN_PIXELS_PER_METER};
use crate::game::Viewport;

/// Client configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// WebSocket URL of the simulation server
    pub server_url: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Viewport size in pixels
    pub viewport: Viewport,
    /// Initial zoom
    pub pixels_per_meter: f64,
    /// Spacing of wind/current overlay arrows in meters
    pub grid_cell: f64,
    /// Render passes per second
    pub fps: u32,

    /// Delay before reconnecting after the connection drops
    pub reconnect_delay: Duration,
    /// Outbound command queue length
    pub command_queue: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = lookup("SAILSIM_SERVER_URL")
            .unwrap_or_else(|| "ws://127.0.0.1:9090".to_string());
        if !(server_url.starts_with("ws://") || server_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidUrl(server_url));
        }

        let viewport = match lookup("SAILSIM_VIEWPORT") {
            Some(raw) => parse_viewport(&raw)?,
            None => Viewport::new(800.0, 600.0),
        };

        let pixels_per_meter: f64 = parse_or("SAILSIM_PIXELS_PER_METER", 10.0, &lookup)?;
        if !pixels_per_meter.is_finite() {
            return Err(ConfigError::Invalid("SAILSIM_PIXELS_PER_METER"));
        }

        let grid_cell: f64 = parse_or("SAILSIM_GRID_CELL", 10.0, &lookup)?;
        if !(grid_cell.is_finite() && grid_cell > 0.0) {
            return Err(ConfigError::Invalid("SAILSIM_GRID_CELL"));
        }

        let fps: u32 = parse_or("SAILSIM_FPS", 30, &lookup)?;
        if fps == 0 {
            return Err(ConfigError::Invalid("SAILSIM_FPS"));
        }

        let reconnect_secs: u64 = parse_or("SAILSIM_RECONNECT_SECS", 2, &lookup)?;
        let command_queue: usize = parse_or("SAILSIM_COMMAND_QUEUE", 64, &lookup)?;
        if command_queue == 0 {
            return Err(ConfigError::Invalid("SAILSIM_COMMAND_QUEUE"));
        }

        Ok(Self {
            server_url,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            viewport,
            pixels_per_meter: pixels_per_meter.clamp(MIN_PIXELS_PER_METER, MAX_PIXELS_PER_METER),
            grid_cell,
            fps,
            reconnect_delay: Duration::from_secs(reconnect_secs),
            command_queue,
        })
    }
}

fn parse_or<T, F>(key: &'static str, default: T, lookup: &F) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// `WIDTHxHEIGHT`, both positive
fn parse_viewport(raw: &str) -> Result<Viewport, ConfigError> {
    let invalid = || ConfigError::Invalid("SAILSIM_VIEWPORT");
    let (w, h) = raw.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok(Viewport::new(f64::from(width), f64::from(height)))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Server URL must use ws:// or wss://, got '{0}'")]
    InvalidUrl(String),
}
