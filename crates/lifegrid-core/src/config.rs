//! Configuration loading and typed config structures for the Lifegrid
//! server.
//!
//! The configuration lives in `lifegrid-config.yaml` next to the binary.
//! Every field has a default, so a missing file or an empty document both
//! yield a working setup.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `lifegrid-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LifegridConfig {
    /// Defaults for new sessions and actor tuning.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Snapshot bus settings.
    #[serde(default)]
    pub bus: BusConfig,

    /// Restart policy for crashed actors.
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    /// Observer HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LifegridConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the listen address:
    /// - `LIFEGRID_HOST` overrides `server.host`
    /// - `LIFEGRID_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty map.
        if yaml.trim().is_empty() {
            let mut config = Self::default();
            config.server.apply_env_overrides();
            return Ok(config);
        }
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.server.apply_env_overrides();
        Ok(config)
    }
}

/// How a brand-new session's grid is seeded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialGrid {
    /// Each cell alive with ~30% probability.
    #[default]
    Random,
    /// No alive cells.
    Empty,
}

/// Session defaults and actor tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Rows for a session created without an explicit size.
    #[serde(default = "default_rows")]
    pub rows: u32,

    /// Columns for a session created without an explicit size.
    #[serde(default = "default_cols")]
    pub cols: u32,

    /// Tick delay for a session created without an explicit speed.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Random seed for reproducible grids. Unset means OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Seeding of a new session's first grid.
    #[serde(default)]
    pub initial_grid: InitialGrid,

    /// Longest a caller waits for an actor to answer, in milliseconds.
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,

    /// Capacity of each actor's command inbox.
    #[serde(default = "default_inbox_capacity")]
    pub inbox_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rows: default_rows(),
            cols: default_cols(),
            tick_ms: default_tick_ms(),
            seed: None,
            initial_grid: InitialGrid::Random,
            reply_timeout_ms: default_reply_timeout_ms(),
            inbox_capacity: default_inbox_capacity(),
        }
    }
}

/// Snapshot bus configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BusConfig {
    /// Snapshots buffered per topic before slow subscribers start lagging.
    #[serde(default = "default_bus_capacity")]
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: default_bus_capacity(),
        }
    }
}

/// Restart policy for crashed actors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SupervisorConfig {
    /// Restarts allowed per session before it is dropped (0 = unlimited).
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,

    /// Pause before a replacement actor is spawned, in milliseconds.
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            max_restarts: default_max_restarts(),
            restart_delay_ms: default_restart_delay_ms(),
        }
    }
}

/// Observer HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Apply `LIFEGRID_HOST` / `LIFEGRID_PORT` if set. An unparseable port
    /// is ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("LIFEGRID_HOST") {
            self.host = host;
        }
        if let Some(port) = std::env::var("LIFEGRID_PORT")
            .ok()
            .and_then(|raw| raw.parse::<u16>().ok())
        {
            self.port = port;
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_rows() -> u32 {
    30
}

const fn default_cols() -> u32 {
    30
}

const fn default_tick_ms() -> u64 {
    200
}

const fn default_reply_timeout_ms() -> u64 {
    2_000
}

const fn default_inbox_capacity() -> usize {
    64
}

const fn default_bus_capacity() -> usize {
    256
}

const fn default_max_restarts() -> u32 {
    5
}

const fn default_restart_delay_ms() -> u64 {
    100
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}
