use crate::core::{PenaltyModel, RecencyDecay, SeatingEngine};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
    /// Largest JSON body accepted, in bytes
    pub json_limit: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            json_limit: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Seating engine tuning
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_restarts")]
    pub restarts: usize,
    #[serde(default = "default_history_weight")]
    pub history_weight: f64,
    #[serde(default = "default_balance_weight")]
    pub balance_weight: f64,
    #[serde(default = "default_memory_events")]
    pub memory_events: usize,
    #[serde(default)]
    pub decay: RecencyDecay,
    #[serde(default)]
    pub attribute_weights: HashMap<String, f64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            restarts: default_restarts(),
            history_weight: default_history_weight(),
            balance_weight: default_balance_weight(),
            memory_events: default_memory_events(),
            decay: RecencyDecay::default(),
            attribute_weights: HashMap::new(),
        }
    }
}

fn default_restarts() -> usize { 32 }
fn default_history_weight() -> f64 { 1.0 }
fn default_balance_weight() -> f64 { 0.5 }
fn default_memory_events() -> usize { 3 }

impl EngineSettings {
    pub fn penalty_model(&self) -> PenaltyModel {
        PenaltyModel {
            history_weight: self.history_weight,
            balance_weight: self.balance_weight,
            memory_events: self.memory_events,
            decay: self.decay.clone(),
            attribute_weights: self.attribute_weights.clone(),
        }
    }

    /// Rejects weights the engine cannot score with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.penalty_model()
            .check()
            .map_err(|e| ConfigError::Message(format!("invalid engine settings: {}", e)))
    }

    pub fn build_engine(&self) -> SeatingEngine {
        SeatingEngine::new(self.penalty_model(), self.restarts)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with SEATING_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings: Self = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SEATING__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("SEATING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Self = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SEATING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()
    }
}
