use std::env;
use std::fmt;
use std::time::Duration;

use crate::canvass::EngineOptions;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub engine: EngineConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("CANVASS_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let parallel = match env::var("CANVASS_PARALLEL") {
            Ok(raw) => parse_flag("CANVASS_PARALLEL", &raw)?,
            Err(_) => false,
        };

        let deadline_ms = match env::var("CANVASS_DEADLINE_MS") {
            Ok(raw) => Some(parse_deadline(&raw)?),
            Err(_) => None,
        };

        let log_level = env::var("CANVASS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            engine: EngineConfig {
                parallel,
                deadline_ms,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Settings controlling the aggregation engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub parallel: bool,
    pub deadline_ms: Option<u64>,
}

impl EngineConfig {
    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            parallel: self.parallel,
            deadline: self.deadline_ms.map(Duration::from_millis),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

pub(crate) fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: raw.to_string(),
        }),
    }
}

pub(crate) fn parse_deadline(raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidDeadline),
        Ok(ms) => Ok(ms),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidFlag { name: &'static str, value: String },
    InvalidDeadline,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{} must be a boolean flag, got '{}'", name, value)
            }
            ConfigError::InvalidDeadline => {
                write!(f, "CANVASS_DEADLINE_MS must be a positive number of milliseconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
