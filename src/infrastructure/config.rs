use crate::application::scheduler::ScheduleSettings;
use chrono::NaiveTime;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_CITIES: [&str; 6] = ["Delhi", "Mumbai", "Chennai", "Bangalore", "Kolkata", "Hyderabad"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_cities")]
    pub cities: Vec<String>,
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen: SocketAddr,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 5000)),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_url")]
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    pub sample_interval_secs: u64,
    /// `HH:MM`, UTC
    pub rollup_at: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sample_interval_secs: 300,
            rollup_at: "00:00".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageSettings {
    #[default]
    Memory,
    Influx(InfluxSettings),
}

#[derive(Debug, Deserialize, Clone)]
pub struct InfluxSettings {
    pub host: String,
    pub token: String,
    pub database: String,
    pub retention_policy: String,
}

fn default_cities() -> Vec<String> {
    DEFAULT_CITIES.iter().map(|c| c.to_string()).collect()
}

fn default_provider_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Load `config/weather.*` (optional) overridden by `WEATHER__*` environment variables
pub fn load_settings() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/weather").required(false))
        .add_source(
            config::Environment::with_prefix("WEATHER")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cities")
                .try_parsing(true),
        )
        .build()?;

    let settings: Settings = settings.try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cities.is_empty() {
            return Err(ConfigError::Invalid("at least one city must be tracked".into()));
        }
        if self.cities.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid("city names must not be blank".into()));
        }
        if self.provider.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.api_key must be set".into()));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid("provider.timeout_secs must be positive".into()));
        }
        if self.schedule.sample_interval_secs == 0 {
            return Err(ConfigError::Invalid("schedule.sample_interval_secs must be positive".into()));
        }
        self.schedule_settings()?;
        Ok(())
    }

    pub fn schedule_settings(&self) -> Result<ScheduleSettings, ConfigError> {
        let rollup_at = NaiveTime::parse_from_str(&self.schedule.rollup_at, "%H:%M").map_err(|e| {
            ConfigError::Invalid(format!("schedule.rollup_at '{}': {}", self.schedule.rollup_at, e))
        })?;

        Ok(ScheduleSettings {
            sample_interval: Duration::from_secs(self.schedule.sample_interval_secs),
            rollup_at,
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }
}
