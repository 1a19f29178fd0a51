// Weather domain models
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Offset between the Kelvin and Celsius scales
pub const KELVIN_OFFSET: f64 = 273.15;

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

/// Raw reading as reported by the weather provider, temperatures in Kelvin
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub conditions: Vec<String>,
    pub temperature: KelvinReadings,
    pub humidity: f64,
    pub wind_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KelvinReadings {
    pub current: f64,
    pub feels_like: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransformError {
    #[error("observation carries no weather condition")]
    MissingCondition,
    #[error("invalid {field} reading: {value}")]
    InvalidReading { field: &'static str, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleTemperature {
    pub current: f64,
    pub feels_like: f64,
    pub min: f64,
    pub max: f64,
}

/// One observation for a city, stamped with the UTC date and minute it was taken
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub city: String,
    pub date: NaiveDate,
    #[serde(with = "clock")]
    pub time: NaiveTime,
    pub main_weather: String,
    pub temperature: SampleTemperature,
    pub humidity: f64,
    pub wind_speed: f64,
}

impl Sample {
    /// Validate a provider observation and convert it into a Celsius sample.
    pub fn from_observation(
        city: &str,
        observation: &Observation,
        taken_at: DateTime<Utc>,
    ) -> Result<Self, TransformError> {
        let main_weather = observation
            .conditions
            .first()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .ok_or(TransformError::MissingCondition)?
            .to_string();

        let kelvin = &observation.temperature;
        let temperature = SampleTemperature {
            current: kelvin_to_celsius(check_kelvin("temperature", kelvin.current)?),
            feels_like: kelvin_to_celsius(check_kelvin("feels_like", kelvin.feels_like)?),
            min: kelvin_to_celsius(check_kelvin("temp_min", kelvin.min)?),
            max: kelvin_to_celsius(check_kelvin("temp_max", kelvin.max)?),
        };

        let humidity = observation.humidity;
        if !humidity.is_finite() || !(0.0..=100.0).contains(&humidity) {
            return Err(TransformError::InvalidReading { field: "humidity", value: humidity });
        }

        let wind_speed = observation.wind_speed;
        if !wind_speed.is_finite() || wind_speed < 0.0 {
            return Err(TransformError::InvalidReading { field: "wind_speed", value: wind_speed });
        }

        Ok(Self {
            city: city.to_string(),
            date: taken_at.date_naive(),
            time: truncate_to_minute(taken_at.time()),
            main_weather,
            temperature,
            humidity,
            wind_speed,
        })
    }
}

fn check_kelvin(field: &'static str, value: f64) -> Result<f64, TransformError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(TransformError::InvalidReading { field, value })
    }
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    use chrono::Timelike;
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryTemperature {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
}

/// Rollup of every sample recorded for a city on one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub city: String,
    pub date: NaiveDate,
    pub temperature: SummaryTemperature,
    pub dominant_weather: String,
    pub humidity_avg: f64,
    pub wind_speed_avg: f64,
}

/// `HH:MM` (de)serialization for sample times
pub mod clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
