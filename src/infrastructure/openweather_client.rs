// OpenWeatherMap current-conditions client
use crate::application::errors::SourceError;
use crate::application::weather_repository::WeatherSource;
use crate::domain::weather::{KelvinReadings, Observation};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    #[serde(default)]
    weather: Vec<ConditionEntry>,
    main: MainReadings,
    wind: WindReadings,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    main: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WindReadings {
    speed: f64,
}

impl From<CurrentWeatherResponse> for Observation {
    fn from(response: CurrentWeatherResponse) -> Self {
        Observation {
            conditions: response.weather.into_iter().map(|w| w.main).collect(),
            temperature: KelvinReadings {
                current: response.main.temp,
                feels_like: response.main.feels_like,
                min: response.main.temp_min,
                max: response.main.temp_max,
            },
            humidity: response.main.humidity,
            wind_speed: response.wind.speed,
        }
    }
}

impl OpenWeatherClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn build_url(&self, city: &str) -> String {
        format!(
            "{}/weather?q={}&appid={}",
            self.base_url,
            urlencoding::encode(city),
            urlencoding::encode(&self.api_key)
        )
    }
}

/// Decode a current-weather body into an observation
fn parse_observation(body: &str) -> Result<Observation, SourceError> {
    serde_json::from_str::<CurrentWeatherResponse>(body)
        .map(Observation::from)
        .map_err(|e| SourceError::MalformedResponse(e.to_string()))
}

fn classify_status(status: StatusCode, city: &str, body: String) -> SourceError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited,
        StatusCode::NOT_FOUND => SourceError::NotFound(city.to_string()),
        _ => SourceError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch(&self, city: &str) -> Result<Observation, SourceError> {
        let response = self
            .client
            .get(self.build_url(city))
            .header("Accept", "application/json")
            .send()
            .await
            // The request URL carries the API key
            .map_err(|e| SourceError::Network(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(classify_status(status, city, body));
        }

        parse_observation(&body)
    }
}
