// HTTP request handlers
use crate::domain::weather::{DailySummary, Sample};
use crate::presentation::app_state::AppState;
use crate::presentation::error::ApiError;
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

/// Both parameters are optional here so a missing one is reported as an
/// [`ApiError`] rather than axum's plain-text rejection
#[derive(Deserialize)]
pub struct CityDateQuery {
    pub city: Option<String>,
    pub date: Option<String>,
}

impl CityDateQuery {
    fn parse(&self) -> Result<(&str, NaiveDate), ApiError> {
        let city = self.city.as_deref().map(str::trim).unwrap_or_default();
        if city.is_empty() {
            return Err(ApiError::MissingCity);
        }
        let raw = self.date.as_deref().ok_or(ApiError::MissingDate)?;
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ApiError::InvalidDate(raw.to_string()))?;
        Ok((city, date))
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Raw samples for a city and date, earliest first
pub async fn get_samples(
    Query(query): Query<CityDateQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Sample>>, ApiError> {
    let (city, date) = query.parse()?;
    let samples = state.query_service.get_samples(city, date).await?;
    tracing::debug!("Returning {} samples for {} on {}", samples.len(), city, date);
    Ok(Json(samples))
}

/// Daily summary for a city and date, `null` when it has not been rolled up
pub async fn get_daily_summary(
    Query(query): Query<CityDateQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Option<DailySummary>>, ApiError> {
    let (city, date) = query.parse()?;
    Ok(Json(state.query_service.get_daily_summary(city, date).await?))
}
