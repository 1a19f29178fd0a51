// Ports for the weather provider and the sample/summary stores
use crate::application::errors::{SourceError, StoreError};
use crate::domain::weather::{DailySummary, Observation, Sample};
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch the current conditions for a city
    async fn fetch(&self, city: &str) -> Result<Observation, SourceError>;
}

/// Append-only log of raw samples
#[async_trait]
pub trait SampleStore: Send + Sync {
    async fn append(&self, sample: &Sample) -> Result<(), StoreError>;

    /// All samples for a city on a date, in the order they were appended
    async fn query_by_city_date(&self, city: &str, date: NaiveDate) -> Result<Vec<Sample>, StoreError>;
}

/// Daily rollups, at most one per (city, date)
#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Insert the summary, replacing any existing one for the same city and date
    async fn upsert(&self, summary: &DailySummary) -> Result<(), StoreError>;

    async fn get_by_city_date(&self, city: &str, date: NaiveDate) -> Result<Option<DailySummary>, StoreError>;
}
