// Fakes for exercising the cycles without a provider or database
use crate::application::errors::{SourceError, StoreError};
use crate::application::weather_repository::{SampleStore, SummaryStore, WeatherSource};
use crate::domain::weather::{DailySummary, KelvinReadings, Observation, Sample};
use crate::infrastructure::memory_store::MemoryStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub fn observation(label: &str, current_k: f64) -> Observation {
    Observation {
        conditions: vec![label.to_string()],
        temperature: KelvinReadings {
            current: current_k,
            feels_like: current_k,
            min: current_k - 1.0,
            max: current_k + 1.0,
        },
        humidity: 50.0,
        wind_speed: 3.0,
    }
}

/// Answers from a fixed table; unknown cities get `NotFound`
#[derive(Default)]
pub struct FakeSource {
    answers: HashMap<String, Result<Observation, SourceError>>,
    delay: Option<Duration>,
    gate: Option<Arc<Notify>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, city: &str, answer: Result<Observation, SourceError>) -> Self {
        self.answers.insert(city.to_string(), answer);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every fetch waits until the gate is notified
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

#[async_trait]
impl WeatherSource for FakeSource {
    async fn fetch(&self, city: &str) -> Result<Observation, SourceError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answers
            .get(city)
            .cloned()
            .unwrap_or_else(|| Err(SourceError::NotFound(city.to_string())))
    }
}

/// Memory store that fails every call touching one city
pub struct FlakyStore {
    pub inner: MemoryStore,
    broken_city: String,
}

impl FlakyStore {
    pub fn new(broken_city: &str) -> Self {
        Self {
            inner: MemoryStore::default(),
            broken_city: broken_city.to_string(),
        }
    }

    fn check(&self, city: &str) -> Result<(), StoreError> {
        if city == self.broken_city {
            Err(anyhow::anyhow!("disk full while writing {}", city).into())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SampleStore for FlakyStore {
    async fn append(&self, sample: &Sample) -> Result<(), StoreError> {
        self.check(&sample.city)?;
        self.inner.append(sample).await
    }

    async fn query_by_city_date(&self, city: &str, date: NaiveDate) -> Result<Vec<Sample>, StoreError> {
        self.check(city)?;
        self.inner.query_by_city_date(city, date).await
    }
}

#[async_trait]
impl SummaryStore for FlakyStore {
    async fn upsert(&self, summary: &DailySummary) -> Result<(), StoreError> {
        self.check(&summary.city)?;
        self.inner.upsert(summary).await
    }

    async fn get_by_city_date(&self, city: &str, date: NaiveDate) -> Result<Option<DailySummary>, StoreError> {
        self.check(city)?;
        self.inner.get_by_city_date(city, date).await
    }
}

pub fn cities(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| c.to_string()).collect()
}
