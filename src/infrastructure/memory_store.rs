// In-memory sample and summary store
use crate::application::errors::StoreError;
use crate::application::weather_repository::{SampleStore, SummaryStore};
use crate::domain::weather::{DailySummary, Sample};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::sync::RwLock;

type Key = (String, NaiveDate);

/// Process-local store, nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    samples: RwLock<HashMap<Key, Vec<Sample>>>,
    summaries: RwLock<HashMap<Key, DailySummary>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        tracing::info!("Using in-memory weather store");
        Self::default()
    }

    #[cfg(test)]
    pub async fn summary_count(&self) -> usize {
        self.summaries.read().await.len()
    }
}

#[async_trait]
impl SampleStore for MemoryStore {
    async fn append(&self, sample: &Sample) -> Result<(), StoreError> {
        self.samples
            .write()
            .await
            .entry((sample.city.clone(), sample.date))
            .or_default()
            .push(sample.clone());
        Ok(())
    }

    async fn query_by_city_date(&self, city: &str, date: NaiveDate) -> Result<Vec<Sample>, StoreError> {
        Ok(self
            .samples
            .read()
            .await
            .get(&(city.to_string(), date))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl SummaryStore for MemoryStore {
    async fn upsert(&self, summary: &DailySummary) -> Result<(), StoreError> {
        self.summaries
            .write()
            .await
            .insert((summary.city.clone(), summary.date), summary.clone());
        Ok(())
    }

    async fn get_by_city_date(&self, city: &str, date: NaiveDate) -> Result<Option<DailySummary>, StoreError> {
        Ok(self.summaries.read().await.get(&(city.to_string(), date)).cloned())
    }
}
