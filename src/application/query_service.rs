// Query service - Read-only lookups for the HTTP API
use crate::application::errors::StoreError;
use crate::application::weather_repository::{SampleStore, SummaryStore};
use crate::domain::weather::{DailySummary, Sample};
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Clone)]
pub struct QueryService {
    samples: Arc<dyn SampleStore>,
    summaries: Arc<dyn SummaryStore>,
}

impl QueryService {
    pub fn new(samples: Arc<dyn SampleStore>, summaries: Arc<dyn SummaryStore>) -> Self {
        Self { samples, summaries }
    }

    /// Samples for the day, earliest first. Empty when nothing was recorded.
    pub async fn get_samples(&self, city: &str, date: NaiveDate) -> Result<Vec<Sample>, StoreError> {
        let mut samples = self.samples.query_by_city_date(city, date).await?;
        samples.sort_by_key(|s| s.time);
        Ok(samples)
    }

    pub async fn get_daily_summary(&self, city: &str, date: NaiveDate) -> Result<Option<DailySummary>, StoreError> {
        self.summaries.get_by_city_date(city, date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::weather::SampleTemperature;
    use crate::infrastructure::memory_store::MemoryStore;
    use chrono::NaiveTime;

    fn sample(hour: u32, minute: u32) -> Sample {
        Sample {
            city: "Delhi".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
            main_weather: "Clear".to_string(),
            temperature: SampleTemperature {
                current: 20.0,
                feels_like: 19.0,
                min: 18.0,
                max: 22.0,
            },
            humidity: 45.0,
            wind_speed: 1.5,
        }
    }

    #[tokio::test]
    async fn test_get_samples_sorted_by_time() {
        let store = Arc::new(MemoryStore::default());
        store.append(&sample(10, 5)).await.unwrap();
        store.append(&sample(9, 55)).await.unwrap();
        store.append(&sample(10, 0)).await.unwrap();
        let service = QueryService::new(store.clone(), store);

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let times: Vec<String> = service
            .get_samples("Delhi", date)
            .await
            .unwrap()
            .iter()
            .map(|s| s.time.format("%H:%M").to_string())
            .collect();

        assert_eq!(times, vec!["09:55", "10:00", "10:05"]);
    }

    #[tokio::test]
    async fn test_absent_data_is_not_an_error() {
        let store = Arc::new(MemoryStore::default());
        let service = QueryService::new(store.clone(), store);
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        assert!(service.get_samples("Delhi", date).await.unwrap().is_empty());
        assert!(service.get_daily_summary("Delhi", date).await.unwrap().is_none());
    }
}
