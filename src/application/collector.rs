// Collection cycle - fetch, convert and store one sample per city
use crate::application::cycle_report::{CycleKind, CycleReport, EntityOutcome};
use crate::application::errors::{EntityFailure, SourceError};
use crate::application::weather_repository::{SampleStore, WeatherSource};
use crate::domain::weather::Sample;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Collector {
    source: Arc<dyn WeatherSource>,
    samples: Arc<dyn SampleStore>,
    fetch_timeout: Duration,
    clock: fn() -> DateTime<Utc>,
}

impl Collector {
    pub fn new(source: Arc<dyn WeatherSource>, samples: Arc<dyn SampleStore>, fetch_timeout: Duration) -> Self {
        Self {
            source,
            samples,
            fetch_timeout,
            clock: Utc::now,
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one collection cycle. Cities are fetched concurrently and a
    /// failure for one city never stops the others.
    pub async fn collect_all(&self, cities: &[String]) -> CycleReport {
        let mut report = CycleReport::new(CycleKind::Collection, (self.clock)());

        let results = join_all(cities.iter().map(|city| self.collect(city))).await;
        for (city, result) in cities.iter().zip(results) {
            match result {
                Ok(_) => report.record(city, EntityOutcome::Stored),
                Err(e) => report.record(city, EntityOutcome::Failed(e)),
            }
        }

        report
    }

    pub async fn collect(&self, city: &str) -> Result<Sample, EntityFailure> {
        let observation = tokio::time::timeout(self.fetch_timeout, self.source.fetch(city))
            .await
            .map_err(|_| SourceError::Timeout(self.fetch_timeout))??;

        let sample = Sample::from_observation(city, &observation, (self.clock)())?;
        self.samples.append(&sample).await?;

        tracing::debug!(
            "Stored sample for {} at {} {}: {:.1}°C {}",
            city,
            sample.date,
            sample.time.format("%H:%M"),
            sample.temperature.current,
            sample.main_weather
        );
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{FakeSource, FlakyStore, cities, observation};
    use crate::infrastructure::memory_store::MemoryStore;
    use chrono::{NaiveDate, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 5, 30).unwrap()
    }

    fn jan1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn test_source_failure_is_isolated() {
        let source = FakeSource::new()
            .with("Delhi", Ok(observation("Clear", 300.15)))
            .with("Mumbai", Err(SourceError::RateLimited))
            .with("Chennai", Ok(observation("Rain", 298.15)));
        let store = Arc::new(MemoryStore::default());
        let collector = Collector::new(Arc::new(source), store.clone(), Duration::from_secs(1))
            .with_clock(fixed_now);

        let report = collector.collect_all(&cities(&["Delhi", "Mumbai", "Chennai"])).await;

        assert_eq!(report.stored(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.outcome_for("Mumbai"),
            Some(EntityOutcome::Failed(EntityFailure::DataSource(SourceError::RateLimited)))
        ));

        let delhi = store.query_by_city_date("Delhi", jan1()).await.unwrap();
        assert_eq!(delhi.len(), 1);
        assert!((delhi[0].temperature.current - 27.0).abs() < 1e-9);
        assert_eq!(delhi[0].time.format("%H:%M").to_string(), "09:05");
        assert_eq!(store.query_by_city_date("Chennai", jan1()).await.unwrap().len(), 1);
        assert!(store.query_by_city_date("Mumbai", jan1()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transform_failure_is_isolated() {
        let mut broken = observation("Clear", 300.0);
        broken.conditions.clear();
        let source = FakeSource::new()
            .with("Delhi", Ok(broken))
            .with("Kolkata", Ok(observation("Haze", 295.0)));
        let store = Arc::new(MemoryStore::default());
        let collector = Collector::new(Arc::new(source), store.clone(), Duration::from_secs(1))
            .with_clock(fixed_now);

        let report = collector.collect_all(&cities(&["Delhi", "Kolkata"])).await;

        assert!(matches!(
            report.outcome_for("Delhi"),
            Some(EntityOutcome::Failed(EntityFailure::Transform(_)))
        ));
        assert!(matches!(report.outcome_for("Kolkata"), Some(EntityOutcome::Stored)));
        assert!(store.query_by_city_date("Delhi", jan1()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_is_isolated() {
        let source = FakeSource::new()
            .with("Delhi", Ok(observation("Clear", 300.0)))
            .with("Mumbai", Ok(observation("Clouds", 301.0)));
        let store = Arc::new(FlakyStore::new("Delhi"));
        let collector = Collector::new(Arc::new(source), store.clone(), Duration::from_secs(1))
            .with_clock(fixed_now);

        let report = collector.collect_all(&cities(&["Delhi", "Mumbai"])).await;

        assert!(matches!(
            report.outcome_for("Delhi"),
            Some(EntityOutcome::Failed(EntityFailure::Persistence(_)))
        ));
        assert_eq!(store.inner.query_by_city_date("Mumbai", jan1()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let source = FakeSource::new()
            .with("Delhi", Ok(observation("Clear", 300.0)))
            .with_delay(Duration::from_millis(200));
        let store = Arc::new(MemoryStore::default());
        let collector = Collector::new(Arc::new(source), store.clone(), Duration::from_millis(10))
            .with_clock(fixed_now);

        let err = collector.collect("Delhi").await.unwrap_err();

        assert!(matches!(err, EntityFailure::DataSource(SourceError::Timeout(_))));
        assert!(store.query_by_city_date("Delhi", jan1()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_cycles_append_in_order() {
        let source = FakeSource::new().with("Delhi", Ok(observation("Clear", 300.0)));
        let store = Arc::new(MemoryStore::default());
        let collector = Collector::new(Arc::new(source), store.clone(), Duration::from_secs(1))
            .with_clock(fixed_now);

        collector.collect_all(&cities(&["Delhi"])).await;
        collector.collect_all(&cities(&["Delhi"])).await;

        assert_eq!(store.query_by_city_date("Delhi", jan1()).await.unwrap().len(), 2);
    }
}
