// Aggregation cycle - roll a day's samples up into one summary per city
use crate::application::cycle_report::{CycleKind, CycleReport, EntityOutcome};
use crate::application::errors::StoreError;
use crate::application::weather_repository::{SampleStore, SummaryStore};
use crate::domain::summary::summarize;
use crate::domain::weather::DailySummary;
use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateOutcome {
    Written(DailySummary),
    NoSamples,
}

#[derive(Clone)]
pub struct Aggregator {
    samples: Arc<dyn SampleStore>,
    summaries: Arc<dyn SummaryStore>,
}

impl Aggregator {
    pub fn new(samples: Arc<dyn SampleStore>, summaries: Arc<dyn SummaryStore>) -> Self {
        Self { samples, summaries }
    }

    /// Recompute and upsert the summary for one city and date. Safe to re-run.
    pub async fn aggregate(&self, city: &str, date: NaiveDate) -> Result<AggregateOutcome, StoreError> {
        let mut samples = self.samples.query_by_city_date(city, date).await?;
        // Chronological order decides dominant-weather ties
        samples.sort_by_key(|s| s.time);

        let Some(summary) = summarize(city, date, &samples) else {
            tracing::debug!("No samples for {} on {}, skipping rollup", city, date);
            return Ok(AggregateOutcome::NoSamples);
        };

        self.summaries.upsert(&summary).await?;
        tracing::debug!(
            "Stored daily summary for {} on {} from {} samples",
            city,
            date,
            samples.len()
        );
        Ok(AggregateOutcome::Written(summary))
    }

    /// Run one aggregation cycle. A city without samples is skipped, it does
    /// not end the cycle.
    pub async fn aggregate_all(&self, cities: &[String], date: NaiveDate) -> CycleReport {
        let mut report = CycleReport::new(CycleKind::Aggregation { date }, Utc::now());

        let results = join_all(cities.iter().map(|city| self.aggregate(city, date))).await;
        for (city, result) in cities.iter().zip(results) {
            let outcome = match result {
                Ok(AggregateOutcome::Written(summary)) => {
                    tracing::debug!(
                        "Rolled up {} for {}: avg {:.1}°C, mostly {}",
                        city,
                        date,
                        summary.temperature.avg,
                        summary.dominant_weather
                    );
                    EntityOutcome::Stored
                }
                Ok(AggregateOutcome::NoSamples) => EntityOutcome::NoSamples,
                Err(e) => EntityOutcome::Failed(e.into()),
            };
            report.record(city, outcome);
        }

        report
    }
}
