// InfluxDB sample and summary store
use crate::application::errors::StoreError;
use crate::application::weather_repository::{SampleStore, SummaryStore};
use crate::domain::weather::{DailySummary, Sample, SampleTemperature, SummaryTemperature, clock};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

const SAMPLE_MEASUREMENT: &str = "weather_sample";
const SUMMARY_MEASUREMENT: &str = "daily_summary";

#[derive(Debug, Clone)]
pub struct InfluxStore {
    client: reqwest::Client,
    host: String,
    token: String,
    database: String,
    retention_policy: String,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResponse {
    results: Vec<InfluxQLResult>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLResult {
    #[serde(default)]
    series: Option<Vec<InfluxQLSeries>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InfluxQLSeries {
    columns: Vec<String>,
    values: Vec<Vec<serde_json::Value>>,
}

/// One result row with lookup by column name
struct Row<'a> {
    columns: &'a [String],
    values: &'a [serde_json::Value],
}

impl<'a> Row<'a> {
    fn get(&self, name: &str) -> Option<&'a serde_json::Value> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.values.get(idx)
    }

    fn str(&self, name: &str) -> Result<&'a str, StoreError> {
        self.get(name)
            .and_then(|v| v.as_str())
            .ok_or_else(|| StoreError::Decode(format!("missing string column '{}'", name)))
    }

    fn f64(&self, name: &str) -> Result<f64, StoreError> {
        self.get(name)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| StoreError::Decode(format!("missing numeric column '{}'", name)))
    }

    fn date(&self, name: &str) -> Result<NaiveDate, StoreError> {
        let raw = self.str(name)?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| StoreError::Decode(format!("bad date '{}': {}", raw, e)))
    }
}

impl InfluxStore {
    pub fn new(host: String, token: String, database: String, retention_policy: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.trim_end_matches('/').to_string(),
            token,
            database,
            retention_policy,
        }
    }

    fn build_query_url(&self, query: &str) -> String {
        format!(
            "{}/query?db={}&rp={}&q={}",
            self.host,
            urlencoding::encode(&self.database),
            urlencoding::encode(&self.retention_policy),
            urlencoding::encode(query)
        )
    }

    fn build_write_url(&self, precision: &str) -> String {
        format!(
            "{}/write?db={}&rp={}&precision={}",
            self.host,
            urlencoding::encode(&self.database),
            urlencoding::encode(&self.retention_policy),
            precision
        )
    }

    async fn execute_query(&self, query: &str) -> Result<InfluxQLResponse> {
        tracing::debug!("Executing InfluxQL: {}", query);

        let response = self
            .client
            .get(self.build_query_url(query))
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .context("Failed to send request to InfluxDB")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB query failed with status {}: {}", status, body);
        }

        let data = response
            .json::<InfluxQLResponse>()
            .await
            .context("Failed to parse InfluxDB response")?;

        if let Some(result) = data.results.first() {
            if let Some(error) = &result.error {
                anyhow::bail!("InfluxDB query error: {}", error);
            }
        }

        Ok(data)
    }

    async fn write_line(&self, line: String, precision: &str) -> Result<()> {
        let response = self
            .client
            .post(self.build_write_url(precision))
            .header("Authorization", format!("Token {}", self.token))
            .body(line)
            .send()
            .await
            .context("Failed to send write to InfluxDB")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("InfluxDB write failed with status {}: {}", status, body);
        }

        Ok(())
    }

    fn city_date_query(measurement: &str, city: &str, date: NaiveDate, tail: &str) -> String {
        format!(
            "SELECT * FROM {} WHERE \"city\" = '{}' AND \"date\" = '{}' {}",
            measurement,
            escape_literal(city),
            date.format("%Y-%m-%d"),
            tail
        )
    }
}

/// Rows of the first series in the first result
fn rows(response: &InfluxQLResponse) -> Vec<Row<'_>> {
    response
        .results
        .first()
        .and_then(|r| r.series.as_ref())
        .and_then(|s| s.first())
        .map(|s| {
            s.values
                .iter()
                .map(move |values| Row {
                    columns: &s.columns,
                    values,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn sample_from_row(row: &Row<'_>) -> Result<Sample, StoreError> {
    let raw_time = row.str("clock")?;
    let time = NaiveTime::parse_from_str(raw_time, clock::FORMAT)
        .map_err(|e| StoreError::Decode(format!("bad clock '{}': {}", raw_time, e)))?;

    Ok(Sample {
        city: row.str("city")?.to_string(),
        date: row.date("date")?,
        time,
        main_weather: row.str("main_weather")?.to_string(),
        temperature: SampleTemperature {
            current: row.f64("temp_current")?,
            feels_like: row.f64("temp_feels_like")?,
            min: row.f64("temp_min")?,
            max: row.f64("temp_max")?,
        },
        humidity: row.f64("humidity")?,
        wind_speed: row.f64("wind_speed")?,
    })
}

fn summary_from_row(row: &Row<'_>) -> Result<DailySummary, StoreError> {
    Ok(DailySummary {
        city: row.str("city")?.to_string(),
        date: row.date("date")?,
        temperature: SummaryTemperature {
            avg: row.f64("temp_avg")?,
            max: row.f64("temp_max")?,
            min: row.f64("temp_min")?,
        },
        dominant_weather: row.str("dominant_weather")?.to_string(),
        humidity_avg: row.f64("humidity_avg")?,
        wind_speed_avg: row.f64("wind_speed_avg")?,
    })
}

/// Line protocol for a sample. No timestamp, the server stamps the write so
/// every sample is its own point.
fn sample_line(sample: &Sample) -> String {
    format!(
        "{},city={},date={} clock=\"{}\",main_weather=\"{}\",temp_current={},temp_feels_like={},temp_min={},temp_max={},humidity={},wind_speed={}",
        SAMPLE_MEASUREMENT,
        escape_tag(&sample.city),
        sample.date.format("%Y-%m-%d"),
        sample.time.format(clock::FORMAT),
        escape_field(&sample.main_weather),
        sample.temperature.current,
        sample.temperature.feels_like,
        sample.temperature.min,
        sample.temperature.max,
        sample.humidity,
        sample.wind_speed
    )
}

/// Line protocol for a summary, stamped at the date's midnight so a rewrite
/// of the same city and date replaces the point.
fn summary_line(summary: &DailySummary) -> String {
    let midnight = summary.date.and_time(NaiveTime::default()).and_utc().timestamp();
    format!(
        "{},city={},date={} temp_avg={},temp_max={},temp_min={},dominant_weather=\"{}\",humidity_avg={},wind_speed_avg={} {}",
        SUMMARY_MEASUREMENT,
        escape_tag(&summary.city),
        summary.date.format("%Y-%m-%d"),
        summary.temperature.avg,
        summary.temperature.max,
        summary.temperature.min,
        escape_field(&summary.dominant_weather),
        summary.humidity_avg,
        summary.wind_speed_avg,
        midnight
    )
}

fn escape_tag(value: &str) -> String {
    value.replace('\\', "\\\\").replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}

fn escape_field(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[async_trait]
impl SampleStore for InfluxStore {
    async fn append(&self, sample: &Sample) -> Result<(), StoreError> {
        self.write_line(sample_line(sample), "ns").await?;
        Ok(())
    }

    async fn query_by_city_date(&self, city: &str, date: NaiveDate) -> Result<Vec<Sample>, StoreError> {
        let query = Self::city_date_query(SAMPLE_MEASUREMENT, city, date, "ORDER BY time ASC");
        let response = self.execute_query(&query).await?;
        rows(&response).iter().map(sample_from_row).collect()
    }
}

#[async_trait]
impl SummaryStore for InfluxStore {
    async fn upsert(&self, summary: &DailySummary) -> Result<(), StoreError> {
        self.write_line(summary_line(summary), "s").await?;
        Ok(())
    }

    async fn get_by_city_date(&self, city: &str, date: NaiveDate) -> Result<Option<DailySummary>, StoreError> {
        let query = Self::city_date_query(SUMMARY_MEASUREMENT, city, date, "ORDER BY time DESC LIMIT 1");
        let response = self.execute_query(&query).await?;
        rows(&response).first().map(summary_from_row).transpose()
    }
}
