// Daily rollup computation
use super::weather::{DailySummary, Sample, SummaryTemperature};
use chrono::NaiveDate;

/// Roll a day's samples up into a summary. Returns `None` when there is nothing to roll up.
pub fn summarize(city: &str, date: NaiveDate, samples: &[Sample]) -> Option<DailySummary> {
    if samples.is_empty() {
        return None;
    }

    let count = samples.len() as f64;
    let mean = |value: fn(&Sample) -> f64| samples.iter().map(value).sum::<f64>() / count;

    let max = samples
        .iter()
        .map(|s| s.temperature.max)
        .fold(f64::NEG_INFINITY, f64::max);
    let min = samples
        .iter()
        .map(|s| s.temperature.min)
        .fold(f64::INFINITY, f64::min);

    let dominant_weather = dominant_label(samples.iter().map(|s| s.main_weather.as_str()))?;

    Some(DailySummary {
        city: city.to_string(),
        date,
        temperature: SummaryTemperature {
            avg: mean(|s| s.temperature.current),
            max,
            min,
        },
        dominant_weather: dominant_weather.to_string(),
        humidity_avg: mean(|s| s.humidity),
        wind_speed_avg: mean(|s| s.wind_speed),
    })
}

/// Most frequent label. On a tie the label seen first wins.
pub fn dominant_label<'a>(labels: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    // (label, count) in first-occurrence order
    let mut tally: Vec<(&str, usize)> = Vec::new();
    for label in labels {
        match tally.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, count)) => *count += 1,
            None => tally.push((label, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (label, count) in tally {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::weather::SampleTemperature;
    use chrono::NaiveTime;

    fn sample(minute: u32, current: f64, max: f64, min: f64, label: &str, humidity: f64, wind: f64) -> Sample {
        Sample {
            city: "Delhi".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time: NaiveTime::from_hms_opt(0, minute, 0).unwrap(),
            main_weather: label.to_string(),
            temperature: SampleTemperature {
                current,
                feels_like: current,
                min,
                max,
            },
            humidity,
            wind_speed: wind,
        }
    }

    #[test]
    fn test_summarize_delhi_day() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let samples = vec![
            sample(0, 20.0, 21.0, 19.0, "Clear", 50.0, 3.0),
            sample(5, 22.0, 23.0, 21.0, "Clear", 55.0, 4.0),
            sample(10, 21.0, 22.0, 20.0, "Rain", 52.0, 3.5),
        ];

        let summary = summarize("Delhi", date, &samples).unwrap();

        assert_eq!(summary.city, "Delhi");
        assert_eq!(summary.date, date);
        assert!((summary.temperature.avg - 21.0).abs() < 1e-9);
        assert_eq!(summary.temperature.max, 23.0);
        assert_eq!(summary.temperature.min, 19.0);
        assert_eq!(summary.dominant_weather, "Clear");
        assert!((summary.humidity_avg - 157.0 / 3.0).abs() < 1e-9);
        assert!((summary.wind_speed_avg - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_empty_is_none() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(summarize("Delhi", date, &[]).is_none());
    }

    #[test]
    fn test_summarize_single_sample() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let summary = summarize("Delhi", date, &[sample(0, -3.5, -1.0, -6.0, "Snow", 90.0, 0.0)]).unwrap();

        assert_eq!(summary.temperature.avg, -3.5);
        assert_eq!(summary.temperature.max, -1.0);
        assert_eq!(summary.temperature.min, -6.0);
        assert_eq!(summary.dominant_weather, "Snow");
    }

    #[test]
    fn test_dominant_label_tie_goes_to_first_seen() {
        assert_eq!(dominant_label(["Rain", "Clear", "Rain", "Clear"]), Some("Rain"));
        assert_eq!(dominant_label(["Clear", "Rain", "Rain", "Clear"]), Some("Clear"));
        assert_eq!(dominant_label(["Haze", "Rain", "Clear", "Rain"]), Some("Rain"));
        assert_eq!(dominant_label(Vec::<&str>::new()), None);
    }
}
