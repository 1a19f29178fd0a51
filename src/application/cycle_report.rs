// Per-city results of one collection or aggregation cycle
use crate::application::errors::EntityFailure;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    Collection,
    Aggregation { date: NaiveDate },
}

impl fmt::Display for CycleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleKind::Collection => write!(f, "collection"),
            CycleKind::Aggregation { date } => write!(f, "aggregation for {}", date),
        }
    }
}

#[derive(Debug)]
pub enum EntityOutcome {
    /// A sample or summary was written
    Stored,
    /// Aggregation found no samples for the city, nothing written
    NoSamples,
    Failed(EntityFailure),
}

#[derive(Debug)]
pub struct CityOutcome {
    pub city: String,
    pub outcome: EntityOutcome,
}

#[derive(Debug)]
pub struct CycleReport {
    pub kind: CycleKind,
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<CityOutcome>,
}

impl CycleReport {
    pub fn new(kind: CycleKind, started_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            started_at,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, city: impl Into<String>, outcome: EntityOutcome) {
        self.outcomes.push(CityOutcome {
            city: city.into(),
            outcome,
        });
    }

    pub fn stored(&self) -> usize {
        self.count(|o| matches!(o, EntityOutcome::Stored))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, EntityOutcome::NoSamples))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EntityOutcome::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &EntityFailure)> {
        self.outcomes.iter().filter_map(|c| match &c.outcome {
            EntityOutcome::Failed(e) => Some((c.city.as_str(), e)),
            _ => None,
        })
    }

    #[cfg(test)]
    pub fn outcome_for(&self, city: &str) -> Option<&EntityOutcome> {
        self.outcomes.iter().find(|c| c.city == city).map(|c| &c.outcome)
    }

    fn count(&self, pred: impl Fn(&EntityOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|c| pred(&c.outcome)).count()
    }
}
