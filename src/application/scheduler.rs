// Scheduler - drives the sampling timer and the daily rollup timer
use crate::application::aggregator::Aggregator;
use crate::application::collector::Collector;
use crate::application::cycle_report::CycleReport;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::MissedTickBehavior;

/// How long shutdown waits for running cycles before aborting them
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleSettings {
    pub sample_interval: Duration,
    /// UTC wall-clock time at which the daily rollup fires
    pub rollup_at: NaiveTime,
}

/// Allows one cycle of a kind to be in flight at a time
#[derive(Debug, Clone)]
pub struct CycleGuard {
    slot: Arc<Semaphore>,
}

impl Default for CycleGuard {
    fn default() -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
        }
    }
}

impl CycleGuard {
    pub fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.slot.clone().try_acquire_owned().ok()
    }

    /// Resolves once no cycle holds the guard
    pub async fn idle(&self) {
        let _ = self.slot.acquire().await;
    }
}

pub struct Scheduler {
    cities: Arc<[String]>,
    collector: Collector,
    aggregator: Aggregator,
    settings: ScheduleSettings,
    collecting: CycleGuard,
    aggregating: CycleGuard,
    running: Mutex<Vec<AbortHandle>>,
}

/// Timer tasks started by [`Scheduler::spawn`]
pub struct SchedulerHandle {
    scheduler: Arc<Scheduler>,
    sampling: JoinHandle<()>,
    rollup: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop both timers, then let running cycles finish within `grace`.
    pub async fn shutdown(self, grace: Duration) {
        self.sampling.abort();
        self.rollup.abort();

        let aborted = self.scheduler.stop_cycles(grace).await;
        if aborted > 0 {
            tracing::warn!("Aborted {} cycles still running after {:?}", aborted, grace);
        }
        tracing::info!("Scheduler stopped");
    }
}

impl Scheduler {
    pub fn new(
        cities: Vec<String>,
        collector: Collector,
        aggregator: Aggregator,
        settings: ScheduleSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            cities: cities.into(),
            collector,
            aggregator,
            settings,
            collecting: CycleGuard::default(),
            aggregating: CycleGuard::default(),
            running: Mutex::new(Vec::new()),
        })
    }

    pub fn spawn(self: &Arc<Self>) -> SchedulerHandle {
        tracing::info!(
            "Scheduling collection every {:?} and daily rollup at {} UTC for {} cities",
            self.settings.sample_interval,
            self.settings.rollup_at.format("%H:%M"),
            self.cities.len()
        );

        SchedulerHandle {
            scheduler: self.clone(),
            sampling: tokio::spawn(self.clone().run_sampling()),
            rollup: tokio::spawn(self.clone().run_rollup()),
        }
    }

    async fn run_sampling(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(self.settings.sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.fire_collection();
        }
    }

    async fn run_rollup(self: Arc<Self>) {
        let mut last_fired = None;
        loop {
            let now = Utc::now();
            let boundary = next_rollup(now, self.settings.rollup_at, last_fired);
            tokio::time::sleep((boundary - now).to_std().unwrap_or_default()).await;
            self.fire_aggregation(rollup_date(boundary));
            last_fired = Some(boundary);
        }
    }

    /// Start a collection cycle unless one is still running.
    pub fn fire_collection(self: &Arc<Self>) -> Option<JoinHandle<CycleReport>> {
        let Some(permit) = self.collecting.try_acquire() else {
            tracing::warn!("Previous collection cycle still running, skipping this tick");
            return None;
        };

        let this = self.clone();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            let report = this.collector.collect_all(&this.cities).await;
            log_report(&report);
            report
        });
        self.track(handle.abort_handle());
        Some(handle)
    }

    /// Start an aggregation cycle for `date` unless one is still running.
    pub fn fire_aggregation(self: &Arc<Self>, date: NaiveDate) -> Option<JoinHandle<CycleReport>> {
        let Some(permit) = self.aggregating.try_acquire() else {
            tracing::warn!("Previous aggregation cycle still running, skipping rollup for {}", date);
            return None;
        };

        let this = self.clone();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            let report = this.aggregator.aggregate_all(&this.cities, date).await;
            log_report(&report);
            report
        });
        self.track(handle.abort_handle());
        Some(handle)
    }

    fn track(&self, cycle: AbortHandle) {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        running.retain(|c| !c.is_finished());
        running.push(cycle);
    }

    /// Wait up to `grace` for running cycles, then abort the rest.
    /// Returns how many cycles were aborted.
    pub async fn stop_cycles(&self, grace: Duration) -> usize {
        let drained = tokio::time::timeout(grace, async {
            self.collecting.idle().await;
            self.aggregating.idle().await;
        })
        .await;
        if drained.is_ok() {
            return 0;
        }

        let running = std::mem::take(&mut *self.running.lock().unwrap_or_else(|e| e.into_inner()));
        let mut aborted = 0;
        for cycle in running.into_iter().filter(|c| !c.is_finished()) {
            cycle.abort();
            aborted += 1;
        }
        aborted
    }
}

/// Next boundary to fire, never at or before the one fired last
pub fn next_rollup(now: DateTime<Utc>, at: NaiveTime, last_fired: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let after = last_fired.map_or(now, |last| now.max(last));
    next_boundary(after, at)
}

/// First occurrence of `at` strictly after `now`
pub fn next_boundary(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now { today } else { today + TimeDelta::days(1) }
}

/// The day a boundary closes: the date of the last instant before it
pub fn rollup_date(boundary: DateTime<Utc>) -> NaiveDate {
    (boundary - TimeDelta::seconds(1)).date_naive()
}

fn log_report(report: &CycleReport) {
    for (city, failure) in report.failures() {
        tracing::warn!("{} cycle: {} failed: {}", report.kind, city, failure);
    }
    tracing::info!(
        "{} cycle finished in {}ms: {} stored, {} without samples, {} failed",
        report.kind,
        (Utc::now() - report.started_at).num_milliseconds(),
        report.stored(),
        report.skipped(),
        report.failed()
    );
}
