use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, LocalResult, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::future::Future;
use std::sync::Arc;
use tokio::select;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::workflow::DailyDispatchWorkflow;

/// A wall-clock time of day in a fixed IANA time zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySchedule {
    time: NaiveTime,
    timezone: Tz,
}

impl DailySchedule {
    pub fn new(time: NaiveTime, timezone: Tz) -> Self {
        Self { time, timezone }
    }

    /// Parse `"HH:MM"` and an IANA zone name such as `"US/Central"`.
    pub fn parse(time: &str, timezone: &str) -> Result<Self> {
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .with_context(|| format!("invalid scheduler time '{}', expected HH:MM", time))?;
        let timezone: Tz = timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid scheduler timezone '{}': {}", timezone, e))?;
        Ok(Self { time, timezone })
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// First instant strictly after `now` whose local time is the scheduled time.
    ///
    /// A time that falls in a DST gap fires one hour later; an ambiguous time
    /// fires at its earlier occurrence.
    pub fn next_fire_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.with_timezone(&self.timezone).date_naive();

        for offset in 0..3 {
            let naive = (today + ChronoDuration::days(offset)).and_time(self.time);
            let local = match self.timezone.from_local_datetime(&naive) {
                LocalResult::Single(t) | LocalResult::Ambiguous(t, _) => Some(t),
                LocalResult::None => self
                    .timezone
                    .from_local_datetime(&(naive + ChronoDuration::hours(1)))
                    .earliest(),
            };

            if let Some(local) = local {
                let fire = local.with_timezone(&Utc);
                if fire > now {
                    return fire;
                }
            }
        }

        now + ChronoDuration::days(1)
    }
}

/// Run `job` once per day at the scheduled time until `shutdown` is notified.
///
/// Fires missed while the process was down or while a previous job was still
/// running are not replayed.
pub async fn run_scheduler<F, Fut>(schedule: DailySchedule, shutdown: Arc<Notify>, mut job: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut last_fire: Option<DateTime<Utc>> = None;

    loop {
        let now = Utc::now();
        let base = match last_fire {
            Some(last) if last > now => last,
            _ => now,
        };
        let next = schedule.next_fire_after(base);
        let wait = (next - now).to_std().unwrap_or_default();

        info!(
            next_run = %next.with_timezone(&schedule.timezone()),
            wait_secs = wait.as_secs(),
            "scheduler: waiting for next run"
        );

        select! {
            _ = tokio::time::sleep(wait) => {
                info!("scheduler: firing daily job");
                job().await;
                last_fire = Some(next);
            }
            _ = shutdown.notified() => {
                info!("scheduler: shutdown requested, exiting loop");
                break;
            }
        }
    }
}

/// Drive the dispatch workflow from the daily schedule.
pub async fn run_daily(workflow: Arc<DailyDispatchWorkflow>, schedule: DailySchedule, shutdown: Arc<Notify>) {
    run_scheduler(schedule, shutdown, move || {
        let workflow = workflow.clone();
        async move {
            if let Err(e) = workflow.run().await {
                warn!(error = %e, "scheduled dispatch did not complete; next attempt at the next scheduled time");
            }
        }
    })
    .await
}
