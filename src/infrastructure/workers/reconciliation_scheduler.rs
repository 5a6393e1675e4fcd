use crate::application::ReconciliationJob;
use crate::infrastructure::config::ScheduleConfig;
use crate::ports::{LedgerPort, PayByBankPort};
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// Time of day (UTC) of the daily reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySlot {
    pub hour: u32,
    pub minute: u32,
}

impl DailySlot {
    /// Random slot inside the configured hour window
    pub fn random_in(schedule: &ScheduleConfig) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            hour: rng.gen_range(schedule.window_start_hour..=schedule.window_end_hour),
            minute: rng.gen_range(0..60),
        }
    }

    /// First occurrence of the slot strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let time = NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN);
        let today = now.date_naive().and_time(time).and_utc();
        if today > now {
            today
        } else {
            today + ChronoDuration::days(1)
        }
    }
}

/// Fires the batch reconciliation job once a day
pub struct ReconciliationScheduler<P: PayByBankPort, L: LedgerPort> {
    job: Arc<ReconciliationJob<P, L>>,
    slot: DailySlot,
}

impl<P: PayByBankPort, L: LedgerPort> ReconciliationScheduler<P, L> {
    pub fn new(job: Arc<ReconciliationJob<P, L>>, schedule: &ScheduleConfig) -> Self {
        Self {
            job,
            slot: DailySlot::random_in(schedule),
        }
    }

    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            hour = self.slot.hour,
            minute = self.slot.minute,
            "reconciliation scheduler started"
        );

        loop {
            let now = Utc::now();
            let next = self.slot.next_after(now);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!(next_run = %next, "next PayByBank reconciliation scheduled");

            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("reconciliation scheduler stopping");
                        break;
                    }
                }
                _ = tokio::time::sleep(wait) => {
                    match self.job.run().await {
                        Ok(updated) => info!(updated = updated.len(), "scheduled reconciliation finished"),
                        Err(e) => error!(error = %e, "scheduled reconciliation failed"),
                    }
                }
            }
        }

        info!("reconciliation scheduler stopped");
    }
}
