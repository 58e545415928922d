//! Recurring "time ago" relabeling
//!
//! Labels live next to the feed, keyed by transaction hash; the
//! transactions themselves are never touched.

use {
    crate::{feed::FeedSnapshot, transaction::Transaction},
    chrono::{DateTime, Utc},
    std::{collections::HashMap, sync::Arc, time::Duration},
    tokio::{
        sync::watch,
        task::JoinHandle,
        time::{interval, MissedTickBehavior},
    },
};

/// Hash -> relative-time label
pub type TimeLabels = Arc<HashMap<String, String>>;

/// Human-readable elapsed time between `then` and `now`
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 10 {
        // Also covers timestamps slightly in the future
        return "just now".to_string();
    }

    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;
    const WEEK: i64 = 7 * DAY;
    const MONTH: i64 = 30 * DAY;
    const YEAR: i64 = 365 * DAY;

    let (count, unit) = match secs {
        s if s < MINUTE => (s, "second"),
        s if s < HOUR => (s / MINUTE, "minute"),
        s if s < DAY => (s / HOUR, "hour"),
        s if s < WEEK => (s / DAY, "day"),
        s if s < MONTH => (s / WEEK, "week"),
        s if s < YEAR => (s / MONTH, "month"),
        s => (s / YEAR, "year"),
    };

    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

/// Labels for every transaction in `transactions` as of `now`
pub fn label_all(transactions: &[Transaction], now: DateTime<Utc>) -> HashMap<String, String> {
    transactions
        .iter()
        .map(|tx| (tx.hash.clone(), time_ago(tx.timestamp, now)))
        .collect()
}

/// Owns the recurring relabel task; cancelled by [`stop`](Self::stop) or on drop
pub struct RelativeTimeTicker {
    task: Option<JoinHandle<()>>,
    labels: watch::Receiver<TimeLabels>,
}

impl RelativeTimeTicker {
    pub fn start(snapshots: watch::Receiver<FeedSnapshot>, period: Duration) -> Self {
        let (tx, labels) = watch::channel(TimeLabels::default());
        let task = tokio::spawn(ticker_task(snapshots, tx, period));
        log::debug!("Relative-time ticker started ({}ms)", period.as_millis());
        Self {
            task: Some(task),
            labels,
        }
    }

    pub fn labels(&self) -> watch::Receiver<TimeLabels> {
        self.labels.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            // Cancelled is the expected outcome
            let _ = task.await;
            log::debug!("Relative-time ticker stopped");
        }
    }
}

impl Drop for RelativeTimeTicker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn ticker_task(
    snapshots: watch::Receiver<FeedSnapshot>,
    labels: watch::Sender<TimeLabels>,
    period: Duration,
) {
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        timer.tick().await;

        let visible = snapshots.borrow().transactions.clone();
        if visible.is_empty() {
            if !labels.borrow().is_empty() {
                labels.send_replace(TimeLabels::default());
            }
            continue;
        }

        labels.send_replace(Arc::new(label_all(&visible, Utc::now())));
    }
}
