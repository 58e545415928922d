use {
    chrono::{DateTime, Duration, Utc},
    std::collections::VecDeque,
};

/// Rolling confirmations-per-second counter.
///
/// Uses a strict time cutoff: arrivals older than the window are dropped.
#[derive(Debug, Clone)]
pub struct ConfirmationRate {
    arrivals: VecDeque<DateTime<Utc>>,
    window: Duration,
}

impl ConfirmationRate {
    pub fn new(window: std::time::Duration) -> Self {
        let window = Duration::from_std(window)
            .ok()
            .filter(|w| *w > Duration::zero())
            .unwrap_or_else(|| Duration::seconds(10));
        Self {
            arrivals: VecDeque::new(),
            window,
        }
    }

    pub fn record(&mut self, at: DateTime<Utc>) {
        self.arrivals.push_back(at);
        self.evict(at);
    }

    pub fn per_second(&mut self, now: DateTime<Utc>) -> f64 {
        self.evict(now);
        let secs = self.window.num_milliseconds() as f64 / 1000.0;
        self.arrivals.len() as f64 / secs
    }

    fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while self.arrivals.front().is_some_and(|t| *t <= cutoff) {
            self.arrivals.pop_front();
        }
    }
}

impl Default for ConfirmationRate {
    fn default() -> Self {
        Self::new(std::time::Duration::from_secs(10))
    }
}
