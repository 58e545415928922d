//! Inbound confirmation filtering
//!
//! Every raw payload goes through the same steps, in order:
//! 1. Parse (malformed payloads are counted and dropped)
//! 2. Live-mode gate (disabled means nothing is kept)
//! 3. One-unit threshold, when the user hides small amounts
//! 4. Deduplication against the timeline
//! 5. Append

use {
    crate::{
        amount,
        preferences::PreferenceStore,
        timeline::TimelineBuffer,
        transaction::Transaction,
    },
    chrono::{DateTime, Utc},
    std::sync::Arc,
};

/// What happened to one inbound payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Appended,
    Malformed,
    LiveUpdatesDisabled,
    BelowThreshold,
    Duplicate,
}

/// Running counters, reset only with the ingestor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub received: u64,
    pub appended: u64,
    pub malformed: u64,
    pub discarded: u64,
    pub evicted: u64,
}

pub struct TransactionIngestor {
    preferences: PreferenceStore,
    timeline: TimelineBuffer,
    stats: IngestStats,
}

impl TransactionIngestor {
    pub fn new(preferences: PreferenceStore, capacity: usize) -> Self {
        Self {
            preferences,
            timeline: TimelineBuffer::new(capacity),
            stats: IngestStats::default(),
        }
    }

    /// Process one raw payload received at `received_at`
    pub fn on_event(&mut self, payload: &str, received_at: DateTime<Utc>) -> IngestOutcome {
        self.stats.received += 1;

        let tx = match Transaction::parse(payload, received_at) {
            Ok(tx) => tx,
            Err(e) => {
                self.stats.malformed += 1;
                log::debug!("Dropping malformed payload: {}", e);
                return IngestOutcome::Malformed;
            }
        };

        self.accept(tx)
    }

    /// Apply the preference filters and dedupe to an already parsed transaction
    pub fn accept(&mut self, tx: Transaction) -> IngestOutcome {
        // Read once so one event sees one consistent configuration
        let prefs = self.preferences.get();

        if !prefs.live_updates_enabled {
            self.stats.discarded += 1;
            return IngestOutcome::LiveUpdatesDisabled;
        }

        if prefs.hide_below_threshold && is_below_threshold(&tx) {
            self.stats.discarded += 1;
            log::debug!("Hiding {} below one unit", tx.hash);
            return IngestOutcome::BelowThreshold;
        }

        if self.timeline.contains(&tx.hash) {
            return IngestOutcome::Duplicate;
        }

        log::debug!("✅ {} {} {}", tx.subtype, tx.hash, tx.account);
        if self.timeline.append(tx).is_some() {
            self.stats.evicted += 1;
        }
        self.stats.appended += 1;
        IngestOutcome::Appended
    }

    pub fn snapshot(&self) -> Arc<[Transaction]> {
        self.timeline.snapshot()
    }

    pub fn timeline(&self) -> &TimelineBuffer {
        &self.timeline
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }
}

/// Missing amounts (change/epoch blocks) count as below the threshold
fn is_below_threshold(tx: &Transaction) -> bool {
    match tx.amount.as_deref() {
        Some(raw) => amount::is_below_one_unit(raw).unwrap_or(true),
        None => true,
    }
}
