//! Live feed wiring
//!
//! [`FeedEngine`] is the single writer of the timeline and of the observed
//! connection state. Every mutation runs synchronously between two awaits
//! and is followed by one snapshot publication, so a reader of the
//! snapshot channel never sees a half-applied append or an intermediate
//! state. [`LiveFeed`] owns the engine, the connection and the ticker, and
//! tears all three down together.

use {
    crate::{
        connection::{ConnectionManager, ConnectionState, ReconnectConfig, Transport, TransportEvent},
        ingestion::{IngestOutcome, IngestStats, TransactionIngestor},
        known_accounts::AliasResolver,
        preferences::{PreferenceStore, Preferences},
        rate::ConfirmationRate,
        ticker::{RelativeTimeTicker, TimeLabels},
        transaction::Transaction,
    },
    chrono::{DateTime, Utc},
    std::{sync::Arc, time::Duration},
    tokio::{
        sync::{mpsc, watch},
        task::JoinHandle,
        time::{interval, MissedTickBehavior},
    },
};

/// Read-only view handed to the presentation layer
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub connection: ConnectionState,
    /// Oldest first
    pub transactions: Arc<[Transaction]>,
    pub preferences: Preferences,
    pub stats: IngestStats,
    pub confirmations_per_second: f64,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            transactions: Vec::new().into(),
            preferences: Preferences::default(),
            stats: IngestStats::default(),
            confirmations_per_second: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub capacity: usize,
    pub tick_interval: Duration,
    pub rate_window: Duration,
    pub reconnect: ReconnectConfig,
    pub channel_buffer: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            capacity: 100,
            tick_interval: Duration::from_secs(1),
            rate_window: Duration::from_secs(10),
            reconnect: ReconnectConfig::default(),
            channel_buffer: 1000,
        }
    }
}

pub struct FeedEngine {
    ingestor: TransactionIngestor,
    rate: ConfirmationRate,
    connection: ConnectionState,
    preferences: PreferenceStore,
    snapshots: watch::Sender<FeedSnapshot>,
    rate_refresh: Duration,
}

impl FeedEngine {
    pub fn new(
        preferences: PreferenceStore,
        settings: &FeedSettings,
    ) -> (Self, watch::Receiver<FeedSnapshot>) {
        let initial = FeedSnapshot {
            preferences: preferences.get(),
            ..Default::default()
        };
        let (snapshots, rx) = watch::channel(initial);

        let engine = Self {
            ingestor: TransactionIngestor::new(preferences.clone(), settings.capacity),
            rate: ConfirmationRate::new(settings.rate_window),
            connection: ConnectionState::Disconnected,
            preferences,
            snapshots,
            rate_refresh: settings.tick_interval,
        };
        (engine, rx)
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Apply one transport event and publish the resulting snapshot.
    ///
    /// Returns the ingest outcome for payloads that reached the ingestor.
    pub fn handle_event(&mut self, event: TransportEvent, now: DateTime<Utc>) -> Option<IngestOutcome> {
        let outcome = match event {
            TransportEvent::StateChanged(state) => {
                log::info!("📡 Connection: {} -> {}", self.connection, state);
                self.connection = state;
                None
            }
            TransportEvent::Payload(payload) => {
                if self.connection != ConnectionState::Connected {
                    log::warn!("Ignoring payload received while {}", self.connection);
                    return None;
                }
                let outcome = self.ingestor.on_event(&payload, now);
                if outcome != IngestOutcome::Malformed {
                    self.rate.record(now);
                }
                Some(outcome)
            }
        };

        self.publish(now);
        outcome
    }

    /// Republish after a preference change; buffered entries are not refiltered
    pub fn refresh_preferences(&mut self) {
        self.publish(Utc::now());
    }

    /// Let the rate decay while no events arrive; publishes only on change
    pub fn refresh_rate(&mut self, now: DateTime<Utc>) {
        let current = self.rate.per_second(now);
        let shown = self.snapshots.borrow().confirmations_per_second;
        if current != shown {
            self.publish(now);
        }
    }

    fn publish(&mut self, now: DateTime<Utc>) {
        let snapshot = FeedSnapshot {
            connection: self.connection,
            transactions: self.ingestor.snapshot(),
            preferences: self.preferences.get(),
            stats: self.ingestor.stats(),
            confirmations_per_second: self.rate.per_second(now),
        };
        self.snapshots.send_replace(snapshot);
    }

    /// Drive the engine until shutdown or until the connection side hangs up
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<TransportEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        log::info!("🚀 Feed engine started");
        let mut preference_changes = self.preferences.subscribe();
        let mut rate_timer = interval(self.rate_refresh.max(Duration::from_millis(1)));
        rate_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => {
                        self.handle_event(event, Utc::now());
                    }
                    None => break,
                },
                changed = preference_changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.refresh_preferences();
                }
                _ = rate_timer.tick() => self.refresh_rate(Utc::now()),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        // Apply whatever the connection side queued before it stopped
        while let Ok(event) = events.try_recv() {
            self.handle_event(event, Utc::now());
        }

        let stats = self.ingestor.stats();
        log::info!(
            "Feed engine stopped (received {}, appended {}, malformed {}, discarded {})",
            stats.received,
            stats.appended,
            stats.malformed,
            stats.discarded
        );
    }
}

/// A running feed: connection, engine and ticker with one owner
pub struct LiveFeed {
    connection: ConnectionManager,
    ticker: RelativeTimeTicker,
    engine: Option<JoinHandle<()>>,
    engine_shutdown: watch::Sender<bool>,
    snapshots: watch::Receiver<FeedSnapshot>,
    preferences: PreferenceStore,
    aliases: AliasResolver,
}

impl LiveFeed {
    pub fn start<T: Transport>(
        transport: T,
        settings: FeedSettings,
        preferences: PreferenceStore,
        aliases: AliasResolver,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(settings.channel_buffer.max(1));
        let (engine_shutdown, shutdown_rx) = watch::channel(false);

        let (engine, snapshots) = FeedEngine::new(preferences.clone(), &settings);
        let engine = tokio::spawn(engine.run(events_rx, shutdown_rx));

        let ticker = RelativeTimeTicker::start(snapshots.clone(), settings.tick_interval);

        let mut connection = ConnectionManager::new(settings.reconnect.clone());
        connection.connect(transport, events_tx);

        Self {
            connection,
            ticker,
            engine: Some(engine),
            engine_shutdown,
            snapshots,
            preferences,
            aliases,
        }
    }

    pub fn snapshots(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshots.clone()
    }

    pub fn labels(&self) -> watch::Receiver<TimeLabels> {
        self.ticker.labels()
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    pub fn aliases(&self) -> &AliasResolver {
        &self.aliases
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Tear everything down: retries, transport, ticker, engine
    pub async fn shutdown(mut self) {
        log::info!("🛑 Shutting down live feed");
        self.connection.disconnect().await;
        self.ticker.stop().await;

        self.engine_shutdown.send_replace(true);
        if let Some(engine) = self.engine.take() {
            if let Err(e) = engine.await {
                log::warn!("Feed engine ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.engine_shutdown.send_replace(true);
        if let Some(engine) = self.engine.take() {
            engine.abort();
        }
    }
}
