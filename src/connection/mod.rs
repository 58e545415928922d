//! Push-transport connection lifecycle
//!
//! State machine:
//! ```text
//! Disconnected -> Connecting -> Connected
//! Connected -(drop/error)-> Reconnecting -(backoff)-> Connecting -> Connected
//! any -(disconnect)-> Disconnected   (terminal)
//! ```
//! State changes and payloads share one ordered channel, so a consumer sees
//! every transition and never receives a payload outside `Connected`.

pub mod backoff;
pub mod transport;

pub use backoff::ExponentialBackoff;
pub use transport::{Transport, TransportError, WebSocketTransport};

use {
    std::{fmt, sync::Arc, time::Duration},
    tokio::{
        sync::{mpsc, watch},
        task::JoinHandle,
        time::sleep,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Reconnecting => "Reconnecting",
        };
        f.write_str(label)
    }
}

/// Item delivered to the consumer, in the order it happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    StateChanged(ConnectionState),
    Payload(String),
}

#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: 0.2,
        }
    }
}

/// Owns the transport task and the authoritative [`ConnectionState`]
pub struct ConnectionManager {
    config: ReconnectConfig,
    state: Arc<watch::Sender<ConnectionState>>,
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(config: ReconnectConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            state: Arc::new(state),
            shutdown,
            task: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Latest-value view of the state for readers that only need the current one
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Start the subscription; transitions and payloads are sent to `events`.
    ///
    /// Calling this twice, or after [`disconnect`](Self::disconnect), is ignored.
    pub fn connect<T: Transport>(&mut self, transport: T, events: mpsc::Sender<TransportEvent>) {
        if self.task.is_some() || *self.shutdown.borrow() {
            log::warn!("Connection already started or torn down, ignoring connect()");
            return;
        }

        let worker = ConnectionWorker {
            transport,
            events,
            state: self.state.clone(),
            shutdown: self.shutdown.subscribe(),
            backoff: ExponentialBackoff::new(
                self.config.initial_delay,
                self.config.max_delay,
                self.config.jitter,
            ),
        };
        self.task = Some(tokio::spawn(worker.run()));
    }

    /// Cancel retries, release the transport and settle in `Disconnected`
    pub async fn disconnect(&mut self) {
        self.shutdown.send_replace(true);

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Connection task ended abnormally: {}", e);
            }
        }
        self.state.send_replace(ConnectionState::Disconnected);
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.shutdown.send_replace(true);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Consumer is gone or shutdown was requested
struct Stop;

struct ConnectionWorker<T> {
    transport: T,
    events: mpsc::Sender<TransportEvent>,
    state: Arc<watch::Sender<ConnectionState>>,
    shutdown: watch::Receiver<bool>,
    backoff: ExponentialBackoff,
}

impl<T: Transport> ConnectionWorker<T> {
    async fn run(mut self) {
        let _ = self.session_loop().await;

        self.transport.close().await;
        self.state.send_replace(ConnectionState::Disconnected);
        let _ = self
            .events
            .send(TransportEvent::StateChanged(ConnectionState::Disconnected))
            .await;
        log::info!("🔌 Disconnected");
    }

    async fn session_loop(&mut self) -> Result<(), Stop> {
        self.publish(ConnectionState::Connecting).await?;

        loop {
            let opened = tokio::select! {
                result = self.transport.open() => result,
                _ = wait_for_shutdown(&mut self.shutdown) => return Err(Stop),
            };

            match opened {
                Ok(()) => {
                    log::info!("✅ Connected to push transport");
                    self.backoff.reset();
                    self.publish(ConnectionState::Connected).await?;
                    let err = self.read_until_error().await?;
                    log::warn!("⚠️  Transport lost: {}", err);
                    self.transport.close().await;
                }
                Err(e) => log::warn!("❌ Connection failed: {}", e),
            }

            self.publish(ConnectionState::Reconnecting).await?;

            let delay = self.backoff.next_delay();
            log::info!("⏳ Retry attempt {} in {}ms", self.backoff.attempt(), delay.as_millis());
            tokio::select! {
                _ = sleep(delay) => {}
                _ = wait_for_shutdown(&mut self.shutdown) => return Err(Stop),
            }

            self.publish(ConnectionState::Connecting).await?;
        }
    }

    /// Forward payloads until the transport fails
    async fn read_until_error(&mut self) -> Result<TransportError, Stop> {
        loop {
            let next = tokio::select! {
                next = self.transport.next_message() => next,
                _ = wait_for_shutdown(&mut self.shutdown) => return Err(Stop),
            };

            match next {
                Ok(payload) => self.deliver(TransportEvent::Payload(payload)).await?,
                Err(e) => return Ok(e),
            }
        }
    }

    async fn publish(&mut self, state: ConnectionState) -> Result<(), Stop> {
        self.state.send_replace(state);
        log::debug!("Connection state -> {}", state);
        self.deliver(TransportEvent::StateChanged(state)).await
    }

    async fn deliver(&mut self, event: TransportEvent) -> Result<(), Stop> {
        self.events.send(event).await.map_err(|_| Stop)
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
