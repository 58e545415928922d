pub mod amount;
pub mod config;
pub mod connection;
pub mod feed;
pub mod ingestion;
pub mod known_accounts;
pub mod preferences;
pub mod rate;
pub mod ticker;
pub mod timeline;
pub mod transaction;
pub mod ui;

pub use connection::{ConnectionManager, ConnectionState, TransportEvent};
pub use feed::{FeedSnapshot, LiveFeed};
pub use ingestion::{IngestOutcome, TransactionIngestor};
pub use preferences::{PreferenceStore, Preferences};
pub use timeline::TimelineBuffer;
pub use transaction::{Subtype, Transaction};
