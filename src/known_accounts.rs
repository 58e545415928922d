//! Known-account directory lookup
//!
//! The directory itself is maintained elsewhere; this module only answers
//! "does this address have an alias" against whatever was last supplied.
//! An optional refresh task pulls the directory over HTTP on a fixed cadence.

use {
    serde::{Deserialize, Serialize},
    std::{
        collections::HashMap,
        sync::{Arc, RwLock},
        time::Duration,
    },
    tokio::{sync::watch, time::interval},
};

/// One directory entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownAccount {
    pub account: String,
    pub alias: String,
}

/// Maps account addresses to human aliases
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    directory: Arc<RwLock<HashMap<String, String>>>,
}

impl AliasResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = KnownAccount>) -> Self {
        let resolver = Self::new();
        resolver.refresh(entries);
        resolver
    }

    /// Look up an alias; a miss is a normal outcome
    pub fn resolve(&self, account: &str) -> Option<String> {
        let directory = self.directory.read().unwrap_or_else(|e| e.into_inner());
        directory.get(account).cloned()
    }

    /// Replace the whole directory with the supplied entries.
    ///
    /// When an account is listed twice, the first alias wins.
    pub fn refresh(&self, entries: impl IntoIterator<Item = KnownAccount>) {
        let mut fresh: HashMap<String, String> = HashMap::new();
        for known in entries {
            fresh.entry(known.account).or_insert(known.alias);
        }
        let count = fresh.len();

        let mut directory = self.directory.write().unwrap_or_else(|e| e.into_inner());
        *directory = fresh;

        log::debug!("Known-accounts directory refreshed ({} entries)", count);
    }

    pub fn len(&self) -> usize {
        self.directory.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directory endpoint returned {0}")]
    Status(reqwest::StatusCode),
}

/// Fetch the known-accounts directory as `[{"account": ..., "alias": ...}]`
pub async fn fetch_known_accounts(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<KnownAccount>, DirectoryError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(DirectoryError::Status(response.status()));
    }

    Ok(response.json().await?)
}

/// Periodically refresh `resolver` from `url` until `shutdown` flips to true.
///
/// A failed fetch keeps the previous directory in place.
pub async fn refresh_task(
    resolver: AliasResolver,
    url: String,
    refresh_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    log::info!("📇 Known-accounts refresh every {}s from {}", refresh_interval.as_secs(), url);

    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Cannot build HTTP client for known accounts: {}", e);
            return;
        }
    };

    let mut timer = interval(refresh_interval);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                match fetch_known_accounts(&client, &url).await {
                    Ok(entries) => {
                        log::info!("📇 Loaded {} known accounts", entries.len());
                        resolver.refresh(entries);
                    }
                    Err(e) => log::warn!("⚠️  Known-accounts refresh failed: {}", e),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    log::debug!("Known-accounts refresh task stopped");
}
