//! Live confirmation feed in the terminal
//!
//! Usage:
//!   cargo run --release --bin nanofeed
//!
//! Environment variables: see `nanofeed::config::Config::from_env`.

use {
    nanofeed::{
        config::{self, Config},
        connection::WebSocketTransport,
        feed::LiveFeed,
        known_accounts::{self, AliasResolver},
        preferences::{persistence, PreferenceStore},
        ui,
    },
    tokio::sync::watch,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logger first so config warnings are visible.
    // Logs go to stderr; the UI draws on the alternate screen
    env_logger::Builder::new()
        .parse_filters(&config::log_filter())
        .target(env_logger::Target::Stderr)
        .init();

    let config = Config::from_env()?;

    log::info!("🚀 Starting nanofeed...");
    log::info!("📊 Configuration:");
    log::info!("   Websocket: {}", config.ws_url);
    log::info!("   Timeline capacity: {}", config.timeline_capacity);
    log::info!("   Preferences: {}", config.preferences_path.display());
    log::info!(
        "   Known accounts: {}",
        config.known_accounts_url.as_deref().unwrap_or("None (no aliases)")
    );

    let initial = match persistence::load_preferences(&config.preferences_path) {
        Ok(prefs) => prefs,
        Err(e) => {
            log::warn!("Failed to load preferences, using defaults: {}", e);
            Default::default()
        }
    };
    let preferences = PreferenceStore::new(initial);

    // Spawn autosave task (writes on every toggle)
    let autosave = tokio::spawn(persistence::autosave_task(
        preferences.clone(),
        config.preferences_path.clone(),
    ));

    let aliases = AliasResolver::new();
    let (background_shutdown, shutdown_rx) = watch::channel(false);
    let directory = config.known_accounts_url.clone().map(|url| {
        tokio::spawn(known_accounts::refresh_task(
            aliases.clone(),
            url,
            config.known_accounts_refresh,
            shutdown_rx.clone(),
        ))
    });

    log::info!("🔌 Connecting to {}", config.ws_url);
    let feed = LiveFeed::start(
        WebSocketTransport::new(config.ws_url.clone()),
        config.feed_settings(),
        preferences,
        aliases,
    );

    tokio::select! {
        result = ui::run_ui(&feed) => {
            match result {
                Ok(()) => log::info!("UI exited"),
                Err(e) => log::error!("❌ UI error: {}", e),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            log::info!("Received Ctrl+C");
        }
    }

    // Final save in case the last toggle raced the autosave task
    if let Err(e) = persistence::save_preferences(&feed.preferences().get(), &config.preferences_path) {
        log::warn!("Failed to save preferences: {}", e);
    }
    feed.shutdown().await;

    background_shutdown.send_replace(true);
    if let Some(directory) = directory {
        let _ = directory.await;
    }
    autosave.abort();

    log::info!("✅ Shutdown complete");
    Ok(())
}
