use {
    super::{PreferenceStore, Preferences},
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("preferences file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("preferences file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load preferences from a JSON file; a missing file yields defaults
pub fn load_preferences(path: &Path) -> Result<Preferences, PersistenceError> {
    if !path.exists() {
        log::info!("No preferences file found at {}, using defaults", path.display());
        return Ok(Preferences::default());
    }

    let json = fs::read_to_string(path)?;
    let prefs: Preferences = serde_json::from_str(&json)?;

    log::info!("Loaded preferences from {}", path.display());
    Ok(prefs)
}

/// Save preferences as pretty-printed JSON
pub fn save_preferences(prefs: &Preferences, path: &Path) -> Result<(), PersistenceError> {
    let json = serde_json::to_string_pretty(prefs)?;
    fs::write(path, json)?;

    log::debug!("Saved preferences to {}", path.display());
    Ok(())
}

/// Background task that writes preferences every time they change
pub async fn autosave_task(store: PreferenceStore, path: PathBuf) {
    let mut changes = store.subscribe();

    while changes.changed().await.is_ok() {
        let prefs = *changes.borrow_and_update();
        if let Err(e) = save_preferences(&prefs, &path) {
            log::warn!("Failed to save preferences: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::preferences::{PreferenceUpdate, Theme},
        std::time::Duration,
    };

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = load_preferences(&dir.path().join("absent.json")).unwrap();
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let prefs = Preferences {
            live_updates_enabled: false,
            hide_below_threshold: true,
            theme: Theme::Dark,
        };

        save_preferences(&prefs, &path).unwrap();
        assert_eq!(load_preferences(&path).unwrap(), prefs);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"theme":"Dark"}"#).unwrap();

        let prefs = load_preferences(&path).unwrap();
        assert_eq!(prefs.theme, Theme::Dark);
        assert!(prefs.live_updates_enabled);
        assert!(!prefs.hide_below_threshold);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(load_preferences(&path), Err(PersistenceError::Json(_))));
    }

    #[tokio::test]
    async fn test_autosave_writes_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        let store = PreferenceStore::default();

        let task = tokio::spawn(autosave_task(store.clone(), path.clone()));
        tokio::task::yield_now().await;

        store.set(PreferenceUpdate {
            hide_below_threshold: Some(true),
            ..Default::default()
        });

        let mut saved = None;
        for _ in 0..50 {
            if let Ok(prefs) = load_preferences(&path) {
                if prefs.hide_below_threshold {
                    saved = Some(prefs);
                    break;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        task.abort();

        assert!(saved.expect("preferences were not autosaved").hide_below_threshold);
    }
}
