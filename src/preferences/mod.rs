//! User display preferences
//!
//! A single explicitly constructed [`PreferenceStore`] is handed to every
//! component that reads preferences. Updates are applied through `set`, and
//! every subscriber observes the new value before `set` returns.

pub mod persistence;

use {
    serde::{Deserialize, Serialize},
    std::sync::Arc,
    tokio::sync::watch,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub live_updates_enabled: bool,
    /// Drop incoming transactions below one display unit
    pub hide_below_threshold: bool,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            live_updates_enabled: true,
            hide_below_threshold: false,
            theme: Theme::Light,
        }
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreferenceUpdate {
    pub live_updates_enabled: Option<bool>,
    pub hide_below_threshold: Option<bool>,
    pub theme: Option<Theme>,
}

impl PreferenceUpdate {
    fn apply(&self, prefs: &mut Preferences) -> bool {
        let before = *prefs;
        if let Some(live) = self.live_updates_enabled {
            prefs.live_updates_enabled = live;
        }
        if let Some(hide) = self.hide_below_threshold {
            prefs.hide_below_threshold = hide;
        }
        if let Some(theme) = self.theme {
            prefs.theme = theme;
        }
        before != *prefs
    }
}

/// Shared handle to the current preferences
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    inner: Arc<watch::Sender<Preferences>>,
}

impl PreferenceStore {
    pub fn new(initial: Preferences) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { inner: Arc::new(tx) }
    }

    pub fn get(&self) -> Preferences {
        *self.inner.borrow()
    }

    /// Apply `update`; subscribers are notified only if something changed
    pub fn set(&self, update: PreferenceUpdate) -> Preferences {
        self.inner.send_if_modified(|prefs| update.apply(prefs));
        let current = self.get();
        log::debug!("Preferences now {:?}", current);
        current
    }

    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.inner.subscribe()
    }

    pub fn toggle_live_updates(&self) -> Preferences {
        let live = self.get().live_updates_enabled;
        self.set(PreferenceUpdate {
            live_updates_enabled: Some(!live),
            ..Default::default()
        })
    }

    pub fn toggle_hide_below_threshold(&self) -> Preferences {
        let hide = self.get().hide_below_threshold;
        self.set(PreferenceUpdate {
            hide_below_threshold: Some(!hide),
            ..Default::default()
        })
    }

    pub fn toggle_theme(&self) -> Preferences {
        let theme = self.get().theme.toggled();
        self.set(PreferenceUpdate {
            theme: Some(theme),
            ..Default::default()
        })
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new(Preferences::default())
    }
}
