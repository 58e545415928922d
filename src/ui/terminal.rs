use {
    crate::{feed::LiveFeed, preferences::PreferenceStore},
    chrono::Utc,
    crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers},
    ratatui::{backend::CrosstermBackend, Terminal},
    std::time::Duration,
};

/// Input/redraw cadence; the ticker and the feed publish on their own schedule
const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    ToggleLiveUpdates,
    ToggleHideSmallAmounts,
    ToggleTheme,
    None,
}

pub fn key_action(code: KeyCode, modifiers: KeyModifiers) -> KeyAction {
    match code {
        // Raw mode delivers Ctrl+C as a key press instead of SIGINT
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char('l') => KeyAction::ToggleLiveUpdates,
        KeyCode::Char('h') => KeyAction::ToggleHideSmallAmounts,
        KeyCode::Char('t') => KeyAction::ToggleTheme,
        _ => KeyAction::None,
    }
}

/// Apply a preference key; returns false when the UI should exit
pub fn apply_key_action(action: KeyAction, preferences: &PreferenceStore) -> bool {
    match action {
        KeyAction::Quit => return false,
        KeyAction::ToggleLiveUpdates => {
            let prefs = preferences.toggle_live_updates();
            log::info!("Live updates {}", if prefs.live_updates_enabled { "enabled" } else { "disabled" });
        }
        KeyAction::ToggleHideSmallAmounts => {
            preferences.toggle_hide_below_threshold();
        }
        KeyAction::ToggleTheme => {
            preferences.toggle_theme();
        }
        KeyAction::None => {}
    }
    true
}

/// Raw mode and alternate screen, restored on drop.
///
/// Dropping `run_ui` mid-loop (e.g. on SIGINT) still gives the user their
/// terminal back.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> std::io::Result<Self> {
        crossterm::terminal::enable_raw_mode()?;
        let guard = TerminalGuard;

        // Alternate screen keeps stderr logs off the drawn frame
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide
        )?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        ) {
            log::warn!("Failed to leave alternate screen: {}", e);
        }
        if let Err(e) = crossterm::terminal::disable_raw_mode() {
            log::warn!("Failed to disable raw mode: {}", e);
        }
    }
}

/// Run the TUI event loop
///
/// Handles keyboard input and redraws from the latest feed snapshot
pub async fn run_ui(feed: &LiveFeed) -> Result<(), Box<dyn std::error::Error>> {
    let _guard = TerminalGuard::enter()?;

    let stdout = std::io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    event_loop(&mut terminal, feed).await
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    feed: &LiveFeed,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshots = feed.snapshots();
    let labels = feed.labels();

    loop {
        let snapshot = snapshots.borrow().clone();
        let current_labels = labels.borrow().clone();
        let rows = super::renderer::build_rows(&snapshot, &current_labels, feed.aliases(), Utc::now());

        terminal.draw(|f| {
            let area = f.size();
            super::layout::render_layout(f, area, &snapshot, &rows);
        })?;

        let input = tokio::task::block_in_place(|| -> std::io::Result<Option<Event>> {
            if crossterm::event::poll(REFRESH_INTERVAL)? {
                Ok(Some(crossterm::event::read()?))
            } else {
                Ok(None)
            }
        })?;

        if let Some(Event::Key(key)) = input {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if !apply_key_action(key_action(key.code, key.modifiers), feed.preferences()) {
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        let none = KeyModifiers::NONE;
        assert_eq!(key_action(KeyCode::Char('q'), none), KeyAction::Quit);
        assert_eq!(key_action(KeyCode::Esc, none), KeyAction::Quit);
        assert_eq!(key_action(KeyCode::Char('l'), none), KeyAction::ToggleLiveUpdates);
        assert_eq!(key_action(KeyCode::Char('x'), none), KeyAction::None);
    }

    #[test]
    fn test_ctrl_c_quits() {
        assert_eq!(key_action(KeyCode::Char('c'), KeyModifiers::CONTROL), KeyAction::Quit);
        // A bare 'c' is not bound
        assert_eq!(key_action(KeyCode::Char('c'), KeyModifiers::NONE), KeyAction::None);
    }

    #[test]
    fn test_keys_mutate_preferences() {
        let store = PreferenceStore::default();

        assert!(apply_key_action(KeyAction::ToggleLiveUpdates, &store));
        assert!(apply_key_action(KeyAction::ToggleHideSmallAmounts, &store));
        assert!(apply_key_action(KeyAction::ToggleTheme, &store));
        assert!(!apply_key_action(KeyAction::Quit, &store));

        let prefs = store.get();
        assert!(!prefs.live_updates_enabled);
        assert!(prefs.hide_below_threshold);
        assert_eq!(prefs.theme, crate::preferences::Theme::Dark);
    }
}
