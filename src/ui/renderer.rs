// Renderer module - view-model and styling
// Turns a feed snapshot into display rows; layout.rs draws them.

use {
    crate::{
        amount::{format_amount, DISPLAY_UNIT, NOT_APPLICABLE},
        connection::ConnectionState,
        feed::FeedSnapshot,
        known_accounts::AliasResolver,
        preferences::Theme,
        ticker::time_ago,
        transaction::Subtype,
    },
    chrono::{DateTime, Utc},
    ratatui::style::Color,
    std::collections::HashMap,
};

/// One enriched timeline entry, ready to draw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRow {
    pub subtype: Subtype,
    /// `None` for subtypes that never carry an amount
    pub amount: Option<String>,
    pub age: String,
    pub alias: Option<String>,
    pub account: String,
    pub hash: String,
}

/// Build display rows, newest first
pub fn build_rows(
    snapshot: &FeedSnapshot,
    labels: &HashMap<String, String>,
    aliases: &AliasResolver,
    now: DateTime<Utc>,
) -> Vec<FeedRow> {
    snapshot
        .transactions
        .iter()
        .rev()
        .map(|tx| FeedRow {
            subtype: tx.subtype,
            amount: tx.subtype.carries_amount().then(|| format_display_amount(tx.amount.as_deref())),
            age: labels
                .get(&tx.hash)
                .cloned()
                .unwrap_or_else(|| time_ago(tx.timestamp, now)),
            alias: aliases.resolve(&tx.account),
            account: tx.account.clone(),
            hash: tx.hash.clone(),
        })
        .collect()
}

/// Format amount with unit suffix, or the bare N/A marker
pub fn format_display_amount(raw: Option<&str>) -> String {
    let formatted = format_amount(raw);
    if formatted == NOT_APPLICABLE {
        formatted
    } else {
        format!("{} {}", formatted, DISPLAY_UNIT)
    }
}

/// Banner shown above the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusBanner {
    LiveUpdatesDisabled,
    Connecting,
    WaitingForTransactions,
}

impl StatusBanner {
    pub fn message(self) -> &'static str {
        match self {
            StatusBanner::LiveUpdatesDisabled => "Live updates disabled",
            StatusBanner::Connecting => "Connecting to the network ...",
            StatusBanner::WaitingForTransactions => "Waiting for transactions ...",
        }
    }
}

pub fn status_banner(snapshot: &FeedSnapshot) -> Option<StatusBanner> {
    if !snapshot.preferences.live_updates_enabled {
        return Some(StatusBanner::LiveUpdatesDisabled);
    }
    match snapshot.connection {
        ConnectionState::Connected if snapshot.transactions.is_empty() => {
            Some(StatusBanner::WaitingForTransactions)
        }
        ConnectionState::Connected => None,
        ConnectionState::Disconnected
        | ConnectionState::Connecting
        | ConnectionState::Reconnecting => Some(StatusBanner::Connecting),
    }
}

/// Colour for a subtype tag; adding a subtype forces an update here
pub fn subtype_color(subtype: Subtype, theme: Theme) -> Color {
    match (subtype, theme) {
        (Subtype::Send, Theme::Light) => Color::Red,
        (Subtype::Send, Theme::Dark) => Color::LightRed,
        (Subtype::Receive, Theme::Light) => Color::Green,
        (Subtype::Receive, Theme::Dark) => Color::LightGreen,
        (Subtype::Change, Theme::Light) => Color::Blue,
        (Subtype::Change, Theme::Dark) => Color::LightBlue,
        (Subtype::Epoch, Theme::Light) => Color::Magenta,
        (Subtype::Epoch, Theme::Dark) => Color::LightMagenta,
    }
}

pub fn background(theme: Theme) -> Color {
    match theme {
        Theme::Light => Color::White,
        Theme::Dark => Color::Rgb(0x1e, 0x1e, 0x1e),
    }
}

pub fn foreground(theme: Theme) -> Color {
    match theme {
        Theme::Light => Color::Black,
        Theme::Dark => Color::Gray,
    }
}

pub fn muted(theme: Theme) -> Color {
    match theme {
        Theme::Light => Color::DarkGray,
        Theme::Dark => Color::Rgb(0x8c, 0x8c, 0x8c),
    }
}

pub fn connection_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Connected => Color::Green,
        ConnectionState::Connecting | ConnectionState::Reconnecting => Color::Yellow,
        ConnectionState::Disconnected => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            known_accounts::KnownAccount,
            preferences::Preferences,
            transaction::Transaction,
        },
        chrono::TimeZone,
    };

    fn tx(hash: &str, subtype: Subtype, amount: Option<&str>) -> Transaction {
        Transaction {
            hash: hash.to_string(),
            account: format!("nano_{}", hash.to_lowercase()),
            amount: amount.map(String::from),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            subtype,
        }
    }

    fn snapshot(transactions: Vec<Transaction>, connection: ConnectionState) -> FeedSnapshot {
        FeedSnapshot {
            connection,
            transactions: transactions.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rows_are_enriched_newest_first() {
        let snap = snapshot(
            vec![
                tx("A", Subtype::Send, Some("2500000000000000000000000000000")),
                tx("B", Subtype::Change, None),
                tx("C", Subtype::Receive, None),
            ],
            ConnectionState::Connected,
        );
        let aliases = AliasResolver::from_entries(vec![KnownAccount {
            account: "nano_a".to_string(),
            alias: "Faucet".to_string(),
        }]);
        let mut labels = HashMap::new();
        labels.insert("A".to_string(), "3 minutes ago".to_string());
        let now = Utc.timestamp_opt(1_700_000_030, 0).unwrap();

        let rows = build_rows(&snap, &labels, &aliases, now);

        let hashes: Vec<_> = rows.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes, vec!["C", "B", "A"]);
        assert_eq!(rows[0].amount.as_deref(), Some(NOT_APPLICABLE));
        assert_eq!(rows[1].amount, None);
        assert_eq!(rows[2].amount.as_deref(), Some("2.5 NANO"));
        assert_eq!(rows[2].alias.as_deref(), Some("Faucet"));
        assert_eq!(rows[2].age, "3 minutes ago");
        // Unlabelled rows fall back to a direct computation
        assert_eq!(rows[0].age, "30 seconds ago");
        assert_eq!(rows[0].alias, None);
    }

    #[test]
    fn test_status_banner() {
        let connected_empty = snapshot(vec![], ConnectionState::Connected);
        assert_eq!(status_banner(&connected_empty), Some(StatusBanner::WaitingForTransactions));

        let connected = snapshot(vec![tx("A", Subtype::Change, None)], ConnectionState::Connected);
        assert_eq!(status_banner(&connected), None);

        let reconnecting = snapshot(vec![], ConnectionState::Reconnecting);
        assert_eq!(status_banner(&reconnecting), Some(StatusBanner::Connecting));

        let mut disabled = snapshot(vec![], ConnectionState::Disconnected);
        disabled.preferences = Preferences {
            live_updates_enabled: false,
            ..Default::default()
        };
        assert_eq!(status_banner(&disabled), Some(StatusBanner::LiveUpdatesDisabled));
    }

    #[test]
    fn test_theme_changes_subtype_color() {
        for subtype in [Subtype::Send, Subtype::Receive, Subtype::Change, Subtype::Epoch] {
            assert_ne!(
                subtype_color(subtype, Theme::Light),
                subtype_color(subtype, Theme::Dark)
            );
        }
    }
}
