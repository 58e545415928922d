use {
    super::renderer::{self, FeedRow},
    crate::feed::FeedSnapshot,
    ratatui::{
        layout::{Constraint, Layout as RatLayout, Rect},
        style::{Modifier, Style},
        text::{Line, Span},
        widgets::{Block, Borders, List, ListItem, Paragraph},
        Frame,
    },
};

/// Render the main UI layout
pub fn render_layout(f: &mut Frame, area: Rect, snapshot: &FeedSnapshot, rows: &[FeedRow]) {
    let theme = snapshot.preferences.theme;
    let base = Style::default()
        .fg(renderer::foreground(theme))
        .bg(renderer::background(theme));

    let chunks = RatLayout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header + status banner
            Constraint::Min(0),    // Timeline
            Constraint::Length(3), // Footer/Preferences
        ])
        .split(area);

    render_header(f, chunks[0], snapshot, base);
    render_timeline(f, chunks[1], snapshot, rows, base);
    render_footer(f, chunks[2], snapshot, base);
}

fn render_header(f: &mut Frame, area: Rect, snapshot: &FeedSnapshot, base: Style) {
    let header = Block::default()
        .borders(Borders::ALL)
        .title("Recent Transactions")
        .style(base);

    let mut text = vec![Line::from(vec![
        Span::styled("Status: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            snapshot.connection.to_string(),
            Style::default().fg(renderer::connection_color(snapshot.connection)),
        ),
        Span::raw(" | "),
        Span::styled("CPS: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("{:.2}", snapshot.confirmations_per_second)),
    ])];

    if let Some(banner) = renderer::status_banner(snapshot) {
        text.push(Line::from(Span::styled(
            banner.message(),
            Style::default().fg(renderer::muted(snapshot.preferences.theme)),
        )));
    }

    f.render_widget(Paragraph::new(text).block(header), area);
}

fn render_timeline(f: &mut Frame, area: Rect, snapshot: &FeedSnapshot, rows: &[FeedRow], base: Style) {
    let theme = snapshot.preferences.theme;
    let muted = Style::default().fg(renderer::muted(theme));

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let color = renderer::subtype_color(row.subtype, theme);

            let mut first = vec![Span::styled(
                format!("[{}]", row.subtype),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )];
            if let Some(amount) = &row.amount {
                first.push(Span::raw(" "));
                first.push(Span::styled(amount.clone(), Style::default().fg(color)));
            }
            first.push(Span::raw(" "));
            first.push(Span::styled(row.age.clone(), muted));

            let mut lines = vec![Line::from(first)];
            if let Some(alias) = &row.alias {
                lines.push(Line::from(Span::styled(
                    alias.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
            }
            lines.push(Line::from(row.account.clone()));
            lines.push(Line::from(Span::styled(row.hash.clone(), muted)));
            lines.push(Line::default());

            ListItem::new(lines)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Timeline")
            .style(base),
    );

    f.render_widget(list, area);
}

fn render_footer(f: &mut Frame, area: Rect, snapshot: &FeedSnapshot, base: Style) {
    let prefs = snapshot.preferences;
    let on_off = |enabled: bool| if enabled { "on" } else { "off" };

    let text = vec![Line::from(vec![
        Span::styled("[l] ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("Live updates: {}", on_off(prefs.live_updates_enabled))),
        Span::raw(" | "),
        Span::styled("[h] ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("Include amounts under 1: {}", on_off(!prefs.hide_below_threshold))),
        Span::raw(" | "),
        Span::styled("[t] ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!("Theme: {:?}", prefs.theme)),
        Span::raw(" | "),
        Span::raw(format!(
            "Shown: {} Malformed: {}",
            snapshot.transactions.len(),
            snapshot.stats.malformed
        )),
        Span::raw(" | q: quit"),
    ])];

    let footer = Block::default().borders(Borders::ALL).title("Preferences").style(base);

    f.render_widget(Paragraph::new(text).block(footer), area);
}
