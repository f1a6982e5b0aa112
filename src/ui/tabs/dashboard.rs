use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::summaries;
use crate::ui::styles;
use crate::utils::truncate_string;

/// Render the Dashboard tab - stat cards over recent activity
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(5)])
        .split(area);

    render_stat_cards(frame, app, chunks[0]);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    render_recent_observations(frame, app, lower[0]);
    render_announcements_panel(frame, app, lower[1]);
}

fn render_stat_cards(frame: &mut Frame, app: &App, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let children = app.cache.children.items(&());
    let active = summaries::active_children(children);
    let loading = app.cache.children.is_initial_loading(&());
    render_card(
        frame,
        cards[0],
        "Active Children",
        if loading { "...".to_string() } else { active.to_string() },
        format!("{} on roster", children.len()),
    );

    let today_records = app.cache.attendance_by_date.items(&app.today);
    let present = summaries::present_today(today_records);
    let loading = app.cache.attendance_by_date.is_initial_loading(&app.today);
    render_card(
        frame,
        cards[1],
        "Present Today",
        if loading { "...".to_string() } else { present.to_string() },
        format!(
            "of {} active, {}% attendance",
            active,
            summaries::attendance_percentage(today_records)
        ),
    );

    let observations = app.cache.observations.items(&());
    let this_week = summaries::observations_this_week(observations, app.today);
    let loading = app.cache.observations.is_initial_loading(&());
    render_card(
        frame,
        cards[2],
        "Observations",
        if loading { "...".to_string() } else { this_week.to_string() },
        "this week".to_string(),
    );

    let messages = app.cache.messages.items(&());
    let unread = summaries::unread_count(messages);
    let senders = summaries::unread_senders(messages);
    let loading = app.cache.messages.is_initial_loading(&());
    render_card(
        frame,
        cards[3],
        "Unread Messages",
        if loading { "...".to_string() } else { unread.to_string() },
        format!("from {} parents", senders),
    );
}

fn render_card(frame: &mut Frame, area: Rect, title: &str, value: String, caption: String) {
    let lines = vec![
        Line::from(Span::styled(
            format!("  {}", value),
            styles::title_style(),
        )),
        Line::from(Span::styled(format!("  {}", caption), styles::muted_style())),
    ];

    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::highlight_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn render_recent_observations(frame: &mut Frame, app: &App, area: Rect) {
    if app.cache.observations.is_initial_loading(&()) {
        super::render_loading(frame, area, "Recent Observations");
        return;
    }

    let observations = app.cache.observations.items(&());
    let children = app.cache.children.items(&());

    let mut sorted: Vec<_> = observations.iter().collect();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));

    let mut lines = vec![];
    for obs in sorted.iter().take(12) {
        let child_name = children
            .iter()
            .find(|c| c.id == obs.child_id)
            .map(|c| c.full_name())
            .unwrap_or_else(|| obs.child_id.clone());
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}  ", obs.date.format("%b %d")),
                styles::muted_style(),
            ),
            Span::styled(child_name, styles::list_item_style()),
            Span::styled(
                format!("  {}", truncate_string(&obs.title, 30)),
                styles::muted_style(),
            ),
        ]));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No observations recorded",
            styles::muted_style(),
        )));
    }

    let block = Block::default()
        .title(" Recent Observations ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    frame.render_widget(paragraph, area);
}

fn render_announcements_panel(frame: &mut Frame, app: &App, area: Rect) {
    if app.cache.announcements.is_initial_loading(&()) {
        super::render_loading(frame, area, "Announcements");
        return;
    }

    let announcements = app.cache.announcements.items(&());
    let mut sorted: Vec<_> = announcements.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut lines = vec![];
    for ann in sorted.iter().take(6) {
        lines.push(Line::from(vec![
            Span::styled(
                format!("[{}] ", ann.priority),
                styles::priority_style(ann.priority),
            ),
            Span::styled(ann.title.clone(), styles::list_item_style()),
        ]));
        lines.push(Line::from(Span::styled(
            format!("  {}", truncate_string(&ann.content, 60)),
            styles::muted_style(),
        )));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No announcements",
            styles::muted_style(),
        )));
    }

    let block = Block::default()
        .title(" Announcements ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    frame.render_widget(paragraph, area);
}
