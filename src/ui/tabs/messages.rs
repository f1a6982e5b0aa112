use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus, MessagesView};
use crate::ui::styles;
use crate::utils::{format_timestamp, truncate_string};

/// Render the Messages tab - parent inbox or announcements, toggled
/// with [i]/[A]
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match app.messages_view {
        MessagesView::Inbox => render_inbox(frame, app, area),
        MessagesView::Announcements => render_announcements(frame, app, area),
    }
}

fn render_inbox(frame: &mut Frame, app: &App, area: Rect) {
    if app.cache.messages.is_initial_loading(&()) {
        super::render_loading(frame, area, "Inbox");
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    render_message_list(frame, app, chunks[0]);
    render_message_detail(frame, app, chunks[1]);
}

fn render_message_list(frame: &mut Frame, app: &App, area: Rect) {
    let messages = app.cache.messages.items(&());
    let focused = matches!(app.focus, Focus::List);

    let items: Vec<ListItem> = messages
        .iter()
        .map(|message| {
            let subject_style = if message.read {
                styles::muted_style()
            } else {
                styles::list_item_style()
            };
            let marker = if message.read { "  " } else { "● " };
            let mut lines = vec![Line::from(vec![
                Span::styled(marker, styles::highlight_style()),
                Span::styled(message.sender.full_name(), subject_style),
                Span::styled(
                    format!("  {}", format_timestamp(message.created_at)),
                    styles::muted_style(),
                ),
            ])];
            lines.push(Line::from(Span::styled(
                format!("  {}", truncate_string(&message.subject, 40)),
                subject_style,
            )));
            ListItem::new(lines)
        })
        .collect();

    let unread = crate::summaries::unread_count(messages);
    let title = format!(
        " Inbox ({} unread) - [m] reply  [A] announcements ",
        unread
    );

    if items.is_empty() {
        let block = Block::default()
            .title(title)
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(focused));
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "No messages",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    state.select(Some(app.message_selection));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_message_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);
    let messages = app.cache.messages.items(&());
    let selected = messages.get(app.message_selection);

    let content = match selected {
        Some(message) => {
            let mut lines = vec![
                Line::from(Span::styled(message.subject.clone(), styles::title_style())),
                Line::from(vec![
                    Span::styled("From: ", styles::muted_style()),
                    Span::raw(message.sender.full_name()),
                    Span::styled(
                        format!("  {}", format_timestamp(message.created_at)),
                        styles::muted_style(),
                    ),
                ]),
                Line::from(""),
                Line::from(Span::raw(message.content.clone())),
            ];

            // Thread replies, oldest first
            for reply in &message.replies {
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    Span::styled("↳ ", styles::highlight_style()),
                    Span::styled(reply.sender.full_name(), styles::highlight_style()),
                    Span::styled(
                        format!("  {}", format_timestamp(reply.created_at)),
                        styles::muted_style(),
                    ),
                ]));
                lines.push(Line::from(Span::raw(format!("  {}", reply.content))));
            }

            // Other threads from the same sender, newest first
            let conversation = app.cache.messages_by_user.items(&message.sender.id);
            let mut earlier: Vec<_> = conversation
                .iter()
                .filter(|m| m.id != message.id)
                .collect();
            if !earlier.is_empty() {
                earlier.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("Also from {}", message.sender.full_name()),
                    styles::highlight_style(),
                )));
                for other in earlier.iter().take(5) {
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("{}  ", format_timestamp(other.created_at)),
                            styles::muted_style(),
                        ),
                        Span::raw(truncate_string(&other.subject, 45)),
                    ]));
                }
            }

            lines
        }
        None => vec![Line::from(Span::styled("No messages", styles::muted_style()))],
    };

    let block = Block::default()
        .title(" Message ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let paragraph = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_announcements(frame: &mut Frame, app: &App, area: Rect) {
    if app.cache.announcements.is_initial_loading(&()) {
        super::render_loading(frame, area, "Announcements");
        return;
    }

    let announcements = app.cache.announcements.items(&());
    let mut sorted: Vec<_> = announcements.iter().collect();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let items: Vec<ListItem> = sorted
        .iter()
        .map(|ann| {
            let mut lines = vec![Line::from(vec![
                Span::styled(
                    format!("[{}] ", ann.priority),
                    styles::priority_style(ann.priority),
                ),
                Span::styled(ann.title.clone(), styles::list_item_style()),
                Span::styled(
                    format!("  {}", format_timestamp(ann.created_at)),
                    styles::muted_style(),
                ),
            ])];
            lines.push(Line::from(Span::styled(
                format!("  {}", truncate_string(&ann.content, 70)),
                styles::muted_style(),
            )));
            ListItem::new(lines)
        })
        .collect();

    let title = format!(
        " Announcements ({}) - [a] new  [i] inbox ",
        announcements.len()
    );

    if items.is_empty() {
        let block = Block::default()
            .title(title)
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(true));
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "No announcements",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    state.select(Some(app.announcement_selection));

    frame.render_stateful_widget(list, area, &mut state);
}
