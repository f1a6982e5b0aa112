use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use chrono::Datelike;

use crate::app::{App, Focus};
use crate::models::AttendanceStatus;
use crate::summaries;
use crate::ui::styles;
use crate::utils::format_date;

/// Render the Attendance tab - the day's register joined against the
/// roster, with the selected child's history summarized on the right
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if app.cache.children.is_initial_loading(&())
        || app.cache.attendance_by_date.is_initial_loading(&app.attendance_date)
    {
        super::render_loading(frame, area, "Attendance");
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_register(frame, app, chunks[0]);
    render_history(frame, app, chunks[1]);
}

fn render_register(frame: &mut Frame, app: &App, area: Rect) {
    let roster = app.cache.children.items(&());
    let records = app.cache.attendance_by_date.items(&app.attendance_date);
    let focused = matches!(app.focus, Focus::List);

    let header = Row::new([
        Cell::from("Name"),
        Cell::from("Status"),
        Cell::from("In"),
        Cell::from("Out"),
        Cell::from("Notes"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = roster
        .iter()
        .enumerate()
        .map(|(i, child)| {
            let style = if i == app.attendance_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            // A child without a record for the day shows as unmarked
            let record = records.iter().find(|r| r.child_id == child.id);
            let (status_text, status_style) = match record {
                Some(r) => (r.status.to_string(), styles::attendance_style(r.status)),
                None => ("unmarked".to_string(), styles::muted_style()),
            };
            let arrival = record
                .and_then(|r| r.arrival_time.clone())
                .unwrap_or_else(|| "-".to_string());
            let pickup = record
                .and_then(|r| r.pickup_time.clone())
                .unwrap_or_else(|| "-".to_string());
            let notes = record
                .and_then(|r| r.notes.clone())
                .unwrap_or_default();

            Row::new(vec![
                Cell::from(child.full_name()),
                Cell::from(Span::styled(status_text, status_style)),
                Cell::from(arrival),
                Cell::from(pickup),
                Cell::from(notes),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(32), // Name
        Constraint::Length(14),     // Status
        Constraint::Length(6),      // In
        Constraint::Length(6),      // Out
        Constraint::Fill(2),        // Notes
    ];

    let present = summaries::present_today(records);
    let title = format!(
        " {} - {} present - [p/a/u] mark  [Enter] edit  [ and ] day ",
        format_date(app.attendance_date),
        present
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.attendance_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_history(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);
    let roster = app.cache.children.items(&());
    let selected = roster.get(app.attendance_selection);

    let content = match selected {
        Some(child) => {
            let mut lines = vec![
                Line::from(Span::styled(child.full_name(), styles::title_style())),
                Line::from(""),
            ];

            if app.cache.attendance_by_child.is_initial_loading(&child.id) {
                lines.push(Line::from(Span::styled(
                    "Loading history...",
                    styles::muted_style(),
                )));
            } else {
                let history = app.cache.attendance_by_child.items(&child.id);
                let percentage = summaries::attendance_percentage(history);
                let present = history
                    .iter()
                    .filter(|r| r.status == AttendanceStatus::Present)
                    .count();
                let absent = history
                    .iter()
                    .filter(|r| r.status == AttendanceStatus::Absent)
                    .count();

                lines.push(Line::from(vec![
                    Span::styled("Attendance: ", styles::muted_style()),
                    Span::styled(format!("{}%", percentage), styles::highlight_style()),
                    Span::styled(
                        format!("  ({} present, {} absent)", present, absent),
                        styles::muted_style(),
                    ),
                ]));

                let month_key = (app.attendance_date.year(), app.attendance_date.month());
                let month: Vec<_> = app
                    .cache
                    .attendance_by_month
                    .items(&month_key)
                    .iter()
                    .filter(|r| r.child_id == child.id)
                    .cloned()
                    .collect();
                lines.push(Line::from(vec![
                    Span::styled(
                        format!("{}: ", app.attendance_date.format("%B")),
                        styles::muted_style(),
                    ),
                    Span::styled(
                        format!("{}%", summaries::attendance_percentage(&month)),
                        styles::highlight_style(),
                    ),
                    Span::styled(
                        format!("  ({} days recorded)", month.len()),
                        styles::muted_style(),
                    ),
                ]));
                lines.push(Line::from(""));

                lines.push(Line::from(Span::styled(
                    "Recent days",
                    styles::highlight_style(),
                )));
                let mut recent: Vec<_> = history.iter().collect();
                recent.sort_by(|a, b| b.date.cmp(&a.date));
                for record in recent.iter().take(14) {
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("{}  ", record.date.format("%b %d")),
                            styles::muted_style(),
                        ),
                        Span::styled(
                            record.status.to_string(),
                            styles::attendance_style(record.status),
                        ),
                    ]));
                }
                if history.is_empty() {
                    lines.push(Line::from(Span::styled(
                        "No records yet",
                        styles::muted_style(),
                    )));
                }
            }

            lines
        }
        None => vec![Line::from(Span::styled(
            "No children registered",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(" History ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let paragraph = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(paragraph, area);
}
