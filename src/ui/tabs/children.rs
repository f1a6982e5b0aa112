use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::{App, AppState, Focus};
use crate::models::ChildSortColumn;
use crate::summaries;
use crate::ui::styles;
use crate::utils::{format_optional, format_phone};

/// Render the Children tab - sortable roster table with a detail panel
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if app.cache.children.is_initial_loading(&()) {
        super::render_loading(frame, area, "Children");
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_table(frame, app, chunks[0]);
    render_detail(frame, app, chunks[1]);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let children = app.visible_children();
    let focused = matches!(app.focus, Focus::List);

    let sort_indicator = |col: ChildSortColumn| {
        if app.child_sort_column == col {
            if app.child_sort_ascending { " ▲" } else { " ▼" }
        } else {
            ""
        }
    };

    let header_cells = [
        Cell::from(format!("Name{}", sort_indicator(ChildSortColumn::Name))),
        Cell::from(format!("Age{}", sort_indicator(ChildSortColumn::Age))),
        Cell::from(format!("Status{}", sort_indicator(ChildSortColumn::Status))),
        Cell::from("Guardian"),
    ];

    let header = Row::new(header_cells)
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = children
        .iter()
        .enumerate()
        .map(|(i, child)| {
            let style = if i == app.children_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            let age = summaries::age_in_years(child.date_of_birth, app.today);

            Row::new(vec![
                Cell::from(child.full_name()),
                Cell::from(format!("{:>3}", age)),
                Cell::from(Span::styled(
                    child.status.to_string(),
                    styles::child_status_style(child.status),
                )),
                Cell::from(child.guardian.name.clone()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(35), // Name
        Constraint::Length(4),      // Age
        Constraint::Length(8),      // Status
        Constraint::Fill(2),        // Guardian
    ];

    let title = if app.state == AppState::Searching || !app.search_query.is_empty() {
        format!(" Children ({}) - /{} ", children.len(), app.search_query)
    } else {
        format!(" Children ({}) - [s]ort [n]ew [e]dit [x] remove ", children.len())
    };

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
    state.select(Some(app.children_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);
    let placeholder = "-";

    let content = match app.detail_child() {
        Some(child) => {
            let mut lines = vec![];

            lines.push(Line::from(Span::styled(
                child.full_name(),
                styles::title_style(),
            )));
            lines.push(Line::from(vec![
                Span::styled(
                    child.status.to_string(),
                    styles::child_status_style(child.status),
                ),
                Span::styled(
                    format!(
                        "  born {}",
                        child.date_of_birth.format("%b %d, %Y")
                    ),
                    styles::muted_style(),
                ),
            ]));
            lines.push(Line::from(""));

            lines.push(Line::from(Span::styled(
                "Guardian",
                styles::highlight_style(),
            )));
            lines.push(Line::from(vec![
                Span::styled("Name:    ", styles::muted_style()),
                Span::raw(child.guardian.name.clone()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Email:   ", styles::muted_style()),
                Span::raw(child.guardian.email.clone()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Phone:   ", styles::muted_style()),
                Span::raw(format_phone(&child.guardian.phone)),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Address: ", styles::muted_style()),
                Span::raw(format_optional(&child.guardian.address, placeholder)),
            ]));
            lines.push(Line::from(""));

            lines.push(Line::from(Span::styled(
                "Medical",
                styles::highlight_style(),
            )));
            let allergies = if child.medical.allergies.is_empty() {
                "None recorded".to_string()
            } else {
                child.medical.allergies.join(", ")
            };
            let allergy_style = if child.medical.allergies.is_empty() {
                styles::list_item_style()
            } else {
                styles::error_style()
            };
            lines.push(Line::from(vec![
                Span::styled("Allergies:  ", styles::muted_style()),
                Span::styled(allergies, allergy_style),
            ]));
            let conditions = if child.medical.conditions.is_empty() {
                "None recorded".to_string()
            } else {
                child.medical.conditions.join(", ")
            };
            lines.push(Line::from(vec![
                Span::styled("Conditions: ", styles::muted_style()),
                Span::raw(conditions),
            ]));
            if let Some(ref notes) = child.medical.notes {
                lines.push(Line::from(vec![
                    Span::styled("Notes:      ", styles::muted_style()),
                    Span::raw(notes.clone()),
                ]));
            }
            lines.push(Line::from(""));

            lines.push(Line::from(Span::styled(
                "Emergency Contacts",
                styles::highlight_style(),
            )));
            if child.emergency_contacts.is_empty() {
                lines.push(Line::from(Span::styled(
                    "None recorded",
                    styles::muted_style(),
                )));
            }
            for contact in &child.emergency_contacts {
                lines.push(Line::from(vec![
                    Span::raw(contact.name.clone()),
                    Span::styled(
                        format!("  {}", format_phone(&contact.phone)),
                        styles::muted_style(),
                    ),
                ]));
            }

            lines
        }
        None => vec![Line::from(Span::styled(
            "No children registered",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(" Details ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let paragraph = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(paragraph, area);
}
