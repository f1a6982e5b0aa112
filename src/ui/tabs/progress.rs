use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus};
use crate::models::ObservationCategory;
use crate::summaries;
use crate::ui::styles;
use crate::utils::truncate_string;

/// Render the Progress tab - child picker, observation log, and the
/// milestone tracker for the selected child
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if app.cache.children.is_initial_loading(&()) {
        super::render_loading(frame, area, "Progress");
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(45),
            Constraint::Percentage(30),
        ])
        .split(area);

    render_child_list(frame, app, chunks[0]);
    render_observations(frame, app, chunks[1]);
    render_milestones(frame, app, chunks[2]);
}

fn render_child_list(frame: &mut Frame, app: &App, area: Rect) {
    let roster = app.cache.children.items(&());
    let focused = matches!(app.focus, Focus::List);

    let items: Vec<ListItem> = roster
        .iter()
        .map(|child| ListItem::new(child.full_name()))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!(" Children ({}) ", roster.len()))
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    state.select(Some(app.progress_child_selection));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_observations(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);
    let Some(child_id) = app.progress_child_id() else {
        let block = Block::default()
            .title(" Observations ")
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(focused));
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "No children registered",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    if app.cache.observations_by_child.is_initial_loading(&child_id) {
        super::render_loading(frame, area, "Observations");
        return;
    }

    let observations = app.visible_observations();

    let items: Vec<ListItem> = observations
        .iter()
        .map(|obs| {
            let mut lines = vec![Line::from(vec![
                Span::styled(
                    format!("{}  ", obs.date.format("%b %d")),
                    styles::muted_style(),
                ),
                Span::styled(obs.title.clone(), styles::list_item_style()),
                Span::styled(format!("  [{}]", obs.category), styles::highlight_style()),
            ])];
            lines.push(Line::from(Span::styled(
                format!("        {}", truncate_string(&obs.details, 60)),
                styles::muted_style(),
            )));
            ListItem::new(lines)
        })
        .collect();

    let filter_label = app
        .progress_category_filter
        .map(|c| format!("{}", c))
        .unwrap_or_else(|| "all".to_string());
    let title = format!(
        " Observations ({}) - [c] filter: {}  [o] new  [e/x] edit/delete ",
        observations.len(),
        filter_label
    );

    if items.is_empty() {
        let block = Block::default()
            .title(title)
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(focused));
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "No observations recorded",
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
    state.select(Some(app.observation_selection));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_milestones(frame: &mut Frame, app: &App, area: Rect) {
    let Some(child_id) = app.progress_child_id() else {
        return;
    };

    if app.cache.milestones_by_child.is_initial_loading(&child_id) {
        super::render_loading(frame, area, "Milestones");
        return;
    }

    let milestones = app.cache.milestones_by_child.items(&child_id);
    let mut lines = vec![];

    for category in ObservationCategory::ALL {
        let (achieved, total) = summaries::category_completion(milestones, category);
        if total == 0 {
            continue;
        }
        let pct = summaries::completion_percentage(milestones, category);
        lines.push(Line::from(vec![
            Span::styled(category.to_string(), styles::highlight_style()),
            Span::styled(
                format!("  {}/{} ({}%)", achieved, total, pct),
                styles::muted_style(),
            ),
        ]));
        for milestone in milestones.iter().filter(|m| m.category == category) {
            let (marker, style) = if milestone.achieved {
                ("✓", styles::success_style())
            } else {
                ("○", styles::muted_style())
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {} ", marker), style),
                Span::raw(milestone.description.clone()),
            ]));
        }
        lines.push(Line::from(""));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No milestones tracked",
            styles::muted_style(),
        )));
    }

    let block = Block::default()
        .title(" Milestones ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(block);
    frame.render_widget(paragraph, area);
}
