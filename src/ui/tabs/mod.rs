//! Per-tab render functions.

pub mod attendance;
pub mod children;
pub mod dashboard;
pub mod messages;
pub mod progress;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::styles;

/// Shown while a query is in flight with nothing cached yet. Distinct
/// from an empty collection, which renders the tab's own empty state.
pub(crate) fn render_loading(frame: &mut Frame, area: Rect, title: &str) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    let paragraph =
        Paragraph::new(Line::from(Span::styled("  Loading...", styles::muted_style())))
            .block(block);
    frame.render_widget(paragraph, area);
}
