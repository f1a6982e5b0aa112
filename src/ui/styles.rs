// Allow dead code: Style functions defined for consistent UI
#![allow(dead_code)]

use ratatui::style::{Color, Modifier, Style};

use crate::models::{AttendanceStatus, ChildStatus, Priority};

// Color palette
pub const PRIMARY: Color = Color::Rgb(64, 128, 192);
pub const SECONDARY: Color = Color::Rgb(96, 160, 96);
pub const ACCENT: Color = Color::Rgb(192, 160, 64);
pub const ERROR: Color = Color::Rgb(192, 64, 64);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(48, 48, 64);

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn search_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default()
        .fg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Badge style for a child's enrollment status
pub fn child_status_style(status: ChildStatus) -> Style {
    match status {
        ChildStatus::New => Style::default().fg(ACCENT),
        ChildStatus::Active => Style::default().fg(SECONDARY),
        ChildStatus::Leaving => Style::default().fg(MUTED),
    }
}

/// Cell style for a day's attendance status
pub fn attendance_style(status: AttendanceStatus) -> Style {
    match status {
        AttendanceStatus::Present => Style::default().fg(SECONDARY),
        AttendanceStatus::Absent => Style::default().fg(ERROR),
        AttendanceStatus::NotScheduled => Style::default().fg(MUTED),
    }
}

/// Badge style for an announcement's priority. Each priority gets its own
/// color so urgency is readable at a glance.
pub fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Style::default().fg(ERROR).add_modifier(Modifier::BOLD),
        Priority::Normal => Style::default().fg(PRIMARY),
        Priority::Low => Style::default().fg(MUTED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_styles_pairwise_distinct() {
        let styles = [
            priority_style(Priority::High),
            priority_style(Priority::Normal),
            priority_style(Priority::Low),
        ];
        for i in 0..styles.len() {
            for j in (i + 1)..styles.len() {
                assert_ne!(styles[i], styles[j]);
            }
        }
    }

    #[test]
    fn test_attendance_styles_distinct() {
        assert_ne!(
            attendance_style(AttendanceStatus::Present),
            attendance_style(AttendanceStatus::Absent)
        );
        assert_ne!(
            attendance_style(AttendanceStatus::Absent),
            attendance_style(AttendanceStatus::NotScheduled)
        );
    }
}
