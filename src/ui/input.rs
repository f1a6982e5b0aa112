//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use crate::app::{App, AppState, Focus, LoginFocus, MessagesView, Tab, PAGE_SCROLL_SIZE};
use crate::models::AttendanceStatus;

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle login overlay
    if matches!(app.state, AppState::LoggingIn) {
        return handle_login_input(app, key).await;
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle delete confirmation
    if matches!(app.state, AppState::ConfirmingDelete) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                app.confirm_delete();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.cancel_delete();
            }
            _ => {}
        }
        return Ok(false);
    }

    // Handle open form
    if matches!(app.state, AppState::EditingForm) {
        return handle_form_input(app, key);
    }

    // Handle search mode
    if matches!(app.state, AppState::Searching) {
        return handle_search_input(app, key);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('1') => switch_tab(app, Tab::Dashboard),
        KeyCode::Char('2') => switch_tab(app, Tab::Children),
        KeyCode::Char('3') => switch_tab(app, Tab::Attendance),
        KeyCode::Char('4') => switch_tab(app, Tab::Progress),
        KeyCode::Char('5') => switch_tab(app, Tab::Messages),
        KeyCode::Right => {
            let next = app.current_tab.next();
            switch_tab(app, next);
        }
        KeyCode::Left => {
            let prev = app.current_tab.prev();
            switch_tab(app, prev);
        }
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::List => Focus::Detail,
                Focus::Detail => Focus::List,
            };
        }
        KeyCode::Char('r') => {
            app.refresh_all();
        }
        KeyCode::Char('L') => {
            app.logout();
        }
        _ => return handle_tab_input(app, key),
    }

    Ok(false)
}

fn switch_tab(app: &mut App, tab: Tab) {
    app.current_tab = tab;
    app.focus = Focus::List;
    app.ensure_tab_data();
}

fn handle_tab_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.current_tab {
        Tab::Dashboard => {}
        Tab::Children => handle_children_input(app, key),
        Tab::Attendance => handle_attendance_input(app, key),
        Tab::Progress => handle_progress_input(app, key),
        Tab::Messages => handle_messages_input(app, key),
    }
    Ok(false)
}

fn handle_children_input(app: &mut App, key: KeyEvent) {
    let count = app.visible_children().len();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.children_selection = app.children_selection.saturating_sub(1);
            app.ensure_selected_child_record();
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if count > 0 {
                app.children_selection = (app.children_selection + 1).min(count - 1);
            }
            app.ensure_selected_child_record();
        }
        KeyCode::PageUp => {
            app.children_selection = app.children_selection.saturating_sub(PAGE_SCROLL_SIZE);
            app.ensure_selected_child_record();
        }
        KeyCode::PageDown => {
            if count > 0 {
                app.children_selection =
                    (app.children_selection + PAGE_SCROLL_SIZE).min(count - 1);
            }
            app.ensure_selected_child_record();
        }
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
        }
        KeyCode::Char('s') => {
            app.child_sort_column = app.child_sort_column.next();
            app.children_selection = 0;
        }
        KeyCode::Char('S') => {
            app.child_sort_ascending = !app.child_sort_ascending;
        }
        KeyCode::Char('n') => app.open_register_child_form(),
        KeyCode::Char('e') => app.open_edit_child_form(),
        KeyCode::Char('x') => app.request_delete_child(),
        _ => {}
    }
}

fn handle_attendance_input(app: &mut App, key: KeyEvent) {
    let count = app.cache.children.items(&()).len();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.attendance_selection = app.attendance_selection.saturating_sub(1);
            app.ensure_selected_attendance_history();
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if count > 0 {
                app.attendance_selection = (app.attendance_selection + 1).min(count - 1);
                app.ensure_selected_attendance_history();
            }
        }
        KeyCode::Char('[') => app.shift_attendance_date(-1),
        KeyCode::Char(']') => app.shift_attendance_date(1),
        KeyCode::Char('t') => {
            app.attendance_date = app.today;
            app.ensure_attendance_for(app.today);
        }
        KeyCode::Char('p') => app.quick_mark_attendance(AttendanceStatus::Present),
        KeyCode::Char('a') => app.quick_mark_attendance(AttendanceStatus::Absent),
        KeyCode::Char('u') => app.quick_mark_attendance(AttendanceStatus::NotScheduled),
        KeyCode::Enter => app.open_attendance_form(),
        _ => {}
    }
}

fn handle_progress_input(app: &mut App, key: KeyEvent) {
    let count = app.cache.children.items(&()).len();
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            if matches!(app.focus, Focus::List) {
                app.progress_child_selection = app.progress_child_selection.saturating_sub(1);
                app.observation_selection = 0;
                app.ensure_progress_data();
            } else {
                app.observation_selection = app.observation_selection.saturating_sub(1);
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if matches!(app.focus, Focus::List) {
                if count > 0 {
                    app.progress_child_selection =
                        (app.progress_child_selection + 1).min(count - 1);
                    app.observation_selection = 0;
                    app.ensure_progress_data();
                }
            } else {
                let observations = app.visible_observations().len();
                if observations > 0 {
                    app.observation_selection =
                        (app.observation_selection + 1).min(observations - 1);
                }
            }
        }
        KeyCode::Char('c') => app.cycle_category_filter(),
        KeyCode::Char('o') => app.open_observation_form(),
        KeyCode::Char('e') => app.open_edit_observation_form(),
        KeyCode::Char('x') => app.request_delete_observation(),
        _ => {}
    }
}

fn handle_messages_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => match app.messages_view {
            MessagesView::Inbox => {
                app.message_selection = app.message_selection.saturating_sub(1);
                app.ensure_selected_conversation();
            }
            MessagesView::Announcements => {
                app.announcement_selection = app.announcement_selection.saturating_sub(1);
            }
        },
        KeyCode::Down | KeyCode::Char('j') => match app.messages_view {
            MessagesView::Inbox => {
                let count = app.cache.messages.items(&()).len();
                if count > 0 {
                    app.message_selection = (app.message_selection + 1).min(count - 1);
                }
                app.ensure_selected_conversation();
            }
            MessagesView::Announcements => {
                let count = app.cache.announcements.items(&()).len();
                if count > 0 {
                    app.announcement_selection = (app.announcement_selection + 1).min(count - 1);
                }
            }
        },
        KeyCode::Char('i') => app.messages_view = MessagesView::Inbox,
        KeyCode::Char('A') => app.messages_view = MessagesView::Announcements,
        KeyCode::Char('m') => {
            if app.messages_view == MessagesView::Inbox {
                app.open_reply_form();
            }
        }
        KeyCode::Char('a') => app.open_announcement_form(),
        _ => {}
    }
}

fn handle_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => app.close_form(),
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab | KeyCode::Down => {
            if let Some(ref mut form) = app.form {
                form.focus_next();
            }
        }
        KeyCode::BackTab | KeyCode::Up => {
            if let Some(ref mut form) = app.form {
                form.focus_prev();
            }
        }
        KeyCode::Backspace => {
            if let Some(ref mut form) = app.form {
                let focus = form.focus;
                form.fields[focus].value.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(ref mut form) = app.form {
                let focus = form.focus;
                form.fields[focus].value.push(c);
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.search_query.clear();
            app.state = AppState::Normal;
            app.children_selection = 0;
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            app.children_selection = 0;
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            app.children_selection = 0;
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Without a session there is nothing behind the overlay
            if app.is_authenticated() {
                app.state = AppState::Normal;
            }
        }
        KeyCode::Tab | KeyCode::Down => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Email,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                let _ = app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if app.login_email.len() < App::max_login_field_length(LoginFocus::Email) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if app.login_password.len() < App::max_login_field_length(LoginFocus::Password) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}
