//! NurseryDesk - a terminal dashboard for nursery administrators.
//!
//! This application provides a fast, keyboard-driven interface for the
//! daily running of a childcare setting: the roster, the attendance
//! register, developmental progress, and parent communication.

mod api;
mod app;
mod auth;
mod cache;
mod config;
mod models;
mod summaries;
mod ui;
mod utils;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use auth::CredentialStore;
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Initialize the tracing subscriber for logging.
/// Logs go to a daily-rolling file in the state directory so they never
/// write over the TUI. Use RUST_LOG to control the level.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config::Config::default()
        .state_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("."))
        .join("logs");
    let Ok(()) = std::fs::create_dir_all(&log_dir) else {
        return None;
    };

    let appender = tracing_appender::rolling::daily(log_dir, "nurserydesk.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--login" {
        return login_cli().await;
    }

    let _guard = init_tracing();
    info!("NurseryDesk starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new()?;

    if app.is_authenticated() {
        app.ensure_tab_data();
    } else {
        app.start_login();
    }

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("NurseryDesk shutting down");
    Ok(())
}

/// Prompt for credentials on the terminal and store the session, so the
/// TUI starts signed in. Useful on machines where typing a password into
/// the overlay is awkward.
async fn login_cli() -> Result<()> {
    println!("\n=== NurseryDesk Login ===\n");

    let config = config::Config::load().unwrap_or_default();

    let email = match config.last_email {
        Some(ref last) => {
            print!("Email [{}]: ", last);
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            let input = input.trim();
            if input.is_empty() {
                last.clone()
            } else {
                input.to_string()
            }
        }
        None => {
            print!("Email: ");
            io::stdout().flush()?;
            let mut input = String::new();
            io::stdin().read_line(&mut input)?;
            input.trim().to_string()
        }
    };

    let password = if CredentialStore::has_credentials(&email) {
        print!("Use stored password? [Y/n]: ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "n" {
            CredentialStore::get_password(&email)?
        } else {
            rpassword::prompt_password("Password: ")?
        }
    } else {
        rpassword::prompt_password("Password: ")?
    };

    println!("\nAuthenticating...");

    let base_url = std::env::var("NURSERYDESK_API_URL")
        .ok()
        .or_else(|| config.api_base_url.clone())
        .unwrap_or_else(|| api::DEFAULT_BASE_URL.to_string());
    let api = api::ApiClient::new(base_url)?;
    let response = api
        .login(&email, &password)
        .await
        .map_err(|e| anyhow::anyhow!(e.message()))?;

    CredentialStore::store(&email, &password)?;

    let mut config = config;
    config.last_email = Some(email);
    let state_dir = config
        .state_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("./state"));
    config.save()?;

    let mut session = auth::Session::new(state_dir);
    session.update(auth::SessionData {
        token: response.token,
        user: response.user,
        created_at: chrono::Utc::now(),
    });
    session.save()?;

    println!("Login successful!\n");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Apply completed background fetches and mutations
        app.check_background_tasks();
        app.prune_notices();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
