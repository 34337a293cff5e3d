//! Preciario - a point-of-sale price checker for the terminal.
//!
//! Scans or typed queries are looked up against a published price sheet,
//! with a saved copy used whenever the sheet cannot be reached.

mod app;
mod cli;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use preciario_core::Config;

use app::{open_price_book, App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file written inside the data directory while the TUI owns the screen.
const LOG_FILE_NAME: &str = "preciario.log";

const USAGE: &str = "\
Usage: preciario [OPTIONS]

Options:
  --lookup <QUERY>   Look up a code or description and print the prices
  --status           Show where the price list comes from and exit
  --write-config     Write the current configuration to the config file
  --reset            Delete the saved price list and history
  -h, --help         Show this help

Environment:
  PRECIARIO_SHEET_URL   Override the published sheet URL
  PRECIARIO_DATA_DIR    Override the data directory
  RUST_LOG              Log filter (default: warn)";

fn env_filter() -> EnvFilter {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to stderr for one-shot commands.
fn init_cli_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

/// Log to a file while the terminal is in raw mode.
/// The returned guard must live until shutdown so buffered lines get flushed.
fn init_tui_tracing(data_dir: &Path) -> Option<WorkerGuard> {
    if std::fs::create_dir_all(data_dir).is_err() {
        return None;
    }
    let appender = tracing_appender::rolling::never(data_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Some(guard)
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("-h") | Some("--help") => {
            println!("{}", USAGE);
            return Ok(());
        }
        Some("--lookup") => {
            init_cli_tracing();
            let query = args[1..].join(" ");
            if query.trim().is_empty() {
                eprintln!("--lookup needs a code or description\n\n{}", USAGE);
                std::process::exit(2);
            }
            return cli::run_lookup(&load_config(), &query).await;
        }
        Some("--status") => {
            init_cli_tracing();
            return cli::run_status(&load_config()).await;
        }
        Some("--reset") => {
            init_cli_tracing();
            return cli::run_reset(&load_config());
        }
        Some("--write-config") => {
            init_cli_tracing();
            let config = load_config();
            config.save()?;
            println!("Configuration written");
            return Ok(());
        }
        Some(other) => {
            eprintln!("Unknown option: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
        None => {}
    }

    let config = load_config();
    let data_dir = config.data_dir()?;
    let _log_guard = init_tui_tracing(&data_dir);
    info!("Preciario starting");

    let book = open_price_book(&config)?;
    let mut app = App::new(book);
    app.start();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Preciario shutting down");
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Windows reports releases too
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
