mod app;
mod constants;
mod core;
mod export;
mod filter;
mod highlight;
mod input;
mod source;
mod state;
mod ui;

use anyhow::{Context, Result};
use app::{App, AppOptions};
use clap::Parser;
use constants::{
    DEFAULT_TAIL_LINES, INPUT_FIELD_HEIGHT, POLL_INTERVAL_MS, REFRESH_INTERVAL_SECS,
    STATS_PANEL_HEIGHT, STATUS_BAR_HEIGHT,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use filter::{parse_date_input, Level};
use input::InputMode;
use ratatui::{backend::CrosstermBackend, Terminal};
use source::{start_source, LogSource};
use state::AppState;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "botlogs")]
#[command(about = "Live viewer for trading bot logs with filtering and statistics")]
struct Cli {
    #[arg(
        short = 'u',
        long = "url",
        default_value = "http://127.0.0.1:5000",
        help = "Base URL of the bot dashboard serving /logs"
    )]
    url: String,

    #[arg(
        short = 'f',
        long = "file",
        conflicts_with = "url",
        help = "Read the bot's log file directly instead of the dashboard"
    )]
    file: Option<PathBuf>,

    #[arg(long = "tail", default_value_t = DEFAULT_TAIL_LINES, help = "Lines to keep from the end of --file")]
    tail: usize,

    #[arg(
        short = 'n',
        long = "interval",
        default_value_t = REFRESH_INTERVAL_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds between automatic refreshes"
    )]
    interval: u64,

    #[arg(short = 'l', long = "level", help = "Initial level filter: all, INFO, WARNING, ERROR")]
    level: Option<Level>,

    #[arg(short = 's', long = "search", help = "Initial search term (case-insensitive regex)")]
    search: Option<String>,

    #[arg(short = 'd', long = "date", value_parser = parse_date_arg, help = "Initial date filter (YYYY-MM-DD)")]
    date: Option<String>,

    #[arg(long = "log-file", help = "Write diagnostics to this file (RUST_LOG controls verbosity)")]
    log_file: Option<PathBuf>,

    #[arg(long = "no-state", help = "Do not load or save filters in .botlogs-state")]
    no_state: bool,
}

fn parse_date_arg(s: &str) -> Result<String, String> {
    match parse_date_input(s) {
        Ok(Some(date)) => Ok(date),
        Ok(None) => Err("date must not be empty".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

/// The terminal belongs to the UI, so diagnostics only go to a file.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let state_path = (!cli.no_state).then(AppState::default_path);
    let mut state = state_path
        .as_deref()
        .map(AppState::load_from)
        .unwrap_or_default();
    if let Some(level) = cli.level {
        state.criteria.level = level;
    }
    if let Some(search) = cli.search {
        state.criteria.search = search;
    }
    if let Some(date) = cli.date {
        state.criteria.date = Some(date);
    }

    let source = match cli.file {
        Some(path) => LogSource::File {
            path,
            tail: cli.tail,
        },
        None => LogSource::Http { base_url: cli.url },
    };
    let source_label = source.describe();
    info!(source = %source_label, interval = cli.interval, "starting log viewer");

    let (tx, rx) = mpsc::channel();
    let handle = start_source(source, Duration::from_secs(cli.interval), tx)?;

    let options = AppOptions {
        source_label,
        state_path,
        export_dir: std::env::current_dir()?,
    };
    let mut app = App::new(rx, Some(handle), state, options);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.poll_source();
        app.expire_notification(Instant::now());

        let stats_height = if app.show_stats { STATS_PANEL_HEIGHT } else { 0 };
        let chrome = INPUT_FIELD_HEIGHT + stats_height + STATUS_BAR_HEIGHT + 2;
        let visible_height = terminal.size()?.height.saturating_sub(chrome).max(1) as usize;

        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(Duration::from_millis(POLL_INTERVAL_MS))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if app.input_mode != InputMode::Normal {
            if app.handle_input_key(key.code) {
                app.apply_current_input();
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') => return Ok(()),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
            KeyCode::Char('l') => app.cycle_level(),
            KeyCode::Char('/') => app.input_mode = InputMode::SearchEdit,
            KeyCode::Char('d') => app.input_mode = InputMode::DateEdit,
            KeyCode::Char('r') => app.request_refresh(),
            KeyCode::Char('c') => app.clear(),
            KeyCode::Char('e') => app.export(),
            KeyCode::Char('i') => app.toggle_stats(),
            KeyCode::Char('g') | KeyCode::Home => app.log_view.scroll_to_start(),
            KeyCode::Char('G') | KeyCode::End => app.log_view.scroll_to_end(),
            KeyCode::Up | KeyCode::Char('k') => app.log_view.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => app.log_view.scroll_down(1),
            KeyCode::PageUp => app.log_view.scroll_up(visible_height),
            KeyCode::PageDown => app.log_view.scroll_down(visible_height),
            _ => {}
        }
    }
}
