use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use focusflow::app::{App, InputMode};
use focusflow::clock::SystemClock;
use focusflow::commands::Session;
use focusflow::config::{Config, parse_minutes};
use focusflow::insight::{GeminiClient, InsightDispatcher};
use focusflow::shell::TerminalShell;
use focusflow::storage::{FileStore, Persistence, data_dir};
use focusflow::timer::{Mode, TimerEvent};
use focusflow::{notify, ui};
use ratatui::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Type Aliases & Constants
// ============================================================================

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
const POLL_RATE: Duration = Duration::from_millis(100);
const DEFAULT_LOG_FILTER: &str = "focusflow=info";

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser)]
#[command(author, version, about = "🍅 focusflow - pomodoro timer, daily tasks and focus heatmap")]
struct Args {
    /// Focus length, e.g. 25, 25m, 1h
    #[arg(short, long, value_parser = parse_minutes)]
    focus: Option<u32>,
    /// Short break length
    #[arg(short, long, value_parser = parse_minutes)]
    short: Option<u32>,
    /// Long break length
    #[arg(short, long, value_parser = parse_minutes)]
    long: Option<u32>,
    /// Weeks shown in the heatmap
    #[arg(short, long)]
    weeks: Option<u32>,
    #[arg(short = 't', long)]
    theme: Option<String>,
    #[arg(long)]
    no_sound: bool,
    /// Never call the insight service
    #[arg(long)]
    no_insight: bool,
    /// Where tasks, history, config and logs are kept
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Launch the interactive TUI (default)
    Tui,
    /// Add a task
    Add {
        title: String,
        /// Reset to open every new day once completed
        #[arg(short, long)]
        recurring: bool,
    },
    /// List tasks, open first
    List,
    /// Mark a task done (id prefix)
    Done { id: String },
    /// Reopen a completed task (id prefix)
    Undo { id: String },
    /// Set progress in percent, rounded to steps of 10
    Progress { id: String, value: i64 },
    /// Delete a task (id prefix)
    Remove { id: String },
    /// Print the focus heatmap
    Heatmap,
    /// Ask for prioritisation advice on the open tasks
    Insight,
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    let dir = data_dir(args.data_dir.as_deref())?;
    let command = args.command.unwrap_or(Command::Tui);

    // The TUI owns the terminal, so it logs to a file instead of stderr.
    let _guard = match command {
        Command::Tui => init_file_logging(&dir),
        _ => {
            init_stderr_logging();
            None
        }
    };

    let mut config = Config::load(&dir);

    // CLI overrides
    if let Some(m) = args.focus { config.focus_minutes = m; }
    if let Some(m) = args.short { config.short_break_minutes = m; }
    if let Some(m) = args.long { config.long_break_minutes = m; }
    if let Some(w) = args.weeks { config.heatmap_weeks = w; }
    if let Some(t) = args.theme { config.theme = t; }
    if args.no_sound { config.sound_enabled = false; }
    if args.no_insight { config.insight.enabled = false; }
    config.insight = config.insight.with_env_key();
    let config = config.clamped();

    let persistence = Persistence::new(FileStore::new(&dir));

    if let Command::Tui = command {
        if !ui::THEMES.contains(&config.theme.as_str()) {
            warn!(theme = %config.theme, "unknown theme, using default colours");
        }
        return run_tui(config, persistence);
    }

    let session = Session::system(&persistence);
    let outcome = match command {
        Command::Tui => unreachable!("handled above"),
        Command::Add { title, recurring } => session.add(&title, recurring),
        Command::List => Ok(session.list()),
        Command::Done { id } => session.set_completed(&id, true),
        Command::Undo { id } => session.set_completed(&id, false),
        Command::Progress { id, value } => session.set_progress(&id, value),
        Command::Remove { id } => session.remove(&id),
        Command::Heatmap => Ok(session.heatmap(config.heatmap_weeks)),
        Command::Insight => {
            let runtime = tokio::runtime::Runtime::new()?;
            Ok(runtime.block_on(session.insight(&config)))
        }
    };

    match outcome {
        Ok(text) => println!("{}", text.trim_end()),
        Err(text) => {
            eprintln!("{text}");
            std::process::exit(1);
        }
    }
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Logs to `focusflow.log` in the data directory. The guard flushes on drop.
fn init_file_logging(dir: &Path) -> Option<WorkerGuard> {
    if std::fs::create_dir_all(dir).is_err() {
        return None;
    }
    let appender = tracing_appender::rolling::never(dir, "focusflow.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .init();
}

fn run_tui(config: Config, persistence: Persistence) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    let insight = if config.insight.enabled {
        match GeminiClient::new(config.insight.clone()) {
            Ok(client) => Some(InsightDispatcher::new(runtime.handle().clone(), Arc::new(client))),
            Err(e) => {
                warn!(error = %e, "insight client unavailable");
                None
            }
        }
    } else {
        None
    };

    let mut app = App::new(
        config,
        persistence,
        Box::new(TerminalShell::default()),
        insight,
        Box::new(SystemClock),
    );
    info!("view started");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut app);
    app.close();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    // Pending insight requests are abandoned rather than awaited.
    runtime.shutdown_background();
    info!("view closed");
    res
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render_ui(f, app))?;

        let now = Instant::now();
        let timeout = app
            .ticker()
            .until_next(now)
            .map_or(POLL_RATE, |d| d.min(POLL_RATE));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_input(key, app) {
                    return Ok(());
                }
            }
        }

        for event in app.advance(Instant::now()) {
            match event {
                TimerEvent::SessionComplete { minutes } => {
                    notify::session_complete(minutes, app.config.sound_enabled)
                }
            }
        }
    }
}

// ============================================================================
// Event Handlers
// ============================================================================

/// Returns true when the user asked to quit.
fn handle_input(key: event::KeyEvent, app: &mut App) -> bool {
    if let InputMode::Adding { .. } = app.input_mode {
        match key.code {
            KeyCode::Char(c) => app.input_buffer.push(c),
            KeyCode::Backspace => { app.input_buffer.pop(); }
            KeyCode::Enter => app.submit_input(),
            KeyCode::Esc => app.cancel_input(),
            _ => {}
        }
        return false;
    }

    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
    {
        return true;
    }

    match key.code {
        KeyCode::Char(' ') => app.toggle_timer(Instant::now()),
        KeyCode::Char('r') => app.reset_timer(),
        KeyCode::Char('1') => app.switch_mode(Mode::Focus),
        KeyCode::Char('2') => app.switch_mode(Mode::ShortBreak),
        KeyCode::Char('3') => app.switch_mode(Mode::LongBreak),
        KeyCode::Char('a') => app.start_adding(false),
        KeyCode::Char('R') => app.start_adding(true),
        KeyCode::Char('x') | KeyCode::Enter => app.toggle_selected(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_selected_progress(10),
        KeyCode::Char('-') => app.adjust_selected_progress(-10),
        KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Char('c') => app.toggle_compact(),
        KeyCode::Char('?') | KeyCode::Char('h') => app.toggle_help(),
        _ => {}
    }
    false
}
