//! docqa - terminal chat front end for a document QA backend.
//!
//! This is the entry point for the `docqa` binary.

mod app;
mod markdown;
mod requests;
mod ui;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use docqa_client::{ClientConfig, HttpDocumentClient};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use app::{App, Focus};
use requests::AppEvent;

/// docqa - chat with an uploaded document from the terminal.
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend base URL.
    #[arg(long, env = "DOCQA_BASE_URL", default_value = "http://127.0.0.1:8000")]
    base_url: String,

    /// Path prefix for the upload, summary and ask routes (e.g. "/api").
    #[arg(long, env = "DOCQA_API_PREFIX", default_value = "")]
    api_prefix: String,

    /// Delay between rendered summary sections, in milliseconds.
    #[arg(long, env = "DOCQA_PACING_MS", default_value_t = 50)]
    pacing_ms: u64,

    /// Overall request timeout in seconds (unset waits forever).
    #[arg(long, env = "DOCQA_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Generate a summary right after each successful upload.
    #[arg(long)]
    auto_summary: bool,

    /// Document to put in the file path field at startup.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, default_value = "false")]
    debug: bool,

    /// Log file used with --debug.
    #[arg(long, default_value = "docqa.log")]
    log_file: PathBuf,
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            api_prefix: self.api_prefix.clone(),
            pacing_ms: self.pacing_ms,
            request_timeout_seconds: self.timeout_secs,
            auto_summary: self.auto_summary,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // The terminal belongs to the UI, so logs go to a file.
    if args.debug {
        let file = File::create(&args.log_file)?;
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("docqa=debug,docqa_client=debug,warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init();
    }

    let config = args.client_config().validated()?;
    let client = HttpDocumentClient::new(&config)?;
    let (mut app, events) = App::new(Arc::new(client), &config)?;
    if let Some(file) = &args.file {
        app.file_input.set(file.display().to_string());
        app.focus = Focus::FilePath;
    }
    tracing::info!(base_url = %config.base_url, "starting");
    app.check_health();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, &mut app, events).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

/// Main event loop.
///
/// Request results are applied and drawn as soon as they arrive so summary
/// sections appear at the renderer's pace rather than the tick rate.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut events: mpsc::UnboundedReceiver<AppEvent>,
) -> anyhow::Result<()> {
    loop {
        app.tick_animation();
        terminal.draw(|f| ui::render(f, app))?;

        let tick_rate = if app.needs_immediate_redraw() {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(100)
        };

        tokio::select! {
            () = tokio::time::sleep(tick_rate) => {
                while event::poll(Duration::from_millis(0)).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        handle_input(app, evt);
                    }
                }
            }

            Some(event) = events.recv() => {
                if app.handle_event(event) {
                    terminal.draw(|f| ui::render(f, app))?;
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.cancel_request();
    Ok(())
}

/// Handle a terminal event.
fn handle_input(app: &mut App, event: Event) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(app, key),
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => app.transcript.scroll_up(3),
            MouseEventKind::ScrollDown => app.transcript.scroll_down(3),
            _ => {}
        },
        _ => {}
    }
}

/// Key handling.
///
/// - Esc cancels an in-flight request, else clears an error, else toggles
///   command mode
/// - PageUp/PageDown always scroll the chat
/// - Ctrl+C always quits
fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match key.code {
        KeyCode::Esc => {
            if app.command_mode {
                app.command_mode = false;
                return;
            }
            if app.cancel_request() {
                return;
            }
            if app.error_message.is_some() {
                app.clear_error();
            } else {
                app.command_mode = true;
            }
            return;
        }
        KeyCode::PageUp => {
            app.transcript.scroll_up(10);
            return;
        }
        KeyCode::PageDown => {
            app.transcript.scroll_down(10);
            return;
        }
        _ => {}
    }

    if app.command_mode {
        handle_command_mode(app, key.code);
    } else {
        handle_input_mode(app, key);
    }
}

/// Single-key commands (after Esc).
fn handle_command_mode(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('u') => {
            app.command_mode = false;
            app.start_upload();
        }
        KeyCode::Char('g') => {
            app.command_mode = false;
            app.start_summary();
        }
        KeyCode::Char('j') => app.transcript.scroll_down(1),
        KeyCode::Char('k') => app.transcript.scroll_up(1),
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::Enter | KeyCode::Char('i') => app.command_mode = false,
        _ => {}
    }
}

/// Typing goes to the focused field.
fn handle_input_mode(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Tab | KeyCode::BackTab => app.focus = app.focus.next(),
        KeyCode::Enter => match app.focus {
            Focus::FilePath => app.start_upload(),
            Focus::Question => app.submit_question(),
        },
        KeyCode::Char('g') if ctrl => app.start_summary(),
        KeyCode::Char('a') if ctrl => app.focused_input().home(),
        KeyCode::Char('e') if ctrl => app.focused_input().end(),
        KeyCode::Char('u') if ctrl => app.focused_input().clear(),
        KeyCode::Char('w') if ctrl => app.focused_input().delete_word(),
        KeyCode::Char(c) if !ctrl => app.focused_input().insert(c),
        KeyCode::Backspace => app.focused_input().backspace(),
        KeyCode::Delete => app.focused_input().delete(),
        KeyCode::Left => app.focused_input().left(),
        KeyCode::Right => app.focused_input().right(),
        KeyCode::Home => app.focused_input().home(),
        KeyCode::End => app.focused_input().end(),
        KeyCode::Up => app.transcript.scroll_up(1),
        KeyCode::Down => app.transcript.scroll_down(1),
        _ => {}
    }
}
