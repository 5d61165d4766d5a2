/// Live Tape dashboard
///
/// Polls the snapshot endpoint (TAPE_API_URL) and renders price metrics, the
/// session profile and a candlestick chart. `q`/`Esc` quits, `r` refreshes now.
use std::{
    error::Error,
    fs::File,
    io,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tape_data::{PollerConfig, SnapshotPoller};
use tape_tui::render_dashboard;
use tracing::{info, warn};

/// Get the header symbol from TAPE_SYMBOL env var (default: TSLA)
fn get_symbol() -> String {
    std::env::var("TAPE_SYMBOL")
        .map(|s| s.trim().to_uppercase())
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "TSLA".to_string())
}

/// Log to TAPE_LOG_FILE when set. Stdout belongs to the terminal UI, so logs are
/// discarded otherwise.
fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_file = std::env::var("TAPE_LOG_FILE")
        .ok()
        .and_then(|path| File::create(path).ok());

    match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    // Setup panic hook to restore terminal on crash
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let config = PollerConfig::from_env();
    let symbol = get_symbol();
    info!(url = %config.url, %symbol, "Starting live tape dashboard");

    let poller = Arc::new(SnapshotPoller::from_config(config));
    let mut state_rx = poller.subscribe();
    poller.start();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Redraw on every published state, and at least once per tick so the
    // layout follows terminal resizes
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();
    let mut dirty = true;

    loop {
        if dirty || state_rx.has_changed().unwrap_or(false) || last_tick.elapsed() >= tick_rate {
            let state = state_rx.borrow_and_update().clone();
            terminal.draw(|f| render_dashboard(f, &state, &symbol))?;
            last_tick = Instant::now();
            dirty = false;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Char('r') => {
                        let poller = Arc::clone(&poller);
                        tokio::spawn(async move { poller.poll_once().await });
                    }
                    _ => {}
                },
                Event::Resize(..) => dirty = true,
                _ => {}
            }
        }
    }

    poller.stop();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    if let Err(error) = terminal.show_cursor() {
        warn!(%error, "Failed to restore cursor");
    }
    info!("Live tape dashboard exited");
    Ok(())
}
