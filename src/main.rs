use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::{Backend, CrosstermBackend, Terminal};
use std::{
    fs, io,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use ntrovote_client::auth::{MemoryStorage, SessionStore, TokenStorage};
use ntrovote_client::routing::Route;
use ntrovote_client::settings::{ClientSettings, SettingsManager};
use ntrovote_client::tui::TuiApp;

#[tokio::main]
async fn main() -> Result<()> {
    // The terminal belongs to the UI, so logs go to a file
    init_logging();

    // Set up panic hook so a crash leaves a usable terminal behind
    std::panic::set_hook(Box::new(|panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        log::error!("PANIC: {}", panic_info);
        eprintln!("PANIC: {}", panic_info);
        std::process::exit(1);
    }));

    let settings = match SettingsManager::new() {
        Ok(manager) => manager.get().clone(),
        Err(e) => {
            log::warn!("Settings unavailable, using defaults: {}", e);
            ClientSettings::default()
        }
    };
    log::info!("Starting ntrovote against {}", settings.api_base_url());

    let session = SessionStore::new(token_storage(&settings));
    let initial = std::env::args()
        .nth(1)
        .map(|path| Route::parse(&path))
        .unwrap_or(Route::VoterHome);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, DisableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the application
    let result = run_app(&mut terminal, settings, session, initial).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    // Handle any errors
    if let Err(err) = result {
        log::error!("Application error: {:?}", err);
        eprintln!("Application error: {:?}", err);
    }

    Ok(())
}

fn init_logging() {
    let log_path = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ntrovote")
        .join("logs")
        .join("ntrovote.log");

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let file = log_path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| fs::OpenOptions::new().create(true).append(true).open(&log_path));
    match file {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            // Nowhere to write; keep stderr clean while the UI is up
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn token_storage(settings: &ClientSettings) -> Arc<dyn TokenStorage> {
    settings.token_storage().unwrap_or_else(|e| {
        log::warn!("Session storage unavailable, sessions will not be kept: {}", e);
        Arc::new(MemoryStorage::new())
    })
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    settings: ClientSettings,
    session: SessionStore,
    initial: Route,
) -> Result<()> {
    let mut app = TuiApp::new(settings, session, initial);
    app.initialize().await?;
    app.restore_session();

    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| app.render(f))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.handle_input(key).await?;

                if app.should_quit() {
                    break;
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.update().await?;
            last_tick = Instant::now();
        }
    }

    log::info!("Shutting down");
    Ok(())
}
