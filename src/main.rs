use color_eyre::Result;
use geofix_tui::{
    app::{App, ViewMode},
    config::Config,
    events::EventHandler,
    hook::LocationHook,
    location::LocationResolver,
    logging, ui,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Instrumentation and safety
    let _log_guard = logging::initialize_logging();
    install_panic_hook();
    color_eyre::install()?;

    let config = Config::load();
    let resolver = LocationResolver::from_config(&config)?;
    info!(
        "Starting with {:?} backend, IP endpoint {}",
        config.location.backend, config.location.ip_endpoint
    );

    // Mounting kicks off the first resolution
    let hook = LocationHook::mount(resolver);
    let mut event_handler = EventHandler::new(config.ui.tick_rate_ms);
    event_handler.forward_location(hook.subscribe());

    let mut terminal = setup_terminal()?;
    let mut app = App::new(hook, ViewMode::from_name(&config.ui.default_view));

    // Main loop
    while !app.should_quit {
        terminal.draw(|f| ui::render(f, &app))?;

        match event_handler.next().await {
            Some(event) => app.handle_event(event),
            None => break,
        }
    }

    restore_terminal(terminal)?;
    info!("Exited after {} manual refreshes", app.refresh_count);
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    crossterm::terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen, crossterm::cursor::Hide)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show)?;
    Ok(())
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        // Force terminal cleanup!
        crossterm::terminal::disable_raw_mode().ok();
        crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen, crossterm::cursor::Show).ok();
        original_hook(panic_info);
    }));
}
