use crate::events::Event;
use crate::hook::LocationHook;
use crate::models::ResolutionState;
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use tracing::info;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ViewMode {
    Summary,
    Map,
}

impl ViewMode {
    /// Parses the `ui.default_view` config value; unknown names give the summary.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("map") {
            ViewMode::Map
        } else {
            ViewMode::Summary
        }
    }

    fn toggled(self) -> Self {
        match self {
            ViewMode::Summary => ViewMode::Map,
            ViewMode::Map => ViewMode::Summary,
        }
    }
}

pub struct App {
    pub view_mode: ViewMode,
    pub location: ResolutionState,
    pub tick_count: usize,
    pub should_quit: bool,

    // Last time a resolution settled (success or failure)
    pub last_settled: Option<DateTime<Local>>,
    pub refresh_count: usize,

    hook: LocationHook,
}

impl App {
    pub fn new(hook: LocationHook, view_mode: ViewMode) -> Self {
        Self {
            view_mode,
            location: hook.state(),
            tick_count: 0,
            should_quit: false,
            last_settled: None,
            refresh_count: 0,
            hook,
        }
    }

    pub fn on_tick(&mut self) {
        self.tick_count = self.tick_count.wrapping_add(1);
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Tick => self.on_tick(),
            Event::Input(key) => self.handle_key(key),
            Event::LocationUpdate(state) => self.on_location(state),
        }
    }

    pub fn on_location(&mut self, state: ResolutionState) {
        if !state.is_loading() {
            self.last_settled = Some(Local::now());
        }
        self.location = state;
    }

    pub fn refresh(&mut self) {
        info!("Manual location refresh requested");
        self.refresh_count += 1;
        self.hook.get_location();
        self.location = ResolutionState::Loading;
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Tab | KeyCode::Char('m') => self.view_mode = self.view_mode.toggled(),
            _ => {}
        }
    }
}
