//! Event types and the main event loop driver for the geofix TUI.
//!
//! This module defines the [`Event`] enum (keyboard input, ticks and location
//! updates) and the [`EventHandler`], which runs a background task that polls
//! crossterm for key events and emits periodic [`Event::Tick`]s. The main loop
//! in `main.rs` receives events via [`EventHandler::next`]; the location
//! forwarder started by [`EventHandler::forward_location`] posts
//! [`Event::LocationUpdate`] whenever the hook's state is replaced.

use crate::models::ResolutionState;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::error;

/// Events processed by the application event loop.
#[derive(Debug)]
pub enum Event {
    /// Periodic tick used for UI refresh and the loading spinner.
    Tick,
    /// User key press from the terminal.
    Input(KeyEvent),
    /// The location hook replaced its state.
    LocationUpdate(ResolutionState),
}

/// Multiplexes terminal input, ticks and location updates into a single
/// event stream.
///
/// Holds an unbounded channel: the sender ([`tx`](EventHandler::tx)) can be
/// cloned and given to other tasks, while the receiver is consumed by
/// [`next`](EventHandler::next) in the main loop.
pub struct EventHandler {
    /// Sender for posting events from other tasks.
    pub tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Creates a new event handler and spawns the input/tick task.
    ///
    /// The spawned task polls crossterm with a timeout of `tick_rate_ms`;
    /// when a key is pressed it sends [`Event::Input`], and when the tick
    /// interval elapses it sends [`Event::Tick`]. If the terminal stops
    /// answering the task logs the error and exits.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::from_secs(0));
                match event::poll(timeout) {
                    Ok(true) => match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            event_tx.send(Event::Input(key)).ok();
                        }
                        Ok(_) => {}
                        Err(e) => {
                            error!("Terminal read failed: {}", e);
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        error!("Terminal poll failed: {}", e);
                        break;
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    if event_tx.send(Event::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self { tx, rx }
    }

    /// Relays every state replacement from a location hook subscription as
    /// [`Event::LocationUpdate`]. The current value is sent first.
    pub fn forward_location(&self, mut states: watch::Receiver<ResolutionState>) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let current = states.borrow_and_update().clone();
            if tx.send(Event::LocationUpdate(current)).is_err() {
                return;
            }
            while states.changed().await.is_ok() {
                let state = states.borrow_and_update().clone();
                if tx.send(Event::LocationUpdate(state)).is_err() {
                    break;
                }
            }
        });
    }

    /// Receives the next event from the channel.
    ///
    /// Returns `None` when all senders have been dropped.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
