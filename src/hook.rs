//! UI-facing handle over a [`LocationResolver`].
//!
//! Mirrors the `{ coordinates, error, is_loading, get_location }` surface a
//! view needs. State lives in a `tokio::sync::watch` channel so every update
//! is a whole-value replacement and subscribers never see a half-written
//! state.

use crate::location::LocationResolver;
use crate::models::{Coordinates, ResolutionState};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

pub struct LocationHook {
    resolver: Arc<LocationResolver>,
    state: Arc<watch::Sender<ResolutionState>>,
}

impl LocationHook {
    /// Creates the hook in the loading state and starts the first resolution.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(resolver: LocationResolver) -> Self {
        let (state, _) = watch::channel(ResolutionState::Loading);
        let hook = Self {
            resolver: Arc::new(resolver),
            state: Arc::new(state),
        };
        hook.get_location();
        hook
    }

    /// Resets to loading and starts a fresh cascade.
    ///
    /// Calls are not coalesced: an earlier cascade that is still in flight
    /// keeps running and whichever settles last decides the visible state.
    pub fn get_location(&self) -> JoinHandle<()> {
        self.state.send_replace(ResolutionState::Loading);

        let resolver = Arc::clone(&self.resolver);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let settled = resolver.resolve().await;
            debug!("Resolution settled: {:?}", settled);
            state.send_replace(settled);
        })
    }

    pub fn state(&self) -> ResolutionState {
        self.state.borrow().clone()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.state.borrow().coordinates()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error().map(str::to_string)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResolutionState> {
        self.state.subscribe()
    }
}
