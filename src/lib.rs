//! geofix: best-effort device location in the terminal.
//!
//! The [`location::LocationResolver`] runs a high accuracy, low accuracy, IP
//! lookup cascade; [`hook::LocationHook`] exposes its state to the TUI.

pub mod api;
pub mod app;
pub mod config;
pub mod events;
pub mod hook;
pub mod location;
pub mod logging;
pub mod models;
pub mod sensor;
pub mod ui;
