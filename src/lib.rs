//! Multimeter - terminal dashboard for the Screeps console
//!
//! Streams console output and CPU/memory telemetry from a game server over
//! its push socket, and forwards typed expressions back to it.

pub mod api;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod protocol;
pub mod session;
pub mod tui;

pub use api::{ApiClient, MockApi, ScreepsClient};
pub use commands::{CommandOutcome, CommandTable, CommandTableBuilder};
pub use config::MultimeterConfig;
pub use controller::{ControllerOptions, SessionController, SessionEvent};
pub use error::{FixSuggestion, MultimeterError, Result};
pub use session::{ConnectionState, Credentials, Session};
