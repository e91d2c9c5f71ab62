//! TUI Module - Console Dashboard
//!
//! Architecture:
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │              UI LAYER (gauges.rs, console.rs, widgets/)             │
//! │  Panels own their display state and draw themselves.                │
//! └─────────────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │ submit / route_message / handle_event
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  DOMAIN LAYER (crate::controller)                   │
//! │  SessionController. Session state, command table, topic routing.    │
//! └─────────────────────────────────────────────────────────────────────┘
//!                               ▲
//!                               │ SessionEvent channel
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    CONNECTOR LAYER (crate::api)                     │
//! │  ApiClient trait. Async IO. ScreepsClient + MockApi.                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

mod app;
mod events;

pub mod console;
pub mod gauges;
pub mod theme;
pub mod widgets;

pub use app::TuiApp;
pub use console::{ConsolePanel, LineCategory};
pub use events::Action;
pub use gauges::{GaugeOverflow, GaugePanel};
pub use theme::ConsoleTheme;

use crate::controller::SessionController;

/// Run the dashboard until the user quits
pub async fn run(controller: SessionController) -> anyhow::Result<()> {
    TuiApp::new(controller).run().await
}
