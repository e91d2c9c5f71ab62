//! Console Theme - Visual Design System
//!
//! Dark terminal palette; one color per scrollback category plus
//! load colors for the gauges.

use ratatui::style::{Color, Modifier, Style};

use super::console::LineCategory;
use crate::session::ConnectionState;

/// Console color palette
pub struct ConsoleTheme {
    // Primary palette
    pub ink: Color,
    pub slate: Color,
    pub amber_gold: Color,
    pub cyan_teal: Color,

    // Status colors
    pub success_green: Color,
    pub warning_orange: Color,
    pub error_red: Color,

    // Gauge row
    pub gauge_bg: Color,
}

impl Default for ConsoleTheme {
    fn default() -> Self {
        Self {
            ink: Color::Rgb(230, 237, 243),    // #E6EDF3
            slate: Color::Rgb(128, 128, 128),  // #808080
            amber_gold: Color::Rgb(255, 191, 0), // #FFBF00
            cyan_teal: Color::Rgb(0, 255, 255),  // #00FFFF

            success_green: Color::Rgb(63, 185, 80),   // #3FB950
            warning_orange: Color::Rgb(210, 153, 34), // #D29922
            error_red: Color::Rgb(248, 81, 73),       // #F85149

            gauge_bg: Color::Rgb(55, 65, 81), // gray-700
        }
    }
}

impl ConsoleTheme {
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Styles
    // ─────────────────────────────────────────────────────────────────────

    pub fn text(&self) -> Style {
        Style::default().fg(self.ink)
    }

    pub fn dimmed(&self) -> Style {
        Style::default().fg(self.slate)
    }

    /// Input prompt
    pub fn prompt(&self) -> Style {
        Style::default()
            .fg(self.amber_gold)
            .add_modifier(Modifier::BOLD)
    }

    /// Inverse row carrying the gauges
    pub fn gauge_row(&self) -> Style {
        Style::default().add_modifier(Modifier::REVERSED)
    }

    /// Label of a gauge in alarm state
    pub fn alarm(&self) -> Style {
        Style::default()
            .fg(self.error_red)
            .add_modifier(Modifier::BOLD)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scrollback
    // ─────────────────────────────────────────────────────────────────────

    pub fn category_style(&self, category: LineCategory) -> Style {
        match category {
            LineCategory::Console => Style::default()
                .fg(self.cyan_teal)
                .add_modifier(Modifier::BOLD),
            LineCategory::Log => self.text(),
            LineCategory::Result => Style::default().fg(self.success_green),
            LineCategory::Error => Style::default()
                .fg(self.error_red)
                .add_modifier(Modifier::BOLD),
            LineCategory::System => Style::default().fg(self.amber_gold),
        }
    }

    pub fn status_style(&self, state: ConnectionState) -> Style {
        match state {
            ConnectionState::Active => Style::default().fg(self.success_green),
            ConnectionState::Disconnected => Style::default().fg(self.error_red),
            _ => Style::default().fg(self.warning_orange),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Gauge Colors
    // ─────────────────────────────────────────────────────────────────────

    /// Fill color for a load percentage
    pub fn load_color(&self, percent: f64) -> Color {
        match percent {
            p if p >= 90.0 => self.error_red,
            p if p >= 75.0 => self.warning_orange,
            p if p >= 50.0 => self.amber_gold,
            _ => self.success_green,
        }
    }
}
