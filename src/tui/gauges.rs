//! Gauge Panel - CPU and memory bars
//!
//! Labels are fixed width:
//! `CPU: %3d/%3d` and `Mem: %4dK/%4dK`.

use std::fmt;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Gauge, Paragraph},
    Frame,
};
use serde::{Deserialize, Serialize};

use super::theme::ConsoleTheme;

const CPU_LABEL_WIDTH: u16 = 12;
const MEM_LABEL_WIDTH: u16 = 16;

/// What to do with readings above 100% (or below 0%)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GaugeOverflow {
    /// Keep the raw percentage and flag the bar as alarmed
    #[default]
    Overshoot,
    /// Clamp the percentage into 0..=100
    Clamp,
}

impl fmt::Display for GaugeOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overshoot => write!(f, "overshoot"),
            Self::Clamp => write!(f, "clamp"),
        }
    }
}

/// One labeled bar
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeBar {
    pub label: String,
    /// Bar value in percent, as computed (see `GaugeOverflow`)
    pub percent: f64,
    /// Error display or overshoot
    pub alarm: bool,
}

impl GaugeBar {
    fn placeholder(label: &str) -> Self {
        Self {
            label: label.to_string(),
            percent: 0.0,
            alarm: false,
        }
    }

    fn error(label: &str) -> Self {
        Self {
            label: label.to_string(),
            percent: 100.0,
            alarm: true,
        }
    }

    fn reading(label: String, current: u64, limit: u64, policy: GaugeOverflow) -> Self {
        let raw = current as f64 / limit as f64 * 100.0;
        match policy {
            GaugeOverflow::Overshoot => Self {
                label,
                percent: raw,
                alarm: raw > 100.0,
            },
            GaugeOverflow::Clamp => Self {
                label,
                percent: raw.clamp(0.0, 100.0),
                alarm: false,
            },
        }
    }

    /// Fill ratio for drawing; the widget cannot draw past full
    pub fn ratio(&self) -> f64 {
        (self.percent / 100.0).clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
pub struct GaugePanel {
    cpu: GaugeBar,
    memory: GaugeBar,
    overflow: GaugeOverflow,
    redraw: bool,
}

impl Default for GaugePanel {
    fn default() -> Self {
        Self::new(GaugeOverflow::default())
    }
}

impl GaugePanel {
    pub fn new(overflow: GaugeOverflow) -> Self {
        Self {
            cpu: GaugeBar::placeholder("CPU:    /   "),
            memory: GaugeBar::placeholder("Mem:     K/    K"),
            overflow,
            redraw: false,
        }
    }

    pub fn cpu(&self) -> &GaugeBar {
        &self.cpu
    }

    pub fn memory(&self) -> &GaugeBar {
        &self.memory
    }

    /// Update both bars. `cpu_current` is `None` for a non-numeric reading.
    pub fn update(
        &mut self,
        cpu_current: Option<u64>,
        cpu_limit: u64,
        mem_current: u64,
        mem_limit: u64,
    ) {
        self.cpu = match cpu_current {
            Some(current) if cpu_limit > 0 => GaugeBar::reading(
                format!("CPU: {:>3}/{:>3}", current, cpu_limit),
                current,
                cpu_limit,
                self.overflow,
            ),
            _ => GaugeBar::error("CPU: ERROR"),
        };

        self.memory = if mem_limit > 0 {
            GaugeBar::reading(
                format!("Mem: {:>4}K/{:>4}K", mem_current / 1024, mem_limit / 1024),
                mem_current,
                mem_limit,
                self.overflow,
            )
        } else {
            GaugeBar::error("Mem: ERROR")
        };

        self.redraw = true;
    }

    /// Whether an update asked for a redraw since the last call
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────

    /// Draw into a one-row area: `[cpu label][cpu bar] [mem label][mem bar][status]`
    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &ConsoleTheme, status: Span<'_>) {
        frame.render_widget(Paragraph::new("").style(theme.gauge_row()), area);

        let status_width = status.width() as u16 + 2;
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(CPU_LABEL_WIDTH + 1),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(MEM_LABEL_WIDTH + 1),
                Constraint::Fill(1),
                Constraint::Length(status_width),
            ])
            .split(area);

        self.render_bar(frame, chunks[0], chunks[1], &self.cpu, theme);
        self.render_bar(frame, chunks[3], chunks[4], &self.memory, theme);
        frame.render_widget(Paragraph::new(status).right_aligned(), chunks[5]);
    }

    fn render_bar(
        &self,
        frame: &mut Frame,
        label_area: Rect,
        bar_area: Rect,
        bar: &GaugeBar,
        theme: &ConsoleTheme,
    ) {
        let label_style = if bar.alarm {
            theme.alarm()
        } else {
            theme.gauge_row()
        };
        frame.render_widget(
            Paragraph::new(Span::styled(bar.label.as_str(), label_style)),
            label_area,
        );

        let gauge = Gauge::default()
            .gauge_style(
                Style::default()
                    .fg(theme.load_color(bar.percent))
                    .bg(theme.gauge_bg),
            )
            .ratio(bar.ratio())
            .label("")
            .use_unicode(true);
        frame.render_widget(gauge, bar_area);
    }
}
