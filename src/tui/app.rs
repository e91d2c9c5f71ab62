//! TUI Application - Main entry point and run loop

use std::io::{self, Stdout};

use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::Span,
    Frame, Terminal,
};

use super::events::{handle_key_event, Action};
use super::theme::ConsoleTheme;
use crate::controller::SessionController;

/// TUI Application
pub struct TuiApp {
    controller: SessionController,
    theme: ConsoleTheme,
}

impl TuiApp {
    pub fn new(controller: SessionController) -> Self {
        Self {
            controller,
            theme: ConsoleTheme::new(),
        }
    }

    /// Run until `/quit`, Ctrl+C or Ctrl+D
    pub async fn run(mut self) -> anyhow::Result<()> {
        install_panic_hook();
        let mut terminal = self.setup_terminal()?;

        self.controller.start();
        let result = self.main_loop(&mut terminal).await;

        self.restore_terminal(&mut terminal)?;
        result
    }

    /// Setup terminal for TUI
    fn setup_terminal(&self) -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore terminal to normal state
    fn restore_terminal(
        &self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        Ok(())
    }

    /// Main event loop: terminal input and session events, one at a time
    async fn main_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let mut input = EventStream::new();
        let mut needs_draw = true;

        loop {
            if needs_draw {
                terminal.draw(|frame| self.render(frame))?;
                needs_draw = false;
            }

            tokio::select! {
                maybe_event = input.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        let action = handle_key_event(key, self.controller.console_mut());
                        needs_draw = action != Action::None;
                        if self.apply(action) {
                            break;
                        }
                    }
                    Some(Ok(Event::Resize(_, _))) => needs_draw = true,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
                Some(event) = self.controller.next_event() => {
                    self.controller.handle_event(event);
                    needs_draw = true;
                }
            }

            needs_draw |= self.controller.gauges_mut().take_redraw();

            if self.controller.should_quit() {
                break;
            }
        }

        Ok(())
    }

    /// Apply a key action; returns true when the app should exit
    fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::Submit(line) => self.controller.submit(&line),
            Action::Complete(partial) => {
                let candidates = self.controller.complete(&partial);
                self.controller.console_mut().apply_completion(&candidates);
            }
            Action::Redraw | Action::None => {}
        }
        false
    }

    /// Render the UI: gauge row on top, console below
    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(frame.area());

        let state = self.controller.state();
        let status = Span::styled(format!(" {} ", state), self.theme.status_style(state));

        self.controller
            .gauges()
            .render(frame, chunks[0], &self.theme, status);
        self.controller
            .console()
            .render(frame, chunks[1], &self.theme);
    }
}

/// Leave raw mode and the alternate screen before the default hook prints
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}
