//! Event Handling - Keyboard input processing

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::console::ConsolePanel;

/// Lines moved per PageUp/PageDown
const PAGE_LINES: usize = 10;

/// Actions that can be triggered by user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// A line was submitted from the input box
    Submit(String),
    /// Tab pressed with this input text
    Complete(String),
    /// Input or scroll position changed
    Redraw,
    None,
}

/// Handle keyboard events
pub fn handle_key_event(key: KeyEvent, console: &mut ConsolePanel) -> Action {
    // Releases and repeats arrive on some platforms; act on presses only
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Global keybindings
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Action::Quit,
        (KeyModifiers::CONTROL, KeyCode::Char('d')) => return Action::Quit,
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
            console.clear_input();
            return Action::Redraw;
        }
        (KeyModifiers::CONTROL, KeyCode::Home) => {
            console.scroll_to_top();
            return Action::Redraw;
        }
        (KeyModifiers::CONTROL, KeyCode::End) => {
            console.scroll_to_bottom();
            return Action::Redraw;
        }
        _ => {}
    }

    match key.code {
        KeyCode::Enter => Action::Submit(console.submit()),
        KeyCode::Tab => Action::Complete(console.input().to_string()),

        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            console.insert_char(c);
            Action::Redraw
        }
        KeyCode::Backspace => {
            console.backspace();
            Action::Redraw
        }
        KeyCode::Delete => {
            console.delete();
            Action::Redraw
        }
        KeyCode::Left => {
            console.move_left();
            Action::Redraw
        }
        KeyCode::Right => {
            console.move_right();
            Action::Redraw
        }
        KeyCode::Home => {
            console.move_home();
            Action::Redraw
        }
        KeyCode::End => {
            console.move_end();
            Action::Redraw
        }

        // History
        KeyCode::Up => {
            console.history_prev();
            Action::Redraw
        }
        KeyCode::Down => {
            console.history_next();
            Action::Redraw
        }

        // Scrollback
        KeyCode::PageUp => {
            console.scroll_up(PAGE_LINES);
            Action::Redraw
        }
        KeyCode::PageDown => {
            console.scroll_down(PAGE_LINES);
            Action::Redraw
        }

        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(console: &mut ConsolePanel, text: &str) {
        for c in text.chars() {
            handle_key_event(key(KeyCode::Char(c)), console);
        }
    }

    #[test]
    fn test_ctrl_c_and_ctrl_d_quit() {
        let mut console = ConsolePanel::default();
        assert_eq!(handle_key_event(ctrl('c'), &mut console), Action::Quit);
        assert_eq!(handle_key_event(ctrl('d'), &mut console), Action::Quit);
    }

    #[test]
    fn test_plain_q_is_text() {
        let mut console = ConsolePanel::default();
        assert_eq!(
            handle_key_event(key(KeyCode::Char('q')), &mut console),
            Action::Redraw
        );
        assert_eq!(console.input(), "q");
    }

    #[test]
    fn test_enter_submits_input() {
        let mut console = ConsolePanel::default();
        type_text(&mut console, "Game.time");

        let action = handle_key_event(key(KeyCode::Enter), &mut console);
        assert_eq!(action, Action::Submit("Game.time".to_string()));
        assert_eq!(console.input(), "");
    }

    #[test]
    fn test_tab_requests_completion() {
        let mut console = ConsolePanel::default();
        type_text(&mut console, "/he");

        let action = handle_key_event(key(KeyCode::Tab), &mut console);
        assert_eq!(action, Action::Complete("/he".to_string()));
        assert_eq!(console.input(), "/he");
    }

    #[test]
    fn test_ctrl_u_clears_line() {
        let mut console = ConsolePanel::default();
        type_text(&mut console, "abc");
        handle_key_event(ctrl('u'), &mut console);
        assert_eq!(console.input(), "");
        assert_eq!(console.cursor(), 0);
    }

    #[test]
    fn test_history_keys() {
        let mut console = ConsolePanel::default();
        type_text(&mut console, "one");
        handle_key_event(key(KeyCode::Enter), &mut console);
        type_text(&mut console, "two");
        handle_key_event(key(KeyCode::Enter), &mut console);

        handle_key_event(key(KeyCode::Up), &mut console);
        assert_eq!(console.input(), "two");
        handle_key_event(key(KeyCode::Up), &mut console);
        assert_eq!(console.input(), "one");
        handle_key_event(key(KeyCode::Down), &mut console);
        assert_eq!(console.input(), "two");
    }

    #[test]
    fn test_release_events_ignored() {
        let mut console = ConsolePanel::default();
        let release = KeyEvent {
            code: KeyCode::Char('x'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(handle_key_event(release, &mut console), Action::None);
        assert_eq!(console.input(), "");
    }

    #[test]
    fn test_page_keys_scroll() {
        let mut console = ConsolePanel::default();
        for i in 0..30 {
            console.system(&format!("line {i}"));
        }
        handle_key_event(key(KeyCode::PageUp), &mut console);
        assert_eq!(console.scroll_offset(), PAGE_LINES);
        handle_key_event(key(KeyCode::PageDown), &mut console);
        assert_eq!(console.scroll_offset(), 0);
    }
}
