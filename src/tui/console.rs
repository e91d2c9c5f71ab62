//! Console Panel - scrollback and input line
//!
//! The panel stores and edits text only. Submitted lines are handed back to
//! the caller untouched; deciding what a line means is the controller's job.

use std::collections::VecDeque;
use std::fmt;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::theme::ConsoleTheme;
use super::widgets::utils::{common_prefix, expand_tabs};

pub const DEFAULT_SCROLLBACK_LINES: usize = 1000;

/// Maximum remembered input lines
const MAX_HISTORY: usize = 100;

const PROMPT: &str = "> ";

// ─────────────────────────────────────────────────────────────────────────────
// Lines
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineCategory {
    Console,
    Log,
    Result,
    Error,
    System,
}

impl fmt::Display for LineCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => write!(f, "console"),
            Self::Log => write!(f, "log"),
            Self::Result => write!(f, "result"),
            Self::Error => write!(f, "error"),
            Self::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub category: LineCategory,
    pub text: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Scrollback
// ─────────────────────────────────────────────────────────────────────────────

/// Bounded ring buffer of console lines, oldest evicted first
#[derive(Debug)]
pub struct Scrollback {
    lines: VecDeque<ConsoleLine>,
    capacity: usize,
}

impl Scrollback {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity.min(DEFAULT_SCROLLBACK_LINES)),
            capacity,
        }
    }

    /// Append a line; returns true when the oldest line was evicted
    pub fn push(&mut self, line: ConsoleLine) -> bool {
        self.lines.push_back(line);
        if self.lines.len() > self.capacity {
            self.lines.pop_front();
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ConsoleLine> + ExactSizeIterator {
        self.lines.iter()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Console Panel
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ConsolePanel {
    scrollback: Scrollback,
    input: String,
    /// Cursor position in chars
    cursor: usize,
    history: VecDeque<String>,
    history_pos: Option<usize>,
    /// Lines scrolled back from the bottom
    scroll: usize,
}

impl Default for ConsolePanel {
    fn default() -> Self {
        Self::new(DEFAULT_SCROLLBACK_LINES)
    }
}

impl ConsolePanel {
    pub fn new(scrollback_lines: usize) -> Self {
        Self {
            scrollback: Scrollback::new(scrollback_lines),
            input: String::new(),
            cursor: 0,
            history: VecDeque::new(),
            history_pos: None,
            scroll: 0,
        }
    }

    /// Append one line per `\n`-separated segment of `text`
    pub fn add_lines(&mut self, category: LineCategory, text: &str) {
        for segment in text.split('\n') {
            self.scrollback.push(ConsoleLine {
                category,
                text: segment.trim_end_matches('\r').to_string(),
            });
            // Keep the view anchored while scrolled back. An eviction shifts
            // every index down by one as well, so the offset grows either way.
            if self.scroll > 0 {
                self.scroll += 1;
            }
        }
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Shorthand for a `system` line
    pub fn system(&mut self, text: &str) {
        self.add_lines(LineCategory::System, text);
    }

    pub fn scrollback(&self) -> &Scrollback {
        &self.scrollback
    }

    pub fn lines(&self) -> impl Iterator<Item = &ConsoleLine> {
        self.scrollback.iter()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Input editing
    // ─────────────────────────────────────────────────────────────────────

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn input_chars(&self) -> usize {
        self.input.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.input.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input_chars() {
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input_chars());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.input_chars();
    }

    pub fn clear_input(&mut self) {
        self.set_input(String::new());
    }

    fn set_input(&mut self, input: String) {
        self.input = input;
        self.cursor = self.input_chars();
    }

    /// Take the input line as a submitted line. Non-empty lines go into history.
    pub fn submit(&mut self) -> String {
        let line = std::mem::take(&mut self.input);
        self.cursor = 0;
        self.history_pos = None;
        self.scroll = 0;

        if !line.is_empty() && self.history.back() != Some(&line) {
            self.history.push_back(line.clone());
            if self.history.len() > MAX_HISTORY {
                self.history.pop_front();
            }
        }
        line
    }

    // ─────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────

    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            None => self.history.len() - 1,
            Some(p) => p.saturating_sub(1),
        };
        self.history_pos = Some(pos);
        self.set_input(self.history[pos].clone());
    }

    pub fn history_next(&mut self) {
        match self.history_pos {
            Some(p) if p + 1 < self.history.len() => {
                self.history_pos = Some(p + 1);
                self.set_input(self.history[p + 1].clone());
            }
            Some(_) => {
                self.history_pos = None;
                self.clear_input();
            }
            None => {}
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Completion
    // ─────────────────────────────────────────────────────────────────────

    /// Apply completion candidates to the input line.
    ///
    /// One candidate replaces the input; several extend it to their common
    /// prefix and are listed in the scrollback.
    pub fn apply_completion(&mut self, candidates: &[String]) {
        match candidates {
            [] => {}
            [only] => self.set_input(format!("{} ", only)),
            many => {
                let prefix = common_prefix(many);
                if prefix.chars().count() > self.input_chars() {
                    self.set_input(prefix);
                }
                self.system(&many.join("  "));
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scrolling
    // ─────────────────────────────────────────────────────────────────────

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    fn max_scroll(&self) -> usize {
        self.scrollback.len().saturating_sub(1)
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = (self.scroll + lines).min(self.max_scroll());
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = self.max_scroll();
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    /// Scrollback lines visible in a window of `height` rows
    pub fn visible_lines(&self, height: usize) -> impl Iterator<Item = &ConsoleLine> {
        let end = self.scrollback.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(height);
        self.scrollback.iter().skip(start).take(end - start)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &ConsoleTheme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        let lines: Vec<Line> = self
            .visible_lines(chunks[0].height as usize)
            .map(|l| {
                Line::from(Span::styled(
                    expand_tabs(&l.text),
                    theme.category_style(l.category),
                ))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), chunks[0]);

        let width = (chunks[1].width as usize).saturating_sub(PROMPT.len());
        let (visible_input, cursor_col) = self.input_window(width);
        let mut input_line = vec![
            Span::styled(PROMPT, theme.prompt()),
            Span::styled(visible_input, theme.text()),
        ];
        if self.scroll > 0 {
            input_line.push(Span::styled(
                format!("  [-{} lines]", self.scroll),
                theme.dimmed(),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(input_line)), chunks[1]);

        let x = chunks[1].x + (PROMPT.len() + cursor_col) as u16;
        let max_x = chunks[1].x + chunks[1].width.saturating_sub(1);
        frame.set_cursor_position((x.min(max_x), chunks[1].y));
    }

    /// Slice of the input that fits in `width` columns with the cursor in view,
    /// and the cursor column inside that slice
    pub fn input_window(&self, width: usize) -> (String, usize) {
        if width == 0 {
            return (String::new(), 0);
        }
        // The cursor may sit one past the last char and needs a cell too
        let offset = (self.cursor + 1).saturating_sub(width);
        let visible = self.input.chars().skip(offset).take(width).collect();
        (visible, self.cursor - offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(panel: &ConsolePanel) -> Vec<(LineCategory, String)> {
        panel.lines().map(|l| (l.category, l.text.clone())).collect()
    }

    #[test]
    fn test_add_lines_splits_newlines() {
        let mut panel = ConsolePanel::default();
        panel.add_lines(LineCategory::System, "Available\n/quit\tExit");
        assert_eq!(
            texts(&panel),
            vec![
                (LineCategory::System, "Available".to_string()),
                (LineCategory::System, "/quit\tExit".to_string()),
            ]
        );
    }

    #[test]
    fn test_interleaved_categories_keep_order() {
        let mut panel = ConsolePanel::default();
        panel.add_lines(LineCategory::Log, "a");
        panel.add_lines(LineCategory::Result, "b");
        panel.add_lines(LineCategory::Log, "c");
        let order: Vec<_> = panel.lines().map(|l| l.text.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_scrollback_is_bounded() {
        let mut panel = ConsolePanel::new(3);
        for i in 0..5 {
            panel.add_lines(LineCategory::Log, &i.to_string());
        }
        let order: Vec<_> = panel.lines().map(|l| l.text.as_str()).collect();
        assert_eq!(order, vec!["2", "3", "4"]);
        assert_eq!(panel.scrollback().capacity(), 3);
    }

    #[test]
    fn test_zero_capacity_keeps_one_line() {
        let mut scrollback = Scrollback::new(0);
        scrollback.push(ConsoleLine {
            category: LineCategory::Log,
            text: "x".to_string(),
        });
        assert_eq!(scrollback.len(), 1);
    }

    #[test]
    fn test_input_editing() {
        let mut panel = ConsolePanel::default();
        for c in "Gme".chars() {
            panel.insert_char(c);
        }
        panel.move_left();
        panel.move_left();
        panel.insert_char('a');
        assert_eq!(panel.input(), "Game");
        panel.move_end();
        panel.backspace();
        assert_eq!(panel.input(), "Gam");
        panel.move_home();
        panel.delete();
        assert_eq!(panel.input(), "am");
    }

    #[test]
    fn test_input_editing_multibyte() {
        let mut panel = ConsolePanel::default();
        panel.insert_char('é');
        panel.insert_char('x');
        panel.move_left();
        panel.backspace();
        assert_eq!(panel.input(), "x");
    }

    #[test]
    fn test_submit_returns_raw_line_and_records_history() {
        let mut panel = ConsolePanel::default();
        for c in "/help".chars() {
            panel.insert_char(c);
        }
        assert_eq!(panel.submit(), "/help");
        assert_eq!(panel.input(), "");

        panel.history_prev();
        assert_eq!(panel.input(), "/help");
        panel.history_next();
        assert_eq!(panel.input(), "");
    }

    #[test]
    fn test_history_walks_back_and_forth() {
        let mut panel = ConsolePanel::default();
        for line in ["one", "two"] {
            for c in line.chars() {
                panel.insert_char(c);
            }
            panel.submit();
        }
        panel.history_prev();
        panel.history_prev();
        assert_eq!(panel.input(), "one");
        panel.history_prev();
        assert_eq!(panel.input(), "one");
        panel.history_next();
        assert_eq!(panel.input(), "two");
    }

    #[test]
    fn test_apply_single_completion() {
        let mut panel = ConsolePanel::default();
        panel.insert_char('/');
        panel.insert_char('q');
        panel.apply_completion(&["/quit".to_string()]);
        assert_eq!(panel.input(), "/quit ");
        assert_eq!(panel.cursor(), 6);
    }

    #[test]
    fn test_apply_multiple_completions_lists_them() {
        let mut panel = ConsolePanel::default();
        panel.insert_char('/');
        panel.apply_completion(&["/help".to_string(), "/hello".to_string()]);
        assert_eq!(panel.input(), "/hel");
        assert_eq!(
            panel.lines().last().map(|l| l.text.as_str()),
            Some("/help  /hello")
        );
    }

    #[test]
    fn test_scroll_anchors_view() {
        let mut panel = ConsolePanel::default();
        for i in 0..10 {
            panel.add_lines(LineCategory::Log, &i.to_string());
        }
        panel.scroll_up(3);
        let before: Vec<_> = panel.visible_lines(2).map(|l| l.text.clone()).collect();
        assert_eq!(before, vec!["5", "6"]);

        panel.add_lines(LineCategory::Log, "10");
        let after: Vec<_> = panel.visible_lines(2).map(|l| l.text.clone()).collect();
        assert_eq!(after, before);

        panel.scroll_to_bottom();
        let bottom: Vec<_> = panel.visible_lines(2).map(|l| l.text.clone()).collect();
        assert_eq!(bottom, vec!["9", "10"]);
    }

    #[test]
    fn test_scroll_anchors_view_in_full_buffer() {
        let mut panel = ConsolePanel::new(10);
        for i in 0..10 {
            panel.add_lines(LineCategory::Log, &i.to_string());
        }
        panel.scroll_up(3);
        let before: Vec<_> = panel.visible_lines(2).map(|l| l.text.clone()).collect();
        assert_eq!(before, vec!["5", "6"]);

        for i in 10..13 {
            panel.add_lines(LineCategory::Log, &i.to_string());
            let now: Vec<_> = panel.visible_lines(2).map(|l| l.text.clone()).collect();
            assert_eq!(now, before);
        }
        assert_eq!(panel.scrollback().len(), 10);
        assert_eq!(panel.scroll_offset(), 6);
    }

    #[test]
    fn test_scrolled_to_top_of_full_buffer_stays_in_range() {
        let mut panel = ConsolePanel::new(3);
        for i in 0..3 {
            panel.add_lines(LineCategory::Log, &i.to_string());
        }
        panel.scroll_to_top();
        panel.add_lines(LineCategory::Log, "3");
        assert_eq!(panel.scroll_offset(), 2);
        let top: Vec<_> = panel.visible_lines(1).map(|l| l.text.clone()).collect();
        assert_eq!(top, vec!["1"]);
    }

    #[test]
    fn test_input_window_short_input() {
        let mut panel = ConsolePanel::default();
        for c in "Game.time".chars() {
            panel.insert_char(c);
        }
        assert_eq!(panel.input_window(20), ("Game.time".to_string(), 9));
    }

    #[test]
    fn test_input_window_follows_cursor() {
        let mut panel = ConsolePanel::default();
        for c in "abcdefghij".chars() {
            panel.insert_char(c);
        }
        // Cursor at the end: the tail stays visible with room for the cursor
        assert_eq!(panel.input_window(4), ("hij".to_string(), 3));

        panel.move_home();
        assert_eq!(panel.input_window(4), ("abcd".to_string(), 0));

        for _ in 0..5 {
            panel.move_right();
        }
        assert_eq!(panel.input_window(4), ("cdef".to_string(), 3));
        assert_eq!(panel.input_window(0), (String::new(), 0));
    }
}
