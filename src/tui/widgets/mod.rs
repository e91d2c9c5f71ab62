//! TUI Widgets - UI Components
//!
//! Stateless helpers shared by the panels.

/// Common widget utilities
pub mod utils {
    /// Tab stop used when drawing scrollback lines
    pub const TAB_WIDTH: usize = 8;

    /// Replace tabs with spaces up to the next tab stop
    pub fn expand_tabs(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut column = 0;
        for c in s.chars() {
            if c == '\t' {
                let pad = TAB_WIDTH - column % TAB_WIDTH;
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            } else {
                out.push(c);
                column += 1;
            }
        }
        out
    }

    /// Longest prefix shared by every candidate
    pub fn common_prefix(candidates: &[String]) -> String {
        let Some(first) = candidates.first() else {
            return String::new();
        };
        let mut len = first.len();
        for other in &candidates[1..] {
            len = first
                .char_indices()
                .zip(other.chars())
                .take_while(|((_, a), b)| a == b)
                .map(|((i, a), _)| i + a.len_utf8())
                .last()
                .unwrap_or(0)
                .min(len);
        }
        first[..len].to_string()
    }
}
