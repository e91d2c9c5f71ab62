//! Local slash-commands
//!
//! The table is built once at startup and handed to the controller; it is
//! never mutated afterwards.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `/quit` | Exit the program |
//! | `/help` | List the available commands |

use std::collections::HashMap;
use std::fmt;

use crate::error::{MultimeterError, Result};

/// Sigil that marks local commands
pub const COMMAND_MARKER: char = '/';

/// What the controller does after a handler ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// End the session and exit
    Quit,
    /// Append these lines to the console as `system`
    Print(Vec<String>),
    Nothing,
}

/// Handler receiving the table (for introspection) and the arguments after the name
pub type CommandHandler = Box<dyn Fn(&CommandTable, &[&str]) -> CommandOutcome + Send + Sync>;

pub struct CommandEntry {
    pub name: String,
    pub description: String,
    handler: CommandHandler,
}

impl CommandEntry {
    pub fn invoke(&self, table: &CommandTable, args: &[&str]) -> CommandOutcome {
        (self.handler)(table, args)
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct CommandTableBuilder {
    entries: Vec<CommandEntry>,
    index: HashMap<String, usize>,
}

impl CommandTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pre-loaded with `/quit` and `/help`
    pub fn with_builtins() -> Self {
        let mut builder = Self::new();
        builder.push(
            "quit",
            "Exit the program.",
            Box::new(|_: &CommandTable, _: &[&str]| CommandOutcome::Quit),
        );
        builder.push(
            "help",
            "List the available commands.",
            Box::new(|table: &CommandTable, _: &[&str]| {
                CommandOutcome::Print(table.help_lines())
            }),
        );
        builder
    }

    /// Register a command. Names must be unique.
    pub fn register<F>(mut self, name: &str, description: &str, handler: F) -> Result<Self>
    where
        F: Fn(&CommandTable, &[&str]) -> CommandOutcome + Send + Sync + 'static,
    {
        if self.index.contains_key(name) {
            return Err(MultimeterError::DuplicateCommand {
                name: name.to_string(),
            });
        }
        self.push(name, description, Box::new(handler));
        Ok(self)
    }

    fn push(&mut self, name: &str, description: &str, handler: CommandHandler) {
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(CommandEntry {
            name: name.to_string(),
            description: description.to_string(),
            handler,
        });
    }

    pub fn build(self) -> CommandTable {
        CommandTable {
            entries: self.entries,
            index: self.index,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Table
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CommandTable {
    entries: Vec<CommandEntry>,
    index: HashMap<String, usize>,
}

impl Default for CommandTable {
    fn default() -> Self {
        CommandTableBuilder::with_builtins().build()
    }
}

impl CommandTable {
    /// Exact, case-sensitive lookup
    pub fn get(&self, name: &str) -> Option<&CommandEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &CommandEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `/name<TAB>description`, one line per command
    pub fn help_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("{}{}\t{}", COMMAND_MARKER, e.name, e.description))
            .collect()
    }

    /// Marker-prefixed names whose lowercase form starts with the typed prefix
    pub fn complete(&self, partial: &str) -> Vec<String> {
        let Some(typed) = partial.strip_prefix(COMMAND_MARKER) else {
            return Vec::new();
        };
        let typed = typed.to_lowercase();

        self.entries
            .iter()
            .filter(|e| e.name.to_lowercase().starts_with(&typed))
            .map(|e| format!("{}{}", COMMAND_MARKER, e.name))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Input classification
// ─────────────────────────────────────────────────────────────────────────────

/// A submitted line, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInput<'a> {
    /// `/name arg...`; `name` is empty for a bare marker
    Command { name: &'a str, args: Vec<&'a str> },
    /// Text for the remote console
    Console(&'a str),
    Empty,
}

pub fn parse_input(line: &str) -> ParsedInput<'_> {
    if let Some(rest) = line.strip_prefix(COMMAND_MARKER) {
        // The name starts right after the marker: "/ quit" names "", not "quit"
        let (name, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        return ParsedInput::Command {
            name,
            args: tail.split_whitespace().collect(),
        };
    }

    if line.is_empty() {
        ParsedInput::Empty
    } else {
        ParsedInput::Console(line)
    }
}
