//! Error types with fix suggestions

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

pub type Result<T> = std::result::Result<T, MultimeterError>;

#[derive(Error, Debug)]
pub enum MultimeterError {
    // ─────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────
    #[error("Authentication failed: {reason}")]
    Auth { reason: String },

    #[error("Server did not acknowledge the socket within {timeout_secs}s")]
    HandshakeTimeout { timeout_secs: u64 },

    #[error("Socket closed by server")]
    SocketClosed,

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Could not fetch account info: {reason}")]
    AccountInfo { reason: String },

    #[error("Console command failed: {reason}")]
    ConsoleCommand { reason: String },

    // ─────────────────────────────────────────────────────────────
    // Local commands
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid command: {name}")]
    InvalidCommand { name: String },

    #[error("Command '/{name}' is registered twice")]
    DuplicateCommand { name: String },

    // ─────────────────────────────────────────────────────────────
    // Payloads
    // ─────────────────────────────────────────────────────────────
    #[error("Malformed {topic} payload: {details}")]
    MalformedPayload { topic: String, details: String },

    // ─────────────────────────────────────────────────────────────
    // Plumbing
    // ─────────────────────────────────────────────────────────────
    #[error("Config error: {reason}")]
    Config { reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FixSuggestion for MultimeterError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            Self::Auth { .. } => {
                Some("Check email and password (MULTIMETER_EMAIL / MULTIMETER_PASSWORD)")
            }
            Self::HandshakeTimeout { .. } => {
                Some("Check the server URL, or raise handshake_timeout_secs in the config")
            }
            Self::SocketClosed | Self::Socket(_) => Some("Restart multimeter to reconnect"),
            Self::AccountInfo { .. } => None,
            Self::ConsoleCommand { .. } => Some("Check the shard setting for this server"),
            Self::InvalidCommand { .. } => Some("Type /help for the list of commands"),
            Self::DuplicateCommand { .. } => Some("Use unique command names"),
            Self::MalformedPayload { .. } => None,
            Self::Config { .. } => {
                Some("Check the config file, the MULTIMETER_* variables and the flags")
            }
            Self::Http(_) => Some("Check network connectivity and the server URL"),
            Self::Json(_) => None,
            Self::Io(_) => Some("Check file path and permissions"),
        }
    }
}
