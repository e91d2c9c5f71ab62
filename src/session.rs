//! Session state: credentials, connection lifecycle and gauge limits

use std::fmt;

use crate::api::{AccountInfo, SessionToken};

/// CPU limit used until the server reports the account quota
pub const DEFAULT_CPU_LIMIT: u64 = 1;

/// Memory limit in bytes (2 MiB of Memory per player)
pub const DEFAULT_MEMORY_LIMIT: u64 = 2_097_152;

/// Login credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection State
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Authenticating,
    AwaitingHandshake,
    Subscribing,
    Active,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "DISCONNECTED"),
            Self::Authenticating => write!(f, "AUTHENTICATING"),
            Self::AwaitingHandshake => write!(f, "HANDSHAKE"),
            Self::Subscribing => write!(f, "SUBSCRIBING"),
            Self::Active => write!(f, "ACTIVE"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// The one live connection to the server
#[derive(Debug)]
pub struct Session {
    credentials: Credentials,
    state: ConnectionState,
    token: Option<SessionToken>,
    cpu_limit: u64,
    memory_limit: u64,
}

impl Session {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            state: ConnectionState::Disconnected,
            token: None,
            cpu_limit: DEFAULT_CPU_LIMIT,
            memory_limit: DEFAULT_MEMORY_LIMIT,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ConnectionState::Active
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    pub fn cpu_limit(&self) -> u64 {
        self.cpu_limit
    }

    pub fn memory_limit(&self) -> u64 {
        self.memory_limit
    }

    pub(crate) fn transition(&mut self, next: ConnectionState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "session state");
            self.state = next;
        }
    }

    pub(crate) fn set_token(&mut self, token: SessionToken) {
        self.token = Some(token);
    }

    /// Back to Disconnected, dropping the token. Limits are kept.
    pub(crate) fn reset(&mut self) {
        self.transition(ConnectionState::Disconnected);
        self.token = None;
    }

    /// Seed limits from the account quota. Zero values are ignored so limits stay positive.
    pub(crate) fn apply_account_info(&mut self, info: &AccountInfo) {
        if let Some(cpu) = info.cpu.filter(|&c| c > 0) {
            self.cpu_limit = cpu;
        }
        if let Some(memory) = info.memory.filter(|&m| m > 0) {
            self.memory_limit = memory;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_defaults() {
        let session = Session::new(Credentials::new("me@example.com", "hunter2"));
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(session.cpu_limit(), 1);
        assert_eq!(session.memory_limit(), 2_097_152);
        assert!(session.token().is_none());
    }

    #[test]
    fn test_account_info_never_zeroes_limits() {
        let mut session = Session::new(Credentials::new("me@example.com", "hunter2"));
        session.apply_account_info(&AccountInfo {
            cpu: Some(0),
            memory: Some(0),
        });
        assert_eq!(session.cpu_limit(), DEFAULT_CPU_LIMIT);
        assert_eq!(session.memory_limit(), DEFAULT_MEMORY_LIMIT);

        session.apply_account_info(&AccountInfo {
            cpu: Some(30),
            memory: None,
        });
        assert_eq!(session.cpu_limit(), 30);
        assert_eq!(session.memory_limit(), DEFAULT_MEMORY_LIMIT);
    }

    #[test]
    fn test_credentials_debug_masks_password() {
        let creds = Credentials::new("me@example.com", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("me@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Active.to_string(), "ACTIVE");
        assert_eq!(ConnectionState::AwaitingHandshake.to_string(), "HANDSHAKE");
    }
}
