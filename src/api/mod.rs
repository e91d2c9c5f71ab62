//! Remote API Client - Connector Layer
//!
//! Abstracts the game server's REST endpoints and its push socket so the
//! session controller can run against the real server or an in-process mock.

mod http;
mod mock;

pub use http::{ScreepsClient, DEFAULT_SERVER};
pub use mock::{MockApi, MockServer};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::session::Credentials;

// ─────────────────────────────────────────────────────────────────────────────
// Api Client Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Client contract for the remote console API
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Sign in and resolve the user id used in topic paths
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken>;

    /// Open the push socket. Socket-level auth is driven by the caller.
    async fn open_socket(&self, token: &SessionToken) -> Result<SocketHandle>;

    /// Run an expression in the player's console
    async fn send_console_command(&self, token: &SessionToken, expression: &str) -> Result<()>;

    /// Fetch account limits (CPU quota)
    async fn fetch_account_info(&self, token: &SessionToken) -> Result<AccountInfo>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Token
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub token: String,
    pub user_id: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Account Info
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub cpu: Option<u64>,
    #[serde(default)]
    pub memory: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Socket
// ─────────────────────────────────────────────────────────────────────────────

/// Text-frame channels of an open socket.
///
/// Dropping `outgoing` closes the connection; `incoming` yields `None` once the
/// server side is gone.
#[derive(Debug)]
pub struct SocketHandle {
    pub outgoing: mpsc::UnboundedSender<String>,
    pub incoming: mpsc::UnboundedReceiver<String>,
}

/// Frame that authenticates the socket
pub fn auth_frame(token: &SessionToken) -> String {
    format!("auth {}", token.token)
}

/// Frame that subscribes to a topic path
pub fn subscribe_frame(path: &str) -> String {
    format!("subscribe {}", path)
}
