//! Mock API - in-process server for tests
//!
//! Accepts configured credentials, hands out a socket whose server side can
//! be driven by the test, and records console commands.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{AccountInfo, ApiClient, SessionToken, SocketHandle};
use crate::error::{MultimeterError, Result};
use crate::session::Credentials;

pub const MOCK_TOKEN: &str = "mock-token";
pub const MOCK_USER_ID: &str = "mock-user";

/// Server side of a mock socket
#[derive(Debug)]
pub struct MockServer {
    /// Frames pushed to the client
    pub to_client: mpsc::UnboundedSender<String>,
    /// Frames the client sent
    pub from_client: mpsc::UnboundedReceiver<String>,
}

impl MockServer {
    /// Push a `[path, payload]` topic message
    pub fn publish(&self, path: &str, payload: serde_json::Value) -> bool {
        let frame = serde_json::json!([path, payload]).to_string();
        self.to_client.send(frame).is_ok()
    }
}

/// How the mock server answers a freshly opened socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handshake {
    Acknowledge,
    Silent,
    Reject,
    HangUp,
    /// `open_socket` never completes
    Stall,
}

#[derive(Debug)]
struct MockState {
    password: Option<String>,
    handshake: Handshake,
    account_info: Option<AccountInfo>,
    server: Option<MockServer>,
    commands_rx: Option<mpsc::UnboundedReceiver<String>>,
}

/// Mock API client
#[derive(Debug)]
pub struct MockApi {
    state: Mutex<MockState>,
    commands_tx: mpsc::UnboundedSender<String>,
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockApi {
    /// Accepts any credentials and acknowledges the socket handshake
    pub fn new() -> Self {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Self {
            state: Mutex::new(MockState {
                password: None,
                handshake: Handshake::Acknowledge,
                account_info: Some(AccountInfo {
                    cpu: Some(20),
                    memory: None,
                }),
                server: None,
                commands_rx: Some(commands_rx),
            }),
            commands_tx,
        }
    }

    /// Only accept this password
    pub fn with_password(self, password: impl Into<String>) -> Self {
        self.state.lock().password = Some(password.into());
        self
    }

    /// Never send `auth ok`
    pub fn without_handshake(self) -> Self {
        self.state.lock().handshake = Handshake::Silent;
        self
    }

    /// Answer the socket auth frame with `auth failed`
    pub fn rejecting_handshake(self) -> Self {
        self.state.lock().handshake = Handshake::Reject;
        self
    }

    /// Close the server side as soon as the socket opens
    pub fn hanging_up(self) -> Self {
        self.state.lock().handshake = Handshake::HangUp;
        self
    }

    /// Never finish opening the socket
    pub fn stalling_socket(self) -> Self {
        self.state.lock().handshake = Handshake::Stall;
        self
    }

    /// `None` makes the account info fetch fail
    pub fn with_account_info(self, info: Option<AccountInfo>) -> Self {
        self.state.lock().account_info = info;
        self
    }

    /// Server side of the most recently opened socket
    pub fn take_server(&self) -> Option<MockServer> {
        self.state.lock().server.take()
    }

    /// Receiver of every console command sent through this client
    pub fn take_commands(&self) -> Option<mpsc::UnboundedReceiver<String>> {
        self.state.lock().commands_rx.take()
    }

    fn token() -> SessionToken {
        SessionToken {
            token: MOCK_TOKEN.to_string(),
            user_id: MOCK_USER_ID.to_string(),
        }
    }
}

#[async_trait]
impl ApiClient for MockApi {
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken> {
        let state = self.state.lock();
        match &state.password {
            Some(expected) if *expected != credentials.password => Err(MultimeterError::Auth {
                reason: "invalid email or password".to_string(),
            }),
            _ => Ok(Self::token()),
        }
    }

    async fn open_socket(&self, _token: &SessionToken) -> Result<SocketHandle> {
        let handshake = self.state.lock().handshake;
        if handshake == Handshake::Stall {
            std::future::pending::<()>().await;
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        match handshake {
            Handshake::Acknowledge => {
                let _ = in_tx.send(format!("auth ok {}", MOCK_TOKEN));
            }
            Handshake::Reject => {
                let _ = in_tx.send("auth failed".to_string());
            }
            _ => {}
        }
        if handshake != Handshake::HangUp {
            self.state.lock().server = Some(MockServer {
                to_client: in_tx,
                from_client: out_rx,
            });
        }

        Ok(SocketHandle {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }

    async fn send_console_command(&self, _token: &SessionToken, expression: &str) -> Result<()> {
        self.commands_tx
            .send(expression.to_string())
            .map_err(|_| MultimeterError::ConsoleCommand {
                reason: "mock server gone".to_string(),
            })
    }

    async fn fetch_account_info(&self, _token: &SessionToken) -> Result<AccountInfo> {
        self.state
            .lock()
            .account_info
            .clone()
            .ok_or_else(|| MultimeterError::AccountInfo {
                reason: "mock account info unavailable".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_rejects_wrong_password() {
        let api = MockApi::new().with_password("right");
        let err = api
            .authenticate(&Credentials::new("a@b.c", "wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, MultimeterError::Auth { .. }));
        assert!(api.authenticate(&Credentials::new("a@b.c", "right")).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_socket_acknowledges() {
        let api = MockApi::new();
        let token = api.authenticate(&Credentials::new("a@b.c", "x")).await.unwrap();
        let mut socket = api.open_socket(&token).await.unwrap();
        assert_eq!(socket.incoming.recv().await.unwrap(), "auth ok mock-token");

        let mut server = api.take_server().unwrap();
        socket.outgoing.send("subscribe x".to_string()).unwrap();
        assert_eq!(server.from_client.recv().await.unwrap(), "subscribe x");
    }

    #[tokio::test]
    async fn test_mock_socket_rejects_and_hangs_up() {
        let credentials = Credentials::new("a@b.c", "x");

        let api = MockApi::new().rejecting_handshake();
        let token = api.authenticate(&credentials).await.unwrap();
        let mut socket = api.open_socket(&token).await.unwrap();
        assert_eq!(socket.incoming.recv().await.unwrap(), "auth failed");

        let api = MockApi::new().hanging_up();
        let mut socket = api.open_socket(&token).await.unwrap();
        assert!(socket.incoming.recv().await.is_none());
        assert!(api.take_server().is_none());
    }
}
