//! Screeps client - REST endpoints via reqwest, push socket via tokio-tungstenite

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use super::{AccountInfo, ApiClient, SessionToken, SocketHandle};
use crate::error::{MultimeterError, Result};
use crate::session::Credentials;

/// Upper bound for every REST call
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_SERVER: &str = "https://screeps.com";

/// Response header carrying a rotated session token
const TOKEN_HEADER: &str = "x-token";

#[derive(Debug, Serialize)]
struct SigninRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SigninResponse {
    token: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    cpu: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ConsoleRequest<'a> {
    expression: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    shard: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ConsoleResponse {
    error: Option<String>,
}

/// Client for the official server or a private server
///
/// The server may rotate the session token on any authenticated response.
/// The latest one is kept and sent on later requests in place of the token
/// handed out at sign-in.
#[derive(Debug, Clone)]
pub struct ScreepsClient {
    http: Client,
    base: Url,
    shard: Option<String>,
    refreshed_token: Arc<Mutex<Option<String>>>,
}

impl ScreepsClient {
    pub fn new(server: &str, shard: Option<String>) -> Result<Self> {
        let mut base = Url::parse(server).map_err(|e| MultimeterError::Config {
            reason: format!("Invalid server URL '{}': {}", server, e),
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = Client::builder().timeout(HTTP_TIMEOUT).build()?;

        Ok(Self {
            http,
            base,
            shard,
            refreshed_token: Arc::new(Mutex::new(None)),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(|e| MultimeterError::Config {
            reason: format!("Invalid endpoint '{}': {}", path, e),
        })
    }

    /// `ws(s)://<server>/socket/websocket`
    pub fn socket_url(&self) -> Result<Url> {
        let mut url = self.endpoint("socket/websocket")?;
        let scheme = match url.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => {
                return Err(MultimeterError::Config {
                    reason: format!("Unsupported server scheme '{}'", other),
                })
            }
        };
        url.set_scheme(scheme).map_err(|()| MultimeterError::Config {
            reason: format!("Cannot derive socket URL from {}", self.base),
        })?;
        Ok(url)
    }

    /// Latest token seen from the server, else the one from sign-in
    fn current_token(&self, session_token: &str) -> String {
        self.refreshed_token
            .lock()
            .clone()
            .unwrap_or_else(|| session_token.to_string())
    }

    fn remember_token(&self, headers: &HeaderMap) {
        let token = headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty());
        if let Some(token) = token {
            tracing::trace!("session token rotated");
            *self.refreshed_token.lock() = Some(token.to_string());
        }
    }

    fn with_token(&self, request: RequestBuilder, session_token: &str) -> RequestBuilder {
        let token = self.current_token(session_token);
        request
            .header("X-Token", token.as_str())
            .header("X-Username", token.as_str())
    }

    async fn me(&self, token: &str) -> Result<MeResponse> {
        let request = self.with_token(self.http.get(self.endpoint("api/auth/me")?), token);
        let response = request.send().await?.error_for_status()?;
        self.remember_token(response.headers());
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ApiClient for ScreepsClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken> {
        let auth_err = |reason: String| MultimeterError::Auth { reason };

        let response = self
            .http
            .post(self.endpoint("api/auth/signin")?)
            .json(&SigninRequest {
                email: &credentials.email,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(|e| auth_err(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(auth_err("invalid email or password".to_string()))
            }
            status if !status.is_success() => {
                return Err(auth_err(format!("server returned {}", status)))
            }
            _ => {}
        }

        let body: SigninResponse = response.json().await.map_err(|e| auth_err(e.to_string()))?;
        let token = body.token.ok_or_else(|| {
            auth_err(body.error.unwrap_or_else(|| "no token in response".to_string()))
        })?;
        // A fresh sign-in supersedes anything rotated during an earlier session
        *self.refreshed_token.lock() = None;

        let me = self.me(&token).await.map_err(|e| auth_err(e.to_string()))?;
        tracing::info!(user_id = %me.id, "signed in");

        Ok(SessionToken {
            token,
            user_id: me.id,
        })
    }

    async fn open_socket(&self, _token: &SessionToken) -> Result<SocketHandle> {
        let url = self.socket_url()?;
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| MultimeterError::Socket(e.to_string()))?;
        tracing::debug!(%url, "socket connected");

        let (mut write, mut read) = stream.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    tracing::debug!(error = %e, "socket write failed");
                    break;
                }
            }
            let _ = write.close().await;
        });

        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if in_tx.send(text.to_string()).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "socket read failed");
                        break;
                    }
                }
            }
        });

        Ok(SocketHandle {
            outgoing: out_tx,
            incoming: in_rx,
        })
    }

    async fn send_console_command(&self, token: &SessionToken, expression: &str) -> Result<()> {
        let command_err = |reason: String| MultimeterError::ConsoleCommand { reason };

        let endpoint = self.endpoint("api/user/console")?;
        let request = self
            .with_token(self.http.post(endpoint), &token.token)
            .json(&ConsoleRequest {
                expression,
                shard: self.shard.as_deref(),
            });
        let response = request.send().await.map_err(|e| command_err(e.to_string()))?;
        self.remember_token(response.headers());
        let status = response.status();
        if !status.is_success() {
            return Err(command_err(format!("server returned {}", status)));
        }

        let body: ConsoleResponse = response
            .json()
            .await
            .map_err(|e| command_err(e.to_string()))?;
        match body.error {
            Some(error) => Err(command_err(error)),
            None => Ok(()),
        }
    }

    async fn fetch_account_info(&self, token: &SessionToken) -> Result<AccountInfo> {
        let me = self
            .me(&token.token)
            .await
            .map_err(|e| MultimeterError::AccountInfo {
                reason: e.to_string(),
            })?;
        Ok(AccountInfo {
            cpu: me.cpu,
            memory: None,
        })
    }
}
