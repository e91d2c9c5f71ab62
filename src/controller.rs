//! Session Controller - connect, route, submit
//!
//! Owns the session, the command table and both panels. All mutation happens
//! on the caller's task through [`SessionController::handle_event`],
//! [`SessionController::submit`] and [`SessionController::route_message`].
//! Network work runs in spawned tasks that only ever report back through the
//! [`SessionEvent`] channel.
//!
//! ```text
//!   start() ──spawn──▶ connect() ──▶ Established / ConnectFailed ─┐
//!                                                                 │
//!   socket reader ──▶ Frame(text) / SocketClosed ─────────────────┤
//!   account fetch ──▶ AccountInfo(result) ────────────────────────┤
//!   console POST  ──▶ ConsoleCommandFailed(err) ──────────────────┤
//!                                                                 ▼
//!                                              next_event() → handle_event()
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::api::{auth_frame, subscribe_frame, AccountInfo, ApiClient, SessionToken, SocketHandle};
use crate::commands::{parse_input, CommandOutcome, CommandTable, ParsedInput};
use crate::error::{MultimeterError, Result};
use crate::protocol::{self, parse_frame, Frame, Topic, TopicMessage};
use crate::session::{ConnectionState, Credentials, Session};
use crate::tui::console::{ConsolePanel, LineCategory, DEFAULT_SCROLLBACK_LINES};
use crate::tui::gauges::{GaugeOverflow, GaugePanel};

pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

const MOTD: &str = "Now showing Screeps console. Type /help for help.";
const CODE_UPDATED: &str = "Code updated";

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Messages from background tasks to the controller
#[derive(Debug)]
pub enum SessionEvent {
    /// Connect sequence progress
    State(ConnectionState),
    Established(Established),
    ConnectFailed(MultimeterError),
    AccountInfo(Result<AccountInfo>),
    /// Raw text frame from the socket
    Frame(String),
    SocketClosed,
    ConsoleCommandFailed(MultimeterError),
}

/// An authenticated, handshaken socket
#[derive(Debug)]
pub struct Established {
    pub token: SessionToken,
    pub socket: SocketHandle,
}

/// Authenticate, open the socket and wait for the server to acknowledge it.
///
/// Opening the socket and waiting for `auth ok` share one deadline. Progress
/// is reported on `progress`. Frames that arrive before `auth ok` are
/// discarded.
pub async fn connect(
    api: &dyn ApiClient,
    credentials: &Credentials,
    handshake_timeout: Duration,
    progress: &mpsc::UnboundedSender<SessionEvent>,
) -> Result<Established> {
    let _ = progress.send(SessionEvent::State(ConnectionState::Authenticating));
    let token = api.authenticate(credentials).await?;
    tracing::debug!(user = %token.user_id, "signed in");

    let _ = progress.send(SessionEvent::State(ConnectionState::AwaitingHandshake));
    let handshake = async {
        let mut socket = api.open_socket(&token).await?;
        socket
            .outgoing
            .send(auth_frame(&token))
            .map_err(|_| MultimeterError::SocketClosed)?;

        loop {
            let Some(text) = socket.incoming.recv().await else {
                return Err(MultimeterError::SocketClosed);
            };
            match parse_frame(&text) {
                Frame::AuthOk => return Ok(socket),
                Frame::AuthFailed => {
                    return Err(MultimeterError::Auth {
                        reason: "socket authentication rejected".to_string(),
                    })
                }
                other => tracing::debug!(frame = ?other, "frame before handshake ignored"),
            }
        }
    };

    match tokio::time::timeout(handshake_timeout, handshake).await {
        Ok(Ok(socket)) => Ok(Established { token, socket }),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(MultimeterError::HandshakeTimeout {
            timeout_secs: handshake_timeout.as_secs(),
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Routing
// ─────────────────────────────────────────────────────────────────────────────

type RouteFn = fn(&mut SessionController, TopicMessage);

/// Topic dispatch table
const ROUTES: &[(Topic, RouteFn)] = &[
    (Topic::Console, route_console),
    (Topic::Cpu, route_telemetry),
    (Topic::Code, route_code),
];

fn route_console(controller: &mut SessionController, message: TopicMessage) {
    let TopicMessage::Console { user, payload } = message else {
        return;
    };
    tracing::trace!(%user, "console message");

    if let Some(messages) = payload.messages {
        for line in &messages.log {
            controller.console.add_lines(LineCategory::Log, line);
        }
        for line in &messages.results {
            controller.console.add_lines(LineCategory::Result, line);
        }
    }
    if let Some(error) = payload.error {
        controller.console.add_lines(LineCategory::Error, &error);
    }
}

fn route_telemetry(controller: &mut SessionController, message: TopicMessage) {
    let TopicMessage::Telemetry(sample) = message else {
        return;
    };
    controller.gauges.update(
        sample.cpu,
        controller.session.cpu_limit(),
        sample.memory,
        controller.session.memory_limit(),
    );
}

fn route_code(controller: &mut SessionController, _message: TopicMessage) {
    controller.console.system(CODE_UPDATED);
}

// ─────────────────────────────────────────────────────────────────────────────
// Controller
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub handshake_timeout: Duration,
    pub scrollback_lines: usize,
    pub gauge_overflow: GaugeOverflow,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            scrollback_lines: DEFAULT_SCROLLBACK_LINES,
            gauge_overflow: GaugeOverflow::default(),
        }
    }
}

pub struct SessionController {
    api: Arc<dyn ApiClient>,
    session: Session,
    commands: CommandTable,
    console: ConsolePanel,
    gauges: GaugePanel,
    options: ControllerOptions,
    /// Writer half of the active socket
    outgoing: Option<mpsc::UnboundedSender<String>>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    should_quit: bool,
}

impl SessionController {
    pub fn new(
        api: Arc<dyn ApiClient>,
        credentials: Credentials,
        commands: CommandTable,
        options: ControllerOptions,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            session: Session::new(credentials),
            commands,
            console: ConsolePanel::new(options.scrollback_lines),
            gauges: GaugePanel::new(options.gauge_overflow),
            options,
            outgoing: None,
            events_tx,
            events_rx,
            should_quit: false,
        }
    }

    /// Begin the connect sequence in the background. No-op unless disconnected.
    pub fn start(&mut self) {
        if self.session.state() != ConnectionState::Disconnected {
            return;
        }
        let email = self.session.credentials().email.clone();
        self.console
            .system(&format!("Connecting to Screeps as {}...", email));
        self.session.transition(ConnectionState::Authenticating);

        let api = Arc::clone(&self.api);
        let credentials = self.session.credentials().clone();
        let timeout = self.options.handshake_timeout;
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match connect(api.as_ref(), &credentials, timeout, &tx).await {
                Ok(established) => SessionEvent::Established(established),
                Err(e) => SessionEvent::ConnectFailed(e),
            };
            let _ = tx.send(event);
        });
    }

    /// Wait for the next background event
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::State(state) => {
                // Progress from a connect task that lost the race to /quit
                if self.session.state() != ConnectionState::Disconnected {
                    self.session.transition(state);
                }
            }
            SessionEvent::Established(established) => self.activate(established),
            SessionEvent::ConnectFailed(err) => {
                tracing::error!(error = %err, "connect failed");
                self.session.reset();
                self.console
                    .add_lines(LineCategory::Error, &format!("Connection failed: {}", err));
            }
            SessionEvent::AccountInfo(Ok(info)) => {
                tracing::info!(cpu = ?info.cpu, memory = ?info.memory, "account limits");
                self.session.apply_account_info(&info);
            }
            SessionEvent::AccountInfo(Err(err)) => {
                tracing::debug!(error = %err, "account info unavailable; keeping defaults");
            }
            SessionEvent::Frame(text) => match parse_frame(&text) {
                Frame::Topic { path, payload } => self.route_message(&path, payload),
                other => tracing::debug!(frame = ?other, "status frame ignored"),
            },
            SessionEvent::SocketClosed => {
                if self.session.state() != ConnectionState::Disconnected {
                    tracing::info!("socket closed by server");
                    self.outgoing = None;
                    self.session.reset();
                    self.console.system("Connection closed");
                }
            }
            SessionEvent::ConsoleCommandFailed(err) => {
                self.console.add_lines(LineCategory::Error, &err.to_string());
            }
        }
    }

    fn activate(&mut self, established: Established) {
        if self.should_quit {
            return;
        }
        let Established { token, socket } = established;
        let SocketHandle {
            outgoing,
            mut incoming,
        } = socket;

        self.session.transition(ConnectionState::Subscribing);
        for topic in Topic::ALL {
            let path = topic.path_for(&token.user_id);
            if outgoing.send(subscribe_frame(&path)).is_err() {
                tracing::debug!(%path, "socket writer gone before subscribe");
            }
        }

        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            while let Some(text) = incoming.recv().await {
                if tx.send(SessionEvent::Frame(text)).is_err() {
                    return;
                }
            }
            let _ = tx.send(SessionEvent::SocketClosed);
        });

        self.outgoing = Some(outgoing);
        self.session.set_token(token.clone());
        self.session.transition(ConnectionState::Active);
        tracing::info!(user = %token.user_id, "session active");
        self.console.system(MOTD);

        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_account_info(&token).await;
            let _ = tx.send(SessionEvent::AccountInfo(result));
        });
    }

    /// Dispatch a topic message to its route. Malformed payloads are dropped.
    pub fn route_message(&mut self, path: &str, payload: Value) {
        let Some(topic) = Topic::from_path(path) else {
            tracing::debug!(%path, "unknown topic dropped");
            return;
        };
        let Some(&(_, route)) = ROUTES.iter().find(|(t, _)| *t == topic) else {
            tracing::debug!(%path, "no route for topic");
            return;
        };

        match protocol::decode(topic, path, payload) {
            Ok(message) => route(self, message),
            Err(err) => tracing::warn!(%path, error = %err, "dropping malformed payload"),
        }
    }

    /// Handle one submitted input line
    pub fn submit(&mut self, line: &str) {
        match parse_input(line) {
            ParsedInput::Empty => {}
            ParsedInput::Command { name, args } => {
                let outcome = self
                    .commands
                    .get(name)
                    .map(|entry| entry.invoke(&self.commands, &args));
                match outcome {
                    Some(CommandOutcome::Quit) => self.quit(),
                    Some(CommandOutcome::Print(lines)) => {
                        for line in &lines {
                            self.console.system(line);
                        }
                    }
                    Some(CommandOutcome::Nothing) => {}
                    None => {
                        let err = MultimeterError::InvalidCommand {
                            name: name.to_string(),
                        };
                        self.console.system(&err.to_string());
                    }
                }
            }
            ParsedInput::Console(text) => {
                self.console.add_lines(LineCategory::Console, text);
                self.forward(text);
            }
        }
    }

    fn forward(&mut self, expression: &str) {
        let token = match self.session.token() {
            Some(token) if self.session.is_active() => token.clone(),
            _ => {
                tracing::debug!("not connected; console command dropped");
                return;
            }
        };

        let api = Arc::clone(&self.api);
        let tx = self.events_tx.clone();
        let expression = expression.to_string();
        tokio::spawn(async move {
            if let Err(err) = api.send_console_command(&token, &expression).await {
                tracing::warn!(error = %err, "console command failed");
                let _ = tx.send(SessionEvent::ConsoleCommandFailed(err));
            }
        });
    }

    /// Completion candidates for the typed input
    pub fn complete(&self, partial: &str) -> Vec<String> {
        self.commands.complete(partial)
    }

    fn quit(&mut self) {
        self.outgoing = None;
        self.session.reset();
        self.should_quit = true;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    pub fn console(&self) -> &ConsolePanel {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut ConsolePanel {
        &mut self.console
    }

    pub fn gauges(&self) -> &GaugePanel {
        &self.gauges
    }

    pub fn gauges_mut(&mut self) -> &mut GaugePanel {
        &mut self.gauges
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }
}
