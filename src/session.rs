//! Chat session: connect, authenticate anonymously, join one channel, answer
//! keep-alives, forward chat lines to a [`RenderSink`], and reconnect after
//! every close.
//!
//! ## Lifecycle
//! 1. `Disconnected` → `Connecting`: open a connection through the
//!    [`Connector`] (at start, and one fixed delay after every close).
//! 2. `Connecting` → `Joined`: on `Opened`, send `PASS`, `NICK`, `JOIN` in
//!    that order.
//! 3. `Joined`: `PING` lines get a `PONG`, `PRIVMSG` lines are parsed and
//!    rendered, anything else is ignored.
//! 4. Any state → `Disconnected` on `Closed` or when the event stream ends.
//!    Errors are logged and wait for the close that follows them.
//!
//! There is no retry ceiling and no backoff.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::parser::{classify, parse_message, LineKind};
use crate::render::RenderSink;
use crate::transport::{Connection, Connector, TransportEvent};

/// Twitch's IRC-over-WebSocket gateway.
pub const DEFAULT_ENDPOINT: &str = "wss://irc-ws.chat.twitch.tv";

/// Channel joined when none is configured.
pub const DEFAULT_CHANNEL: &str = "dirtex808";

/// Twitch accepts any `justinfan<digits>` nickname as a read-only guest.
pub const DEFAULT_NICKNAME: &str = "justinfan123";

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Anonymous login: an empty OAuth token.
pub const PASS_LINE: &str = "PASS oauth:";

/// Reply to every keep-alive probe.
pub const PONG_LINE: &str = "PONG :tmi.twitch.tv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Joined,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Joined => write!(f, "joined"),
        }
    }
}

/// Whether the current connection is still usable after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Disconnected,
}

/// Settings fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub endpoint: String,
    /// Channel name without the leading `#`.
    pub channel: String,
    pub nickname: String,
    pub reconnect_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            channel: DEFAULT_CHANNEL.to_string(),
            nickname: DEFAULT_NICKNAME.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

pub struct Session<C, S> {
    config: SessionConfig,
    connector: C,
    sink: S,
    state: ConnectionState,
    connection: Option<Connection>,
}

impl<C: Connector, S: RenderSink> Session<C, S> {
    pub fn new(config: SessionConfig, connector: C, sink: S) -> Self {
        Self {
            config,
            connector,
            sink,
            state: ConnectionState::Disconnected,
            connection: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn channel(&self) -> &str {
        &self.config.channel
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Drive the session forever, reconnecting after every close.
    ///
    /// Only returns if the future is dropped; stop it by dropping or aborting
    /// the task that runs it.
    pub async fn run(&mut self) {
        loop {
            self.open_connection();
            while let Some(event) = self.next_event().await {
                if self.handle_event(event) == Flow::Disconnected {
                    break;
                }
            }
            self.mark_disconnected();

            info!(
                delay_ms = self.config.reconnect_delay.as_millis() as u64,
                "Disconnected from chat, reconnecting"
            );
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    /// Apply one transport event to the session.
    pub fn handle_event(&mut self, event: TransportEvent) -> Flow {
        match event {
            TransportEvent::Opened => {
                info!(channel = %self.config.channel, "Connected to chat");
                self.state = ConnectionState::Joined;
                self.send(PASS_LINE.to_string());
                self.send(format!("NICK {}", self.config.nickname));
                self.send(format!("JOIN #{}", self.config.channel));
                Flow::Continue
            }
            TransportEvent::LineReceived(line) => {
                self.handle_line(&line);
                Flow::Continue
            }
            TransportEvent::Errored(error) => {
                warn!(%error, state = %self.state, "chat transport error");
                Flow::Continue
            }
            TransportEvent::Closed => {
                self.mark_disconnected();
                Flow::Disconnected
            }
        }
    }

    fn handle_line(&mut self, line: &str) {
        match classify(line) {
            LineKind::Ping => {
                debug!("keep-alive probe");
                self.send(PONG_LINE.to_string());
            }
            LineKind::Privmsg => {
                let msg = parse_message(line);
                self.sink.render(&msg.username, &msg.body);
            }
            LineKind::Other => trace!(line, "ignored"),
        }
    }

    fn open_connection(&mut self) {
        debug_assert!(self.connection.is_none(), "previous connection still held");
        info!(endpoint = %self.config.endpoint, "Connecting to chat");
        self.state = ConnectionState::Connecting;
        self.connection = Some(self.connector.connect(&self.config.endpoint));
    }

    fn mark_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.connection = None;
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        match self.connection.as_mut() {
            Some(connection) => connection.events.recv().await,
            None => None,
        }
    }

    fn send(&self, line: String) {
        let Some(connection) = self.connection.as_ref() else {
            debug!(line = %line, "no connection, dropping outbound line");
            return;
        };
        if connection.outbound.send(line).is_err() {
            debug!("connection already gone, outbound line dropped");
        }
    }
}
