//! WebSocket transport: turns one socket into a stream of [`TransportEvent`]s
//! and a fire-and-forget outbound line queue.
//!
//! ## Design
//! - `Connector::connect` returns immediately; the socket is opened by a
//!   background task, which reports `Opened` once the handshake completes.
//! - Each connection gets one pump task multiplexing socket frames and
//!   outbound lines with `tokio::select!`.
//! - A pump always finishes with `Closed`, whether the server hung up, the
//!   handshake failed, or a read/write failed (those also emit `Errored`).
//! - IRC lines are split out of each text frame; Twitch batches several
//!   `\r\n`-terminated lines per frame.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, trace};

/// Something that happened on a connection, delivered in socket order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    LineReceived(String),
    Closed,
    Errored(String),
}

/// The session's end of a connection.
#[derive(Debug)]
pub struct Connection {
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
    pub outbound: mpsc::UnboundedSender<String>,
}

/// The transport's end of a connection.
#[derive(Debug)]
pub struct ConnectionPeer {
    pub events: mpsc::UnboundedSender<TransportEvent>,
    pub outbound: mpsc::UnboundedReceiver<String>,
}

impl Connection {
    /// Create both ends of a connection.
    pub fn pair() -> (Connection, ConnectionPeer) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        (
            Connection {
                events: events_rx,
                outbound: outbound_tx,
            },
            ConnectionPeer {
                events: events_tx,
                outbound: outbound_rx,
            },
        )
    }
}

/// Opens connections to an endpoint.
pub trait Connector {
    /// Start a connection attempt. Must not block; progress is reported
    /// through the returned connection's events.
    fn connect(&mut self, endpoint: &str) -> Connection;
}

/// Connector backed by `tokio-tungstenite`. Must be used inside a tokio
/// runtime.
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn connect(&mut self, endpoint: &str) -> Connection {
        let (connection, peer) = Connection::pair();
        tokio::spawn(pump(endpoint.to_string(), peer));
        connection
    }
}

/// Split a text frame into non-empty IRC lines.
pub fn split_frame(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\r', '\n']).filter(|line| !line.is_empty())
}

async fn pump(endpoint: String, peer: ConnectionPeer) {
    let ConnectionPeer {
        events,
        mut outbound,
    } = peer;

    let ws_stream = match tokio_tungstenite::connect_async(endpoint.as_str()).await {
        Ok((ws_stream, _response)) => ws_stream,
        Err(e) => {
            let _ = events.send(TransportEvent::Errored(e.to_string()));
            let _ = events.send(TransportEvent::Closed);
            return;
        }
    };
    debug!(%endpoint, "websocket handshake complete");
    if events.send(TransportEvent::Opened).is_err() {
        return;
    }

    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    loop {
        tokio::select! {
            frame = ws_stream.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        for line in split_frame(&text) {
                            trace!(line, "<");
                            if events.send(TransportEvent::LineReceived(line.to_string())).is_err() {
                                return;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        debug!(?frame, "server closed the websocket");
                        // Flushes the Close reply tungstenite queued for us.
                        if let Err(e) = ws_sink.close().await {
                            debug!(error = %e, "close handshake not completed");
                        }
                        break;
                    }
                    // Control frames are answered by tungstenite itself.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let _ = events.send(TransportEvent::Errored(e.to_string()));
                        break;
                    }
                    None => break,
                }
            }
            line = outbound.recv() => {
                match line {
                    Some(line) => {
                        trace!(line = %line, ">");
                        if let Err(e) = ws_sink.send(WsMessage::Text(line)).await {
                            let _ = events.send(TransportEvent::Errored(e.to_string()));
                            break;
                        }
                    }
                    // The session dropped this connection; nobody is listening.
                    None => {
                        let _ = ws_sink.close().await;
                        return;
                    }
                }
            }
        }
    }

    let _ = events.send(TransportEvent::Closed);
}
