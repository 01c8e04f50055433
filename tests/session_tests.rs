//! Tests for the chat session loop: join sequence, keep-alive replies,
//! rendering, and the fixed-delay reconnect. A scripted connector stands in
//! for the socket and the tokio clock is paused.

use std::time::Duration;

use chat_overlay::render::RenderSink;
use chat_overlay::session::{Session, SessionConfig, PONG_LINE};
use chat_overlay::transport::{Connection, ConnectionPeer, Connector, TransportEvent};
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Hands the transport end of every connection attempt to the test.
struct ScriptedConnector {
    peers: mpsc::UnboundedSender<(String, ConnectionPeer)>,
}

impl Connector for ScriptedConnector {
    fn connect(&mut self, endpoint: &str) -> Connection {
        let (connection, peer) = Connection::pair();
        let _ = self.peers.send((endpoint.to_string(), peer));
        connection
    }
}

struct ChannelSink(mpsc::UnboundedSender<(String, String)>);

impl RenderSink for ChannelSink {
    fn render(&mut self, username: &str, body: &str) {
        let _ = self.0.send((username.to_string(), body.to_string()));
    }
}

struct Harness {
    peers: mpsc::UnboundedReceiver<(String, ConnectionPeer)>,
    rendered: mpsc::UnboundedReceiver<(String, String)>,
    task: tokio::task::JoinHandle<()>,
}

fn start(config: SessionConfig) -> Harness {
    let (peers_tx, peers) = mpsc::unbounded_channel();
    let (render_tx, rendered) = mpsc::unbounded_channel();
    let mut session = Session::new(
        config,
        ScriptedConnector { peers: peers_tx },
        ChannelSink(render_tx),
    );
    let task = tokio::spawn(async move { session.run().await });
    Harness {
        peers,
        rendered,
        task,
    }
}

async fn next_line(peer: &mut ConnectionPeer) -> String {
    peer.outbound.recv().await.expect("session dropped the connection")
}

async fn open_and_join(peer: &mut ConnectionPeer) -> Vec<String> {
    peer.events.send(TransportEvent::Opened).unwrap();
    let mut lines = Vec::new();
    for _ in 0..3 {
        lines.push(next_line(peer).await);
    }
    lines
}

// ---------------------------------------------------------------------------
// Join sequence
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_connects_to_configured_endpoint_at_start() {
    let config = SessionConfig {
        endpoint: "ws://127.0.0.1:1".into(),
        ..SessionConfig::default()
    };
    let mut h = start(config);
    let (endpoint, _peer) = h.peers.recv().await.unwrap();
    assert_eq!(endpoint, "ws://127.0.0.1:1");
    h.task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_open_sends_pass_nick_join_in_order() {
    let mut h = start(SessionConfig::default());
    let (_, mut peer) = h.peers.recv().await.unwrap();
    let lines = open_and_join(&mut peer).await;
    assert_eq!(lines, vec!["PASS oauth:", "NICK justinfan123", "JOIN #dirtex808"]);
    h.task.abort();
}

// ---------------------------------------------------------------------------
// Keep-alive
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_each_ping_gets_one_pong() {
    let mut h = start(SessionConfig::default());
    let (_, mut peer) = h.peers.recv().await.unwrap();
    open_and_join(&mut peer).await;

    for _ in 0..3 {
        peer.events
            .send(TransportEvent::LineReceived("PING :tmi.twitch.tv".into()))
            .unwrap();
    }
    for _ in 0..3 {
        assert_eq!(next_line(&mut peer).await, PONG_LINE);
    }
    tokio::task::yield_now().await;
    assert!(peer.outbound.try_recv().is_err());
    h.task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_privmsg_containing_ping_is_not_rendered() {
    let mut h = start(SessionConfig::default());
    let (_, mut peer) = h.peers.recv().await.unwrap();
    open_and_join(&mut peer).await;

    peer.events
        .send(TransportEvent::LineReceived(":bob!bob@x PRIVMSG #chan :PING?".into()))
        .unwrap();
    peer.events
        .send(TransportEvent::LineReceived(":amy!amy@x PRIVMSG #chan :after".into()))
        .unwrap();

    assert_eq!(next_line(&mut peer).await, PONG_LINE);
    // The first render is the second line: the PING-bearing one was skipped.
    let first = h.rendered.recv().await.unwrap();
    assert_eq!(first, ("amy".to_string(), "after".to_string()));
    h.task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_pong_sent_before_next_line_is_handled() {
    let mut h = start(SessionConfig::default());
    let (_, mut peer) = h.peers.recv().await.unwrap();
    open_and_join(&mut peer).await;

    peer.events
        .send(TransportEvent::LineReceived("PING :tmi.twitch.tv".into()))
        .unwrap();
    peer.events
        .send(TransportEvent::LineReceived(":bob!bob@x PRIVMSG #chan :hi".into()))
        .unwrap();

    // Once the message is rendered, the PONG must already be queued.
    h.rendered.recv().await.unwrap();
    assert_eq!(peer.outbound.try_recv().unwrap(), PONG_LINE);
    h.task.abort();
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_messages_rendered_in_arrival_order() {
    let mut h = start(SessionConfig::default());
    let (_, mut peer) = h.peers.recv().await.unwrap();
    open_and_join(&mut peer).await;

    let lines = [
        ":a!a@x PRIVMSG #chan :one",
        ":tmi.twitch.tv 366 justinfan123 #chan :End of /NAMES list",
        ":b!b@x PRIVMSG #chan :two: with colon",
        ":c!c@x PRIVMSG #chan :",
    ];
    for line in lines {
        peer.events
            .send(TransportEvent::LineReceived(line.to_string()))
            .unwrap();
    }

    let mut got = Vec::new();
    for _ in 0..3 {
        got.push(h.rendered.recv().await.unwrap());
    }
    assert_eq!(
        got,
        vec![
            ("a".to_string(), "one".to_string()),
            ("b".to_string(), "two: with colon".to_string()),
            ("c".to_string(), String::new()),
        ]
    );
    h.task.abort();
}

// ---------------------------------------------------------------------------
// Reconnect
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_close_schedules_one_reconnect_after_delay() {
    let mut h = start(SessionConfig::default());
    let (_, mut first) = h.peers.recv().await.unwrap();
    open_and_join(&mut first).await;

    first.events.send(TransportEvent::Closed).unwrap();
    let closed_at = Instant::now();

    tokio::time::sleep(Duration::from_millis(999)).await;
    assert!(h.peers.try_recv().is_err(), "reconnected before the delay");

    let (_, _second) = h.peers.recv().await.unwrap();
    assert!(closed_at.elapsed() >= Duration::from_millis(1000));

    tokio::task::yield_now().await;
    assert!(h.peers.try_recv().is_err(), "more than one reconnect attempt");
    h.task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_error_then_close_reconnects_once() {
    let mut h = start(SessionConfig::default());
    let (_, first) = h.peers.recv().await.unwrap();

    // Handshake failure: no Opened, just error and close.
    first.events
        .send(TransportEvent::Errored("connection refused".into()))
        .unwrap();
    first.events.send(TransportEvent::Closed).unwrap();
    let closed_at = Instant::now();

    let (_, _second) = h.peers.recv().await.unwrap();
    assert!(closed_at.elapsed() >= Duration::from_millis(1000));
    tokio::task::yield_now().await;
    assert!(h.peers.try_recv().is_err());
    h.task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_error_alone_does_not_reconnect() {
    let mut h = start(SessionConfig::default());
    let (_, mut first) = h.peers.recv().await.unwrap();
    open_and_join(&mut first).await;

    first.events
        .send(TransportEvent::Errored("hiccup".into()))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(h.peers.try_recv().is_err());

    // Still joined: the connection keeps answering keep-alives.
    first.events
        .send(TransportEvent::LineReceived("PING :tmi.twitch.tv".into()))
        .unwrap();
    assert_eq!(next_line(&mut first).await, PONG_LINE);
    h.task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_dropped_transport_counts_as_close() {
    let mut h = start(SessionConfig::default());
    let (_, first) = h.peers.recv().await.unwrap();
    drop(first);
    let dropped_at = Instant::now();

    let (_, _second) = h.peers.recv().await.unwrap();
    assert!(dropped_at.elapsed() >= Duration::from_millis(1000));
    h.task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_delay_is_fixed_across_attempts() {
    let config = SessionConfig {
        reconnect_delay: Duration::from_millis(250),
        ..SessionConfig::default()
    };
    let mut h = start(config);

    let mut intervals = Vec::new();
    let (_, mut peer) = h.peers.recv().await.unwrap();
    for _ in 0..4 {
        peer.events.send(TransportEvent::Closed).unwrap();
        let closed_at = Instant::now();
        let (_, next) = h.peers.recv().await.unwrap();
        intervals.push(closed_at.elapsed());
        peer = next;
    }
    assert!(intervals
        .iter()
        .all(|d| *d >= Duration::from_millis(250) && *d < Duration::from_millis(260)));
    h.task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_rejoins_after_reconnect() {
    let mut h = start(SessionConfig::default());
    let (_, mut first) = h.peers.recv().await.unwrap();
    open_and_join(&mut first).await;
    first.events.send(TransportEvent::Closed).unwrap();

    let (_, mut second) = h.peers.recv().await.unwrap();
    let lines = open_and_join(&mut second).await;
    assert_eq!(lines, vec!["PASS oauth:", "NICK justinfan123", "JOIN #dirtex808"]);
    h.task.abort();
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_open_join_render_close_reconnect() {
    let mut h = start(SessionConfig::default());
    let (_, mut first) = h.peers.recv().await.unwrap();

    let lines = open_and_join(&mut first).await;
    assert_eq!(lines, vec!["PASS oauth:", "NICK justinfan123", "JOIN #dirtex808"]);

    first.events
        .send(TransportEvent::LineReceived(":bob!bob@x PRIVMSG #chan :hi".into()))
        .unwrap();
    assert_eq!(
        h.rendered.recv().await.unwrap(),
        ("bob".to_string(), "hi".to_string())
    );

    first.events.send(TransportEvent::Closed).unwrap();
    let closed_at = Instant::now();
    let (_, _second) = h.peers.recv().await.unwrap();
    assert!(closed_at.elapsed() >= Duration::from_millis(1000));
    h.task.abort();
}
