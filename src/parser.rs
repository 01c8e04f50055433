//! Line-level parsing for the IRC-over-WebSocket chat protocol.
//!
//! Only two commands matter to the viewer: the server keep-alive (`PING`) and
//! chat messages (`PRIVMSG`). Detection is plain substring containment over the
//! raw line, so a chat body that mentions `PING` is classified as a keep-alive.

/// Token whose presence marks a server keep-alive probe.
pub const PING_TOKEN: &str = "PING";

/// Token whose presence marks a chat message.
pub const PRIVMSG_TOKEN: &str = "PRIVMSG";

/// What the session should do with a raw line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Ping,
    Privmsg,
    Other,
}

/// Username and body extracted from one `PRIVMSG` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    pub username: String,
    pub body: String,
}

/// Classify a raw line. `PING` wins over `PRIVMSG` when both appear.
pub fn classify(line: &str) -> LineKind {
    if line.contains(PING_TOKEN) {
        LineKind::Ping
    } else if line.contains(PRIVMSG_TOKEN) {
        LineKind::Privmsg
    } else {
        LineKind::Other
    }
}

/// Extract `(username, body)` from a line shaped like
/// `:nick!user@host PRIVMSG #channel :message text`.
///
/// The username runs from the second character up to the first `!`. The body
/// is everything after the first `:` that follows the first `#`.
///
/// Malformed lines never panic:
/// - no `!` (or `!` as the first character) yields the first character as
///   the username;
/// - no `#` searches for the `:` from the start of the line;
/// - no `:` after the `#` returns the remainder starting at `#`.
pub fn parse_message(line: &str) -> ParsedMessage {
    ParsedMessage {
        username: username_of(line).to_string(),
        body: body_of(line).to_string(),
    }
}

fn username_of(line: &str) -> &str {
    // Byte offset of the second char; slicing here is always on a boundary.
    let start = line.char_indices().nth(1).map_or(line.len(), |(i, _)| i);
    match line.find('!') {
        Some(bang) if bang >= start => &line[start..bang],
        _ => &line[..start],
    }
}

fn body_of(line: &str) -> &str {
    let command = line.find('#').map_or(line, |hash| &line[hash..]);
    command
        .find(':')
        .map_or(command, |colon| &command[colon + 1..])
}
