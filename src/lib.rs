pub mod cli;
pub mod config;
pub mod error;
pub mod parser;
pub mod render;
pub mod session;
pub mod theme;
pub mod transport;

pub use error::OverlayError;
pub use parser::{classify, parse_message, LineKind, ParsedMessage};
pub use render::{DisplayBuffer, Entry, RenderSink, TerminalSink};
pub use session::{ConnectionState, Flow, Session, SessionConfig};
pub use transport::{Connection, ConnectionPeer, Connector, TransportEvent, WsConnector};
