use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chat-overlay")]
#[command(version)]
#[command(about = "A read-only terminal viewer for one Twitch chat channel")]
pub struct Args {
    /// Channel to join (with or without the leading '#')
    #[arg(long)]
    pub channel: Option<String>,

    /// Anonymous nickname (Twitch accepts justinfan<digits>)
    #[arg(long)]
    pub nick: Option<String>,

    /// WebSocket endpoint of the chat gateway
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Delay before reconnecting after the socket closes, in milliseconds
    #[arg(long)]
    pub reconnect_ms: Option<u64>,

    /// Height of the chat display in terminal rows
    #[arg(long)]
    pub rows: Option<u16>,

    /// Width of the chat display in terminal columns
    #[arg(long)]
    pub cols: Option<u16>,

    /// Overlay query string, e.g. "theme=dark" or "theme=light"
    #[arg(long)]
    pub query: Option<String>,

    /// Path to a TOML config file
    #[arg(long, short)]
    pub config: Option<PathBuf>,
}
