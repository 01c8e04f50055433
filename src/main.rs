use std::io;

use chat_overlay::cli::Args;
use chat_overlay::config::{FileConfig, Settings, TerminalSize};
use chat_overlay::render::{DisplayBuffer, TerminalSink};
use chat_overlay::session::Session;
use chat_overlay::theme::{SystemPreference, Theme};
use chat_overlay::transport::WsConnector;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // stdout is the chat display, so diagnostics go to stderr.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing();

    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&args, file, TerminalSize::from_env())?;

    let (theme, _source) = Theme::resolve(settings.query.as_deref(), SystemPreference::detect());

    let sink = TerminalSink::new(
        io::stdout(),
        DisplayBuffer::new(settings.viewport_rows, settings.viewport_cols),
        theme,
    );
    let mut session = Session::new(settings.session, WsConnector, sink);

    tokio::select! {
        _ = session.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
        }
    }

    Ok(())
}
