//! Startup configuration: CLI flags over an optional TOML file over built-in
//! defaults.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Args;
use crate::error::OverlayError;
use crate::session::SessionConfig;

pub const DEFAULT_VIEWPORT_ROWS: usize = 20;
pub const DEFAULT_VIEWPORT_COLS: usize = 80;

/// Contents of the optional config file. Every key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub channel: Option<String>,
    pub nickname: Option<String>,
    pub reconnect_delay_ms: Option<u64>,
    pub viewport_rows: Option<u16>,
    pub viewport_cols: Option<u16>,
    pub query: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, OverlayError> {
        let text = std::fs::read_to_string(path).map_err(|source| OverlayError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| OverlayError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Terminal size hints from the `LINES` / `COLUMNS` environment variables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminalSize {
    pub rows: Option<usize>,
    pub cols: Option<usize>,
}

impl TerminalSize {
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().and_then(|v| v.trim().parse().ok());
        Self {
            rows: read("LINES"),
            cols: read("COLUMNS"),
        }
    }
}

/// Everything the binary needs after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub session: SessionConfig,
    pub viewport_rows: usize,
    pub viewport_cols: usize,
    pub query: Option<String>,
}

impl Settings {
    pub fn resolve(
        args: &Args,
        file: FileConfig,
        terminal: TerminalSize,
    ) -> Result<Self, OverlayError> {
        let defaults = SessionConfig::default();

        let channel = args
            .channel
            .clone()
            .or(file.channel)
            .map(|c| normalize_channel(&c))
            .unwrap_or(defaults.channel);
        if channel.is_empty() {
            return Err(OverlayError::InvalidSetting {
                name: "channel",
                reason: "must not be empty".into(),
            });
        }

        let nickname = args.nick.clone().or(file.nickname).unwrap_or(defaults.nickname);
        if nickname.trim().is_empty() {
            return Err(OverlayError::InvalidSetting {
                name: "nickname",
                reason: "must not be empty".into(),
            });
        }

        let reconnect_delay = args
            .reconnect_ms
            .or(file.reconnect_delay_ms)
            .map(Duration::from_millis)
            .unwrap_or(defaults.reconnect_delay);

        let viewport_rows = args
            .rows
            .or(file.viewport_rows)
            .map(usize::from)
            .or(terminal.rows)
            .unwrap_or(DEFAULT_VIEWPORT_ROWS);
        let viewport_cols = args
            .cols
            .or(file.viewport_cols)
            .map(usize::from)
            .or(terminal.cols)
            .unwrap_or(DEFAULT_VIEWPORT_COLS);
        if viewport_rows == 0 || viewport_cols == 0 {
            return Err(OverlayError::InvalidSetting {
                name: "viewport",
                reason: format!("{viewport_rows}x{viewport_cols} has no room to draw"),
            });
        }

        Ok(Settings {
            session: SessionConfig {
                endpoint: args.endpoint.clone().or(file.endpoint).unwrap_or(defaults.endpoint),
                channel,
                nickname,
                reconnect_delay,
            },
            viewport_rows,
            viewport_cols,
            query: args.query.clone().or(file.query),
        })
    }
}

/// Strip a leading `#` and surrounding whitespace.
pub fn normalize_channel(channel: &str) -> String {
    channel.trim().trim_start_matches('#').to_string()
}
