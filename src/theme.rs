//! Display theme selection: an explicit `theme=` query override, else the
//! terminal's own light/dark preference.

use colored::Color;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

/// Where the resolved theme came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeSource {
    Query,
    System,
}

/// The terminal's background preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemPreference {
    Dark,
    Light,
}

impl SystemPreference {
    /// Read the preference from the `COLORFGBG` environment variable.
    pub fn detect() -> Self {
        Self::from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
    }

    /// Interpret a `COLORFGBG` value (`fg;bg` or `fg;default;bg`).
    ///
    /// Background colours 0-6 and 8 are dark. Anything missing or
    /// unparseable counts as light.
    pub fn from_colorfgbg(value: Option<&str>) -> Self {
        let bg = value
            .and_then(|v| v.rsplit(';').next())
            .and_then(|bg| bg.trim().parse::<u8>().ok());
        match bg {
            Some(0..=6) | Some(8) => SystemPreference::Dark,
            _ => SystemPreference::Light,
        }
    }
}

impl Theme {
    /// Pick the theme once at startup.
    ///
    /// The query is matched by substring: `theme=dark` is checked before
    /// `theme=light`, and neither means fall back to the system preference.
    pub fn resolve(query: Option<&str>, system: SystemPreference) -> (Theme, ThemeSource) {
        let query = query.unwrap_or("");
        let resolved = if query.contains("theme=dark") {
            (Theme::Dark, ThemeSource::Query)
        } else if query.contains("theme=light") {
            (Theme::Light, ThemeSource::Query)
        } else {
            match system {
                SystemPreference::Dark => (Theme::Dark, ThemeSource::System),
                SystemPreference::Light => (Theme::Light, ThemeSource::System),
            }
        };

        match resolved {
            (Theme::Dark, ThemeSource::Query) => info!("Dark theme active"),
            (Theme::Light, ThemeSource::Query) => info!("Light theme active"),
            (Theme::Dark, ThemeSource::System) => info!("System preference: dark theme active"),
            (Theme::Light, ThemeSource::System) => info!("System preference: light theme active"),
        }
        resolved
    }

    pub fn username_color(self) -> Color {
        match self {
            Theme::Dark => Color::BrightCyan,
            Theme::Light => Color::Blue,
        }
    }

    pub fn body_color(self) -> Color {
        match self {
            Theme::Dark => Color::BrightWhite,
            Theme::Light => Color::Black,
        }
    }
}
