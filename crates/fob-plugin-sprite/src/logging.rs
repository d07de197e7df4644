//! Logging setup for hosts embedding the sprite plugin
//!
//! Only available with the `logging` feature. The plugin itself only emits
//! `tracing` events; these helpers install a compact subscriber scoped to
//! this crate for tools that have none of their own.

use std::sync::Once;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable read by [`init_logging_from_env`]
pub const LOG_ENV: &str = "FOB_SPRITE_LOG";

const TARGET: &str = "fob_plugin_sprite";

static INIT: Once = Once::new();

/// Verbosity of sprite plugin output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    /// Artifact writes and warnings (default)
    #[default]
    Info,
    /// Per-module scans and watch events as well
    Debug,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Filter directive limited to this crate's events
    pub fn directive(&self) -> String {
        format!("{}={}", TARGET, self.as_filter())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "trace" => Ok(LogLevel::Debug),
            other => Err(format!("Invalid log level: {}", other)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter())
    }
}

fn install(level: LogLevel) {
    let filter = EnvFilter::try_new(level.directive()).unwrap_or_else(|_| EnvFilter::new("info"));

    // A host that already installed a subscriber keeps it
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).without_time())
        .try_init();
}

/// Install a subscriber printing sprite plugin events at `level`
///
/// Only the first call in a process has any effect.
///
/// ```rust,no_run
/// use fob_plugin_sprite::logging::{init_logging, LogLevel};
///
/// init_logging(LogLevel::Debug);
/// ```
pub fn init_logging(level: LogLevel) {
    INIT.call_once(|| install(level));
}

/// Like [`init_logging`], with the level read from `FOB_SPRITE_LOG`
///
/// Falls back to [`LogLevel::Info`] when the variable is unset or invalid.
pub fn init_logging_from_env() {
    let level = std::env::var(LOG_ENV)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or_default();
    init_logging(level);
}
