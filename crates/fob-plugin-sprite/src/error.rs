//! Error types for sprite discovery, composition, and emission

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::optimize::OptimizeError;
use crate::runtime::RuntimeError;

/// Result alias used throughout the sprite plugin
pub type Result<T> = std::result::Result<T, SpriteError>;

/// Errors that can occur while building a sprite
#[derive(Error, Debug, Diagnostic)]
pub enum SpriteError {
    /// Plugin configuration could not be loaded or is incomplete
    #[error("Invalid sprite configuration: {message}")]
    #[diagnostic(
        code(fob::sprite::config),
        help("Check the `sprite` plugin options; `outputDir` is required")
    )]
    Config { message: String },

    /// A glob or regex pattern in the configuration does not compile
    #[error("Invalid {kind} pattern '{pattern}': {reason}")]
    #[diagnostic(code(fob::sprite::invalid_pattern))]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        reason: String,
    },

    /// Walking an input base directory failed
    #[error("Failed to discover icons in {base_dir}: {reason}")]
    #[diagnostic(code(fob::sprite::discovery))]
    Discovery { base_dir: PathBuf, reason: String },

    /// Reading or writing a file failed
    #[error(transparent)]
    #[diagnostic(code(fob::sprite::runtime))]
    Runtime(#[from] RuntimeError),

    /// The optimizer rejected an icon's markup
    #[error("Failed to optimize SVG file at path \"{}\": {source}", path.display())]
    #[diagnostic(
        code(fob::sprite::optimize),
        help("Fix the markup or disable optimization for this input with `optimize: false`")
    )]
    Optimize {
        path: PathBuf,
        #[source]
        source: OptimizeError,
    },

    /// An icon file has no root `<svg>` element
    #[error("SVG file at path \"{}\" does not contain an svg tag.", path.display())]
    #[diagnostic(
        code(fob::sprite::missing_svg_root),
        help("Every file matched by an input pattern must be an SVG document")
    )]
    MissingSvgRoot { path: PathBuf },

    /// An icon's markup could not be parsed while building its symbol
    #[error("Failed to parse SVG file at path \"{}\": {reason}", path.display())]
    #[diagnostic(code(fob::sprite::markup))]
    Markup { path: PathBuf, reason: String },

    /// The dev-mode file watcher could not be started
    #[error("Failed to watch icon directories: {0}")]
    #[diagnostic(code(fob::sprite::watch))]
    Watch(#[from] notify::Error),
}

impl SpriteError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_pattern(kind: &'static str, pattern: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidPattern {
            kind,
            pattern: pattern.into(),
            reason: reason.to_string(),
        }
    }

    pub fn optimize(path: impl Into<PathBuf>, source: OptimizeError) -> Self {
        Self::Optimize {
            path: path.into(),
            source,
        }
    }

    pub fn missing_svg_root(path: impl Into<PathBuf>) -> Self {
        Self::MissingSvgRoot { path: path.into() }
    }

    pub fn markup(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Markup {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
