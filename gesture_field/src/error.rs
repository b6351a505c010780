//! Error types for the application layer.

use std::path::PathBuf;

use thiserror::Error;

/// Failures of a hand detector.  None of these stop the frame loop.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector command is empty")]
    NoCommand,

    #[error("failed to start detector {command:?}: {source}")]
    Spawn {
        command: String,
        #[source]
        source:  std::io::Error,
    },

    #[error("detector did not signal ready, got {0:?}")]
    NotReady(String),

    #[error("detector closed its output")]
    Closed,

    #[error("detector I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Wire(#[from] hand_signal::wire::WireError),

    #[error("detector reported: {0}")]
    Reported(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Fatal errors surfaced by [`crate::app::run`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("window: {0}")]
    Window(#[from] minifb::Error),
}
