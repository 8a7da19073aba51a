//! Error types for the viewer core
//!
//! Load errors are terminal for a session's load lifecycle, animation errors
//! are recoverable, and placement guard errors only suppress one spawn.

use thiserror::Error;

/// Why an asset load did not produce an asset
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    /// Retrieval of the bundle bytes failed
    #[error("network error: {0}")]
    Network(String),

    /// The bundle was malformed or uses unsupported features
    #[error("decode error: {0}")]
    Decode(String),

    /// The owning session was torn down mid-load
    #[error("load cancelled")]
    Cancelled,

    /// No progress arrived within the configured stall timeout
    #[error("load stalled for {after_secs:.1}s without progress")]
    TimedOut { after_secs: f32 },
}

impl LoadError {
    pub fn network(reason: impl Into<String>) -> Self {
        LoadError::Network(reason.into())
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        LoadError::Decode(reason.into())
    }
}

/// Misuse of an [`AssetLoadJob`](crate::asset::AssetLoadJob)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("load job already started")]
    AlreadyStarted,

    #[error("no async runtime available to run the load job")]
    NoRuntime,
}

/// Recoverable animation control failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    #[error("unknown animation clip '{0}'")]
    UnknownClip(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Raised by the session before a placement reaches the controller
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementGuardError {
    #[error("tracking pose unavailable at trigger time")]
    TrackingUnavailable,
}

/// Configuration loading and validation failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
