//! Session lifecycle states

use crate::error::LoadError;
use std::fmt;

/// Where the session is in its load lifecycle.
///
/// `Bootstrapping -> AwaitingFirstPlacement -> Loading -> Interactive`, or
/// `Loading -> LoadFailed`. Only the session changes it.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Bootstrapping,
    AwaitingFirstPlacement,
    Loading { progress: f32 },
    Interactive,
    LoadFailed(LoadError),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Bootstrapping => "bootstrapping",
            SessionState::AwaitingFirstPlacement => "awaiting_first_placement",
            SessionState::Loading { .. } => "loading",
            SessionState::Interactive => "interactive",
            SessionState::LoadFailed(_) => "load_failed",
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading { .. })
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Loading { progress } => {
                write!(f, "loading ({:.0}%)", progress * 100.0)
            }
            SessionState::LoadFailed(reason) => write!(f, "load_failed ({})", reason),
            other => f.write_str(other.name()),
        }
    }
}
