//! Notifications for the UI collaborator

use super::state::SessionState;
use crate::error::{AnimationError, LoadError, PlacementGuardError};
use crate::placement::PlacedInstance;

/// Something the loading indicator, picker, or status surface should show
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    LoadProgress(f32),
    /// Surfaced verbatim from the load job
    LoadFailed(LoadError),
    /// The asset is in the scene; `clips` feeds the animation picker
    AssetReady { clips: Vec<String> },
    InstancePlaced(PlacedInstance),
    PlacementSuppressed(PlacementGuardError),
    AnimationRejected(AnimationError),
}

/// Result of one placement trigger
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Spawned(PlacedInstance),
    LoadStarted,
    Suppressed(PlacementGuardError),
    Ignored,
}
