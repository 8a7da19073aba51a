//! Core of an augmented-reality content viewer.
//!
//! A [`SceneSession`](session::SceneSession) loads a rigged glTF bundle in the
//! background, plays its named animation clips, and spawns primitives in
//! front of a tracked controller. Rendering, tracking and input stay with the
//! host, which drives the session once per frame.

pub mod animation;
pub mod asset;
pub mod config;
pub mod error;
pub mod placement;
pub mod session;
pub mod spatial;
pub mod stats;
pub mod test_utils;
pub mod tracking;

pub use animation::AnimationDirector;
pub use asset::{AssetHandle, AssetLoadJob, BundleSource, FileBundleSource};
pub use config::ViewerConfig;
pub use error::{AnimationError, ConfigError, JobError, LoadError, PlacementGuardError};
pub use placement::{PlacedInstance, PlacementController};
pub use session::{SceneGraph, SceneSession, SessionEvent, SessionState, TriggerOutcome};
pub use tracking::TrackingPose;
