//! The scene session and its boundary types

mod events;
mod scene_graph;
#[allow(clippy::module_inception)]
mod session;
mod state;

pub use events::{SessionEvent, TriggerOutcome};
pub use scene_graph::{AssetDraw, DrawItem, DrawList, NodeId, RenderNode, SceneGraph};
pub use session::SceneSession;
pub use state::SessionState;
