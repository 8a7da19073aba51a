//! The boundary to the externally owned scene graph and renderer

use crate::animation::NodePose;
use crate::asset::SceneNode;
use crate::placement::{GeometryVariant, InstanceId, Material, PlacedInstance};
use crate::spatial::Transform;
use std::fmt;

/// Handle of a node the session inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    /// The loaded asset's root
    Asset,
    Instance(InstanceId),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Asset => f.write_str("asset"),
            NodeId::Instance(id) => write!(f, "{}", id),
        }
    }
}

/// Renderable representation handed to [`SceneGraph::insert`]
#[derive(Debug, Clone, PartialEq)]
pub enum RenderNode {
    Asset {
        name: String,
        root: Transform,
        nodes: Vec<SceneNode>,
    },
    Instance {
        id: InstanceId,
        geometry: GeometryVariant,
        material: Material,
        transform: Transform,
    },
}

impl RenderNode {
    pub fn id(&self) -> NodeId {
        match self {
            RenderNode::Asset { .. } => NodeId::Asset,
            RenderNode::Instance { id, .. } => NodeId::Instance(*id),
        }
    }
}

impl From<&PlacedInstance> for RenderNode {
    fn from(instance: &PlacedInstance) -> Self {
        RenderNode::Instance {
            id: instance.id,
            geometry: instance.geometry,
            material: instance.material,
            transform: instance.transform,
        }
    }
}

/// Per-instance draw transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub id: NodeId,
    pub transform: Transform,
}

/// Evaluated asset state for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDraw {
    pub root: Transform,
    /// Animated node poses, local to their parents
    pub nodes: Vec<NodePose>,
}

/// Everything to draw this frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawList {
    pub frame: u64,
    pub instances: Vec<DrawItem>,
    /// Present only once the session is interactive
    pub asset: Option<AssetDraw>,
}

impl DrawList {
    pub fn len(&self) -> usize {
        self.instances.len() + usize::from(self.asset.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Insert/remove/draw capability supplied by the host renderer
pub trait SceneGraph {
    fn insert(&mut self, node: &RenderNode);

    fn remove(&mut self, id: NodeId);

    /// Called once per frame with the full draw list
    fn draw(&mut self, frame: &DrawList);
}
