//! Decoded bundle: node hierarchy plus its clip set

use crate::animation::{AnimationClip, ClipSet};
use crate::spatial::{Point3D, Transform};
use std::sync::Arc;

/// One node of the decoded hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub parent: Option<usize>,
    /// Bind-pose local transform
    pub local: Transform,
    pub visible: bool,
    pub has_mesh: bool,
}

impl SceneNode {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            local: Transform::identity(),
            visible: true,
            has_mesh: false,
        }
    }

    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_local(mut self, local: Transform) -> Self {
        self.local = local;
        self
    }

    pub fn with_mesh(mut self) -> Self {
        self.has_mesh = true;
        self
    }
}

/// A loaded asset.
///
/// Clip data sits behind an `Arc` so the animation director reads the same
/// clips the session owns without copying them.
#[derive(Debug, Clone)]
pub struct AssetHandle {
    name: String,
    nodes: Vec<SceneNode>,
    clips: Arc<ClipSet>,
    root: Transform,
}

impl AssetHandle {
    pub fn new(name: impl Into<String>, nodes: Vec<SceneNode>, clips: Vec<AnimationClip>) -> Self {
        let bind_pose = nodes.iter().map(|n| n.local).collect();
        Self {
            name: name.into(),
            nodes,
            clips: Arc::new(ClipSet::new(clips, bind_pose)),
            root: Transform::identity(),
        }
    }

    /// Bundle identifier the asset was loaded from
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    pub fn clips(&self) -> Arc<ClipSet> {
        Arc::clone(&self.clips)
    }

    /// Normalized clip names in source order
    pub fn clip_names(&self) -> Vec<String> {
        self.clips.names().into_iter().map(str::to_string).collect()
    }

    /// World transform of the asset root
    pub fn root_transform(&self) -> Transform {
        self.root
    }

    /// Place the asset root at `position` with a uniform scale
    pub fn place_root(&mut self, position: Point3D, scale: f32) {
        self.root = Transform::from_position(position).with_uniform_scale(scale);
    }

    /// Hide every node whose name is in `names`; returns how many were hidden
    pub fn hide_nodes(&mut self, names: &[String]) -> usize {
        let mut hidden = 0;
        for node in self.nodes.iter_mut() {
            if node.visible && names.iter().any(|n| *n == node.name) {
                node.visible = false;
                hidden += 1;
            }
        }
        hidden
    }
}
