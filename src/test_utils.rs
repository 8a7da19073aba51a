//! Test doubles and fixtures shared by unit and integration tests

use crate::asset::{BundleSource, ProgressSink};
use crate::error::LoadError;
use crate::session::{DrawList, NodeId, RenderNode, SceneGraph};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Serves bundles from memory with scripted progress
#[derive(Debug, Clone)]
pub struct MemoryBundleSource {
    bundles: HashMap<String, Vec<u8>>,
    progress_steps: Vec<f32>,
    step_delay: Duration,
    stalled: bool,
}

impl Default for MemoryBundleSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBundleSource {
    pub fn new() -> Self {
        Self {
            bundles: HashMap::new(),
            progress_steps: vec![0.0, 1.0],
            step_delay: Duration::ZERO,
            stalled: false,
        }
    }

    pub fn with_bundle(mut self, id: &str, bytes: Vec<u8>) -> Self {
        self.bundles.insert(id.to_string(), bytes);
        self
    }

    /// Progress fractions reported, in order, before the bytes are returned
    pub fn with_progress_steps(mut self, steps: Vec<f32>) -> Self {
        self.progress_steps = steps;
        self
    }

    /// Sleep before each progress step
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Never answer any fetch
    pub fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }
}

#[async_trait]
impl BundleSource for MemoryBundleSource {
    async fn fetch(&self, bundle: &str, progress: ProgressSink) -> Result<Vec<u8>, LoadError> {
        if self.stalled {
            std::future::pending::<()>().await;
        }
        let bytes = self
            .bundles
            .get(bundle)
            .cloned()
            .ok_or_else(|| LoadError::network(format!("no bundle named '{}'", bundle)))?;
        for step in &self.progress_steps {
            if !self.step_delay.is_zero() {
                tokio::time::sleep(self.step_delay).await;
            }
            progress.fraction(*step);
        }
        Ok(bytes)
    }
}

/// Everything a [`RecordingSceneGraph`] has seen
#[derive(Debug, Clone, Default)]
pub struct SceneLog {
    pub inserted: Vec<RenderNode>,
    pub removed: Vec<NodeId>,
    pub draws: Vec<DrawList>,
}

impl SceneLog {
    pub fn insert_count(&self, id: NodeId) -> usize {
        self.inserted.iter().filter(|n| n.id() == id).count()
    }

    /// Inserted and not yet removed
    pub fn live(&self) -> Vec<NodeId> {
        self.inserted
            .iter()
            .map(RenderNode::id)
            .filter(|id| !self.removed.contains(id))
            .collect()
    }

    pub fn last_draw(&self) -> Option<&DrawList> {
        self.draws.last()
    }
}

/// Scene graph that records calls. Clones share one log, so a test can keep
/// a handle after the session that owns the graph is dropped.
#[derive(Debug, Clone, Default)]
pub struct RecordingSceneGraph {
    log: Arc<Mutex<SceneLog>>,
}

impl RecordingSceneGraph {
    pub fn log(&self) -> MutexGuard<'_, SceneLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SceneGraph for RecordingSceneGraph {
    fn insert(&mut self, node: &RenderNode) {
        self.log().inserted.push(node.clone());
    }

    fn remove(&mut self, id: NodeId) {
        self.log().removed.push(id);
    }

    fn draw(&mut self, frame: &DrawList) {
        self.log().draws.push(frame.clone());
    }
}

struct FixtureNode {
    name: String,
    parent: Option<usize>,
    mesh: bool,
}

struct FixtureChannel {
    node: usize,
    path: &'static str,
    times: Vec<f32>,
    values: Vec<f32>,
    value_type: &'static str,
}

/// Float data packed into one buffer, one view and accessor per block
#[derive(Default)]
struct FixtureBuffer {
    bytes: Vec<u8>,
    views: Vec<Value>,
    accessors: Vec<Value>,
}

impl FixtureBuffer {
    fn push(&mut self, data: &[f32], count: usize, kind: &str, bounds: Option<(Value, Value)>) -> usize {
        let offset = self.bytes.len();
        for value in data {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        self.views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": data.len() * 4,
        }));
        let mut accessor = json!({
            "bufferView": self.views.len() - 1,
            "componentType": 5126,
            "count": count,
            "type": kind,
        });
        if let Some((min, max)) = bounds {
            accessor["min"] = min;
            accessor["max"] = max;
        }
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }
}

/// Builds small glTF documents with an embedded base64 buffer
#[derive(Default)]
pub struct GltfFixture {
    nodes: Vec<FixtureNode>,
    clips: Vec<(String, Vec<FixtureChannel>)>,
}

impl GltfFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A knight-like rig: an armature with a body mesh,
    /// a helper "Cube" mesh, and two clips
    pub fn knight() -> Self {
        Self::new()
            .node("Armature", None)
            .mesh_node("Body", Some(0))
            .mesh_node("Cube", Some(0))
            .translation_clip("Look Around", 1, &[0.0, 1.0, 2.0], &[0.0, 0.5, 0.0])
            .rotation_clip(
                "Wave",
                1,
                &[0.0, 0.5],
                &[[0.0, 0.0, 0.0, 1.0], [0.0, 0.7071068, 0.0, 0.7071068]],
            )
    }

    pub fn node(mut self, name: &str, parent: Option<usize>) -> Self {
        self.nodes.push(FixtureNode {
            name: name.to_string(),
            parent,
            mesh: false,
        });
        self
    }

    pub fn mesh_node(mut self, name: &str, parent: Option<usize>) -> Self {
        self.nodes.push(FixtureNode {
            name: name.to_string(),
            parent,
            mesh: true,
        });
        self
    }

    /// Clip moving `node` along X
    pub fn translation_clip(mut self, name: &str, node: usize, times: &[f32], xs: &[f32]) -> Self {
        self.clips.push((
            name.to_string(),
            vec![FixtureChannel {
                node,
                path: "translation",
                times: times.to_vec(),
                values: xs.iter().flat_map(|&x| [x, 0.0, 0.0]).collect(),
                value_type: "VEC3",
            }],
        ));
        self
    }

    /// Clip rotating `node` through `[x, y, z, w]` keys
    pub fn rotation_clip(mut self, name: &str, node: usize, times: &[f32], keys: &[[f32; 4]]) -> Self {
        self.clips.push((
            name.to_string(),
            vec![FixtureChannel {
                node,
                path: "rotation",
                times: times.to_vec(),
                values: keys.iter().flatten().copied().collect(),
                value_type: "VEC4",
            }],
        ));
        self
    }

    pub fn to_json(&self) -> Value {
        let mut data = FixtureBuffer::default();

        let has_mesh = self.nodes.iter().any(|n| n.mesh);
        let position = if has_mesh {
            Some(data.push(
                &[0.0, 0.0, 0.0, 0.1, 0.0, 0.0, 0.0, 0.1, 0.0],
                3,
                "VEC3",
                Some((json!([0.0, 0.0, 0.0]), json!([0.1, 0.1, 0.0]))),
            ))
        } else {
            None
        };

        let mut animations = Vec::new();
        for (name, channels) in &self.clips {
            let mut samplers = Vec::new();
            let mut targets = Vec::new();
            for channel in channels {
                let first = channel.times.first().copied().unwrap_or(0.0);
                let last = channel.times.last().copied().unwrap_or(0.0);
                let input = data.push(
                    &channel.times,
                    channel.times.len(),
                    "SCALAR",
                    Some((json!([first]), json!([last]))),
                );
                let output = data.push(
                    &channel.values,
                    channel.times.len(),
                    channel.value_type,
                    None,
                );
                samplers.push(json!({ "input": input, "output": output, "interpolation": "LINEAR" }));
                targets.push(json!({
                    "sampler": samplers.len() - 1,
                    "target": { "node": channel.node, "path": channel.path },
                }));
            }
            animations.push(json!({ "name": name, "samplers": samplers, "channels": targets }));
        }

        let nodes: Vec<Value> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let mut value = json!({ "name": node.name });
                let children: Vec<usize> = self
                    .nodes
                    .iter()
                    .enumerate()
                    .filter(|(_, n)| n.parent == Some(index))
                    .map(|(i, _)| i)
                    .collect();
                if !children.is_empty() {
                    value["children"] = json!(children);
                }
                if node.mesh {
                    value["mesh"] = json!(0);
                }
                value
            })
            .collect();
        let roots: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(i, _)| i)
            .collect();

        let mut doc = json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": roots }],
            "nodes": nodes,
        });
        if let Some(position) = position {
            doc["meshes"] = json!([{ "primitives": [{ "attributes": { "POSITION": position } }] }]);
        }
        if !animations.is_empty() {
            doc["animations"] = json!(animations);
        }
        if !data.bytes.is_empty() {
            doc["buffers"] = json!([{
                "byteLength": data.bytes.len(),
                "uri": format!("data:application/octet-stream;base64,{}", STANDARD.encode(&data.bytes)),
            }]);
            doc["bufferViews"] = json!(data.views);
            doc["accessors"] = json!(data.accessors);
        }
        doc
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(&self.to_json()).unwrap_or_default()
    }
}
