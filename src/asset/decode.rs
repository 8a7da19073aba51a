//! glTF / GLB bundle decoding

use super::handle::{AssetHandle, SceneNode};
use crate::animation::{AnimationClip, Channel, ChannelValues, Interpolation};
use crate::error::LoadError;
use crate::spatial::{Point3D, Quaternion, Transform, Vector3D};
use gltf::animation::util::ReadOutputs;
use gltf::animation::Property;
use tracing::{debug, warn};

/// Decode a bundle's bytes into an [`AssetHandle`].
///
/// Accepts binary GLB and JSON glTF with embedded (data URI) buffers. Morph
/// target weights are skipped; cubic spline channels keep their key values
/// and play back linearly.
pub fn decode_bundle(name: &str, bytes: &[u8]) -> Result<AssetHandle, LoadError> {
    let (doc, buffers, _images) =
        gltf::import_slice(bytes).map_err(|e| LoadError::decode(format!("{}: {}", name, e)))?;

    let mut nodes: Vec<SceneNode> = doc
        .nodes()
        .map(|n| {
            let (t, r, s) = n.transform().decomposed();
            let mut node = SceneNode::named(n.name().unwrap_or("")).with_local(Transform {
                position: Point3D::from(t),
                rotation: Quaternion::from(r).normalize(),
                scale: Vector3D::from(s),
            });
            node.has_mesh = n.mesh().is_some();
            node
        })
        .collect();
    for n in doc.nodes() {
        for child in n.children() {
            if let Some(node) = nodes.get_mut(child.index()) {
                node.parent = Some(n.index());
            }
        }
    }

    let mut clips = Vec::new();
    for (index, anim) in doc.animations().enumerate() {
        let clip_name = anim
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("animation_{}", index));
        let mut channels = Vec::new();
        for ch in anim.channels() {
            let target = ch.target();
            let reader = ch.reader(|b| buffers.get(b.index()).map(|bb| bb.0.as_slice()));
            let Some(inputs) = reader.read_inputs() else {
                continue;
            };
            let times: Vec<f32> = inputs.collect();
            let Some(outputs) = reader.read_outputs() else {
                continue;
            };
            let (interpolation, cubic) = match ch.sampler().interpolation() {
                gltf::animation::Interpolation::Linear => (Interpolation::Linear, false),
                gltf::animation::Interpolation::Step => (Interpolation::Step, false),
                gltf::animation::Interpolation::CubicSpline => (Interpolation::Linear, true),
            };
            let values = match (target.property(), outputs) {
                (Property::Translation, ReadOutputs::Translations(it)) => {
                    ChannelValues::Translation(key_values(it.map(Vector3D::from), cubic))
                }
                (Property::Rotation, ReadOutputs::Rotations(it)) => ChannelValues::Rotation(
                    key_values(it.into_f32().map(|q| Quaternion::from(q).normalize()), cubic),
                ),
                (Property::Scale, ReadOutputs::Scales(it)) => {
                    ChannelValues::Scale(key_values(it.map(Vector3D::from), cubic))
                }
                (Property::MorphTargetWeights, _) => {
                    debug!("Skipping morph target channel in clip '{}'", clip_name);
                    continue;
                }
                (property, _) => {
                    return Err(LoadError::decode(format!(
                        "{}: clip '{}' has mismatched output for {:?}",
                        name, clip_name, property
                    )));
                }
            };
            if value_count(&values) != times.len() {
                return Err(LoadError::decode(format!(
                    "{}: clip '{}' has {} keyframe times but {} values",
                    name,
                    clip_name,
                    times.len(),
                    value_count(&values)
                )));
            }
            channels.push(Channel {
                node: target.node().index(),
                times,
                values,
                interpolation,
            });
        }
        if channels.is_empty() {
            warn!("Clip '{}' in {} has no usable channels", clip_name, name);
        }
        clips.push(AnimationClip::new(&clip_name, channels));
    }

    debug!(
        "Decoded {}: {} nodes, {} clips",
        name,
        nodes.len(),
        clips.len()
    );
    Ok(AssetHandle::new(name, nodes, clips))
}

/// Cubic spline outputs store (in-tangent, value, out-tangent) per key
fn key_values<T>(values: impl Iterator<Item = T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.skip(1).step_by(3).collect()
    } else {
        values.collect()
    }
}

fn value_count(values: &ChannelValues) -> usize {
    match values {
        ChannelValues::Translation(v) | ChannelValues::Scale(v) => v.len(),
        ChannelValues::Rotation(v) => v.len(),
    }
}
