//! Animation clips, keyframe channels, and the per-asset clip set

use crate::spatial::{Point3D, Quaternion, Transform, Vector3D};
use std::collections::HashMap;
use tracing::warn;

/// Lookup key for a clip name: trimmed and lower-cased
pub fn normalize_clip_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Keyframe interpolation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Step,
}

/// Keyframe values for one animated property
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValues {
    Translation(Vec<Vector3D>),
    Rotation(Vec<Quaternion>),
    Scale(Vec<Vector3D>),
}

/// One node property animated over time
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Index into the asset's node table
    pub node: usize,
    /// Keyframe times in seconds, ascending
    pub times: Vec<f32>,
    pub values: ChannelValues,
    pub interpolation: Interpolation,
}

impl Channel {
    /// Last keyframe time
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Keyframe pair and blend factor at `time`, clamped to the key range
    fn locate(&self, time: f32) -> Option<(usize, usize, f32)> {
        let last = self.times.len().checked_sub(1)?;
        let next = self.times.partition_point(|&t| t <= time);
        if next == 0 {
            return Some((0, 0, 0.0));
        }
        if next > last {
            return Some((last, last, 0.0));
        }
        let prev = next - 1;
        if self.interpolation == Interpolation::Step {
            return Some((prev, prev, 0.0));
        }
        let span = self.times[next] - self.times[prev];
        let factor = if span > 0.0 {
            (time - self.times[prev]) / span
        } else {
            0.0
        };
        Some((prev, next, factor))
    }

    /// Write this channel's value at `time` into `target`
    pub fn apply(&self, time: f32, target: &mut Transform) {
        let Some((a, b, t)) = self.locate(time) else {
            return;
        };
        match &self.values {
            ChannelValues::Translation(values) => {
                if let (Some(va), Some(vb)) = (values.get(a), values.get(b)) {
                    let v = va.lerp(vb, t);
                    target.position = Point3D::new(v.x, v.y, v.z);
                }
            }
            ChannelValues::Rotation(values) => {
                if let (Some(qa), Some(qb)) = (values.get(a), values.get(b)) {
                    target.rotation = qa.slerp(qb, t).normalize();
                }
            }
            ChannelValues::Scale(values) => {
                if let (Some(va), Some(vb)) = (values.get(a), values.get(b)) {
                    target.scale = va.lerp(vb, t);
                }
            }
        }
    }
}

/// A named, time-bounded animation sequence
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    /// Normalized name
    pub name: String,
    /// Seconds; the largest keyframe time across channels
    pub duration: f32,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    /// Build a clip, normalizing the name and deriving the duration
    pub fn new(name: &str, channels: Vec<Channel>) -> Self {
        let duration = channels
            .iter()
            .map(Channel::end_time)
            .fold(0.0_f32, f32::max);
        Self {
            name: normalize_clip_name(name),
            duration,
            channels,
        }
    }

    /// Clip with an explicit duration and no channels
    pub fn empty(name: &str, duration: f32) -> Self {
        Self {
            name: normalize_clip_name(name),
            duration: duration.max(0.0),
            channels: Vec::new(),
        }
    }
}

/// Local transform of one node after evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePose {
    pub node: usize,
    pub transform: Transform,
}

/// The clips of one loaded asset plus the bind pose they animate over.
///
/// Names are unique after normalization. When the source repeats a name the
/// later clip replaces the earlier one, keeping the earlier source position.
#[derive(Debug, Clone, Default)]
pub struct ClipSet {
    clips: Vec<AnimationClip>,
    index: HashMap<String, usize>,
    bind_pose: Vec<Transform>,
}

impl ClipSet {
    pub fn new(clips: Vec<AnimationClip>, bind_pose: Vec<Transform>) -> Self {
        let mut set = ClipSet {
            clips: Vec::with_capacity(clips.len()),
            index: HashMap::new(),
            bind_pose,
        };
        for mut clip in clips {
            clip.name = normalize_clip_name(&clip.name);
            match set.index.get(&clip.name) {
                Some(&slot) => {
                    warn!("Duplicate animation clip '{}', later definition wins", clip.name);
                    set.clips[slot] = clip;
                }
                None => {
                    set.index.insert(clip.name.clone(), set.clips.len());
                    set.clips.push(clip);
                }
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AnimationClip> {
        self.clips.get(index)
    }

    /// Position of a clip by (un-normalized) name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&normalize_clip_name(name)).copied()
    }

    /// Normalized names in source order
    pub fn names(&self) -> Vec<&str> {
        self.clips.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn bind_pose(&self, node: usize) -> Transform {
        self.bind_pose.get(node).copied().unwrap_or_default()
    }

    /// Sample a clip at `time`, one pose per animated node, ordered by node index
    pub fn sample(&self, clip: usize, time: f32) -> Vec<NodePose> {
        let Some(clip) = self.clips.get(clip) else {
            return Vec::new();
        };
        let mut poses: Vec<NodePose> = Vec::new();
        for channel in &clip.channels {
            let slot = match poses.iter().position(|p| p.node == channel.node) {
                Some(slot) => slot,
                None => {
                    poses.push(NodePose {
                        node: channel.node,
                        transform: self.bind_pose(channel.node),
                    });
                    poses.len() - 1
                }
            };
            channel.apply(time, &mut poses[slot].transform);
        }
        poses.sort_by_key(|p| p.node);
        poses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translation_channel(node: usize, times: Vec<f32>, xs: Vec<f32>) -> Channel {
        Channel {
            node,
            times,
            values: ChannelValues::Translation(
                xs.into_iter().map(|x| Vector3D::new(x, 0.0, 0.0)).collect(),
            ),
            interpolation: Interpolation::Linear,
        }
    }

    #[test]
    fn test_duration_is_last_key_across_channels() {
        let clip = AnimationClip::new(
            "Walk",
            vec![
                translation_channel(0, vec![0.0, 1.0], vec![0.0, 1.0]),
                translation_channel(1, vec![0.0, 2.5], vec![0.0, 1.0]),
            ],
        );
        assert_eq!(clip.name, "walk");
        assert_eq!(clip.duration, 2.5);
    }

    #[test]
    fn test_duplicate_names_later_wins_in_place() {
        let set = ClipSet::new(
            vec![
                AnimationClip::empty("Idle", 1.0),
                AnimationClip::empty("Run", 2.0),
                AnimationClip::empty("IDLE", 3.0),
            ],
            Vec::new(),
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.names(), vec!["idle", "run"]);
        let idle = set.position("idle").and_then(|i| set.get(i)).unwrap();
        assert_eq!(idle.duration, 3.0);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let set = ClipSet::new(vec![AnimationClip::empty("Look Around", 1.0)], Vec::new());
        assert_eq!(set.position("LOOK AROUND"), Some(0));
        assert_eq!(set.position(" look around "), Some(0));
        assert_eq!(set.position("look"), None);
    }

    #[test]
    fn test_linear_sampling_and_clamping() {
        let channel = translation_channel(0, vec![0.0, 2.0], vec![0.0, 4.0]);
        let set = ClipSet::new(vec![AnimationClip::new("move", vec![channel])], Vec::new());

        let mid = set.sample(0, 1.0);
        assert_eq!(mid.len(), 1);
        assert!((mid[0].transform.position.x - 2.0).abs() < 0.0001);

        let after = set.sample(0, 5.0);
        assert!((after[0].transform.position.x - 4.0).abs() < 0.0001);
    }

    #[test]
    fn test_rotation_channel_quarter_way() {
        let channel = Channel {
            node: 0,
            times: vec![0.0, 1.0],
            values: ChannelValues::Rotation(vec![
                Quaternion::IDENTITY,
                Quaternion::from_axis_angle(Vector3D::UP, std::f32::consts::FRAC_PI_2),
            ]),
            interpolation: Interpolation::Linear,
        };
        let set = ClipSet::new(vec![AnimationClip::new("wave", vec![channel])], Vec::new());
        let rotation = set.sample(0, 0.25)[0].transform.rotation;

        // a quarter of a 90 degree yaw is 22.5 degrees
        assert!((rotation.y - 0.19509).abs() < 0.0001);
        assert!((rotation.w - 0.98079).abs() < 0.0001);
        assert!((rotation.magnitude() - 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_step_sampling_holds_previous_key() {
        let mut channel = translation_channel(0, vec![0.0, 1.0], vec![0.0, 4.0]);
        channel.interpolation = Interpolation::Step;
        let set = ClipSet::new(vec![AnimationClip::new("blink", vec![channel])], Vec::new());
        let pose = set.sample(0, 0.9);
        assert_eq!(pose[0].transform.position.x, 0.0);
    }

    #[test]
    fn test_sampling_layers_on_bind_pose() {
        let bind = Transform::identity().with_uniform_scale(2.0);
        let channel = translation_channel(0, vec![0.0], vec![1.0]);
        let set = ClipSet::new(vec![AnimationClip::new("pose", vec![channel])], vec![bind]);
        let pose = set.sample(0, 0.0);
        assert_eq!(pose[0].transform.scale, Vector3D::splat(2.0));
        assert_eq!(pose[0].transform.position.x, 1.0);
    }
}
