//! Animation playback: clips, the director, and crossfade tweening

mod clip;
mod director;
mod easing;
mod tween;

pub use clip::{
    normalize_clip_name, AnimationClip, Channel, ChannelValues, ClipSet, Interpolation, NodePose,
};
pub use director::AnimationDirector;
pub use easing::Easing;
pub use tween::Tween;
