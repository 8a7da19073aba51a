//! Clip selection and playback for a loaded asset

use super::clip::{normalize_clip_name, ClipSet, NodePose};
use super::{Easing, Tween};
use crate::asset::AssetHandle;
use crate::config::AnimationConfig;
use crate::error::AnimationError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
struct Playhead {
    clip: usize,
    time: f32,
}

/// Outgoing clip while a crossfade is in progress
#[derive(Debug, Clone)]
struct Crossfade {
    from: Playhead,
    /// Weight of the outgoing clip, 1 -> 0
    weight: Tween,
}

/// Owns playback state over an asset's clip set.
///
/// The director never pushes to the renderer; callers pull [`evaluate`](Self::evaluate)
/// after [`advance`](Self::advance) each frame.
#[derive(Debug)]
pub struct AnimationDirector {
    default_clip: Option<String>,
    crossfade: Duration,
    easing: Easing,
    clips: Option<Arc<ClipSet>>,
    current: Option<Playhead>,
    fading: Option<Crossfade>,
}

impl AnimationDirector {
    pub fn new(config: &AnimationConfig) -> Self {
        Self {
            default_clip: config.default_clip.clone(),
            crossfade: Duration::try_from_secs_f32(config.crossfade_secs).unwrap_or_default(),
            easing: config.crossfade_easing,
            clips: None,
            current: None,
            fading: None,
        }
    }

    /// Bind to an asset's clips and start the default clip at time 0.
    ///
    /// The default is the configured name when it matches, otherwise the first
    /// clip in source order. An asset without clips leaves nothing selected.
    pub fn initialize(&mut self, asset: &AssetHandle) {
        let clips = asset.clips();
        self.fading = None;
        self.current = None;

        let preferred = self
            .default_clip
            .as_deref()
            .and_then(|name| clips.position(name));
        if preferred.is_none() {
            if let Some(name) = &self.default_clip {
                debug!("Default clip '{}' not in asset, using first clip", name);
            }
        }
        match preferred.or(if clips.is_empty() { None } else { Some(0) }) {
            Some(clip) => {
                self.current = Some(Playhead { clip, time: 0.0 });
                info!(
                    "Animation director playing '{}' ({} clips)",
                    clips.get(clip).map(|c| c.name.as_str()).unwrap_or_default(),
                    clips.len()
                );
            }
            None => warn!("No animations found in asset '{}'", asset.name()),
        }
        self.clips = Some(clips);
    }

    pub fn is_initialized(&self) -> bool {
        self.clips.is_some()
    }

    /// Switch playback to `name`, restarting at time 0.
    ///
    /// Unknown names fail with [`AnimationError::UnknownClip`] and leave the
    /// current clip and time untouched.
    pub fn select_clip(&mut self, name: &str) -> Result<(), AnimationError> {
        let clip = self
            .clips
            .as_ref()
            .and_then(|clips| clips.position(name))
            .ok_or_else(|| AnimationError::UnknownClip(normalize_clip_name(name)))?;

        let previous = self.current.replace(Playhead { clip, time: 0.0 });
        self.fading = match previous {
            Some(from) if !self.crossfade.is_zero() => Some(Crossfade {
                from,
                weight: Tween::new(1.0, 0.0, self.crossfade).with_easing(self.easing),
            }),
            _ => None,
        };
        debug!("Selected clip '{}'", normalize_clip_name(name));
        Ok(())
    }

    /// Advance playback by `delta_seconds`, looping at the clip's duration.
    ///
    /// A no-op before [`initialize`](Self::initialize). Negative or non-finite
    /// deltas fail with [`AnimationError::InvalidArgument`].
    pub fn advance(&mut self, delta_seconds: f32) -> Result<(), AnimationError> {
        if !delta_seconds.is_finite() || delta_seconds < 0.0 {
            return Err(AnimationError::InvalidArgument(format!(
                "delta must be a finite number >= 0, got {}",
                delta_seconds
            )));
        }
        // Finite deltas too large for a Duration saturate
        let step = Duration::try_from_secs_f32(delta_seconds).unwrap_or(Duration::MAX);
        let Some(clips) = self.clips.as_deref() else {
            return Ok(());
        };

        if let Some(playhead) = self.current.as_mut() {
            playhead.time = wrap_time(playhead.time + delta_seconds, clip_duration(clips, playhead.clip));
        }
        if let Some(fade) = self.fading.as_mut() {
            fade.from.time = wrap_time(fade.from.time + delta_seconds, clip_duration(clips, fade.from.clip));
            fade.weight.update(step);
            if fade.weight.complete {
                self.fading = None;
            }
        }
        Ok(())
    }

    /// Name of the clip currently playing
    pub fn current_clip(&self) -> Option<&str> {
        let playhead = self.current?;
        self.clips
            .as_deref()
            .and_then(|clips| clips.get(playhead.clip))
            .map(|clip| clip.name.as_str())
    }

    /// Playback time of the current clip, in `[0, duration)`
    pub fn current_time(&self) -> f32 {
        self.current.map(|p| p.time).unwrap_or(0.0)
    }

    /// Whether a crossfade is still blending out the previous clip
    pub fn is_blending(&self) -> bool {
        self.fading.is_some()
    }

    /// Normalized clip names in source order, empty before initialization
    pub fn clip_names(&self) -> Vec<String> {
        self.clips
            .as_deref()
            .map(|clips| clips.names().into_iter().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Evaluated local transform for every animated node
    pub fn evaluate(&self) -> Vec<NodePose> {
        let (Some(clips), Some(current)) = (self.clips.as_deref(), self.current) else {
            return Vec::new();
        };
        let target = clips.sample(current.clip, current.time);
        let Some(fade) = &self.fading else {
            return target;
        };

        let outgoing = clips.sample(fade.from.clip, fade.from.time);
        let weight = fade.weight.value();
        let mut nodes: Vec<usize> = target.iter().chain(&outgoing).map(|p| p.node).collect();
        nodes.sort_unstable();
        nodes.dedup();

        let find = |poses: &[NodePose], node: usize| {
            poses
                .iter()
                .find(|p| p.node == node)
                .map(|p| p.transform)
                .unwrap_or_else(|| clips.bind_pose(node))
        };
        nodes
            .into_iter()
            .map(|node| NodePose {
                node,
                transform: find(&target, node).lerp(&find(&outgoing, node), weight),
            })
            .collect()
    }
}

fn clip_duration(clips: &ClipSet, clip: usize) -> f32 {
    clips.get(clip).map(|c| c.duration).unwrap_or(0.0)
}

fn wrap_time(time: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }
    let wrapped = time.rem_euclid(duration);
    // rem_euclid can round up to exactly `duration`
    if wrapped >= duration {
        0.0
    } else {
        wrapped
    }
}
