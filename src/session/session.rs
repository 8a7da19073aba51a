//! The orchestrating session state machine

use super::events::{SessionEvent, TriggerOutcome};
use super::scene_graph::{AssetDraw, DrawItem, DrawList, NodeId, RenderNode, SceneGraph};
use super::state::SessionState;
use crate::animation::AnimationDirector;
use crate::asset::{AssetHandle, AssetLoadJob, BundleSource, JobEvent, LoadState};
use crate::config::{DuringLoadTriggerPolicy, FirstTriggerBehavior, ViewerConfig};
use crate::error::{AnimationError, JobError, PlacementGuardError};
use crate::placement::{PlacedInstance, PlacementController};
use crate::spatial::Point3D;
use crate::stats::FrameStats;
use crate::tracking::TrackingPose;
use rand::RngCore;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Owns the load job, the loaded asset, the animation director and the
/// placement controller, and is the only thing that changes [`SessionState`].
///
/// Driven by an external frame pump: [`trigger`](Self::trigger) on user
/// input and [`on_frame`](Self::on_frame) once per rendered frame. Load
/// events are delivered at the start of the next frame.
pub struct SceneSession<G: SceneGraph> {
    config: ViewerConfig,
    state: SessionState,
    graph: G,
    source: Arc<dyn BundleSource>,
    job: Option<AssetLoadJob>,
    asset: Option<AssetHandle>,
    director: AnimationDirector,
    placement: PlacementController,
    pose: Option<TrackingPose>,
    events: VecDeque<SessionEvent>,
    stats: FrameStats,
    inserted: Vec<NodeId>,
}

impl<G: SceneGraph> SceneSession<G> {
    pub fn new(config: ViewerConfig, source: Arc<dyn BundleSource>, graph: G) -> Self {
        let placement = PlacementController::new(&config.placement);
        Self::with_placement(config, source, graph, placement)
    }

    /// Session whose placement randomness comes from `rng`
    pub fn with_rng(
        config: ViewerConfig,
        source: Arc<dyn BundleSource>,
        graph: G,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        let placement = PlacementController::with_rng(&config.placement, rng);
        Self::with_placement(config, source, graph, placement)
    }

    fn with_placement(
        config: ViewerConfig,
        source: Arc<dyn BundleSource>,
        graph: G,
        placement: PlacementController,
    ) -> Self {
        let mut session = Self {
            director: AnimationDirector::new(&config.animation),
            config,
            state: SessionState::Bootstrapping,
            graph,
            source,
            job: None,
            asset: None,
            placement,
            pose: None,
            events: VecDeque::new(),
            stats: FrameStats::default(),
            inserted: Vec::new(),
        };
        // The host has the scene and lighting ready before it builds a session.
        session.transition(SessionState::AwaitingFirstPlacement);
        session
    }

    /// Handle one placement trigger using the current frame's pose
    pub fn trigger(&mut self) -> Result<TriggerOutcome, JobError> {
        match self.state {
            SessionState::Bootstrapping => Ok(TriggerOutcome::Ignored),
            SessionState::AwaitingFirstPlacement => {
                self.start_load()?;
                match self.config.session.first_trigger_behavior {
                    FirstTriggerBehavior::StartAssetLoad => Ok(TriggerOutcome::LoadStarted),
                    FirstTriggerBehavior::SpawnPrimitive => Ok(self.spawn()),
                }
            }
            SessionState::Loading { .. } => match self.config.session.during_load_trigger_policy {
                DuringLoadTriggerPolicy::Ignore => {
                    debug!("Trigger ignored while loading");
                    Ok(TriggerOutcome::Ignored)
                }
                DuringLoadTriggerPolicy::SpawnPrimitiveAnyway => Ok(self.spawn()),
            },
            SessionState::Interactive => Ok(self.spawn()),
            SessionState::LoadFailed(ref reason) => {
                warn!("Trigger ignored, load failed: {}", reason);
                Ok(TriggerOutcome::Ignored)
            }
        }
    }

    /// Advance one frame.
    ///
    /// Delivers pending load events, advances animation, then hands the draw
    /// list to the scene graph. A missing pose means tracking is lost for
    /// this frame.
    pub fn on_frame(&mut self, delta_seconds: f32, pose: Option<TrackingPose>) {
        self.pose = pose;
        let elapsed = Duration::try_from_secs_f32(delta_seconds).unwrap_or_default();

        let mut job_events = self.job.as_mut().map(AssetLoadJob::poll).unwrap_or_default();
        if let Some(timed_out) = self.job.as_mut().and_then(|job| job.tick(elapsed)) {
            job_events.push(timed_out);
        }
        for event in job_events {
            self.handle_job_event(event);
        }

        if self.director.is_initialized() {
            if let Err(e) = self.director.advance(delta_seconds) {
                self.reject_animation(e);
            }
        }
        self.placement.tick();
        self.stats.record(elapsed);

        let frame = self.draw_list();
        self.graph.draw(&frame);
    }

    /// Switch the playing clip by name
    pub fn select_clip(&mut self, name: &str) -> Result<(), AnimationError> {
        match self.director.select_clip(name) {
            Ok(()) => {
                info!("Playing clip '{}'", name);
                Ok(())
            }
            Err(e) => {
                self.reject_animation(e.clone());
                Err(e)
            }
        }
    }

    /// Cancel any in-flight load and remove everything this session inserted
    pub fn shutdown(&mut self) {
        if let Some(job) = self.job.as_mut() {
            job.cancel();
        }
        for id in self.inserted.drain(..).rev() {
            self.graph.remove(id);
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Load progress in `[0, 1]` for a loading indicator
    pub fn progress(&self) -> f32 {
        match &self.state {
            SessionState::Loading { progress } => *progress,
            SessionState::Interactive => 1.0,
            _ => self.job.as_ref().map(AssetLoadJob::progress).unwrap_or(0.0),
        }
    }

    pub fn load_state(&self) -> LoadState {
        self.job
            .as_ref()
            .map(|job| job.state().clone())
            .unwrap_or(LoadState::Idle)
    }

    /// Clip names for the picker, empty until the asset is ready
    pub fn clip_names(&self) -> Vec<String> {
        self.director.clip_names()
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.director.current_clip()
    }

    pub fn director(&self) -> &AnimationDirector {
        &self.director
    }

    pub fn instances(&self) -> &[PlacedInstance] {
        self.placement.all()
    }

    pub fn asset(&self) -> Option<&AssetHandle> {
        self.asset.as_ref()
    }

    pub fn frame_stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    /// Take every event queued since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain(..).collect()
    }

    fn start_load(&mut self) -> Result<(), JobError> {
        let timeout = self.config.asset.load_timeout();
        let mut job = AssetLoadJob::new(Arc::clone(&self.source)).with_stall_timeout(timeout);
        job.start(&self.config.session.bundle)?;
        self.job = Some(job);
        self.transition(SessionState::Loading { progress: 0.0 });
        Ok(())
    }

    fn spawn(&mut self) -> TriggerOutcome {
        let Some(pose) = self.pose else {
            let guard = PlacementGuardError::TrackingUnavailable;
            warn!("Placement suppressed: {}", guard);
            self.events.push_back(SessionEvent::PlacementSuppressed(guard));
            return TriggerOutcome::Suppressed(guard);
        };
        let seed = self.placement.roll_variant();
        let instance = self.placement.place(seed, &pose);
        self.graph.insert(&RenderNode::from(&instance));
        self.inserted.push(NodeId::Instance(instance.id));
        self.events.push_back(SessionEvent::InstancePlaced(instance));
        TriggerOutcome::Spawned(instance)
    }

    fn handle_job_event(&mut self, event: JobEvent) {
        match event {
            JobEvent::Progress(progress) => {
                if self.state.is_loading() {
                    self.state = SessionState::Loading { progress };
                    self.events.push_back(SessionEvent::LoadProgress(progress));
                }
            }
            JobEvent::Completed(asset) => self.enter_interactive(asset),
            JobEvent::Failed(reason) => {
                error!("Asset load failed: {}", reason);
                self.events.push_back(SessionEvent::LoadFailed(reason.clone()));
                self.transition(SessionState::LoadFailed(reason));
            }
        }
    }

    fn enter_interactive(&mut self, mut asset: AssetHandle) {
        let settings = &self.config.asset;
        asset.place_root(Point3D::from(settings.position), settings.scale);
        let hidden = asset.hide_nodes(&settings.hidden_nodes);
        if hidden > 0 {
            debug!("Hid {} helper node(s)", hidden);
        }

        self.director.initialize(&asset);
        self.graph.insert(&RenderNode::Asset {
            name: asset.name().to_string(),
            root: asset.root_transform(),
            nodes: asset.nodes().to_vec(),
        });
        self.inserted.push(NodeId::Asset);

        let clips = asset.clip_names();
        info!("Asset '{}' ready with clips {:?}", asset.name(), clips);
        self.asset = Some(asset);
        self.events.push_back(SessionEvent::LoadProgress(1.0));
        self.events.push_back(SessionEvent::AssetReady { clips });
        self.transition(SessionState::Interactive);
    }

    fn reject_animation(&mut self, error: AnimationError) {
        warn!("Animation request rejected: {}", error);
        self.events.push_back(SessionEvent::AnimationRejected(error));
    }

    fn draw_list(&self) -> DrawList {
        let instances = self
            .placement
            .draw_transforms()
            .map(|(instance, transform)| DrawItem {
                id: NodeId::Instance(instance.id),
                transform,
            })
            .collect();
        let asset = match (&self.state, &self.asset) {
            (SessionState::Interactive, Some(asset)) => Some(AssetDraw {
                root: asset.root_transform(),
                nodes: self.director.evaluate(),
            }),
            _ => None,
        };
        DrawList {
            frame: self.placement.frame(),
            instances,
            asset,
        }
    }

    fn transition(&mut self, next: SessionState) {
        let from = std::mem::replace(&mut self.state, next.clone());
        info!("Session {} -> {}", from.name(), next.name());
        self.events.push_back(SessionEvent::StateChanged { from, to: next });
    }
}

impl<G: SceneGraph> Drop for SceneSession<G> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
