use ar_viewer::config::{DuringLoadTriggerPolicy, FirstTriggerBehavior};
use ar_viewer::session::NodeId;
use ar_viewer::spatial::{Point3D, Quaternion, Transform, Vector3D};
use ar_viewer::test_utils::{GltfFixture, MemoryBundleSource, RecordingSceneGraph};
use ar_viewer::{
    LoadError, SceneSession, SessionEvent, SessionState, TrackingPose, TriggerOutcome,
    ViewerConfig,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;

const DT: f32 = 1.0 / 60.0;

fn config(first: FirstTriggerBehavior, during_load: DuringLoadTriggerPolicy) -> ViewerConfig {
    let mut config = ViewerConfig::default();
    config.session.bundle = "knight.gltf".to_string();
    config.session.first_trigger_behavior = first;
    config.session.during_load_trigger_policy = during_load;
    config
}

fn session(
    config: ViewerConfig,
    source: MemoryBundleSource,
) -> (SceneSession<RecordingSceneGraph>, RecordingSceneGraph) {
    let graph = RecordingSceneGraph::default();
    let session = SceneSession::with_rng(
        config,
        Arc::new(source),
        graph.clone(),
        StdRng::seed_from_u64(42),
    );
    (session, graph)
}

fn knight_source() -> MemoryBundleSource {
    MemoryBundleSource::new()
        .with_bundle("knight.gltf", GltfFixture::knight().to_bytes())
        .with_progress_steps(vec![0.0, 0.3, 0.7, 1.0])
        .with_step_delay(Duration::from_millis(5))
}

/// Pump frames until the session leaves `Loading`
async fn pump_until_loaded(session: &mut SceneSession<RecordingSceneGraph>, pose: TrackingPose) {
    for _ in 0..400 {
        session.on_frame(DT, Some(pose));
        if !session.state().is_loading() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session stuck in {}", session.state());
}

fn pose_at(x: f32, y: f32, z: f32, yaw: f32) -> TrackingPose {
    TrackingPose::from_transform(Transform::from_position_rotation(
        Point3D::new(x, y, z),
        Quaternion::from_axis_angle(Vector3D::UP, yaw),
    ))
}

#[tokio::test]
async fn start_asset_load_then_interactive() {
    let (mut session, graph) = session(
        config(
            FirstTriggerBehavior::StartAssetLoad,
            DuringLoadTriggerPolicy::Ignore,
        ),
        knight_source(),
    );
    assert_eq!(session.state(), &SessionState::AwaitingFirstPlacement);

    let first = session.trigger().unwrap();
    assert_eq!(first, TriggerOutcome::LoadStarted);
    assert!(session.state().is_loading());
    assert!(session.instances().is_empty());

    session.on_frame(DT, Some(TrackingPose::identity()));
    assert_eq!(session.trigger().unwrap(), TriggerOutcome::Ignored);
    assert!(session.instances().is_empty());

    pump_until_loaded(&mut session, TrackingPose::identity()).await;
    assert_eq!(session.state(), &SessionState::Interactive);
    assert_eq!(graph.log().insert_count(NodeId::Asset), 1);
    assert_eq!(session.clip_names(), vec!["look around", "wave"]);
    assert_eq!(session.current_clip(), Some("look around"));

    let pose = pose_at(0.5, 1.0, -0.2, 0.0);
    session.on_frame(DT, Some(pose));
    let outcome = session.trigger().unwrap();
    let TriggerOutcome::Spawned(instance) = outcome else {
        panic!("expected a spawn, got {:?}", outcome);
    };
    assert_eq!(session.instances().len(), 1);
    let p = instance.transform.position;
    assert!((p.x - 0.5).abs() < 1e-6);
    assert!((p.y - 1.0).abs() < 1e-6);
    assert!((p.z - (-0.5)).abs() < 1e-6);

    // More frames never insert the asset again
    for _ in 0..5 {
        session.on_frame(DT, Some(pose));
    }
    assert_eq!(graph.log().insert_count(NodeId::Asset), 1);
}

#[tokio::test]
async fn progress_events_are_monotonic_and_end_at_ready() {
    let (mut session, _graph) = session(
        config(
            FirstTriggerBehavior::StartAssetLoad,
            DuringLoadTriggerPolicy::Ignore,
        ),
        knight_source(),
    );
    session.trigger().unwrap();
    pump_until_loaded(&mut session, TrackingPose::identity()).await;

    let events = session.drain_events();
    let progress: Vec<f32> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::LoadProgress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{:?}", progress);
    assert_eq!(progress.last().copied(), Some(1.0));

    let ready = events
        .iter()
        .position(|e| matches!(e, SessionEvent::AssetReady { .. }))
        .unwrap();
    assert!(events[ready + 1..]
        .iter()
        .all(|e| !matches!(e, SessionEvent::LoadProgress(_))));
    assert_eq!(session.progress(), 1.0);
}

#[tokio::test]
async fn spawn_primitive_mode_spawns_and_loads() {
    let (mut session, graph) = session(
        config(
            FirstTriggerBehavior::SpawnPrimitive,
            DuringLoadTriggerPolicy::Ignore,
        ),
        knight_source(),
    );
    session.on_frame(DT, Some(TrackingPose::identity()));

    let outcome = session.trigger().unwrap();
    assert!(matches!(outcome, TriggerOutcome::Spawned(_)));
    assert!(session.state().is_loading());
    assert_eq!(session.instances().len(), 1);
    assert_eq!(
        session.instances()[0].transform.position,
        Point3D::new(0.0, 0.0, -0.3)
    );
    assert_eq!(graph.log().insert_count(NodeId::Instance(session.instances()[0].id)), 1);

    pump_until_loaded(&mut session, TrackingPose::identity()).await;
    assert_eq!(session.state(), &SessionState::Interactive);
}

#[tokio::test]
async fn spawn_anyway_policy_places_during_load() {
    let (mut session, _graph) = session(
        config(
            FirstTriggerBehavior::StartAssetLoad,
            DuringLoadTriggerPolicy::SpawnPrimitiveAnyway,
        ),
        knight_source().with_step_delay(Duration::from_millis(20)),
    );
    session.trigger().unwrap();
    session.on_frame(DT, Some(TrackingPose::identity()));
    assert!(session.state().is_loading());

    assert!(matches!(session.trigger().unwrap(), TriggerOutcome::Spawned(_)));
    assert!(matches!(session.trigger().unwrap(), TriggerOutcome::Spawned(_)));
    assert_eq!(session.instances().len(), 2);
}

#[tokio::test]
async fn tracking_loss_suppresses_spawn_when_interactive() {
    let (mut session, _graph) = session(
        config(
            FirstTriggerBehavior::StartAssetLoad,
            DuringLoadTriggerPolicy::Ignore,
        ),
        knight_source(),
    );
    session.trigger().unwrap();
    pump_until_loaded(&mut session, TrackingPose::identity()).await;

    session.on_frame(DT, None);
    assert!(matches!(
        session.trigger().unwrap(),
        TriggerOutcome::Suppressed(_)
    ));
    assert!(session.instances().is_empty());

    session.on_frame(DT, Some(TrackingPose::identity()));
    assert!(matches!(session.trigger().unwrap(), TriggerOutcome::Spawned(_)));
}

#[tokio::test]
async fn failed_load_is_terminal() {
    let source = MemoryBundleSource::new().with_bundle("knight.gltf", b"not a model".to_vec());
    let (mut session, graph) = session(
        config(
            FirstTriggerBehavior::StartAssetLoad,
            DuringLoadTriggerPolicy::Ignore,
        ),
        source,
    );
    session.trigger().unwrap();
    pump_until_loaded(&mut session, TrackingPose::identity()).await;

    assert!(matches!(
        session.state(),
        SessionState::LoadFailed(LoadError::Decode(_))
    ));
    assert!(session
        .drain_events()
        .iter()
        .any(|e| matches!(e, SessionEvent::LoadFailed(LoadError::Decode(_)))));
    assert_eq!(session.trigger().unwrap(), TriggerOutcome::Ignored);
    assert_eq!(graph.log().insert_count(NodeId::Asset), 0);
    assert!(session.clip_names().is_empty());
}

#[tokio::test]
async fn stalled_load_times_out() {
    let mut config = config(
        FirstTriggerBehavior::StartAssetLoad,
        DuringLoadTriggerPolicy::Ignore,
    );
    config.asset.load_timeout_secs = 0.5;
    let (mut session, _graph) = session(config, MemoryBundleSource::new().stalled());
    session.trigger().unwrap();

    for _ in 0..40 {
        session.on_frame(DT, Some(TrackingPose::identity()));
    }
    assert!(matches!(
        session.state(),
        SessionState::LoadFailed(LoadError::TimedOut { .. })
    ));
}

#[tokio::test]
async fn zero_timeout_waits_on_a_stalled_load() {
    let mut config = config(
        FirstTriggerBehavior::StartAssetLoad,
        DuringLoadTriggerPolicy::Ignore,
    );
    config.asset.load_timeout_secs = 0.0;
    let (mut session, _graph) = session(config, MemoryBundleSource::new().stalled());
    session.trigger().unwrap();

    for _ in 0..2_000 {
        session.on_frame(DT, Some(TrackingPose::identity()));
    }
    assert!(session.state().is_loading());
}

#[tokio::test]
async fn clip_selection_and_playback() {
    let (mut session, graph) = session(
        config(
            FirstTriggerBehavior::StartAssetLoad,
            DuringLoadTriggerPolicy::Ignore,
        ),
        knight_source(),
    );
    session.trigger().unwrap();
    pump_until_loaded(&mut session, TrackingPose::identity()).await;

    assert!(session.select_clip("Fly").is_err());
    assert_eq!(session.current_clip(), Some("look around"));

    session.select_clip("WAVE").unwrap();
    assert_eq!(session.current_clip(), Some("wave"));
    session.on_frame(0.25, Some(TrackingPose::identity()));
    assert!((session.director().current_time() - 0.25).abs() < 1e-5);

    let log = graph.log();
    let asset = log.last_draw().and_then(|d| d.asset.clone()).unwrap();
    assert_eq!(asset.root.position, Point3D::new(0.0, 0.0, -1.0));
    assert_eq!(asset.nodes.len(), 1);
    assert_eq!(asset.nodes[0].node, 1);
}

#[tokio::test]
async fn helper_node_is_hidden() {
    let (mut session, graph) = session(
        config(
            FirstTriggerBehavior::StartAssetLoad,
            DuringLoadTriggerPolicy::Ignore,
        ),
        knight_source(),
    );
    session.trigger().unwrap();
    pump_until_loaded(&mut session, TrackingPose::identity()).await;

    let asset = session.asset().unwrap();
    let cube = asset.node_index("Cube").unwrap();
    assert!(!asset.nodes()[cube].visible);
    assert!(graph.log().live().contains(&NodeId::Asset));
}

#[tokio::test]
async fn dropping_mid_load_cancels_and_cleans_up() {
    let graph = RecordingSceneGraph::default();
    {
        let mut session = SceneSession::with_rng(
            config(
                FirstTriggerBehavior::SpawnPrimitive,
                DuringLoadTriggerPolicy::Ignore,
            ),
            Arc::new(knight_source().with_step_delay(Duration::from_millis(50))),
            graph.clone(),
            StdRng::seed_from_u64(1),
        );
        session.on_frame(DT, Some(TrackingPose::identity()));
        session.trigger().unwrap();
        assert!(session.state().is_loading());
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    let log = graph.log();
    assert_eq!(log.insert_count(NodeId::Asset), 0);
    assert!(log.live().is_empty());
    assert_eq!(log.removed.len(), 1);
}

#[tokio::test]
async fn spin_is_applied_only_to_drawn_transforms() {
    let (mut session, graph) = session(
        config(
            FirstTriggerBehavior::SpawnPrimitive,
            DuringLoadTriggerPolicy::SpawnPrimitiveAnyway,
        ),
        knight_source(),
    );
    session.on_frame(DT, Some(TrackingPose::identity()));
    session.trigger().unwrap();
    let stored = session.instances()[0].transform;

    for _ in 0..30 {
        session.on_frame(DT, Some(TrackingPose::identity()));
    }
    assert_eq!(session.instances()[0].transform, stored);

    let log = graph.log();
    let drawn = log.last_draw().unwrap().instances[0].transform;
    assert_eq!(drawn.position, stored.position);
    let expected = Quaternion::from_axis_angle(Vector3D::UP, 0.3);
    assert!(drawn.rotation.dot(&expected).abs() > 0.9999);
}
