use anyhow::{Context, Result};
use ar_viewer::asset::{BundleSource, FileBundleSource};
use ar_viewer::session::{DrawList, NodeId, RenderNode, SceneGraph};
use ar_viewer::spatial::{Point3D, Quaternion, Transform, Vector3D};
use ar_viewer::{SceneSession, SessionEvent, SessionState, TrackingPose, ViewerConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ar-viewer")]
#[command(about = "Headless driver for the AR viewer core")]
struct Cli {
    /// Config file (falls back to AR_VIEWER_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate a session: a controller circling the viewer that triggers periodically
    Run {
        /// Bundle to load instead of the configured one
        #[arg(long)]
        bundle: Option<String>,

        /// Frames to simulate
        #[arg(long, default_value_t = 600)]
        frames: u32,

        /// Fire a placement trigger every N frames
        #[arg(long, default_value_t = 60)]
        trigger_every: u32,

        #[arg(long, default_value_t = 60.0)]
        fps: f32,

        /// Clip to switch to once the asset is ready
        #[arg(long)]
        clip: Option<String>,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// Scene graph that only logs what it is asked to do
#[derive(Default)]
struct LoggingSceneGraph {
    live: usize,
}

impl SceneGraph for LoggingSceneGraph {
    fn insert(&mut self, node: &RenderNode) {
        self.live += 1;
        match node {
            RenderNode::Asset { name, nodes, .. } => {
                let visible = nodes.iter().filter(|n| n.visible).count();
                info!("insert asset '{}' ({} nodes, {} visible)", name, nodes.len(), visible);
            }
            RenderNode::Instance {
                id,
                geometry,
                material,
                transform,
            } => info!(
                "insert {} {} #{:06x} at ({:.2}, {:.2}, {:.2})",
                geometry.tag(),
                id,
                material.color,
                transform.position.x,
                transform.position.y,
                transform.position.z
            ),
        }
    }

    fn remove(&mut self, id: NodeId) {
        self.live = self.live.saturating_sub(1);
        debug!("remove {}", id);
    }

    fn draw(&mut self, frame: &DrawList) {
        if frame.frame % 60 == 0 {
            debug!(
                "frame {}: {} drawables, {} live nodes",
                frame.frame,
                frame.len(),
                self.live
            );
        }
    }
}

/// Controller held at arm's length, circling the viewer once every four seconds
fn controller_pose(t: f32) -> TrackingPose {
    let angle = t * std::f32::consts::TAU / 4.0;
    let rotation = Quaternion::from_axis_angle(Vector3D::UP, angle);
    let position = Point3D::new(0.0, 1.2, 0.0) + rotation.rotate_vector(Vector3D::new(0.2, 0.0, -0.4));
    TrackingPose::from_transform(Transform::from_position_rotation(position, rotation))
}

fn bundle_source(config: &ViewerConfig) -> Arc<dyn BundleSource> {
    #[cfg(feature = "http")]
    {
        let base = config.asset.base_path.to_string_lossy();
        if base.starts_with("http://") || base.starts_with("https://") {
            return Arc::new(ar_viewer::asset::HttpBundleSource::new(base.into_owned()));
        }
    }
    Arc::new(FileBundleSource::new(config.asset.base_path.clone()))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (mut config, path) =
        ViewerConfig::resolve(cli.config).context("Failed to load viewer configuration")?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        Command::Run {
            bundle,
            frames,
            trigger_every,
            fps,
            clip,
        } => {
            init_logging(&config.logging.level);
            match &path {
                Some(path) => info!("Using config {}", path.display()),
                None => info!("No config file found, using defaults"),
            }
            if let Some(bundle) = bundle {
                config.session.bundle = bundle;
            }
            anyhow::ensure!(fps > 0.0, "--fps must be positive");
            run(config, frames, trigger_every.max(1), fps, clip).await
        }
    }
}

async fn run(
    config: ViewerConfig,
    frames: u32,
    trigger_every: u32,
    fps: f32,
    clip: Option<String>,
) -> Result<()> {
    let source = bundle_source(&config);
    let mut session = SceneSession::new(config, source, LoggingSceneGraph::default());
    let dt = 1.0 / fps;
    let mut pending_clip = clip;

    for frame in 0..frames {
        let pose = controller_pose(frame as f32 * dt);
        session.on_frame(dt, Some(pose));

        if frame % trigger_every == 0 {
            let outcome = session.trigger().context("Failed to start asset load")?;
            debug!("trigger at frame {}: {:?}", frame, outcome);
        }

        for event in session.drain_events() {
            match event {
                SessionEvent::AssetReady { clips } => {
                    info!("Clips available: {}", clips.join(", "));
                    if let Some(name) = pending_clip.take() {
                        if let Err(e) = session.select_clip(&name) {
                            warn!("{}", e);
                        }
                    }
                }
                SessionEvent::LoadFailed(reason) => warn!("Load failed: {}", reason),
                SessionEvent::LoadProgress(p) => debug!("Loading {:.0}%", p * 100.0),
                _ => {}
            }
        }

        if matches!(session.state(), SessionState::LoadFailed(_)) {
            break;
        }
        tokio::time::sleep(Duration::from_secs_f32(dt)).await;
    }

    info!(
        "Finished in state {} with {} instances, {:.1} fps",
        session.state(),
        session.instances().len(),
        session.frame_stats().fps()
    );
    session.shutdown();
    Ok(())
}
