#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel World
//!
//! The world-building core of a voxel engine: a dynamic octree over game
//! objects, deterministic noise terrain split into chunks, and face-culled
//! meshing of voxel arrays into vertex and index buffers.
//!
//! ## Key Modules
//!
//! * `core` - Generational handles and the arena that owns objects behind them
//! * `config` - JSON configuration with defaults for every field
//! * `engine_state` - The world, the octree, voxels, meshing and the frame loop
//! * `error` - The crate error type
//!
//! ## Architecture
//!
//! Nothing here touches a graphics API. Meshes are plain CPU buffers held by a
//! registry, and each frame's draw requests go through the
//! [`Renderer`](engine_state::rendering::Renderer) trait. The bundled binary runs
//! the engine headless against a recording renderer.
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     if let Err(error) = voxel_world::run() {
//!         eprintln!("{}", error);
//!     }
//! }
//! ```

use cgmath::{Point3, Vector3};
use log::info;

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

pub use config::EngineConfig;
pub use engine_state::EngineState;
pub use error::{EngineError, Result};

use engine_state::rendering::{Frustum, RecordingRenderer};

/// Vertical field of view of the headless camera, in degrees.
const CAMERA_FOVY: f32 = 70.0;
/// Aspect ratio of the headless camera.
const CAMERA_ASPECT: f32 = 16.0 / 9.0;

/// Runs the engine headless.
///
/// Loads the configuration named by the first command-line argument (or the
/// defaults), builds the world and steps the configured number of frames with a
/// camera at the player looking towards the world centre.
///
/// # Errors
/// Any configuration or world initialization error.
pub fn run() -> Result<()> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let frames = config.run.frames;

    let mut engine = EngineState::new(config)?;

    let eye = engine
        .player()
        .and_then(|player| engine.world().world_position(player))
        .unwrap_or_else(|| Point3::from(engine.config().world.player_position))
        + Vector3::new(0.0, 1.5, 0.0);
    let target = Point3::from(engine.config().world.center);
    let far = engine.config().world.extent * 2.0;
    let mut renderer =
        RecordingRenderer::with_frustum(Frustum::perspective(eye, target, CAMERA_FOVY, CAMERA_ASPECT, 0.1, far));

    let stats = engine.run_frames(frames, &mut renderer);
    let drawn: usize = stats.iter().map(|frame| frame.objects_drawn).sum();
    let culled: usize = stats.iter().map(|frame| frame.nodes_culled).sum();
    let slowest = stats
        .iter()
        .map(|frame| frame.frame_time)
        .max()
        .unwrap_or_default();
    info!(
        "Ran {} frames: {} draw calls, {} subtrees culled, slowest frame {:?}",
        stats.len(),
        drawn,
        culled,
        slowest
    );
    Ok(())
}
