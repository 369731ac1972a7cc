//! # Engine State Module
//!
//! The core engine module that owns the world, the spatial index and the
//! resource registries, and steps them frame by frame.
//!
//! ## Key Components
//!
//! * `EngineState` - The main state container for the engine
//! * `world` - The game object graph
//! * `spatial` - Bounding boxes and the octree
//! * `voxels` - Voxel arrays, chunks, terrain generation and authored shapes
//! * `rendering` - Meshing, the mesh registry and the renderer boundary
//! * `loader` - Builds the initial world from configuration
//!
//! ## Frame Order
//!
//! Each [`EngineState::step`] runs, in order:
//!
//! 1. `World::update` - objects advance by `dt`
//! 2. `Octree::update_tree` - the index catches up with moved objects
//! 3. `Octree::update` - per-object spatial hooks (contacts)
//! 4. `Octree::draw` - tracked objects, with subtree culling
//! 5. `World::draw` - objects the index does not track
//! 6. `Octree::draw_debug` - node boxes, when enabled
//!
//! There are no separate late update or late draw passes. Contacts from step 3
//! already reflect this frame's movement, so nothing has to run after them.
//!
//! ## Teardown
//!
//! Fields drop in declaration order, so the world and its objects go before the
//! octree that indexes them. The octree only holds handles and never resolves
//! them on the way out.

use std::time::Duration;

use log::{debug, info};
use web_time::Instant;

use crate::{
    config::EngineConfig,
    error::{EngineError, Result},
};
use loader::LoadReport;
use registries::Registries;
use rendering::{
    meshing::{AtlasLayout, MeshHandle, VoxelMesh},
    Renderer, TextureId,
};
use spatial::Octree;
use world::{ObjectHandle, World};

pub mod loader;
pub mod registries;
pub mod rendering;
pub mod spatial;
pub mod voxels;
pub mod world;

/// What happened during one frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number, starting at 1
    pub frame: u64,
    /// Objects that moved during `World::update`
    pub moved: usize,
    /// Objects the octree moved to a different node
    pub reassigned: usize,
    /// Octree nodes whose objects were drawn
    pub nodes_visited: usize,
    /// Octree subtrees skipped as invisible
    pub nodes_culled: usize,
    /// Draw calls submitted, from the octree and the world together
    pub objects_drawn: usize,
    /// Debug boxes submitted
    pub debug_boxes: usize,
    pub frame_time: Duration,
}

/// The main state container for the engine
///
/// # Examples
///
/// ```
/// use voxel_world::{
///     config::EngineConfig,
///     engine_state::{rendering::RecordingRenderer, EngineState},
/// };
///
/// let mut config = EngineConfig::default();
/// config.world.chunk_grid = 2;
/// config.world.chunk_dimension = 8;
///
/// let mut engine = EngineState::new(config).unwrap();
/// let mut renderer = RecordingRenderer::new();
/// let stats = engine.step(1.0 / 60.0, &mut renderer);
/// assert_eq!(stats.frame, 1);
/// assert_eq!(stats.objects_drawn, renderer.draw_calls.len());
/// ```
pub struct EngineState {
    /// The object graph; declared first so it is destroyed first
    world: World,
    /// Spatial index over every object with volume
    octree: Octree<ObjectHandle>,
    /// Voxel array and mesh registries
    registries: Registries,
    config: EngineConfig,
    report: LoadReport,
    frame: u64,
}

impl EngineState {
    /// Creates the engine and loads the world described by `config`.
    ///
    /// Each stage owns what it builds; if a later stage fails, everything built
    /// so far is released in reverse order.
    ///
    /// # Errors
    /// - `Config` if the configuration does not validate
    /// - `InvalidBoundingArea` if the world extent is unusable
    pub fn new(config: EngineConfig) -> Result<Self> {
        let start = Instant::now();
        config.validate()?;

        let atlas = AtlasLayout::new(
            TextureId(config.rendering.atlas_texture),
            config.rendering.texs_per_row,
        );
        let mut registries = Registries::new(atlas);
        let mut octree = Octree::new(config.octree.clone());
        let mut world = World::new(&config.world.name);

        let report = loader::load_world(&config, &mut world, &mut octree, &mut registries)?;

        world.init();
        octree.update_tree(&world);
        octree.update(&mut world);

        info!(
            "Engine initialized in {:?} ({} octree nodes, depth {})",
            start.elapsed(),
            octree.node_count(),
            octree.depth()
        );

        Ok(EngineState {
            world,
            octree,
            registries,
            config,
            report,
            frame: 0,
        })
    }

    /// Runs one frame.
    ///
    /// # Arguments
    /// * `dt` - Seconds since the previous frame
    /// * `renderer` - Receives this frame's draw calls
    pub fn step(&mut self, dt: f32, renderer: &mut dyn Renderer) -> FrameStats {
        let start = Instant::now();
        self.frame += 1;
        renderer.begin_frame();

        let moved = self.world.update(dt);
        let tree = self.octree.update_tree(&self.world);
        self.octree.update(&mut self.world);

        let draw = self.octree.draw(&self.world, renderer);
        let octree = &self.octree;
        let untracked = self.world.draw(renderer, |handle| octree.contains(handle));
        let debug_boxes = self
            .octree
            .draw_debug(renderer, self.config.rendering.debug_draw);

        let stats = FrameStats {
            frame: self.frame,
            moved,
            reassigned: tree.reassigned,
            nodes_visited: draw.nodes_visited,
            nodes_culled: draw.nodes_culled,
            objects_drawn: draw.objects_submitted + untracked,
            debug_boxes,
            frame_time: start.elapsed(),
        };
        debug!("{:?}", stats);
        stats
    }

    /// Runs `frames` frames at the configured frame time.
    ///
    /// # Returns
    /// The stats of every frame, in order
    pub fn run_frames(&mut self, frames: u32, renderer: &mut dyn Renderer) -> Vec<FrameStats> {
        let dt = self.config.run.dt;
        (0..frames).map(|_| self.step(dt, renderer)).collect()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn octree(&self) -> &Octree<ObjectHandle> {
        &self.octree
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Summary of the initial world build.
    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    /// Frames stepped so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// The player object, if it survived loading.
    pub fn player(&self) -> Option<ObjectHandle> {
        self.world.find("Player")
    }

    pub fn set_debug_draw(&mut self, enabled: bool) {
        self.config.rendering.debug_draw = enabled;
    }

    /// Looks up a registered mesh.
    ///
    /// # Errors
    /// `UnknownMesh` if the handle is stale.
    pub fn mesh(&self, handle: MeshHandle) -> Result<&VoxelMesh> {
        self.registries
            .meshes
            .get(handle)
            .ok_or(EngineError::UnknownMesh(handle))
    }
}

impl Drop for EngineState {
    fn drop(&mut self) {
        info!("Shutting down engine after {} frames", self.frame);
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector3;

    use super::*;
    use crate::engine_state::{rendering::RecordingRenderer, world::ObjectKind};

    fn small_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.world.extent = 64.0;
        config.world.chunk_grid = 2;
        config.world.chunk_dimension = 8;
        config.world.player_position = [4.0, 20.0, 4.0];
        config.world.sword_position = [0.0, 24.0, 0.0];
        config
    }

    #[test]
    fn moving_player_is_reindexed() {
        let mut engine = EngineState::new(small_config()).unwrap();
        let player = engine.player().unwrap();
        if let Some(ObjectKind::Player(controller)) =
            engine.world_mut().get_mut(player).map(|object| &mut object.kind)
        {
            controller.velocity = Vector3::new(0.0, -10.0, 0.0);
        }

        let mut renderer = RecordingRenderer::new();
        let stats = engine.run_frames(30, &mut renderer);
        assert_eq!(engine.frame(), 30);
        assert!(stats.iter().all(|frame| frame.moved == 1));

        let bounds = engine.world().bounds(player).unwrap();
        assert_eq!(engine.octree().bounds_of(player), Some(bounds));
        let node = engine.octree().node_of(player).unwrap();
        assert!(engine.octree().node_region(node).unwrap().contains(&bounds));
    }

    #[test]
    fn contacts_reflect_movement_from_the_same_frame() {
        let mut config = small_config();
        config.world.player_position = [0.2, 20.0, 0.2];
        let mut engine = EngineState::new(config).unwrap();
        let player = engine.player().unwrap();
        let cube = engine.world().find("Cube").unwrap();
        assert!(engine.world().get(player).unwrap().contacts().is_empty());

        if let Some(ObjectKind::Player(controller)) =
            engine.world_mut().get_mut(player).map(|object| &mut object.kind)
        {
            controller.velocity = Vector3::new(0.0, 4.0, 0.0);
        }

        // one second lifts the player into the cube hanging under the sword
        let mut renderer = RecordingRenderer::new();
        engine.step(1.0, &mut renderer);
        assert!(engine.world().get(player).unwrap().contacts().contains(&cube));
        assert!(engine.world().get(cube).unwrap().contacts().contains(&player));
    }

    #[test]
    fn every_meshed_object_is_drawn_once() {
        let mut engine = EngineState::new(small_config()).unwrap();
        let mut renderer = RecordingRenderer::new();
        let stats = engine.step(0.0, &mut renderer);

        let meshed = engine
            .world()
            .handles()
            .into_iter()
            .filter(|handle| engine.world().get(*handle).and_then(|o| o.mesh()).is_some())
            .count();
        assert_eq!(stats.objects_drawn, meshed);
        assert_eq!(renderer.draw_calls.len(), meshed);
        for call in &renderer.draw_calls {
            assert!(engine.mesh(call.mesh).is_ok());
        }
    }

    #[test]
    fn debug_draw_submits_node_boxes() {
        let mut engine = EngineState::new(small_config()).unwrap();
        let mut renderer = RecordingRenderer::new();
        assert_eq!(engine.step(0.0, &mut renderer).debug_boxes, 0);

        engine.set_debug_draw(true);
        let stats = engine.step(0.0, &mut renderer);
        assert_eq!(stats.debug_boxes, engine.octree().node_count());
        assert_eq!(renderer.debug_boxes.len(), stats.debug_boxes);
    }

    #[test]
    fn invalid_config_is_refused() {
        let mut config = small_config();
        config.world.voxel_size = 0.0;
        assert!(matches!(EngineState::new(config), Err(EngineError::Config(_))));
    }
}
