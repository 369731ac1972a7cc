//! # World Loader
//!
//! Builds the initial world from an [`EngineConfig`].
//!
//! ## Stages
//!
//! 1. Fix the octree bounding area. An invalid area aborts the load before any
//!    other work is done.
//! 2. Author, mesh and register the hand-made shapes, then spawn the sword, its
//!    child cube and the player.
//! 3. Scatter seeded copies of the sword.
//! 4. Generate, mesh and spawn every non-empty terrain chunk of the grid.
//!
//! Failures local to one shape or chunk are logged and that piece is skipped;
//! the rest of the world still loads.

use std::time::Duration;

use cgmath::{Deg, EuclideanSpace, Point3, Quaternion, Rotation3, Vector3};
use log::{debug, info, warn};
use web_time::Instant;

use super::{
    registries::Registries,
    rendering::meshing::{MeshHandle, VoxelMesh},
    spatial::{BoundingBox, Insertion, Octree},
    voxels::{
        chunk::Chunk,
        shapes::{cube_voxels, sword_voxels, SWORD_DIMENSION},
        terrain::TerrainGenerator,
    },
    world::{Collider, ObjectHandle, ObjectKind, PhysicalObject, PlayerController, Transform, World},
};
use crate::{
    config::EngineConfig,
    error::{EngineError, Result},
};

/// Summary of one world build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Objects in the world after loading, root excluded
    pub objects: usize,
    /// Objects tracked by the octree
    pub tracked: usize,
    /// Chunks generated, meshed and spawned
    pub chunks_spawned: usize,
    /// Chunks that came out entirely empty and were dropped
    pub chunks_empty: usize,
    /// Chunks skipped because generation or meshing failed
    pub chunks_failed: usize,
    /// Objects kept in the octree root because they lie outside its area
    pub clamped: usize,
    /// Objects destroyed because the octree refused them
    pub rejected: usize,
    /// Meshes registered
    pub meshes: usize,
    pub elapsed: Duration,
}

/// Builds the demo world into empty engine state.
///
/// # Arguments
/// * `config` - A validated configuration
/// * `world` - The object graph to populate
/// * `octree` - The spatial index; its bounding area is (re)set here
/// * `registries` - Where voxel arrays and meshes are registered
///
/// # Errors
/// `InvalidBoundingArea` if the configured world extent is unusable. Nothing
/// else aborts the load.
pub fn load_world(
    config: &EngineConfig,
    world: &mut World,
    octree: &mut Octree<ObjectHandle>,
    registries: &mut Registries,
) -> Result<LoadReport> {
    let start = Instant::now();
    let world_config = &config.world;
    let center = Point3::from(world_config.center);

    octree.set_bounding_area(BoundingBox::cube(center, world_config.extent))?;
    world.rename(&world_config.name);

    let mut report = LoadReport::default();

    let sword = spawn_sword(config, world, octree, registries, &mut report);
    spawn_cube(config, world, octree, registries, sword, &mut report);
    spawn_player(config, world, octree, &mut report);
    if let Some(sword) = sword {
        scatter(config, world, octree, sword, &mut report);
    }
    load_terrain(config, world, octree, registries, &mut report);

    report.objects = world.len();
    report.tracked = octree.len();
    report.meshes = registries.meshes.len();
    report.elapsed = start.elapsed();
    info!(
        "Loaded world '{}': {} objects, {} chunks ({} empty, {} failed), {} meshes in {:?}",
        world.name(),
        report.objects,
        report.chunks_spawned,
        report.chunks_empty,
        report.chunks_failed,
        report.meshes,
        report.elapsed
    );
    Ok(report)
}

/// Fills a named voxel array, meshes it and registers the mesh.
///
/// # Returns
/// The mesh handle and the world size of the array
fn author_shape(
    registries: &mut Registries,
    name: &str,
    dimension: Vector3<i32>,
    voxels: &[u8],
    voxel_size: f32,
) -> Result<(MeshHandle, Vector3<f32>)> {
    let arrays = &mut registries.voxel_arrays;
    let array = arrays.get_voxel_array(name);
    arrays.set_dimension(array, dimension.x, dimension.y, dimension.z)?;
    arrays.set_voxels(array, voxels)?;
    arrays.set_voxel_size(array, voxel_size)?;

    let mut mesh = VoxelMesh::new(name);
    let atlas = *registries.meshes.atlas();
    arrays.generate_mesh(array, &mut mesh, &atlas)?;
    let size = arrays
        .get(array)
        .map(|array| array.world_size())
        .ok_or(EngineError::UnknownVoxelArray(array))?;

    Ok((registries.meshes.add_mesh(mesh), size))
}

/// Starts tracking `handle`, destroying the object if the octree refuses it.
///
/// Returns `false` if the object was destroyed or has no volume.
fn track(
    world: &mut World,
    octree: &mut Octree<ObjectHandle>,
    handle: ObjectHandle,
    report: &mut LoadReport,
) -> bool {
    let Some(bounds) = world.bounds(handle) else {
        return false;
    };
    match octree.add(handle, bounds) {
        Ok(Insertion::Placed { .. }) => true,
        Ok(Insertion::Clamped) => {
            report.clamped += 1;
            true
        }
        Err(error) => {
            let name = world
                .get(handle)
                .map(|object| object.name.clone())
                .unwrap_or_default();
            warn!("Dropping '{}': {}", name, error);
            if let Err(error) = world.destroy(handle) {
                warn!("Failed to destroy '{}': {}", name, error);
            }
            report.rejected += 1;
            false
        }
    }
}

fn spawn_sword(
    config: &EngineConfig,
    world: &mut World,
    octree: &mut Octree<ObjectHandle>,
    registries: &mut Registries,
    report: &mut LoadReport,
) -> Option<ObjectHandle> {
    let (mesh, size) = match author_shape(
        registries,
        "Sword",
        SWORD_DIMENSION,
        &sword_voxels(),
        config.world.sword_voxel_size,
    ) {
        Ok(shape) => shape,
        Err(error) => {
            warn!("Skipping sword: {}", error);
            return None;
        }
    };

    let sword = world.spawn(
        "Sword",
        ObjectKind::Physical(PhysicalObject::new(Some(mesh), Collider::new(size))),
        Transform::from_position(Vector3::from(config.world.sword_position)),
    );
    track(world, octree, sword, report).then_some(sword)
}

/// Spawns the stone cube, as a scaled and rotated child of the sword when there is one.
fn spawn_cube(
    config: &EngineConfig,
    world: &mut World,
    octree: &mut Octree<ObjectHandle>,
    registries: &mut Registries,
    sword: Option<ObjectHandle>,
    report: &mut LoadReport,
) {
    let side = config.world.cube_side;
    let Ok(dimension) = i32::try_from(side) else {
        warn!("Skipping cube: side {} does not fit a voxel array", side);
        return;
    };
    let shape = cube_voxels(side).and_then(|voxels| {
        author_shape(
            registries,
            "Cube",
            Vector3::new(dimension, dimension, dimension),
            &voxels,
            1.0,
        )
    });
    let (mesh, size) = match shape {
        Ok(shape) => shape,
        Err(error) => {
            warn!("Skipping cube: {}", error);
            return;
        }
    };

    let transform = Transform::new(
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.5, 0.5, 0.5),
        Quaternion::from_angle_x(Deg(90.0)),
    );
    let cube = world.spawn(
        "Cube",
        ObjectKind::Physical(PhysicalObject::new(Some(mesh), Collider::new(size))),
        transform,
    );
    if let Some(sword) = sword {
        if let Err(error) = world.attach_to(cube, sword) {
            warn!("Leaving cube at the root: {}", error);
        }
    }
    track(world, octree, cube, report);
}

fn spawn_player(
    config: &EngineConfig,
    world: &mut World,
    octree: &mut Octree<ObjectHandle>,
    report: &mut LoadReport,
) {
    let collider = Collider::new(Vector3::from(config.world.player_collider));
    let player = world.spawn(
        "Player",
        ObjectKind::Player(PlayerController::new(collider)),
        Transform::from_position(Vector3::from(config.world.player_position)),
    );
    track(world, octree, player, report);
}

/// Places seeded copies of the sword around the origin.
fn scatter(
    config: &EngineConfig,
    world: &mut World,
    octree: &mut Octree<ObjectHandle>,
    sword: ObjectHandle,
    report: &mut LoadReport,
) {
    let count = config.scatter.count;
    if count == 0 {
        return;
    }

    let mut rng = fastrand::Rng::with_seed(config.scatter.seed);
    let mut placed = 0;
    for _ in 0..count {
        let position = Vector3::new(
            (rng.u32(0..1000) as f32 - 50.0) * 0.1,
            (rng.u32(0..100) as f32 + 150.0) * 0.1,
            (rng.u32(0..1000) as f32 - 50.0) * 0.1,
        );
        let copy = match world.instantiate(sword) {
            Ok(copy) => copy,
            Err(error) => {
                warn!("Stopping scatter: {}", error);
                break;
            }
        };
        if let Some(object) = world.get_mut(copy) {
            object.transform.position = position;
        }
        if track(world, octree, copy, report) {
            placed += 1;
        }
    }
    debug!("Scattered {} of {} sword copies", placed, count);
}

/// Generates the chunk grid centred on the world centre.
///
/// Each chunk object is placed by its transform, seeded from the chunk's sampled
/// bounds.
fn load_terrain(
    config: &EngineConfig,
    world: &mut World,
    octree: &mut Octree<ObjectHandle>,
    registries: &mut Registries,
    report: &mut LoadReport,
) {
    let start = Instant::now();
    let generator = match TerrainGenerator::from_config(&config.terrain) {
        Ok(generator) => generator,
        Err(error) => {
            warn!("Skipping terrain: {}", error);
            return;
        }
    };

    let world_config = &config.world;
    let grid = world_config.chunk_grid;
    let chunk_extent = world_config.chunk_dimension as f32 * world_config.voxel_size;
    let offset = |i: u32| grid_offset(i, grid, chunk_extent);

    for z in 0..grid {
        for y in 0..grid {
            for x in 0..grid {
                let position = Point3::new(
                    world_config.center[0] + offset(x),
                    world_config.center[1] + offset(y),
                    world_config.center[2] + offset(z),
                );
                match build_chunk(&generator, config, registries, position) {
                    Ok(Some(chunk)) => {
                        let placement = Transform::from_position(chunk.bounds().min.to_vec());
                        let handle = world.spawn(
                            &format!("Chunk ({}, {}, {})", x, y, z),
                            ObjectKind::Chunk(chunk),
                            placement,
                        );
                        if track(world, octree, handle, report) {
                            report.chunks_spawned += 1;
                        }
                    }
                    Ok(None) => report.chunks_empty += 1,
                    Err(error) => {
                        warn!("Skipping chunk at {:?}: {}", position, error);
                        report.chunks_failed += 1;
                    }
                }
            }
        }
    }

    info!(
        "Generated {} terrain chunks in {:?}",
        report.chunks_spawned,
        start.elapsed()
    );
}

/// Minimum-corner offset of grid cell `index` from the grid centre.
///
/// The grid is centred for odd and even sizes alike: cell `i` starts at
/// `(i - grid / 2) * extent` with a fractional half for odd grids.
fn grid_offset(index: u32, grid: u32, extent: f32) -> f32 {
    (index as f32 - grid as f32 / 2.0) * extent
}

/// Fills and meshes one chunk. `None` if the chunk holds no solid voxels.
fn build_chunk(
    generator: &TerrainGenerator,
    config: &EngineConfig,
    registries: &mut Registries,
    position: Point3<f32>,
) -> Result<Option<Chunk>> {
    let mut chunk = Chunk::with_dimension(
        position,
        config.world.chunk_dimension,
        config.world.voxel_size,
    )?;
    if !generator.get_chunk(&mut chunk)? {
        return Ok(None);
    }

    let mesh = chunk.generate_mesh(
        &format!("Chunk {:?}", position),
        registries.meshes.atlas(),
    )?;
    chunk.set_mesh(registries.meshes.add_mesh(mesh));
    Ok(Some(chunk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::{
        rendering::meshing::AtlasLayout,
        spatial::{OctreeSettings, OutOfBoundsPolicy},
    };

    fn small_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.world.extent = 64.0;
        config.world.chunk_grid = 4;
        config.world.chunk_dimension = 8;
        config.world.player_position = [4.0, 20.0, 4.0];
        config.world.sword_position = [0.0, 24.0, 0.0];
        config.terrain.amplitude = 8.0;
        config
    }

    fn load(config: &EngineConfig) -> (World, Octree<ObjectHandle>, Registries, Result<LoadReport>) {
        let mut world = World::new("World");
        let mut octree = Octree::new(config.octree.clone());
        let mut registries = Registries::new(AtlasLayout::default());
        let report = load_world(config, &mut world, &mut octree, &mut registries);
        (world, octree, registries, report)
    }

    #[test]
    fn builds_shapes_player_and_terrain() {
        let config = small_config();
        let (world, octree, registries, report) = load(&config);
        let report = report.unwrap();

        assert!(world.find("Sword").is_some());
        assert!(world.find("Player").is_some());
        let cube = world.find("Cube").unwrap();
        assert_eq!(world.get(cube).unwrap().parent(), world.find("Sword"));

        assert_eq!(report.chunks_spawned + report.chunks_empty, 64);
        assert!(report.chunks_spawned > 0);
        assert_eq!(report.meshes, 2 + report.chunks_spawned);
        assert_eq!(registries.meshes.len(), report.meshes);
        assert_eq!(report.objects, world.len());
        assert_eq!(octree.len(), world.len());
    }

    #[test]
    fn invalid_area_aborts_before_building() {
        let mut config = small_config();
        config.world.extent = 0.0;
        let (world, _, registries, report) = load(&config);

        assert!(matches!(report, Err(EngineError::InvalidBoundingArea(_))));
        assert!(world.is_empty());
        assert!(registries.meshes.is_empty());
    }

    #[test]
    fn scatter_is_deterministic() {
        let mut config = small_config();
        config.world.chunk_grid = 0;
        config.scatter.count = 5;

        let positions = |world: &World| -> Vec<_> {
            world
                .handles()
                .into_iter()
                .filter(|handle| world.get(*handle).is_some_and(|o| o.name == "Sword"))
                .filter_map(|handle| world.world_position(handle))
                .collect()
        };

        let (first, _, _, _) = load(&config);
        let (second, _, _, _) = load(&config);
        assert_eq!(positions(&first).len(), 6);
        assert_eq!(positions(&first), positions(&second));
    }

    #[test]
    fn rejected_objects_are_destroyed() {
        let mut config = small_config();
        config.world.chunk_grid = 0;
        config.world.player_position = [500.0, 500.0, 500.0];
        config.octree = OctreeSettings {
            out_of_bounds: OutOfBoundsPolicy::Reject,
            ..OctreeSettings::default()
        };

        let (world, octree, _, report) = load(&config);
        let report = report.unwrap();
        assert_eq!(report.rejected, 1);
        assert!(world.find("Player").is_none());
        assert_eq!(octree.len(), world.len());
    }

    #[test]
    fn oversized_cube_is_skipped_and_the_load_goes_on() {
        let mut config = small_config();
        config.world.chunk_grid = 0;
        config.world.cube_side = 100_000;

        let (world, octree, registries, report) = load(&config);
        let report = report.unwrap();
        assert!(world.find("Cube").is_none());
        assert!(world.find("Sword").is_some());
        assert!(world.find("Player").is_some());
        assert_eq!(report.meshes, 1);
        assert_eq!(registries.meshes.len(), 1);
        assert_eq!(octree.len(), world.len());
    }

    #[test]
    fn odd_and_even_grids_are_centred() {
        let offsets = |grid: u32| -> Vec<f32> { (0..grid).map(|i| grid_offset(i, grid, 8.0)).collect() };

        assert_eq!(offsets(3), vec![-12.0, -4.0, 4.0]);
        assert_eq!(offsets(4), vec![-16.0, -8.0, 0.0, 8.0]);
        for grid in [1, 2, 3, 5, 16] {
            let cells = offsets(grid);
            let low = cells[0];
            let high = cells[cells.len() - 1] + 8.0;
            assert_eq!(low, -high, "grid {} is off-centre", grid);
        }
    }

    #[test]
    fn chunk_objects_start_at_their_sampled_origin() {
        let config = small_config();
        let (world, _, _, report) = load(&config);
        report.unwrap();

        for handle in world.handles() {
            let Some(ObjectKind::Chunk(chunk)) = world.get(handle).map(|object| &object.kind) else {
                continue;
            };
            assert_eq!(world.bounds(handle), Some(chunk.bounds()));
        }
    }

    #[test]
    fn out_of_area_objects_are_clamped_by_default() {
        let mut config = small_config();
        config.world.chunk_grid = 0;
        config.world.player_position = [500.0, 500.0, 500.0];

        let (world, octree, _, report) = load(&config);
        assert_eq!(report.unwrap().clamped, 1);
        let player = world.find("Player").unwrap();
        assert!(octree.is_clamped(player));
    }
}
