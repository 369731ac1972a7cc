//! # Voxel Module
//!
//! Voxel data, terrain chunks and the procedural generator that fills them.
//!
//! ## Architecture
//!
//! * **Voxel**: materials (`VoxelType`) and faces (`VoxelSide`)
//! * **VoxelArray**: a dense grid of voxel values that meshes itself on request
//! * **Chunk**: a fixed-size voxel array anchored at a world position
//! * **Terrain**: the deterministic noise generator that fills chunks
//! * **Shapes**: hand-authored voxel models
//!
//! ## Data Flow
//!
//! 1. The world loader creates a chunk for every cell of the chunk grid
//! 2. `TerrainGenerator::get_chunk` fills it; empty chunks are discarded
//! 3. The chunk is meshed once and the mesh registered with the `MeshManager`
//! 4. The chunk joins the world graph and the octree

pub mod chunk;
pub mod shapes;
pub mod terrain;
pub mod voxel;
pub mod voxel_array;
