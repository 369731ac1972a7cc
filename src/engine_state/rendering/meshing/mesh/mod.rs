//! Mesh generation for voxel rendering.
//!
//! Every exposed voxel face becomes one quad: four vertices and two triangles.
//! Faces between two solid voxels are culled; nothing is merged across voxels.
//!
//! # Architecture
//! - [`VoxelMesh`]: indexed triangle list for one voxel array
//! - [`Face`]: a single voxel face with its corners, type and side

mod face;
#[allow(clippy::module_inception)]
mod mesh;

pub use face::Face;
pub use mesh::VoxelMesh;
