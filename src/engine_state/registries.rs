use log::debug;

use super::{
    rendering::meshing::{AtlasLayout, MeshManager},
    voxels::voxel_array::VoxelArrayManager,
};

/// The resource registries shared by the world build and the frame loop.
///
/// Constructed once by [`EngineState`](super::EngineState) and passed by
/// reference to whatever needs to author voxel arrays or look up meshes.
pub struct Registries {
    pub voxel_arrays: VoxelArrayManager,
    pub meshes: MeshManager,
}

impl Registries {
    /// Creates empty registries whose meshes sample `atlas`.
    pub fn new(atlas: AtlasLayout) -> Self {
        debug!("Creating resource registries");
        Registries {
            voxel_arrays: VoxelArrayManager::new(),
            meshes: MeshManager::new(atlas),
        }
    }
}

impl Drop for Registries {
    fn drop(&mut self) {
        debug!(
            "Releasing registries ({} voxel arrays, {} meshes)",
            self.voxel_arrays.len(),
            self.meshes.len()
        );
    }
}
