use std::collections::HashMap;

use cgmath::Vector3;
use log::debug;

use super::{VoxelArray, VoxelArrayHandle};
use crate::{
    core::Arena,
    engine_state::rendering::meshing::{AtlasLayout, VoxelMesh},
    error::{EngineError, Result},
};

/// Owner of every named voxel array.
///
/// Arrays are looked up by name once and addressed by handle afterwards. The
/// handle-based methods mirror the ones on [`VoxelArray`] and fail with
/// `UnknownVoxelArray` when the handle is stale.
#[derive(Default)]
pub struct VoxelArrayManager {
    arrays: Arena<VoxelArray>,
    names: HashMap<String, VoxelArrayHandle>,
}

impl VoxelArrayManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the array called `name`, creating an empty one if needed.
    pub fn get_voxel_array(&mut self, name: &str) -> VoxelArrayHandle {
        if let Some(handle) = self.names.get(name) {
            return *handle;
        }
        let handle = self.arrays.insert(VoxelArray::new());
        self.names.insert(name.to_string(), handle);
        debug!("Created voxel array '{}'", name);
        handle
    }

    /// Looks up an existing array by name.
    pub fn find(&self, name: &str) -> Option<VoxelArrayHandle> {
        self.names.get(name).copied()
    }

    pub fn get(&self, handle: VoxelArrayHandle) -> Option<&VoxelArray> {
        self.arrays.get(handle)
    }

    pub fn get_mut(&mut self, handle: VoxelArrayHandle) -> Option<&mut VoxelArray> {
        self.arrays.get_mut(handle)
    }

    /// Removes the array called `name`.
    pub fn remove(&mut self, name: &str) -> Option<VoxelArray> {
        let handle = self.names.remove(name)?;
        self.arrays.remove(handle)
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn set_dimension(&mut self, handle: VoxelArrayHandle, x: i32, y: i32, z: i32) -> Result<()> {
        self.array_mut(handle)?.set_dimension(x, y, z)
    }

    pub fn set_voxels(&mut self, handle: VoxelArrayHandle, values: &[u8]) -> Result<()> {
        self.array_mut(handle)?.set_voxels(values)
    }

    pub fn set_voxel_size(&mut self, handle: VoxelArrayHandle, size: f32) -> Result<()> {
        self.array_mut(handle)?.set_voxel_size(size)
    }

    pub fn generate_mesh(
        &mut self,
        handle: VoxelArrayHandle,
        mesh: &mut VoxelMesh,
        atlas: &AtlasLayout,
    ) -> Result<usize> {
        self.array_mut(handle)?.generate_mesh(mesh, atlas)
    }

    pub fn dimension(&self, handle: VoxelArrayHandle) -> Result<Option<Vector3<usize>>> {
        Ok(self.array(handle)?.dimension())
    }

    pub fn voxel_size(&self, handle: VoxelArrayHandle) -> Result<f32> {
        Ok(self.array(handle)?.voxel_size())
    }

    fn array(&self, handle: VoxelArrayHandle) -> Result<&VoxelArray> {
        self.arrays
            .get(handle)
            .ok_or(EngineError::UnknownVoxelArray(handle))
    }

    fn array_mut(&mut self, handle: VoxelArrayHandle) -> Result<&mut VoxelArray> {
        self.arrays
            .get_mut(handle)
            .ok_or(EngineError::UnknownVoxelArray(handle))
    }
}

impl Drop for VoxelArrayManager {
    fn drop(&mut self) {
        debug!("Releasing {} voxel arrays", self.arrays.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_resolve_to_one_array() {
        let mut manager = VoxelArrayManager::new();
        let sword = manager.get_voxel_array("Sword");
        assert_eq!(manager.get_voxel_array("Sword"), sword);
        assert_eq!(manager.find("Sword"), Some(sword));
        assert_eq!(manager.find("Shield"), None);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn stale_handles_are_reported() {
        let mut manager = VoxelArrayManager::new();
        let cube = manager.get_voxel_array("Cube");
        manager.set_dimension(cube, 2, 2, 2).unwrap();
        assert!(manager.remove("Cube").is_some());

        assert!(matches!(
            manager.set_voxel_size(cube, 1.0),
            Err(EngineError::UnknownVoxelArray(_))
        ));
        assert!(manager.dimension(cube).is_err());
    }
}
