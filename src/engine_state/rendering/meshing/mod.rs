//! Mesh generation and management for voxel rendering.
//!
//! Voxel arrays are meshed once, when they are authored or generated, and the
//! resulting [`VoxelMesh`] is registered with the [`MeshManager`]. Objects and
//! chunks then refer to their geometry by [`MeshHandle`] only.
//!
//! # Architecture
//! - `MeshManager`: owns every mesh plus the shared texture atlas description
//! - `AtlasLayout`: how voxel tiles are laid out inside the atlas texture
//! - `mesh/`: face generation and the mesh buffers themselves

use log::debug;

use crate::{
    core::{Arena, Handle},
    engine_state::rendering::TextureId,
};

mod mesh;

pub use mesh::{Face, VoxelMesh};

/// Handle to a mesh registered with a [`MeshManager`].
pub type MeshHandle = Handle<VoxelMesh>;

/// Layout of the square texture atlas shared by all voxel meshes.
///
/// The atlas is a grid of `texs_per_row` × `texs_per_row` equally sized tiles.
/// Tile `n` sits at column `n % texs_per_row`, row `n / texs_per_row`, with row 0
/// at the top (`v = 0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasLayout {
    /// Texture holding the atlas
    pub texture: TextureId,
    /// Number of tiles along each side of the atlas
    pub texs_per_row: u32,
}

impl AtlasLayout {
    /// Creates an atlas layout. A tile count of zero is treated as one.
    pub fn new(texture: TextureId, texs_per_row: u32) -> Self {
        AtlasLayout {
            texture,
            texs_per_row: texs_per_row.max(1),
        }
    }

    /// Width and height of one tile in UV units.
    pub fn tile_size(&self) -> f32 {
        1.0 / self.texs_per_row as f32
    }

    /// UV coordinates of the top-left corner of `tile`.
    pub fn tile_origin(&self, tile: u32) -> (f32, f32) {
        let t = self.tile_size();
        let column = tile % self.texs_per_row;
        let row = tile / self.texs_per_row;
        (column as f32 * t, row as f32 * t)
    }
}

impl Default for AtlasLayout {
    fn default() -> Self {
        AtlasLayout::new(TextureId::default(), 16)
    }
}

/// Owner of all voxel meshes.
pub struct MeshManager {
    meshes: Arena<VoxelMesh>,
    atlas: AtlasLayout,
}

impl MeshManager {
    /// Creates an empty manager whose meshes use `atlas`.
    pub fn new(atlas: AtlasLayout) -> Self {
        MeshManager {
            meshes: Arena::new(),
            atlas,
        }
    }

    pub fn atlas(&self) -> &AtlasLayout {
        &self.atlas
    }

    /// Replaces the atlas description used for meshes generated from now on.
    pub fn set_atlas(&mut self, atlas: AtlasLayout) {
        self.atlas = atlas;
    }

    /// Registers a mesh and returns its handle.
    ///
    /// The mesh is stamped with the manager's atlas texture.
    pub fn add_mesh(&mut self, mut mesh: VoxelMesh) -> MeshHandle {
        mesh.atlas = Some(self.atlas.texture);
        debug!(
            "Registered mesh '{}' ({} faces, {} vertices)",
            mesh.name,
            mesh.face_count(),
            mesh.vertices.len()
        );
        self.meshes.insert(mesh)
    }

    pub fn get(&self, handle: MeshHandle) -> Option<&VoxelMesh> {
        self.meshes.get(handle)
    }

    /// Unregisters a mesh, returning it.
    pub fn remove(&mut self, handle: MeshHandle) -> Option<VoxelMesh> {
        self.meshes.remove(handle)
    }

    /// Number of registered meshes.
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Sum of faces across all registered meshes.
    pub fn total_faces(&self) -> usize {
        self.meshes.iter().map(|(_, mesh)| mesh.face_count()).sum()
    }
}

impl Drop for MeshManager {
    fn drop(&mut self) {
        debug!("Releasing {} meshes", self.meshes.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_are_laid_out_row_major() {
        let atlas = AtlasLayout::new(TextureId(1), 4);
        assert_eq!(atlas.tile_size(), 0.25);
        assert_eq!(atlas.tile_origin(0), (0.0, 0.0));
        assert_eq!(atlas.tile_origin(5), (0.25, 0.25));
        assert_eq!(atlas.tile_origin(15), (0.75, 0.75));
    }

    #[test]
    fn removed_meshes_leave_stale_handles() {
        let mut manager = MeshManager::new(AtlasLayout::new(TextureId(9), 16));
        let handle = manager.add_mesh(VoxelMesh::new("cube"));
        assert_eq!(manager.get(handle).and_then(|mesh| mesh.atlas), Some(TextureId(9)));

        assert!(manager.remove(handle).is_some());
        assert!(manager.get(handle).is_none());
        assert!(manager.is_empty());
    }
}
