//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a fixed-size block of terrain voxels
//! sampled at a world origin.
//!
//! A chunk owns its [`VoxelArray`] outright. It is filled once by the
//! [`TerrainGenerator`](super::terrain::TerrainGenerator), meshed once, and from
//! then on only its size and mesh handle are of interest to the rest of the
//! engine.
//!
//! Where a chunk sits in the world is decided by the game object that owns it.
//! The origin kept here is the sampling origin; it seeds that object's transform
//! when the chunk is spawned and is not consulted afterwards.

use cgmath::{Point3, Vector3};

use super::voxel_array::VoxelArray;
use crate::{
    engine_state::{
        rendering::meshing::{AtlasLayout, MeshHandle, VoxelMesh},
        spatial::BoundingBox,
    },
    error::Result,
};

/// The default dimension (width, height, depth) of a chunk in voxels.
pub const CHUNK_DIMENSION: i32 = 16;

/// A block of terrain voxels in the world.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// World position the terrain field was sampled from.
    origin: Point3<f32>,

    voxels: VoxelArray,

    /// The registered mesh, once generated.
    mesh: Option<MeshHandle>,
}

impl Chunk {
    /// Creates an empty `CHUNK_DIMENSION`³ chunk with unit voxels.
    ///
    /// # Arguments
    /// * `origin` - World position the voxels will be sampled from
    pub fn new(origin: Point3<f32>) -> Result<Self> {
        Self::with_dimension(origin, CHUNK_DIMENSION, 1.0)
    }

    /// Creates an empty chunk of `dimension`³ voxels of size `voxel_size`.
    ///
    /// # Errors
    /// Any error from [`VoxelArray::set_dimension`] or [`VoxelArray::set_voxel_size`].
    pub fn with_dimension(origin: Point3<f32>, dimension: i32, voxel_size: f32) -> Result<Self> {
        let mut voxels = VoxelArray::new();
        voxels.set_dimension(dimension, dimension, dimension)?;
        voxels.set_voxel_size(voxel_size)?;
        Ok(Chunk {
            origin,
            voxels,
            mesh: None,
        })
    }

    pub fn origin(&self) -> Point3<f32> {
        self.origin
    }

    /// The world region the voxels were sampled over: origin plus dimension × voxel size.
    ///
    /// Once the chunk is placed in the world, its owning object's transform decides
    /// where it is; this box is only used to seed that transform.
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::from_position_dimension(self.origin, self.voxels.world_size())
    }

    /// Extent of the chunk: dimension × voxel size.
    pub fn size(&self) -> Vector3<f32> {
        self.voxels.world_size()
    }

    pub fn voxels(&self) -> &VoxelArray {
        &self.voxels
    }

    /// Mutable access to the voxels, refused once the chunk has been meshed.
    pub fn voxels_mut(&mut self) -> Option<&mut VoxelArray> {
        if self.voxels.is_meshed() {
            None
        } else {
            Some(&mut self.voxels)
        }
    }

    /// The registered mesh, if any.
    pub fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    pub fn set_mesh(&mut self, mesh: MeshHandle) {
        self.mesh = Some(mesh);
    }

    /// Meshes the chunk's voxels.
    ///
    /// The returned mesh still has to be registered with a `MeshManager` and the
    /// handle passed back through [`Chunk::set_mesh`].
    pub fn generate_mesh(&mut self, name: &str, atlas: &AtlasLayout) -> Result<VoxelMesh> {
        let mut mesh = VoxelMesh::new(name);
        self.voxels.generate_mesh(&mut mesh, atlas)?;
        Ok(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::TextureId;

    #[test]
    fn size_follows_dimension_and_voxel_size() {
        let chunk = Chunk::with_dimension(Point3::new(-8.0, 0.0, 16.0), 16, 0.5).unwrap();
        assert_eq!(chunk.size(), Vector3::new(8.0, 8.0, 8.0));
        let bounds = chunk.bounds();
        assert_eq!(bounds.min, Point3::new(-8.0, 0.0, 16.0));
        assert_eq!(bounds.max, Point3::new(0.0, 8.0, 24.0));
    }

    #[test]
    fn voxels_are_frozen_after_meshing() {
        let mut chunk = Chunk::new(Point3::new(0.0, 0.0, 0.0)).unwrap();
        chunk
            .voxels_mut()
            .expect("fresh chunk is editable")
            .set_voxel(0, 0, 0, 1)
            .unwrap();

        let mesh = chunk
            .generate_mesh("chunk", &AtlasLayout::new(TextureId(0), 16))
            .unwrap();
        assert_eq!(mesh.face_count(), 6);
        assert!(chunk.voxels_mut().is_none());
    }
}
