//! Vertex data structures for voxel meshes.
//!
//! This module defines the vertex format produced by voxel meshing. The layout is
//! plain old data so a mesh's vertex buffer can be handed to a GPU upload as raw
//! bytes without conversion.

use cgmath::{Point3, Vector3};

/// A vertex of a voxel mesh.
///
/// Positions are local to the voxel array the mesh was built from, already scaled
/// by the array's voxel size. Placement in the world is the job of the owning
/// object's transform.
///
/// # Memory Layout
/// - Position: [f32; 3] (12 bytes)
/// - Normal: [f32; 3] (12 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
///
/// Total size: 32 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Array-local position, scaled by the voxel size
    pub position: [f32; 3],
    /// Unit normal of the face this vertex belongs to
    pub normal: [f32; 3],
    /// Atlas UV coordinates (normalized 0.0-1.0)
    pub tex_coords: [f32; 2],
}

impl Vertex {
    /// Creates a new vertex.
    ///
    /// # Arguments
    /// * `position` - Array-local position, already scaled
    /// * `normal` - Face normal
    /// * `u`, `v` - Atlas texture coordinates
    ///
    /// # Returns
    /// A new `Vertex` instance
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, u: f32, v: f32) -> Self {
        Vertex {
            position: position.into(),
            normal: normal.into(),
            tex_coords: [u, v],
        }
    }

    /// Views a vertex slice as raw bytes, ready for a vertex buffer upload.
    pub fn as_bytes(vertices: &[Vertex]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
        let vertices = [Vertex::new(
            Point3::new(1.0, 2.0, 3.0),
            Vector3::unit_y(),
            0.25,
            0.5,
        ); 2];
        assert_eq!(Vertex::as_bytes(&vertices).len(), 64);
    }
}
