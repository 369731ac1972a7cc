//! Mesh data structures for voxel rendering.
//!
//! A [`VoxelMesh`] holds one indexed triangle list for a whole voxel array. Faces
//! are appended one quad at a time by the meshing pass in
//! [`VoxelArray::generate_mesh`](crate::engine_state::voxels::voxel_array::VoxelArray::generate_mesh).

use crate::{
    engine_state::{
        rendering::{meshing::AtlasLayout, TextureId, Vertex},
        voxels::voxel::voxel_side::VoxelSide,
    },
    error::{EngineError, Result},
};

use super::face::Face;

/// The geometry generated from one voxel array.
#[derive(Debug, Clone, Default)]
pub struct VoxelMesh {
    /// Name of the voxel array this mesh was built from
    pub name: String,
    /// Vertex data, four vertices per face
    pub vertices: Vec<Vertex>,
    /// Index data, six indices per face
    pub indices: Vec<u32>,
    /// Atlas texture the UVs refer to, stamped when registered with a `MeshManager`
    pub atlas: Option<TextureId>,
    /// Face count per `VoxelSide`
    side_counts: [u32; 6],
}

impl VoxelMesh {
    /// Creates a new, empty mesh.
    pub fn new(name: impl Into<String>) -> Self {
        VoxelMesh {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Number of quads in the mesh.
    pub fn face_count(&self) -> usize {
        self.indices.len() / 6
    }

    /// Number of quads facing `side`.
    pub fn faces_on(&self, side: VoxelSide) -> u32 {
        self.side_counts[side as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Drops all geometry, keeping the name and atlas.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.side_counts = [0; 6];
    }

    /// Reserves room for `faces` more quads.
    ///
    /// # Errors
    /// `AllocationFailure` if either buffer cannot grow; the mesh is unchanged.
    pub fn reserve_faces(&mut self, faces: usize) -> Result<()> {
        let vertex_count = faces.checked_mul(4).ok_or(EngineError::AllocationFailure {
            what: "mesh vertices",
            requested: usize::MAX,
        })?;
        let index_count = faces.checked_mul(6).ok_or(EngineError::AllocationFailure {
            what: "mesh indices",
            requested: usize::MAX,
        })?;

        self.vertices
            .try_reserve_exact(vertex_count)
            .map_err(|_| EngineError::AllocationFailure {
                what: "mesh vertices",
                requested: vertex_count,
            })?;
        self.indices
            .try_reserve_exact(index_count)
            .map_err(|_| EngineError::AllocationFailure {
                what: "mesh indices",
                requested: index_count,
            })?;
        Ok(())
    }

    /// Appends one face as a quad.
    ///
    /// # Arguments
    /// * `face` - The face to append
    /// * `voxel_size` - World size of one voxel
    /// * `atlas` - Atlas layout for UV generation
    pub fn push_face(&mut self, face: &Face, voxel_size: f32, atlas: &AtlasLayout) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(face.vertices(voxel_size, atlas));
        self.indices.extend(Face::indices(base));
        self.side_counts[face.side as usize] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_face_offsets_indices() {
        let atlas = AtlasLayout::new(TextureId(3), 16);
        let mut mesh = VoxelMesh::new("quad");
        mesh.reserve_faces(2).unwrap();
        mesh.push_face(&Face::new(0, 0, 0, 1, VoxelSide::TOP), 1.0, &atlas);
        mesh.push_face(&Face::new(0, 0, 0, 1, VoxelSide::LEFT), 1.0, &atlas);

        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(&mesh.indices[6..], &[4, 5, 7, 4, 7, 6]);
        assert_eq!(mesh.faces_on(VoxelSide::TOP), 1);
        assert_eq!(mesh.faces_on(VoxelSide::BOTTOM), 0);
    }

    #[test]
    fn absurd_reservation_fails_cleanly() {
        let mut mesh = VoxelMesh::new("huge");
        assert!(matches!(
            mesh.reserve_faces(usize::MAX / 2),
            Err(EngineError::AllocationFailure { .. })
        ));
        assert!(mesh.is_empty());
    }
}
