use cgmath::{Point3, Vector3};

use crate::engine_state::{
    rendering::{meshing::AtlasLayout, Vertex},
    voxels::voxel::{voxel_side::VoxelSide, voxel_type::VoxelType},
};

/// Represents a single quad face of a voxel in the mesh.
///
/// A face is defined by four corner points (lower-left, lower-right, upper-left,
/// upper-right) as seen from outside the voxel, so that the triangles
/// `ll, lr, ur` and `ll, ur, ul` wind counter-clockwise towards the viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Lower-left corner in array coordinates
    pub ll: Point3<usize>,
    /// Lower-right corner in array coordinates
    pub lr: Point3<usize>,
    /// Upper-left corner in array coordinates
    pub ul: Point3<usize>,
    /// Upper-right corner in array coordinates
    pub ur: Point3<usize>,
    /// Raw voxel value, used for texture mapping
    pub voxel_type: u8,
    /// Which side of the voxel this face represents
    pub side: VoxelSide,
}

impl Face {
    /// Creates a new face for a voxel at the given coordinates.
    ///
    /// # Arguments
    /// * `i`, `j`, `k` - The coordinates of the voxel in array space
    /// * `voxel_type` - The voxel's raw value, used for texture mapping
    /// * `side` - Which side of the voxel this face represents
    ///
    /// # Returns
    /// A new `Face` with its corners laid out for `side`.
    pub fn new(i: usize, j: usize, k: usize, voxel_type: u8, side: VoxelSide) -> Self {
        let (ll, lr, ul, ur) = match side {
            VoxelSide::LEFT => (
                Point3::new(i, j, k),
                Point3::new(i, j, k + 1),
                Point3::new(i, j + 1, k),
                Point3::new(i, j + 1, k + 1),
            ),
            VoxelSide::RIGHT => (
                Point3::new(i + 1, j, k + 1),
                Point3::new(i + 1, j, k),
                Point3::new(i + 1, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k),
            ),
            VoxelSide::BOTTOM => (
                Point3::new(i, j, k),
                Point3::new(i + 1, j, k),
                Point3::new(i, j, k + 1),
                Point3::new(i + 1, j, k + 1),
            ),
            VoxelSide::TOP => (
                Point3::new(i, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k + 1),
                Point3::new(i, j + 1, k),
                Point3::new(i + 1, j + 1, k),
            ),
            VoxelSide::BACK => (
                Point3::new(i + 1, j, k),
                Point3::new(i, j, k),
                Point3::new(i + 1, j + 1, k),
                Point3::new(i, j + 1, k),
            ),
            VoxelSide::FRONT => (
                Point3::new(i, j, k + 1),
                Point3::new(i + 1, j, k + 1),
                Point3::new(i, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k + 1),
            ),
        };

        Face {
            ll,
            lr,
            ul,
            ur,
            voxel_type,
            side,
        }
    }

    /// Generates the four vertices of this face, in `[ll, lr, ul, ur]` order.
    ///
    /// # Arguments
    /// * `voxel_size` - World size of one voxel; corner positions are scaled by it
    /// * `atlas` - Atlas layout used to turn the voxel's tile into UVs
    pub fn vertices(&self, voxel_size: f32, atlas: &AtlasLayout) -> [Vertex; 4] {
        let tile = VoxelType::atlas_tile(self.voxel_type, self.side);
        let (u0, v0) = atlas.tile_origin(tile);
        let t = atlas.tile_size();
        let normal: Vector3<f32> = self.side.normal();
        let scale = |corner: Point3<usize>| {
            Point3::new(
                corner.x as f32 * voxel_size,
                corner.y as f32 * voxel_size,
                corner.z as f32 * voxel_size,
            )
        };

        [
            Vertex::new(scale(self.ll), normal, u0, v0 + t),
            Vertex::new(scale(self.lr), normal, u0 + t, v0 + t),
            Vertex::new(scale(self.ul), normal, u0, v0),
            Vertex::new(scale(self.ur), normal, u0 + t, v0),
        ]
    }

    /// Generates the indices of a face whose first vertex sits at `base`.
    ///
    /// # Returns
    /// Two triangles (6 indices) over the vertices from [`Face::vertices`].
    pub fn indices(base: u32) -> [u32; 6] {
        [base, base + 1, base + 3, base, base + 3, base + 2]
    }
}
