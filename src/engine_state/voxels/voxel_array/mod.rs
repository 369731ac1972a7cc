//! # Voxel Array Module
//!
//! Dense 3D grids of voxel values and their conversion to meshes.
//!
//! ## Memory Layout
//!
//! Voxel values live in a flat `Vec<u8>` in x-fastest order:
//! `index = x + dim.x * (y + dim.y * z)`.
//!
//! Alongside the values, a padded bit mask records which cells are solid. The
//! mask is one cell larger than the array on every side, and the padding is
//! always empty, so the face-culling pass can look at all six neighbours of any
//! voxel without bounds checks: a face on the array boundary sees empty padding
//! and is emitted.
//!
//! ## Locking
//!
//! Once meshed, an array backs live geometry and refuses edits with
//! `VoxelArrayLocked` until [`VoxelArray::invalidate_mesh`] is called.

use bitvec::prelude::BitVec;
use cgmath::Vector3;
use log::debug;
use web_time::Instant;

use crate::{
    core::Handle,
    engine_state::{
        rendering::meshing::{AtlasLayout, Face, VoxelMesh},
        voxels::voxel::{VoxelSide, VoxelType},
    },
    error::{EngineError, Result},
};

mod manager;

pub use manager::VoxelArrayManager;

/// Handle to a voxel array owned by a [`VoxelArrayManager`].
pub type VoxelArrayHandle = Handle<VoxelArray>;

/// A dense 3D grid of voxel values with a world voxel size.
#[derive(Debug, Clone)]
pub struct VoxelArray {
    /// Cells per axis; `None` until `set_dimension` succeeds
    dimension: Option<Vector3<usize>>,
    /// Voxel values in x-fastest order
    data: Vec<u8>,
    /// Solidity of every cell plus one cell of empty padding on each side
    solid_mask: BitVec,
    /// World size of one voxel
    voxel_size: f32,
    /// Set by `generate_mesh`, cleared by `invalidate_mesh`
    meshed: bool,
}

impl Default for VoxelArray {
    fn default() -> Self {
        VoxelArray {
            dimension: None,
            data: Vec::new(),
            solid_mask: BitVec::new(),
            voxel_size: 1.0,
            meshed: false,
        }
    }
}

impl VoxelArray {
    /// Creates an empty array with no dimension and a voxel size of 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the dimension, clearing all voxels to air.
    ///
    /// # Errors
    /// - `InvalidDimension` if any axis is zero or negative
    /// - `AllocationFailure` if the grid cannot be allocated
    /// - `VoxelArrayLocked` if the array has a live mesh
    ///
    /// On error the array is unchanged.
    pub fn set_dimension(&mut self, x: i32, y: i32, z: i32) -> Result<()> {
        self.ensure_unlocked()?;
        if x <= 0 || y <= 0 || z <= 0 {
            return Err(EngineError::InvalidDimension { x, y, z });
        }

        let dimension = Vector3::new(x as usize, y as usize, z as usize);
        let volume = dimension
            .x
            .checked_mul(dimension.y)
            .and_then(|plane| plane.checked_mul(dimension.z))
            .ok_or(EngineError::AllocationFailure {
                what: "voxel grid",
                requested: usize::MAX,
            })?;

        let mut data = Vec::new();
        data.try_reserve_exact(volume)
            .map_err(|_| EngineError::AllocationFailure {
                what: "voxel grid",
                requested: volume,
            })?;
        data.resize(volume, VoxelType::AIR as u8);
        let solid_mask = Self::empty_mask(dimension)?;

        self.dimension = Some(dimension);
        self.data = data;
        self.solid_mask = solid_mask;
        Ok(())
    }

    /// Bulk-loads voxel values in x-fastest order.
    ///
    /// # Errors
    /// - `EmptyVoxelArray` if no dimension was set
    /// - `SizeMismatch` if `values` does not hold exactly one value per cell
    /// - `VoxelArrayLocked` if the array has a live mesh
    pub fn set_voxels(&mut self, values: &[u8]) -> Result<()> {
        self.ensure_unlocked()?;
        let dimension = self.dimension.ok_or(EngineError::EmptyVoxelArray)?;
        if values.len() != self.data.len() {
            return Err(EngineError::SizeMismatch {
                expected: self.data.len(),
                actual: values.len(),
            });
        }

        self.data.copy_from_slice(values);
        for z in 0..dimension.z {
            for y in 0..dimension.y {
                for x in 0..dimension.x {
                    let solid = VoxelType::is_solid_value(self.data[self.index(x, y, z)]);
                    let padded = self.padded_index(x + 1, y + 1, z + 1);
                    self.solid_mask.set(padded, solid);
                }
            }
        }
        Ok(())
    }

    /// Sets a single voxel.
    ///
    /// # Errors
    /// - `EmptyVoxelArray` if no dimension was set
    /// - `VoxelOutOfRange` if the cell lies outside the array
    /// - `VoxelArrayLocked` if the array has a live mesh
    pub fn set_voxel(&mut self, x: usize, y: usize, z: usize, value: u8) -> Result<()> {
        self.ensure_unlocked()?;
        self.check_range(x, y, z)?;
        let index = self.index(x, y, z);
        self.data[index] = value;
        let padded = self.padded_index(x + 1, y + 1, z + 1);
        self.solid_mask.set(padded, VoxelType::is_solid_value(value));
        Ok(())
    }

    /// Reads a single voxel.
    ///
    /// # Errors
    /// `EmptyVoxelArray` or `VoxelOutOfRange` as for [`VoxelArray::set_voxel`].
    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Result<u8> {
        self.check_range(x, y, z)?;
        Ok(self.data[self.index(x, y, z)])
    }

    /// Sets the world size of one voxel.
    ///
    /// # Errors
    /// - `InvalidVoxelSize` unless `size` is finite and positive
    /// - `VoxelArrayLocked` if the array has a live mesh
    pub fn set_voxel_size(&mut self, size: f32) -> Result<()> {
        self.ensure_unlocked()?;
        if !size.is_finite() || size <= 0.0 {
            return Err(EngineError::InvalidVoxelSize(size));
        }
        self.voxel_size = size;
        Ok(())
    }

    /// Cells per axis, or `None` before a dimension was set.
    pub fn dimension(&self) -> Option<Vector3<usize>> {
        self.dimension
    }

    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// World-space extent of the whole array.
    pub fn world_size(&self) -> Vector3<f32> {
        let dimension = self.dimension.unwrap_or(Vector3::new(0, 0, 0));
        Vector3::new(
            dimension.x as f32,
            dimension.y as f32,
            dimension.z as f32,
        ) * self.voxel_size
    }

    /// Raw voxel values in x-fastest order.
    pub fn voxels(&self) -> &[u8] {
        &self.data
    }

    /// Returns `true` if the cell exists and is not air.
    pub fn is_solid(&self, x: usize, y: usize, z: usize) -> bool {
        self.check_range(x, y, z).is_ok() && self.solid_mask[self.padded_index(x + 1, y + 1, z + 1)]
    }

    /// Number of non-air cells.
    pub fn solid_count(&self) -> usize {
        self.solid_mask.count_ones()
    }

    /// Returns `true` while a mesh generated from this array is live.
    pub fn is_meshed(&self) -> bool {
        self.meshed
    }

    /// Releases the lock taken by `generate_mesh`, allowing edits again.
    pub fn invalidate_mesh(&mut self) {
        self.meshed = false;
    }

    /// Builds the face-culled mesh of this array into `mesh`.
    ///
    /// Every solid voxel contributes one quad per side whose neighbour is air or
    /// lies outside the array. Vertex positions are array-local and scaled by the
    /// voxel size. Any previous contents of `mesh` are replaced.
    ///
    /// # Arguments
    /// * `mesh` - The mesh to fill
    /// * `atlas` - Atlas layout for UV generation
    ///
    /// # Returns
    /// The number of faces emitted
    ///
    /// # Errors
    /// - `EmptyVoxelArray` if no dimension was set
    /// - `AllocationFailure` if the mesh buffers cannot be reserved
    pub fn generate_mesh(&mut self, mesh: &mut VoxelMesh, atlas: &AtlasLayout) -> Result<usize> {
        let dimension = self.dimension.ok_or(EngineError::EmptyVoxelArray)?;
        let start = Instant::now();

        let face_count: usize = self
            .solid_cells(dimension)
            .map(|(x, y, z)| self.exposed_sides(x, y, z).count())
            .sum();

        mesh.clear();
        mesh.reserve_faces(face_count)?;

        for (x, y, z) in self.solid_cells(dimension) {
            let value = self.data[self.index(x, y, z)];
            for side in self.exposed_sides(x, y, z) {
                mesh.push_face(&Face::new(x, y, z, value, side), self.voxel_size, atlas);
            }
        }

        self.meshed = true;
        debug!(
            "Meshed {}x{}x{} voxel array into {} faces in {:?}",
            dimension.x,
            dimension.y,
            dimension.z,
            face_count,
            start.elapsed()
        );
        Ok(face_count)
    }

    fn solid_cells(&self, dimension: Vector3<usize>) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (0..dimension.z)
            .flat_map(move |z| (0..dimension.y).flat_map(move |y| (0..dimension.x).map(move |x| (x, y, z))))
            .filter(move |&(x, y, z)| self.solid_mask[self.padded_index(x + 1, y + 1, z + 1)])
    }

    /// Sides of the voxel at `(x, y, z)` whose neighbour is empty.
    fn exposed_sides(&self, x: usize, y: usize, z: usize) -> impl Iterator<Item = VoxelSide> + '_ {
        // shift into padded space
        let (i, j, k) = (x + 1, y + 1, z + 1);
        VoxelSide::all().into_iter().filter(move |side| {
            let offset = side.offset();
            let neighbour = self.padded_index(
                (i as i32 + offset.x) as usize,
                (j as i32 + offset.y) as usize,
                (k as i32 + offset.z) as usize,
            );
            !self.solid_mask[neighbour]
        })
    }

    fn ensure_unlocked(&self) -> Result<()> {
        if self.meshed {
            Err(EngineError::VoxelArrayLocked)
        } else {
            Ok(())
        }
    }

    fn check_range(&self, x: usize, y: usize, z: usize) -> Result<()> {
        let dimension = self.dimension.ok_or(EngineError::EmptyVoxelArray)?;
        if x < dimension.x && y < dimension.y && z < dimension.z {
            Ok(())
        } else {
            Err(EngineError::VoxelOutOfRange { x, y, z })
        }
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        let dimension = self.dimension.unwrap_or(Vector3::new(0, 0, 0));
        x + dimension.x * (y + dimension.y * z)
    }

    fn padded_index(&self, i: usize, j: usize, k: usize) -> usize {
        let dimension = self.dimension.unwrap_or(Vector3::new(0, 0, 0));
        let width = dimension.x + 2;
        let height = dimension.y + 2;
        i + width * (j + height * k)
    }

    /// An all-empty padded mask for `dimension`, reserved fallibly.
    fn empty_mask(dimension: Vector3<usize>) -> Result<BitVec> {
        let overflow = EngineError::AllocationFailure {
            what: "solid mask",
            requested: usize::MAX,
        };
        let padded = dimension
            .x
            .checked_add(2)
            .zip(dimension.y.checked_add(2))
            .zip(dimension.z.checked_add(2))
            .and_then(|((x, y), z)| x.checked_mul(y)?.checked_mul(z))
            .ok_or(overflow)?;

        let words = padded.div_ceil(usize::BITS as usize);
        let mut storage: Vec<usize> = Vec::new();
        storage
            .try_reserve_exact(words)
            .map_err(|_| EngineError::AllocationFailure {
                what: "solid mask",
                requested: padded,
            })?;
        storage.resize(words, 0);

        let mut mask = BitVec::from_vec(storage);
        mask.truncate(padded);
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::TextureId;

    fn solid_cube(n: i32) -> VoxelArray {
        let mut array = VoxelArray::new();
        array.set_dimension(n, n, n).unwrap();
        array
            .set_voxels(&vec![VoxelType::STONE as u8; (n * n * n) as usize])
            .unwrap();
        array
    }

    fn atlas() -> AtlasLayout {
        AtlasLayout::new(TextureId(0), 16)
    }

    #[test]
    fn solid_cube_emits_only_its_hull() {
        for n in [1, 2, 5] {
            let mut array = solid_cube(n);
            let mut mesh = VoxelMesh::new("cube");
            let faces = array.generate_mesh(&mut mesh, &atlas()).unwrap();
            assert_eq!(faces, (6 * n * n) as usize);
            assert_eq!(mesh.vertices.len(), faces * 4);
            assert_eq!(mesh.indices.len(), faces * 6);
            for side in VoxelSide::all() {
                assert_eq!(mesh.faces_on(side), (n * n) as u32);
            }
        }
    }

    #[test]
    fn hollow_centre_adds_inner_faces() {
        let mut array = solid_cube(4);
        array.set_voxel(2, 2, 2, VoxelType::AIR as u8).unwrap();
        let mut mesh = VoxelMesh::new("hollow");
        assert_eq!(array.generate_mesh(&mut mesh, &atlas()).unwrap(), 96 + 6);
    }

    #[test]
    fn invalid_dimension_keeps_previous_state() {
        let mut array = solid_cube(2);
        assert!(matches!(
            array.set_dimension(4, 0, 4),
            Err(EngineError::InvalidDimension { x: 4, y: 0, z: 4 })
        ));
        assert_eq!(array.dimension(), Some(Vector3::new(2, 2, 2)));
        assert_eq!(array.solid_count(), 8);
    }

    #[test]
    fn unallocatable_dimension_keeps_previous_state() {
        let mut array = solid_cube(2);
        for side in [100_000, i32::MAX] {
            assert!(matches!(
                array.set_dimension(side, side, side),
                Err(EngineError::AllocationFailure { .. })
            ));
        }
        assert_eq!(array.dimension(), Some(Vector3::new(2, 2, 2)));
        assert_eq!(array.solid_count(), 8);
    }

    #[test]
    fn mask_is_padded_and_empty() {
        let mask = VoxelArray::empty_mask(Vector3::new(3, 4, 5)).unwrap();
        assert_eq!(mask.len(), 5 * 6 * 7);
        assert!(mask.not_any());
    }

    #[test]
    fn set_voxels_rejects_wrong_length() {
        let mut array = VoxelArray::new();
        array.set_dimension(2, 3, 4).unwrap();
        assert!(matches!(
            array.set_voxels(&[1; 23]),
            Err(EngineError::SizeMismatch { expected: 24, actual: 23 })
        ));
        assert_eq!(array.solid_count(), 0);
    }

    #[test]
    fn layout_is_x_fastest() {
        let mut array = VoxelArray::new();
        array.set_dimension(2, 3, 4).unwrap();
        let mut values = vec![0u8; 24];
        values[1 + 2 * (2 + 3 * 3)] = 7;
        array.set_voxels(&values).unwrap();
        assert_eq!(array.voxel(1, 2, 3).unwrap(), 7);
        assert!(array.is_solid(1, 2, 3));
        assert!(!array.is_solid(0, 2, 3));
        assert!(matches!(array.voxel(2, 0, 0), Err(EngineError::VoxelOutOfRange { .. })));
    }

    #[test]
    fn voxel_size_must_be_positive() {
        let mut array = VoxelArray::new();
        assert!(matches!(array.set_voxel_size(0.0), Err(EngineError::InvalidVoxelSize(_))));
        assert!(array.set_voxel_size(f32::NAN).is_err());
        array.set_voxel_size(0.1).unwrap();
        assert_eq!(array.voxel_size(), 0.1);
    }

    #[test]
    fn meshing_without_dimension_fails() {
        let mut array = VoxelArray::new();
        let mut mesh = VoxelMesh::new("nothing");
        assert!(matches!(
            array.generate_mesh(&mut mesh, &atlas()),
            Err(EngineError::EmptyVoxelArray)
        ));
    }

    #[test]
    fn meshed_arrays_are_locked_until_invalidated() {
        let mut array = solid_cube(2);
        let mut mesh = VoxelMesh::new("cube");
        array.generate_mesh(&mut mesh, &atlas()).unwrap();

        assert!(matches!(array.set_voxel(0, 0, 0, 0), Err(EngineError::VoxelArrayLocked)));
        assert!(matches!(array.set_dimension(3, 3, 3), Err(EngineError::VoxelArrayLocked)));

        array.invalidate_mesh();
        array.set_voxel(0, 0, 0, 0).unwrap();
        assert_eq!(array.solid_count(), 7);
    }

    #[test]
    fn vertices_are_scaled_by_voxel_size() {
        let mut array = VoxelArray::new();
        array.set_dimension(1, 1, 1).unwrap();
        array.set_voxels(&[VoxelType::METAL as u8]).unwrap();
        array.set_voxel_size(0.1).unwrap();

        let mut mesh = VoxelMesh::new("speck");
        array.generate_mesh(&mut mesh, &atlas()).unwrap();
        let max = mesh
            .vertices
            .iter()
            .flat_map(|vertex| vertex.position)
            .fold(f32::MIN, f32::max);
        assert!((max - 0.1).abs() < 1e-6);
    }
}
