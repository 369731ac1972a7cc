//! # Voxel Type Module
//!
//! This module defines the known voxel materials and their atlas tiles.

use num_derive::FromPrimitive;

use super::voxel_side::VoxelSide;

/// Enumerates the voxel materials the engine knows how to texture.
///
/// Voxel arrays store raw `u8` values; `FromPrimitive` maps them back to a
/// `VoxelType` where one exists. Values without a variant are still valid solid
/// voxels and are textured with the tile of the same number.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum VoxelType {
    /// Empty space. The only non-solid value.
    AIR = 0,

    /// Bedrock below the dirt layer.
    STONE = 1,

    /// The few cells right under the surface.
    DIRT = 2,

    /// Top solid cell of a column, with grass on top and dirt at the sides.
    GRASS = 3,

    /// Wood, used for the sword's hilt.
    WOOD = 4,

    /// Metal, used for the sword's guard and blade.
    METAL = 5,

    /// Sand.
    SAND = 6,
}

/// Maps each voxel type to its atlas tile for each face.
///
/// The outer array is indexed by `VoxelType` as a `usize`.
/// The inner array is indexed by `VoxelSide` in the order:
/// [Left, Right, Bottom, Top, Back, Front]
pub static VOXEL_TYPE_TO_ATLAS_TILES: [[u32; 6]; 7] = [
    [0, 0, 0, 0, 0, 0],       // AIR (never meshed)
    [1, 1, 1, 1, 1, 1],       // STONE
    [2, 2, 2, 2, 2, 2],       // DIRT
    [3, 3, 2, 16, 3, 3],      // GRASS (top: 16, bottom: dirt, sides: 3)
    [4, 4, 20, 20, 4, 4],     // WOOD (end grain on top and bottom)
    [5, 5, 5, 5, 5, 5],       // METAL
    [6, 6, 6, 6, 6, 6],       // SAND
];

impl VoxelType {
    /// Converts a raw voxel value to a known type.
    ///
    /// # Returns
    /// `None` if the value has no corresponding variant.
    pub fn from_value(value: u8) -> Option<Self> {
        num_traits::FromPrimitive::from_u8(value)
    }

    /// Returns `true` for every value except `AIR`.
    pub fn is_solid_value(value: u8) -> bool {
        value != VoxelType::AIR as u8
    }

    /// Gets the atlas tile for one face of a voxel.
    ///
    /// # Arguments
    /// * `value` - Raw voxel value
    /// * `side` - The face being textured
    ///
    /// # Returns
    /// The tile from `VOXEL_TYPE_TO_ATLAS_TILES` for known types, otherwise the
    /// raw value itself.
    pub fn atlas_tile(value: u8, side: VoxelSide) -> u32 {
        match Self::from_value(value) {
            Some(voxel_type) => VOXEL_TYPE_TO_ATLAS_TILES[voxel_type as usize][side as usize],
            None => value as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grass_top_differs_from_its_sides() {
        let top = VoxelType::atlas_tile(VoxelType::GRASS as u8, VoxelSide::TOP);
        let side = VoxelType::atlas_tile(VoxelType::GRASS as u8, VoxelSide::LEFT);
        let bottom = VoxelType::atlas_tile(VoxelType::GRASS as u8, VoxelSide::BOTTOM);
        assert_ne!(top, side);
        assert_eq!(bottom, VoxelType::atlas_tile(VoxelType::DIRT as u8, VoxelSide::BOTTOM));
    }

    #[test]
    fn unknown_values_use_their_own_tile() {
        assert_eq!(VoxelType::from_value(42), None);
        assert_eq!(VoxelType::atlas_tile(42, VoxelSide::FRONT), 42);
        assert!(VoxelType::is_solid_value(42));
        assert!(!VoxelType::is_solid_value(0));
    }
}
