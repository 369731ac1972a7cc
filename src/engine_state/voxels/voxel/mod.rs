//! # Voxel Module
//!
//! Voxel materials and faces. A voxel is stored as a raw `u8` inside a
//! [`VoxelArray`](super::voxel_array::VoxelArray); `0` is air and every other
//! value is solid.

pub mod voxel_side;
pub mod voxel_type;

pub use voxel_side::VoxelSide;
pub use voxel_type::VoxelType;
