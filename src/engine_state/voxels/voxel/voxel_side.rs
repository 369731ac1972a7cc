//! # Voxel Side Module
//!
//! This module defines the six faces of a voxel and the geometry that goes with
//! each of them: outward normal and the offset to the neighbouring cell.

use cgmath::Vector3;

/// Represents the six possible faces of a voxel.
///
/// Each variant is assigned a fixed integer value, used to index per-side tables
/// such as the atlas tile table and a mesh's per-side face counts.
///
/// The order is: [LEFT, RIGHT, BOTTOM, TOP, BACK, FRONT]
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum VoxelSide {
    /// The left face (facing negative X)
    LEFT = 0,

    /// The right face (facing positive X)
    RIGHT = 1,

    /// The bottom face (facing negative Y)
    BOTTOM = 2,

    /// The top face (facing positive Y)
    TOP = 3,

    /// The back face (facing negative Z)
    BACK = 4,

    /// The front face (facing positive Z)
    FRONT = 5,
}

impl VoxelSide {
    /// Returns an array containing all six voxel faces in a consistent order.
    ///
    /// The order is: [LEFT, RIGHT, BOTTOM, TOP, BACK, FRONT]
    pub fn all() -> [VoxelSide; 6] {
        [
            VoxelSide::LEFT,
            VoxelSide::RIGHT,
            VoxelSide::BOTTOM,
            VoxelSide::TOP,
            VoxelSide::BACK,
            VoxelSide::FRONT,
        ]
    }

    /// Offset from a voxel to the neighbour sharing this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            VoxelSide::LEFT => Vector3::new(-1, 0, 0),
            VoxelSide::RIGHT => Vector3::new(1, 0, 0),
            VoxelSide::BOTTOM => Vector3::new(0, -1, 0),
            VoxelSide::TOP => Vector3::new(0, 1, 0),
            VoxelSide::BACK => Vector3::new(0, 0, -1),
            VoxelSide::FRONT => Vector3::new(0, 0, 1),
        }
    }

    /// Outward unit normal of this face.
    pub fn normal(self) -> Vector3<f32> {
        self.offset().cast::<f32>().unwrap_or(Vector3::new(0.0, 0.0, 0.0))
    }
}
