//! Error types for world building, meshing and the spatial index.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine_state::{
    rendering::meshing::MeshHandle, spatial::BoundingBox, voxels::voxel_array::VoxelArrayHandle,
    world::ObjectHandle,
};

/// Everything that can go wrong in the engine core.
///
/// Generation-time variants (`AllocationFailure`, `InvalidDimension`,
/// `SizeMismatch`, ...) are local to one voxel array or chunk; the world loader
/// logs them and skips that chunk. `InvalidBoundingArea` aborts world
/// initialization.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A voxel grid or mesh buffer could not be reserved.
    #[error("failed to allocate {what} ({requested} elements requested)")]
    AllocationFailure {
        /// What was being allocated
        what: &'static str,
        /// Number of elements requested
        requested: usize,
    },

    /// A voxel array dimension was zero or negative.
    #[error("invalid voxel array dimension ({x}, {y}, {z}): every axis must be positive")]
    InvalidDimension {
        /// Requested X dimension
        x: i32,
        /// Requested Y dimension
        y: i32,
        /// Requested Z dimension
        z: i32,
    },

    /// Bulk voxel data did not match the array volume.
    #[error("voxel data holds {actual} values but the array volume is {expected}")]
    SizeMismatch {
        /// Declared volume
        expected: usize,
        /// Supplied length
        actual: usize,
    },

    /// Voxel size was not a finite positive number.
    #[error("invalid voxel size {0}: must be finite and greater than zero")]
    InvalidVoxelSize(f32),

    /// Meshing or voxel access was attempted before a dimension was set.
    #[error("voxel array has no dimension set")]
    EmptyVoxelArray,

    /// A single-voxel access fell outside the array.
    #[error("voxel ({x}, {y}, {z}) lies outside the array")]
    VoxelOutOfRange {
        /// X index
        x: usize,
        /// Y index
        y: usize,
        /// Z index
        z: usize,
    },

    /// The voxel array backs a live mesh and may not change.
    #[error("voxel array is locked by a generated mesh")]
    VoxelArrayLocked,

    /// An object's bounds do not overlap the octree root region (reject policy).
    #[error("object bounds {bounds:?} do not overlap the octree region {region:?}")]
    OutOfBoundsInsertion {
        /// Bounds of the rejected object
        bounds: BoundingBox,
        /// The octree's bounding area
        region: BoundingBox,
    },

    /// The octree root region is zero-sized or not finite.
    #[error("invalid octree bounding area {0:?}")]
    InvalidBoundingArea(BoundingBox),

    /// The object is already tracked by the octree.
    #[error("object {0} is already tracked by the octree")]
    AlreadyTracked(String),

    /// No voxel array lives behind the handle.
    #[error("unknown voxel array {0:?}")]
    UnknownVoxelArray(VoxelArrayHandle),

    /// No mesh lives behind the handle.
    #[error("unknown mesh {0:?}")]
    UnknownMesh(MeshHandle),

    /// No game object lives behind the handle.
    #[error("unknown game object {0:?}")]
    UnknownObject(ObjectHandle),

    /// Re-parenting would make an object its own ancestor.
    #[error("cannot attach {child:?} under {parent:?}: it would create a cycle")]
    InvalidParent {
        /// Object being attached
        child: ObjectHandle,
        /// Requested parent
        parent: ObjectHandle,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    ConfigIo {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for `EngineConfig`.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
