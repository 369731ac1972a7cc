//! # Spatial Module
//!
//! The spatial index of the world: a dynamic octree over axis-aligned bounding
//! boxes that holds every placed object and terrain chunk.
//!
//! ## Ownership
//!
//! The octree never owns what it indexes. It stores keys (in the engine,
//! [`ObjectHandle`](crate::engine_state::world::ObjectHandle)s into the world
//! arena) plus the bounds it last read for each key. Anything it needs to know
//! about the objects themselves is asked through the [`SpatialObjects`] and
//! [`SpatialHooks`] traits, which the world graph implements.
//!
//! ## Frame Ordering
//!
//! 1. `update_tree` re-reads every object's bounds and restructures the tree
//! 2. `update` runs proximity hooks against that snapshot
//! 3. `draw` / `draw_debug` submit geometry to the renderer

pub mod bounding_box;
pub mod octree;

pub use bounding_box::BoundingBox;
pub use octree::{
    DrawStats, Insertion, NodeId, Octree, OctreeSettings, OutOfBoundsPolicy, TreeUpdate,
};

use crate::engine_state::rendering::DrawCall;

/// Read access to the objects an octree indexes.
pub trait SpatialObjects<K> {
    /// Current world-space bounds of `key`, or `None` if the object no longer exists.
    fn spatial_bounds(&self, key: K) -> Option<BoundingBox>;

    /// Geometry to submit for `key`, if it has any.
    fn draw_call(&self, _key: K) -> Option<DrawCall> {
        None
    }
}

/// Per-frame hooks that need spatial context.
pub trait SpatialHooks<K>: SpatialObjects<K> {
    /// Receives the tracked objects whose bounds overlap `key` this frame.
    fn on_spatial_update(&mut self, key: K, contacts: &[K]);
}
