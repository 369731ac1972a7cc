//! # Core Module
//!
//! Ownership primitives shared by the rest of the crate.
//!
//! ## Key Components
//! - `Arena`: the single owner of a family of values (game objects, voxel arrays, meshes)
//! - `Handle`: a typed, generational index into an `Arena`
//!
//! Everything that only *refers* to a value (the octree, draw calls, the mesh
//! reference on a chunk) stores a `Handle`. Removing a value from its arena makes
//! every outstanding handle resolve to `None`, so back-references can never keep a
//! value alive or observe a recycled slot.
//!
//! ## Usage
//! ```rust
//! use voxel_world::core::{Arena, Handle};
//!
//! let mut names: Arena<String> = Arena::new();
//! let handle: Handle<String> = names.insert("World".to_string());
//! assert_eq!(names.get(handle).map(String::as_str), Some("World"));
//! ```

pub mod arena;
pub mod handle;

pub use arena::Arena;
pub use handle::Handle;
