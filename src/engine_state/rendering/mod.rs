//! Rendering boundary of the engine.
//!
//! Nothing in this crate talks to a graphics API. Meshing produces CPU-side
//! vertex and index buffers, and traversal hands draw requests to whatever
//! implements [`Renderer`]. A windowed front end uploads meshes and issues the
//! real draw calls; the headless driver and the tests use [`RecordingRenderer`].

use cgmath::Matrix4;

use super::spatial::BoundingBox;

pub mod frustum;
pub mod meshing;
mod vertex;

// Re-export commonly used types
pub use frustum::{Frustum, Plane};
pub use meshing::{AtlasLayout, MeshHandle, MeshManager};
pub use vertex::Vertex;

/// Identifier of a texture owned by the graphics front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub u32);

/// A request to draw one mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    /// Mesh to draw
    pub mesh: MeshHandle,
    /// Local-to-world transform of the owning object
    pub transform: Matrix4<f32>,
    /// World-space bounds of the owning object
    pub bounds: BoundingBox,
}

/// The consumer of traversal output.
///
/// Frustum culling is split between the two sides: the renderer answers
/// visibility questions and the spatial index uses the answers to skip whole
/// subtrees.
pub trait Renderer {
    /// Called once at the start of every frame, before anything is submitted.
    fn begin_frame(&mut self) {}

    /// Returns `false` if nothing inside `bounds` can be seen this frame.
    fn is_visible(&self, _bounds: &BoundingBox) -> bool {
        true
    }

    /// Queues a mesh for drawing.
    fn submit(&mut self, call: DrawCall);

    /// Queues a wireframe box, tagged with the octree depth it came from.
    fn submit_debug_box(&mut self, bounds: &BoundingBox, depth: u32);
}

/// A renderer that records everything it is asked to draw.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    /// Optional view volume; without one everything is visible
    pub frustum: Option<Frustum>,
    /// Draw calls received since the last frame began
    pub draw_calls: Vec<DrawCall>,
    /// Debug boxes received since the last frame began
    pub debug_boxes: Vec<(BoundingBox, u32)>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder that culls against `frustum`.
    pub fn with_frustum(frustum: Frustum) -> Self {
        Self {
            frustum: Some(frustum),
            ..Self::default()
        }
    }

    /// Forgets everything recorded so far.
    pub fn clear(&mut self) {
        self.draw_calls.clear();
        self.debug_boxes.clear();
    }
}

impl Renderer for RecordingRenderer {
    fn begin_frame(&mut self) {
        self.clear();
    }

    fn is_visible(&self, bounds: &BoundingBox) -> bool {
        self.frustum
            .as_ref()
            .map_or(true, |frustum| frustum.intersects(bounds))
    }

    fn submit(&mut self, call: DrawCall) {
        self.draw_calls.push(call);
    }

    fn submit_debug_box(&mut self, bounds: &BoundingBox, depth: u32) {
        self.debug_boxes.push((*bounds, depth));
    }
}
