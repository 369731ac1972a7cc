//! # View Frustum
//!
//! Visibility testing for bounding boxes against a camera's view volume.
//!
//! The six clip planes are extracted straight from a view-projection matrix
//! (Gribb/Hartmann), so any camera that can produce such a matrix can drive
//! culling. Projections are expected in wgpu's clip space, with depth in
//! `[0, 1]`; [`OPENGL_TO_WGPU_MATRIX`] converts cgmath's OpenGL-style output.

use cgmath::{Deg, InnerSpace, Matrix, Matrix4, Point3, Vector3, Vector4};

use crate::engine_state::spatial::BoundingBox;

/// Transformation matrix to convert from OpenGL's clip space to WGPU's.
///
/// Scales Z from [-1, 1] to [-0.5, 0.5] then translates it to [0, 1].
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// A plane `normal · p + distance = 0`, with the normal pointing inside the frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<f32>,
    pub distance: f32,
}

impl Plane {
    fn from_row(row: Vector4<f32>) -> Self {
        let normal = row.truncate();
        let length = normal.magnitude();
        if length > 0.0 {
            Plane {
                normal: normal / length,
                distance: row.w / length,
            }
        } else {
            Plane {
                normal,
                distance: row.w,
            }
        }
    }

    /// Signed distance from the plane; positive on the inner side.
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.x * point.x + self.normal.y * point.y + self.normal.z * point.z + self.distance
    }
}

/// The six clip planes of a camera: left, right, bottom, top, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the clip planes from a combined view-projection matrix.
    pub fn from_view_projection(view_projection: Matrix4<f32>) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);

        Frustum {
            planes: [
                Plane::from_row(r3 + r0),
                Plane::from_row(r3 - r0),
                Plane::from_row(r3 + r1),
                Plane::from_row(r3 - r1),
                // wgpu depth runs 0..1, so the near plane is row 2 on its own
                Plane::from_row(r2),
                Plane::from_row(r3 - r2),
            ],
        }
    }

    /// Builds the frustum of a perspective camera looking from `eye` at `target`.
    ///
    /// # Arguments
    /// * `eye` - Camera position
    /// * `target` - Point the camera looks at
    /// * `fovy` - Vertical field of view in degrees
    /// * `aspect` - Width over height
    /// * `znear`, `zfar` - Clip distances
    pub fn perspective(
        eye: Point3<f32>,
        target: Point3<f32>,
        fovy: f32,
        aspect: f32,
        znear: f32,
        zfar: f32,
    ) -> Self {
        let view = Matrix4::look_at_rh(eye, target, Vector3::unit_y());
        let projection = OPENGL_TO_WGPU_MATRIX * cgmath::perspective(Deg(fovy), aspect, znear, zfar);
        Self::from_view_projection(projection * view)
    }

    /// Returns `false` only if the box lies entirely outside one of the planes.
    ///
    /// Uses the positive-vertex test: for each plane, the box corner furthest
    /// along the plane normal is checked. The test is conservative and may
    /// report boxes near frustum corners as visible.
    pub fn intersects(&self, bounds: &BoundingBox) -> bool {
        self.planes.iter().all(|plane| {
            let positive = Point3::new(
                if plane.normal.x >= 0.0 { bounds.max.x } else { bounds.min.x },
                if plane.normal.y >= 0.0 { bounds.max.y } else { bounds.min.y },
                if plane.normal.z >= 0.0 { bounds.max.z } else { bounds.min.z },
            );
            plane.signed_distance(positive) >= 0.0
        })
    }
}
