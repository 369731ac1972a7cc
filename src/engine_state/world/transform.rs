//! Local transforms and colliders of game objects.

use cgmath::{EuclideanSpace, Matrix4, One, Point3, Quaternion, Vector3};

use crate::engine_state::spatial::BoundingBox;

/// Position, rotation and scale of an object relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub scale: Vector3<f32>,
    pub rotation: Quaternion<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Transform {
            position: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
            rotation: Quaternion::one(),
        }
    }
}

impl Transform {
    pub fn new(position: Vector3<f32>, scale: Vector3<f32>, rotation: Quaternion<f32>) -> Self {
        Transform {
            position,
            scale,
            rotation,
        }
    }

    /// An unrotated, unscaled transform at `position`.
    pub fn from_position(position: Vector3<f32>) -> Self {
        Transform {
            position,
            ..Default::default()
        }
    }

    /// Local-to-parent matrix: scale, then rotate, then translate.
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Collision volume of an object in its own local space.
///
/// The box is axis-aligned before the object's transform is applied; in world
/// space it is rotated and scaled with the object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    /// Offset of the volume's minimum corner from the object's position
    pub offset: Vector3<f32>,
    /// Size along each axis
    pub dimension: Vector3<f32>,
}

impl Collider {
    pub fn new(dimension: Vector3<f32>) -> Self {
        Collider {
            offset: Vector3::new(0.0, 0.0, 0.0),
            dimension,
        }
    }

    /// The volume in object space, from `offset` to `offset + dimension`.
    pub fn local_bounds(&self) -> BoundingBox {
        BoundingBox::from_position_dimension(Point3::from_vec(self.offset), self.dimension)
    }
}
