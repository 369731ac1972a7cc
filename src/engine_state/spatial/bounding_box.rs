//! # Bounding Box Module
//!
//! Axis-aligned bounding boxes shared by chunks, placed objects and octree nodes.
//!
//! ## Interval Semantics
//!
//! Every axis is treated as a half-open interval `[min, max)`: a box includes its
//! minimum face and excludes its maximum face. Two boxes that merely touch do not
//! overlap, and an object sitting exactly on a split plane belongs to exactly one
//! side of it. An axis with zero extent is treated as a single point on that axis.

use cgmath::{EuclideanSpace, Matrix4, Point3, Transform, Vector3};

/// An axis-aligned box in world space.
///
/// Invariant: `min <= max` on every axis. [`BoundingBox::new`] normalizes swapped
/// corners, so the invariant holds for every box built through the public API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (inclusive)
    pub min: Point3<f32>,
    /// Maximum corner (exclusive)
    pub max: Point3<f32>,
}

/// Half-open overlap test on one axis, with zero-extent intervals treated as points.
fn axis_overlaps(a_min: f32, a_max: f32, b_min: f32, b_max: f32) -> bool {
    match (a_min == a_max, b_min == b_max) {
        (true, true) => a_min == b_min,
        (true, false) => b_min <= a_min && a_min < b_max,
        (false, true) => a_min <= b_min && b_min < a_max,
        (false, false) => a_min < b_max && b_min < a_max,
    }
}

/// Half-open containment of `[inner_min, inner_max)` in `[outer_min, outer_max)`.
fn axis_contains(outer_min: f32, outer_max: f32, inner_min: f32, inner_max: f32) -> bool {
    inner_min >= outer_min && inner_max <= outer_max && inner_min < outer_max
}

impl BoundingBox {
    /// Builds a box from two opposite corners in any order.
    pub fn new(a: Point3<f32>, b: Point3<f32>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Builds a box from its minimum corner and its size along each axis.
    ///
    /// This is how colliders and chunks describe themselves: a position plus a
    /// dimension. Negative dimensions are normalized like swapped corners.
    pub fn from_position_dimension(position: Point3<f32>, dimension: Vector3<f32>) -> Self {
        Self::new(position, position + dimension)
    }

    /// Builds a cube of side `side` centred on `center`.
    pub fn cube(center: Point3<f32>, side: f32) -> Self {
        let half = Vector3::new(side, side, side) * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn center(&self) -> Point3<f32> {
        self.min.midpoint(self.max)
    }

    /// Returns `true` if both corners are finite.
    pub fn is_finite(&self) -> bool {
        [self.min.x, self.min.y, self.min.z, self.max.x, self.max.y, self.max.z]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Returns `true` if the box has a positive extent on every axis.
    pub fn has_volume(&self) -> bool {
        let size = self.size();
        size.x > 0.0 && size.y > 0.0 && size.z > 0.0
    }

    /// Half-open point test: inclusive min, exclusive max.
    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        self.overlaps(&BoundingBox::new(point, point))
    }

    /// Returns `true` if `other` lies entirely inside this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        axis_contains(self.min.x, self.max.x, other.min.x, other.max.x)
            && axis_contains(self.min.y, self.max.y, other.min.y, other.max.y)
            && axis_contains(self.min.z, self.max.z, other.min.z, other.max.z)
    }

    /// Returns `true` if the two boxes share any volume (touching faces do not count).
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        axis_overlaps(self.min.x, self.max.x, other.min.x, other.max.x)
            && axis_overlaps(self.min.y, self.max.y, other.min.y, other.max.y)
            && axis_overlaps(self.min.z, self.max.z, other.min.z, other.max.z)
    }

    /// Returns one of the eight octants of this box.
    ///
    /// Bit 0 of `index` selects the upper half on X, bit 1 on Y and bit 2 on Z.
    pub fn octant(&self, index: usize) -> BoundingBox {
        let center = self.center();
        let pick = |bit: usize, min: f32, mid: f32, max: f32| {
            if index & bit == 0 {
                (min, mid)
            } else {
                (mid, max)
            }
        };
        let (x0, x1) = pick(1, self.min.x, center.x, self.max.x);
        let (y0, y1) = pick(2, self.min.y, center.y, self.max.y);
        let (z0, z1) = pick(4, self.min.z, center.z, self.max.z);
        BoundingBox {
            min: Point3::new(x0, y0, z0),
            max: Point3::new(x1, y1, z1),
        }
    }

    /// Returns the octant index that would hold `other`, or `None` if it straddles
    /// a split plane.
    ///
    /// This only looks at the split planes; callers still check that the chosen
    /// octant actually contains `other`.
    pub fn octant_of(&self, other: &BoundingBox) -> Option<usize> {
        let center = self.center();
        let side = |min: f32, max: f32, mid: f32| {
            if min >= mid {
                Some(1)
            } else if max <= mid {
                Some(0)
            } else {
                None
            }
        };
        let x = side(other.min.x, other.max.x, center.x)?;
        let y = side(other.min.y, other.max.y, center.y)?;
        let z = side(other.min.z, other.max.z, center.z)?;
        Some(x | (y << 1) | (z << 2))
    }

    /// Returns the smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Returns this box moved by `offset`.
    pub fn translated(&self, offset: Vector3<f32>) -> BoundingBox {
        BoundingBox {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// The eight corners, in octant index order.
    pub fn corners(&self) -> [Point3<f32>; 8] {
        std::array::from_fn(|i| {
            Point3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Returns the axis-aligned box enclosing this box after `matrix` is applied.
    ///
    /// All eight corners are transformed, so rotation and non-uniform scale
    /// widen the result instead of being dropped.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> BoundingBox {
        let corners = self.corners().map(|corner| matrix.transform_point(corner));
        let first = BoundingBox::new(corners[0], corners[0]);
        corners[1..]
            .iter()
            .fold(first, |acc, corner| acc.union(&BoundingBox::new(*corner, *corner)))
    }
}
