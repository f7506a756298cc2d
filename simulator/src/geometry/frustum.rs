//! View-frustum culling against oriented bounding boxes.
//!
//! The camera frustum is described by its four side planes only; there is no
//! near or far plane. Planes store an inward-facing unit normal so that
//! `signed_distance(p) >= 0` means `p` is on the visible side.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use super::CameraFloat;

/// Plane `normal · p + distance = 0` with unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane<F: CameraFloat> {
    pub normal: Vector3<F>,
    pub distance: F,
}

impl<F: CameraFloat> Plane<F> {
    /// Plane through three points, normal oriented by the right-hand rule on
    /// `a -> b -> c`.
    pub fn from_points(a: &Vector3<F>, b: &Vector3<F>, c: &Vector3<F>) -> Self {
        let normal = (b - a).cross(&(c - a)).normalize();
        Self {
            normal,
            distance: -normal.dot(a),
        }
    }

    pub fn signed_distance(&self, p: &Vector3<F>) -> F {
        self.normal.dot(p) + self.distance
    }

    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            distance: -self.distance,
        }
    }

    /// Whether any part of `obb` lies on the non-negative side of the plane.
    pub fn intersects_obb(&self, obb: &Obb<F>) -> bool {
        let mut reach = F::zero();
        for k in 0..3 {
            let axis = obb.axes.column(k);
            reach += self.normal.dot(&axis).abs() * obb.half_extents[k];
        }
        self.signed_distance(&obb.center) + reach >= F::zero()
    }
}

/// Oriented bounding box: center, half extents along each local axis, and
/// the axes as orthonormal matrix columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb<F: CameraFloat> {
    pub center: Vector3<F>,
    pub half_extents: Vector3<F>,
    pub axes: Matrix3<F>,
}

impl<F: CameraFloat> Obb<F> {
    pub fn new(center: Vector3<F>, half_extents: Vector3<F>, axes: Matrix3<F>) -> Self {
        Self {
            center,
            half_extents,
            axes,
        }
    }

    /// Axis-aligned box spanning `min..max`.
    pub fn from_aabb(min: &Vector3<F>, max: &Vector3<F>) -> Self {
        let two = F::one() + F::one();
        Self {
            center: (min + max) / two,
            half_extents: (max - min) / two,
            axes: Matrix3::identity(),
        }
    }

    /// Apply `p -> rotation * p + translation` to the box.
    pub fn transformed(&self, rotation: &UnitQuaternion<F>, translation: &Vector3<F>) -> Self {
        Self {
            center: rotation * self.center + translation,
            half_extents: self.half_extents,
            axes: rotation.to_rotation_matrix().matrix() * self.axes,
        }
    }

    /// The eight box corners.
    pub fn corners(&self) -> [Vector3<F>; 8] {
        let mut out = [Vector3::zeros(); 8];
        for (i, corner) in out.iter_mut().enumerate() {
            let mut p = self.center;
            for k in 0..3 {
                let sign = if (i >> k) & 1 == 1 { F::one() } else { -F::one() };
                p += self.axes.column(k) * (sign * self.half_extents[k]);
            }
            *corner = p;
        }
        out
    }
}

/// Side planes of the frustum in the order they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumSide {
    Left,
    Right,
    Bottom,
    Top,
}

/// Four-sided view frustum in camera space.
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum<F: CameraFloat> {
    /// Near corners then far corners, each in image order
    /// top-left, top-right, bottom-right, bottom-left.
    corners: [Vector3<F>; 8],
    planes: [Plane<F>; 4],
}

impl<F: CameraFloat> Frustum<F> {
    /// Build the frustum from the camera-space directions of the four image
    /// corners (top-left, top-right, bottom-right, bottom-left) and the
    /// camera's viewing axis `forward`.
    ///
    /// Near corners sit at unit distance along each direction, far corners at
    /// `far`. Each side plane passes through one near corner and two far
    /// corners and is flipped if needed so `forward` is inside.
    pub fn from_corner_directions(directions: &[Vector3<F>; 4], forward: &Vector3<F>, far: F) -> Self {
        let mut corners = [Vector3::zeros(); 8];
        for (k, d) in directions.iter().enumerate() {
            let unit = d.normalize();
            corners[k] = unit;
            corners[k + 4] = unit * far;
        }

        // Edge (a, b) of the image boundary yields one side plane.
        let side = |a: usize, b: usize| {
            let plane = Plane::from_points(&corners[a], &corners[a + 4], &corners[b + 4]);
            if plane.signed_distance(forward) < F::zero() {
                plane.flipped()
            } else {
                plane
            }
        };

        // Left edge: bottom-left -> top-left; right: top-right -> bottom-right;
        // bottom: bottom-right -> bottom-left; top: top-left -> top-right.
        let planes = [side(3, 0), side(1, 2), side(2, 3), side(0, 1)];
        Self { corners, planes }
    }

    pub fn plane(&self, side: FrustumSide) -> Plane<F> {
        self.planes[side as usize]
    }

    pub fn planes(&self) -> &[Plane<F>; 4] {
        &self.planes
    }

    pub fn corners(&self) -> &[Vector3<F>; 8] {
        &self.corners
    }

    /// True if the box reaches the inside of every side plane.
    pub fn intersects_obb(&self, obb: &Obb<F>) -> bool {
        self.planes.iter().all(|plane| plane.intersects_obb(obb))
    }
}
