//! Geometric primitives for the camera model.
//!
//! Everything here is generic over [`CameraFloat`], the working precision of
//! a camera. Solid-angle integration always runs in `f64`; ray casting runs in
//! whatever precision the camera was instantiated with.

pub mod frustum;
pub mod ray;
pub mod reference_frame;

pub use frustum::{Frustum, FrustumSide, Obb, Plane};
pub use ray::Ray;
pub use reference_frame::ReferenceFrame;

use nalgebra::{RealField, Vector3};

/// Floating-point type a camera can compute in.
pub trait CameraFloat: RealField + Copy + Default + Send + Sync + 'static {
    fn from_f64_lossy(value: f64) -> Self;
    fn as_f64(self) -> f64;
}

impl CameraFloat for f32 {
    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }
    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl CameraFloat for f64 {
    fn from_f64_lossy(value: f64) -> Self {
        value
    }
    fn as_f64(self) -> f64 {
        self
    }
}

/// Mesh precision usable with a camera working in `F`.
///
/// Implemented only where the mesh type is at least as precise as `F`, so a
/// camera never widens geometry it receives from the scene.
pub trait MeshFloat<F: CameraFloat>: CameraFloat {
    fn narrow(self) -> F {
        F::from_f64_lossy(self.as_f64())
    }
}

impl MeshFloat<f32> for f32 {}
impl MeshFloat<f32> for f64 {}
impl MeshFloat<f64> for f64 {}

/// Convert a vector between precisions.
pub fn cast_vector<A: CameraFloat, B: CameraFloat>(v: &Vector3<A>) -> Vector3<B> {
    Vector3::new(
        B::from_f64_lossy(v.x.as_f64()),
        B::from_f64_lossy(v.y.as_f64()),
        B::from_f64_lossy(v.z.as_f64()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrowing() {
        let v: f64 = 1.0 + 1e-12;
        let n: f32 = MeshFloat::<f32>::narrow(v);
        assert_eq!(n, 1.0f32);
        let w: f64 = MeshFloat::<f64>::narrow(v);
        assert_eq!(w, v);
    }

    #[test]
    fn test_cast_vector() {
        let v = Vector3::new(1.5f64, -2.0, 0.25);
        let c: Vector3<f32> = cast_vector(&v);
        assert_eq!(c, Vector3::new(1.5f32, -2.0, 0.25));
    }
}
