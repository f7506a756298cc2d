//! Rays cast from the camera into the scene.

use nalgebra::Vector3;

use super::CameraFloat;

/// Half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray<F: CameraFloat> {
    pub origin: Vector3<F>,
    pub direction: Vector3<F>,
}

impl<F: CameraFloat> Ray<F> {
    /// Build a ray, normalising `direction`.
    pub fn new(origin: Vector3<F>, direction: Vector3<F>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Point at parameter `t` along the ray.
    pub fn at(&self, t: F) -> Vector3<F> {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_direction_is_normalized() {
        let ray = Ray::new(Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 3.0, 4.0));
        assert_relative_eq!(ray.direction.norm(), 1.0);
        assert_relative_eq!(ray.at(5.0), Vector3::new(1.0, 3.0, 4.0), epsilon = 1e-12);
    }
}
