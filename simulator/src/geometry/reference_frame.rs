//! Position, orientation and scale of an object in the world.
//!
//! A `ReferenceFrame` maps local coordinates to global ones as
//! `global = position + rotation * (scale * local)`. Cameras use it for their
//! pose; the view matrix is the inverse of the frame's transformation.

use nalgebra::{Matrix3, Matrix4, Rotation3, Unit, UnitQuaternion, Vector3};

use super::CameraFloat;

/// Rigid pose plus uniform scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceFrame<F: CameraFloat> {
    position: Vector3<F>,
    rotation: UnitQuaternion<F>,
    scale: F,
}

impl<F: CameraFloat> Default for ReferenceFrame<F> {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: F::one(),
        }
    }
}

impl<F: CameraFloat> ReferenceFrame<F> {
    pub fn new(position: Vector3<F>, rotation: UnitQuaternion<F>) -> Self {
        Self {
            position,
            rotation,
            scale: F::one(),
        }
    }

    pub fn position(&self) -> Vector3<F> {
        self.position
    }

    pub fn set_position(&mut self, position: Vector3<F>) {
        self.position = position;
    }

    pub fn translate(&mut self, offset: Vector3<F>) {
        self.position += offset;
    }

    pub fn rotation(&self) -> UnitQuaternion<F> {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: UnitQuaternion<F>) {
        self.rotation = rotation;
    }

    /// Set the rotation from a proper rotation matrix.
    pub fn set_rotation_matrix(&mut self, matrix: &Matrix3<F>) {
        self.rotation = UnitQuaternion::from_matrix(matrix);
    }

    /// Set the rotation from roll (x), pitch (y) and yaw (z) in radians.
    pub fn set_euler_angles(&mut self, roll: F, pitch: F, yaw: F) {
        self.rotation = UnitQuaternion::from_euler_angles(roll, pitch, yaw);
    }

    pub fn set_axis_angle(&mut self, axis: &Unit<Vector3<F>>, angle: F) {
        self.rotation = UnitQuaternion::from_axis_angle(axis, angle);
    }

    /// Compose an additional rotation applied after the current one.
    pub fn rotate(&mut self, rotation: &UnitQuaternion<F>) {
        self.rotation = rotation * self.rotation;
    }

    /// Orient the frame so local `+z` points along `direction` and local `+y`
    /// is as close to `up` as possible.
    pub fn face_towards(&mut self, direction: &Vector3<F>, up: &Vector3<F>) {
        self.rotation = UnitQuaternion::face_towards(direction, up);
    }

    pub fn rotation_matrix(&self) -> Rotation3<F> {
        self.rotation.to_rotation_matrix()
    }

    pub fn scale(&self) -> F {
        self.scale
    }

    pub fn set_scale(&mut self, scale: F) {
        self.scale = scale;
    }

    pub fn point_to_global(&self, local: &Vector3<F>) -> Vector3<F> {
        self.position + self.rotation * (local * self.scale)
    }

    pub fn point_to_local(&self, global: &Vector3<F>) -> Vector3<F> {
        self.rotation.inverse() * (global - self.position) / self.scale
    }

    /// Rotate a direction into the global frame. Scale and translation are ignored.
    pub fn direction_to_global(&self, local: &Vector3<F>) -> Vector3<F> {
        self.rotation * local
    }

    pub fn direction_to_local(&self, global: &Vector3<F>) -> Vector3<F> {
        self.rotation.inverse() * global
    }

    /// Homogeneous local-to-global transform.
    pub fn transformation_matrix(&self) -> Matrix4<F> {
        Matrix4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&Vector3::repeat(self.scale))
    }

    /// Homogeneous global-to-local transform, built from the inverse factors.
    pub fn inverse_transformation_matrix(&self) -> Matrix4<F> {
        Matrix4::new_nonuniform_scaling(&Vector3::repeat(F::one() / self.scale))
            * self.rotation.inverse().to_homogeneous()
            * Matrix4::new_translation(&-self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_point_round_trip() {
        let mut frame = ReferenceFrame::<f64>::default();
        frame.set_position(Vector3::new(1.0, 2.0, 3.0));
        frame.set_euler_angles(0.1, -0.4, 1.2);
        frame.set_scale(2.5);

        let p = Vector3::new(-0.3, 4.0, 0.7);
        let g = frame.point_to_global(&p);
        assert_relative_eq!(frame.point_to_local(&g), p, epsilon = 1e-12);

        let h = frame.transformation_matrix() * p.push(1.0);
        assert_relative_eq!(h.xyz(), g, epsilon = 1e-12);
        let back = frame.inverse_transformation_matrix() * h;
        assert_relative_eq!(back.xyz(), p, epsilon = 1e-12);
    }

    #[test]
    fn test_axis_angle_rotation() {
        let mut frame = ReferenceFrame::<f64>::default();
        frame.set_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let d = frame.direction_to_global(&Vector3::x());
        assert_relative_eq!(d, Vector3::y(), epsilon = 1e-12);
        assert_relative_eq!(frame.direction_to_local(&d), Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_face_towards() {
        let mut frame = ReferenceFrame::<f64>::default();
        let dir = Vector3::new(1.0, 1.0, 0.0).normalize();
        frame.face_towards(&dir, &Vector3::z());
        assert_relative_eq!(frame.direction_to_global(&Vector3::z()), dir, epsilon = 1e-12);
        assert_relative_eq!(
            frame.direction_to_global(&Vector3::y()),
            Vector3::z(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rotation_matrix_setter() {
        let mut frame = ReferenceFrame::<f64>::default();
        let rot = Rotation3::from_euler_angles(0.3, 0.2, 0.1);
        frame.set_rotation_matrix(rot.matrix());
        assert_relative_eq!(frame.rotation_matrix(), rot, epsilon = 1e-9);
    }
}
