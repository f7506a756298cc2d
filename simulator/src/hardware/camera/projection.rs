//! Pixel <-> ray and world <-> pixel mappings, culling and pose helpers.
//!
//! Pixel coordinates are continuous: pixel `(i, j)` covers `[i, i+1] x [j, j+1]`
//! and its center is `(i + 0.5, j + 0.5)`. Camera space looks along `+z` with
//! `+y` down, or along `-z` with `+y` up and mirrored columns in the Blender
//! convention.

use nalgebra::{Matrix3, Matrix4, Vector2, Vector3};
use rand::RngCore;
use rand_distr::Uniform;

use super::intrinsics::{direction_through_pixel, pixel_of_point};
use super::Camera;
use crate::algo::sample_vector_field;
use crate::geometry::{cast_vector, CameraFloat, MeshFloat, Obb, Ray};
use crate::hardware::error::{ensure_positive, CameraError};
use crate::photometry::Spectral;

impl<S: Spectral, F: CameraFloat, M: MeshFloat<F>> Camera<S, F, M> {
    /// Pixel coordinate of a point given in camera space.
    ///
    /// Fails for points in the camera plane (`z = 0`), which have no image.
    pub fn project_camera_point(&self, point: &Vector3<F>) -> Result<Vector2<F>, CameraError> {
        let state = self.precomputed()?;
        pixel_of_point(
            &state.intrinsics_working,
            self.distortion.as_deref(),
            &self.frame_convention().cast(),
            point,
        )
        .ok_or_else(|| CameraError::OutOfRange {
            parameter: "point",
            message: "point lies in the camera plane".to_string(),
        })
    }

    /// Pixel coordinate of a point given in world space.
    pub fn project_world_point(&self, point: &Vector3<F>) -> Result<Vector2<F>, CameraError> {
        self.project_camera_point(&self.frame.point_to_local(point))
    }

    /// Camera-space direction through a pixel coordinate. Not normalized.
    pub fn pixel_to_direction(&self, x: F, y: F) -> Result<Vector3<F>, CameraError> {
        let state = self.precomputed()?;
        if let Some(field) = &state.pixel_directions {
            return Ok(sample_vector_field(field, x, y));
        }
        Ok(direction_through_pixel(
            &state.intrinsics_working,
            self.distortion.as_deref(),
            &self.frame_convention().cast(),
            &Vector2::new(x, y),
        ))
    }

    /// World-space pinhole ray through a pixel coordinate.
    pub fn pixel_to_ray(&self, x: F, y: F) -> Result<Ray<F>, CameraError> {
        let direction = self.pixel_to_direction(x, y)?;
        Ok(Ray::new(
            self.frame.position(),
            self.frame.direction_to_global(&direction),
        ))
    }

    /// World-space ray with depth of field.
    ///
    /// With depth of field enabled the origin moves to a point sampled on the
    /// aperture and, for a finite focus distance, the direction is re-aimed
    /// so all rays through the pixel meet `focus` metres along the pinhole
    /// ray: `d' = focus · normalize(d) − offset`. With it disabled this is
    /// [`Camera::pixel_to_ray`] and `rng` is left untouched.
    ///
    /// # Arguments
    /// * `x`, `y` - Pixel coordinate
    /// * `rng` - Caller-owned generator
    /// * `uniform` - Distribution over `[0, 1)` used for aperture samples
    pub fn pixel_to_ray_dof(
        &self,
        x: F,
        y: F,
        rng: &mut dyn RngCore,
        uniform: &Uniform<f32>,
    ) -> Result<Ray<F>, CameraError> {
        if !self.depth_of_field {
            return self.pixel_to_ray(x, y);
        }
        let direction = self.pixel_to_direction(x, y)?.normalize();
        let sample = self.aperture()?.sample_point(rng, uniform);
        let offset = Vector3::new(
            F::from_f64_lossy(sample.x as f64),
            F::from_f64_lossy(sample.y as f64),
            F::zero(),
        );

        let direction = if self.focus_distance.is_finite() {
            direction * F::from_f64_lossy(self.focus_distance) - offset
        } else {
            direction
        };

        Ok(Ray::new(
            self.frame.position() + self.frame.direction_to_global(&offset),
            self.frame.direction_to_global(&direction),
        ))
    }

    /// Whether a world-space box reaches inside all four frustum side planes.
    ///
    /// Only the four outer image corners bound the frustum, so strong barrel
    /// distortion can leave visible boxes outside it.
    pub fn obb_in_view(&self, obb: &Obb<M>) -> Result<bool, CameraError> {
        let frustum = self.frustum()?;
        let center: Vector3<F> = cast_vector(&obb.center);
        let half_extents: Vector3<F> = cast_vector(&obb.half_extents);
        let axes: Matrix3<F> = obb.axes.map(|v| v.narrow());

        let to_camera = self.frame.rotation().inverse();
        let scale = self.frame.scale();
        let local = Obb::new(
            self.frame.point_to_local(&center),
            half_extents / scale,
            to_camera.to_rotation_matrix().matrix() * axes,
        );
        Ok(frustum.intersects_obb(&local))
    }

    /// True if a world point lies behind the camera plane.
    pub fn behind(&self, point: &Vector3<F>) -> bool {
        let local = self.frame.point_to_local(point);
        local.z * F::from_f64_lossy(self.z_dir()) <= F::zero()
    }

    /// World-to-camera transform.
    pub fn view_matrix(&self) -> Matrix4<F> {
        self.frame.inverse_transformation_matrix()
    }

    /// Inverse transpose of the view matrix's linear part, for normals.
    pub fn view_normal_matrix(&self) -> Matrix3<F> {
        self.frame.rotation_matrix().transpose().matrix() * self.frame.scale()
    }

    /// Turn the camera towards a world point.
    pub fn look_at(&mut self, target: &Vector3<F>, up: &Vector3<F>) {
        let direction = target - self.frame.position();
        self.look_in_direction(&direction, up);
    }

    /// Orient the viewing axis along `direction` with image-up towards `up`.
    pub fn look_in_direction(&mut self, direction: &Vector3<F>, up: &Vector3<F>) {
        if self.blender_frame {
            self.frame.face_towards(&-direction, up);
        } else {
            self.frame.face_towards(direction, &-up);
        }
    }

    /// Ground sample distance `(x, y)` in metres per pixel at `distance`
    /// metres, for a target perpendicular to the optical axis.
    pub fn calculate_gsd(&self, distance: f64) -> Result<Vector2<f64>, CameraError> {
        let distance = ensure_positive("distance", distance)?;
        Ok(self.pixel_size() * (distance / self.focal_length))
    }

    /// Full horizontal and vertical field of view of the pinhole model, radians.
    pub fn fov(&self) -> Vector2<f64> {
        self.sensor_size
            .map(|extent| 2.0 * (extent / (2.0 * self.focal_length)).atan())
    }
}
