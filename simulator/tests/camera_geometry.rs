//! Geometry-side checks of the camera: projection, rays and solid angles.

use approx::assert_relative_eq;
use nalgebra::{Vector2, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Uniform;

use camera_sim::hardware::distortion::{
    BrownCoefficients, BrownDistortion, OpenCvCoefficients, OpenCvDistortion, OwenCoefficients,
    OwenDistortion,
};
use camera_sim::hardware::Distortion;
use camera_sim::photometry::Panchromatic;
use camera_sim::Camera;
use shared::image_size::Resolution;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn camera(width: usize, height: usize, pixel_pitch: f64, focal_length: f64) -> Camera<Panchromatic> {
    let mut camera = Camera::new();
    camera.set_resolution(Resolution::new(width, height)).unwrap();
    camera
        .set_sensor_size(width as f64 * pixel_pitch, height as f64 * pixel_pitch)
        .unwrap();
    camera.set_focal_length(focal_length).unwrap();
    camera
}

#[test]
fn test_pixel_round_trip_through_direction() {
    init_logging();
    let mut camera = camera(640, 480, 5e-6, 0.02);
    camera.set_principal_point(331.7, 229.2).unwrap();
    camera.set_skew(0.4, -1.1).unwrap();
    camera.initialize().unwrap();

    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..200 {
        let pixel = Vector2::new(rng.gen_range(0.0..640.0), rng.gen_range(0.0..480.0));
        let direction = camera.pixel_to_direction(pixel.x, pixel.y).unwrap();
        let back = camera.project_camera_point(&(direction * 7.5)).unwrap();
        assert_relative_eq!(back, pixel, epsilon = 1e-4);
    }
}

#[test]
fn test_camera_point_round_trip_off_axis() {
    init_logging();
    let mut camera = camera(100, 100, 1e-4, 0.05);
    camera.initialize().unwrap();

    for point in [
        Vector3::new(0.3, -0.2, 4.0),
        Vector3::new(-1.0, 0.7, 20.0),
        Vector3::new(0.01, 0.02, 0.5),
    ] {
        let pixel = camera.project_camera_point(&point).unwrap();
        let direction = camera.pixel_to_direction(pixel.x, pixel.y).unwrap();
        let reprojected = camera.project_camera_point(&direction).unwrap();
        assert_relative_eq!(reprojected, pixel, epsilon = 1e-4);
        assert_relative_eq!(
            direction.normalize(),
            point.normalize(),
            epsilon = 1e-9
        );
    }
}

#[test]
fn test_distortion_round_trip_every_model() {
    init_logging();
    let models: Vec<Box<dyn Distortion>> = vec![
        Box::new(BrownDistortion::new(BrownCoefficients {
            k1: -0.2,
            k2: 0.05,
            k3: 0.0,
            p1: 1e-3,
            p2: -5e-4,
        })),
        Box::new(OwenDistortion::new(OwenCoefficients {
            e1: 1e-3,
            e2: -0.02,
            e3: 5e-3,
            e4: 0.01,
            e5: 2e-3,
            e6: -1e-3,
        })),
        Box::new(OpenCvDistortion::new(OpenCvCoefficients {
            k1: 0.1,
            k2: -0.03,
            k4: 0.02,
            p1: 5e-4,
            s1: 1e-3,
            s3: -1e-3,
            ..Default::default()
        })),
    ];

    for model in &models {
        for ix in -5..=5 {
            for iy in -4..=4 {
                let p = Vector2::new(ix as f64 * 0.06, iy as f64 * 0.06);
                let back = model.undistort(&model.distort(&p));
                assert_relative_eq!(back, p, epsilon = 1e-5);
            }
        }
    }

    // Through the camera: pixel -> direction -> pixel
    let mut camera = camera(320, 240, 1e-5, 0.01);
    camera.set_distortion(models.into_iter().next().unwrap());
    camera.initialize().unwrap();
    for (u, v) in [(0.5, 0.5), (160.0, 120.0), (319.5, 10.25), (42.0, 239.0)] {
        let direction = camera.pixel_to_direction(u, v).unwrap();
        let pixel = camera.project_camera_point(&direction).unwrap();
        assert_relative_eq!(pixel, Vector2::new(u, v), epsilon = 1e-4);
    }
}

#[test]
fn test_blender_frame_mirrors_columns() {
    init_logging();
    let res_x = 100usize;
    // Centered and off-center principal points
    for principal_point in [None, Some((30.0, 40.0)), Some((71.25, 12.0))] {
        let mut standard = camera(res_x, 80, 1e-4, 0.05);
        let mut blender = camera(res_x, 80, 1e-4, 0.05);
        if let Some((px, py)) = principal_point {
            standard.set_principal_point(px, py).unwrap();
            blender.set_principal_point(px, py).unwrap();
        }
        blender.set_blender_frame(true);
        standard.initialize().unwrap();
        blender.initialize().unwrap();
        assert_eq!(blender.z_dir(), -1.0);

        for i in [0usize, 7, 10, 49, 50, 99] {
            let j = 33usize;
            // Point seen at the center of pixel (i, j) by the standard camera
            let direction = standard
                .pixel_to_direction(i as f64 + 0.5, j as f64 + 0.5)
                .unwrap();
            let flipped = blender.project_camera_point(&direction).unwrap();
            assert_eq!(flipped.x.floor() as usize, res_x - 1 - i);
            assert_relative_eq!(flipped.x, (res_x - 1 - i) as f64 + 0.5, epsilon = 1e-9);
            assert_relative_eq!(flipped.y, j as f64 + 0.5, epsilon = 1e-9);

            // And the Blender camera maps its own pixels back
            let own = blender
                .pixel_to_direction(i as f64 + 0.5, j as f64 + 0.5)
                .unwrap();
            assert!(own.z < 0.0);
            let back = blender.project_camera_point(&own).unwrap();
            assert_relative_eq!(back.x, i as f64 + 0.5, epsilon = 1e-9);
            assert_relative_eq!(back.y, j as f64 + 0.5, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_solid_angles_sum_to_field_of_view() {
    init_logging();
    for (width, height, focal_length) in [(64, 64, 0.005), (96, 72, 0.02), (128, 64, 0.002)] {
        let mut camera = camera(width, height, 1e-4, focal_length);
        camera.initialize().unwrap();
        let total: f64 = camera
            .pixel_solid_angles()
            .unwrap()
            .iter()
            .map(|&omega| omega as f64)
            .sum();

        let fov = camera.fov();
        let (tx, ty) = ((fov.x / 2.0).tan(), (fov.y / 2.0).tan());
        let expected = 4.0 * (tx * ty / (1.0 + tx * tx + ty * ty).sqrt()).atan();
        assert_relative_eq!(total, expected, max_relative = 0.01);
    }
}

#[test]
fn test_depth_of_field_disabled_matches_pinhole() {
    init_logging();
    let mut camera = camera(50, 50, 1e-4, 0.05);
    camera.set_position(Vector3::new(1.0, 2.0, 3.0));
    camera.look_at(&Vector3::new(0.0, 0.0, 0.0), &Vector3::new(0.0, 1.0, 0.0));
    camera.initialize().unwrap();

    let uniform = Uniform::new(0.0f32, 1.0);
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..50 {
        let (u, v) = (rng.gen_range(0.0..50.0), rng.gen_range(0.0..50.0));
        let mut scratch = StdRng::seed_from_u64(rng.gen());
        let dof = camera.pixel_to_ray_dof(u, v, &mut scratch, &uniform).unwrap();
        let pinhole = camera.pixel_to_ray(u, v).unwrap();
        assert_relative_eq!(dof.origin, pinhole.origin, epsilon = 1e-12);
        assert_relative_eq!(dof.direction, pinhole.direction, epsilon = 1e-12);
    }
}

#[test]
fn test_depth_of_field_rays_meet_on_focus_plane() {
    init_logging();
    let mut camera = camera(50, 50, 1e-4, 0.05);
    camera.set_f_stop(1.4).unwrap();
    camera.set_depth_of_field(true);
    camera.set_focus_distance(8.0).unwrap();
    camera.initialize().unwrap();

    let pinhole = camera.pixel_to_ray(12.5, 40.5).unwrap();
    let focus_point = pinhole.origin + pinhole.direction * 8.0;

    let uniform = Uniform::new(0.0f32, 1.0);
    let mut rng = StdRng::seed_from_u64(17);
    let mut spread = 0.0f64;
    for _ in 0..100 {
        let ray = camera.pixel_to_ray_dof(12.5, 40.5, &mut rng, &uniform).unwrap();
        spread = spread.max((ray.origin - pinhole.origin).norm());
        // Distance from the focus point to the ray's line
        let to_focus = focus_point - ray.origin;
        let miss = (to_focus - ray.direction * to_focus.dot(&ray.direction)).norm();
        assert!(miss < 1e-5, "ray misses focus point by {miss}");
    }
    assert!(spread > 0.0);
    assert!(spread <= camera.aperture_diameter() / 2.0 + 1e-9);
}
