//! Solid angles of spherical polygons.
//!
//! Vertices are unit vectors. A triangle's area on the unit sphere (its solid
//! angle in steradians) follows Girard's theorem: the sum of its interior
//! angles minus pi. Interior angles are measured between great-circle tangents
//! at each vertex. All arithmetic is `f64`; at megapixel resolutions a pixel's
//! spherical excess is around 1e-7 and single precision cannot resolve it.

use nalgebra::Vector3;
use std::f64::consts::PI;

/// Unit tangent at `p0` of the great circle running from `p0` towards `p1`.
pub fn tangent(p0: &Vector3<f64>, p1: &Vector3<f64>) -> Vector3<f64> {
    p0.cross(&(p1 - p0)).cross(p0).normalize()
}

fn interior_angle(vertex: &Vector3<f64>, a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let ta = tangent(vertex, a);
    let tb = tangent(vertex, b);
    ta.dot(&tb).clamp(-1.0, 1.0).acos()
}

/// Solid angle of the spherical triangle `(a, b, c)`.
pub fn triangle_solid_angle(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    let excess = interior_angle(a, b, c) + interior_angle(b, c, a) + interior_angle(c, a, b) - PI;
    excess.max(0.0)
}

/// Solid angle of a convex spherical quadrilateral given in winding order,
/// split into triangles `(0, 1, 2)` and `(0, 2, 3)`.
pub fn quad_solid_angle(corners: &[Vector3<f64>; 4]) -> f64 {
    triangle_solid_angle(&corners[0], &corners[1], &corners[2])
        + triangle_solid_angle(&corners[0], &corners[2], &corners[3])
}
