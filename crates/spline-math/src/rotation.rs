//! Direction and rotation helpers shared by tangent and normal evaluation.

use std::f64::consts::PI;

use spline_core::Tolerance;

use crate::{DVec3, Point3, Vector3};

/// Normalized bisector of the incoming and outgoing edge directions at `middle`.
pub fn direction_bisect(prev: Point3, middle: Point3, next: Point3) -> Vector3 {
    let dir_prev = (middle - prev).normalize_or_zero();
    let dir_next = (next - middle).normalize_or_zero();
    (dir_prev + dir_next).normalize_or_zero()
}

/// Rotate the unit vector `direction` around the unit `axis` by `angle` radians.
pub fn rotate_direction_around_axis(direction: Vector3, axis: Vector3, angle: f64) -> Vector3 {
    let axis_scaled = axis * direction.dot(axis);
    let diff = direction - axis_scaled;
    let cross = axis.cross(diff);
    axis_scaled + diff * angle.cos() + cross * angle.sin()
}

/// Angle in `[0, 2*PI)` from `v1` to `v2`, both projected onto the plane
/// perpendicular to `axis`, measured counter-clockwise around `axis`.
pub fn angle_signed_on_axis(v1: Vector3, v2: Vector3, axis: Vector3) -> f64 {
    let v1_proj = v1 - axis * v1.dot(axis);
    let v2_proj = v2 - axis * v2.dot(axis);
    if v1_proj.length_squared() == 0.0 || v2_proj.length_squared() == 0.0 {
        return 0.0;
    }
    let angle = v1_proj.angle_between(v2_proj);
    if v1_proj.cross(v2_proj).dot(axis) < 0.0 {
        2.0 * PI - angle
    } else {
        angle
    }
}

/// A normal perpendicular to `tangent` that lies in the XY plane.
///
/// Falls back to +X when the tangent is (nearly) vertical.
pub fn z_up_normal(tangent: Vector3, tolerance: Tolerance) -> Vector3 {
    if tolerance.is_vertical(tangent.x, tangent.y) {
        DVec3::X
    } else {
        DVec3::new(tangent.y, -tangent.x, 0.0).normalize()
    }
}
