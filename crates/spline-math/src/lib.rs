pub mod aabb;
pub mod rotation;

pub use glam::{dvec3, DMat4, DVec2, DVec3, DVec4};
pub use aabb::Aabb3;
pub use rotation::{
    angle_signed_on_axis, direction_bisect, rotate_direction_around_axis, z_up_normal,
};

pub type Point3 = DVec3;
pub type Vector3 = DVec3;
/// Linear RGBA color, stored as `(r, g, b, a)`.
pub type Color = DVec4;
