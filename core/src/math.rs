//! Math type aliases and helper functions.
//!
//! Scene transforms use single-precision vectors. Rotations are Euler angles
//! in radians stored in a [`Vec3`] and are never normalized.

pub use nalgebra;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// Shorthand constructor for [`Vec3`].
#[inline]
pub fn vec3(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z)
}

/// Returns `true` if every component is finite (no NaN or infinity).
pub fn is_finite_vec3(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}
