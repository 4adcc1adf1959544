//! Transform and camera math.
//!
//! Conventions:
//! - right-handed world space, +Y up
//! - matrices are column-major (`glam`), clip depth is `0..1` (wgpu)

mod camera;
mod xform;

pub use camera::{Camera, Proj};
pub use xform::Xform3;

pub use glam::{Mat4, Quat, UVec2, Vec2, Vec3, Vec4};
