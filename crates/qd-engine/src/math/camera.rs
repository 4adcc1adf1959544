use glam::{Mat4, UVec2, Vec3};

/// Projection model.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Proj {
    /// Pixel-space orthographic projection.
    ///
    /// Maps `0..size.x` and `0..size.y` onto the viewport, origin bottom-left.
    Ortho { size: UVec2, near: f32, far: f32 },

    /// Perspective projection. `fov_y` is in radians.
    Perspective {
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },
}

impl Proj {
    pub fn to_mat4(&self) -> Mat4 {
        match *self {
            Proj::Ortho { size, near, far } => {
                let size = size.max(UVec2::ONE).as_vec2();
                Mat4::orthographic_rh(0.0, size.x, 0.0, size.y, near, far)
            }
            Proj::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y, aspect.max(f32::EPSILON), near, far),
        }
    }
}

/// Eye position, look-at target and projection.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    pub pos: Vec3,
    pub at: Vec3,
    pub proj: Proj,
}

impl Camera {
    /// World-to-view matrix (+Y up).
    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.pos, self.at, Vec3::Y)
    }

    #[inline]
    pub fn proj(&self) -> Mat4 {
        self.proj.to_mat4()
    }
}
