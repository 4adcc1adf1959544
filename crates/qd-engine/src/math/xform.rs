use glam::{Mat4, Quat, Vec3};

/// Decomposed affine transform: scale, then rotate, then translate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Xform3 {
    pub pos: Vec3,
    pub scale: Vec3,
    pub rot: Quat,
}

impl Xform3 {
    pub const IDENTITY: Self = Self {
        pos: Vec3::ZERO,
        scale: Vec3::ONE,
        rot: Quat::IDENTITY,
    };

    #[inline]
    pub fn from_pos(pos: Vec3) -> Self {
        Self { pos, ..Self::IDENTITY }
    }

    /// Composes `self` (parent) with `rhs` (child).
    ///
    /// Scale is composed per axis, which is exact only while the parent has
    /// no rotation or uniform scale; no shear is represented.
    #[inline]
    pub fn concat(&self, rhs: &Xform3) -> Xform3 {
        Xform3 {
            pos: self.pos + self.rot * (self.scale * rhs.pos),
            scale: self.scale * rhs.scale,
            rot: self.rot * rhs.rot,
        }
    }

    #[inline]
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rot.normalize(), self.pos)
    }

    /// Applies the transform to a point.
    #[inline]
    pub fn apply(&self, p: Vec3) -> Vec3 {
        self.pos + self.rot * (self.scale * p)
    }
}

impl Default for Xform3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<&Xform3> for Mat4 {
    #[inline]
    fn from(x: &Xform3) -> Mat4 {
        x.to_mat4()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn identity_matrix() {
        assert_eq!(Xform3::IDENTITY.to_mat4(), Mat4::IDENTITY);
    }

    #[test]
    fn matrix_matches_apply() {
        let x = Xform3 {
            pos: Vec3::new(3.0, -2.0, 1.0),
            scale: Vec3::new(2.0, 32.0, 1.0),
            rot: Quat::from_rotation_z(FRAC_PI_2),
        };
        let p = Vec3::new(1.0, 1.0, 0.0);
        assert!(approx(x.to_mat4().transform_point3(p), x.apply(p)));
    }

    #[test]
    fn scale_is_applied_before_rotation() {
        let x = Xform3 {
            pos: Vec3::ZERO,
            scale: Vec3::new(2.0, 1.0, 1.0),
            rot: Quat::from_rotation_z(FRAC_PI_2),
        };
        // +X scaled to length 2, then rotated onto +Y.
        assert!(approx(x.apply(Vec3::X), Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn concat_translates_child_in_parent_space() {
        let parent = Xform3 {
            pos: Vec3::new(10.0, 0.0, 0.0),
            scale: Vec3::splat(2.0),
            rot: Quat::IDENTITY,
        };
        let child = Xform3::from_pos(Vec3::new(1.0, 1.0, 0.0));

        let world = parent.concat(&child);
        assert!(approx(world.pos, Vec3::new(12.0, 2.0, 0.0)));
        assert!(approx(world.scale, Vec3::splat(2.0)));

        let p = Vec3::new(0.5, 0.0, 0.0);
        assert!(approx(world.apply(p), parent.apply(child.apply(p))));
    }

    #[test]
    fn concat_with_identity_is_noop() {
        let x = Xform3::from_pos(Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(Xform3::IDENTITY.concat(&x), x);
        assert_eq!(x.concat(&Xform3::IDENTITY), x);
    }
}
