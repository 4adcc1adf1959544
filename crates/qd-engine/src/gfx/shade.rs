//! CPU evaluation of `shaders/mesh.wgsl`.
//!
//! Each function follows the WGSL entry point of the same stage step for step,
//! so instance encodings and uniform contents can be checked without a GPU.

use glam::{Mat4, Vec2, Vec4};

use super::store::{TEXELS_PER_INST, TexelFetch};
use super::vertex::Vtx;

/// Uniform state visible to one draw.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawUniforms {
    pub proj: Mat4,
    pub view: Mat4,
    pub store: u32,
}

/// Vertex stage outputs.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VertexOut {
    pub clip: Vec4,
    /// Flat (not interpolated).
    pub layer: u32,
    pub uv: Vec2,
    pub color: Vec4,
}

/// Filtered lookup into a texture array.
pub trait LayerSample {
    fn sample(&self, uv: Vec2, layer: u32) -> Vec4;
}

/// Mirrors `vs_main`.
pub fn vertex_stage(u: &DrawUniforms, sbo: &impl TexelFetch, inst: u32, vtx: &Vtx) -> VertexOut {
    let base = inst.wrapping_mul(TEXELS_PER_INST as u32);
    let fetch = |k: u32| sbo.fetch(base.wrapping_add(k), u.store);

    let model = Mat4::from_cols(fetch(0), fetch(1), fetch(2), fetch(3));
    let blend = fetch(4);
    // `u32(f32)` in WGSL truncates toward zero and saturates; `as` does the same.
    let layer = fetch(5).x as u32;

    let pos = Vec4::new(vtx.pos[0], vtx.pos[1], vtx.pos[2], 1.0);

    VertexOut {
        clip: u.proj * u.view * model * pos,
        layer,
        uv: Vec2::new(vtx.tx, vtx.ty),
        color: Vec4::from_array(vtx.color) * blend,
    }
}

/// Mirrors `fs_main`.
pub fn fragment_stage(tbo: &impl LayerSample, frag: &VertexOut) -> Vec4 {
    tbo.sample(frag.uv, frag.layer) * frag.color
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::store::{MeshInst, StoreImage};
    use glam::{UVec2, Vec3};

    use crate::math::{Camera, Proj};

    /// Returns a fixed color per layer, ignoring `uv`.
    struct SolidLayers(Vec<Vec4>);

    impl LayerSample for SolidLayers {
        fn sample(&self, _uv: Vec2, layer: u32) -> Vec4 {
            self.0.get(layer as usize).copied().unwrap_or(Vec4::ZERO)
        }
    }

    fn uniforms(store: u32) -> DrawUniforms {
        let cam = Camera {
            pos: Vec3::new(3.0, 4.0, 10.0),
            at: Vec3::new(3.0, 4.0, 0.0),
            proj: Proj::Ortho { size: UVec2::new(640, 480), near: 0.0, far: 100.0 },
        };
        DrawUniforms { proj: cam.proj(), view: cam.view(), store }
    }

    fn vtx(pos: [f32; 3], color: [f32; 4]) -> Vtx {
        Vtx::new(pos, [0.25, 0.75], color)
    }

    fn approx(a: Vec4, b: Vec4) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn identity_instance_at_origin_is_proj_view_origin() {
        let mut sbo = StoreImage::new(60, 1);
        sbo.write_row(0, &[MeshInst::new(Mat4::IDENTITY, Vec4::ONE, 0)]).unwrap();

        let u = uniforms(0);
        let out = vertex_stage(&u, &sbo, 0, &vtx([0.0; 3], [1.0; 4]));
        assert!(approx(out.clip, u.proj * u.view * Vec4::new(0.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn model_matrix_is_applied_before_view() {
        let model = Mat4::from_translation(Vec3::new(5.0, 6.0, 0.0));
        let mut sbo = StoreImage::new(60, 1);
        sbo.write_row(0, &[MeshInst::new(model, Vec4::ONE, 0)]).unwrap();

        let u = uniforms(0);
        let out = vertex_stage(&u, &sbo, 0, &vtx([1.0, 1.0, 0.0], [1.0; 4]));
        assert!(approx(out.clip, u.proj * u.view * Vec4::new(6.0, 7.0, 0.0, 1.0)));
    }

    #[test]
    fn color_is_vertex_color_times_blend() {
        let mut sbo = StoreImage::new(60, 1);
        sbo.write_row(0, &[MeshInst::new(Mat4::IDENTITY, Vec4::new(2.0, 1.0, 1.0, 1.0), 0)])
            .unwrap();

        let out = vertex_stage(&uniforms(0), &sbo, 0, &vtx([0.0; 3], [0.5, 0.5, 0.5, 1.0]));
        assert_eq!(out.color, Vec4::new(1.0, 0.5, 0.5, 1.0));
    }

    #[test]
    fn uv_passes_through() {
        let mut sbo = StoreImage::new(60, 1);
        sbo.write_row(0, &[MeshInst::new(Mat4::IDENTITY, Vec4::ONE, 0)]).unwrap();

        let out = vertex_stage(&uniforms(0), &sbo, 0, &vtx([0.0; 3], [1.0; 4]));
        assert_eq!(out.uv, Vec2::new(0.25, 0.75));
    }

    #[test]
    fn layer_three_decodes_for_every_instance() {
        let insts = [MeshInst::new(Mat4::IDENTITY, Vec4::ONE, 3); 10];
        let mut sbo = StoreImage::new(60, 1);
        sbo.write_row(0, &insts).unwrap();

        for i in 0..10 {
            let out = vertex_stage(&uniforms(0), &sbo, i, &vtx([0.0; 3], [1.0; 4]));
            assert_eq!(out.layer, 3, "instance {i}");
        }
    }

    #[test]
    fn fractional_layer_truncates() {
        let mut inst = MeshInst::new(Mat4::IDENTITY, Vec4::ONE, 0);
        inst.tex[0] = 4.9;
        let mut sbo = StoreImage::new(60, 1);
        sbo.write_row(0, &[inst]).unwrap();

        let out = vertex_stage(&uniforms(0), &sbo, 0, &vtx([0.0; 3], [1.0; 4]));
        assert_eq!(out.layer, 4);
    }

    #[test]
    fn store_selects_row_without_cross_talk() {
        let a = Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0));
        let b = Mat4::from_scale(Vec3::new(3.0, 3.0, 1.0));
        let mut sbo = StoreImage::new(60, 2);
        sbo.write_row(0, &[MeshInst::new(a, Vec4::ONE, 1)]).unwrap();
        sbo.write_row(1, &[MeshInst::new(b, Vec4::splat(0.5), 2)]).unwrap();

        let v = vtx([2.0, 2.0, 0.0], [1.0; 4]);

        let u0 = uniforms(0);
        let r0 = vertex_stage(&u0, &sbo, 0, &v);
        assert!(approx(r0.clip, u0.proj * u0.view * Vec4::new(102.0, 2.0, 0.0, 1.0)));
        assert_eq!((r0.layer, r0.color), (1, Vec4::ONE));

        let u1 = uniforms(1);
        let r1 = vertex_stage(&u1, &sbo, 0, &v);
        assert!(approx(r1.clip, u1.proj * u1.view * Vec4::new(6.0, 6.0, 0.0, 1.0)));
        assert_eq!((r1.layer, r1.color), (2, Vec4::splat(0.5)));
    }

    #[test]
    fn later_instances_read_their_own_record() {
        let insts = [
            MeshInst::new(Mat4::IDENTITY, Vec4::ONE, 0),
            MeshInst::new(Mat4::from_translation(Vec3::X * 10.0), Vec4::splat(0.25), 7),
        ];
        let mut sbo = StoreImage::new(60, 1);
        sbo.write_row(0, &insts).unwrap();

        let u = uniforms(0);
        let out = vertex_stage(&u, &sbo, 1, &vtx([0.0; 3], [1.0; 4]));
        assert!(approx(out.clip, u.proj * u.view * Vec4::new(10.0, 0.0, 0.0, 1.0)));
        assert_eq!(out.layer, 7);
        assert_eq!(out.color, Vec4::splat(0.25));
    }

    #[test]
    fn out_of_range_instance_reads_zero_texels() {
        // 12 texels = room for two records; instance 5 lies past the row end.
        let mut sbo = StoreImage::new(12, 1);
        sbo.write_row(0, &[MeshInst::new(Mat4::IDENTITY, Vec4::ONE, 2); 2]).unwrap();

        let out = vertex_stage(&uniforms(0), &sbo, 5, &vtx([1.0, 2.0, 3.0], [1.0; 4]));
        assert_eq!(out.clip, Vec4::ZERO);
        assert_eq!(out.color, Vec4::ZERO);
        assert_eq!(out.layer, 0);
    }

    #[test]
    fn fragment_is_sample_times_color_unclamped() {
        let tbo = SolidLayers(vec![Vec4::ONE, Vec4::new(0.8, 0.4, 0.2, 0.5)]);
        let frag = VertexOut {
            clip: Vec4::ZERO,
            layer: 1,
            uv: Vec2::new(0.5, 0.5),
            color: Vec4::new(2.0, 0.5, 3.0, 1.0),
        };
        assert!(approx(fragment_stage(&tbo, &frag), Vec4::new(1.6, 0.2, 0.6, 0.5)));
    }

    #[test]
    fn fragment_uses_flat_layer() {
        let tbo = SolidLayers(vec![Vec4::new(1.0, 0.0, 0.0, 1.0), Vec4::new(0.0, 1.0, 0.0, 1.0)]);
        let mut frag = VertexOut {
            clip: Vec4::ZERO,
            layer: 0,
            uv: Vec2::ZERO,
            color: Vec4::ONE,
        };
        assert_eq!(fragment_stage(&tbo, &frag), Vec4::new(1.0, 0.0, 0.0, 1.0));
        frag.layer = 1;
        assert_eq!(fragment_stage(&tbo, &frag), Vec4::new(0.0, 1.0, 0.0, 1.0));
    }
}
