use bytemuck::{Pod, Zeroable};

/// Mesh vertex (48 bytes).
///
/// Field order interleaves the texture coordinate scalars with the vectors so
/// the struct packs without padding:
///
///  offset  0  pos    [f32; 3]   loc 0
///  offset 12  tx     f32        loc 1
///  offset 16  norm   [f32; 3]   loc 2 (not consumed by the mesh shader)
///  offset 28  ty     f32        loc 3
///  offset 32  color  [f32; 4]   loc 4
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vtx {
    pub pos: [f32; 3],
    pub tx: f32,
    pub norm: [f32; 3],
    pub ty: f32,
    pub color: [f32; 4],
}

impl Vtx {
    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        0 => Float32x3, // pos
        1 => Float32,   // tx
        2 => Float32x3, // norm
        3 => Float32,   // ty
        4 => Float32x4  // color
    ];

    #[inline]
    pub const fn new(pos: [f32; 3], uv: [f32; 2], color: [f32; 4]) -> Self {
        Self {
            pos,
            tx: uv[0],
            norm: [0.0; 3],
            ty: uv[1],
            color,
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vtx>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_without_padding() {
        assert_eq!(std::mem::size_of::<Vtx>(), 48);
    }

    #[test]
    fn attribute_offsets_match_fields() {
        let offsets: Vec<(u32, u64)> = Vtx::ATTRS
            .iter()
            .map(|a| (a.shader_location, a.offset))
            .collect();
        assert_eq!(
            offsets,
            vec![
                (0, std::mem::offset_of!(Vtx, pos) as u64),
                (1, std::mem::offset_of!(Vtx, tx) as u64),
                (2, std::mem::offset_of!(Vtx, norm) as u64),
                (3, std::mem::offset_of!(Vtx, ty) as u64),
                (4, std::mem::offset_of!(Vtx, color) as u64),
            ]
        );
    }

    #[test]
    fn layout_steps_per_vertex() {
        let l = Vtx::layout();
        assert_eq!(l.array_stride, 48);
        assert_eq!(l.step_mode, wgpu::VertexStepMode::Vertex);
    }
}
