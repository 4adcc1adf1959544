use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Camera block (`Camera` in `mesh.wgsl`), one slot per pass.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct CameraUniform {
    pub proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

impl CameraUniform {
    #[inline]
    pub fn new(proj: Mat4, view: Mat4) -> Self {
        Self {
            proj: proj.to_cols_array_2d(),
            view: view.to_cols_array_2d(),
        }
    }
}

/// Store selector (`Store` in `mesh.wgsl`), one slot per batch.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct StoreUniform {
    pub row: u32,
    pub _pad: [u32; 3], // 16-byte alignment
}

/// Distance between consecutive slots in the dynamic-offset uniform buffers.
///
/// Matches the default `min_uniform_buffer_offset_alignment`.
pub(super) const UNIFORM_SLOT_STRIDE: u64 = 256;

/// Dynamic offset of uniform slot `slot`.
#[inline]
pub(super) fn slot_offset(slot: u32) -> u64 {
    u64::from(slot) * UNIFORM_SLOT_STRIDE
}

pub(super) fn min_binding_size<T>() -> Option<std::num::NonZeroU64> {
    std::num::NonZeroU64::new(std::mem::size_of::<T>() as u64)
}
