//! Instance records and the texel store that carries them to the GPU.
//!
//! The store is a 2-D Rgba32Float texture used as a generic buffer: each row is
//! one store, each texel one `[f32; 4]` slot. Instance `i` of a batch occupies
//! texels `i * TEXELS_PER_INST .. (i + 1) * TEXELS_PER_INST` of the batch's row:
//!
//!  texel 0..=3  model matrix columns (column-major)
//!  texel 4      RGBA blend multiplier
//!  texel 5      `.x` = texture-array layer, stored as float

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use super::error::{GfxError, Result};

/// One texel of the store.
pub type Texel = [f32; 4];

/// Texels occupied by a single [`MeshInst`].
pub const TEXELS_PER_INST: usize = std::mem::size_of::<MeshInst>() / std::mem::size_of::<Texel>();

/// Per-instance record as laid out in the store.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshInst {
    pub model: [[f32; 4]; 4],
    pub blend: [f32; 4],
    pub tex: [f32; 4],
}

impl MeshInst {
    #[inline]
    pub fn new(model: Mat4, blend: Vec4, layer: u32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            blend: blend.to_array(),
            tex: [layer as f32, 0.0, 0.0, 0.0],
        }
    }

    #[inline]
    pub fn texels(&self) -> &[Texel; TEXELS_PER_INST] {
        bytemuck::cast_ref(self)
    }
}

/// Read access to texels by `(column, row)`.
///
/// Out-of-range reads return zero.
pub trait TexelFetch {
    fn fetch(&self, col: u32, row: u32) -> Vec4;
}

/// CPU image of the store texture.
///
/// Batches are encoded here first, then the touched span of the row is copied
/// to the GPU. The same image backs the reference shading in `gfx::shade`.
#[derive(Debug, Clone)]
pub struct StoreImage {
    dim: u32,
    rows: u32,
    texels: Vec<Texel>,
}

impl StoreImage {
    pub fn new(dim: u32, rows: u32) -> Self {
        Self {
            dim,
            rows,
            texels: vec![[0.0; 4]; dim as usize * rows as usize],
        }
    }

    /// Texels per row.
    #[inline]
    pub fn dim(&self) -> u32 {
        self.dim
    }

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Instances that fit in one row.
    #[inline]
    pub fn insts_per_row(&self) -> usize {
        self.dim as usize / TEXELS_PER_INST
    }

    /// Encodes `insts` at the start of `row` and returns the written texels.
    ///
    /// Texels after the written span keep their previous contents.
    pub fn write_row(&mut self, row: u32, insts: &[MeshInst]) -> Result<&[Texel]> {
        if row >= self.rows {
            return Err(GfxError::InvalidHandle { kind: "store row", hnd: row });
        }
        if insts.len() > self.insts_per_row() {
            return Err(GfxError::SizeMismatch {
                what: "store row instances",
                expected: self.insts_per_row(),
                got: insts.len(),
            });
        }

        let start = row as usize * self.dim as usize;
        let len = insts.len() * TEXELS_PER_INST;
        let dst = &mut self.texels[start..start + len];
        dst.copy_from_slice(bytemuck::cast_slice(insts));
        Ok(dst)
    }

    /// Row `row` as raw texels.
    pub fn row(&self, row: u32) -> Option<&[Texel]> {
        if row >= self.rows {
            return None;
        }
        let start = row as usize * self.dim as usize;
        Some(&self.texels[start..start + self.dim as usize])
    }
}

impl TexelFetch for StoreImage {
    fn fetch(&self, col: u32, row: u32) -> Vec4 {
        if col >= self.dim || row >= self.rows {
            return Vec4::ZERO;
        }
        Vec4::from_array(self.texels[row as usize * self.dim as usize + col as usize])
    }
}
