use super::error::{GfxError, Result};
use super::store::TEXELS_PER_INST;
use super::uniforms::UNIFORM_SLOT_STRIDE;
use super::vertex::Vtx;

/// Capacity configuration for [`Gfx`](super::Gfx).
///
/// All sizes are in elements (vertices, indices, texels, layers, rows), not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Vertices in the shared vertex buffer (rounded up to a power of two).
    pub vtx_capacity: usize,
    /// Indices in the shared index buffer (rounded up to a power of two).
    pub idx_capacity: usize,
    /// Width and height of each texture-array layer.
    pub tex_dim: u32,
    /// Number of texture-array layers.
    pub tex_count: u32,
    /// Texels per store row.
    pub store_dim: u32,
    /// Number of store rows; bounds the instanced draws issued per frame.
    pub store_count: u32,
    /// Camera slots; bounds the passes opened per frame.
    pub pass_count: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vtx_capacity: 1 << 16,
            idx_capacity: 1 << 18,
            tex_dim: 256,
            tex_count: 64,
            store_dim: 2048,
            store_count: 512,
            pass_count: 16,
        }
    }
}

impl Settings {
    /// Checks the settings against device limits.
    pub fn validate(&self, limits: &wgpu::Limits) -> Result<()> {
        let fail = |msg: String| Err(GfxError::InvalidSettings(msg));

        if self.vtx_capacity == 0 || self.idx_capacity == 0 {
            return fail("vertex and index capacity must be non-zero".into());
        }
        if self.tex_dim == 0 || self.tex_count == 0 {
            return fail("texture dimension and count must be non-zero".into());
        }
        if (self.store_dim as usize) < TEXELS_PER_INST || self.store_count == 0 {
            return fail(format!(
                "store rows must hold at least one instance ({TEXELS_PER_INST} texels)"
            ));
        }
        if self.pass_count == 0 {
            return fail("pass count must be non-zero".into());
        }
        if self.tex_dim > limits.max_texture_dimension_2d
            || self.store_dim > limits.max_texture_dimension_2d
            || self.store_count > limits.max_texture_dimension_2d
        {
            return fail(format!(
                "texture dimensions exceed device limit {}",
                limits.max_texture_dimension_2d
            ));
        }
        if self.tex_count > limits.max_texture_array_layers {
            return fail(format!(
                "{} texture layers exceed device limit {}",
                self.tex_count, limits.max_texture_array_layers
            ));
        }
        // Layers are stored as f32 in the instance record; keep them exact.
        if self.tex_count > 1 << f32::MANTISSA_DIGITS {
            return fail("texture layer count not exactly representable as f32".into());
        }
        if u64::from(limits.min_uniform_buffer_offset_alignment) > UNIFORM_SLOT_STRIDE {
            return fail(format!(
                "uniform offset alignment {} exceeds uniform slot stride",
                limits.min_uniform_buffer_offset_alignment
            ));
        }

        let vbo_bytes = self.vtx_capacity.next_power_of_two() * std::mem::size_of::<Vtx>();
        let ibo_bytes = self.idx_capacity.next_power_of_two() * std::mem::size_of::<u32>();
        let ubo_bytes = UNIFORM_SLOT_STRIDE * u64::from(self.store_count.max(self.pass_count));
        if vbo_bytes.max(ibo_bytes) as u64 > limits.max_buffer_size
            || ubo_bytes > limits.max_buffer_size
        {
            return fail(format!("buffers exceed device limit {} bytes", limits.max_buffer_size));
        }
        Ok(())
    }

    /// Instances that fit in one store row.
    #[inline]
    pub fn insts_per_store(&self) -> usize {
        self.store_dim as usize / TEXELS_PER_INST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fit_default_limits() {
        Settings::default().validate(&wgpu::Limits::default()).unwrap();
    }

    #[test]
    fn defaults_fit_downlevel_limits() {
        Settings::default()
            .validate(&wgpu::Limits::downlevel_webgl2_defaults())
            .unwrap();
    }

    #[test]
    fn rejects_too_many_layers() {
        let s = Settings { tex_count: 4096, ..Settings::default() };
        assert!(matches!(
            s.validate(&wgpu::Limits::default()),
            Err(GfxError::InvalidSettings(_))
        ));
    }

    #[test]
    fn rejects_store_narrower_than_one_record() {
        let s = Settings { store_dim: 5, ..Settings::default() };
        assert!(s.validate(&wgpu::Limits::default()).is_err());
    }

    #[test]
    fn rejects_zero_capacity() {
        let s = Settings { vtx_capacity: 0, ..Settings::default() };
        assert!(s.validate(&wgpu::Limits::default()).is_err());
    }

    #[test]
    fn rejects_zero_passes() {
        let s = Settings { pass_count: 0, ..Settings::default() };
        assert!(matches!(
            s.validate(&wgpu::Limits::default()),
            Err(GfxError::InvalidSettings(_))
        ));
    }

    #[test]
    fn insts_per_store_floors() {
        let s = Settings { store_dim: 2048, ..Settings::default() };
        assert_eq!(s.insts_per_store(), 341);
    }
}
