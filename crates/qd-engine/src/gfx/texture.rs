use crate::mem::BitAlloc;

use super::error::{GfxError, Result};

/// Handle to a texture-array layer allocated with [`Gfx::tex_alloc`](super::Gfx::tex_alloc).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TexHandle(pub(crate) u32);

impl TexHandle {
    /// Texture-array layer addressed by this handle.
    #[inline]
    pub fn layer(self) -> u32 {
        self.0
    }
}

/// Square Rgba8Unorm texture array with per-layer allocation.
pub(super) struct TexArray {
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    dim: u32,
    layers: BitAlloc,
}

impl TexArray {
    pub fn new(device: &wgpu::Device, dim: u32, count: u32) -> Self {
        let bytes = u64::from(dim) * u64::from(dim) * u64::from(count) * 4;
        log::debug!("TBO: {count} layers of {dim}x{dim} ({} MiB)", bytes / 1024 / 1024);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("qd texture array"),
            size: wgpu::Extent3d {
                width: dim,
                height: dim,
                depth_or_array_layers: count,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("qd texture array view"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        Self {
            texture,
            view,
            dim,
            layers: BitAlloc::new(count as usize),
        }
    }

    pub fn alloc(&mut self) -> Result<TexHandle> {
        let layer = self.layers.alloc().ok_or(GfxError::OutOfTextureSpace)?;
        Ok(TexHandle(layer as u32))
    }

    pub fn free(&mut self, hnd: TexHandle) -> Result<()> {
        self.check_live(hnd)?;
        self.layers.free(hnd.0 as usize);
        Ok(())
    }

    /// Uploads a full layer of packed RGBA8 texels (`0xAABBGGRR`, little-endian).
    pub fn write(&self, queue: &wgpu::Queue, hnd: TexHandle, texels: &[u32]) -> Result<()> {
        self.check_live(hnd)?;
        check_texel_count(self.dim, texels.len())?;
        log::trace!("writing texture layer {}", hnd.0);

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: 0, y: 0, z: hnd.0 },
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(texels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.dim * 4),
                rows_per_image: Some(self.dim),
            },
            wgpu::Extent3d {
                width: self.dim,
                height: self.dim,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn check_live(&self, hnd: TexHandle) -> Result<()> {
        if self.layers.is_set(hnd.0 as usize) {
            Ok(())
        } else {
            Err(GfxError::InvalidHandle { kind: "texture", hnd: hnd.0 })
        }
    }
}

/// A layer upload must cover the whole `dim × dim` layer.
fn check_texel_count(dim: u32, got: usize) -> Result<()> {
    let expected = dim as usize * dim as usize;
    if got == expected {
        Ok(())
    } else {
        Err(GfxError::SizeMismatch {
            what: "texture texels",
            expected,
            got,
        })
    }
}

/// Sampler used for the texture array: bilinear, clamped at layer edges.
pub(super) fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("qd texture sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_layer_is_accepted() {
        assert!(check_texel_count(256, 256 * 256).is_ok());
    }

    #[test]
    fn short_or_long_layer_is_rejected() {
        assert_eq!(
            check_texel_count(4, 15),
            Err(GfxError::SizeMismatch { what: "texture texels", expected: 16, got: 15 })
        );
        assert!(check_texel_count(4, 17).is_err());
    }

    #[test]
    fn handle_exposes_layer() {
        assert_eq!(TexHandle(9).layer(), 9);
    }
}
