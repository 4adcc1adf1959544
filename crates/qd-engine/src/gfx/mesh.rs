use std::ops::Range;

use crate::mem::{BuddyAlloc, Handles};

use super::error::{GfxError, Result};
use super::vertex::Vtx;

/// Smallest vertex/index block handed out by the buddy allocators.
const MIN_BLOCK: usize = 16;

/// Handle to a mesh allocated with [`Gfx::mesh_alloc`](super::Gfx::mesh_alloc).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshHandle(pub(crate) u32);

/// Vertex and index ranges owned by one mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct MeshSpan {
    /// Reserved vertex block (may exceed `vtx_len`).
    pub vtx_block: Range<usize>,
    pub vtx_len: usize,
    /// Reserved index block (may exceed `idx_len`).
    pub idx_block: Range<usize>,
    pub idx_len: usize,
}

impl MeshSpan {
    /// Index range to pass to `draw_indexed`.
    #[inline]
    pub fn indices(&self) -> Range<u32> {
        let start = self.idx_block.start as u32;
        start..start + self.idx_len as u32
    }

    /// `base_vertex` for `draw_indexed`; mesh indices are relative to the first vertex.
    #[inline]
    pub fn base_vertex(&self) -> i32 {
        self.vtx_block.start as i32
    }
}

/// CPU bookkeeping for the shared vertex and index buffers.
#[derive(Debug)]
pub(super) struct MeshTable {
    vtx_alloc: BuddyAlloc,
    idx_alloc: BuddyAlloc,
    spans: Handles<MeshSpan>,
}

impl MeshTable {
    pub fn new(vtx_capacity: usize, idx_capacity: usize) -> Self {
        Self {
            vtx_alloc: BuddyAlloc::new(vtx_capacity, MIN_BLOCK),
            idx_alloc: BuddyAlloc::new(idx_capacity, MIN_BLOCK),
            spans: Handles::new(),
        }
    }

    pub fn vtx_capacity(&self) -> usize {
        self.vtx_alloc.capacity()
    }

    pub fn idx_capacity(&self) -> usize {
        self.idx_alloc.capacity()
    }

    pub fn alloc(&mut self, vtx_len: usize, idx_len: usize) -> Result<MeshHandle> {
        let vtx_block = self
            .vtx_alloc
            .alloc(vtx_len)
            .ok_or(GfxError::OutOfVertexSpace { requested: vtx_len })?;

        let Some(idx_block) = self.idx_alloc.alloc(idx_len) else {
            self.vtx_alloc.free(vtx_block);
            return Err(GfxError::OutOfIndexSpace { requested: idx_len });
        };

        let hnd = self.spans.track(MeshSpan {
            vtx_block,
            vtx_len,
            idx_block,
            idx_len,
        });
        Ok(MeshHandle(hnd as u32))
    }

    pub fn free(&mut self, hnd: MeshHandle) -> Result<()> {
        let span = self
            .spans
            .untrack(hnd.0 as usize)
            .ok_or(GfxError::InvalidHandle { kind: "mesh", hnd: hnd.0 })?;
        self.vtx_alloc.free(span.vtx_block);
        self.idx_alloc.free(span.idx_block);
        Ok(())
    }

    pub fn get(&self, hnd: MeshHandle) -> Result<&MeshSpan> {
        self.spans
            .get(hnd.0 as usize)
            .ok_or(GfxError::InvalidHandle { kind: "mesh", hnd: hnd.0 })
    }

    /// Looks up `hnd` and checks upload lengths against its allocation.
    pub fn check_write(&self, hnd: MeshHandle, vtx_len: usize, idx_len: usize) -> Result<&MeshSpan> {
        let span = self.get(hnd)?;
        if vtx_len != span.vtx_len {
            return Err(GfxError::SizeMismatch {
                what: "mesh vertices",
                expected: span.vtx_len,
                got: vtx_len,
            });
        }
        if idx_len != span.idx_len {
            return Err(GfxError::SizeMismatch {
                what: "mesh indices",
                expected: span.idx_len,
                got: idx_len,
            });
        }
        Ok(span)
    }
}

/// Shared vertex + index buffers with their allocation table.
pub(super) struct MeshPool {
    pub vbo: wgpu::Buffer,
    pub ibo: wgpu::Buffer,
    pub table: MeshTable,
}

impl MeshPool {
    pub fn new(device: &wgpu::Device, vtx_capacity: usize, idx_capacity: usize) -> Self {
        let table = MeshTable::new(vtx_capacity, idx_capacity);

        let vbo_size = (table.vtx_capacity() * std::mem::size_of::<Vtx>()) as u64;
        log::debug!("VBO: {} vertices ({} KiB)", table.vtx_capacity(), vbo_size / 1024);
        let vbo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("qd mesh vbo"),
            size: vbo_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let ibo_size = (table.idx_capacity() * std::mem::size_of::<u32>()) as u64;
        log::debug!("IBO: {} indices ({} KiB)", table.idx_capacity(), ibo_size / 1024);
        let ibo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("qd mesh ibo"),
            size: ibo_size,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self { vbo, ibo, table }
    }

    pub fn write(&self, queue: &wgpu::Queue, hnd: MeshHandle, vtxs: &[Vtx], idxs: &[u32]) -> Result<()> {
        let span = self.table.check_write(hnd, vtxs.len(), idxs.len())?;
        log::trace!(
            "writing mesh {} ({} vertices @ {}, {} indices @ {})",
            hnd.0,
            vtxs.len(),
            span.vtx_block.start,
            idxs.len(),
            span.idx_block.start
        );

        if !vtxs.is_empty() {
            let offset = (span.vtx_block.start * std::mem::size_of::<Vtx>()) as u64;
            queue.write_buffer(&self.vbo, offset, bytemuck::cast_slice(vtxs));
        }
        if !idxs.is_empty() {
            let offset = (span.idx_block.start * std::mem::size_of::<u32>()) as u64;
            queue.write_buffer(&self.ibo, offset, bytemuck::cast_slice(idxs));
        }
        Ok(())
    }
}
