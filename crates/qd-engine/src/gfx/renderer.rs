use glam::UVec2;

use crate::math::{Camera, Xform3};
use crate::render::{RenderCtx, RenderTarget};
use crate::scene::Drawable;

use super::batch::Batches;
use super::error::Result;
use super::mesh::{MeshHandle, MeshPool};
use super::settings::Settings;
use super::shader::{create_mesh_module, FS_ENTRY, VS_ENTRY};
use super::store::{MeshInst, StoreImage, TEXELS_PER_INST};
use super::texture::{create_sampler, TexArray, TexHandle};
use super::uniforms::{
    min_binding_size, slot_offset, CameraUniform, StoreUniform, UNIFORM_SLOT_STRIDE,
};
use super::vertex::Vtx;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Instanced mesh renderer.
///
/// Owns the shared vertex/index buffers, the texture array, the store texture and
/// the pipeline. Meshes and texture layers are allocated up front; each frame
/// calls [`begin_frame`](Gfx::begin_frame), then opens one or more [`Pass`]es,
/// feeds them drawables and drops them to record the draws.
///
/// Uploads are queued writes that all land before the frame is submitted, so
/// the passes of one frame share the store rows and camera slots between them.
pub struct Gfx {
    settings: Settings,

    meshes: MeshPool,
    textures: TexArray,
    _sampler: wgpu::Sampler,

    store_tex: wgpu::Texture,
    store: StoreImage,

    camera_ubo: wgpu::Buffer,
    store_ubo: wgpu::Buffer,

    frame_bgl: wgpu::BindGroupLayout,
    store_bgl: wgpu::BindGroupLayout,
    frame_bind_group: wgpu::BindGroup,
    store_bind_group: wgpu::BindGroup,

    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,

    depth: Option<(UVec2, wgpu::TextureView)>,

    batches: Batches,
    /// First store row not yet used this frame.
    next_row: u32,
    /// First camera slot not yet used this frame.
    next_pass: u32,
    warned_store_overflow: bool,
    warned_pass_overflow: bool,
}

/// One instanced draw, resolved at flush time.
#[derive(Debug, Clone, PartialEq)]
struct BatchDraw {
    row: u32,
    indices: std::ops::Range<u32>,
    base_vertex: i32,
    instances: u32,
}

impl Gfx {
    /// Creates all GPU resources described by `settings`.
    ///
    /// Fails with [`GfxError::InvalidSettings`](super::GfxError::InvalidSettings)
    /// when the settings exceed the device limits.
    pub fn new(ctx: &RenderCtx<'_>, settings: Settings) -> Result<Self> {
        settings.validate(&ctx.device.limits())?;
        let device = ctx.device;

        let meshes = MeshPool::new(device, settings.vtx_capacity, settings.idx_capacity);
        let textures = TexArray::new(device, settings.tex_dim, settings.tex_count);
        let sampler = create_sampler(device);

        log::debug!(
            "SBO: {} stores of {} texels ({} instances each)",
            settings.store_count,
            settings.store_dim,
            settings.insts_per_store()
        );
        let store_tex = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("qd store texture"),
            size: wgpu::Extent3d {
                width: settings.store_dim,
                height: settings.store_count,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba32Float,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let store_view = store_tex.create_view(&wgpu::TextureViewDescriptor::default());
        let store = StoreImage::new(settings.store_dim, settings.store_count);

        let camera_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("qd camera ubo"),
            size: UNIFORM_SLOT_STRIDE * u64::from(settings.pass_count),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let store_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("qd store ubo"),
            size: UNIFORM_SLOT_STRIDE * u64::from(settings.store_count),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("qd mesh frame bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: min_binding_size::<CameraUniform>(),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let store_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("qd mesh store bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: min_binding_size::<StoreUniform>(),
                },
                count: None,
            }],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("qd mesh frame bind group"),
            layout: &frame_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &camera_ubo,
                        offset: 0,
                        size: min_binding_size::<CameraUniform>(),
                    }),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&store_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&textures.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let store_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("qd mesh store bind group"),
            layout: &store_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &store_ubo,
                    offset: 0,
                    size: min_binding_size::<StoreUniform>(),
                }),
            }],
        });

        Ok(Self {
            settings,
            meshes,
            textures,
            _sampler: sampler,
            store_tex,
            store,
            camera_ubo,
            store_ubo,
            frame_bgl,
            store_bgl,
            frame_bind_group,
            store_bind_group,
            pipeline_format: None,
            pipeline: None,
            depth: None,
            batches: Batches::default(),
            next_row: 0,
            next_pass: 0,
            warned_store_overflow: false,
            warned_pass_overflow: false,
        })
    }

    #[inline]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// CPU mirror of the store texture as of the last flushed pass.
    ///
    /// Rows written earlier in the same frame are kept.
    #[inline]
    pub fn store(&self) -> &StoreImage {
        &self.store
    }

    /// Reserves space for a mesh of `vtx_len` vertices and `idx_len` indices.
    pub fn mesh_alloc(&mut self, vtx_len: usize, idx_len: usize) -> Result<MeshHandle> {
        let hnd = self.meshes.table.alloc(vtx_len, idx_len)?;
        log::debug!("allocated mesh {} ({vtx_len} vertices, {idx_len} indices)", hnd.0);
        Ok(hnd)
    }

    /// Uploads mesh data. Indices are relative to the mesh's first vertex.
    pub fn mesh_write(
        &self,
        ctx: &RenderCtx<'_>,
        hnd: MeshHandle,
        vtxs: &[Vtx],
        idxs: &[u32],
    ) -> Result<()> {
        self.meshes.write(ctx.queue, hnd, vtxs, idxs)
    }

    pub fn mesh_free(&mut self, hnd: MeshHandle) -> Result<()> {
        self.meshes.table.free(hnd)?;
        log::debug!("freed mesh {}", hnd.0);
        Ok(())
    }

    /// Reserves one texture-array layer.
    pub fn tex_alloc(&mut self) -> Result<TexHandle> {
        let hnd = self.textures.alloc()?;
        log::debug!("allocated texture layer {}", hnd.layer());
        Ok(hnd)
    }

    /// Uploads a full layer of `tex_dim * tex_dim` packed RGBA8 texels.
    pub fn tex_write(&self, ctx: &RenderCtx<'_>, hnd: TexHandle, texels: &[u32]) -> Result<()> {
        self.textures.write(ctx.queue, hnd, texels)
    }

    pub fn tex_free(&mut self, hnd: TexHandle) -> Result<()> {
        self.textures.free(hnd)?;
        log::debug!("freed texture layer {}", hnd.layer());
        Ok(())
    }

    /// Starts a new frame: store rows and camera slots are free again.
    ///
    /// Call once per frame, before the first [`pass`](Self::pass), and only
    /// after the previous frame's commands were submitted.
    pub fn begin_frame(&mut self) {
        self.next_row = 0;
        self.next_pass = 0;
    }

    /// Opens a frame pass drawing into `target` as seen from `camera`.
    ///
    /// Draws are collected by [`Pass::draw`] and recorded when the pass is
    /// dropped. Each pass takes one camera slot; once `pass_count` passes were
    /// opened this frame, further passes only clear.
    pub fn pass<'a, 't>(
        &'a mut self,
        ctx: &'a RenderCtx<'a>,
        target: &'a mut RenderTarget<'t>,
        camera: &Camera,
    ) -> Pass<'a, 't> {
        self.ensure_pipeline(ctx);
        self.ensure_depth(ctx);

        let camera_slot = self.take_camera_slot();
        if let Some(slot) = camera_slot {
            let u = CameraUniform::new(camera.proj(), camera.view());
            ctx.queue
                .write_buffer(&self.camera_ubo, slot_offset(slot), bytemuck::bytes_of(&u));
        }

        Pass {
            gfx: self,
            ctx,
            target,
            camera_slot,
            clear: None,
        }
    }

    fn take_camera_slot(&mut self) -> Option<u32> {
        if self.next_pass < self.settings.pass_count {
            let slot = self.next_pass;
            self.next_pass += 1;
            return Some(slot);
        }
        if !self.warned_pass_overflow {
            log::warn!(
                "more than {} passes this frame; extra passes draw nothing (missing begin_frame?)",
                self.settings.pass_count
            );
            self.warned_pass_overflow = true;
        }
        None
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }
        log::debug!("building mesh pipeline for {:?}", ctx.surface_format);

        let shader = create_mesh_module(ctx.device);

        let pipeline_layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("qd mesh pipeline layout"),
            bind_group_layouts: &[&self.frame_bgl, &self.store_bgl],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("qd mesh pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some(VS_ENTRY),
                compilation_options: Default::default(),
                buffers: &[Vtx::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some(FS_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
    }

    fn ensure_depth(&mut self, ctx: &RenderCtx<'_>) {
        let size = ctx.surface_size.max(UVec2::ONE);
        if matches!(&self.depth, Some((s, _)) if *s == size) {
            return;
        }
        log::debug!("creating {}x{} depth target", size.x, size.y);

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("qd depth texture"),
            size: wgpu::Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.depth = Some((size, view));
    }

    /// Encodes every pending batch into the store mirror and resolves its draws.
    ///
    /// Each chunk of at most `insts_per_store` instances gets the next free
    /// store row of the frame, so queued writes never overwrite each other.
    fn encode_batches(&mut self) -> Vec<BatchDraw> {
        let table = &self.meshes.table;
        self.batches.retain_live(|hnd| table.get(hnd).is_ok());

        let rows = self.next_row..self.store.rows();
        let (chunks, dropped) = self.batches.plan(self.store.insts_per_row(), rows);
        let mut draws = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            self.next_row = chunk.row + 1;
            let Ok(span) = table.get(chunk.hnd) else { continue };
            if let Err(e) = self.store.write_row(chunk.row, chunk.insts) {
                log::error!("store encode failed: {e}");
                continue;
            }
            log::trace!("store row {}: mesh {} x{}", chunk.row, chunk.hnd.0, chunk.insts.len());

            draws.push(BatchDraw {
                row: chunk.row,
                indices: span.indices(),
                base_vertex: span.base_vertex(),
                instances: chunk.insts.len() as u32,
            });
        }

        if dropped > 0 && !self.warned_store_overflow {
            log::warn!(
                "store full ({} rows across this frame's passes); dropped {dropped} instances",
                self.store.rows()
            );
            self.warned_store_overflow = true;
        }

        self.batches.clear();
        draws
    }

    /// Uploads the store rows and store-uniform slots used by `draws`.
    fn upload_rows(&self, queue: &wgpu::Queue, draws: &[BatchDraw]) {
        for d in draws {
            let len = d.instances as usize * TEXELS_PER_INST;
            let Some(texels) = self.store.row(d.row).and_then(|r| r.get(..len)) else {
                continue;
            };

            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &self.store_tex,
                    mip_level: 0,
                    origin: wgpu::Origin3d { x: 0, y: d.row, z: 0 },
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(texels),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(std::mem::size_of_val(texels) as u32),
                    rows_per_image: None,
                },
                wgpu::Extent3d {
                    width: texels.len() as u32,
                    height: 1,
                    depth_or_array_layers: 1,
                },
            );

            let u = StoreUniform { row: d.row, _pad: [0; 3] };
            queue.write_buffer(&self.store_ubo, slot_offset(d.row), bytemuck::bytes_of(&u));
        }
    }
}

/// A frame pass opened by [`Gfx::pass`].
///
/// Dropping the pass uploads the collected instances and records the draws.
pub struct Pass<'a, 't> {
    gfx: &'a mut Gfx,
    ctx: &'a RenderCtx<'a>,
    target: &'a mut RenderTarget<'t>,
    /// `None` once the frame ran out of camera slots.
    camera_slot: Option<u32>,
    clear: Option<wgpu::Color>,
}

impl Pass<'_, '_> {
    /// Clears color to black and depth to 1.0 before drawing.
    ///
    /// Without a clear, the pass loads the previous color and depth contents.
    pub fn clear_all(&mut self) {
        self.clear = Some(wgpu::Color::BLACK);
    }

    /// Like [`clear_all`](Self::clear_all) with an explicit clear color.
    pub fn clear_to(&mut self, color: wgpu::Color) {
        self.clear = Some(color);
    }

    /// Collects mesh instances from `(world transform, drawable)` pairs.
    pub fn draw<'b, I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (&'b Xform3, &'b Drawable)>,
    {
        for (world, draw) in iter {
            match draw {
                Drawable::None => {}
                Drawable::Mesh { hnd, tex, blend } => {
                    let inst = MeshInst::new(world.to_mat4(), *blend, tex.layer());
                    self.gfx.batches.push(*hnd, inst);
                }
            }
        }
    }

    fn flush(&mut self) {
        let draws = match self.camera_slot {
            Some(_) => self.gfx.encode_batches(),
            None => {
                self.gfx.batches.clear();
                Vec::new()
            }
        };
        self.gfx.upload_rows(self.ctx.queue, &draws);
        if draws.is_empty() && self.clear.is_none() {
            return;
        }

        let gfx = &*self.gfx;
        let Some(pipeline) = gfx.pipeline.as_ref() else { return };
        let Some((_, depth_view)) = gfx.depth.as_ref() else { return };

        let (color_load, depth_load) = match self.clear {
            Some(c) => (wgpu::LoadOp::Clear(c), wgpu::LoadOp::Clear(1.0)),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        let mut rpass = self.target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("qd mesh pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: color_load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let Some(slot) = self.camera_slot else { return };
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &gfx.frame_bind_group, &[slot_offset(slot) as u32]);
        rpass.set_vertex_buffer(0, gfx.meshes.vbo.slice(..));
        rpass.set_index_buffer(gfx.meshes.ibo.slice(..), wgpu::IndexFormat::Uint32);

        for d in &draws {
            rpass.set_bind_group(1, &gfx.store_bind_group, &[slot_offset(d.row) as u32]);
            rpass.draw_indexed(d.indices.clone(), d.base_vertex, 0..d.instances);
        }
    }
}

impl Drop for Pass<'_, '_> {
    fn drop(&mut self) {
        self.flush();
    }
}
