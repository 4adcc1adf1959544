use std::time::Duration;

use glam::{UVec2, Vec3, Vec4};
use rand::Rng;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use qd_engine::core::{App, AppControl, FrameCtx};
use qd_engine::gfx::{Gfx, MeshHandle, Settings, TexHandle, Vtx};
use qd_engine::math::{Camera, Proj, Xform3};
use qd_engine::render::RenderCtx;
use qd_engine::scene::{Drawable, Node, Scene};
use qd_engine::time::FpsCounter;

const BARS: usize = 50;
const BAR_SIZE: f32 = 32.0;
const FPS_PERIOD: Duration = Duration::from_secs(5);

/// Texel fill for the bar texture (`0xAABBGGRR`).
const BAR_TEXEL: u32 = 0xFFFF_00FF;

/// Falling-bars demo: one quad mesh instanced `BARS` times.
pub struct BarsApp {
    /// Created on the first frame, once a device exists.
    state: Option<BarsState>,
    fps: FpsCounter,
    rng: rand::rngs::ThreadRng,
}

struct BarsState {
    gfx: Gfx,
    scene: Scene,
    camera: Camera,
}

impl BarsApp {
    pub fn new() -> Self {
        Self {
            state: None,
            fps: FpsCounter::new(FPS_PERIOD),
            rng: rand::rng(),
        }
    }
}

impl BarsState {
    fn new(ctx: &RenderCtx<'_>) -> anyhow::Result<Self> {
        let settings = Settings::default();
        let mut gfx = Gfx::new(ctx, settings.clone())?;

        let mesh = gfx.mesh_alloc(QUAD_VTXS.len(), QUAD_IDXS.len())?;
        gfx.mesh_write(ctx, mesh, &quad_vertices(), &QUAD_IDXS)?;

        let tex = gfx.tex_alloc()?;
        let texels = vec![BAR_TEXEL; (settings.tex_dim * settings.tex_dim) as usize];
        gfx.tex_write(ctx, tex, &texels)?;

        Ok(Self {
            gfx,
            scene: bar_scene(mesh, tex),
            camera: Camera {
                pos: Vec3::new(-16.0, -16.0, 1.0),
                at: Vec3::new(-16.0, -16.0, 0.0),
                proj: Proj::Ortho {
                    size: ctx.surface_size,
                    near: 0.0,
                    far: 10000.0,
                },
            },
        })
    }

    /// Drops every bar by 0..=3 px, wrapping to the top once it leaves the screen.
    fn step(&mut self, rng: &mut impl Rng, height: f32) {
        for node in self.scene.active_mut() {
            node.local.pos.y -= rng.random_range(0..4) as f32;
            if node.local.pos.y < -BAR_SIZE {
                node.local.pos.y = height;
            }
        }
        self.scene.update();
    }
}

impl App for BarsApp {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.state.is_none() {
            match BarsState::new(&ctx.render_ctx()) {
                Ok(s) => self.state = Some(s),
                Err(e) => {
                    log::error!("viewer setup failed: {e:#}");
                    return AppControl::Exit;
                }
            }
        }
        let Some(state) = self.state.as_mut() else {
            return AppControl::Exit;
        };

        let size = ctx.gpu.surface_size();
        state.step(&mut self.rng, size.y as f32);
        set_ortho_size(&mut state.camera, size);

        let control = ctx.render(None, |rctx, target| {
            state.gfx.begin_frame();
            let mut pass = state.gfx.pass(rctx, target, &state.camera);
            pass.clear_all();
            pass.draw(state.scene.drawables());
        });

        if let Some(fps) = self.fps.frame(ctx.time.now) {
            log::debug!("fps: {fps:.1}");
        }
        control
    }
}

fn set_ortho_size(camera: &mut Camera, surface: UVec2) {
    if let Proj::Ortho { size, .. } = &mut camera.proj {
        *size = surface;
    }
}

/// Root node with `BARS` leaf children side by side, fading out left to right.
fn bar_scene(mesh: MeshHandle, tex: TexHandle) -> Scene {
    let mut scene = Scene::new();
    scene.add_node(Node {
        kid: 1,
        ..Node::leaf(Xform3::IDENTITY, Drawable::None)
    });

    for i in 0..BARS {
        let mut local = Xform3::from_pos(Vec3::new(BAR_SIZE * i as f32, 0.0, 0.0));
        local.scale = Vec3::new(BAR_SIZE / 2.0, BAR_SIZE, 1.0);

        let sib = if i + 1 < BARS { (i + 2) as u32 } else { Node::NONE };
        scene.add_node(Node {
            sib,
            ..Node::leaf(
                local,
                Drawable::Mesh {
                    hnd: mesh,
                    tex,
                    blend: Vec4::splat((BARS - i) as f32 / BARS as f32),
                },
            )
        });
    }
    scene.update();
    scene
}

/// Unit quad corners, counter-clockwise from the origin.
const QUAD_VTXS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
const QUAD_IDXS: [u32; 6] = [0, 1, 2, 0, 2, 3];

fn quad_vertices() -> Vec<Vtx> {
    QUAD_VTXS
        .iter()
        .map(|&[x, y]| Vtx::new([x, y, 0.0], [x, 1.0 - y], [1.0; 4]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_links_every_bar_under_root() {
        let mesh = MeshHandle::default();
        let tex = TexHandle::default();
        let scene = bar_scene(mesh, tex);

        assert_eq!(scene.len(), BARS + 1);
        let xs: Vec<f32> = scene.drawables().map(|(w, _)| w.pos.x).collect();
        assert_eq!(xs.len(), BARS);
        assert_eq!(xs[3], 3.0 * BAR_SIZE);
    }

    #[test]
    fn blend_fades_across_bars() {
        let scene = bar_scene(MeshHandle::default(), TexHandle::default());
        let blends: Vec<f32> = scene
            .drawables()
            .map(|(_, d)| match d {
                Drawable::Mesh { blend, .. } => blend.x,
                Drawable::None => unreachable!(),
            })
            .collect();
        assert_eq!(blends[0], 1.0);
        assert!(blends.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn quad_winds_counter_clockwise() {
        let v = quad_vertices();
        for tri in QUAD_IDXS.chunks(3) {
            let [a, b, c] = [v[tri[0] as usize].pos, v[tri[1] as usize].pos, v[tri[2] as usize].pos];
            let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            assert!(cross > 0.0);
        }
    }
}
