//! Per-frame handles shared by renderers.
//!
//! The runtime builds a [`RenderCtx`] and [`RenderTarget`] for every frame;
//! renderers such as `gfx::Gfx` record into them and never touch the surface.

mod ctx;

pub use ctx::{RenderCtx, RenderTarget};
