//! Contract between the runtime and applications.
//!
//! Apps implement [`App`]; each frame they get a [`FrameCtx`] that hides the
//! surface and encoder handling behind [`FrameCtx::render`].

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
