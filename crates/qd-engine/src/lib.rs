//! qd engine.
//!
//! An instanced mesh renderer (`gfx`) with its scene graph, math and allocator
//! support, plus the window/GPU runtime that hosts it.

pub mod core;
pub mod device;
pub mod gfx;
pub mod logging;
pub mod math;
pub mod mem;
pub mod render;
pub mod scene;
pub mod time;
pub mod window;
