//! CPU-side bookkeeping for GPU memory.
//!
//! None of these types touch the GPU; they only hand out ranges and slots that
//! renderers then map onto buffers, texture layers and store rows.

mod bit;
mod buddy;
mod handles;

pub use bit::BitAlloc;
pub use buddy::BuddyAlloc;
pub use handles::Handles;
