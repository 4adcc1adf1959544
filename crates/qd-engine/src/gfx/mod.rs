//! Instanced mesh rendering over a shared texture array.
//!
//! Every mesh lives in one vertex/index buffer pair and every texture in one
//! layer of a 2-D texture array. Per-instance data (model matrix, blend color,
//! layer) is not fed through vertex attributes: it is packed into rows of the
//! store texture and fetched in the vertex shader by instance index.
//!
//! - `renderer`: [`Gfx`] resources and the per-frame [`Pass`].
//! - `store`: instance record layout and the CPU store image.
//! - `shade`: CPU evaluation of `shaders/mesh.wgsl`, used to check the
//!   shading contract without a GPU.

mod batch;
mod error;
mod mesh;
mod renderer;
mod settings;
pub mod shade;
mod shader;
mod store;
mod texture;
mod uniforms;
mod vertex;

pub use error::{GfxError, Result};
pub use mesh::MeshHandle;
pub use renderer::{Gfx, Pass};
pub use settings::Settings;
pub use store::{MeshInst, StoreImage, Texel, TexelFetch, TEXELS_PER_INST};
pub use texture::TexHandle;
pub use vertex::Vtx;
