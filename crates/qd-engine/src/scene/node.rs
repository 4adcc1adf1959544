use glam::Vec4;

use crate::gfx::{MeshHandle, TexHandle};
use crate::math::Xform3;

/// What a node contributes to a frame.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum Drawable {
    #[default]
    None,
    /// One instance of `hnd`, textured with layer `tex` and multiplied by `blend`.
    Mesh {
        hnd: MeshHandle,
        tex: TexHandle,
        blend: Vec4,
    },
}

impl Drawable {
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Drawable::None)
    }
}

/// Scene node linked as first-child / next-sibling.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// First child, or [`Node::NONE`].
    pub kid: u32,
    /// Next sibling, or [`Node::NONE`].
    pub sib: u32,
    /// Transform relative to the parent.
    pub local: Xform3,
    /// Transform relative to the scene, written by [`Scene::update`](super::Scene::update).
    pub world: Xform3,
    pub draw: Drawable,
}

impl Node {
    /// Terminates `kid` / `sib` links.
    pub const NONE: u32 = u32::MAX;

    /// Childless, sibling-less node with an identity world transform.
    pub fn leaf(local: Xform3, draw: Drawable) -> Self {
        Self {
            kid: Self::NONE,
            sib: Self::NONE,
            local,
            world: Xform3::IDENTITY,
            draw,
        }
    }
}
