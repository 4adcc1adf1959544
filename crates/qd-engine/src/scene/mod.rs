//! Scene graph.
//!
//! Nodes live in a flat vector and link to each other by index. Node 0 is the
//! root; [`Scene::update`] walks the tree from there and recomputes world
//! transforms, and [`Scene::drawables`] feeds them to `gfx::Pass::draw`.

mod node;

pub use node::{Drawable, Node};

use crate::math::Xform3;

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `node` and returns its index.
    pub fn add_node(&mut self, node: Node) -> u32 {
        self.nodes.push(node);
        (self.nodes.len() - 1) as u32
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, idx: u32) -> Option<&Node> {
        self.nodes.get(idx as usize)
    }

    pub fn node_mut(&mut self, idx: u32) -> Option<&mut Node> {
        self.nodes.get_mut(idx as usize)
    }

    /// Recomputes `world = parent.world ∘ local` depth-first from the root.
    ///
    /// Nodes not reachable from the root keep their previous world transform.
    /// Links that point outside the scene or revisit a node are ignored.
    pub fn update(&mut self) {
        if self.nodes.is_empty() {
            return;
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<(u32, Xform3)> = vec![(0, Xform3::IDENTITY)];
        let mut warned = false;

        while let Some((idx, parent)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(idx as usize) else {
                if !warned {
                    log::warn!("scene link to missing node {idx}");
                    warned = true;
                }
                continue;
            };
            if std::mem::replace(&mut visited[idx as usize], true) {
                if !warned {
                    log::warn!("scene node {idx} linked more than once");
                    warned = true;
                }
                continue;
            }

            node.world = parent.concat(&node.local);
            if node.sib != Node::NONE {
                stack.push((node.sib, parent));
            }
            if node.kid != Node::NONE {
                stack.push((node.kid, node.world));
            }
        }
    }

    /// Nodes that carry a drawable.
    pub fn active_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut().filter(|n| !n.draw.is_none())
    }

    /// `(world, drawable)` pairs for every node that carries a drawable.
    pub fn drawables(&self) -> impl Iterator<Item = (&Xform3, &Drawable)> {
        self.nodes
            .iter()
            .filter(|n| !n.draw.is_none())
            .map(|n| (&n.world, &n.draw))
    }
}
