//! Flat shading.

use crate::render::prim::Prim;
use crate::render::vertex::{Scratch, VertexArena, VertexLayout};

use super::{Next, Stage};

/// Copies the colors of the provoking vertex of each line and triangle to
/// its other vertices.
///
/// The provoking vertex is the last vertex of a triangle and the second
/// vertex of a line. Only the slots whose semantic is a front or back color
/// are copied; other attributes are still interpolated.
#[derive(Clone, Debug)]
pub struct FlatStage {
    layout: VertexLayout,
    scratch: Scratch,
}

impl FlatStage {
    /// The number of scratch vertices needed by the stage.
    pub const SCRATCH: usize = 2;

    pub fn new(layout: VertexLayout, arena: &mut VertexArena) -> Self {
        let scratch = arena.reserve(Self::SCRATCH);
        Self { layout, scratch }
    }

    /// Returns `prim` with the first `n` vertices replaced by copies
    /// having the colors of vertex `n`.
    fn flatten(&self, prim: &Prim, n: usize, next: &mut Next) -> Prim {
        let arena = next.arena_mut();
        let mut verts = prim.verts;
        let pv = arena[verts[n]];
        for (i, v) in verts[..n].iter_mut().enumerate() {
            *v = self.scratch.dup(arena, *v, i);
            arena[*v].copy_slots(&pv, self.layout.color_slots());
        }
        prim.with_verts(verts)
    }
}

impl Stage for FlatStage {
    fn line(&mut self, prim: &Prim, next: &mut Next) {
        let flat = self.flatten(prim, 1, next);
        next.line(&flat);
    }

    fn tri(&mut self, prim: &Prim, next: &mut Next) {
        let flat = self.flatten(prim, 2, next);
        next.tri(&flat);
    }
}
