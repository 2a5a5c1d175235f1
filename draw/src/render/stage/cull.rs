//! Face culling.

use crate::render::prim::Prim;
use crate::render::state::{CullMode, Winding};
use crate::render::vertex::{ShadedVertex, VertexArena};

use super::{Next, Stage};

/// Computes the determinant of each triangle and discards triangles
/// that are degenerate or face the wrong way.
///
/// The determinant is stored in [`Prim::det`] for the use of later stages.
/// Points and lines are always passed through.
#[derive(Copy, Clone, Debug)]
pub struct CullStage {
    mode: CullMode,
    front: Winding,
}

/// Returns twice the signed window-space area of triangle `vs`.
///
/// The value is positive if the triangle is wound clockwise on screen
/// and negative if counter-clockwise.
#[inline]
pub fn determinant([v0, v1, v2]: [&ShadedVertex; 3]) -> f32 {
    let e = v0.win - v2.win;
    let f = v1.win - v2.win;
    e.x() * f.y() - e.y() * f.x()
}

/// Returns the determinant of the triangle `prim` in `arena`.
pub fn prim_determinant(prim: &Prim, arena: &VertexArena) -> f32 {
    determinant(arena.resolve(prim.tri_ids()))
}

impl CullStage {
    pub fn new(mode: CullMode, front: Winding) -> Self {
        Self { mode, front }
    }
}

impl Stage for CullStage {
    fn tri(&mut self, prim: &Prim, next: &mut Next) {
        let det = prim_determinant(prim, next.arena());
        // Zero-area and NaN triangles have no winding
        let Some(w) = Winding::of(det) else {
            return;
        };
        if !self.mode.culls(w, self.front) {
            next.tri(&Prim { det, ..*prim });
        }
    }
}
