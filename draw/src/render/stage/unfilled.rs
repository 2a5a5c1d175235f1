//! Unfilled polygons: outlines and vertices.

use crate::render::prim::{EdgeFlags, Prim};
use crate::render::state::{FillMode, PerWinding, Winding};

use super::{Next, Stage};

/// Converts triangles into lines or points according to the fill mode of
/// their winding.
///
/// In line mode, each real edge of a triangle becomes a line; internal
/// edges created by polygon decomposition or clipping are skipped, so the
/// result is the outline of the original polygon. In point mode, each
/// vertex starting a real edge becomes a point.
#[derive(Copy, Clone, Debug)]
pub struct UnfilledStage {
    modes: PerWinding<FillMode>,
}

impl UnfilledStage {
    pub fn new(modes: PerWinding<FillMode>) -> Self {
        Self { modes }
    }

    fn lines(prim: &Prim, next: &mut Next) {
        let [v0, v1, v2] = prim.verts;
        if prim.reset_stipple {
            next.reset_stipple_counter();
        }
        // The closing edge first, so that a polygon outline is drawn as
        // one continuous stippled loop.
        for (e, a, b) in [(2, v2, v0), (0, v0, v1), (1, v1, v2)] {
            if prim.edges.contains(EdgeFlags::edge(e)) {
                next.line(&Prim::line(a, b, false));
            }
        }
    }

    fn points(prim: &Prim, next: &mut Next) {
        for (e, v) in prim.verts.into_iter().enumerate() {
            if prim.edges.contains(EdgeFlags::edge(e)) {
                next.point(&Prim::point(v));
            }
        }
    }
}

impl Stage for UnfilledStage {
    fn tri(&mut self, prim: &Prim, next: &mut Next) {
        // Degenerate triangles never get past culling
        let mode = Winding::of(prim.det).map_or(FillMode::Fill, |w| *self.modes.get(w));
        match mode {
            FillMode::Fill => next.tri(prim),
            FillMode::Line => Self::lines(prim, next),
            FillMode::Point => Self::points(prim, next),
        }
    }
}
