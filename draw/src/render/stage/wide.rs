//! Wide lines and points.

use crate::math::float::abs;
use crate::math::vec4;
use crate::render::prim::Prim;
use crate::render::vertex::{
    Scratch, Semantic, VertexArena, VertexId, VertexLayout,
};

use super::{Next, Stage};

/// Expands lines and points into screen-aligned triangle pairs.
///
/// A line wider than one pixel becomes a parallelogram extended along the
/// minor axis of the line by half the line width in each direction. A point
/// becomes a square centered on the vertex, its size taken from the
/// per-vertex point size attribute if the layout has one. Point sprites
/// additionally get texture coordinates spanning the unit square.
///
/// Lines and points that need no expansion are passed through.
#[derive(Clone, Debug)]
pub struct WideStage {
    line_width: f32,
    point_size: f32,
    point_size_slot: Option<usize>,
    /// Texture coordinate slots to write, if points are sprites.
    sprite_slots: Option<VertexLayout>,
    scratch: Scratch,
}

/// Biases wide line edges to match the pixel coverage of thin lines.
const LINE_BIAS: f32 = 0.125;

impl WideStage {
    pub const SCRATCH: usize = 4;

    pub fn new(
        line_width: f32,
        point_size: f32,
        point_sprite: bool,
        layout: VertexLayout,
        arena: &mut VertexArena,
    ) -> Self {
        Self {
            line_width,
            point_size,
            point_size_slot: layout.find(Semantic::PointSize),
            sprite_slots: point_sprite.then_some(layout),
            scratch: arena.reserve(Self::SCRATCH),
        }
    }

    /// Returns whether lines or points of the given parameters need
    /// expansion.
    pub fn is_needed(
        line_width: f32,
        point_size: f32,
        point_sprite: bool,
        layout: &VertexLayout,
    ) -> bool {
        line_width != 1.0
            || point_size != 1.0
            || point_sprite
            || layout.find(Semantic::PointSize).is_some()
    }

    /// Emits the quad of dups of `verts` as triangles (0, 2, 3) and (0, 3, 1):
    /// ```text
    /// 0-------2
    /// | \     |
    /// |   \   |
    /// |     \ |
    /// 1-------3
    /// ```
    fn quad(prim: &Prim, verts: [VertexId; 4], next: &mut Next) {
        let [v0, v1, v2, v3] = verts;
        let tri = Prim::tri(v0, v2, v3).with_reset_stipple(prim.reset_stipple);
        next.tri(&tri);
        next.tri(&tri.with_verts([v0, v3, v1]).with_reset_stipple(false));
    }
}

impl Stage for WideStage {
    fn line(&mut self, prim: &Prim, next: &mut Next) {
        if self.line_width == 1.0 {
            return next.line(prim);
        }
        let [i0, i1] = prim.line_ids();
        let arena = next.arena_mut();
        let d = arena[i0].win - arena[i1].win;
        let (dx, dy) = (abs(d.x()), abs(d.y()));
        if dx == 0.0 && dy == 0.0 {
            // No direction to widen in
            return;
        }
        let half = 0.5 * self.line_width;
        let scratch = self.scratch;
        let verts = [(i0, 0), (i0, 1), (i1, 2), (i1, 3)]
            .map(|(src, i)| scratch.dup(arena, src, i));

        for (i, v) in verts.into_iter().enumerate() {
            let side = if i % 2 == 0 { -half } else { half };
            let win = &mut arena[v].win.0;
            if dx > dy {
                // X-major, widen vertically
                win[1] += side - LINE_BIAS;
            } else {
                win[0] += side + LINE_BIAS;
            }
        }
        Self::quad(prim, verts, next);
    }

    fn point(&mut self, prim: &Prim, next: &mut Next) {
        let [src] = prim.point_ids();
        let arena = next.arena_mut();
        let size = match self.point_size_slot {
            Some(slot) => arena[src].attribs[slot].x(),
            None => self.point_size,
        };
        if size == 1.0 && self.sprite_slots.is_none() {
            return next.point(prim);
        }
        if size.is_nan() || size <= 0.0 {
            return;
        }
        let half = 0.5 * size;
        let scratch = self.scratch;
        let verts = [0, 1, 2, 3].map(|i| scratch.dup(arena, src, i));
        // Corner offsets and sprite texture coordinates
        let corners = [
            (-half, -half, 0.0, 0.0),
            (-half, half, 0.0, 1.0),
            (half, -half, 1.0, 0.0),
            (half, half, 1.0, 1.0),
        ];
        for (&v, (dx, dy, s, t)) in verts.iter().zip(corners) {
            let dup = &mut arena[v];
            dup.win.0[0] += dx;
            dup.win.0[1] += dy;
            if let Some(layout) = &self.sprite_slots {
                for slot in layout.tex_coord_slots() {
                    dup.attribs[slot] = vec4(s, t, 0.0, 1.0);
                }
            }
        }
        Self::quad(prim, verts, next);
    }
}
