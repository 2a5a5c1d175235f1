//! Two-sided lighting.

use crate::render::prim::Prim;
use crate::render::state::Winding;
use crate::render::vertex::{Scratch, VertexArena, VertexLayout};

use super::{Next, Stage};

/// Replaces the front colors of back-facing triangles with their back
/// colors.
///
/// Uses the determinant computed by the [cull stage][super::CullStage].
/// Each `BackColor(n)` slot is copied to the `Color(n)` slot, if any.
#[derive(Clone, Debug)]
pub struct TwoSideStage {
    /// -1 if front faces are counter-clockwise, 1 if clockwise.
    sign: f32,
    layout: VertexLayout,
    scratch: Scratch,
}

impl TwoSideStage {
    pub const SCRATCH: usize = 3;

    pub fn new(
        front: Winding,
        layout: VertexLayout,
        arena: &mut VertexArena,
    ) -> Self {
        let sign = match front {
            Winding::Ccw => -1.0,
            Winding::Cw => 1.0,
        };
        let scratch = arena.reserve(Self::SCRATCH);
        Self { sign, layout, scratch }
    }
}

impl Stage for TwoSideStage {
    fn tri(&mut self, prim: &Prim, next: &mut Next) {
        if prim.det * self.sign >= 0.0 {
            return next.tri(prim);
        }
        let arena = next.arena_mut();
        let mut verts = prim.verts;
        for (i, v) in verts.iter_mut().enumerate() {
            *v = self.scratch.dup(arena, *v, i);
            let dup = &mut arena[*v];
            for (back, front) in self.layout.back_to_front() {
                dup.attribs[front] = dup.attribs[back];
            }
        }
        next.tri(&prim.with_verts(verts));
    }
}

#[cfg(test)]
mod tests {
    use crate::math::{Vec4, vec4};
    use crate::render::sink::Recorder;
    use crate::render::vertex::{Semantic::*, VertexId};

    use super::*;

    const RED: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
    const BLUE: [f32; 4] = [0.0, 0.0, 1.0, 1.0];

    fn run(front: Winding, det: f32) -> Recorder {
        let layout = VertexLayout::new(&[BackColor(0), Color(0)]).unwrap();
        let mut arena = VertexArena::new(3);
        for i in 0..3 {
            arena[VertexId(i)].attribs[0] = BLUE.into();
            arena[VertexId(i)].attribs[1] = RED.into();
        }
        let mut stage = TwoSideStage::new(front, layout, &mut arena);
        let mut rec = Recorder::default();
        let prim = Prim {
            det,
            ..Prim::tri(VertexId(0), VertexId(1), VertexId(2))
        };
        stage.tri(&prim, &mut Next::new(&mut [], &mut arena, &mut rec));
        rec
    }

    #[test]
    fn back_face_gets_back_color() {
        // Clockwise with counter-clockwise front
        let rec = run(Winding::Ccw, 10.0);
        for v in &rec.prims[0].verts {
            assert_eq!(v.attribs[1], Vec4::from(BLUE));
            assert_eq!(v.attribs[0], Vec4::from(BLUE));
        }
    }

    #[test]
    fn front_face_keeps_front_color() {
        let rec = run(Winding::Ccw, -10.0);
        assert_eq!(rec.prims[0].prim.verts[0], VertexId(0));
        for v in &rec.prims[0].verts {
            assert_eq!(v.attribs[1], vec4(1.0, 0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn clockwise_front() {
        let rec = run(Winding::Cw, 10.0);
        assert_eq!(rec.prims[0].verts[0].attribs[1], Vec4::from(RED));
        let rec = run(Winding::Cw, -10.0);
        assert_eq!(rec.prims[0].verts[0].attribs[1], Vec4::from(BLUE));
    }
}
