//! Line stipple.

use core::mem::take;

use crate::math::Lerp;
use crate::math::float::abs;
use crate::render::prim::Prim;
use crate::render::state::LineStipple;
use crate::render::vertex::{Scratch, ShadedVertex, VertexArena, VertexId};

use super::{Next, Stage};

/// Breaks lines into dashes according to a stipple pattern.
///
/// The stipple counter advances by one for every pixel along the major
/// axis of each line, and persists from one line to the next until reset
/// by a primitive's reset flag or an explicit reset. Each run of "on"
/// pixels is emitted as a separate line segment.
#[derive(Clone, Debug)]
pub struct StippleStage {
    stipple: LineStipple,
    counter: u32,
    attribs: usize,
    scratch: Scratch,
}

/// Writes to `dst` the point at `t` between `v0` and `v1`, interpolating
/// linearly in window space.
fn screen_interp(
    arena: &mut VertexArena,
    dst: VertexId,
    v0: VertexId,
    v1: VertexId,
    t: f32,
    attribs: usize,
) {
    let (a, b) = (&arena[v0], &arena[v1]);
    let mut v = *a;
    v.clip = a.clip.lerp(&b.clip, t);
    v.win = a.win.lerp(&b.win, t);
    for (x, y) in v.attribs.iter_mut().zip(&b.attribs).take(attribs) {
        *x = x.lerp(y, t);
    }
    arena[dst] = v;
}

impl StippleStage {
    pub const SCRATCH: usize = 2;

    pub fn new(
        stipple: LineStipple,
        attribs: usize,
        arena: &mut VertexArena,
    ) -> Self {
        let scratch = arena.reserve(Self::SCRATCH);
        Self { stipple, counter: 0, attribs, scratch }
    }

    /// Returns the current value of the stipple counter.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Emits the part of `prim` between `t0` and `t1`.
    ///
    /// Only the first segment of a line carries its stipple reset flag;
    /// `reset` is cleared once taken.
    fn segment(
        &self,
        prim: &Prim,
        (t0, t1): (f32, f32),
        reset: &mut bool,
        next: &mut Next,
    ) {
        let [v0, v1] = prim.line_ids();
        let mut seg = *prim;
        seg.reset_stipple = take(reset);
        let arena = next.arena_mut();
        if t0 > 0.0 {
            seg.verts[0] = self.scratch.slot(0);
            screen_interp(arena, seg.verts[0], v0, v1, t0, self.attribs);
        }
        if t1 < 1.0 {
            seg.verts[1] = self.scratch.slot(1);
            screen_interp(arena, seg.verts[1], v0, v1, t1, self.attribs);
        }
        next.line(&seg);
    }
}

impl Stage for StippleStage {
    fn line(&mut self, prim: &Prim, next: &mut Next) {
        if prim.reset_stipple {
            self.counter = 0;
        }
        let [a, b] = next.arena().resolve(prim.line_ids()).map(|v: &ShadedVertex| v.win);
        let d = a - b;
        // Length in pixels along the major axis
        let len = (f32::max(abs(d.x()), abs(d.y())) + 0.5) as u32;
        if len == 0 {
            return;
        }
        let len_f = len as f32;

        let mut on = false;
        let mut start = 0;
        let mut reset = prim.reset_stipple;
        for i in 0..len {
            let draw = self.stipple.test(self.counter);
            if draw != on {
                if on {
                    // Finishing an "on" run
                    let ts = (start as f32 / len_f, i as f32 / len_f);
                    self.segment(prim, ts, &mut reset, next);
                } else {
                    start = i;
                }
                on = draw;
            }
            self.counter = self.counter.wrapping_add(1);
        }
        if on {
            self.segment(prim, (start as f32 / len_f, 1.0), &mut reset, next);
        }
    }

    fn reset_stipple_counter(&mut self, next: &mut Next) {
        self.counter = 0;
        next.reset_stipple_counter();
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use crate::assert_approx_eq;
    use crate::math::vec4;
    use crate::render::sink::Recorder;

    use super::*;

    /// A horizontal line from x = 0 to x = `len`, with attribute 0 equal
    /// to its window position.
    fn arena(len: f32) -> VertexArena {
        let mut arena = VertexArena::new(2);
        for (i, x) in [0.0, len].into_iter().enumerate() {
            let v = &mut arena[VertexId(i as u32)];
            v.win = vec4(x, 5.0, 0.5, 1.0);
            v.attribs[0] = v.win;
        }
        arena
    }

    fn line() -> Prim {
        Prim::line(VertexId(0), VertexId(1), true)
    }

    fn xs(rec: &Recorder) -> Vec<[f32; 2]> {
        rec.prims
            .iter()
            .map(|r| [r.verts[0].win.x(), r.verts[1].win.x()])
            .collect()
    }

    #[test]
    fn dashes_follow_pattern() {
        let mut arena = arena(16.0);
        // Four on, four off
        let st = LineStipple { factor: 1, pattern: 0x0F0F };
        let mut stage = StippleStage::new(st, 1, &mut arena);
        let mut rec = Recorder::default();
        stage.line(&line(), &mut Next::new(&mut [], &mut arena, &mut rec));

        assert_approx_eq!(xs(&rec)[..], [[0.0, 4.0], [8.0, 12.0]][..]);
        // Attributes are interpolated along
        assert_approx_eq!(rec.prims[1].verts[0].attribs[0].x(), 8.0);
        assert_eq!(stage.counter(), 16);
        // Only the first dash starts a new stipple sequence
        assert!(rec.prims[0].prim.reset_stipple);
        assert!(!rec.prims[1].prim.reset_stipple);
    }

    #[test]
    fn factor_stretches_pattern() {
        let mut arena = arena(16.0);
        let st = LineStipple { factor: 4, pattern: 0b0101 };
        let mut stage = StippleStage::new(st, 1, &mut arena);
        let mut rec = Recorder::default();
        stage.line(&line(), &mut Next::new(&mut [], &mut arena, &mut rec));

        assert_approx_eq!(xs(&rec)[..], [[0.0, 4.0], [8.0, 12.0]][..]);
    }

    #[test]
    fn counter_persists_between_lines() {
        let mut arena = arena(4.0);
        let st = LineStipple { factor: 1, pattern: 0x0F0F };
        let mut stage = StippleStage::new(st, 1, &mut arena);
        let mut rec = Recorder::default();
        let mut next = Next::new(&mut [], &mut arena, &mut rec);

        // On for pixels 0..4
        stage.line(&line(), &mut next);
        // Off for pixels 4..8
        stage.line(&line().with_reset_stipple(false), &mut next);
        // Reset, on again
        stage.line(&line(), &mut next);
        assert_eq!(rec.prims.len(), 2);
    }

    #[test]
    fn explicit_reset_is_forwarded() {
        let mut arena = arena(4.0);
        let st = LineStipple { factor: 1, pattern: 0xFFFF };
        let mut stage = StippleStage::new(st, 1, &mut arena);
        let mut rec = Recorder::default();
        let mut next = Next::new(&mut [], &mut arena, &mut rec);
        stage.line(&line(), &mut next);
        assert_eq!(stage.counter(), 4);

        stage.reset_stipple_counter(&mut next);
        assert_eq!(stage.counter(), 0);
        assert_eq!(rec.stipple_resets, 1);
    }

    #[test]
    fn solid_pattern_emits_whole_line() {
        let mut arena = arena(10.0);
        let st = LineStipple { factor: 1, pattern: 0xFFFF };
        let mut stage = StippleStage::new(st, 1, &mut arena);
        let mut rec = Recorder::default();
        let prim = line();
        stage.line(&prim, &mut Next::new(&mut [], &mut arena, &mut rec));
        assert_eq!(rec.prims.len(), 1);
        assert_eq!(rec.prims[0].prim, prim);
    }

    #[test]
    fn zero_length_line_dropped() {
        let mut arena = arena(0.0);
        let st = LineStipple { factor: 1, pattern: 0xFFFF };
        let mut stage = StippleStage::new(st, 1, &mut arena);
        let mut rec = Recorder::default();
        stage.line(&line(), &mut Next::new(&mut [], &mut arena, &mut rec));
        assert!(rec.prims.is_empty());
    }
}
