//! Primitive assembly.
//!
//! Turns a range of vertices into points, lines, and triangles according
//! to a [`Topology`]. Strips, fans, loops, quads, and polygons are reduced
//! to independent primitives here, so the rest of the pipeline only ever
//! handles the three basic classes.
//!
//! Assembled primitives are collected into a short queue, and the queue is
//! pushed through the pipeline in one go once it is full, when the vertex
//! cache runs out of space, or at the end of the draw call.

use alloc::vec::Vec;

use bytemuck::{PodCastError, try_cast_slice};
use log::trace;

use crate::error::{Error, Result};

pub use super::prim::Topology;

use super::cache::{Shading, VertexCache};
use super::prim::{EdgeFlags, Prim, Reduced};
use super::sink::Sink;
use super::stage::{Next, StageKind};
use super::vertex::{ShadedVertex, VertexArena, VertexId};

/// The maximum number of primitives queued before flushing.
pub const PRIM_QUEUE_LEN: usize = 16;

/// The source of the element (vertex) indices of a draw call.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Elements<'a> {
    /// Vertex *i* has element index *i*.
    #[default]
    Linear,
    /// 8-bit element indices.
    U8(&'a [u8]),
    /// 16-bit element indices.
    U16(&'a [u16]),
    /// 32-bit element indices.
    U32(&'a [u32]),
}

/// Primitives waiting to be pushed through the pipeline.
#[derive(Clone, Debug)]
pub struct PrimQueue {
    prims: Vec<Prim>,
}

/// Assembles the primitives of a single draw call.
pub struct Assembler<'a> {
    pub elts: &'a Elements<'a>,
    pub cache: &'a mut VertexCache,
    pub queue: &'a mut PrimQueue,
    pub arena: &'a mut VertexArena,
    pub shading: Shading<'a>,
    pub stages: &'a mut [StageKind],
    pub sink: &'a mut dyn Sink,
}

/// Forwards to another sink, counting the primitives received.
struct Counted<'a> {
    sink: &'a mut dyn Sink,
    prims: usize,
}

//
// Inherent impls
//

impl<'a> Elements<'a> {
    /// Interprets `bytes` as a buffer of native-endian element indices
    /// `width` bytes each. Width 0 denotes linear indices.
    ///
    /// # Errors
    /// * [`Error::ElementWidth`] if `width` is not 0, 1, 2, or 4
    /// * [`Error::ElementLength`] if the length of `bytes` is not a
    ///   multiple of `width`
    /// * [`Error::ElementAlignment`] if `bytes` is not aligned to `width`
    ///
    /// # Examples
    /// ```
    /// use retrofire_draw::{Error, render::assemble::Elements};
    ///
    /// let elts = Elements::from_bytes(1, &[3, 1, 2]).unwrap();
    /// assert_eq!(elts.get(1), 1);
    ///
    /// assert_eq!(Elements::from_bytes(3, &[]), Err(Error::ElementWidth(3)));
    /// ```
    pub fn from_bytes(width: usize, bytes: &'a [u8]) -> Result<Self> {
        let cast_err = |e: PodCastError| match e {
            PodCastError::TargetAlignmentGreaterAndInputNotAligned => {
                Error::ElementAlignment(width)
            }
            _ => Error::ElementLength { len: bytes.len(), width },
        };
        Ok(match width {
            0 => Self::Linear,
            1 => Self::U8(bytes),
            2 => Self::U16(try_cast_slice(bytes).map_err(cast_err)?),
            4 => Self::U32(try_cast_slice(bytes).map_err(cast_err)?),
            _ => return Err(Error::ElementWidth(width)),
        })
    }

    /// Returns the element index of vertex `i`.
    ///
    /// # Panics
    /// If `i` is out of bounds of the element buffer.
    #[inline]
    pub fn get(&self, i: u32) -> u32 {
        let i = i as usize;
        match self {
            Self::Linear => i as u32,
            Self::U8(es) => es[i].into(),
            Self::U16(es) => es[i].into(),
            Self::U32(es) => es[i],
        }
    }

    /// Returns the width of an element in bytes, or 0 if linear.
    pub fn width(&self) -> usize {
        match self {
            Self::Linear => 0,
            Self::U8(_) => 1,
            Self::U16(_) => 2,
            Self::U32(_) => 4,
        }
    }
}

impl PrimQueue {
    pub fn new() -> Self {
        Self { prims: Vec::with_capacity(PRIM_QUEUE_LEN) }
    }

    pub fn len(&self) -> usize {
        self.prims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prims.is_empty()
    }

    fn is_full(&self) -> bool {
        self.prims.len() >= PRIM_QUEUE_LEN
    }
}

impl Assembler<'_> {
    /// Assembles and draws `count` vertices starting from vertex `start`
    /// as primitives of `top`.
    ///
    /// Incomplete trailing primitives are ignored. Does not flush the
    /// primitive queue at the end; call [`flush`][Self::flush] for that.
    ///
    /// # Panics
    /// * If `top` is [`Topology::Polygon`] and `count` < 3.
    /// * If a vertex index is out of bounds of the element buffer.
    /// * If `start + count` overflows `u32`.
    pub fn run(&mut self, top: Topology, start: u32, count: u32) {
        use Topology::*;
        trace!("assembling {count} vertices from {start} as {top:?}");
        assert!(
            start.checked_add(count).is_some(),
            "vertex range {start}..+{count} overflows u32"
        );

        let n = count;
        // Maps vertex indices relative to the start of the range
        let s = |i: u32| start + i;
        match top {
            Points => {
                for i in 0..n {
                    self.point(s(i));
                }
            }
            Lines => {
                for i in (0..n.saturating_sub(1)).step_by(2) {
                    self.line(s(i), s(i + 1), true);
                }
            }
            LineStrip | LineLoop => {
                for i in 1..n {
                    self.line(s(i - 1), s(i), i == 1);
                }
                if top == LineLoop && n >= 2 {
                    self.line(s(n - 1), s(0), true);
                }
            }
            Triangles => {
                for i in (0..n.saturating_sub(2)).step_by(3) {
                    self.tri([s(i), s(i + 1), s(i + 2)], EdgeFlags::all(), true);
                }
            }
            TriangleStrip => {
                for i in 0..n.saturating_sub(2) {
                    // Keep the winding of odd triangles consistent
                    let vs = if i % 2 == 0 {
                        [s(i), s(i + 1), s(i + 2)]
                    } else {
                        [s(i + 1), s(i), s(i + 2)]
                    };
                    self.tri(vs, EdgeFlags::all(), true);
                }
            }
            TriangleFan => {
                for i in 0..n.saturating_sub(2) {
                    self.tri([s(0), s(i + 1), s(i + 2)], EdgeFlags::all(), true);
                }
            }
            Quads => {
                for i in (0..n.saturating_sub(3)).step_by(4) {
                    self.quad([s(i), s(i + 1), s(i + 2), s(i + 3)]);
                }
            }
            QuadStrip => {
                for i in (0..n.saturating_sub(3)).step_by(2) {
                    self.quad([s(i + 2), s(i), s(i + 1), s(i + 3)]);
                }
            }
            Polygon => {
                assert!(n >= 3, "polygon needs at least 3 vertices, got {n}");
                for i in 0..n - 2 {
                    let mut edges = EdgeFlags::E0;
                    edges.set(EdgeFlags::E1, i == n - 3);
                    edges.set(EdgeFlags::E2, i == 0);
                    self.tri([s(i + 1), s(i + 2), s(0)], edges, i == 0);
                }
            }
        }
    }

    /// Pushes the queued primitives through the pipeline.
    ///
    /// First shades any vertices still waiting in the shading queue.
    pub fn flush(&mut self) {
        self.cache.flush_shading(self.arena, &mut self.shading);
        if !self.queue.is_empty() {
            trace!("flushing {} primitives", self.queue.len());
            self.apply_edge_flags();

            let sink = &mut Counted { sink: &mut *self.sink, prims: 0 };
            let mut next =
                Next::new(&mut *self.stages, &mut *self.arena, sink);
            next.begin();
            for prim in self.queue.prims.drain(..) {
                match prim.kind {
                    Reduced::Point => next.point(&prim),
                    Reduced::Line => next.line(&prim),
                    Reduced::Tri => next.tri(&prim),
                }
            }
            next.end();

            let stats = &mut *self.shading.stats;
            stats.prims.o += sink.prims;
            stats.flushes += 1.0;
        }
        self.cache.release();
    }

    /// Clears the edges of triangles that start at a vertex whose edge
    /// flag is unset.
    fn apply_edge_flags(&mut self) {
        let arena = &*self.arena;
        for prim in &mut self.queue.prims {
            if prim.kind == Reduced::Tri {
                let vs: [&ShadedVertex; 3] = arena.resolve(prim.tri_ids());
                for (i, v) in vs.into_iter().enumerate() {
                    if !v.edge_flag {
                        prim.edges.remove(EdgeFlags::edge(i));
                    }
                }
            }
        }
    }

    /// Ensures the cache can take `n` more vertices, flushing and
    /// invalidating it if needed.
    fn check_space(&mut self, n: usize) {
        if !self.cache.has_space(n) {
            self.flush();
            self.cache.invalidate();
        }
    }

    fn fetch(&mut self, i: u32) -> VertexId {
        let elt = self.elts.get(i);
        self.cache.get_vertex(elt, self.arena, &mut self.shading)
    }

    fn emit(&mut self, prim: Prim) {
        self.queue.prims.push(prim);
        self.shading.stats.prims.i += 1;
        if self.queue.is_full() {
            self.flush();
        }
    }

    fn point(&mut self, i: u32) {
        self.check_space(1);
        let v = self.fetch(i);
        self.emit(Prim::point(v));
    }

    fn line(&mut self, i0: u32, i1: u32, reset_stipple: bool) {
        self.check_space(2);
        let [v0, v1] = [i0, i1].map(|i| self.fetch(i));
        self.emit(Prim::line(v0, v1, reset_stipple));
    }

    fn tri(&mut self, is: [u32; 3], edges: EdgeFlags, reset_stipple: bool) {
        self.check_space(3);
        let [v0, v1, v2] = is.map(|i| self.fetch(i));
        let prim = Prim::tri(v0, v1, v2)
            .with_edges(edges)
            .with_reset_stipple(reset_stipple);
        self.emit(prim);
    }

    /// Emits quad abcd as triangles abd and bcd, without the diagonal bd.
    ///
    /// ```text
    /// d-------c
    /// | \     |
    /// |   \   |
    /// |     \ |
    /// a-------b
    /// ```
    /// Vertex d is the last vertex of both triangles.
    fn quad(&mut self, [a, b, c, d]: [u32; 4]) {
        self.tri([a, b, d], EdgeFlags::E0 | EdgeFlags::E2, true);
        self.tri([b, c, d], EdgeFlags::E0 | EdgeFlags::E1, false);
    }
}

//
// Trait impls
//

impl Default for PrimQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for Counted<'_> {
    fn begin(&mut self) {
        self.sink.begin();
    }
    fn point(&mut self, prim: &Prim, v: &ShadedVertex) {
        self.prims += 1;
        self.sink.point(prim, v);
    }
    fn line(&mut self, prim: &Prim, vs: [&ShadedVertex; 2]) {
        self.prims += 1;
        self.sink.line(prim, vs);
    }
    fn tri(&mut self, prim: &Prim, vs: [&ShadedVertex; 3]) {
        self.prims += 1;
        self.sink.tri(prim, vs);
    }
    fn end(&mut self) {
        self.sink.end();
    }
    fn reset_stipple_counter(&mut self) {
        self.sink.reset_stipple_counter();
    }
}
