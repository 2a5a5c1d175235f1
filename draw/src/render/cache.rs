//! Vertex cache and shading queue.
//!
//! Indexed geometry typically refers to each vertex several times; in a
//! regular triangle mesh, each vertex is shared by about six triangles.
//! The vertex cache makes sure that a vertex fetched again shortly after
//! its first fetch is not shaded again, but its previous result reused.
//!
//! The cache is a direct-mapped table of [`CACHE_SLOTS`] entries keyed by
//! element index, followed by a small overflow area. Fetched vertices are
//! not shaded immediately but queued, and the vertex shader is invoked on
//! batches of up to [`SHADE_BATCH`] vertices at a time.
//!
//! Slots referenced by primitives that are still waiting in the primitive
//! queue must not be overwritten. If a newly fetched vertex maps to such a
//! slot, it is placed in the overflow area instead. When the overflow area
//! is about to run out, the primitive queue must be flushed and the cache
//! invalidated; see [`VertexCache::has_space`].

use log::trace;

use super::clip::ClipPlanes;
use super::shader::{VertexOutput, VertexShader};
use super::state::Viewport;
use super::stats::Stats;
use super::vertex::{VertexArena, VertexId};

/// The number of direct-mapped cache slots.
pub const CACHE_SLOTS: usize = 32;

/// The number of overflow slots.
pub const OVERFLOW_SLOTS: usize = 4;

/// The total number of vertices in the cache region of the arena.
pub const CACHE_SIZE: usize = CACHE_SLOTS + OVERFLOW_SLOTS;

/// The maximum number of vertices shaded by one shader invocation.
pub const SHADE_BATCH: usize = 4;

/// Everything needed to shade a batch of vertices.
pub struct Shading<'a> {
    pub shader: &'a mut dyn VertexShader,
    pub planes: &'a ClipPlanes,
    pub viewport: &'a Viewport,
    /// The number of active attribute slots.
    pub attribs: usize,
    pub stats: &'a mut Stats,
}

/// Caches shaded vertices by element index.
///
/// Cache slot *i* is the vertex with id *i* in the vertex arena.
#[derive(Clone, Debug)]
pub struct VertexCache {
    /// The element index stored in each slot, if any.
    elts: [Option<u32>; CACHE_SIZE],
    /// Bit *i* is set if slot *i* has been fetched since the last release.
    referenced: u64,
    /// The number of overflow slots in use.
    overflow: usize,
    /// Vertices waiting to be shaded.
    queue: [(u32, VertexId); SHADE_BATCH],
    queued: usize,
}

/// Returns the direct-mapped slot of element index `elt`.
#[inline]
pub const fn slot_of(elt: u32) -> usize {
    // Wrapping is harmless, the slot count divides 2^32
    elt.wrapping_add(elt >> 5) as usize % CACHE_SLOTS
}

impl VertexCache {
    pub fn new() -> Self {
        Self {
            elts: [None; CACHE_SIZE],
            referenced: 0,
            overflow: 0,
            queue: [(0, VertexId(0)); SHADE_BATCH],
            queued: 0,
        }
    }

    /// Returns the id of the vertex with element index `elt`.
    ///
    /// If the vertex is not in the cache, it is assigned a slot and queued
    /// for shading. The queue is flushed once it is full. The vertex data
    /// is therefore only valid after the next [`flush_shading`][Self::flush_shading].
    ///
    /// # Panics
    /// If the overflow area is full. Use [`has_space`][Self::has_space]
    /// before fetching the vertices of each primitive.
    pub fn get_vertex(
        &mut self,
        elt: u32,
        arena: &mut VertexArena,
        sh: &mut Shading,
    ) -> VertexId {
        sh.stats.verts.i += 1;
        let mut slot = slot_of(elt);
        if self.elts[slot] == Some(elt) {
            self.referenced |= 1 << slot;
            return VertexId(slot as u32);
        }
        if self.referenced & (1 << slot) != 0 {
            // Still needed by a queued primitive
            assert!(self.overflow < OVERFLOW_SLOTS, "vertex cache overflow");
            slot = CACHE_SLOTS + self.overflow;
            self.overflow += 1;
        }
        self.elts[slot] = Some(elt);
        self.referenced |= 1 << slot;

        let id = VertexId(slot as u32);
        self.queue[self.queued] = (elt, id);
        self.queued += 1;
        if self.queued == SHADE_BATCH {
            self.flush_shading(arena, sh);
        }
        id
    }

    /// Returns whether `n` more vertices can be fetched without
    /// running out of overflow slots.
    ///
    /// If not, the primitive queue must be flushed and the cache
    /// [invalidated][Self::invalidate] before fetching.
    #[inline]
    pub fn has_space(&self, n: usize) -> bool {
        self.overflow + n < OVERFLOW_SLOTS
    }

    /// Shades the queued vertices, if any.
    ///
    /// Invokes the vertex shader once on all the queued vertices, writes
    /// the results into their cache slots, and computes their outcodes and
    /// window positions.
    pub fn flush_shading(&mut self, arena: &mut VertexArena, sh: &mut Shading) {
        let n = self.queued;
        if n == 0 {
            return;
        }
        let mut elts = [0; SHADE_BATCH];
        for (e, &(elt, _)) in elts.iter_mut().zip(&self.queue[..n]) {
            *e = elt;
        }
        let mut outs = [VertexOutput::default(); SHADE_BATCH];
        sh.shader.shade(&elts[..n], &mut outs[..n]);

        for (&(_, id), out) in self.queue[..n].iter().zip(&outs) {
            let v = &mut arena[id];
            v.clip = out.pos;
            v.attribs[..sh.attribs].copy_from_slice(&out.attribs[..sh.attribs]);
            v.edge_flag = out.edge_flag;
            v.clip_mask = sh.planes.outcode(&out.pos);
            v.project(sh.viewport);
        }
        sh.stats.batches += 1.0;
        sh.stats.verts.o += n;
        self.queued = 0;
    }

    /// Marks all slots unreferenced.
    ///
    /// Called after the primitive queue has been flushed, as no queued
    /// primitive refers to any slot anymore.
    pub fn release(&mut self) {
        self.referenced = 0;
    }

    /// Empties the cache.
    ///
    /// Every vertex fetched after this is shaded again. The shading queue
    /// must be empty.
    pub fn invalidate(&mut self) {
        debug_assert_eq!(self.queued, 0, "invalidating with vertices queued");
        trace!("invalidating vertex cache, {} overflow slots used", self.overflow);
        self.elts = [None; CACHE_SIZE];
        self.referenced = 0;
        self.overflow = 0;
    }

    /// Returns the number of vertices waiting to be shaded.
    pub fn queued(&self) -> usize {
        self.queued
    }
}

impl Default for VertexCache {
    fn default() -> Self {
        Self::new()
    }
}
