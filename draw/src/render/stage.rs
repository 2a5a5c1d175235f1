//! Per-primitive pipeline stages.
//!
//! A pipeline is a chain of stages ending in a [sink][Sink]. Each stage
//! receives primitives from its predecessor and pushes zero or more
//! primitives to the rest of the chain through a [`Next`] handle. A stage
//! may pass a primitive through unchanged, drop it, replace its vertices
//! with modified copies, or decompose it into several other primitives.
//!
//! Stages never modify the vertices they receive. To change a vertex, a
//! stage first duplicates it into its private [scratch][Scratch] region.
//!
//! [Scratch]: super::vertex::Scratch

use core::fmt::{self, Debug, Formatter};

use super::clip::ClipStage;
use super::prim::Prim;
use super::sink::Sink;
use super::vertex::VertexArena;

pub use self::{
    cull::CullStage, flat::FlatStage, offset::OffsetStage,
    stipple::StippleStage, twoside::TwoSideStage, unfilled::UnfilledStage,
    wide::WideStage,
};

pub mod cull;
pub mod flat;
pub mod offset;
pub mod stipple;
pub mod twoside;
pub mod unfilled;
pub mod wide;

/// A pipeline stage.
///
/// Every method by default passes its input on to the next stage, so a
/// stage only needs to implement the methods for the primitive classes it
/// cares about.
pub trait Stage {
    /// Called at the start of each batch of primitives.
    fn begin(&mut self, next: &mut Next) {
        next.begin();
    }

    /// Processes a point.
    fn point(&mut self, prim: &Prim, next: &mut Next) {
        next.point(prim);
    }

    /// Processes a line.
    fn line(&mut self, prim: &Prim, next: &mut Next) {
        next.line(prim);
    }

    /// Processes a triangle.
    fn tri(&mut self, prim: &Prim, next: &mut Next) {
        next.tri(prim);
    }

    /// Called at the end of each batch of primitives.
    fn end(&mut self, next: &mut Next) {
        next.end();
    }

    /// Resets the line stipple counter.
    fn reset_stipple_counter(&mut self, next: &mut Next) {
        next.reset_stipple_counter();
    }
}

/// The rest of a pipeline, as seen by a stage.
///
/// Calling a method of `Next` invokes the corresponding method of the
/// next stage in the chain, or of the sink if there are no more stages.
pub struct Next<'a> {
    stages: &'a mut [StageKind],
    arena: &'a mut VertexArena,
    sink: &'a mut dyn Sink,
}

/// The catalog of pipeline stages.
#[derive(Clone, Debug)]
pub enum StageKind {
    Flat(FlatStage),
    Clip(ClipStage),
    Cull(CullStage),
    TwoSide(TwoSideStage),
    Offset(OffsetStage),
    Unfilled(UnfilledStage),
    Stipple(StippleStage),
    Wide(WideStage),
}

impl<'a> Next<'a> {
    /// Returns a chain of `stages` ending in `sink`.
    pub fn new(
        stages: &'a mut [StageKind],
        arena: &'a mut VertexArena,
        sink: &'a mut dyn Sink,
    ) -> Self {
        Self { stages, arena, sink }
    }

    /// Returns the vertex arena.
    #[inline]
    pub fn arena(&self) -> &VertexArena {
        &*self.arena
    }

    /// Returns the vertex arena for writing scratch vertices.
    #[inline]
    pub fn arena_mut(&mut self) -> &mut VertexArena {
        &mut *self.arena
    }

    /// Returns the number of stages left in the chain, excluding the sink.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns whether the next call goes directly to the sink.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[inline]
    fn split(&mut self) -> Option<(&mut StageKind, Next<'_>)> {
        let (head, rest) = self.stages.split_first_mut()?;
        let next = Next {
            stages: rest,
            arena: &mut *self.arena,
            sink: &mut *self.sink,
        };
        Some((head, next))
    }

    pub fn begin(&mut self) {
        match self.split() {
            Some((st, mut next)) => st.begin(&mut next),
            None => self.sink.begin(),
        }
    }

    pub fn point(&mut self, prim: &Prim) {
        match self.split() {
            Some((st, mut next)) => st.point(prim, &mut next),
            None => self.sink.point(prim, &self.arena[prim.verts[0]]),
        }
    }

    pub fn line(&mut self, prim: &Prim) {
        match self.split() {
            Some((st, mut next)) => st.line(prim, &mut next),
            None => {
                let vs = self.arena.resolve(prim.line_ids());
                self.sink.line(prim, vs)
            }
        }
    }

    pub fn tri(&mut self, prim: &Prim) {
        match self.split() {
            Some((st, mut next)) => st.tri(prim, &mut next),
            None => {
                let vs = self.arena.resolve(prim.tri_ids());
                self.sink.tri(prim, vs)
            }
        }
    }

    pub fn end(&mut self) {
        match self.split() {
            Some((st, mut next)) => st.end(&mut next),
            None => self.sink.end(),
        }
    }

    pub fn reset_stipple_counter(&mut self) {
        match self.split() {
            Some((st, mut next)) => st.reset_stipple_counter(&mut next),
            None => self.sink.reset_stipple_counter(),
        }
    }
}

impl StageKind {
    /// Returns the name of the stage, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flat(_) => "flat",
            Self::Clip(_) => "clip",
            Self::Cull(_) => "cull",
            Self::TwoSide(_) => "twoside",
            Self::Offset(_) => "offset",
            Self::Unfilled(_) => "unfilled",
            Self::Stipple(_) => "stipple",
            Self::Wide(_) => "wide",
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $st:ident => $e:expr) => {
        match $self {
            StageKind::Flat($st) => $e,
            StageKind::Clip($st) => $e,
            StageKind::Cull($st) => $e,
            StageKind::TwoSide($st) => $e,
            StageKind::Offset($st) => $e,
            StageKind::Unfilled($st) => $e,
            StageKind::Stipple($st) => $e,
            StageKind::Wide($st) => $e,
        }
    };
}

impl Stage for StageKind {
    fn begin(&mut self, next: &mut Next) {
        dispatch!(self, st => st.begin(next))
    }
    fn point(&mut self, prim: &Prim, next: &mut Next) {
        dispatch!(self, st => st.point(prim, next))
    }
    fn line(&mut self, prim: &Prim, next: &mut Next) {
        dispatch!(self, st => st.line(prim, next))
    }
    fn tri(&mut self, prim: &Prim, next: &mut Next) {
        dispatch!(self, st => st.tri(prim, next))
    }
    fn end(&mut self, next: &mut Next) {
        dispatch!(self, st => st.end(next))
    }
    fn reset_stipple_counter(&mut self, next: &mut Next) {
        dispatch!(self, st => st.reset_stipple_counter(next))
    }
}

impl Debug for Next<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let names = self.stages.iter().map(StageKind::name);
        f.debug_list().entries(names).entry(&"sink").finish()
    }
}
