//! The terminal end of the pipeline.

use alloc::vec::Vec;

use super::prim::{Prim, Reduced};
use super::vertex::ShadedVertex;

/// Receives the primitives that make it through the pipeline.
///
/// Typically the setup stage of a rasterizer. The vertex references are
/// resolved from the vertex arena before each call and are only valid for
/// the duration of the call.
pub trait Sink {
    /// Called at the start of each batch of primitives.
    fn begin(&mut self) {}

    /// Receives a point.
    fn point(&mut self, prim: &Prim, v: &ShadedVertex);

    /// Receives a line.
    fn line(&mut self, prim: &Prim, vs: [&ShadedVertex; 2]);

    /// Receives a triangle.
    fn tri(&mut self, prim: &Prim, vs: [&ShadedVertex; 3]);

    /// Called at the end of each batch of primitives.
    fn end(&mut self) {}

    /// Resets the line stipple counter, if the sink does stippling.
    fn reset_stipple_counter(&mut self) {}
}

/// A primitive received by a [`Recorder`], with copies of its vertices.
///
/// Unused vertices of points and lines are copies of the first vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct Recorded {
    pub prim: Prim,
    pub verts: [ShadedVertex; 3],
}

/// A sink that records everything it receives.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    /// The primitives received, in order.
    pub prims: Vec<Recorded>,
    /// The number of `begin` calls.
    pub begins: usize,
    /// The number of `end` calls.
    pub ends: usize,
    /// The number of `reset_stipple_counter` calls.
    pub stipple_resets: usize,
}

impl Recorder {
    /// Returns the recorded primitives of class `kind`.
    pub fn of_kind(&self, kind: Reduced) -> impl Iterator<Item = &Recorded> {
        self.prims.iter().filter(move |r| r.prim.kind == kind)
    }

    /// Removes all recorded data.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Sink for Recorder {
    fn begin(&mut self) {
        self.begins += 1;
    }

    fn point(&mut self, prim: &Prim, v: &ShadedVertex) {
        self.prims.push(Recorded { prim: *prim, verts: [*v; 3] });
    }

    fn line(&mut self, prim: &Prim, [v0, v1]: [&ShadedVertex; 2]) {
        let verts = [*v0, *v1, *v0];
        self.prims.push(Recorded { prim: *prim, verts });
    }

    fn tri(&mut self, prim: &Prim, vs: [&ShadedVertex; 3]) {
        self.prims.push(Recorded { prim: *prim, verts: vs.map(|v| *v) });
    }

    fn end(&mut self) {
        self.ends += 1;
    }

    fn reset_stipple_counter(&mut self) {
        self.stipple_resets += 1;
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn begin(&mut self) {
        (**self).begin()
    }
    fn point(&mut self, prim: &Prim, v: &ShadedVertex) {
        (**self).point(prim, v)
    }
    fn line(&mut self, prim: &Prim, vs: [&ShadedVertex; 2]) {
        (**self).line(prim, vs)
    }
    fn tri(&mut self, prim: &Prim, vs: [&ShadedVertex; 3]) {
        (**self).tri(prim, vs)
    }
    fn end(&mut self) {
        (**self).end()
    }
    fn reset_stipple_counter(&mut self) {
        (**self).reset_stipple_counter()
    }
}
