//! Drawing context and state.

use log::{debug, trace};

use crate::error::Result;
use crate::math::Vec4;

use super::assemble::{Assembler, Elements, PrimQueue};
use super::cache::{CACHE_SIZE, Shading, VertexCache};
use super::clip::ClipPlanes;
use super::pipeline::Pipeline;
use super::prim::Topology;
use super::shader::VertexShader;
use super::sink::Sink;
use super::state::{RasterState, Viewport};
use super::stats::Stats;
use super::vertex::{VertexArena, VertexLayout};

/// Owns the state of the geometry pipeline and runs draw calls.
///
/// State changes take effect on the next draw call. The stage chain is
/// only recomposed when state affecting it has actually changed.
///
/// # Examples
/// ```
/// use retrofire_draw::prelude::*;
/// use retrofire_draw::render::sink::Recorder;
///
/// let mut ctx = DrawContext::new();
/// ctx.set_vertex_attributes(VertexLayout::generic(1).unwrap());
///
/// let mut shader = |i: u32, out: &mut VertexOutput| {
///     let [x, y] = [[0.0, 0.0], [0.5, 0.0], [0.0, 0.5]][i as usize];
///     out.pos = vec4(x, y, 0.0, 1.0);
/// };
/// let mut sink = Recorder::default();
/// ctx.draw(Topology::Triangles, 0, 3, &Elements::Linear, &mut shader, &mut sink);
///
/// assert_eq!(sink.prims.len(), 1);
/// ```
#[derive(Debug)]
pub struct DrawContext {
    viewport: Viewport,
    planes: ClipPlanes,
    raster: RasterState,
    layout: Option<VertexLayout>,

    pipeline: Pipeline,
    /// Whether the pipeline must be recomposed before the next draw.
    dirty: bool,

    arena: VertexArena,
    cache: VertexCache,
    queue: PrimQueue,

    stats: Stats,
}

impl DrawContext {
    /// Creates a context with default state and no vertex layout.
    ///
    /// A layout must be set with
    /// [`set_vertex_attributes`][Self::set_vertex_attributes] before
    /// drawing.
    pub fn new() -> Self {
        Self {
            viewport: Viewport::default(),
            planes: ClipPlanes::default(),
            raster: RasterState::default(),
            layout: None,
            pipeline: Pipeline::default(),
            dirty: true,
            arena: VertexArena::new(CACHE_SIZE),
            cache: VertexCache::new(),
            queue: PrimQueue::new(),
            stats: Stats::new(),
        }
    }

    /// Sets the viewport transform.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if self.viewport != viewport {
            debug!("viewport changed: {viewport:?}");
            self.viewport = viewport;
            self.dirty = true;
        }
    }

    /// Sets the user clip planes, replacing any previous ones.
    ///
    /// The six view frustum planes are always enabled in addition to these.
    ///
    /// # Errors
    /// [`Error::TooManyClipPlanes`][crate::Error::TooManyClipPlanes] if more
    /// than [`MAX_USER_PLANES`][super::clip::MAX_USER_PLANES] planes are
    /// given. The previous planes stay in effect.
    pub fn set_clip_planes(&mut self, planes: &[Vec4]) -> Result<()> {
        let planes = ClipPlanes::new(planes)?;
        if self.planes != planes {
            debug!("{} user clip planes set", planes.user_planes().len());
            self.planes = planes;
            self.dirty = true;
        }
        Ok(())
    }

    /// Sets the raster state.
    pub fn set_raster_state(&mut self, raster: RasterState) {
        if self.raster != raster {
            debug!("raster state changed: {raster:?}");
            self.raster = raster;
            self.dirty = true;
        }
    }

    /// Sets the attribute layout of the vertices output by the shader.
    pub fn set_vertex_attributes(&mut self, layout: VertexLayout) {
        if self.layout != Some(layout) {
            debug!("vertex layout changed: {:?}", layout.semantics());
            self.layout = Some(layout);
            self.dirty = true;
        }
    }

    /// Returns the current viewport.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Returns the current clip planes.
    pub fn clip_planes(&self) -> &ClipPlanes {
        &self.planes
    }

    /// Returns the current raster state.
    pub fn raster_state(&self) -> &RasterState {
        &self.raster
    }

    /// Returns the current vertex layout, if set.
    pub fn vertex_attributes(&self) -> Option<&VertexLayout> {
        self.layout.as_ref()
    }

    /// Returns the statistics accumulated over all draw calls so far.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Resets the accumulated statistics.
    pub fn reset_stats(&mut self) {
        self.stats = Stats::new();
    }

    /// Returns the names of the pipeline stages the next draw call uses,
    /// in order.
    ///
    /// # Panics
    /// If no vertex layout has been set.
    pub fn stage_names(&mut self) -> impl Iterator<Item = &'static str> + '_ {
        self.validate();
        self.pipeline.names()
    }

    /// Draws `count` vertices starting from vertex `start` as primitives
    /// of type `top`.
    ///
    /// Vertex *i* has the element index `elts.get(i)`. The vertices are
    /// shaded with `shader`, and the primitives left after clipping and the
    /// other stages are sent to `sink`. All primitives have been delivered
    /// to `sink` when this method returns.
    ///
    /// # Panics
    /// * If no vertex layout has been set.
    /// * If `top` is [`Topology::Polygon`] and `count` < 3.
    /// * If a vertex index is out of bounds of `elts`.
    /// * If `start + count` overflows `u32`.
    pub fn draw(
        &mut self,
        top: Topology,
        start: u32,
        count: u32,
        elts: &Elements,
        shader: &mut impl VertexShader,
        sink: &mut impl Sink,
    ) {
        self.validate();
        trace!("draw {top:?}, {count} vertices from {start}");

        let mut stats = Stats::start();
        stats.calls = 1.0;

        let attribs = self.layout.map_or(0, |l| l.len());
        let mut asm = Assembler {
            elts,
            cache: &mut self.cache,
            queue: &mut self.queue,
            arena: &mut self.arena,
            shading: Shading {
                shader,
                planes: &self.planes,
                viewport: &self.viewport,
                attribs,
                stats: &mut stats,
            },
            stages: self.pipeline.stages_mut(),
            sink,
        };
        asm.run(top, start, count);
        asm.flush();

        // The shader may see different vertex data on the next call
        self.cache.invalidate();
        self.stats += stats.finish();
    }

    /// Recomposes the pipeline if state has changed.
    fn validate(&mut self) {
        if !self.dirty {
            return;
        }
        let Some(layout) = &self.layout else {
            panic!("no vertex layout set, call set_vertex_attributes first");
        };
        self.pipeline = Pipeline::build(
            &self.raster,
            layout,
            &self.planes,
            &self.viewport,
            &mut self.arena,
        );
        self.dirty = false;
    }
}

impl Default for DrawContext {
    fn default() -> Self {
        Self::new()
    }
}
