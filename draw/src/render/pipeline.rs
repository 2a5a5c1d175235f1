//! Composing the chain of pipeline stages.

use alloc::vec::Vec;
use core::fmt::{self, Debug, Formatter};

use log::debug;

use super::cache::CACHE_SIZE;
use super::clip::{ClipPlanes, ClipStage, Interp};
use super::stage::{
    CullStage, FlatStage, OffsetStage, StageKind, StippleStage, TwoSideStage,
    UnfilledStage, WideStage,
};
use super::state::{RasterState, Viewport};
use super::vertex::{VertexArena, VertexLayout};

/// An ordered chain of stages.
///
/// Clipping and culling are always present; the other stages only when
/// the raster state calls for them.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<StageKind>,
}

impl Pipeline {
    /// Composes the stages needed to draw with the given state.
    ///
    /// Releases all scratch regions of `arena` past the vertex cache, then
    /// reserves a new region for each stage that needs one.
    ///
    /// The stages are ordered as follows, optional ones in brackets:
    /// ```text
    /// [flat] → clip → cull → [twoside] → [offset] → [unfilled] →
    ///     [stipple] → [wide]
    /// ```
    pub fn build(
        state: &RasterState,
        layout: &VertexLayout,
        planes: &ClipPlanes,
        viewport: &Viewport,
        arena: &mut VertexArena,
    ) -> Self {
        use StageKind::*;

        arena.truncate(CACHE_SIZE);
        let mut stages = Vec::new();

        if state.flat_shade {
            stages.push(Flat(FlatStage::new(*layout, arena)));
        }
        let interp = Interp { viewport: *viewport, attribs: layout.len() };
        stages.push(Clip(ClipStage::new(*planes, interp, arena)));
        stages.push(Cull(CullStage::new(state.cull, state.front_winding)));

        if state.two_sided {
            let st = TwoSideStage::new(state.front_winding, *layout, arena);
            stages.push(TwoSide(st));
        }
        if state.has_offset() {
            stages.push(Offset(OffsetStage::new(state.offset, arena)));
        }
        if state.is_unfilled() {
            stages.push(Unfilled(UnfilledStage::new(state.fill)));
        }
        if let Some(stipple) = state.line_stipple {
            let st = StippleStage::new(stipple, layout.len(), arena);
            stages.push(Stipple(st));
        }
        let &RasterState { line_width, point_size, point_sprite, .. } = state;
        if WideStage::is_needed(line_width, point_size, point_sprite, layout) {
            let st = WideStage::new(
                line_width,
                point_size,
                point_sprite,
                *layout,
                arena,
            );
            stages.push(Wide(st));
        }

        let res = Self { stages };
        debug!("composed pipeline {res:?}, arena size {}", arena.len());
        res
    }

    /// Returns the stages in order.
    pub fn stages(&self) -> &[StageKind] {
        &self.stages
    }

    /// Returns the stages in order, for pushing primitives through.
    pub fn stages_mut(&mut self) -> &mut [StageKind] {
        &mut self.stages
    }

    /// Returns the names of the stages in order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.stages.iter().map(StageKind::name)
    }
}

impl Debug for Pipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
