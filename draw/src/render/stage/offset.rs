//! Polygon depth offset.

use crate::math::float::abs;
use crate::render::prim::Prim;
use crate::render::state::{DepthOffset, PerWinding, Winding};
use crate::render::vertex::{Scratch, ShadedVertex, VertexArena};

use super::{Next, Stage};

/// Offsets the window depth of triangles by a constant plus an amount
/// proportional to the depth slope of the triangle.
///
/// Typically used to draw coplanar geometry, such as decals or outlines
/// over filled polygons, without z-fighting.
#[derive(Clone, Debug)]
pub struct OffsetStage {
    params: PerWinding<Option<DepthOffset>>,
    scratch: Scratch,
}

/// Returns the maximum window-space depth slope of triangle `vs` with
/// determinant `det`.
///
/// `det` must be nonzero.
pub fn max_depth_slope([v0, v1, v2]: [&ShadedVertex; 3], det: f32) -> f32 {
    let e = v0.win - v2.win;
    let f = v1.win - v2.win;
    // The x and y components of the normal e × f
    let a = e.y() * f.z() - e.z() * f.y();
    let b = e.z() * f.x() - e.x() * f.z();
    let inv_det = abs(1.0 / det);
    f32::max(abs(a) * inv_det, abs(b) * inv_det)
}

impl DepthOffset {
    /// Returns the depth offset of a triangle with depth slope `slope`.
    #[inline]
    pub fn amount(&self, slope: f32) -> f32 {
        self.units + slope * self.scale
    }
}

impl OffsetStage {
    pub const SCRATCH: usize = 3;

    pub fn new(
        params: PerWinding<Option<DepthOffset>>,
        arena: &mut VertexArena,
    ) -> Self {
        let scratch = arena.reserve(Self::SCRATCH);
        Self { params, scratch }
    }
}

impl Stage for OffsetStage {
    fn tri(&mut self, prim: &Prim, next: &mut Next) {
        let params = Winding::of(prim.det).and_then(|w| *self.params.get(w));
        let Some(params) = params else {
            return next.tri(prim);
        };
        let arena = next.arena_mut();
        let slope = max_depth_slope(arena.resolve(prim.tri_ids()), prim.det);
        let dz = params.amount(slope);

        let mut verts = prim.verts;
        for (i, v) in verts.iter_mut().enumerate() {
            *v = self.scratch.dup(arena, *v, i);
            let z = &mut arena[*v].win.0[2];
            *z = (*z + dz).clamp(0.0, 1.0);
        }
        next.tri(&prim.with_verts(verts));
    }
}

#[cfg(test)]
mod tests {
    use crate::assert_approx_eq;
    use crate::math::vec4;
    use crate::render::sink::Recorder;
    use crate::render::vertex::VertexId;

    use super::*;

    /// A clockwise triangle with depth increasing along x, 0.01 per pixel.
    fn arena(z: f32) -> VertexArena {
        let mut arena = VertexArena::new(3);
        arena[VertexId(0)].win = vec4(0.0, 0.0, z, 1.0);
        arena[VertexId(1)].win = vec4(10.0, 0.0, z + 0.1, 1.0);
        arena[VertexId(2)].win = vec4(0.0, 10.0, z, 1.0);
        arena
    }

    fn run(params: PerWinding<Option<DepthOffset>>, z: f32) -> Recorder {
        let mut arena = arena(z);
        let mut stage = OffsetStage::new(params, &mut arena);
        let mut rec = Recorder::default();
        let prim = Prim {
            det: 100.0,
            ..Prim::tri(VertexId(0), VertexId(1), VertexId(2))
        };
        stage.tri(&prim, &mut Next::new(&mut [], &mut arena, &mut rec));
        rec
    }

    #[test]
    fn slope_of_tilted_tri() {
        let arena = arena(0.5);
        let ids = [VertexId(0), VertexId(1), VertexId(2)];
        assert_approx_eq!(max_depth_slope(arena.resolve(ids), 100.0), 0.01);
    }

    #[test]
    fn constant_and_slope_offset() {
        let off = DepthOffset { units: 0.1, scale: 2.0 };
        let rec = run(PerWinding { cw: Some(off), ccw: None }, 0.5);
        let zs = rec.prims[0].verts.map(|v| v.win.z());
        assert_approx_eq!(zs, [0.62, 0.72, 0.62]);
    }

    #[test]
    fn offset_is_clamped_to_depth_range() {
        let off = DepthOffset { units: 0.5, scale: 0.0 };
        let rec = run(PerWinding::both(Some(off)), 0.7);
        let zs = rec.prims[0].verts.map(|v| v.win.z());
        assert_eq!(zs, [1.0, 1.0, 1.0]);

        let off = DepthOffset { units: -1.0, scale: 0.0 };
        let rec = run(PerWinding::both(Some(off)), 0.7);
        let zs = rec.prims[0].verts.map(|v| v.win.z());
        assert_eq!(zs, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn disabled_winding_passes_through() {
        let off = DepthOffset { units: 0.1, scale: 0.0 };
        let rec = run(PerWinding { cw: None, ccw: Some(off) }, 0.5);
        assert_eq!(rec.prims[0].prim.verts[0], VertexId(0));
        assert_eq!(rec.prims[0].verts[0].win.z(), 0.5);
    }
}
