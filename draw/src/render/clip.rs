//! Clipping geometric shapes against planes.
//!
//! Clipping means converting a shape into another, such that only the points
//! inside a volume enclosed by one or more planes remain; "inside" is defined
//! as the half-space that the plane's normal vector points into. In other
//! words, clipping computes the intersection between a shape and a (possibly
//! unbounded) convex polyhedron defined by the planes.
//!
//! In particular, this module implements clipping of points, lines, and
//! triangles against the six planes comprising the
//! [*view frustum*][view_frustum], plus up to [`MAX_USER_PLANES`] arbitrary
//! user-defined planes, in order to avoid drawing objects that are behind
//! the camera, outside the bounds of the viewport, or otherwise cut away.
//! Clipping happens in homogeneous clip space, before the perspective divide.

use alloc::vec::Vec;
use core::mem::swap;

use bitflags::bitflags;

use crate::error::{Error, Result};
use crate::math::{Lerp, Vec4, vec4};

use super::prim::{EdgeFlags, Prim};
use super::stage::{Next, Stage};
use super::state::Viewport;
use super::vertex::{Scratch, ShadedVertex, VertexArena, VertexId};

/// The number of view frustum planes.
pub const FRUSTUM_PLANES: usize = 6;

/// The maximum number of user-defined clip planes.
pub const MAX_USER_PLANES: usize = 6;

/// The maximum number of clip planes in total.
pub const MAX_PLANES: usize = FRUSTUM_PLANES + MAX_USER_PLANES;

/// The maximum number of vertices of a clipped triangle. Each plane can add
/// at most one vertex to a convex polygon.
pub const MAX_CLIPPED_VERTS: usize = 3 + MAX_PLANES;

bitflags! {
    /// A set of clip planes; the *outcode* of a vertex.
    ///
    /// Bit *i* corresponds to the *i*th plane in a [`ClipPlanes`] set:
    /// bits 0 to 5 are the view frustum planes, bits 6 to 11 the user
    /// planes. The outcode of a vertex is the set of planes that the vertex
    /// is outside of.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct ClipMask: u16 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const BOTTOM = 1 << 2;
        const TOP = 1 << 3;
        const NEAR = 1 << 4;
        const FAR = 1 << 5;

        const FRUSTUM = 0x3F;
        const USER = 0xFC0;
    }
}

/// A clip plane, given by the coefficients of its plane equation.
///
/// A point *p* is inside the plane if *p* · `self` ≥ 0.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ClipPlane(pub Vec4);

/// The set of enabled clip planes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClipPlanes {
    planes: [ClipPlane; MAX_PLANES],
    num_user: usize,
}

/// Visibility of a shape in the clip volume.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Status {
    /// Entirely inside the clip volume.
    Visible,
    /// Either outside or partly inside, needs clipping.
    Clipped,
    /// Entirely outside the clip volume.
    Hidden,
}

/// A vertex of a polygon being clipped, and the flag of the edge starting
/// at the vertex.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PolyVert {
    pub id: VertexId,
    pub edge: bool,
}

/// Computes new vertices on the edges crossing a clip plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Interp {
    pub viewport: Viewport,
    pub attribs: usize,
}

/// The clipping stage.
///
/// Passes primitives fully inside the clip volume through unchanged and
/// drops primitives fully outside. Primitives partially inside are clipped,
/// creating new vertices in the scratch region of the stage.
#[derive(Clone, Debug)]
pub struct ClipStage {
    planes: ClipPlanes,
    interp: Interp,
    scratch: Scratch,
    // Reused between primitives to avoid allocations
    polys: [Vec<PolyVert>; 2],
}

/// A view frustum is a truncated, sideways pyramid representing the volume of
/// space that is visible in a viewport with perspective projection. The left,
/// top, right, and bottom sides of the frustum correspond to the edges of the
/// viewport, while the near and far sides (the top and bottom of the pyramid)
/// limit how close-up or far away objects can be drawn.
///
/// In clip space, the frustum becomes the cube -w ≤ x, y, z ≤ w.
pub mod view_frustum {
    use super::*;

    /// The left, right, bottom, top, near, and far clipping planes,
    /// in that order.
    #[rustfmt::skip]
    pub const PLANES: [ClipPlane; FRUSTUM_PLANES] = [
        ClipPlane(vec4( 1.0,  0.0,  0.0,  1.0)), // Left
        ClipPlane(vec4(-1.0,  0.0,  0.0,  1.0)), // Right
        ClipPlane(vec4( 0.0,  1.0,  0.0,  1.0)), // Bottom
        ClipPlane(vec4( 0.0, -1.0,  0.0,  1.0)), // Top
        ClipPlane(vec4( 0.0,  0.0,  1.0,  1.0)), // Near
        ClipPlane(vec4( 0.0,  0.0, -1.0,  1.0)), // Far
    ];

    /// Returns the outcode of the given point against the view frustum.
    #[inline]
    pub fn outcode(pt: &Vec4) -> ClipMask {
        PLANES
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_inside(pt))
            .fold(ClipMask::empty(), |m, (i, _)| m | ClipMask::plane(i))
    }
}

/// Returns the visibility status of a primitive whose vertices have the
/// outcodes `masks`.
pub fn status(masks: &[ClipMask]) -> Status {
    // The set of planes outside which all vertices are
    let all_outside = masks.iter().fold(ClipMask::all(), |m, &c| m & c);
    // The set of planes outside which at least one vertex is
    let any_outside = masks.iter().fold(ClipMask::empty(), |m, &c| m | c);

    if !all_outside.is_empty() {
        // If all vertices are outside at least one plane, the whole
        // primitive is hidden and can be culled. Note that they must be
        // outside the *same* plane; it isn't enough that they are all
        // outside at least *some* plane!
        Status::Hidden
    } else if any_outside.is_empty() {
        Status::Visible
    } else {
        Status::Clipped
    }
}

//
// Inherent impls
//

impl ClipMask {
    /// Returns the mask of the `i`th plane.
    #[inline]
    pub const fn plane(i: usize) -> Self {
        Self::from_bits_retain(1 << i)
    }

    /// Returns the indices of the planes in `self`, lowest first.
    pub fn indices(self) -> impl Iterator<Item = usize> {
        (0..MAX_PLANES).filter(move |&i| self.contains(Self::plane(i)))
    }
}

impl ClipPlane {
    /// Returns the signed distance between `pt` and `self`.
    ///
    /// The return value is positive if `pt` is inside the plane, negative
    /// if `pt` is outside, and zero if `pt` is exactly coincident with the
    /// plane. The distance is scaled by the length of the plane normal.
    /// ```text
    ///            n
    ///            ^       d > 0
    ///            |         x
    ///            |         |
    ///            |_        |
    /// -----x-----+-'------------ self
    ///    d = 0         |
    ///                  x
    ///                d < 0
    /// ```
    #[inline]
    pub fn signed_dist(&self, pt: &Vec4) -> f32 {
        self.0.dot(pt)
    }

    /// Returns whether `pt` is inside `self` or exactly on it.
    #[inline]
    pub fn is_inside(&self, pt: &Vec4) -> bool {
        self.signed_dist(pt) >= 0.0
    }

    /// Clips a convex polygon against `self`.
    ///
    /// Returns the resulting vertices in the out parameter `verts_out`.
    /// New vertices are allocated from `scratch` and computed by `interp`.
    /// A polygon with *n* vertices results in at most *n* + 1 vertices.
    ///
    /// In the diagram below, clipping triangle ABC results in quad ABPQ,
    /// where P and Q are new vertices generated by interpolating between
    /// B and C, and C and A, respectively.
    ///
    /// ```text
    ///     n
    ///     ^            C
    ///     |           / \         outside
    ///     |         /    \
    /// ----+-------Q-------P--------self-----
    ///           /          \
    ///         A--___        \     inside
    ///               `---__   \
    ///                     `---B
    /// ```
    ///
    /// The new vertex on an edge leaving the volume (P above) starts a new
    /// edge along the plane, which is always real. The new vertex on an
    /// edge re-entering the volume (Q) starts the remainder of the original
    /// edge, and inherits the edge flag of its predecessor (C).
    pub fn clip_polygon(
        &self,
        verts_in: &[PolyVert],
        verts_out: &mut Vec<PolyVert>,
        arena: &mut VertexArena,
        scratch: &mut Scratch,
        interp: &Interp,
    ) {
        let Some(&first) = verts_in.first() else {
            return;
        };
        let mut prev = first;
        let mut d_prev = self.signed_dist(&arena[prev.id].clip);

        for &cur in verts_in[1..].iter().chain([&first]) {
            let d_cur = self.signed_dist(&arena[cur.id].clip);

            if d_prev >= 0.0 {
                // prev is inside; emit it as-is. If cur is also inside, it
                // is emitted on the next iteration.
                verts_out.push(prev);
            }
            // Edges whose endpoints have equal signs never cross the plane,
            // so the divisors below are always nonzero.
            if (d_prev < 0.0) != (d_cur < 0.0) {
                let id = scratch.alloc();
                let new = if d_cur < 0.0 {
                    // Going out
                    let t = d_cur / (d_cur - d_prev);
                    interp.split(arena, id, cur.id, prev.id, t);
                    PolyVert { id, edge: true }
                } else {
                    // Coming back in
                    let t = d_prev / (d_prev - d_cur);
                    interp.split(arena, id, prev.id, cur.id, t);
                    PolyVert { id, edge: prev.edge }
                };
                verts_out.push(new);
            }
            prev = cur;
            d_prev = d_cur;
        }
    }
}

impl ClipPlanes {
    /// Returns the view frustum planes plus the given user planes.
    ///
    /// # Errors
    /// If `user.len() > MAX_USER_PLANES`.
    pub fn new(user: &[Vec4]) -> Result<Self> {
        if user.len() > MAX_USER_PLANES {
            return Err(Error::TooManyClipPlanes(user.len()));
        }
        let mut planes = [ClipPlane::default(); MAX_PLANES];
        planes[..FRUSTUM_PLANES].copy_from_slice(&view_frustum::PLANES);
        for (p, &u) in planes[FRUSTUM_PLANES..].iter_mut().zip(user) {
            *p = ClipPlane(u);
        }
        Ok(Self { planes, num_user: user.len() })
    }

    /// Returns the enabled planes.
    pub fn planes(&self) -> &[ClipPlane] {
        &self.planes[..FRUSTUM_PLANES + self.num_user]
    }

    /// Returns the enabled user planes.
    pub fn user_planes(&self) -> &[ClipPlane] {
        &self.planes[FRUSTUM_PLANES..FRUSTUM_PLANES + self.num_user]
    }

    /// Returns the set of enabled planes.
    pub fn enabled(&self) -> ClipMask {
        ClipMask::from_bits_retain((1 << self.planes().len()) - 1)
    }

    /// Returns the `i`th plane.
    pub fn get(&self, i: usize) -> &ClipPlane {
        &self.planes()[i]
    }

    /// Returns the outcode of `pt`.
    ///
    /// The outcode is a bitset where the bit of each plane is 0 if the point
    /// is inside the plane, and 1 otherwise. It is used to determine whether
    /// a primitive is fully inside, partially inside, or fully outside the
    /// clip volume.
    pub fn outcode(&self, pt: &Vec4) -> ClipMask {
        let user = self
            .user_planes()
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_inside(pt))
            .fold(ClipMask::empty(), |m, (i, _)| {
                m | ClipMask::plane(FRUSTUM_PLANES + i)
            });
        view_frustum::outcode(pt) | user
    }
}

impl Interp {
    /// Writes to `dst` the point at parameter `t` on the edge from `out`
    /// to `inside`.
    ///
    /// Interpolates the clip position and the active attributes, and
    /// recomputes the window position. The edge flag of the result is unset.
    pub fn split(
        &self,
        arena: &mut VertexArena,
        dst: VertexId,
        out: VertexId,
        inside: VertexId,
        t: f32,
    ) {
        let (o, i) = (&arena[out], &arena[inside]);
        let mut v = ShadedVertex {
            clip: o.clip.lerp(&i.clip, t),
            ..ShadedVertex::default()
        };
        for (a, (ao, ai)) in v
            .attribs
            .iter_mut()
            .zip(o.attribs.iter().zip(&i.attribs))
            .take(self.attribs)
        {
            *a = ao.lerp(ai, t);
        }
        v.project(&self.viewport);
        arena[dst] = v;
    }
}

impl ClipStage {
    /// The number of scratch vertices needed by the stage.
    ///
    /// Every plane crossing a polygon creates two new vertices, one where
    /// the boundary leaves the half-space and one where it re-enters, even
    /// though the polygon itself grows by at most one.
    pub const SCRATCH: usize = 2 * MAX_PLANES + 1;

    /// Creates a clip stage, reserving its scratch region from `arena`.
    pub fn new(
        planes: ClipPlanes,
        interp: Interp,
        arena: &mut VertexArena,
    ) -> Self {
        let cap = MAX_CLIPPED_VERTS + 1;
        Self {
            planes,
            interp,
            scratch: arena.reserve(Self::SCRATCH),
            polys: [Vec::with_capacity(cap), Vec::with_capacity(cap)],
        }
    }

    fn clip_line(&mut self, prim: &Prim, mask: ClipMask, next: &mut Next) {
        let [i0, i1] = prim.line_ids();
        let arena = next.arena_mut();
        let (p0, p1) = (arena[i0].clip, arena[i1].clip);

        // Parametric distances to cut off each end of the line
        let (mut t0, mut t1) = (0.0f32, 0.0f32);
        for i in mask.indices() {
            let plane = self.planes.get(i);
            let d0 = plane.signed_dist(&p0);
            let d1 = plane.signed_dist(&p1);
            if d1 < 0.0 {
                t1 = t1.max(d1 / (d1 - d0));
            }
            if d0 < 0.0 {
                t0 = t0.max(d0 / (d0 - d1));
            }
            if t0 + t1 >= 1.0 {
                // Nothing left
                return;
            }
        }
        let mut out = *prim;
        if !arena[i0].clip_mask.is_empty() {
            let v = self.scratch.slot(0);
            self.interp.split(arena, v, i0, i1, t0);
            out.verts[0] = v;
        }
        if !arena[i1].clip_mask.is_empty() {
            let v = self.scratch.slot(1);
            self.interp.split(arena, v, i1, i0, t1);
            out.verts[1] = v;
        }
        next.line(&out);
    }

    /// Clips a convex polygon against the planes in `mask` and emits the
    /// result as a triangle fan.
    ///
    /// Properties other than vertices and edges are taken from `prim`.
    pub fn clip_polygon(
        &mut self,
        poly: &[PolyVert],
        mask: ClipMask,
        prim: &Prim,
        next: &mut Next,
    ) {
        debug_assert!(poly.len() <= MAX_CLIPPED_VERTS);
        self.scratch.reset();

        let [verts_in, verts_out] = &mut self.polys;
        verts_in.clear();
        verts_in.extend_from_slice(poly);

        let arena = next.arena_mut();
        // Planes are processed in bit order, lowest first
        for i in mask.indices() {
            if verts_in.len() < 3 {
                break;
            }
            verts_out.clear();
            self.planes.get(i).clip_polygon(
                verts_in,
                verts_out,
                arena,
                &mut self.scratch,
                &self.interp,
            );
            swap(verts_in, verts_out);
        }
        if verts_in.len() >= 3 {
            emit_fan(verts_in, prim, next);
        }
    }
}

/// Emits a convex polygon as a fan of triangles around its first vertex.
///
/// Clipping a triangle results in an n-gon, where n depends on how many
/// planes the triangle intersects. For example, here clipping triangle ABC
/// generated three new vertices, resulting in quad APQR. The quad is turned
/// into triangles RAP and PQA, preserving the edge flags of the boundary
/// edges and marking the internal diagonal PA as not real:
///
/// ```text
///              B
///
///           /     \
///             Q_____P___________
///        /    |..../..\
///             |.../.....\
///     /       |./.........\
///             |/............\
///   C  _  _  _R_______________A
///             |
///             |
/// ```
/// The first vertex of the polygon is the last vertex of each triangle,
/// keeping it in the provoking position.
fn emit_fan(poly: &[PolyVert], prim: &Prim, next: &mut Next) {
    let n = poly.len();
    let v0 = poly[0];
    for i in 2..n {
        let (a, b) = (poly[i - 1], poly[i]);
        let mut edges = EdgeFlags::empty();
        edges.set(EdgeFlags::E0, a.edge);
        edges.set(EdgeFlags::E1, b.edge && i == n - 1);
        edges.set(EdgeFlags::E2, v0.edge && i == 2);

        let tri = prim
            .with_verts([a.id, b.id, v0.id])
            .with_edges(edges)
            .with_reset_stipple(prim.reset_stipple && i == 2);
        next.tri(&tri);
    }
}

//
// Trait impls
//

impl Default for ClipPlanes {
    /// Returns the view frustum planes with no user planes.
    fn default() -> Self {
        let mut planes = [ClipPlane::default(); MAX_PLANES];
        planes[..FRUSTUM_PLANES].copy_from_slice(&view_frustum::PLANES);
        Self { planes, num_user: 0 }
    }
}

impl Stage for ClipStage {
    fn point(&mut self, prim: &Prim, next: &mut Next) {
        let [v] = prim.point_ids();
        if next.arena()[v].clip_mask.is_empty() {
            next.point(prim);
        }
    }

    fn line(&mut self, prim: &Prim, next: &mut Next) {
        let masks = next.arena().resolve(prim.line_ids()).map(|v| v.clip_mask);
        match status(&masks) {
            Status::Visible => next.line(prim),
            Status::Hidden => {}
            Status::Clipped => self.clip_line(prim, masks[0] | masks[1], next),
        }
    }

    fn tri(&mut self, prim: &Prim, next: &mut Next) {
        let ids = prim.tri_ids();
        let masks = next.arena().resolve(ids).map(|v| v.clip_mask);
        match status(&masks) {
            Status::Visible => next.tri(prim),
            Status::Hidden => {}
            Status::Clipped => {
                let poly = [0, 1, 2].map(|i| PolyVert {
                    id: ids[i],
                    edge: prim.edges.contains(EdgeFlags::edge(i)),
                });
                let mask = masks[0] | masks[1] | masks[2];
                self.clip_polygon(&poly, mask, prim, next);
            }
        }
    }
}
