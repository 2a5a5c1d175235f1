//! Shaded vertices and the storage they live in.
//!
//! All vertices processed by the pipeline live in a single [`VertexArena`]
//! owned by the draw context. Primitives refer to them by [`VertexId`]
//! rather than by reference, so a primitive can be queued, passed down the
//! stage chain, and resolved to actual vertex data only where needed.
//!
//! The arena is partitioned into the vertex cache region, which holds
//! vertices fetched and shaded by the [cache][super::cache], followed by one
//! [`Scratch`] region per pipeline stage. A stage that needs to modify a
//! vertex first duplicates it into its own scratch region; cached vertices
//! are never modified after shading, as they may be shared by several
//! primitives.
//! ```text
//! +-------------------------+-------------+------+-----------+-----
//! | cache slots | overflow  | clip scratch| flat | offset .. |
//! +-------------------------+-------------+------+-----------+-----
//! ```

use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use crate::error::{Error, Result};
use crate::math::Vec4;

use super::clip::ClipMask;
use super::state::Viewport;

/// The maximum number of attribute slots in a vertex.
pub const MAX_ATTRIBS: usize = 16;

/// The meaning of a vertex attribute slot.
///
/// Most attributes are opaque to the pipeline and only ever interpolated.
/// Some stages, however, need to locate particular attributes: flat shading
/// and two-sided lighting operate on colors, and wide points read the point
/// size and write sprite texture coordinates.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Semantic {
    /// An attribute the pipeline does not need to know anything about.
    #[default]
    Generic,
    /// Front-facing primary (0) or secondary (1) color.
    Color(u8),
    /// Back-facing primary (0) or secondary (1) color.
    BackColor(u8),
    /// Texture coordinate set `n`.
    TexCoord(u8),
    /// Per-vertex point size, in the x component.
    PointSize,
    /// Fog coordinate.
    Fog,
}

/// The attribute layout of the vertices output by the vertex shader.
///
/// Fixed for the duration of a draw call. Only the first [`len`][Self::len]
/// attribute slots of each vertex are active; the rest are ignored.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VertexLayout {
    semantics: [Semantic; MAX_ATTRIBS],
    len: usize,
}

/// A vertex output by the vertex shader, with derived data.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ShadedVertex {
    /// Position in homogeneous clip space.
    pub clip: Vec4,
    /// Window position: x and y in pixels, z in depth range, and 1/w.
    ///
    /// Only meaningful if [`clip_mask`][Self::clip_mask] is zero.
    pub win: Vec4,
    /// The set of clip planes this vertex is outside of.
    pub clip_mask: ClipMask,
    /// Whether the polygon edge starting at this vertex is a boundary edge.
    pub edge_flag: bool,
    /// The attribute slots.
    pub attribs: [Vec4; MAX_ATTRIBS],
}

/// An index of a vertex in a [`VertexArena`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VertexId(pub(crate) u32);

/// Backing storage for all the vertices of a draw context.
#[derive(Clone, Debug, Default)]
pub struct VertexArena {
    verts: Vec<ShadedVertex>,
}

/// A stage-private region of the vertex arena.
///
/// Handed out by [`VertexArena::reserve`] when a pipeline is built. The
/// region is reused for every primitive the stage handles, so a vertex in
/// it is only valid until the owning stage receives its next primitive.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Scratch {
    base: u32,
    len: u32,
    next: u32,
}

//
// Inherent impls
//

impl VertexLayout {
    /// Creates a layout with the given attribute semantics.
    ///
    /// # Errors
    /// If `semantics.len() > MAX_ATTRIBS`.
    ///
    /// # Examples
    /// ```
    /// use retrofire_draw::render::vertex::{Semantic::*, VertexLayout};
    ///
    /// let layout = VertexLayout::new(&[Color(0), BackColor(0), TexCoord(0)])
    ///     .unwrap();
    /// assert_eq!(layout.len(), 3);
    /// assert_eq!(layout.find(TexCoord(0)), Some(2));
    /// ```
    pub fn new(semantics: &[Semantic]) -> Result<Self> {
        if semantics.len() > MAX_ATTRIBS {
            return Err(Error::TooManyAttributes(semantics.len()));
        }
        let mut res = Self {
            semantics: [Semantic::Generic; MAX_ATTRIBS],
            len: semantics.len(),
        };
        res.semantics[..semantics.len()].copy_from_slice(semantics);
        Ok(res)
    }

    /// Creates a layout of `n` generic attributes.
    ///
    /// # Errors
    /// If `n > MAX_ATTRIBS`.
    pub fn generic(n: usize) -> Result<Self> {
        if n > MAX_ATTRIBS {
            return Err(Error::TooManyAttributes(n));
        }
        Self::new(&[Semantic::Generic; MAX_ATTRIBS][..n])
    }

    /// Returns the number of active attribute slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether there are no attributes besides the position.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the semantics of the active slots.
    pub fn semantics(&self) -> &[Semantic] {
        &self.semantics[..self.len]
    }

    /// Returns the first slot with semantic `sem`, if any.
    pub fn find(&self, sem: Semantic) -> Option<usize> {
        self.semantics().iter().position(|&s| s == sem)
    }

    /// Returns the slots of all front and back colors.
    pub fn color_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots_where(|s| {
            matches!(s, Semantic::Color(_) | Semantic::BackColor(_))
        })
    }

    /// Returns the slots of all texture coordinates.
    pub fn tex_coord_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots_where(|s| matches!(s, Semantic::TexCoord(_)))
    }

    /// Returns pairs of (back color, front color) slots with matching
    /// color indices.
    pub fn back_to_front(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.semantics()
            .iter()
            .enumerate()
            .filter_map(move |(back, s)| match s {
                Semantic::BackColor(n) => {
                    let front = self.find(Semantic::Color(*n))?;
                    Some((back, front))
                }
                _ => None,
            })
    }

    fn slots_where<'a>(
        &'a self,
        pred: impl Fn(&Semantic) -> bool + 'a,
    ) -> impl Iterator<Item = usize> + 'a {
        self.semantics()
            .iter()
            .enumerate()
            .filter_map(move |(i, s)| pred(s).then_some(i))
    }
}

impl ShadedVertex {
    /// Computes the window position of `self` from its clip position.
    ///
    /// Performs the perspective divide and applies the viewport transform.
    #[inline]
    pub fn project(&mut self, vp: &Viewport) {
        let w = self.clip.w();
        // Only possible for vertices exactly at the eye point, which are
        // always clipped away by the near plane anyway.
        let oow = if w != 0.0 { 1.0 / w } else { 0.0 };
        let [sx, sy, sz, _] = vp.scale.0;
        let [tx, ty, tz, _] = vp.translate.0;
        self.win.0 = [
            self.clip.x() * oow * sx + tx,
            self.clip.y() * oow * sy + ty,
            self.clip.z() * oow * sz + tz,
            oow,
        ];
    }

    /// Copies attribute slots `slots` from `src` to `self`.
    #[inline]
    pub fn copy_slots(
        &mut self,
        src: &ShadedVertex,
        slots: impl IntoIterator<Item = usize>,
    ) {
        for i in slots {
            self.attribs[i] = src.attribs[i];
        }
    }
}

impl VertexArena {
    /// Creates an arena with `n` default-initialized vertices.
    pub fn new(n: usize) -> Self {
        Self { verts: alloc::vec![ShadedVertex::default(); n] }
    }

    /// Returns the number of vertices in `self`.
    pub fn len(&self) -> usize {
        self.verts.len()
    }

    /// Returns whether `self` has no vertices.
    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    /// Shrinks `self` to `n` vertices, releasing any scratch regions
    /// after the first `n` vertices.
    pub fn truncate(&mut self, n: usize) {
        self.verts.truncate(n);
    }

    /// Appends a new scratch region of `n` vertices and returns it.
    pub fn reserve(&mut self, n: usize) -> Scratch {
        let base = self.verts.len() as u32;
        self.verts
            .resize(self.verts.len() + n, ShadedVertex::default());
        Scratch { base, len: n as u32, next: 0 }
    }

    /// Copies the vertex `src` over the vertex `dst`.
    #[inline]
    pub fn copy(&mut self, src: VertexId, dst: VertexId) {
        if src != dst {
            self.verts[dst.0 as usize] = self.verts[src.0 as usize];
        }
    }

    /// Resolves an array of ids to an array of vertex references.
    #[inline]
    pub fn resolve<const N: usize>(
        &self,
        ids: [VertexId; N],
    ) -> [&ShadedVertex; N] {
        ids.map(|id| &self[id])
    }
}

impl Scratch {
    /// Returns the capacity of `self`.
    pub fn capacity(&self) -> usize {
        self.len as usize
    }

    /// Returns the id of the `i`th vertex of `self`.
    ///
    /// # Panics
    /// If `i` is not less than the capacity of `self`.
    #[inline]
    pub fn slot(&self, i: usize) -> VertexId {
        assert!(i < self.capacity(), "scratch slot {i} out of bounds");
        VertexId(self.base + i as u32)
    }

    /// Copies `src` into the `i`th slot of `self` and returns the id
    /// of the copy.
    #[inline]
    pub fn dup(
        &self,
        arena: &mut VertexArena,
        src: VertexId,
        i: usize,
    ) -> VertexId {
        let dst = self.slot(i);
        arena.copy(src, dst);
        dst
    }

    /// Returns the id of the next unused slot of `self`.
    ///
    /// Slots are handed out in order until [`reset`][Self::reset] is called.
    ///
    /// # Panics
    /// If all slots are already in use.
    #[inline]
    pub fn alloc(&mut self) -> VertexId {
        let id = self.slot(self.next as usize);
        self.next += 1;
        id
    }

    /// Marks all slots of `self` unused.
    #[inline]
    pub fn reset(&mut self) {
        self.next = 0;
    }
}

//
// Trait impls
//

impl Default for VertexLayout {
    fn default() -> Self {
        Self {
            semantics: [Semantic::Generic; MAX_ATTRIBS],
            len: 0,
        }
    }
}

impl Index<VertexId> for VertexArena {
    type Output = ShadedVertex;

    #[inline]
    fn index(&self, id: VertexId) -> &ShadedVertex {
        &self.verts[id.0 as usize]
    }
}

impl IndexMut<VertexId> for VertexArena {
    #[inline]
    fn index_mut(&mut self, id: VertexId) -> &mut ShadedVertex {
        &mut self.verts[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use crate::math::vec4;

    use super::Semantic::*;
    use super::*;

    #[test]
    fn layout_too_many_attributes() {
        let sems = [Generic; MAX_ATTRIBS + 1];
        assert_eq!(
            VertexLayout::new(&sems),
            Err(Error::TooManyAttributes(MAX_ATTRIBS + 1))
        );
        assert_eq!(
            VertexLayout::generic(MAX_ATTRIBS + 3),
            Err(Error::TooManyAttributes(MAX_ATTRIBS + 3))
        );
    }

    #[test]
    fn layout_slot_queries() {
        let layout = VertexLayout::new(&[
            TexCoord(0),
            Color(0),
            Color(1),
            BackColor(1),
            BackColor(0),
            PointSize,
        ])
        .unwrap();

        assert_eq!(layout.len(), 6);
        assert_eq!(layout.find(PointSize), Some(5));
        assert_eq!(layout.find(Fog), None);
        assert!(layout.color_slots().eq([1, 2, 3, 4]));
        assert!(layout.tex_coord_slots().eq([0]));
        assert!(layout.back_to_front().eq([(3, 2), (4, 1)]));
    }

    #[test]
    fn back_color_without_front_is_ignored() {
        let layout = VertexLayout::new(&[BackColor(0), Color(1)]).unwrap();
        assert_eq!(layout.back_to_front().count(), 0);
    }

    #[test]
    fn project_applies_viewport() {
        let vp = Viewport {
            scale: vec4(50.0, -50.0, 0.5, 0.0),
            translate: vec4(50.0, 50.0, 0.5, 0.0),
        };
        let mut v = ShadedVertex {
            clip: vec4(1.0, 1.0, -2.0, 2.0),
            ..ShadedVertex::default()
        };
        v.project(&vp);
        assert_eq!(v.win, vec4(75.0, 25.0, 0.0, 0.5));
    }

    #[test]
    fn scratch_regions_are_disjoint() {
        let mut arena = VertexArena::new(4);
        let a = arena.reserve(2);
        let b = arena.reserve(3);
        assert_eq!(arena.len(), 9);
        assert_eq!(a.slot(0), VertexId(4));
        assert_eq!(a.slot(1), VertexId(5));
        assert_eq!(b.slot(0), VertexId(6));
        assert_eq!(b.slot(2), VertexId(8));
    }

    #[test]
    #[should_panic]
    fn scratch_slot_out_of_bounds() {
        let mut arena = VertexArena::new(0);
        let s = arena.reserve(2);
        s.slot(2);
    }

    #[test]
    fn scratch_alloc_and_reset() {
        let mut arena = VertexArena::new(1);
        let mut s = arena.reserve(2);
        assert_eq!(s.alloc(), VertexId(1));
        assert_eq!(s.alloc(), VertexId(2));
        s.reset();
        assert_eq!(s.alloc(), VertexId(1));
    }

    #[test]
    fn dup_copies_vertex() {
        let mut arena = VertexArena::new(1);
        arena[VertexId(0)].attribs[3] = vec4(1.0, 2.0, 3.0, 4.0);
        let s = arena.reserve(1);

        let id = s.dup(&mut arena, VertexId(0), 0);
        arena[id].attribs[3].0[0] = -1.0;

        assert_eq!(arena[VertexId(0)].attribs[3], vec4(1.0, 2.0, 3.0, 4.0));
        assert_eq!(arena[id].attribs[3], vec4(-1.0, 2.0, 3.0, 4.0));
    }
}
