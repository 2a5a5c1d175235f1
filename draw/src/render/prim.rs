//! Primitives and drawing topologies.

use bitflags::bitflags;

use crate::error::Error;

use super::vertex::VertexId;

bitflags! {
    /// The set of "real" edges of a triangle.
    ///
    /// Edge *i* runs from vertex *i* to vertex *i* + 1 (mod 3). An edge is
    /// real if it lies on the boundary of the polygon the triangle was
    /// decomposed from, as opposed to being an internal diagonal created by
    /// triangulation or clipping. Only real edges are drawn when polygons
    /// are rendered as outlines.
    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
    pub struct EdgeFlags: u8 {
        const E0 = 1 << 0;
        const E1 = 1 << 1;
        const E2 = 1 << 2;
    }
}

/// The reduced class of a primitive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Reduced {
    Point,
    Line,
    Tri,
}

/// A point, line, or triangle passed through the pipeline.
///
/// Refers to its vertices by id; the vertex data lives in the
/// [arena][super::vertex::VertexArena] of the draw context. Unused vertex
/// ids of points and lines are copies of the first one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Prim {
    /// The reduced class of this primitive.
    pub kind: Reduced,
    /// The vertex ids.
    pub verts: [VertexId; 3],
    /// Twice the signed window-space area, if computed.
    ///
    /// Zero until the primitive passes the culling stage.
    pub det: f32,
    /// The real edges of a triangle.
    pub edges: EdgeFlags,
    /// Whether to reset the line stipple counter before drawing.
    pub reset_stipple: bool,
}

/// The way a sequence of vertices is assembled into primitives.
///
/// The discriminants match the traditional OpenGL primitive type values.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum Topology {
    /// Each vertex is a point.
    Points = 0,
    /// Each pair of vertices is a line.
    Lines = 1,
    /// A closed chain of lines, the last vertex joined to the first.
    LineLoop = 2,
    /// An open chain of lines.
    LineStrip = 3,
    /// Each triplet of vertices is a triangle.
    Triangles = 4,
    /// Each vertex after the first two forms a triangle with its two
    /// predecessors.
    TriangleStrip = 5,
    /// Each vertex after the first two forms a triangle with its
    /// predecessor and the first vertex.
    TriangleFan = 6,
    /// Each quadruplet of vertices is a quadrilateral.
    Quads = 7,
    /// Each pair of vertices after the first two forms a quadrilateral
    /// with the preceding pair.
    QuadStrip = 8,
    /// All the vertices form a single convex polygon.
    Polygon = 9,
}

//
// Inherent impls
//

impl EdgeFlags {
    /// Returns the flag of edge `i`.
    #[inline]
    pub const fn edge(i: usize) -> Self {
        Self::from_bits_truncate(1 << i)
    }
}

impl Prim {
    /// Returns a point primitive.
    pub fn point(v: VertexId) -> Self {
        Self {
            kind: Reduced::Point,
            verts: [v; 3],
            det: 0.0,
            edges: EdgeFlags::E0,
            reset_stipple: false,
        }
    }

    /// Returns a line primitive.
    pub fn line(v0: VertexId, v1: VertexId, reset_stipple: bool) -> Self {
        Self {
            kind: Reduced::Line,
            verts: [v0, v1, v0],
            det: 0.0,
            edges: EdgeFlags::E0,
            reset_stipple,
        }
    }

    /// Returns a triangle primitive with all edges real.
    pub fn tri(v0: VertexId, v1: VertexId, v2: VertexId) -> Self {
        Self {
            kind: Reduced::Tri,
            verts: [v0, v1, v2],
            det: 0.0,
            edges: EdgeFlags::all(),
            reset_stipple: true,
        }
    }

    /// Returns `self` with edge flags `edges`.
    pub fn with_edges(self, edges: EdgeFlags) -> Self {
        Self { edges, ..self }
    }

    /// Returns `self` with the reset stipple flag set to `reset`.
    pub fn with_reset_stipple(self, reset: bool) -> Self {
        Self { reset_stipple: reset, ..self }
    }

    /// Returns `self` with vertices `verts` and other properties unchanged.
    pub fn with_verts(self, verts: [VertexId; 3]) -> Self {
        Self { verts, ..self }
    }

    /// Returns the vertex id of a point.
    #[inline]
    pub fn point_ids(&self) -> [VertexId; 1] {
        [self.verts[0]]
    }

    /// Returns the vertex ids of a line.
    #[inline]
    pub fn line_ids(&self) -> [VertexId; 2] {
        [self.verts[0], self.verts[1]]
    }

    /// Returns the vertex ids of a triangle.
    #[inline]
    pub fn tri_ids(&self) -> [VertexId; 3] {
        self.verts
    }

    /// Returns the number of vertices of `self`.
    pub fn num_verts(&self) -> usize {
        self.kind.num_verts()
    }
}

impl Reduced {
    /// Returns the number of vertices of a primitive of this class.
    pub const fn num_verts(self) -> usize {
        match self {
            Self::Point => 1,
            Self::Line => 2,
            Self::Tri => 3,
        }
    }
}

impl Topology {
    /// Returns the reduced class of the primitives of this topology.
    ///
    /// # Examples
    /// ```
    /// use retrofire_draw::render::prim::{Reduced, Topology};
    ///
    /// assert_eq!(Topology::LineLoop.reduced(), Reduced::Line);
    /// assert_eq!(Topology::QuadStrip.reduced(), Reduced::Tri);
    /// ```
    pub const fn reduced(self) -> Reduced {
        use Topology::*;
        match self {
            Points => Reduced::Point,
            Lines | LineLoop | LineStrip => Reduced::Line,
            Triangles | TriangleStrip | TriangleFan | Quads | QuadStrip
            | Polygon => Reduced::Tri,
        }
    }
}

//
// Trait impls
//

impl TryFrom<u32> for Topology {
    type Error = Error;

    fn try_from(id: u32) -> Result<Self, Error> {
        use Topology::*;
        Ok(match id {
            0 => Points,
            1 => Lines,
            2 => LineLoop,
            3 => LineStrip,
            4 => Triangles,
            5 => TriangleStrip,
            6 => TriangleFan,
            7 => Quads,
            8 => QuadStrip,
            9 => Polygon,
            _ => return Err(Error::UnknownTopology(id)),
        })
    }
}
