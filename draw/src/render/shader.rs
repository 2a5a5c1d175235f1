//! Vertex shaders.
//!
//! A *vertex shader* is responsible for transforming and projecting each
//! vertex fetched by the pipeline, usually using a modelview matrix to move
//! the vertex to the view (camera) space and a projection matrix to transform
//! it to the clip space. Vertex shaders can also perform any other per-vertex
//! calculations and pass on the results as attributes of the output vertex.
//!
//! The pipeline invokes the shader on small batches of vertices, so that an
//! implementation can amortize per-call overhead or process the batch in
//! a SIMD-friendly way.

use crate::math::Vec4;

use super::vertex::MAX_ATTRIBS;

/// The output of a vertex shader for a single vertex.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VertexOutput {
    /// The vertex position in homogeneous clip space.
    pub pos: Vec4,
    /// The attribute slots. Only the slots in the current vertex layout are
    /// read by the pipeline.
    pub attribs: [Vec4; MAX_ATTRIBS],
    /// Whether the polygon edge starting at this vertex is a boundary edge.
    /// True by default.
    pub edge_flag: bool,
}

/// Trait for vertex shaders.
pub trait VertexShader {
    /// Shades the vertices with element indices `elts`, writing the result
    /// for `elts[i]` into `out[i]`.
    ///
    /// `elts` and `out` have equal lengths, at most
    /// [`SHADE_BATCH`][super::cache::SHADE_BATCH]. The outputs are
    /// initialized to [`VertexOutput::default`] before the call.
    ///
    /// # Panics
    /// `shade` should never panic.
    fn shade(&mut self, elts: &[u32], out: &mut [VertexOutput]);
}

impl<F> VertexShader for F
where
    F: FnMut(u32, &mut VertexOutput),
{
    fn shade(&mut self, elts: &[u32], out: &mut [VertexOutput]) {
        for (&elt, out) in elts.iter().zip(out) {
            self(elt, out);
        }
    }
}

impl Default for VertexOutput {
    fn default() -> Self {
        Self {
            pos: Vec4::ZERO,
            attribs: [Vec4::ZERO; MAX_ATTRIBS],
            edge_flag: true,
        }
    }
}
