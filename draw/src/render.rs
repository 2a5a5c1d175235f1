//! Turning streams of vertices into clipped, culled, and decorated
//! primitives ready for rasterization.
//!
//! This module constitutes the geometry pipeline of `retrofire-draw`. A
//! draw call flows through the following parts in order:
//!
//! 1. [Vertex cache][cache]: element indices are deduplicated and the
//!    corresponding vertices [shaded][shader] in small batches.
//! 2. [Primitive assembly][assemble]: the vertices are grouped into points,
//!    lines, and triangles according to a [topology][prim::Topology].
//! 3. [Stages][stage]: each primitive passes through a chain of stages,
//!    including [clipping][clip], composed by the [pipeline] according to
//!    the current [raster state][state].
//! 4. [Sink][sink]: the surviving primitives are handed to the rasterizer.
//!
//! The [draw context][ctx] ties the parts together.

pub mod assemble;
pub mod cache;
pub mod clip;
pub mod ctx;
pub mod pipeline;
pub mod prim;
pub mod shader;
pub mod sink;
pub mod stage;
pub mod state;
pub mod stats;
pub mod vertex;
