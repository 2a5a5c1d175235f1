//! ```text
//!                                                      ______
//!                         ___                       /´  ____/\
//!       __ ______ _____ /   /\_ _ ______ _____ __  /   /_/___/\ __ _____ ______
//!    ==/  ´ ____/ __   \   ____/ ´ ____/  __  ` __    ___,  /==/  ´  ___/ __   \
//!   ==/   /´=/   ______/  /==/   /´=/   /==/   /=/   /=/   /==/   /´=/   ______/\
//!  ==/   /==/   /____/   /__/   /==/   /__/   /=/   /=/   /__/   /==/   /______\/
//! ==/___/ ==\_______/\______/__/ ==\________,´_/   /==\______/__/ ==\________/\
//! ==\___\/ ==\______\/\_____\__\/ ==\______/_____,´ /==\_____\___\/==\_______\/
//!                                          \_____\,´
//! ```
//!
//! Software geometry pipeline of the `retrofire` project.
//!
//! Sits between a vertex shader and a rasterizer: indexed vertices are
//! deduplicated and shaded in small batches, assembled into points, lines,
//! and triangles according to a drawing topology, and pushed through a chain
//! of per-primitive stages (flat shading, clipping, culling, two-sided
//! color, depth offset, unfilled polygons, line stipple, wide points and
//! lines) before being handed to a terminal [sink][render::sink::Sink].
//!
//! The entry point is [`DrawContext`][render::ctx::DrawContext].
//!
//! # Crate features
//!
//! * `std`:
//!   Enables `std` support in dependencies. If this feature is disabled,
//!   the crate only depends on `alloc`.
//!
//! * `serde`:
//!   Derives `Serialize` and `Deserialize` for the configuration types,
//!   such as [`RasterState`][render::state::RasterState].
//!
//! All features are disabled by default.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;
extern crate core;

pub mod error;
pub mod math;
pub mod render;

pub use error::Error;

pub mod prelude {
    pub use crate::error::Error;
    pub use crate::math::{Lerp, Vec4, vec4};

    pub use crate::render::{
        assemble::{Elements, Topology},
        ctx::DrawContext,
        shader::{VertexOutput, VertexShader},
        sink::Sink,
        state::{CullMode, FillMode, RasterState, Viewport, Winding},
        vertex::{Semantic, ShadedVertex, VertexLayout},
    };
}
