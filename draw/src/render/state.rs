//! Rasterization state and viewport parameters.

use crate::math::{Vec4, vec4};

/// Polygon winding order in window space.
///
/// Window space has the y axis pointing down, so the triangle *ABC* below
/// has clockwise winding and a positive determinant, while the triangle
/// *DEF* has counter-clockwise winding and a negative determinant.
///
/// ```text
///     B            F
///    / \          / \
///   /   \        /   \
///  /     \      /     \
/// A-------C    D-------E
///    Cw           Ccw
/// ```
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Winding {
    /// Clockwise winding.
    Cw,
    /// Counter-clockwise winding.
    #[default]
    Ccw,
}

/// How to rasterize polygons of a given winding.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillMode {
    /// Fill the interior of the polygon.
    #[default]
    Fill,
    /// Draw the boundary edges of the polygon as lines.
    Line,
    /// Draw the vertices of the polygon as points.
    Point,
}

/// Which faces to cull (discard).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CullMode {
    /// Cull nothing.
    #[default]
    None,
    /// Cull faces wound like the front face.
    Front,
    /// Cull faces wound opposite to the front face.
    Back,
    /// Cull all triangles; points and lines are still drawn.
    Both,
}

/// A pair of values, one for each winding order.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerWinding<T> {
    pub cw: T,
    pub ccw: T,
}

/// Polygon depth offset parameters.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DepthOffset {
    /// Constant offset, in window depth units.
    pub units: f32,
    /// Factor applied to the maximum depth slope of the polygon.
    pub scale: f32,
}

/// Line stipple parameters.
///
/// Bit *n* of `pattern` determines whether pixel *n* of each 16-pixel run
/// of a line is drawn. Each bit is repeated `factor` times; factors outside
/// 1..=256 are clamped to that range.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineStipple {
    pub factor: u16,
    pub pattern: u16,
}

/// The state that determines which pipeline stages are active and how
/// they process primitives.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RasterState {
    /// Polygon fill mode per winding.
    pub fill: PerWinding<FillMode>,
    /// Polygon depth offset per winding, if enabled.
    pub offset: PerWinding<Option<DepthOffset>>,
    /// The winding order of front faces.
    pub front_winding: Winding,
    /// Which faces to cull.
    pub cull: CullMode,
    /// Whether to select back colors for back faces.
    pub two_sided: bool,
    /// Whether to copy the colors of the provoking vertex to the whole
    /// primitive.
    pub flat_shade: bool,
    /// Line width in pixels.
    pub line_width: f32,
    /// Line stipple, if enabled.
    pub line_stipple: Option<LineStipple>,
    /// Point size in pixels, unless given per vertex.
    pub point_size: f32,
    /// Whether points are sprites with generated texture coordinates.
    pub point_sprite: bool,
}

/// The transform from normalized device coordinates to window coordinates.
///
/// `win = ndc * scale + translate`, for the x, y, and z components.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub scale: Vec4,
    pub translate: Vec4,
}

//
// Inherent impls
//

impl Winding {
    /// Returns the winding order of a triangle with determinant `det`,
    /// or `None` if the triangle is degenerate.
    pub fn of(det: f32) -> Option<Self> {
        if det > 0.0 {
            Some(Self::Cw)
        } else if det < 0.0 {
            Some(Self::Ccw)
        } else {
            None
        }
    }

    /// Returns the opposite winding order.
    pub fn flip(self) -> Self {
        match self {
            Self::Cw => Self::Ccw,
            Self::Ccw => Self::Cw,
        }
    }
}

impl<T> PerWinding<T> {
    /// Returns a pair with the same value for both windings.
    pub fn both(val: T) -> Self
    where
        T: Clone,
    {
        Self { cw: val.clone(), ccw: val }
    }

    /// Returns the value for winding `w`.
    pub fn get(&self, w: Winding) -> &T {
        match w {
            Winding::Cw => &self.cw,
            Winding::Ccw => &self.ccw,
        }
    }

    /// Returns whether `pred` holds for either value.
    pub fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        pred(&self.cw) || pred(&self.ccw)
    }
}

impl CullMode {
    /// Returns whether a triangle with winding `w` is culled, given the
    /// front face winding `front`.
    pub fn culls(self, w: Winding, front: Winding) -> bool {
        match self {
            Self::None => false,
            Self::Front => w == front,
            Self::Back => w != front,
            Self::Both => true,
        }
    }
}

impl LineStipple {
    /// Returns whether pixel `counter` of a stippled line is drawn.
    #[inline]
    pub fn test(&self, counter: u32) -> bool {
        let factor = u32::from(self.factor.clamp(1, 256));
        let bit = (counter / factor) & 0xF;
        self.pattern & (1 << bit) != 0
    }
}

impl RasterState {
    /// Returns whether polygons of either winding are not filled.
    pub fn is_unfilled(&self) -> bool {
        self.fill.any(|&m| m != FillMode::Fill)
    }

    /// Returns whether depth offset is enabled for either winding.
    pub fn has_offset(&self) -> bool {
        self.offset.any(Option::is_some)
    }
}

impl Viewport {
    /// Returns a viewport mapping NDC to the window rectangle with top left
    /// corner at (`x`, `y`) and dimensions `w` × `h`, and depth to 0..1.
    ///
    /// The y axis is flipped: NDC y = 1 maps to the top of the rectangle.
    ///
    /// # Examples
    /// ```
    /// use retrofire_draw::render::state::Viewport;
    /// use retrofire_draw::math::vec4;
    ///
    /// let vp = Viewport::new(0.0, 0.0, 640.0, 480.0);
    /// assert_eq!(vp.scale, vec4(320.0, -240.0, 0.5, 1.0));
    /// assert_eq!(vp.translate, vec4(320.0, 240.0, 0.5, 0.0));
    /// ```
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        let (hw, hh) = (0.5 * w, 0.5 * h);
        Self {
            scale: vec4(hw, -hh, 0.5, 1.0),
            translate: vec4(x + hw, y + hh, 0.5, 0.0),
        }
    }
}

//
// Trait impls
//

impl Default for RasterState {
    /// Returns the default raster state.
    ///
    /// The default values are:
    /// * Fill mode:      Fill for both windings
    /// * Depth offset:   Disabled
    /// * Front winding:  Counter-clockwise
    /// * Face culling:   None
    /// * Two-sided:      Disabled
    /// * Flat shading:   Disabled
    /// * Line width:     1
    /// * Line stipple:   Disabled
    /// * Point size:     1
    /// * Point sprites:  Disabled
    fn default() -> Self {
        Self {
            fill: PerWinding::default(),
            offset: PerWinding::default(),
            front_winding: Winding::Ccw,
            cull: CullMode::None,
            two_sided: false,
            flat_shade: false,
            line_width: 1.0,
            line_stipple: None,
            point_size: 1.0,
            point_sprite: false,
        }
    }
}

impl Default for Viewport {
    /// Returns the identity transform.
    fn default() -> Self {
        Self {
            scale: vec4(1.0, 1.0, 1.0, 1.0),
            translate: Vec4::ZERO,
        }
    }
}
