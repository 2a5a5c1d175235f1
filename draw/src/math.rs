//! Vectors, interpolation, and approximate comparison.
//!
//! The pipeline only ever handles homogeneous four-component vectors:
//! clip-space positions, window positions, plane equations, and vertex
//! attribute slots all share the [`Vec4`] type. Attribute values are opaque
//! to the pipeline; they are only ever copied or linearly interpolated.

pub use {
    approx::ApproxEq,
    vec::{Vec4, vec4},
};

pub mod approx;
pub mod float;
pub mod vec;

/// Trait for linear interpolation between two values.
pub trait Lerp: Sized {
    /// Linearly interpolates between `self` and `other`.
    ///
    /// if `t` = 0, returns `self`; if `t` = 1, returns `other`.
    /// For 0 < `t` < 1, returns the weighted average of `self` and `other`
    /// ```text
    /// (1 - t) * self + t * other
    /// ```
    ///
    /// This method does not panic if `t < 0.0` or `t > 1.0`, or if `t`
    /// is `NaN`, but the return value in those cases is unspecified.
    ///
    /// # Examples
    /// ```
    /// use retrofire_draw::math::Lerp;
    ///
    /// assert_eq!(f32::lerp(&1.0, &5.0, 0.25), 2.0);
    /// ```
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

/// Linearly interpolates between two values.
///
/// For examples and more information, see [`Lerp::lerp`].
#[inline]
pub fn lerp<T: Lerp>(t: f32, from: T, to: T) -> T {
    from.lerp(&to, t)
}

impl Lerp for f32 {
    #[inline]
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + t * (other - self)
    }
}
