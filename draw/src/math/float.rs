//! Floating-point helpers missing from `core`.

/// Returns the absolute value of `x`.
#[inline]
pub fn abs(x: f32) -> f32 {
    f32::from_bits(x.to_bits() & !(1 << 31))
}
