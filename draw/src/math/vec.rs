//! Four-component vectors.

use core::fmt::{self, Debug, Formatter};
use core::ops::{Add, Index, IndexMut, Mul, Neg, Sub};

use super::Lerp;

/// A four-component `f32` vector.
///
/// Used for homogeneous clip-space positions, window coordinates, plane
/// equations, and the contents of vertex attribute slots.
#[derive(Copy, Clone, Default, PartialEq)]
#[repr(transparent)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec4(pub [f32; 4]);

/// Returns a new `Vec4` with the given components.
#[inline]
pub const fn vec4(x: f32, y: f32, z: f32, w: f32) -> Vec4 {
    Vec4([x, y, z, w])
}

impl Vec4 {
    /// The zero vector.
    pub const ZERO: Self = vec4(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn x(&self) -> f32 {
        self.0[0]
    }
    #[inline]
    pub const fn y(&self) -> f32 {
        self.0[1]
    }
    #[inline]
    pub const fn z(&self) -> f32 {
        self.0[2]
    }
    #[inline]
    pub const fn w(&self) -> f32 {
        self.0[3]
    }

    /// Returns the dot product of `self` and `other`.
    ///
    /// # Examples
    /// ```
    /// use retrofire_draw::math::vec4;
    ///
    /// let plane = vec4(-1.0, 0.0, 0.0, 1.0);
    /// assert_eq!(plane.dot(&vec4(0.5, 3.0, 2.0, 1.0)), 0.5);
    /// ```
    #[inline]
    pub fn dot(&self, other: &Self) -> f32 {
        let [a, b, c, d] = self.0;
        let [x, y, z, w] = other.0;
        a * x + b * y + c * z + d * w
    }

    /// Returns `self` with each component mapped by `f`.
    #[inline]
    pub fn map(self, f: impl FnMut(f32) -> f32) -> Self {
        Self(self.0.map(f))
    }
}

impl Lerp for Vec4 {
    #[inline]
    fn lerp(&self, other: &Self, t: f32) -> Self {
        let mut res = *self;
        for (r, o) in res.0.iter_mut().zip(&other.0) {
            *r = r.lerp(o, t);
        }
        res
    }
}

impl Debug for Vec4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Vec4{:?}", self.0)
    }
}

impl From<[f32; 4]> for Vec4 {
    #[inline]
    fn from(els: [f32; 4]) -> Self {
        Self(els)
    }
}

impl Index<usize> for Vec4 {
    type Output = f32;
    #[inline]
    fn index(&self, i: usize) -> &f32 {
        &self.0[i]
    }
}

impl IndexMut<usize> for Vec4 {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        &mut self.0[i]
    }
}

impl Add for Vec4 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut res = self;
        for (r, o) in res.0.iter_mut().zip(rhs.0) {
            *r += o;
        }
        res
    }
}

impl Sub for Vec4 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self + -rhs
    }
}

impl Neg for Vec4 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self.map(|a| -a)
    }
}

impl Mul<f32> for Vec4 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f32) -> Self {
        self.map(|a| a * rhs)
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;

    use super::*;

    #[test]
    fn arithmetic() {
        let a = vec4(1.0, -2.0, 3.0, 0.5);
        let b = vec4(-1.0, 1.0, 0.0, 0.5);
        assert_eq!(a + b, vec4(0.0, -1.0, 3.0, 1.0));
        assert_eq!(a - b, vec4(2.0, -3.0, 3.0, 0.0));
        assert_eq!(a * 2.0, vec4(2.0, -4.0, 6.0, 1.0));
        assert_eq!(-a, vec4(-1.0, 2.0, -3.0, -0.5));
    }

    #[test]
    fn dot_product() {
        assert_eq!(vec4(1.0, 0.0, 0.0, 1.0).dot(&vec4(2.0, 5.0, 7.0, 3.0)), 5.0);
        assert_eq!(vec4(0.5, 0.5, 0.0, 0.0).dot(&vec4(-2.0, 2.0, 9.0, 9.0)), 0.0);
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = vec4(0.0, 2.0, -4.0, 1.0);
        let b = vec4(4.0, 2.0, 4.0, 3.0);
        assert_eq!(a.lerp(&b, 0.0), a);
        assert_eq!(a.lerp(&b, 1.0), b);
        assert_eq!(a.lerp(&b, 0.5), vec4(2.0, 2.0, 0.0, 2.0));
    }

    #[test]
    fn debug() {
        assert_eq!(
            format!("{:?}", vec4(1.0, -2.0, 3.0, -4.0)),
            "Vec4[1.0, -2.0, 3.0, -4.0]"
        );
    }
}
