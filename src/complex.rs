// SPDX-License-Identifier: AGPL-3.0-only

//! Complex f64 arithmetic for state amplitudes and hopping integrals.
//!
//! State vectors keep real and imaginary parts in separate arrays (one
//! per-site loop touches each array contiguously); this type is the scalar
//! used inside those loops and for reduced inner products.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Complex number with f64 real and imaginary parts.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Complex64 {
    pub re: f64,
    pub im: f64,
}

impl Complex64 {
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };
    pub const ONE: Self = Self { re: 1.0, im: 0.0 };
    pub const I: Self = Self { re: 0.0, im: 1.0 };

    #[inline]
    #[must_use]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Complex conjugate.
    #[inline]
    #[must_use]
    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }

    /// |z|².
    #[inline]
    #[must_use]
    pub fn abs_sq(self) -> f64 {
        self.re.mul_add(self.re, self.im * self.im)
    }

    #[inline]
    #[must_use]
    pub fn abs(self) -> f64 {
        self.abs_sq().sqrt()
    }

    /// e^{i theta}
    #[inline]
    #[must_use]
    pub fn from_polar(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self { re: cos, im: sin }
    }

    /// Multiply by a real factor.
    #[inline]
    #[must_use]
    pub fn scale(self, s: f64) -> Self {
        Self {
            re: self.re * s,
            im: self.im * s,
        }
    }

    /// Multiply by i without a full complex product.
    #[inline]
    #[must_use]
    pub fn mul_i(self) -> Self {
        Self {
            re: -self.im,
            im: self.re,
        }
    }
}

impl Add for Complex64 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl AddAssign for Complex64 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.re += rhs.re;
        self.im += rhs.im;
    }
}

impl Sub for Complex64 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            re: self.re - rhs.re,
            im: self.im - rhs.im,
        }
    }
}

impl SubAssign for Complex64 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.re -= rhs.re;
        self.im -= rhs.im;
    }
}

impl Mul for Complex64 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            re: self.re.mul_add(rhs.re, -(self.im * rhs.im)),
            im: self.re.mul_add(rhs.im, self.im * rhs.re),
        }
    }
}

impl Neg for Complex64 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            re: -self.re,
            im: -self.im,
        }
    }
}

impl fmt::Display for Complex64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im >= 0.0 {
            write!(f, "{:.6}+{:.6}i", self.re, self.im)
        } else {
            write!(f, "{:.6}{:.6}i", self.re, self.im)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complex_add_sub() {
        let a = Complex64::new(1.0, 2.0);
        let b = Complex64::new(3.0, -1.0);
        let c = a + b;
        assert!((c.re - 4.0).abs() < 1e-15);
        assert!((c.im - 1.0).abs() < 1e-15);
        let d = a - b;
        assert!((d.re - (-2.0)).abs() < 1e-15);
        assert!((d.im - 3.0).abs() < 1e-15);
    }

    #[test]
    fn complex_mul() {
        let a = Complex64::new(1.0, 2.0);
        let b = Complex64::new(3.0, 4.0);
        let c = a * b;
        assert!((c.re - (-5.0)).abs() < 1e-15);
        assert!((c.im - 10.0).abs() < 1e-15);
    }

    #[test]
    fn mul_i_matches_product() {
        let a = Complex64::new(0.3, -1.7);
        let fast = a.mul_i();
        let slow = a * Complex64::I;
        assert!((fast.re - slow.re).abs() < 1e-15);
        assert!((fast.im - slow.im).abs() < 1e-15);
    }

    #[test]
    fn conj_product_is_abs_sq() {
        let a = Complex64::new(3.0, 4.0);
        let p = a * a.conj();
        assert!((p.re - 25.0).abs() < 1e-14);
        assert!(p.im.abs() < 1e-14);
        assert!((a.abs() - 5.0).abs() < 1e-15);
    }

    #[test]
    fn from_polar_unit_modulus() {
        for k in 0..16 {
            let z = Complex64::from_polar(f64::from(k) * 0.4);
            assert!((z.abs() - 1.0).abs() < 1e-15);
        }
        let z = Complex64::from_polar(std::f64::consts::FRAC_PI_4);
        let s2 = std::f64::consts::FRAC_1_SQRT_2;
        assert!((z.re - s2).abs() < 1e-15);
        assert!((z.im - s2).abs() < 1e-15);
    }
}
