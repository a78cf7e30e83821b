// SPDX-License-Identifier: AGPL-3.0-only

//! State vectors: split real/imaginary amplitude arrays.
//!
//! A [`StateVector`] holds one complex amplitude ψ(i) per orbital as two
//! equal-length `Vec<f64>` buffers. Every per-site loop runs as a rayon
//! parallel iterator; the call returns only after all sites are written,
//! which is the step barrier the Chebyshev recursion relies on.
//!
//! Inner products use a two-phase reduction: [`StateVector::inner_product_1`]
//! writes one partial sum per block of [`BLOCK_SIZE`] sites into a target
//! vector, and [`StateVector::inner_product_2`] collapses consecutive
//! segments of partials. The recursion fills one segment per moment and
//! reduces all moments in a single pass at the end.
//!
//! Length compatibility is a construction invariant. Mismatched lengths
//! panic.

use rayon::prelude::*;

use crate::complex::Complex64;

/// Sites per partial sum in the two-phase reduction.
pub const BLOCK_SIZE: usize = 512;

/// Complex amplitudes ψ(i) = `real_part[i]` + i·`imag_part[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    real_part: Vec<f64>,
    imag_part: Vec<f64>,
}

impl StateVector {
    /// Zero vector of length `n`.
    #[must_use]
    pub fn zeros(n: usize) -> Self {
        Self {
            real_part: vec![0.0; n],
            imag_part: vec![0.0; n],
        }
    }

    /// Build from host arrays (copied).
    ///
    /// # Panics
    ///
    /// Panics if the two slices differ in length.
    #[must_use]
    pub fn from_host(real: &[f64], imag: &[f64]) -> Self {
        assert_eq!(real.len(), imag.len(), "real/imag length mismatch");
        Self {
            real_part: real.to_vec(),
            imag_part: imag.to_vec(),
        }
    }

    /// Build from complex amplitudes.
    #[must_use]
    pub fn from_amplitudes(amplitudes: &[Complex64]) -> Self {
        Self {
            real_part: amplitudes.iter().map(|z| z.re).collect(),
            imag_part: amplitudes.iter().map(|z| z.im).collect(),
        }
    }

    /// Basis state |site⟩ in an `n`-orbital system.
    ///
    /// # Panics
    ///
    /// Panics if `site >= n`.
    #[must_use]
    pub fn basis(n: usize, site: usize) -> Self {
        let mut v = Self::zeros(n);
        v.real_part[site] = 1.0;
        v
    }

    /// Number of partial sums `inner_product_1` writes for `n` sites.
    #[must_use]
    pub const fn block_count(n: usize) -> usize {
        n.div_ceil(BLOCK_SIZE)
    }

    /// Number of orbitals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.real_part.len()
    }

    /// True for a zero-length vector.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.real_part.is_empty()
    }

    /// Real parts, one per orbital.
    #[must_use]
    pub fn real(&self) -> &[f64] {
        &self.real_part
    }

    /// Imaginary parts, one per orbital.
    #[must_use]
    pub fn imag(&self) -> &[f64] {
        &self.imag_part
    }

    /// Amplitude at site `i`.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize) -> Complex64 {
        Complex64::new(self.real_part[i], self.imag_part[i])
    }

    /// Collect all amplitudes (test and diagnostics helper).
    #[must_use]
    pub fn to_amplitudes(&self) -> Vec<Complex64> {
        self.real_part
            .iter()
            .zip(&self.imag_part)
            .map(|(&re, &im)| Complex64::new(re, im))
            .collect()
    }

    /// Overwrite every site with `f(i)`, in parallel.
    pub(crate) fn par_fill<F>(&mut self, f: F)
    where
        F: Fn(usize) -> Complex64 + Sync + Send,
    {
        self.real_part
            .par_iter_mut()
            .zip(self.imag_part.par_iter_mut())
            .enumerate()
            .for_each(|(i, (re, im))| {
                let z = f(i);
                *re = z.re;
                *im = z.im;
            });
    }

    /// `self += coeff * other` on both parts.
    pub fn add(&mut self, other: &Self, coeff: f64) {
        assert_eq!(self.len(), other.len(), "add: length mismatch");
        self.real_part
            .par_iter_mut()
            .zip(self.imag_part.par_iter_mut())
            .zip(other.real_part.par_iter().zip(other.imag_part.par_iter()))
            .for_each(|((re, im), (&o_re, &o_im))| {
                *re = coeff.mul_add(o_re, *re);
                *im = coeff.mul_add(o_im, *im);
            });
    }

    /// `self += coeff * other` with a complex coefficient.
    pub fn add_complex(&mut self, other: &Self, coeff: Complex64) {
        assert_eq!(self.len(), other.len(), "add_complex: length mismatch");
        self.real_part
            .par_iter_mut()
            .zip(self.imag_part.par_iter_mut())
            .zip(other.real_part.par_iter().zip(other.imag_part.par_iter()))
            .for_each(|((re, im), (&o_re, &o_im))| {
                let z = coeff * Complex64::new(o_re, o_im);
                *re += z.re;
                *im += z.im;
            });
    }

    /// Multiply every amplitude by a real factor.
    pub fn scale(&mut self, factor: f64) {
        self.real_part
            .par_iter_mut()
            .chain(self.imag_part.par_iter_mut())
            .for_each(|x| *x *= factor);
    }

    /// Zero every amplitude in place.
    pub fn set_zero(&mut self) {
        self.real_part.fill(0.0);
        self.imag_part.fill(0.0);
    }

    /// Full-array copy from another vector of the same length.
    pub fn copy(&mut self, other: &Self) {
        assert_eq!(self.len(), other.len(), "copy: length mismatch");
        self.real_part.copy_from_slice(&other.real_part);
        self.imag_part.copy_from_slice(&other.imag_part);
    }

    /// Load amplitudes from externally owned buffers.
    pub fn copy_from_host(&mut self, real: &[f64], imag: &[f64]) {
        self.real_part.copy_from_slice(real);
        self.imag_part.copy_from_slice(imag);
    }

    /// Store amplitudes into externally owned buffers.
    pub fn copy_to_host(&self, real: &mut [f64], imag: &mut [f64]) {
        real.copy_from_slice(&self.real_part);
        imag.copy_from_slice(&self.imag_part);
    }

    /// Exchange buffers with `other` without copying.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(&mut self.real_part, &mut other.real_part);
        std::mem::swap(&mut self.imag_part, &mut other.imag_part);
    }

    /// Phase 1 of ⟨self|other⟩: one partial sum Σ conj(selfᵢ)·otherᵢ per
    /// block of [`BLOCK_SIZE`] sites, written to
    /// `target[offset .. offset + block_count(len)]`.
    ///
    /// # Panics
    ///
    /// Panics on a length mismatch or if `target` is too short.
    pub fn inner_product_1(&self, other: &Self, target: &mut Self, offset: usize) {
        let n = self.len();
        assert_eq!(n, other.len(), "inner_product_1: length mismatch");
        let blocks = Self::block_count(n);
        target.real_part[offset..offset + blocks]
            .par_iter_mut()
            .zip(target.imag_part[offset..offset + blocks].par_iter_mut())
            .enumerate()
            .for_each(|(b, (re, im))| {
                let start = b * BLOCK_SIZE;
                let end = (start + BLOCK_SIZE).min(n);
                let mut sum = Complex64::ZERO;
                for k in start..end {
                    sum += self.get(k).conj() * other.get(k);
                }
                *re = sum.re;
                *im = sum.im;
            });
    }

    /// Phase 2: `target[k] = Σ self[k·segment_len .. (k+1)·segment_len]`
    /// for every entry of `target`.
    ///
    /// # Panics
    ///
    /// Panics if `self` holds fewer than `target.len() * segment_len` values.
    pub fn inner_product_2(&self, target: &mut Self, segment_len: usize) {
        assert!(
            target.len() * segment_len <= self.len(),
            "inner_product_2: {} segments of {segment_len} exceed {} partials",
            target.len(),
            self.len()
        );
        target
            .real_part
            .par_iter_mut()
            .zip(target.imag_part.par_iter_mut())
            .enumerate()
            .for_each(|(k, (re, im))| {
                let range = k * segment_len..(k + 1) * segment_len;
                *re = self.real_part[range.clone()].iter().sum();
                *im = self.imag_part[range].iter().sum();
            });
    }

    /// ⟨self|other⟩ through both reduction phases.
    #[must_use]
    pub fn inner_product(&self, other: &Self) -> Complex64 {
        let blocks = Self::block_count(self.len());
        let mut partial = Self::zeros(blocks);
        self.inner_product_1(other, &mut partial, 0);
        let mut total = Self::zeros(1);
        partial.inner_product_2(&mut total, blocks);
        total.get(0)
    }

    /// ⟨self|self⟩.
    #[must_use]
    pub fn norm_squared(&self) -> f64 {
        self.real_part
            .par_iter()
            .zip(self.imag_part.par_iter())
            .map(|(&re, &im)| re.mul_add(re, im * im))
            .sum()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn ramp(n: usize, phase: f64) -> StateVector {
        let amps: Vec<Complex64> = (0..n)
            .map(|i| Complex64::new((i as f64 * 0.37 + phase).sin(), (i as f64 * 0.11).cos()))
            .collect();
        StateVector::from_amplitudes(&amps)
    }

    fn direct_dot(u: &StateVector, v: &StateVector) -> Complex64 {
        let mut sum = Complex64::ZERO;
        for i in 0..u.len() {
            sum += u.get(i).conj() * v.get(i);
        }
        sum
    }

    #[test]
    fn add_is_axpy() {
        let mut a = StateVector::from_host(&[1.0, 2.0], &[0.5, -1.0]);
        let b = StateVector::from_host(&[4.0, -2.0], &[1.0, 3.0]);
        a.add(&b, 0.5);
        assert_eq!(a.real(), &[3.0, 1.0]);
        assert_eq!(a.imag(), &[1.0, 0.5]);
    }

    #[test]
    fn add_complex_multiplies_phase() {
        let mut a = StateVector::zeros(1);
        let b = StateVector::from_host(&[1.0], &[0.0]);
        a.add_complex(&b, Complex64::new(0.0, -2.0));
        assert_eq!(a.get(0), Complex64::new(0.0, -2.0));
    }

    #[test]
    fn host_round_trip() {
        let v = ramp(7, 0.2);
        let mut re = vec![0.0; 7];
        let mut im = vec![0.0; 7];
        v.copy_to_host(&mut re, &mut im);
        let mut w = StateVector::zeros(7);
        w.copy_from_host(&re, &im);
        assert_eq!(v, w);
    }

    #[test]
    fn swap_moves_buffers_without_copy() {
        let mut a = ramp(1000, 0.0);
        let mut b = ramp(1000, 1.0);
        let a_ptr = a.real().as_ptr();
        let b_ptr = b.real().as_ptr();
        a.swap(&mut b);
        assert_eq!(a.real().as_ptr(), b_ptr);
        assert_eq!(b.real().as_ptr(), a_ptr);
    }

    #[test]
    fn two_phase_reduction_matches_direct_dot() {
        for n in [1, 2, 511, 512, 513, 1500, 4096] {
            let u = ramp(n, 0.3);
            let v = ramp(n, 1.9);
            let fast = u.inner_product(&v);
            let slow = direct_dot(&u, &v);
            let tol = 1e-12 * n as f64;
            assert!((fast.re - slow.re).abs() < tol, "n={n}: re {fast} vs {slow}");
            assert!((fast.im - slow.im).abs() < tol, "n={n}: im {fast} vs {slow}");
        }
    }

    #[test]
    fn segments_reduce_independently() {
        let n = 1200;
        let blocks = StateVector::block_count(n);
        let u = ramp(n, 0.0);
        let vs = [ramp(n, 0.5), ramp(n, 1.0), ramp(n, 1.5)];
        let mut partial = StateVector::zeros(blocks * vs.len());
        for (m, v) in vs.iter().enumerate() {
            u.inner_product_1(v, &mut partial, m * blocks);
        }
        let mut reduced = StateVector::zeros(vs.len());
        partial.inner_product_2(&mut reduced, blocks);
        for (m, v) in vs.iter().enumerate() {
            let expected = direct_dot(&u, v);
            assert!((reduced.get(m).re - expected.re).abs() < 1e-9);
            assert!((reduced.get(m).im - expected.im).abs() < 1e-9);
        }
    }

    #[test]
    fn norm_squared_of_phases_is_length() {
        let amps: Vec<Complex64> = (0..64).map(|k| Complex64::from_polar(f64::from(k))).collect();
        let v = StateVector::from_amplitudes(&amps);
        assert!((v.norm_squared() - 64.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "length mismatch")]
    fn mismatched_add_panics() {
        let mut a = StateVector::zeros(3);
        a.add(&StateVector::zeros(4), 1.0);
    }
}
