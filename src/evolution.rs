// SPDX-License-Identifier: AGPL-3.0-only

//! Chebyshev time evolution.
//!
//! U(±τ) = e^{∓iH̃τ} = J₀(τ) + 2 Σ_{m≥1} (∓i)^m J_m(τ) T_m(H̃), with τ the
//! time step in units of ħ / E_max. The series is cut at the first order
//! m > τ with |J_m(τ)| < [`BESSEL_CUTOFF`].

use crate::hamiltonian::Hamiltonian;
use crate::recursion::Direction;
use crate::special::bessel_sequence;
use crate::tolerances::{BESSEL_CUTOFF, BESSEL_EXTRA_ORDERS};
use crate::vector::StateVector;

/// Expansion magnitudes b₀ = J₀(τ), b_m = 2J_m(τ), truncated.
///
/// Always returns at least two entries.
#[must_use]
pub fn evolution_coefficients(tau: f64) -> Vec<f64> {
    let count = (1.5 * tau.abs()).ceil() as usize + BESSEL_EXTRA_ORDERS;
    let j = bessel_sequence(tau, count);
    let keep = j
        .iter()
        .enumerate()
        .position(|(m, v)| m as f64 > tau.abs() && v.abs() < BESSEL_CUTOFF)
        .unwrap_or(count)
        .max(2);
    j.iter()
        .take(keep)
        .enumerate()
        .map(|(m, &v)| if m == 0 { v } else { 2.0 * v })
        .collect()
}

/// `state ← U(±τ) state`.
pub fn evolve(h: &Hamiltonian<'_>, direction: Direction, tau: f64, state: &mut StateVector) {
    let b = evolution_coefficients(tau);
    let n = state.len();
    let mut s0 = state.clone();
    let mut s1 = StateVector::zeros(n);
    let mut s2 = StateVector::zeros(n);
    h.chebyshev_01(&s0, &mut s1, state, b[0], b[1], direction);
    for (m, &bm) in b.iter().enumerate().skip(2) {
        h.chebyshev_2(&s0, &s1, &mut s2, state, bm, direction.phase(m));
        s0.swap(&mut s1);
        s1.swap(&mut s2);
    }
}

/// `state_out ← [X, U(τ)] state_in` (forward direction).
pub fn evolvex(h: &Hamiltonian<'_>, tau: f64, state_in: &StateVector, state_out: &mut StateVector) {
    let b = evolution_coefficients(tau);
    let n = state_in.len();
    let mut s0 = state_in.clone();
    let mut s1 = StateVector::zeros(n);
    let mut s2 = StateVector::zeros(n);
    let mut s0x = StateVector::zeros(n);
    let mut s1x = StateVector::zeros(n);
    let mut s2x = StateVector::zeros(n);
    h.apply(&s0, &mut s1);
    h.chebyshev_1x(state_in, &mut s1x, state_out, b[1]);
    for (m, &bm) in b.iter().enumerate().skip(2) {
        let phase = Direction::Forward.phase(m);
        h.chebyshev_2x(&s0, &s0x, &s1, &s1x, &mut s2, &mut s2x, state_out, bm, phase);
        s0.swap(&mut s1);
        s1.swap(&mut s2);
        s0x.swap(&mut s1x);
        s1x.swap(&mut s2x);
    }
}
