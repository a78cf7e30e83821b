// SPDX-License-Identifier: AGPL-3.0-only

//! Chebyshev recursion kernels.
//!
//! T₀ = I, T₁ = H̃, T_{m+1} = 2H̃T_m − T_{m−1}, applied to vectors.
//! The recursion families share the same three-term step:
//!
//! - plain ([`Hamiltonian::chebyshev_01`], [`Hamiltonian::chebyshev_2`]):
//!   accumulate Σ c_m T_m(H̃)ψ into a result vector,
//! - paired ([`Hamiltonian::chebyshev_1x`], [`Hamiltonian::chebyshev_2x`]):
//!   carry [X, T_m(H̃)]ψ alongside T_m(H̃)ψ and accumulate Σ c_m [X, T_m]ψ,
//! - bare ([`Hamiltonian::kernel_polynomial`]): one step, no accumulation.
//!
//! Coefficients are passed as a real magnitude (already carrying the
//! factor 2 for m ≥ 1) and a [`Phase`]. Callers own the buffers and rotate
//! them with [`StateVector::swap`] between steps.

use crate::complex::Complex64;
use crate::hamiltonian::Hamiltonian;
use crate::vector::StateVector;

/// Unit phase multiplying an expansion coefficient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    One,
    MinusI,
    MinusOne,
    PlusI,
}

impl Phase {
    /// The phase as a complex number.
    #[must_use]
    pub const fn value(self) -> Complex64 {
        match self {
            Self::One => Complex64::new(1.0, 0.0),
            Self::MinusI => Complex64::new(0.0, -1.0),
            Self::MinusOne => Complex64::new(-1.0, 0.0),
            Self::PlusI => Complex64::new(0.0, 1.0),
        }
    }

    /// `phase · z` without a full complex product.
    #[inline]
    #[must_use]
    pub fn apply(self, z: Complex64) -> Complex64 {
        match self {
            Self::One => z,
            Self::MinusI => Complex64::new(z.im, -z.re),
            Self::MinusOne => -z,
            Self::PlusI => z.mul_i(),
        }
    }
}

/// Sign of the time step: Forward is e^{−iH̃τ}, Backward is e^{+iH̃τ}.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Phase of the order-`m` term: (−i)^m forward, (+i)^m backward.
    #[must_use]
    pub const fn phase(self, m: usize) -> Phase {
        match (self, m % 4) {
            (_, 0) => Phase::One,
            (_, 2) => Phase::MinusOne,
            (Self::Forward, 1) | (Self::Backward, 3) => Phase::MinusI,
            _ => Phase::PlusI,
        }
    }
}

impl Hamiltonian<'_> {
    /// Orders 0 and 1: `state_1 = H̃ state_0`,
    /// `state = b₀ state_0 + phase(1) b₁ state_1`.
    pub fn chebyshev_01(
        &self,
        state_0: &StateVector,
        state_1: &mut StateVector,
        state: &mut StateVector,
        bessel_0: f64,
        bessel_1: f64,
        direction: Direction,
    ) {
        self.apply(state_0, state_1);
        let phase = direction.phase(1);
        let s1: &StateVector = state_1;
        state.par_fill(|i| state_0.get(i).scale(bessel_0) + phase.apply(s1.get(i).scale(bessel_1)));
    }

    /// Order m ≥ 2: `state_2 = 2H̃ state_1 − state_0`,
    /// `state += phase · b_m · state_2`.
    pub fn chebyshev_2(
        &self,
        state_0: &StateVector,
        state_1: &StateVector,
        state_2: &mut StateVector,
        state: &mut StateVector,
        bessel_m: f64,
        phase: Phase,
    ) {
        self.kernel_polynomial(state_0, state_1, state_2);
        state.add_complex(state_2, phase.value().scale(bessel_m));
    }

    /// Seed of the paired recursion: `state_1x = [X, H̃] input`,
    /// `state = −i b₁ state_1x`.
    pub fn chebyshev_1x(
        &self,
        input: &StateVector,
        state_1x: &mut StateVector,
        state: &mut StateVector,
        bessel_1: f64,
    ) {
        self.apply_commutator(input, state_1x);
        let s1x: &StateVector = state_1x;
        state.par_fill(|i| Phase::MinusI.apply(s1x.get(i).scale(bessel_1)));
    }

    /// Paired step m ≥ 2:
    /// `state_2 = 2H̃ state_1 − state_0`,
    /// `state_2x = 2[X, H̃] state_1 + 2H̃ state_1x − state_0x`,
    /// `state += phase · b_m · state_2x`.
    pub fn chebyshev_2x(
        &self,
        state_0: &StateVector,
        state_0x: &StateVector,
        state_1: &StateVector,
        state_1x: &StateVector,
        state_2: &mut StateVector,
        state_2x: &mut StateVector,
        state: &mut StateVector,
        bessel_m: f64,
        phase: Phase,
    ) {
        let n = self.number_of_atoms();
        for v in [state_0, state_0x, state_1, state_1x] {
            assert_eq!(v.len(), n, "chebyshev_2x: length mismatch");
        }
        let xx = self.bond_displacements();
        self.kernel_polynomial(state_0, state_1, state_2);
        state_2x.par_fill(|i| {
            (self.commutator_row(xx, i, state_1) + self.scaled_row(i, state_1x)).scale(2.0)
                - state_0x.get(i)
        });
        state.add_complex(state_2x, phase.value().scale(bessel_m));
    }

    /// Bare step `state_2 = 2H̃ state_1 − state_0`.
    pub fn kernel_polynomial(
        &self,
        state_0: &StateVector,
        state_1: &StateVector,
        state_2: &mut StateVector,
    ) {
        let n = self.number_of_atoms();
        assert_eq!(state_0.len(), n, "kernel_polynomial: state_0 length");
        assert_eq!(state_1.len(), n, "kernel_polynomial: state_1 length");
        assert_eq!(state_2.len(), n, "kernel_polynomial: state_2 length");
        state_2.par_fill(|i| self.scaled_row(i, state_1).scale(2.0) - state_0.get(i));
    }
}
