// SPDX-License-Identifier: AGPL-3.0-only

//! Sparse operator application on state vectors.
//!
//! A [`Hamiltonian`] borrows a fully initialized [`Model`] and applies
//!
//! | operator | action on site i |
//! |----------|------------------|
//! | H̃ = H / E_max | (Σ_j H_ij ψ_j + V_i ψ_i) / E_max |
//! | [X, H̃] | −Σ_j xx_ij H_ij ψ_j / E_max |
//! | V = i[H, X] | i Σ_j xx_ij H_ij ψ_j (physical units) |
//! | S_z | +ψ_i on even orbitals, −ψ_i on odd |
//!
//! where `xx_ij = x_j − x_i` along the transport axis. Each site is written
//! by exactly one rayon task, so inputs are read-only and outputs are
//! disjoint.

use crate::complex::Complex64;
use crate::model::{LatticeDescriptor, Model};
use crate::vector::StateVector;

/// Read-only operator view of a model, rescaled by `energy_max`.
#[derive(Clone, Copy, Debug)]
pub struct Hamiltonian<'a> {
    lattice: &'a LatticeDescriptor,
    energy_max: f64,
    spinful: bool,
}

impl<'a> Hamiltonian<'a> {
    /// Borrow the neighbor data and energy scale of `model`.
    #[must_use]
    pub fn new(model: &'a Model) -> Self {
        Self {
            lattice: &model.lattice,
            energy_max: model.energy_max,
            spinful: model.spinful,
        }
    }

    /// Orbital count n.
    #[must_use]
    pub const fn number_of_atoms(&self) -> usize {
        self.lattice.number_of_atoms
    }

    /// Rescaling bound E_max.
    #[must_use]
    pub const fn energy_max(&self) -> f64 {
        self.energy_max
    }

    /// Underlying padded neighbor list.
    #[must_use]
    pub const fn lattice(&self) -> &'a LatticeDescriptor {
        self.lattice
    }

    /// Σ_j H_ij ψ_j (off-diagonal part, unscaled).
    #[inline]
    fn hop_row(&self, i: usize, input: &StateVector) -> Complex64 {
        let lat = self.lattice;
        let n = lat.number_of_atoms;
        let mut sum = Complex64::ZERO;
        for j in 0..lat.neighbor_number[i] {
            let idx = j * n + i;
            let h = Complex64::new(lat.hopping_real[idx], lat.hopping_imag[idx]);
            sum += h * input.get(lat.neighbor_list[idx]);
        }
        sum
    }

    /// Σ_j xx_ij H_ij ψ_j (unscaled).
    #[inline]
    fn weighted_row(&self, xx: &[f64], i: usize, input: &StateVector) -> Complex64 {
        let lat = self.lattice;
        let n = lat.number_of_atoms;
        let mut sum = Complex64::ZERO;
        for j in 0..lat.neighbor_number[i] {
            let idx = j * n + i;
            let h = Complex64::new(lat.hopping_real[idx], lat.hopping_imag[idx]);
            sum += (h * input.get(lat.neighbor_list[idx])).scale(xx[idx]);
        }
        sum
    }

    fn xx(&self) -> &'a [f64] {
        let lattice: &'a LatticeDescriptor = self.lattice;
        match &lattice.xx {
            Some(xx) => xx,
            None => panic!("model has no bond displacements; commutator and current need xx"),
        }
    }

    /// (H̃ψ)_i.
    #[inline]
    pub(crate) fn scaled_row(&self, i: usize, input: &StateVector) -> Complex64 {
        let onsite = input.get(i).scale(self.lattice.potential[i]);
        (self.hop_row(i, input) + onsite).scale(1.0 / self.energy_max)
    }

    /// ([X, H̃]ψ)_i.
    #[inline]
    pub(crate) fn commutator_row(&self, xx: &[f64], i: usize, input: &StateVector) -> Complex64 {
        self.weighted_row(xx, i, input).scale(-1.0 / self.energy_max)
    }

    pub(crate) fn bond_displacements(&self) -> &'a [f64] {
        self.xx()
    }

    /// `output = H̃ input`.
    pub fn apply(&self, input: &StateVector, output: &mut StateVector) {
        assert_eq!(input.len(), self.number_of_atoms(), "apply: input length");
        assert_eq!(output.len(), self.number_of_atoms(), "apply: output length");
        output.par_fill(|i| self.scaled_row(i, input));
    }

    /// `output = [X, H̃] input`.
    ///
    /// # Panics
    ///
    /// Panics if the model carries no bond displacements.
    pub fn apply_commutator(&self, input: &StateVector, output: &mut StateVector) {
        assert_eq!(input.len(), self.number_of_atoms(), "apply_commutator: input length");
        assert_eq!(output.len(), self.number_of_atoms(), "apply_commutator: output length");
        let xx = self.xx();
        output.par_fill(|i| self.commutator_row(xx, i, input));
    }

    /// `output = V input` with V = i[H, X], not rescaled.
    ///
    /// # Panics
    ///
    /// Panics if the model carries no bond displacements.
    pub fn apply_current(&self, input: &StateVector, output: &mut StateVector) {
        assert_eq!(input.len(), self.number_of_atoms(), "apply_current: input length");
        assert_eq!(output.len(), self.number_of_atoms(), "apply_current: output length");
        let xx = self.xx();
        output.par_fill(|i| self.weighted_row(xx, i, input).mul_i());
    }

    /// `output = S_z input` (orbital parity encodes spin).
    ///
    /// # Panics
    ///
    /// Panics on a spinless model.
    pub fn apply_sz(&self, input: &StateVector, output: &mut StateVector) {
        assert!(self.spinful, "apply_sz on a spinless model");
        assert_eq!(input.len(), output.len(), "apply_sz: length mismatch");
        output.par_fill(|i| {
            let z = input.get(i);
            if i % 2 == 0 {
                z
            } else {
                -z
            }
        });
    }
}
