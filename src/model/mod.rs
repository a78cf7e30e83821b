// SPDX-License-Identifier: AGPL-3.0-only

//! Tight-binding model: neighbor lists, hoppings, on-site potential,
//! geometry, and the energy scale used to rescale the spectrum.
//!
//! Neighbor data uses a slot-major padded layout: slot `j` of site `i`
//! lives at index `j * n + i` in `neighbor_list`, `hopping_real`,
//! `hopping_imag` and `xx`. Consecutive sites read consecutive memory for
//! the same slot, which keeps the per-site operator loop contiguous.
//!
//! - [`lattice`]: hypercubic chain / square / cubic builders
//! - [`disorder`]: Anderson on-site disorder and vacancies
//! - [`charge`]: Gaussian charged impurities via cell-list binning
//! - [`sparse`]: general sparse Hamiltonians from explicit arrays

pub mod charge;
pub mod disorder;
pub mod lattice;
pub mod sparse;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::complex::Complex64;
use crate::error::{LsqtError, Result};
use crate::tolerances::ENERGY_MAX_SAFETY_FACTOR;
use crate::vector::StateVector;

/// Cartesian axis used as the transport direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index into a position triple.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// One directed bond `i → target` in an adjacency description.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bond {
    pub target: usize,
    pub hopping: Complex64,
    /// `x_target − x_i` along the transport axis.
    pub displacement: f64,
}

/// Sparse Hamiltonian data in padded neighbor-list form.
#[derive(Clone, Debug)]
pub struct LatticeDescriptor {
    pub number_of_atoms: usize,
    /// Padded slot count per site.
    pub max_neighbor: usize,
    pub neighbor_number: Vec<usize>,
    pub neighbor_list: Vec<usize>,
    pub hopping_real: Vec<f64>,
    pub hopping_imag: Vec<f64>,
    /// Bond displacements along the transport axis; required by the
    /// commutator and current operators.
    pub xx: Option<Vec<f64>>,
    pub potential: Vec<f64>,
}

impl LatticeDescriptor {
    /// Pack per-site bond lists into the padded slot-major layout.
    ///
    /// # Errors
    ///
    /// Returns [`LsqtError::Model`] if a bond targets a site outside
    /// `0..adjacency.len()` or `potential` has the wrong length.
    pub fn from_adjacency(
        adjacency: &[Vec<Bond>],
        potential: Vec<f64>,
        with_xx: bool,
    ) -> Result<Self> {
        let n = adjacency.len();
        if potential.len() != n {
            return Err(LsqtError::Model(format!(
                "potential has {} entries for {n} sites",
                potential.len()
            )));
        }
        let max_neighbor = adjacency.iter().map(Vec::len).max().unwrap_or(0);
        let padded = max_neighbor * n;
        let mut neighbor_list = vec![0usize; padded];
        let mut hopping_real = vec![0.0; padded];
        let mut hopping_imag = vec![0.0; padded];
        let mut xx = vec![0.0; padded];

        for (i, bonds) in adjacency.iter().enumerate() {
            for (j, bond) in bonds.iter().enumerate() {
                if bond.target >= n {
                    return Err(LsqtError::Model(format!(
                        "site {i} bond {j} targets {} (n = {n})",
                        bond.target
                    )));
                }
                let idx = j * n + i;
                neighbor_list[idx] = bond.target;
                hopping_real[idx] = bond.hopping.re;
                hopping_imag[idx] = bond.hopping.im;
                xx[idx] = bond.displacement;
            }
        }

        Ok(Self {
            number_of_atoms: n,
            max_neighbor,
            neighbor_number: adjacency.iter().map(Vec::len).collect(),
            neighbor_list,
            hopping_real,
            hopping_imag,
            xx: with_xx.then_some(xx),
            potential,
        })
    }

    /// Unpack back into per-site bond lists.
    #[must_use]
    pub fn to_adjacency(&self) -> Vec<Vec<Bond>> {
        let n = self.number_of_atoms;
        (0..n)
            .map(|i| {
                (0..self.neighbor_number[i])
                    .map(|j| {
                        let idx = j * n + i;
                        Bond {
                            target: self.neighbor_list[idx],
                            hopping: Complex64::new(self.hopping_real[idx], self.hopping_imag[idx]),
                            displacement: self.xx.as_ref().map_or(0.0, |xx| xx[idx]),
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Total number of directed bonds.
    #[must_use]
    pub fn number_of_pairs(&self) -> usize {
        self.neighbor_number.iter().sum()
    }

    /// Check array lengths and index ranges.
    ///
    /// # Errors
    ///
    /// Returns [`LsqtError::Model`] describing the first inconsistency.
    pub fn validate(&self) -> Result<()> {
        let n = self.number_of_atoms;
        let padded = self.max_neighbor * n;
        if n == 0 {
            return Err(LsqtError::Model("model has no sites".into()));
        }
        if self.neighbor_number.len() != n || self.potential.len() != n {
            return Err(LsqtError::Model(format!(
                "per-site arrays must have {n} entries (neighbor_number {}, potential {})",
                self.neighbor_number.len(),
                self.potential.len()
            )));
        }
        let padded_ok = self.neighbor_list.len() == padded
            && self.hopping_real.len() == padded
            && self.hopping_imag.len() == padded
            && self.xx.as_ref().map_or(true, |xx| xx.len() == padded);
        if !padded_ok {
            return Err(LsqtError::Model(format!(
                "per-bond arrays must have max_neighbor × n = {padded} entries"
            )));
        }
        for (i, &count) in self.neighbor_number.iter().enumerate() {
            if count > self.max_neighbor {
                return Err(LsqtError::Model(format!(
                    "site {i} has {count} neighbors, max_neighbor is {}",
                    self.max_neighbor
                )));
            }
            for j in 0..count {
                let target = self.neighbor_list[j * n + i];
                if target >= n {
                    return Err(LsqtError::Model(format!(
                        "site {i} slot {j} targets {target} (n = {n})"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Gershgorin bound on the spectral radius: max_i (|V_i| + Σ_j |H_ij|).
    #[must_use]
    pub fn gershgorin_radius(&self) -> f64 {
        let n = self.number_of_atoms;
        (0..n)
            .map(|i| {
                let off: f64 = (0..self.neighbor_number[i])
                    .map(|j| {
                        let idx = j * n + i;
                        self.hopping_real[idx].hypot(self.hopping_imag[idx])
                    })
                    .sum();
                self.potential[i].abs() + off
            })
            .fold(0.0, f64::max)
    }
}

/// A tight-binding system ready for recursion.
#[derive(Clone, Debug)]
pub struct Model {
    pub lattice: LatticeDescriptor,
    /// Cartesian position of every orbital.
    pub positions: Vec<[f64; 3]>,
    pub box_length: [f64; 3],
    pub periodic: [bool; 3],
    pub transport_axis: Axis,
    /// Orbitals come in (up, down) pairs at indices (2s, 2s + 1).
    pub spinful: bool,
    /// Spectrum rescaling bound; must be at least the spectral radius.
    pub energy_max: f64,
}

impl Model {
    /// Assemble a model from explicit arrays (general sparse Hamiltonian).
    ///
    /// `energy_max` of `None` uses [`estimate_energy_max`].
    ///
    /// # Errors
    ///
    /// Returns [`LsqtError::Model`] if the lattice fails validation, the
    /// position count disagrees with the site count, a spinful model has
    /// an odd orbital count, or `energy_max` is not positive.
    pub fn from_parts(
        lattice: LatticeDescriptor,
        positions: Vec<[f64; 3]>,
        box_length: [f64; 3],
        periodic: [bool; 3],
        transport_axis: Axis,
        spinful: bool,
        energy_max: Option<f64>,
    ) -> Result<Self> {
        lattice.validate()?;
        if positions.len() != lattice.number_of_atoms {
            return Err(LsqtError::Model(format!(
                "{} positions for {} sites",
                positions.len(),
                lattice.number_of_atoms
            )));
        }
        if spinful && lattice.number_of_atoms % 2 != 0 {
            return Err(LsqtError::Model(
                "spinful model needs an even number of orbitals".into(),
            ));
        }
        let mut model = Self {
            lattice,
            positions,
            box_length,
            periodic,
            transport_axis,
            spinful,
            energy_max: 0.0,
        };
        model.energy_max = match energy_max {
            Some(e) if e > 0.0 => e,
            Some(e) => {
                return Err(LsqtError::Model(format!("energy_max must be positive, got {e}")))
            }
            None => estimate_energy_max(&model.lattice),
        };
        Ok(model)
    }

    /// Orbital count, spin included.
    #[must_use]
    pub const fn number_of_atoms(&self) -> usize {
        self.lattice.number_of_atoms
    }

    /// Simulation-cell volume (product of box lengths).
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.box_length.iter().product()
    }

    /// Orbital density n / volume, the prefactor of both conductivities.
    #[must_use]
    pub fn sites_per_volume(&self) -> f64 {
        self.number_of_atoms() as f64 / self.volume()
    }

    /// Orbitals per spatial site.
    #[must_use]
    pub const fn orbitals_per_site(&self) -> usize {
        if self.spinful {
            2
        } else {
            1
        }
    }

    /// Warn when the configured scale is below the Gershgorin bound.
    ///
    /// Returns `true` if the bound is respected.
    pub fn check_energy_max(&self) -> bool {
        let bound = self.lattice.gershgorin_radius();
        if self.energy_max < bound {
            tracing::warn!(
                energy_max = self.energy_max,
                gershgorin = bound,
                "energy_max below Gershgorin bound; Chebyshev recursion may diverge"
            );
            false
        } else {
            true
        }
    }

    /// Replace the lattice after a structural change (vacancies), keeping
    /// positions in step.
    pub(crate) fn replace_lattice(&mut self, lattice: LatticeDescriptor, positions: Vec<[f64; 3]>) {
        self.lattice = lattice;
        self.positions = positions;
    }
}

/// Energy scale guaranteed to bound the spectrum: the Gershgorin radius
/// times [`ENERGY_MAX_SAFETY_FACTOR`].
#[must_use]
pub fn estimate_energy_max(lattice: &LatticeDescriptor) -> f64 {
    let radius = lattice.gershgorin_radius();
    if radius > 0.0 {
        radius * ENERGY_MAX_SAFETY_FACTOR
    } else {
        1.0
    }
}

/// Random-phase state ψᵢ = e^{iθᵢ}, θᵢ ~ U[0, 2π).
///
/// Unnormalized: ⟨ψ|ψ⟩ = n, so ⟨ψ|A|ψ⟩ / n estimates Tr(A) / n.
pub fn random_phase_state<R: Rng + ?Sized>(n: usize, rng: &mut R) -> StateVector {
    let amplitudes: Vec<Complex64> = (0..n)
        .map(|_| Complex64::from_polar(rng.gen_range(0.0..std::f64::consts::TAU)))
        .collect();
    StateVector::from_amplitudes(&amplitudes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn dimer(t: f64) -> Vec<Vec<Bond>> {
        let h = Complex64::new(-t, 0.0);
        vec![
            vec![Bond { target: 1, hopping: h, displacement: 1.0 }],
            vec![Bond { target: 0, hopping: h, displacement: -1.0 }],
        ]
    }

    #[test]
    fn adjacency_round_trip() {
        let adj = dimer(1.5);
        let lat = LatticeDescriptor::from_adjacency(&adj, vec![0.1, -0.1], true)
            .expect("valid dimer");
        assert_eq!(lat.max_neighbor, 1);
        assert_eq!(lat.number_of_pairs(), 2);
        assert_eq!(lat.to_adjacency(), adj);
    }

    #[test]
    fn rejects_out_of_range_bond() {
        let adj = vec![vec![Bond {
            target: 3,
            hopping: Complex64::ONE,
            displacement: 0.0,
        }]];
        assert!(LatticeDescriptor::from_adjacency(&adj, vec![0.0], false).is_err());
    }

    #[test]
    fn validate_catches_short_arrays() {
        let mut lat =
            LatticeDescriptor::from_adjacency(&dimer(1.0), vec![0.0; 2], true).expect("dimer");
        lat.hopping_imag.pop();
        assert!(matches!(lat.validate(), Err(LsqtError::Model(_))));
    }

    #[test]
    fn gershgorin_includes_potential() {
        let lat =
            LatticeDescriptor::from_adjacency(&dimer(1.0), vec![0.5, -2.0], false).expect("dimer");
        assert!((lat.gershgorin_radius() - 3.0).abs() < 1e-15);
        assert!(estimate_energy_max(&lat) > 3.0);
    }

    #[test]
    fn from_parts_rejects_nonpositive_energy_max() {
        let lat = LatticeDescriptor::from_adjacency(&dimer(1.0), vec![0.0; 2], true).expect("dimer");
        let res = Model::from_parts(
            lat,
            vec![[0.0; 3], [1.0, 0.0, 0.0]],
            [2.0, 1.0, 1.0],
            [false; 3],
            Axis::X,
            false,
            Some(0.0),
        );
        assert!(res.is_err());
    }

    #[test]
    fn random_phase_has_unit_modulus() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let psi = random_phase_state(100, &mut rng);
        for z in psi.to_amplitudes() {
            assert!((z.abs() - 1.0).abs() < 1e-14);
        }
        assert!((psi.norm_squared() - 100.0).abs() < 1e-10);
    }
}
