// SPDX-License-Identifier: AGPL-3.0-only

//! Observable drivers: DOS, velocity autocorrelation, mean-square
//! displacement and spin polarization.
//!
//! Every driver reduces to Chebyshev moments
//! μ_m = Re⟨left|T_m(H̃)|right⟩ / n for a pair of vectors derived from a
//! random-phase state φ. The per-vector `*_moments` functions compute
//! them for one φ; [`MomentAccumulator`] averages across random vectors;
//! the `find_*` functions run the whole pipeline over a set of states and
//! return the post-processed result.

use crate::evolution::{evolve, evolvex};
use crate::hamiltonian::Hamiltonian;
use crate::model::Model;
use crate::recursion::Direction;
use crate::results::{reconstruct, DosResult, MsdResult, SpinResult, VacResult};
use crate::tolerances::MOMENT_DIVERGENCE_BOUND;
use crate::vector::StateVector;

/// Moment count, energy grid and time steps shared by the drivers.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservableGrid {
    pub number_of_moments: usize,
    pub energies: Vec<f64>,
    pub time_steps: Vec<f64>,
}

/// μ_m = Re⟨left|T_m(H̃)|right⟩ / n for m < `number_of_moments`.
///
/// Uses the bare recursion and one two-phase reduction over all moments.
#[must_use]
pub fn find_moments_chebyshev(
    h: &Hamiltonian<'_>,
    number_of_moments: usize,
    left: &StateVector,
    right: &StateVector,
) -> Vec<f64> {
    let n = right.len();
    let blocks = StateVector::block_count(n);
    let mut partial = StateVector::zeros(blocks * number_of_moments);

    let mut s0 = right.clone();
    let mut s1 = StateVector::zeros(n);
    let mut s2 = StateVector::zeros(n);
    if number_of_moments > 0 {
        left.inner_product_1(&s0, &mut partial, 0);
    }
    if number_of_moments > 1 {
        h.apply(&s0, &mut s1);
        left.inner_product_1(&s1, &mut partial, blocks);
    }
    for m in 2..number_of_moments {
        h.kernel_polynomial(&s0, &s1, &mut s2);
        left.inner_product_1(&s2, &mut partial, m * blocks);
        s0.swap(&mut s1);
        s1.swap(&mut s2);
    }

    let mut reduced = StateVector::zeros(number_of_moments);
    partial.inner_product_2(&mut reduced, blocks);
    let moments: Vec<f64> = reduced.real().iter().map(|re| re / n as f64).collect();

    let bound = MOMENT_DIVERGENCE_BOUND * (left.norm_squared() * right.norm_squared()).sqrt() / n as f64;
    if let Some((m, mu)) = moments.iter().enumerate().find(|(_, mu)| mu.abs() > bound) {
        tracing::warn!(
            order = m,
            moment = mu,
            bound,
            energy_max = h.energy_max(),
            "Chebyshev moment exceeds Cauchy-Schwarz bound; energy_max is likely below the spectral radius"
        );
    }
    moments
}

/// DOS moments ⟨φ|T_m|φ⟩ / n.
#[must_use]
pub fn dos_moments(h: &Hamiltonian<'_>, number_of_moments: usize, phi: &StateVector) -> Vec<f64> {
    find_moments_chebyshev(h, number_of_moments, phi, phi)
}

/// Spin moments ⟨S_z φ|T_m|φ⟩ / n.
#[must_use]
pub fn spin_moments(h: &Hamiltonian<'_>, number_of_moments: usize, phi: &StateVector) -> Vec<f64> {
    let mut left = StateVector::zeros(phi.len());
    h.apply_sz(phi, &mut left);
    find_moments_chebyshev(h, number_of_moments, &left, phi)
}

/// VAC moments at times 0, dt₀, dt₀ + dt₁, ...:
/// left(t) = V U(t)φ, right(t) = U(t)Vφ.
#[must_use]
pub fn vac_moments(h: &Hamiltonian<'_>, grid: &ObservableGrid, phi: &StateVector) -> Vec<Vec<f64>> {
    let n = phi.len();
    let mut state_left = phi.clone();
    let mut state_right = StateVector::zeros(n);
    h.apply_current(phi, &mut state_right);
    let mut left = StateVector::zeros(n);

    let steps = grid.time_steps.len();
    let mut moments = Vec::with_capacity(steps);
    for (k, &dt) in grid.time_steps.iter().enumerate() {
        h.apply_current(&state_left, &mut left);
        moments.push(find_moments_chebyshev(h, grid.number_of_moments, &left, &state_right));
        tracing::debug!(step = k, time_step = dt, "vac correlation");
        if k + 1 < steps {
            let tau = dt * h.energy_max();
            evolve(h, Direction::Forward, tau, &mut state_left);
            evolve(h, Direction::Forward, tau, &mut state_right);
        }
    }
    moments
}

/// MSD moments ⟨φ_x(t)|T_m|φ_x(t)⟩ / n after each time step, with
/// φ_x(t + Δt) = U(Δt)φ_x(t) + [X, U(Δt)]φ(t).
#[must_use]
pub fn msd_moments(h: &Hamiltonian<'_>, grid: &ObservableGrid, phi: &StateVector) -> Vec<Vec<f64>> {
    let n = phi.len();
    let mut state = phi.clone();
    let mut state_x = StateVector::zeros(n);
    let mut tmp = StateVector::zeros(n);

    let mut moments = Vec::with_capacity(grid.time_steps.len());
    for (k, &dt) in grid.time_steps.iter().enumerate() {
        let tau = dt * h.energy_max();
        evolve(h, Direction::Forward, tau, &mut state_x);
        evolvex(h, tau, &state, &mut tmp);
        state_x.add(&tmp, 1.0);
        evolve(h, Direction::Forward, tau, &mut state);
        moments.push(find_moments_chebyshev(h, grid.number_of_moments, &state_x, &state_x));
        tracing::debug!(step = k, time_step = dt, "msd correlation");
    }
    moments
}

/// Running mean of moment sets over random vectors.
#[derive(Clone, Debug, Default)]
pub struct MomentAccumulator {
    sum: Vec<Vec<f64>>,
    samples: usize,
}

impl MomentAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one random vector's moments (one row per correlation time).
    ///
    /// # Panics
    ///
    /// Panics if the shape differs from earlier samples.
    pub fn add(&mut self, moments: &[Vec<f64>]) {
        if self.samples == 0 {
            self.sum = moments.to_vec();
        } else {
            assert_eq!(self.sum.len(), moments.len(), "moment rows changed between samples");
            for (acc, row) in self.sum.iter_mut().zip(moments) {
                assert_eq!(acc.len(), row.len(), "moment count changed between samples");
                for (a, m) in acc.iter_mut().zip(row) {
                    *a += m;
                }
            }
        }
        self.samples += 1;
    }

    /// Add a single row of moments.
    pub fn add_row(&mut self, moments: &[f64]) {
        self.add(std::slice::from_ref(&moments.to_vec()));
    }

    /// Number of vectors added so far.
    #[must_use]
    pub const fn samples(&self) -> usize {
        self.samples
    }

    /// Averaged moments per row.
    #[must_use]
    pub fn mean(&self) -> Vec<Vec<f64>> {
        let inv = if self.samples == 0 { 0.0 } else { 1.0 / self.samples as f64 };
        self.sum
            .iter()
            .map(|row| row.iter().map(|v| v * inv).collect())
            .collect()
    }

    /// Averaged first row (single-time observables).
    #[must_use]
    pub fn mean_row(&self) -> Vec<f64> {
        self.mean().into_iter().next().unwrap_or_default()
    }
}

/// DOS from averaged per-vector moments.
#[must_use]
pub fn dos_result(model: &Model, grid: &ObservableGrid, dos: &MomentAccumulator) -> DosResult {
    DosResult::from_moments(&dos.mean_row(), &grid.energies, model.energy_max)
}

/// VAC and Kubo conductivity from averaged moments.
#[must_use]
pub fn vac_result(model: &Model, grid: &ObservableGrid, vac: &MomentAccumulator) -> VacResult {
    VacResult::from_moments(
        &vac.mean(),
        &grid.time_steps,
        &grid.energies,
        model.energy_max,
        model.sites_per_volume(),
    )
}

/// ΔX² and Einstein conductivity; `dos` supplies ρ(E) for the ratio.
#[must_use]
pub fn msd_result(
    model: &Model,
    grid: &ObservableGrid,
    dos: &MomentAccumulator,
    msd: &MomentAccumulator,
) -> MsdResult {
    let rho = reconstruct(&dos.mean_row(), &grid.energies, model.energy_max);
    MsdResult::from_moments(
        &msd.mean(),
        &rho,
        &grid.time_steps,
        &grid.energies,
        model.energy_max,
        model.sites_per_volume(),
    )
}

/// Spin-resolved DOS difference and polarization from averaged moments.
#[must_use]
pub fn spin_result(
    model: &Model,
    grid: &ObservableGrid,
    dos: &MomentAccumulator,
    spin: &MomentAccumulator,
) -> SpinResult {
    SpinResult::from_moments(&dos.mean_row(), &spin.mean_row(), &grid.energies, model.energy_max)
}

/// Average DOS over `states`.
#[must_use]
pub fn find_dos(model: &Model, grid: &ObservableGrid, states: &[StateVector]) -> DosResult {
    let h = Hamiltonian::new(model);
    let mut acc = MomentAccumulator::new();
    for phi in states {
        acc.add_row(&dos_moments(&h, grid.number_of_moments, phi));
    }
    tracing::info!(samples = acc.samples(), moments = grid.number_of_moments, "dos");
    dos_result(model, grid, &acc)
}

/// Average VAC over `states` and integrate to the Kubo conductivity.
#[must_use]
pub fn find_vac(model: &Model, grid: &ObservableGrid, states: &[StateVector]) -> VacResult {
    let h = Hamiltonian::new(model);
    let mut acc = MomentAccumulator::new();
    for phi in states {
        acc.add(&vac_moments(&h, grid, phi));
    }
    tracing::info!(samples = acc.samples(), steps = grid.time_steps.len(), "vac");
    vac_result(model, grid, &acc)
}

/// Average MSD over `states` and differentiate to the Einstein conductivity.
#[must_use]
pub fn find_msd(model: &Model, grid: &ObservableGrid, states: &[StateVector]) -> MsdResult {
    let h = Hamiltonian::new(model);
    let mut dos = MomentAccumulator::new();
    let mut msd = MomentAccumulator::new();
    for phi in states {
        dos.add_row(&dos_moments(&h, grid.number_of_moments, phi));
        msd.add(&msd_moments(&h, grid, phi));
    }
    tracing::info!(samples = msd.samples(), steps = grid.time_steps.len(), "msd");
    msd_result(model, grid, &dos, &msd)
}

/// Average spin-resolved DOS difference and polarization over `states`.
///
/// # Panics
///
/// Panics on a spinless model.
#[must_use]
pub fn find_spin_polarization(
    model: &Model,
    grid: &ObservableGrid,
    states: &[StateVector],
) -> SpinResult {
    let h = Hamiltonian::new(model);
    let mut dos = MomentAccumulator::new();
    let mut spin = MomentAccumulator::new();
    for phi in states {
        dos.add_row(&dos_moments(&h, grid.number_of_moments, phi));
        spin.add_row(&spin_moments(&h, grid.number_of_moments, phi));
    }
    tracing::info!(samples = spin.samples(), "spin polarization");
    spin_result(model, grid, &dos, &spin)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::complex::Complex64;
    use crate::model::lattice::{build_lattice, LatticeSpec};

    fn ring(n: usize) -> Model {
        let mut spec = LatticeSpec::open_chain(n, 1.0);
        spec.periodic = [true; 3];
        build_lattice(&spec).expect("ring")
    }

    #[test]
    fn moments_match_direct_inner_products() {
        let model = ring(10);
        let h = Hamiltonian::new(&model);
        let left = StateVector::from_amplitudes(
            &(0..10).map(|i| Complex64::from_polar(0.3 * f64::from(i))).collect::<Vec<_>>(),
        );
        let right = StateVector::from_amplitudes(
            &(0..10).map(|i| Complex64::from_polar(1.1 * f64::from(i))).collect::<Vec<_>>(),
        );
        let mu = find_moments_chebyshev(&h, 6, &left, &right);

        let mut t0 = right.clone();
        let mut t1 = StateVector::zeros(10);
        h.apply(&t0, &mut t1);
        let mut expected = vec![left.inner_product(&t0).re / 10.0, left.inner_product(&t1).re / 10.0];
        let mut t2 = StateVector::zeros(10);
        for _ in 2..6 {
            h.kernel_polynomial(&t0, &t1, &mut t2);
            expected.push(left.inner_product(&t2).re / 10.0);
            t0.swap(&mut t1);
            t1.swap(&mut t2);
        }
        for (m, (a, b)) in mu.iter().zip(&expected).enumerate() {
            assert!((a - b).abs() < 1e-13, "m={m}");
        }
    }

    #[test]
    fn basis_trace_gives_exact_moments() {
        // averaging over all basis states gives Tr T_m(H̃) exactly
        let model = ring(8);
        let h = Hamiltonian::new(&model);
        let mut acc = MomentAccumulator::new();
        for i in 0..8 {
            let e = StateVector::basis(8, i);
            acc.add_row(&dos_moments(&h, 4, &e));
        }
        // each basis moment carries 1/n; the mean carries another 1/n
        let mu: Vec<f64> = acc.mean_row().iter().map(|v| v * 8.0).collect();
        assert!((mu[0] - 1.0).abs() < 1e-14);
        // bipartite ring: odd moments vanish
        assert!(mu[1].abs() < 1e-14 && mu[3].abs() < 1e-14);
    }

    #[test]
    fn accumulator_averages() {
        let mut acc = MomentAccumulator::new();
        acc.add(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        acc.add(&[vec![3.0, 4.0], vec![5.0, 6.0]]);
        assert_eq!(acc.samples(), 2);
        assert_eq!(acc.mean(), vec![vec![2.0, 3.0], vec![4.0, 5.0]]);
        assert_eq!(MomentAccumulator::new().mean_row(), Vec::<f64>::new());
    }

    #[test]
    fn vac_at_time_zero_equals_current_correlation() {
        let model = ring(12);
        let h = Hamiltonian::new(&model);
        let phi = StateVector::from_amplitudes(
            &(0..12).map(|i| Complex64::from_polar(0.77 * f64::from(i))).collect::<Vec<_>>(),
        );
        let grid = ObservableGrid {
            number_of_moments: 4,
            energies: vec![0.0],
            time_steps: vec![0.5, 0.5],
        };
        let mu = vac_moments(&h, &grid, &phi);
        assert_eq!(mu.len(), 2);
        let mut vphi = StateVector::zeros(12);
        h.apply_current(&phi, &mut vphi);
        let want = vphi.norm_squared() / 12.0;
        assert!((mu[0][0] - want).abs() < 1e-12);
    }

    #[test]
    fn msd_moments_grow_for_clean_ring() {
        let model = ring(200);
        let h = Hamiltonian::new(&model);
        let phi = StateVector::basis(200, 100);
        let grid = ObservableGrid {
            number_of_moments: 2,
            energies: vec![0.0],
            time_steps: vec![1.0; 5],
        };
        // μ₀ = ⟨φ_x|φ_x⟩ / n = ⟨(X(t) − X(0))²⟩ / n, ballistic: 2t²
        let mu = msd_moments(&h, &grid, &phi);
        for (k, row) in mu.iter().enumerate() {
            let t = (k + 1) as f64;
            let want = 2.0 * t * t / 200.0;
            assert!((row[0] - want).abs() < 1e-9, "t={t}: {} vs {want}", row[0]);
        }
    }
}
