// SPDX-License-Identifier: AGPL-3.0-only

//! Chebyshev Recursion Validation
//!
//! Checks the recursion core against answers known without it:
//!
//! - T₂(H̃)e₀ on an open 4-site chain (analytic)
//! - T_m(H̃) on one- and two-site systems vs dense recursion
//! - ‖T_m(H̃)ψ‖ bounded over 1000 steps when E_max ≥ spectral radius
//! - two-phase inner product vs direct sum
//! - dimer DOS peaks at ±t
//! - e^{−iH̃τ} unitarity and forward/backward round trip
//! - clean chain DOS normalization
//!
//! Exit code 0 only if every check passes.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use lsqt::evolution::evolve;
use lsqt::model::lattice::{build_lattice, LatticeSpec};
use lsqt::model::{random_phase_state, Axis, Bond, LatticeDescriptor, Model};
use lsqt::observables::{find_dos, ObservableGrid};
use lsqt::tolerances::{
    CHEBYSHEV_NORM_GROWTH_MAX, DOS_NORMALIZATION, DOS_PEAK_POSITION, EVOLUTION_NORM_TOLERANCE,
    EVOLUTION_ROUND_TRIP, EXACT_F64, RECURSION_VS_DENSE,
};
use lsqt::validation::ValidationHarness;
use lsqt::{Complex64, Direction, Hamiltonian, StateVector};

fn main() {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  Chebyshev Recursion Validation                              ║");
    println!("║  analytic T_m, dense references, DOS peaks, unitarity        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let mut harness = ValidationHarness::new("chebyshev");

    let outcome = (|| -> lsqt::Result<()> {
        check_chain_t2(&mut harness)?;
        check_toy_dense(&mut harness)?;
        check_norm_bound(&mut harness)?;
        check_reduction(&mut harness);
        check_dimer_dos(&mut harness)?;
        check_evolution(&mut harness)?;
        check_chain_normalization(&mut harness)?;
        Ok(())
    })();
    if let Err(e) = outcome {
        println!("  setup failed: {e}");
        harness.check_bool("model setup", false);
    }

    println!();
    harness.finish();
}

fn ring(n: usize) -> lsqt::Result<Model> {
    let mut spec = LatticeSpec::open_chain(n, 1.0);
    spec.periodic = [true; 3];
    build_lattice(&spec)
}

fn bare(h: &Hamiltonian<'_>, psi: &StateVector, order: usize) -> StateVector {
    let n = psi.len();
    let mut s0 = psi.clone();
    if order == 0 {
        return s0;
    }
    let mut s1 = StateVector::zeros(n);
    let mut s2 = StateVector::zeros(n);
    h.apply(&s0, &mut s1);
    for _ in 1..order {
        h.kernel_polynomial(&s0, &s1, &mut s2);
        s0.swap(&mut s1);
        s1.swap(&mut s2);
    }
    s1
}

/// Open chain N=4, t=1, E_max=2: T₂(H̃)e₀ = (−½, 0, ½, 0).
fn check_chain_t2(harness: &mut ValidationHarness) -> lsqt::Result<()> {
    println!("[1] Open Chain — T₂(H̃)e₀");
    let mut model = build_lattice(&LatticeSpec::open_chain(4, 1.0))?;
    model.energy_max = 2.0;
    let h = Hamiltonian::new(&model);
    let t2 = bare(&h, &StateVector::basis(4, 0), 2);
    for (i, want) in [-0.5, 0.0, 0.5, 0.0].into_iter().enumerate() {
        println!("  site {i}: {}", t2.get(i));
        harness.check_abs(&format!("T2 chain site {i}"), t2.real()[i], want, EXACT_F64);
    }
    println!();
    Ok(())
}

/// One site (T_m(½) = cos(mπ/3)) and a complex-hopping dimer vs dense.
fn check_toy_dense(harness: &mut ValidationHarness) -> lsqt::Result<()> {
    println!("[2] Toy Lattices — Recursion vs Dense");
    let site = Model::from_parts(
        LatticeDescriptor::from_adjacency(&[vec![]], vec![0.5], true)?,
        vec![[0.0; 3]],
        [1.0; 3],
        [false; 3],
        Axis::X,
        false,
        Some(1.0),
    )?;
    let h = Hamiltonian::new(&site);
    let worst_site = (0..16)
        .map(|m| {
            let got = bare(&h, &StateVector::basis(1, 0), m).real()[0];
            (got - (m as f64 * std::f64::consts::FRAC_PI_3).cos()).abs()
        })
        .fold(0.0, f64::max);
    harness.check_upper("single site T_m(1/2) max error", worst_site, RECURSION_VS_DENSE);

    let hop = Complex64::new(-0.6, 0.3);
    let dimer = Model::from_parts(
        LatticeDescriptor::from_adjacency(
            &[
                vec![Bond { target: 1, hopping: hop, displacement: 1.0 }],
                vec![Bond { target: 0, hopping: hop.conj(), displacement: -1.0 }],
            ],
            vec![0.2, -0.1],
            true,
        )?,
        vec![[0.0; 3], [1.0, 0.0, 0.0]],
        [2.0, 1.0, 1.0],
        [false; 3],
        Axis::X,
        false,
        Some(1.0),
    )?;
    let h = Hamiltonian::new(&dimer);
    let dense = [
        [Complex64::new(0.2, 0.0), hop],
        [hop.conj(), Complex64::new(-0.1, 0.0)],
    ];
    let psi = [Complex64::new(0.6, 0.2), Complex64::new(-0.3, 0.7)];
    let apply = |v: [Complex64; 2]| {
        [
            dense[0][0] * v[0] + dense[0][1] * v[1],
            dense[1][0] * v[0] + dense[1][1] * v[1],
        ]
    };
    let (mut t0, mut t1) = (psi, apply(psi));
    let sv = StateVector::from_amplitudes(&psi);
    let mut worst = 0.0_f64;
    for m in 2..20 {
        let ht1 = apply(t1);
        let t2 = [ht1[0].scale(2.0) - t0[0], ht1[1].scale(2.0) - t0[1]];
        t0 = t1;
        t1 = t2;
        let got = bare(&h, &sv, m);
        worst = worst.max((got.get(0) - t1[0]).abs()).max((got.get(1) - t1[1]).abs());
    }
    println!("  dimer max |Δ| over m < 20: {worst:.3e}");
    harness.check_upper("complex dimer T_m vs dense", worst, RECURSION_VS_DENSE);
    println!();
    Ok(())
}

/// Ring N=64, E_max = 2.02: ‖T_m ψ‖² ≤ ‖ψ‖² for 1000 steps.
fn check_norm_bound(harness: &mut ValidationHarness) -> lsqt::Result<()> {
    println!("[3] Norm Stability — 1000 Chebyshev Steps");
    let mut model = ring(64)?;
    model.energy_max = 2.02;
    let h = Hamiltonian::new(&model);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let psi = random_phase_state(64, &mut rng);
    let norm0 = psi.norm_squared();
    let mut s0 = psi.clone();
    let mut s1 = StateVector::zeros(64);
    let mut s2 = StateVector::zeros(64);
    h.apply(&s0, &mut s1);
    let mut worst = s1.norm_squared() / norm0;
    for _ in 0..1000 {
        h.kernel_polynomial(&s0, &s1, &mut s2);
        s0.swap(&mut s1);
        s1.swap(&mut s2);
        worst = worst.max(s1.norm_squared() / norm0);
    }
    println!("  max ‖T_m ψ‖²/‖ψ‖² = {worst:.8}");
    harness.check_upper("Chebyshev norm growth", worst, CHEBYSHEV_NORM_GROWTH_MAX);
    println!();
    Ok(())
}

/// inner_product_1 + inner_product_2 vs a serial sum.
fn check_reduction(harness: &mut ValidationHarness) {
    println!("[4] Two-Phase Reduction Parity");
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut worst = 0.0_f64;
    for n in [1, 100, 511, 512, 513, 3000] {
        let u = random_phase_state(n, &mut rng);
        let v = random_phase_state(n, &mut rng);
        let fast = u.inner_product(&v);
        let slow = (0..n).fold(Complex64::ZERO, |acc, i| acc + u.get(i).conj() * v.get(i));
        worst = worst.max((fast - slow).abs() / n as f64);
    }
    harness.check_upper("reduction parity (per site)", worst, EXACT_F64);
    println!();
}

/// Dimer with t = 1: DOS peaks at ±1.
fn check_dimer_dos(harness: &mut ValidationHarness) -> lsqt::Result<()> {
    println!("[5] Dimer DOS — Peaks at ±t");
    let mut model = build_lattice(&LatticeSpec::open_chain(2, 1.0))?;
    model.energy_max = 1.5;
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let states: Vec<StateVector> = (0..64).map(|_| random_phase_state(2, &mut rng)).collect();
    let grid = ObservableGrid {
        number_of_moments: 256,
        energies: (0..=560).map(|k| -1.4 + f64::from(k) * 0.005).collect(),
        time_steps: Vec::new(),
    };
    let dos = find_dos(&model, &grid, &states);
    let argmax = |range: std::ops::Range<usize>| {
        range
            .max_by(|&a, &b| dos.dos[a].total_cmp(&dos.dos[b]))
            .map_or(f64::NAN, |k| dos.energies[k])
    };
    let half = dos.energies.len() / 2;
    let lower = argmax(0..half);
    let upper = argmax(half..dos.energies.len());
    println!("  peaks at {lower:.4}, {upper:.4}");
    harness.check_abs("dimer lower peak", lower, -1.0, DOS_PEAK_POSITION);
    harness.check_abs("dimer upper peak", upper, 1.0, DOS_PEAK_POSITION);
    println!();
    Ok(())
}

/// U(τ) conserves the norm; U(−τ)U(τ) = 1.
fn check_evolution(harness: &mut ValidationHarness) -> lsqt::Result<()> {
    println!("[6] Time Evolution — Unitarity");
    let model = ring(128)?;
    let h = Hamiltonian::new(&model);
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let psi0 = random_phase_state(128, &mut rng);
    let mut psi = psi0.clone();
    evolve(&h, Direction::Forward, 12.0, &mut psi);
    let drift = (psi.norm_squared() / psi0.norm_squared() - 1.0).abs();
    harness.check_upper("evolution norm drift", drift, EVOLUTION_NORM_TOLERANCE);
    evolve(&h, Direction::Backward, 12.0, &mut psi);
    let err = (0..128)
        .map(|i| (psi.get(i) - psi0.get(i)).abs())
        .fold(0.0, f64::max);
    println!("  norm drift {drift:.3e}, round-trip error {err:.3e}");
    harness.check_upper("forward/backward round trip", err, EVOLUTION_ROUND_TRIP);
    println!();
    Ok(())
}

/// Clean ring N=2048: ∫ρ(E)dE ≈ 1.
fn check_chain_normalization(harness: &mut ValidationHarness) -> lsqt::Result<()> {
    println!("[7] Clean Chain — DOS Normalization");
    // band edges at ±2 sit well inside ±E_max so no smoothed mass leaves the grid
    let mut model = ring(2048)?;
    model.energy_max = 2.5;
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let states: Vec<StateVector> = (0..4).map(|_| random_phase_state(2048, &mut rng)).collect();
    let grid = ObservableGrid {
        number_of_moments: 200,
        energies: (0..=480).map(|k| -2.4 + f64::from(k) * 0.01).collect(),
        time_steps: Vec::new(),
    };
    let dos = find_dos(&model, &grid, &states);
    let total = dos.integral();
    println!("  ∫ρ dE = {total:.5}");
    harness.check_abs("chain DOS integral", total, 1.0, DOS_NORMALIZATION);
    println!();
    Ok(())
}
