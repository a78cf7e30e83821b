// SPDX-License-Identifier: AGPL-3.0-only

//! Integration tests: DOS, VAC, MSD and spin polarization on lattices
//! with known spectra and known transport.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use lsqt::hamiltonian::Hamiltonian;
use lsqt::model::lattice::{build_lattice, LatticeShape, LatticeSpec};
use lsqt::model::{random_phase_state, Model};
use lsqt::observables::{
    find_dos, find_msd, find_spin_polarization, find_vac, msd_moments, vac_moments, ObservableGrid,
};
use lsqt::tolerances::{DOS_NORMALIZATION, DOS_PEAK_POSITION, DOS_SYMMETRY};
use lsqt::StateVector;

fn ring(n: usize) -> Model {
    let mut spec = LatticeSpec::open_chain(n, 1.0);
    spec.periodic = [true; 3];
    build_lattice(&spec).expect("ring")
}

fn uniform(min: f64, max: f64, points: usize) -> Vec<f64> {
    let step = (max - min) / (points - 1) as f64;
    (0..points).map(|k| min + step * k as f64).collect()
}

fn random_states(n: usize, count: usize, seed: u64) -> Vec<StateVector> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count).map(|_| random_phase_state(n, &mut rng)).collect()
}

#[test]
fn dimer_dos_peaks_at_plus_minus_t() {
    let mut model = build_lattice(&LatticeSpec::open_chain(2, 1.0)).expect("dimer");
    model.energy_max = 1.5;
    let grid = ObservableGrid {
        number_of_moments: 256,
        energies: uniform(-1.4, 1.4, 561),
        time_steps: Vec::new(),
    };
    let dos = find_dos(&model, &grid, &random_states(2, 64, 99));
    let half = grid.energies.len() / 2;
    let peak = |range: std::ops::Range<usize>| {
        let k = range
            .max_by(|&a, &b| dos.dos[a].total_cmp(&dos.dos[b]))
            .expect("non-empty");
        dos.energies[k]
    };
    let lower = peak(0..half);
    let upper = peak(half..grid.energies.len());
    assert!((lower + 1.0).abs() < DOS_PEAK_POSITION, "lower peak at {lower}");
    assert!((upper - 1.0).abs() < DOS_PEAK_POSITION, "upper peak at {upper}");
    // the gap between the two levels is nearly empty
    let centre = dos.dos[half];
    assert!(centre < 0.05 * dos.dos.iter().copied().fold(0.0, f64::max));
}

#[test]
fn clean_ring_dos_normalized_and_symmetric() {
    let mut model = ring(32);
    model.energy_max = 2.5;
    let grid = ObservableGrid {
        number_of_moments: 128,
        energies: uniform(-2.4, 2.4, 481),
        time_steps: Vec::new(),
    };
    // all basis states: the exact trace
    let states: Vec<StateVector> = (0..32).map(|i| StateVector::basis(32, i)).collect();
    let mut dos = find_dos(&model, &grid, &states);
    // basis moments are ⟨e_i|T_m|e_i⟩ / n; their mean carries one extra 1/n
    for d in &mut dos.dos {
        *d *= 32.0;
    }
    let total = dos.integral();
    assert!((total - 1.0).abs() < DOS_NORMALIZATION, "∫ρ = {total}");
    let n = dos.dos.len();
    for k in 0..n / 2 {
        let (a, b) = (dos.dos[k], dos.dos[n - 1 - k]);
        assert!((a - b).abs() < DOS_SYMMETRY, "ρ({}) = {a} vs {b}", dos.energies[k]);
    }
}

#[test]
fn chain_dos_follows_arcsine_law() {
    // ρ(E) = 1 / (π √(4 − E²)) for the infinite chain
    let mut model = ring(16384);
    model.energy_max = 2.5;
    let grid = ObservableGrid {
        number_of_moments: 400,
        energies: vec![-1.0, 0.0, 0.5, 1.2],
        time_steps: Vec::new(),
    };
    let dos = find_dos(&model, &grid, &random_states(16384, 8, 5));
    for (e, rho) in dos.energies.iter().zip(&dos.dos) {
        let exact = 1.0 / (std::f64::consts::PI * (4.0 - e * e).sqrt());
        assert!(
            ((rho - exact) / exact).abs() < 0.1,
            "ρ({e}) = {rho}, exact {exact}"
        );
    }
}

#[test]
fn zeeman_chain_polarization_at_band_edges() {
    let mut spec = LatticeSpec::open_chain(1000, 1.0);
    spec.periodic = [true; 3];
    spec.spinful = true;
    spec.zeeman = 1.0;
    let model = build_lattice(&spec).expect("spinful ring");
    assert_eq!(model.number_of_atoms(), 2000);
    // up band [−1.5, 2.5], down band [−2.5, 1.5]
    let grid = ObservableGrid {
        number_of_moments: 512,
        energies: vec![-2.2, 2.2],
        time_steps: Vec::new(),
    };
    let spin = find_spin_polarization(&model, &grid, &random_states(2000, 4, 31));
    assert!(spin.dos.iter().all(|&d| d > 0.05));
    assert!(spin.polarization[0] < -0.95, "P(−2.2) = {}", spin.polarization[0]);
    assert!(spin.polarization[1] > 0.95, "P(2.2) = {}", spin.polarization[1]);
}

#[test]
fn ballistic_msd_is_time_squared_vac() {
    // clean ring: V commutes with H, so φ_x(t) = t V U(t) φ and the MSD
    // moments are t² times the VAC moments at t = 0
    let model = ring(256);
    let h = Hamiltonian::new(&model);
    let phi = &random_states(256, 1, 77)[0];
    let grid = ObservableGrid {
        number_of_moments: 32,
        energies: vec![0.0],
        time_steps: vec![0.5; 6],
    };
    let vac = vac_moments(&h, &grid, phi);
    let msd = msd_moments(&h, &grid, phi);
    for (k, row) in msd.iter().enumerate() {
        let t = 0.5 * (k + 1) as f64;
        for (m, (x, c)) in row.iter().zip(&vac[0]).enumerate() {
            assert!((x - t * t * c).abs() < 1e-8, "t={t} m={m}: {x} vs {}", t * t * c);
        }
    }
    // VAC is time independent without scattering
    for row in &vac {
        for (a, b) in row.iter().zip(&vac[0]) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}

#[test]
fn ballistic_kubo_and_einstein_agree() {
    // σ_msd(t_k) averages σ_vac at t_{k−1} and t_k when C(E) is constant;
    // the VAC times lag the MSD times by one step
    let model = ring(512);
    let states = random_states(512, 2, 13);
    let grid = ObservableGrid {
        number_of_moments: 200,
        energies: vec![-1.0, 0.0, 1.0],
        time_steps: vec![1.0; 5],
    };
    let vac = find_vac(&model, &grid, &states);
    let msd = find_msd(&model, &grid, &states);
    assert_eq!(vac.times, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(msd.times, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    for k in 1..4 {
        for e in 0..3 {
            let kubo = 0.5 * (vac.sigma[k][e] + vac.sigma[k + 1][e]);
            let einstein = msd.sigma[k][e];
            assert!(
                ((kubo - einstein) / kubo).abs() < 0.05,
                "t={} E={}: kubo {kubo} vs einstein {einstein}",
                msd.times[k],
                grid.energies[e]
            );
        }
    }
}

#[test]
fn disorder_suppresses_square_lattice_spreading() {
    let grid = ObservableGrid {
        number_of_moments: 64,
        energies: vec![0.0],
        time_steps: vec![2.0; 4],
    };
    let spread = |w: f64| {
        let mut spec = LatticeSpec::open_chain(1, 1.0);
        spec.shape = LatticeShape::Square { nx: 24, ny: 24 };
        let mut model = build_lattice(&spec).expect("square");
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        lsqt::model::disorder::apply_anderson(&mut model, w, &mut rng);
        model.energy_max = lsqt::model::estimate_energy_max(&model.lattice);
        let msd = find_msd(&model, &grid, &random_states(576, 2, 8));
        msd.msd[3][0]
    };
    let clean = spread(0.0);
    let dirty = spread(8.0);
    assert!(dirty < 0.5 * clean, "ΔX² clean {clean}, W=8 {dirty}");
}
