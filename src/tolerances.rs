// SPDX-License-Identifier: AGPL-3.0-only

//! Numerical constants and validation tolerances.
//!
//! Every threshold used by the recursion drivers, the test suite and the
//! `validate_chebyshev` binary is defined here with its origin. No ad-hoc
//! magic numbers in checks.

// ═══════════════════════════════════════════════════════════════════
// Algorithm constants
// ═══════════════════════════════════════════════════════════════════

/// Bessel coefficient magnitude below which the time-evolution series is
/// truncated (once the order exceeds the argument τ).
///
/// J_m(τ) decays super-exponentially for m > τ; 1e-15 is below f64
/// resolution relative to the O(1) leading terms.
pub const BESSEL_CUTOFF: f64 = 1e-15;

/// Extra Bessel orders allocated beyond 1.5·τ before truncation.
pub const BESSEL_EXTRA_ORDERS: usize = 40;

/// Multiplier applied to the Gershgorin bound when estimating energy_max.
///
/// The Chebyshev expansion requires the rescaled spectrum strictly inside
/// [−1, 1]; 1% headroom keeps the band edges away from x = ±1 where the
/// weight 1/√(1−x²) diverges.
pub const ENERGY_MAX_SAFETY_FACTOR: f64 = 1.01;

/// Default charged-impurity cutoff in units of the screening range ξ.
///
/// exp(−100/2) ≈ 2e-22, below f64 resolution of any O(1) potential.
pub const IMPURITY_CUTOFF_RANGES: f64 = 10.0;

/// Moment magnitude above which the drivers warn about divergence.
///
/// |μ_m| ≤ ⟨ψ|ψ⟩/n = 1 for random-phase states when the rescaled spectrum
/// lies in [−1, 1]; anything beyond 1.5 means energy_max is too small.
pub const MOMENT_DIVERGENCE_BOUND: f64 = 1.5;

// ═══════════════════════════════════════════════════════════════════
// Validation tolerances
// ═══════════════════════════════════════════════════════════════════

/// Exact-arithmetic comparisons (few flops, small integers).
pub const EXACT_F64: f64 = 1e-12;

/// Recursion vs dense-matrix reference on toy lattices.
///
/// Tens of fused multiply-adds per entry; accumulated rounding stays
/// below 1e-10.
pub const RECURSION_VS_DENSE: f64 = 1e-10;

/// Norm drift after 1000 bare Chebyshev steps with a bounded spectrum.
///
/// |T_m(x)| ≤ 1 on [−1, 1], so ‖T_m(H̃)ψ‖² ≤ ‖ψ‖²; rounding may push it
/// marginally above.
pub const CHEBYSHEV_NORM_GROWTH_MAX: f64 = 1.0 + 1e-6;

/// Norm conservation of one Chebyshev time-evolution step.
pub const EVOLUTION_NORM_TOLERANCE: f64 = 1e-10;

/// Forward followed by backward evolution returns the initial state.
pub const EVOLUTION_ROUND_TRIP: f64 = 1e-9;

/// Bessel J_m via backward recurrence vs series reference.
pub const BESSEL_TOLERANCE: f64 = 1e-12;

/// DOS peak position error for the dimer at M = 256 Jackson moments.
///
/// The Jackson kernel broadens a delta peak to width ≈ π·energy_max/M;
/// with energy_max ≈ 1.01 and M = 256 that is ≈ 0.012, so the sampled
/// argmax on a 0.005 grid lands within 0.05 of ±t.
pub const DOS_PEAK_POSITION: f64 = 0.05;

/// DOS normalization ∫ρ(E)dE = 1 with trapezoid quadrature.
///
/// Mass lost beyond the band edges and grid discretization cost a few
/// percent at M ≈ 200 on a 400-point grid.
pub const DOS_NORMALIZATION: f64 = 0.05;

/// Clean-chain DOS mirror symmetry ρ(E) = ρ(−E), relative.
pub const DOS_SYMMETRY: f64 = 1e-8;

/// Charged-impurity potential via cell list vs brute-force sum.
pub const CELL_LIST_PARITY: f64 = 1e-12;
