// SPDX-License-Identifier: AGPL-3.0-only

//! Kernel polynomial method: Jackson damping and moment-to-spectrum
//! reconstruction.

use std::f64::consts::PI;

use rayon::prelude::*;

/// Jackson kernel factors g₀ .. g_{M−1} for `m_total` moments.
///
/// g_m = [(M − m + 1) cos(πm/(M+1)) + sin(πm/(M+1)) cot(π/(M+1))] / (M + 1)
#[must_use]
pub fn jackson_kernel(m_total: usize) -> Vec<f64> {
    let mp1 = (m_total + 1) as f64;
    let a = PI / mp1;
    let cot_a = a.cos() / a.sin();
    (0..m_total)
        .map(|m| {
            let theta = a * m as f64;
            ((mp1 - m as f64) * theta.cos() + theta.sin() * cot_a) / mp1
        })
        .collect()
}

/// Multiply moments in place by the Jackson kernel.
pub fn jackson_damping(moments: &mut [f64]) {
    let kernel = jackson_kernel(moments.len());
    for (mu, g) in moments.iter_mut().zip(kernel) {
        *mu *= g;
    }
}

/// f(E) = [μ₀ + 2 Σ_{m≥1} μ_m T_m(x)] / (π √(1 − x²) E_max), x = E / E_max.
///
/// Energies with |x| ≥ 1 lie outside the rescaled band and return 0.
#[must_use]
pub fn chebyshev_summation(moments: &[f64], energies: &[f64], energy_max: f64) -> Vec<f64> {
    energies
        .par_iter()
        .map(|&e| {
            let x = e / energy_max;
            if x.abs() >= 1.0 || moments.is_empty() {
                return 0.0;
            }
            let mut sum = moments[0];
            let (mut t0, mut t1) = (1.0, x);
            for &mu in &moments[1..] {
                sum += 2.0 * mu * t1;
                let t2 = (2.0 * x).mul_add(t1, -t0);
                t0 = t1;
                t1 = t2;
            }
            sum / (PI * (1.0 - x * x).sqrt() * energy_max)
        })
        .collect()
}
