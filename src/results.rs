// SPDX-License-Identifier: AGPL-3.0-only

//! Observable results and the moment → spectrum → conductivity
//! post-processing.
//!
//! Units: ħ = e = 1. Energies in the hopping units of the model, times in
//! ħ / energy, conductivities in e²/ħ per volume of the lattice unit.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LsqtError, Result};
use crate::kernel::{chebyshev_summation, jackson_damping};

/// DOS below which ratios (ΔX², polarization) are reported as zero.
const DOS_FLOOR: f64 = 1e-12;

/// Jackson-damped spectrum on `energies`.
#[must_use]
pub fn reconstruct(moments: &[f64], energies: &[f64], energy_max: f64) -> Vec<f64> {
    let mut damped = moments.to_vec();
    jackson_damping(&mut damped);
    chebyshev_summation(&damped, energies, energy_max)
}

/// Correlation times 0, dt₀, dt₀ + dt₁, ...; the last step is never taken.
#[must_use]
pub fn vac_times(time_steps: &[f64]) -> Vec<f64> {
    let mut t = 0.0;
    time_steps
        .iter()
        .map(|dt| {
            let now = t;
            t += dt;
            now
        })
        .collect()
}

/// Cumulative times dt₀, dt₀ + dt₁, ...
#[must_use]
pub fn msd_times(time_steps: &[f64]) -> Vec<f64> {
    time_steps
        .iter()
        .scan(0.0, |t, dt| {
            *t += dt;
            Some(*t)
        })
        .collect()
}

fn ratio(numerator: f64, dos: f64) -> f64 {
    if dos > DOS_FLOOR {
        numerator / dos
    } else {
        0.0
    }
}

/// Density of states per site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DosResult {
    pub energies: Vec<f64>,
    pub dos: Vec<f64>,
}

impl DosResult {
    /// Damp and sum averaged DOS moments.
    #[must_use]
    pub fn from_moments(moments: &[f64], energies: &[f64], energy_max: f64) -> Self {
        Self {
            energies: energies.to_vec(),
            dos: reconstruct(moments, energies, energy_max),
        }
    }

    /// ∫ρ(E)dE by the trapezoid rule over the energy grid.
    #[must_use]
    pub fn integral(&self) -> f64 {
        self.energies
            .windows(2)
            .zip(self.dos.windows(2))
            .map(|(e, d)| 0.5 * (d[0] + d[1]) * (e[1] - e[0]))
            .sum()
    }
}

/// Velocity autocorrelation C(E, t) and running Kubo conductivity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VacResult {
    pub energies: Vec<f64>,
    pub times: Vec<f64>,
    /// `vac[t][e]`, per site.
    pub vac: Vec<Vec<f64>>,
    /// `sigma[t][e]` = (n / volume) ∫₀ᵗ C(E, t') dt'.
    pub sigma: Vec<Vec<f64>>,
}

impl VacResult {
    /// `moments[t]` holds the averaged moments at correlation time t.
    #[must_use]
    pub fn from_moments(
        moments: &[Vec<f64>],
        time_steps: &[f64],
        energies: &[f64],
        energy_max: f64,
        sites_per_volume: f64,
    ) -> Self {
        let vac: Vec<Vec<f64>> = moments
            .iter()
            .map(|mu| reconstruct(mu, energies, energy_max))
            .collect();
        let mut sigma = Vec::with_capacity(vac.len());
        let mut running = vec![0.0; energies.len()];
        for (k, c) in vac.iter().enumerate() {
            if k > 0 {
                let dt = time_steps[k - 1];
                for ((s, prev), now) in running.iter_mut().zip(&vac[k - 1]).zip(c) {
                    *s += sites_per_volume * 0.5 * (prev + now) * dt;
                }
            }
            sigma.push(running.clone());
        }
        Self {
            energies: energies.to_vec(),
            times: vac_times(time_steps),
            vac,
            sigma,
        }
    }
}

/// Mean-square displacement ΔX²(E, t) and Einstein conductivity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MsdResult {
    pub energies: Vec<f64>,
    pub times: Vec<f64>,
    /// `msd[t][e]` = ΔX²(E, t).
    pub msd: Vec<Vec<f64>>,
    /// `sigma[t][e]` = (n / volume) ρ(E) ½ dΔX²/dt.
    pub sigma: Vec<Vec<f64>>,
}

impl MsdResult {
    /// `moments[t]` holds the averaged ⟨φ_x|T_m|φ_x⟩ moments after t steps;
    /// `dos` is the per-site DOS on the same energy grid.
    #[must_use]
    pub fn from_moments(
        moments: &[Vec<f64>],
        dos: &[f64],
        time_steps: &[f64],
        energies: &[f64],
        energy_max: f64,
        sites_per_volume: f64,
    ) -> Self {
        let msd: Vec<Vec<f64>> = moments
            .iter()
            .map(|mu| {
                reconstruct(mu, energies, energy_max)
                    .iter()
                    .zip(dos)
                    .map(|(&s, &d)| ratio(s, d))
                    .collect()
            })
            .collect();
        let zero = vec![0.0; energies.len()];
        let sigma = msd
            .iter()
            .enumerate()
            .map(|(k, now)| {
                let prev = if k == 0 { &zero } else { &msd[k - 1] };
                let dt = time_steps[k];
                now.iter()
                    .zip(prev)
                    .zip(dos)
                    .map(|((n, p), d)| sites_per_volume * d * 0.5 * (n - p) / dt)
                    .collect()
            })
            .collect();
        Self {
            energies: energies.to_vec(),
            times: msd_times(time_steps),
            msd,
            sigma,
        }
    }
}

/// Spin-resolved DOS difference and polarization P(E) = s(E) / ρ(E).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    pub energies: Vec<f64>,
    pub dos: Vec<f64>,
    pub spin: Vec<f64>,
    pub polarization: Vec<f64>,
}

impl SpinResult {
    #[must_use]
    pub fn from_moments(
        dos_moments: &[f64],
        spin_moments: &[f64],
        energies: &[f64],
        energy_max: f64,
    ) -> Self {
        let dos = reconstruct(dos_moments, energies, energy_max);
        let spin = reconstruct(spin_moments, energies, energy_max);
        let polarization = spin.iter().zip(&dos).map(|(&s, &d)| ratio(s, d)).collect();
        Self {
            energies: energies.to_vec(),
            dos,
            spin,
            polarization,
        }
    }
}

/// Write `value` as pretty JSON, creating parent directories.
///
/// # Errors
///
/// Returns [`LsqtError::Io`] if the directory or file cannot be written,
/// [`LsqtError::Json`] if serialization fails.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LsqtError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| LsqtError::io(path, e))?;
    tracing::info!(path = %path.display(), "wrote results");
    Ok(())
}
