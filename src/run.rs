// SPDX-License-Identifier: AGPL-3.0-only

//! End-to-end run: build the model, loop over random vectors, average
//! moments, post-process and write results.
//!
//! Two ChaCha8 streams derive from the config seed: stream 0 draws
//! disorder, stream 1 draws random phases. Changing the disorder settings
//! therefore leaves the random-phase sequence unchanged.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::{LsqtError, Result};
use crate::hamiltonian::Hamiltonian;
use crate::model::charge::add_random_impurities;
use crate::model::disorder::{apply_anderson, remove_vacancies};
use crate::model::{estimate_energy_max, random_phase_state, Model};
use crate::observables::{
    dos_moments, dos_result, msd_moments, msd_result, spin_moments, spin_result, vac_moments,
    vac_result, MomentAccumulator, ObservableGrid,
};
use crate::results::{write_json, DosResult, MsdResult, SpinResult, VacResult};

const DISORDER_STREAM: u64 = 0;
const PHASE_STREAM: u64 = 1;

/// Results of one run; unrequested observables are `None`.
#[derive(Clone, Debug, Serialize)]
pub struct RunOutput {
    pub number_of_atoms: usize,
    /// Energy scale used for the last realization.
    pub energy_max: f64,
    pub dos: Option<DosResult>,
    pub vac: Option<VacResult>,
    pub msd: Option<MsdResult>,
    pub spin: Option<SpinResult>,
}

/// Build one disorder realization from `config`.
///
/// # Errors
///
/// Propagates model, disorder and energy-range failures; a spinless
/// model with spin polarization requested is [`LsqtError::Config`].
pub fn build_model(config: &RunConfig, rng: &mut ChaCha8Rng) -> Result<Model> {
    let mut model = config.clean_model()?;
    if config.observables.spin && !model.spinful {
        return Err(LsqtError::Config(
            "spin polarization requires a spinful model".into(),
        ));
    }
    let disorder = &config.disorder;
    remove_vacancies(&mut model, disorder.vacancies, rng)?;
    apply_anderson(&mut model, disorder.anderson, rng);
    if let Some(spec) = &disorder.charged_impurities {
        add_random_impurities(&mut model, spec, rng)?;
    }
    model.energy_max = config
        .energy_max
        .unwrap_or_else(|| estimate_energy_max(&model.lattice));
    model.check_energy_max();
    config.check_energies_inside(model.energy_max)?;
    Ok(model)
}

/// Execute `config` and return the averaged results.
///
/// # Errors
///
/// Returns [`LsqtError::Config`] on invalid settings and
/// propagates model-construction failures.
pub fn run(config: &RunConfig) -> Result<RunOutput> {
    config.validate()?;
    let selection = &config.observables;
    let grid = ObservableGrid {
        number_of_moments: config.number_of_moments,
        energies: config.energies.values(),
        time_steps: config.time_steps.values(),
    };

    let mut disorder_rng = ChaCha8Rng::seed_from_u64(config.seed);
    disorder_rng.set_stream(DISORDER_STREAM);
    let mut phase_rng = ChaCha8Rng::seed_from_u64(config.seed);
    phase_rng.set_stream(PHASE_STREAM);

    let mut model = build_model(config, &mut disorder_rng)?;
    tracing::info!(
        atoms = model.number_of_atoms(),
        pairs = model.lattice.number_of_pairs(),
        energy_max = model.energy_max,
        moments = grid.number_of_moments,
        vectors = config.number_of_random_vectors,
        "model ready"
    );

    let mut dos = MomentAccumulator::new();
    let mut vac = MomentAccumulator::new();
    let mut msd = MomentAccumulator::new();
    let mut spin = MomentAccumulator::new();
    let need_dos = selection.dos || selection.msd || selection.spin;

    for r in 0..config.number_of_random_vectors {
        if r > 0 && config.disorder.resample_per_vector {
            model = build_model(config, &mut disorder_rng)?;
        }
        let h = Hamiltonian::new(&model);
        let phi = random_phase_state(model.number_of_atoms(), &mut phase_rng);
        tracing::debug!(vector = r, "random vector");

        if need_dos {
            dos.add_row(&dos_moments(&h, grid.number_of_moments, &phi));
        }
        if selection.vac {
            vac.add(&vac_moments(&h, &grid, &phi));
        }
        if selection.msd {
            msd.add(&msd_moments(&h, &grid, &phi));
        }
        if selection.spin {
            spin.add_row(&spin_moments(&h, grid.number_of_moments, &phi));
        }
    }

    let output = RunOutput {
        number_of_atoms: model.number_of_atoms(),
        energy_max: model.energy_max,
        dos: selection.dos.then(|| dos_result(&model, &grid, &dos)),
        vac: selection.vac.then(|| vac_result(&model, &grid, &vac)),
        msd: selection.msd.then(|| msd_result(&model, &grid, &dos, &msd)),
        spin: selection.spin.then(|| spin_result(&model, &grid, &dos, &spin)),
    };
    tracing::info!("run complete");
    Ok(output)
}

fn emit<T: Serialize>(dir: &Path, name: &str, value: &T, written: &mut Vec<PathBuf>) -> Result<()> {
    let path = dir.join(name);
    write_json(&path, value)?;
    written.push(path);
    Ok(())
}

/// Write each computed observable to `<dir>/<name>.json`.
///
/// # Errors
///
/// Propagates [`write_json`] failures.
pub fn write_results(output: &RunOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if let Some(r) = &output.dos {
        emit(dir, "dos.json", r, &mut written)?;
    }
    if let Some(r) = &output.vac {
        emit(dir, "vac.json", r, &mut written)?;
    }
    if let Some(r) = &output.msd {
        emit(dir, "msd.json", r, &mut written)?;
    }
    if let Some(r) = &output.spin {
        emit(dir, "spin.json", r, &mut written)?;
    }
    Ok(written)
}
