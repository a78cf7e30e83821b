// SPDX-License-Identifier: AGPL-3.0-only

//! Run configuration (JSON on disk).
//!
//! ```json
//! {
//!   "lattice": { "shape": { "kind": "square", "nx": 256, "ny": 256 }, "hopping": 2.7 },
//!   "disorder": { "anderson": 1.0 },
//!   "number_of_moments": 1000,
//!   "number_of_random_vectors": 4,
//!   "energies": { "min": -8.0, "max": 8.0, "points": 801 },
//!   "time_steps": { "step": 1.0, "count": 50 },
//!   "observables": { "dos": true, "vac": true, "msd": true }
//! }
//! ```
//!
//! A general sparse Hamiltonian replaces `lattice` with
//! `"model": { "file": "graphene.json" }` or `"model": { "inline": { ... } }`;
//! relative file paths resolve against the config file's directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LsqtError, Result};
use crate::model::disorder::DisorderSpec;
use crate::model::lattice::{build_lattice, LatticeSpec};
use crate::model::sparse::SparseModelSpec;
use crate::model::Model;

/// Energies as an explicit list or a uniform grid (endpoints included).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnergyGrid {
    List(Vec<f64>),
    Uniform { min: f64, max: f64, points: usize },
}

impl EnergyGrid {
    /// Expanded energies.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        match self {
            Self::List(v) => v.clone(),
            Self::Uniform { min, max, points } => match points {
                0 => Vec::new(),
                1 => vec![*min],
                _ => {
                    let de = (max - min) / (*points - 1) as f64;
                    (0..*points).map(|k| de.mul_add(k as f64, *min)).collect()
                }
            },
        }
    }
}

/// Time steps as an explicit list or `count` equal steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeGrid {
    List(Vec<f64>),
    Uniform { step: f64, count: usize },
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl TimeGrid {
    /// Expanded step lengths.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        match self {
            Self::List(v) => v.clone(),
            Self::Uniform { step, count } => vec![*step; *count],
        }
    }
}

const SOURCE_RULE: &str = "exactly one of lattice or model is required";

const fn yes() -> bool {
    true
}

/// Which observables a run computes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservableSelection {
    #[serde(default = "yes")]
    pub dos: bool,
    #[serde(default)]
    pub vac: bool,
    #[serde(default)]
    pub msd: bool,
    #[serde(default)]
    pub spin: bool,
}

impl Default for ObservableSelection {
    fn default() -> Self {
        Self {
            dos: true,
            vac: false,
            msd: false,
            spin: false,
        }
    }
}

const fn default_moments() -> usize {
    1000
}

const fn default_vectors() -> usize {
    1
}

/// A sparse Hamiltonian given by file or written inline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    File(PathBuf),
    Inline(SparseModelSpec),
}

impl ModelSource {
    /// Load (if needed) and build the clean model.
    ///
    /// # Errors
    ///
    /// Propagates [`SparseModelSpec::from_path`] and
    /// [`SparseModelSpec::build`] failures.
    pub fn build(&self) -> Result<Model> {
        match self {
            Self::File(path) => SparseModelSpec::from_path(path)?.build(),
            Self::Inline(spec) => spec.build(),
        }
    }
}

/// Complete description of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Hypercubic lattice; exclusive with `model`.
    #[serde(default)]
    pub lattice: Option<LatticeSpec>,
    #[serde(default)]
    pub model: Option<ModelSource>,
    #[serde(default)]
    pub disorder: DisorderSpec,
    /// Spectrum bound; estimated from the Gershgorin radius when absent.
    #[serde(default)]
    pub energy_max: Option<f64>,
    /// Chebyshev order M; even and at least 2.
    #[serde(default = "default_moments")]
    pub number_of_moments: usize,
    #[serde(default = "default_vectors")]
    pub number_of_random_vectors: usize,
    pub energies: EnergyGrid,
    #[serde(default)]
    pub time_steps: TimeGrid,
    #[serde(default)]
    pub observables: ObservableSelection,
    /// Seed of both ChaCha8 streams.
    #[serde(default)]
    pub seed: u64,
}

impl RunConfig {
    /// Parse and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`LsqtError::Io`] if the file cannot be read,
    /// [`LsqtError::Json`] on malformed JSON, or [`LsqtError::Config`] if
    /// [`RunConfig::validate`] fails.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| LsqtError::io(path, e))?;
        let mut config: Self = serde_json::from_str(&text)?;
        if let (Some(ModelSource::File(model_path)), Some(dir)) = (&mut config.model, path.parent())
        {
            if model_path.is_relative() {
                *model_path = dir.join(&*model_path);
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Disorder-free model from `lattice` or `model`.
    ///
    /// # Errors
    ///
    /// Returns [`LsqtError::Config`] unless exactly one source is given,
    /// and propagates construction failures.
    pub fn clean_model(&self) -> Result<Model> {
        match (&self.lattice, &self.model) {
            (Some(spec), None) => build_lattice(spec),
            (None, Some(source)) => source.build(),
            _ => Err(LsqtError::Config(SOURCE_RULE.into())),
        }
    }

    /// Spin flag known without loading a model file.
    fn declared_spinful(&self) -> Option<bool> {
        match (&self.lattice, &self.model) {
            (Some(spec), _) => Some(spec.spinful),
            (None, Some(ModelSource::Inline(spec))) => Some(spec.spinful),
            _ => None,
        }
    }

    /// Driver preconditions that do not depend on the built model.
    ///
    /// # Errors
    ///
    /// Returns [`LsqtError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        let m = self.number_of_moments;
        if m < 2 || m % 2 != 0 {
            return Err(LsqtError::Config(format!(
                "number_of_moments must be even and >= 2, got {m}"
            )));
        }
        if self.number_of_random_vectors == 0 {
            return Err(LsqtError::Config(
                "number_of_random_vectors must be >= 1".into(),
            ));
        }
        let energies = self.energies.values();
        if energies.is_empty() {
            return Err(LsqtError::Config("energy grid is empty".into()));
        }
        if let Some(emax) = self.energy_max {
            if !(emax > 0.0) {
                return Err(LsqtError::Config(format!("energy_max must be positive, got {emax}")));
            }
            self.check_energies_inside(emax)?;
        }
        let needs_time = self.observables.vac || self.observables.msd;
        let steps = self.time_steps.values();
        if needs_time && steps.is_empty() {
            return Err(LsqtError::Config(
                "vac/msd requested but time_steps is empty".into(),
            ));
        }
        if let Some(dt) = steps.iter().find(|dt| !(**dt > 0.0)) {
            return Err(LsqtError::Config(format!("time steps must be positive, got {dt}")));
        }
        if self.observables.spin && self.declared_spinful() == Some(false) {
            return Err(LsqtError::Config(
                "spin polarization requires a spinful lattice".into(),
            ));
        }
        if self.disorder.resample_per_vector && self.energy_max.is_none() {
            return Err(LsqtError::Config(
                "resample_per_vector needs an explicit energy_max shared by all realizations"
                    .into(),
            ));
        }
        match (&self.lattice, &self.model) {
            (Some(spec), None) => spec.validate().map_err(|e| LsqtError::Config(e.to_string())),
            (None, Some(_)) => Ok(()),
            _ => Err(LsqtError::Config(SOURCE_RULE.into())),
        }
    }

    /// Every energy must lie strictly inside (−energy_max, energy_max).
    ///
    /// # Errors
    ///
    /// Returns [`LsqtError::Config`] naming the first offending energy.
    pub fn check_energies_inside(&self, energy_max: f64) -> Result<()> {
        match self.energies.values().into_iter().find(|e| e.abs() >= energy_max) {
            Some(e) => Err(LsqtError::Config(format!(
                "energy {e} outside (-{energy_max}, {energy_max})"
            ))),
            None => Ok(()),
        }
    }
}
