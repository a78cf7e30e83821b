// SPDX-License-Identifier: AGPL-3.0-only

//! lsqt — linear-scaling quantum transport
//!
//! Spectral and transport properties of large tight-binding systems by
//! Chebyshev expansion on random-phase state vectors: the cost of every
//! observable is O(moments × pairs × random vectors), never O(n³).
//!
//! ## Core
//!   - `vector` — split real/imag state vectors, two-phase reductions
//!   - `hamiltonian` — H̃, [X, H̃], current and S_z operators
//!   - `recursion` — plain, paired and bare Chebyshev steps
//!   - `evolution` — e^{∓iH̃τ} and [X, e^{−iH̃τ}] by Bessel expansion
//!
//! ## Drivers
//!   - `observables` — DOS, VAC, MSD and spin-polarization moments
//!   - `kernel`, `results` — Jackson damping, spectra, conductivities
//!   - `run` — config-driven averaging over random vectors
//!
//! ## Model
//!   - `model` — neighbor lists, lattices, explicit sparse models,
//!     Anderson disorder, vacancies, charged impurities, energy-scale
//!     estimation
//!
//! ## Binaries
//!   - `lsqt` — run a JSON configuration and write results
//!   - `validate_chebyshev` — analytic and dense-reference checks, exit 0/1

pub mod complex;
pub mod config;
pub mod error;
pub mod evolution;
pub mod hamiltonian;
pub mod kernel;
pub mod model;
pub mod observables;
pub mod recursion;
pub mod results;
pub mod run;
pub mod special;
pub mod tolerances;
pub mod validation;
pub mod vector;

pub use complex::Complex64;
pub use error::{LsqtError, Result};
pub use hamiltonian::Hamiltonian;
pub use model::Model;
pub use recursion::{Direction, Phase};
pub use vector::StateVector;
