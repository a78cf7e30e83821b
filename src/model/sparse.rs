// SPDX-License-Identifier: AGPL-3.0-only

//! General sparse Hamiltonians given as explicit arrays.
//!
//! Each listed hopping `H_ij` also installs its Hermitian partner
//! `H_ji = conj(H_ij)`, so a file names every pair once. Bond
//! displacements along the transport axis come from the positions, with
//! the minimum-image convention on periodic axes.
//!
//! ```json
//! {
//!   "positions": [[0, 0, 0], [1, 0, 0]],
//!   "box_length": [2, 1, 1],
//!   "potential": [0.0, 0.0],
//!   "hoppings": [{ "i": 0, "j": 1, "value": { "re": -1.0, "im": 0.0 } }]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Axis, Bond, LatticeDescriptor, Model};
use crate::complex::Complex64;
use crate::error::{LsqtError, Result};

/// One off-diagonal element `H_ij`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hopping {
    pub i: usize,
    pub j: usize,
    pub value: Complex64,
}

/// Explicit orbital positions, on-site energies and hoppings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SparseModelSpec {
    pub positions: Vec<[f64; 3]>,
    pub box_length: [f64; 3],
    #[serde(default)]
    pub periodic: [bool; 3],
    /// On-site energies; empty means zero everywhere.
    #[serde(default)]
    pub potential: Vec<f64>,
    pub hoppings: Vec<Hopping>,
    #[serde(default)]
    pub transport_direction: Axis,
    /// Orbitals pair as (up, down) at (2s, 2s + 1).
    #[serde(default)]
    pub spinful: bool,
}

impl SparseModelSpec {
    /// Read a model file.
    ///
    /// # Errors
    ///
    /// Returns [`LsqtError::Io`] if the file cannot be read or
    /// [`LsqtError::Json`] on malformed JSON.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| LsqtError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    fn displacement(&self, i: usize, j: usize) -> f64 {
        let a = self.transport_direction.index();
        let mut dx = self.positions[j][a] - self.positions[i][a];
        let len = self.box_length[a];
        if self.periodic[a] && len > 0.0 {
            dx -= len * (dx / len).round();
        }
        dx
    }

    /// Pack into a [`Model`]; the energy scale is the Gershgorin estimate.
    ///
    /// # Errors
    ///
    /// Returns [`LsqtError::Model`] for an empty model, a potential of the
    /// wrong length, a hopping index out of range, a diagonal hopping, or
    /// a non-positive box length.
    pub fn build(&self) -> Result<Model> {
        let n = self.positions.len();
        if n == 0 {
            return Err(LsqtError::Model("sparse model has no orbitals".into()));
        }
        if let Some(len) = self.box_length.iter().find(|l| !(**l > 0.0)) {
            return Err(LsqtError::Model(format!("box lengths must be positive, got {len}")));
        }
        let potential = if self.potential.is_empty() {
            vec![0.0; n]
        } else {
            self.potential.clone()
        };

        let mut adjacency: Vec<Vec<Bond>> = vec![Vec::new(); n];
        for (k, h) in self.hoppings.iter().enumerate() {
            if h.i >= n || h.j >= n {
                return Err(LsqtError::Model(format!(
                    "hopping {k} connects {} and {} (n = {n})",
                    h.i, h.j
                )));
            }
            if h.i == h.j {
                return Err(LsqtError::Model(format!(
                    "hopping {k} is diagonal on {}; use the potential",
                    h.i
                )));
            }
            let dx = self.displacement(h.i, h.j);
            adjacency[h.i].push(Bond {
                target: h.j,
                hopping: h.value,
                displacement: dx,
            });
            adjacency[h.j].push(Bond {
                target: h.i,
                hopping: h.value.conj(),
                displacement: -dx,
            });
        }

        let lattice = LatticeDescriptor::from_adjacency(&adjacency, potential, true)?;
        tracing::debug!(
            orbitals = n,
            pairs = lattice.number_of_pairs(),
            "built sparse model"
        );
        Model::from_parts(
            lattice,
            self.positions.clone(),
            self.box_length,
            self.periodic,
            self.transport_direction,
            self.spinful,
            None,
        )
    }
}
