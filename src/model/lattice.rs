// SPDX-License-Identifier: AGPL-3.0-only

//! Hypercubic tight-binding lattices (chain, square, cubic).
//!
//! Sites are indexed `(ix * ny + iy) * nz + iz`. Every bond carries
//! hopping −t and, along the transport axis, displacement ±a. Periodic
//! wrapping is applied only on axes of length ≥ 3 (a length-2 ring would
//! duplicate the single bond).
//!
//! In spinful mode each spatial site `s` carries orbitals `2s` (up) and
//! `2s + 1` (down). Hopping conserves spin; a Zeeman term adds +B/2 to up
//! and −B/2 to down orbitals.

use serde::{Deserialize, Serialize};

use super::{Axis, Bond, LatticeDescriptor, Model};
use crate::complex::Complex64;
use crate::error::{LsqtError, Result};

/// Lattice geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LatticeShape {
    Chain { n: usize },
    Square { nx: usize, ny: usize },
    Cubic { nx: usize, ny: usize, nz: usize },
}

impl LatticeShape {
    /// Extent along x, y, z (1 on unused axes).
    #[must_use]
    pub const fn extents(self) -> [usize; 3] {
        match self {
            Self::Chain { n } => [n, 1, 1],
            Self::Square { nx, ny } => [nx, ny, 1],
            Self::Cubic { nx, ny, nz } => [nx, ny, nz],
        }
    }

    /// Number of spatial dimensions (1, 2 or 3).
    #[must_use]
    pub const fn dimension(self) -> usize {
        match self {
            Self::Chain { .. } => 1,
            Self::Square { .. } => 2,
            Self::Cubic { .. } => 3,
        }
    }

    /// Spatial sites, before any spin doubling.
    #[must_use]
    pub const fn number_of_sites(self) -> usize {
        let [nx, ny, nz] = self.extents();
        nx * ny * nz
    }
}

const fn default_one() -> f64 {
    1.0
}

const fn default_periodic() -> [bool; 3] {
    [true; 3]
}

/// Lattice parameters as read from a run configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatticeSpec {
    pub shape: LatticeShape,
    #[serde(default = "default_one")]
    pub lattice_constant: f64,
    /// Nearest-neighbor hopping t (matrix element −t).
    #[serde(default = "default_one")]
    pub hopping: f64,
    #[serde(default = "default_periodic")]
    pub periodic: [bool; 3],
    #[serde(default)]
    pub transport_direction: Axis,
    #[serde(default)]
    pub spinful: bool,
    /// Zeeman splitting B (spinful only).
    #[serde(default)]
    pub zeeman: f64,
}

impl LatticeSpec {
    /// Open chain of `n` sites with unit spacing and hopping `t`.
    #[must_use]
    pub fn open_chain(n: usize, t: f64) -> Self {
        Self {
            shape: LatticeShape::Chain { n },
            lattice_constant: 1.0,
            hopping: t,
            periodic: [false; 3],
            transport_direction: Axis::X,
            spinful: false,
            zeeman: 0.0,
        }
    }

    /// Check that the geometry is buildable.
    ///
    /// # Errors
    ///
    /// Returns [`LsqtError::Model`] for an empty lattice, a non-positive
    /// lattice constant, a transport axis the lattice does not extend
    /// along, or a Zeeman field on a spinless lattice.
    pub fn validate(&self) -> Result<()> {
        if self.shape.extents().contains(&0) {
            return Err(LsqtError::Model(format!("empty lattice {:?}", self.shape)));
        }
        if !(self.lattice_constant > 0.0) {
            return Err(LsqtError::Model(format!(
                "lattice_constant must be positive, got {}",
                self.lattice_constant
            )));
        }
        if self.transport_direction.index() >= self.shape.dimension() {
            return Err(LsqtError::Model(format!(
                "transport direction {:?} outside a {}D lattice",
                self.transport_direction,
                self.shape.dimension()
            )));
        }
        if !self.spinful && self.zeeman != 0.0 {
            return Err(LsqtError::Model(
                "zeeman splitting requires a spinful lattice".into(),
            ));
        }
        Ok(())
    }
}

/// Build a clean lattice model. `energy_max` is estimated from the
/// Gershgorin bound; callers that add disorder re-estimate or override it.
///
/// # Errors
///
/// Propagates [`LatticeSpec::validate`] and model-construction failures.
pub fn build_lattice(spec: &LatticeSpec) -> Result<Model> {
    spec.validate()?;
    let ext = spec.shape.extents();
    let dim = spec.shape.dimension();
    let a = spec.lattice_constant;
    let axis = spec.transport_direction.index();
    let hop = Complex64::new(-spec.hopping, 0.0);
    let spin_count = if spec.spinful { 2 } else { 1 };
    let n_sites = spec.shape.number_of_sites();
    let n_orbitals = n_sites * spin_count;

    let site_index = |c: [usize; 3]| (c[0] * ext[1] + c[1]) * ext[2] + c[2];

    let mut spatial_bonds: Vec<Vec<(usize, f64)>> = Vec::with_capacity(n_sites);
    let mut site_positions = Vec::with_capacity(n_sites);
    for ix in 0..ext[0] {
        for iy in 0..ext[1] {
            for iz in 0..ext[2] {
                let c = [ix, iy, iz];
                site_positions.push([ix as f64 * a, iy as f64 * a, iz as f64 * a]);
                let mut bonds = Vec::with_capacity(2 * dim);
                for d in 0..dim {
                    let len = ext[d];
                    let wrap = spec.periodic[d] && len >= 3;
                    let dx = if d == axis { a } else { 0.0 };
                    let down = if c[d] > 0 {
                        Some(c[d] - 1)
                    } else if wrap {
                        Some(len - 1)
                    } else {
                        None
                    };
                    let up = if c[d] + 1 < len {
                        Some(c[d] + 1)
                    } else if wrap {
                        Some(0)
                    } else {
                        None
                    };
                    if let Some(k) = down {
                        let mut nb = c;
                        nb[d] = k;
                        bonds.push((site_index(nb), -dx));
                    }
                    if let Some(k) = up {
                        let mut nb = c;
                        nb[d] = k;
                        bonds.push((site_index(nb), dx));
                    }
                }
                spatial_bonds.push(bonds);
            }
        }
    }

    let mut adjacency = Vec::with_capacity(n_orbitals);
    let mut potential = Vec::with_capacity(n_orbitals);
    let mut positions = Vec::with_capacity(n_orbitals);
    for (s, bonds) in spatial_bonds.iter().enumerate() {
        for spin in 0..spin_count {
            adjacency.push(
                bonds
                    .iter()
                    .map(|&(t, dx)| Bond {
                        target: t * spin_count + spin,
                        hopping: hop,
                        displacement: dx,
                    })
                    .collect(),
            );
            potential.push(if spec.spinful {
                if spin == 0 {
                    0.5 * spec.zeeman
                } else {
                    -0.5 * spec.zeeman
                }
            } else {
                0.0
            });
            positions.push(site_positions[s]);
        }
    }

    let mut box_length = [1.0; 3];
    let mut periodic = [false; 3];
    for d in 0..dim {
        box_length[d] = ext[d] as f64 * a;
        periodic[d] = spec.periodic[d] && ext[d] >= 3;
    }

    let lattice = LatticeDescriptor::from_adjacency(&adjacency, potential, true)?;
    tracing::debug!(
        sites = n_sites,
        orbitals = n_orbitals,
        pairs = lattice.number_of_pairs(),
        "built {:?} lattice",
        spec.shape
    );
    Model::from_parts(
        lattice,
        positions,
        box_length,
        periodic,
        spec.transport_direction,
        spec.spinful,
        None,
    )
}
