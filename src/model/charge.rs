// SPDX-License-Identifier: AGPL-3.0-only

//! Gaussian charged impurities.
//!
//! `count` centers sit on random orbitals with strengths W_k ~ U[−W/2, W/2].
//! Every orbital within the cutoff of a center gains
//! W_k exp(−r² / 2ξ²). Centers are binned into a cell list with cell edge
//! ≥ cutoff, so each orbital only scans its own and the 26 adjacent cells.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Model;
use crate::error::{LsqtError, Result};
use crate::tolerances::IMPURITY_CUTOFF_RANGES;

/// Charged-impurity parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChargedImpuritySpec {
    pub count: usize,
    /// Strength window W.
    pub strength: f64,
    /// Gaussian range ξ.
    pub range: f64,
    /// Interaction cutoff; defaults to 10ξ.
    #[serde(default)]
    pub cutoff: Option<f64>,
}

impl ChargedImpuritySpec {
    /// Effective cutoff: the explicit value or 10ξ.
    #[must_use]
    pub fn cutoff(&self) -> f64 {
        self.cutoff.unwrap_or(IMPURITY_CUTOFF_RANGES * self.range)
    }
}

/// Impurity centers with their strengths.
#[derive(Clone, Debug, PartialEq)]
pub struct Impurities {
    pub positions: Vec<[f64; 3]>,
    /// W_k, one per center.
    pub strengths: Vec<f64>,
}

impl Impurities {
    /// Place centers on distinct random orbitals of `model`.
    pub fn random<R: Rng + ?Sized>(model: &Model, spec: &ChargedImpuritySpec, rng: &mut R) -> Self {
        let count = spec.count.min(model.number_of_atoms());
        let picks = rand::seq::index::sample(rng, model.number_of_atoms(), count).into_vec();
        let positions = picks.iter().map(|&i| model.positions[i]).collect();
        let strengths = (0..count)
            .map(|_| spec.strength * (rng.gen::<f64>() - 0.5))
            .collect();
        Self {
            positions,
            strengths,
        }
    }
}

/// Uniform cell grid over a (possibly partially periodic) box.
///
/// Coordinates are wrapped into the box on periodic axes and clamped to
/// the edge cells on open axes.
pub struct CellList {
    pub n_cells: [usize; 3],
    pub cell_size: [f64; 3],
    pub periodic: [bool; 3],
    /// Offset of each cell into `sorted_indices`.
    pub cell_start: Vec<usize>,
    pub cell_count: Vec<usize>,
    pub sorted_indices: Vec<usize>,
}

impl CellList {
    /// Bin `points` into cells of edge ≥ `rc`.
    #[must_use]
    pub fn build(points: &[[f64; 3]], box_length: [f64; 3], periodic: [bool; 3], rc: f64) -> Self {
        let mut n_cells = [1usize; 3];
        let mut cell_size = [0.0; 3];
        for d in 0..3 {
            n_cells[d] = ((box_length[d] / rc).floor() as usize).max(1);
            cell_size[d] = box_length[d] / n_cells[d] as f64;
        }
        let total = n_cells.iter().product::<usize>();

        let cell_ids: Vec<usize> = points
            .iter()
            .map(|p| Self::cell_of(p, n_cells, cell_size, periodic))
            .collect();
        let mut sorted_indices: Vec<usize> = (0..points.len()).collect();
        sorted_indices.sort_by_key(|&i| cell_ids[i]);

        let mut cell_count = vec![0usize; total];
        for &c in &cell_ids {
            cell_count[c] += 1;
        }
        let mut cell_start = vec![0usize; total];
        let mut offset = 0;
        for (start, &count) in cell_start.iter_mut().zip(&cell_count) {
            *start = offset;
            offset += count;
        }

        Self {
            n_cells,
            cell_size,
            periodic,
            cell_start,
            cell_count,
            sorted_indices,
        }
    }

    fn coord(x: f64, n: usize, size: f64, periodic: bool) -> usize {
        let c = (x / size).floor();
        if periodic {
            // rem_euclid keeps images of the box in range; the min guards x = L⁻ rounding
            ((c.rem_euclid(n as f64)) as usize).min(n - 1)
        } else if c < 0.0 {
            0
        } else {
            (c as usize).min(n - 1)
        }
    }

    fn cell_of(p: &[f64; 3], n_cells: [usize; 3], cell_size: [f64; 3], periodic: [bool; 3]) -> usize {
        let c: [usize; 3] =
            std::array::from_fn(|d| Self::coord(p[d], n_cells[d], cell_size[d], periodic[d]));
        (c[0] * n_cells[1] + c[1]) * n_cells[2] + c[2]
    }

    /// Indices of points binned in the cells around `p` (self cell plus
    /// neighbors; wrapped on periodic axes, each cell visited once).
    pub fn for_each_candidate<F: FnMut(usize)>(&self, p: &[f64; 3], mut f: F) {
        let periodic = self.periodic;
        let home: [usize; 3] = std::array::from_fn(|d| {
            Self::coord(p[d], self.n_cells[d], self.cell_size[d], periodic[d])
        });
        let axis_cells = |d: usize| -> Vec<usize> {
            let n = self.n_cells[d];
            let mut cells = Vec::with_capacity(3);
            for delta in [-1isize, 0, 1] {
                let raw = home[d] as isize + delta;
                let c = if periodic[d] {
                    raw.rem_euclid(n as isize) as usize
                } else if raw < 0 || raw >= n as isize {
                    continue;
                } else {
                    raw as usize
                };
                if !cells.contains(&c) {
                    cells.push(c);
                }
            }
            cells
        };
        let (xs, ys, zs) = (axis_cells(0), axis_cells(1), axis_cells(2));
        for &cx in &xs {
            for &cy in &ys {
                for &cz in &zs {
                    let cell = (cx * self.n_cells[1] + cy) * self.n_cells[2] + cz;
                    let start = self.cell_start[cell];
                    for &idx in &self.sorted_indices[start..start + self.cell_count[cell]] {
                        f(idx);
                    }
                }
            }
        }
    }
}

/// Squared distance with minimum image on periodic axes.
fn distance_sq(a: &[f64; 3], b: &[f64; 3], box_length: [f64; 3], periodic: [bool; 3]) -> f64 {
    (0..3)
        .map(|d| {
            let mut dx = a[d] - b[d];
            if periodic[d] {
                dx -= box_length[d] * (dx / box_length[d]).round();
            }
            dx * dx
        })
        .sum()
}

/// Add the impurity potential to every orbital of `model`.
///
/// # Errors
///
/// Returns [`LsqtError::Model`] if the range or cutoff is not positive.
pub fn apply_charged_impurities(
    model: &mut Model,
    impurities: &Impurities,
    range: f64,
    cutoff: f64,
) -> Result<()> {
    if !(range > 0.0 && cutoff > 0.0) {
        return Err(LsqtError::Model(format!(
            "impurity range ({range}) and cutoff ({cutoff}) must be positive"
        )));
    }
    let cells = CellList::build(&impurities.positions, model.box_length, model.periodic, cutoff);
    let inv_two_xi_sq = 1.0 / (2.0 * range * range);
    let cutoff_sq = cutoff * cutoff;
    let (box_length, periodic) = (model.box_length, model.periodic);

    for (v, p) in model.lattice.potential.iter_mut().zip(&model.positions) {
        cells.for_each_candidate(p, |k| {
            let r_sq = distance_sq(p, &impurities.positions[k], box_length, periodic);
            if r_sq < cutoff_sq {
                *v += impurities.strengths[k] * (-r_sq * inv_two_xi_sq).exp();
            }
        });
    }
    tracing::debug!(count = impurities.strengths.len(), range, cutoff, "applied charged impurities");
    Ok(())
}

/// Draw impurities from `spec` and apply them.
///
/// # Errors
///
/// See [`apply_charged_impurities`].
pub fn add_random_impurities<R: Rng + ?Sized>(
    model: &mut Model,
    spec: &ChargedImpuritySpec,
    rng: &mut R,
) -> Result<()> {
    let impurities = Impurities::random(model, spec, rng);
    apply_charged_impurities(model, &impurities, spec.range, spec.cutoff())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::lattice::{build_lattice, LatticeShape, LatticeSpec};
    use crate::model::{Axis, LatticeDescriptor};
    use crate::tolerances::CELL_LIST_PARITY;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn lattice(periodic: bool) -> Model {
        let mut spec = LatticeSpec::open_chain(1, 1.0);
        spec.shape = LatticeShape::Cubic { nx: 9, ny: 8, nz: 7 };
        spec.periodic = [periodic; 3];
        build_lattice(&spec).expect("cubic")
    }

    fn brute_force(model: &Model, imp: &Impurities, range: f64, cutoff: f64) -> Vec<f64> {
        model
            .positions
            .iter()
            .map(|p| {
                imp.positions
                    .iter()
                    .zip(&imp.strengths)
                    .map(|(q, w)| {
                        let r_sq = distance_sq(p, q, model.box_length, model.periodic);
                        if r_sq < cutoff * cutoff {
                            w * (-r_sq / (2.0 * range * range)).exp()
                        } else {
                            0.0
                        }
                    })
                    .sum()
            })
            .collect()
    }

    #[test]
    fn cell_list_matches_brute_force() {
        for periodic in [false, true] {
            let mut model = lattice(periodic);
            let mut rng = ChaCha8Rng::seed_from_u64(11);
            let spec = ChargedImpuritySpec {
                count: 20,
                strength: 2.0,
                range: 0.8,
                cutoff: Some(2.5),
            };
            let imp = Impurities::random(&model, &spec, &mut rng);
            let expected = brute_force(&model, &imp, 0.8, 2.5);
            apply_charged_impurities(&mut model, &imp, 0.8, 2.5).expect("apply");
            for (got, want) in model.lattice.potential.iter().zip(&expected) {
                assert!(
                    (got - want).abs() < CELL_LIST_PARITY,
                    "periodic={periodic}: {got:.6} vs {want:.6}"
                );
            }
        }
    }

    #[test]
    fn cutoff_larger_than_box_still_visits_each_cell_once() {
        let mut model = lattice(true);
        let imp = Impurities {
            positions: vec![[0.0; 3]],
            strengths: vec![1.0],
        };
        apply_charged_impurities(&mut model, &imp, 1.0, 50.0).expect("apply");
        assert!((model.lattice.potential[0] - 1.0).abs() < 1e-15);
    }

    #[test]
    fn periodic_image_positions_bin_into_wrapped_cell() {
        // ring of 10 with site 5 stored one box length away, at x = 15
        let mut model = Model::from_parts(
            LatticeDescriptor::from_adjacency(&vec![Vec::new(); 10], vec![0.0; 10], false)
                .expect("bare sites"),
            (0..10)
                .map(|i| [if i == 5 { 15.0 } else { i as f64 }, 0.0, 0.0])
                .collect(),
            [10.0, 1.0, 1.0],
            [true, false, false],
            Axis::X,
            false,
            Some(1.0),
        )
        .expect("model");
        let imp = Impurities {
            positions: vec![[5.0, 0.0, 0.0], [-9.5, 0.0, 0.0]],
            strengths: vec![1.0, 0.5],
        };
        let expected = brute_force(&model, &imp, 1.0, 2.0);
        apply_charged_impurities(&mut model, &imp, 1.0, 2.0).expect("apply");
        assert!((model.lattice.potential[5] - 1.0).abs() < 1e-15);
        for (i, (got, want)) in model.lattice.potential.iter().zip(&expected).enumerate() {
            assert!((got - want).abs() < CELL_LIST_PARITY, "site {i}: {got} vs {want}");
        }
    }

    #[test]
    fn strengths_within_window() {
        let model = lattice(false);
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let spec = ChargedImpuritySpec {
            count: 100,
            strength: 3.0,
            range: 1.0,
            cutoff: None,
        };
        let imp = Impurities::random(&model, &spec, &mut rng);
        assert_eq!(imp.strengths.len(), 100);
        assert!(imp.strengths.iter().all(|w| w.abs() <= 1.5));
        assert!((spec.cutoff() - 10.0).abs() < 1e-15);
    }

    #[test]
    fn rejects_zero_range() {
        let mut model = lattice(false);
        let imp = Impurities {
            positions: vec![],
            strengths: vec![],
        };
        assert!(apply_charged_impurities(&mut model, &imp, 0.0, 1.0).is_err());
    }
}
