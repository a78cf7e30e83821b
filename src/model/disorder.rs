// SPDX-License-Identifier: AGPL-3.0-only

//! Anderson on-site disorder and vacancy removal.
//!
//! Both act on spatial sites: in a spinful model the two orbitals of a
//! site share one disorder draw and are removed together.

use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{LatticeDescriptor, Model};
use crate::error::{LsqtError, Result};

/// Disorder parameters as read from a run configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisorderSpec {
    /// Anderson width W: V_i += W (u − 1/2).
    #[serde(default)]
    pub anderson: f64,
    /// Number of spatial sites removed.
    #[serde(default)]
    pub vacancies: usize,
    #[serde(default)]
    pub charged_impurities: Option<super::charge::ChargedImpuritySpec>,
    /// Draw a new realization for every random vector.
    #[serde(default)]
    pub resample_per_vector: bool,
}

impl DisorderSpec {
    /// True when no disorder of any kind is requested.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.anderson == 0.0
            && self.vacancies == 0
            && self.charged_impurities.as_ref().map_or(true, |c| c.count == 0)
    }
}

/// Add uniform Anderson disorder V_i += W (u − 1/2), u ~ U[0, 1).
pub fn apply_anderson<R: Rng + ?Sized>(model: &mut Model, strength: f64, rng: &mut R) {
    if strength == 0.0 {
        return;
    }
    let per_site = model.orbitals_per_site();
    for site in model.lattice.potential.chunks_mut(per_site) {
        let shift = strength * (rng.gen::<f64>() - 0.5);
        for v in site {
            *v += shift;
        }
    }
}

/// Remove `count` distinct random spatial sites and renumber the rest.
///
/// # Errors
///
/// Returns [`LsqtError::Model`] if `count` would leave no sites.
pub fn remove_vacancies<R: Rng + ?Sized>(model: &mut Model, count: usize, rng: &mut R) -> Result<()> {
    if count == 0 {
        return Ok(());
    }
    let per_site = model.orbitals_per_site();
    let n_sites = model.number_of_atoms() / per_site;
    if count >= n_sites {
        return Err(LsqtError::Model(format!(
            "cannot remove {count} vacancies from {n_sites} sites"
        )));
    }
    let mut removed = vec![false; model.number_of_atoms()];
    for site in sample(rng, n_sites, count) {
        for orb in 0..per_site {
            removed[site * per_site + orb] = true;
        }
    }
    let (lattice, kept) = remove_orbitals(&model.lattice, &removed)?;
    let positions = kept.iter().map(|&i| model.positions[i]).collect();
    model.replace_lattice(lattice, positions);
    tracing::debug!(count, remaining = model.number_of_atoms(), "removed vacancies");
    Ok(())
}

/// Drop flagged orbitals and every bond touching them.
///
/// Returns the renumbered lattice and the old index of each kept orbital.
///
/// # Errors
///
/// Propagates [`LatticeDescriptor::from_adjacency`] failures.
pub fn remove_orbitals(
    lattice: &LatticeDescriptor,
    removed: &[bool],
) -> Result<(LatticeDescriptor, Vec<usize>)> {
    let mut new_index = vec![usize::MAX; lattice.number_of_atoms];
    let mut kept = Vec::new();
    for (i, &gone) in removed.iter().enumerate() {
        if !gone {
            new_index[i] = kept.len();
            kept.push(i);
        }
    }
    let adjacency = lattice.to_adjacency();
    let new_adjacency: Vec<_> = kept
        .iter()
        .map(|&i| {
            adjacency[i]
                .iter()
                .filter(|b| !removed[b.target])
                .map(|b| super::Bond {
                    target: new_index[b.target],
                    ..*b
                })
                .collect()
        })
        .collect();
    let potential = kept.iter().map(|&i| lattice.potential[i]).collect();
    let descriptor =
        LatticeDescriptor::from_adjacency(&new_adjacency, potential, lattice.xx.is_some())?;
    Ok((descriptor, kept))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::model::lattice::{build_lattice, LatticeShape, LatticeSpec};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn square(n: usize, spinful: bool) -> Model {
        let mut spec = LatticeSpec::open_chain(1, 1.0);
        spec.shape = LatticeShape::Square { nx: n, ny: n };
        spec.periodic = [true; 3];
        spec.spinful = spinful;
        build_lattice(&spec).expect("square")
    }

    #[test]
    fn anderson_stays_in_window() {
        let mut model = square(8, false);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        apply_anderson(&mut model, 2.0, &mut rng);
        assert!(model.lattice.potential.iter().all(|v| v.abs() <= 1.0));
        let mean: f64 = model.lattice.potential.iter().sum::<f64>() / 64.0;
        assert!(mean.abs() < 0.3, "mean {mean:.4}");
    }

    #[test]
    fn anderson_shares_draw_between_spins() {
        let mut model = square(4, true);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        apply_anderson(&mut model, 1.0, &mut rng);
        for pair in model.lattice.potential.chunks(2) {
            assert!((pair[0] - pair[1]).abs() < 1e-15);
        }
    }

    #[test]
    fn vacancies_shrink_and_stay_consistent() {
        let mut model = square(6, false);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        remove_vacancies(&mut model, 5, &mut rng).expect("remove");
        assert_eq!(model.number_of_atoms(), 31);
        assert_eq!(model.positions.len(), 31);
        model.lattice.validate().expect("consistent");
        let adj = model.lattice.to_adjacency();
        for (i, bonds) in adj.iter().enumerate() {
            for b in bonds {
                assert!(adj[b.target].iter().any(|r| r.target == i), "dangling bond {i}");
            }
        }
    }

    #[test]
    fn spinful_vacancy_removes_both_orbitals() {
        let mut model = square(4, true);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        remove_vacancies(&mut model, 3, &mut rng).expect("remove");
        assert_eq!(model.number_of_atoms(), 2 * 13);
        for pair in model.positions.chunks(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }

    #[test]
    fn too_many_vacancies_is_an_error() {
        let mut model = square(2, false);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        assert!(remove_vacancies(&mut model, 4, &mut rng).is_err());
    }

    #[test]
    fn clean_spec_detection() {
        assert!(DisorderSpec::default().is_clean());
        let spec = DisorderSpec {
            anderson: 1.0,
            ..DisorderSpec::default()
        };
        assert!(!spec.is_clean());
    }
}
