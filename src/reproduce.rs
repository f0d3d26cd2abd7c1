//! Fitness-proportional parent selection and crossover-based child construction, scoped to a
//! single species' membership.

use rand::{Rng, RngCore};

use crate::crossover::{crossover_connections, keyed_connections};
use crate::genome::Genome;
use crate::innovation::CrossoverConnectionInnovation;

/// Sample a member index from `members` with probability proportional to fitness. Fitnesses
/// are shifted so the least-fit member still contributes a nonzero share, since species
/// fitness isn't guaranteed to be positive.
pub fn select_parent(members: &[usize], fitness: impl Fn(usize) -> f64, rng: &mut impl RngCore) -> usize {
    debug_assert!(!members.is_empty());
    let min_fitness = members.iter().map(|&m| fitness(m)).fold(f64::INFINITY, f64::min);
    let shift = if min_fitness < 0.0 { -min_fitness } else { 0.0 };
    let weights: Vec<f64> = members.iter().map(|&m| fitness(m) + shift + 1e-9).collect();
    let total: f64 = weights.iter().sum();
    let mut roll = rng.random::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        roll -= w;
        if roll <= 0.0 {
            return members[i];
        }
    }
    *members.last().unwrap()
}

/// Build a child by cloning the fitter (or equally fit) parent's structure, then for every
/// connection shared by crossover key (endpoint node innovation ids, not position) with
/// `other`, overwriting its weight with `other`'s with 50% probability.
pub fn crossover_child(
    fitter: &Genome,
    other: &Genome,
    registry: &mut CrossoverConnectionInnovation,
    rng: &mut impl RngCore,
) -> Genome {
    let fitter_keyed = keyed_connections(fitter, registry);
    let other_keyed = keyed_connections(other, registry);

    let mut child = fitter.clone();
    child.connections = crossover_connections(&fitter_keyed, &other_keyed, rng);
    child.fitness = 0.0;
    child.species_id = fitter.species_id;
    child
}
