//! Compatibility distance and gene alignment between two genomes' connection lists.
//!
//! Both operations walk slices in lockstep, the same two-pointer merge used throughout this
//! module, ordered by a *crossover key* rather than a connection's own `innov_id`. A
//! connection's `innov_id` is assigned from its endpoints' positions within one genome
//! ([`crate::innovation::ConnectionInnovation`]), so two genomes whose hidden nodes ended up at
//! different positions under different mutation histories can carry the same logical edge under
//! different ids. The crossover key comes from [`crate::innovation::CrossoverConnectionInnovation`]
//! instead, keyed by the endpoints' own (position-independent) node innovation ids, so homologous
//! genes still line up.

use std::cmp::Ordering;

use rand::{Rng, RngCore};

use crate::genome::{Connection, Genome};
use crate::innovation::CrossoverConnectionInnovation;

/// A connection tagged with its crossover-alignment key.
type KeyedConnection = (u32, Connection);

/// Pair every connection in `genome` (enabled or not) with its crossover key, sorted by that
/// key. Disabled connections are kept — reproduction clones a parent's full structure, only
/// [`delta`] restricts itself to the enabled subset.
pub fn keyed_connections(genome: &Genome, registry: &mut CrossoverConnectionInnovation) -> Vec<KeyedConnection> {
    let mut keyed: Vec<KeyedConnection> = genome
        .connections
        .iter()
        .map(|c| {
            let in_innov = genome.nodes[c.in_node as usize].innov_id;
            let out_innov = genome.nodes[c.out_node as usize].innov_id;
            let key = registry.get_or_assign(in_innov, out_innov, c.in_node_recu);
            (key, c.clone())
        })
        .collect();
    keyed.sort_by_key(|(key, _)| *key);
    keyed
}

/// `(disjoint, excess)` counts between two key-sorted connection slices. Disjoint genes fall
/// within the other side's key range but are absent from it; excess genes fall beyond the
/// other side's maximum key.
fn disjoint_excess_count(l: &[KeyedConnection], r: &[KeyedConnection]) -> (f64, f64) {
    let mut l_iter = l.iter();
    let mut r_iter = r.iter();

    let mut l_conn = match l_iter.next() {
        Some(c) => c,
        None => return (0., r_iter.count() as f64),
    };
    let mut r_conn = match r_iter.next() {
        Some(c) => c,
        None => return (0., l_iter.count() as f64 + 1.),
    };

    let mut disjoint = 0.;
    let excess_passed = loop {
        match l_conn.0.cmp(&r_conn.0) {
            Ordering::Equal => {
                l_conn = match l_iter.next() {
                    Some(c) => c,
                    None => break 0.,
                };
                r_conn = match r_iter.next() {
                    Some(c) => c,
                    None => break 1.,
                };
            }
            Ordering::Greater => {
                disjoint += 1.;
                r_conn = match r_iter.next() {
                    Some(c) => c,
                    None => break 1.,
                };
            }
            Ordering::Less => {
                disjoint += 1.;
                l_conn = match l_iter.next() {
                    Some(c) => c,
                    None => break 1.,
                };
            }
        }
    };

    (disjoint, l_iter.count() as f64 + r_iter.count() as f64 + excess_passed)
}

/// Mean absolute weight difference over keys common to both slices. `None` if they share no
/// genes at all.
fn mean_weight_diff(l: &[KeyedConnection], r: &[KeyedConnection]) -> Option<f64> {
    let mut diff = 0.;
    let mut count = 0.;
    let mut l_iter = l.iter();
    let mut r_iter = r.iter();

    let mut l_conn = l_iter.next()?;
    let mut r_conn = r_iter.next()?;

    loop {
        match l_conn.0.cmp(&r_conn.0) {
            Ordering::Equal => {
                diff += (l_conn.1.weight - r_conn.1.weight).abs() as f64;
                count += 1.;
                l_conn = match l_iter.next() {
                    Some(c) => c,
                    None => break,
                };
                r_conn = match r_iter.next() {
                    Some(c) => c,
                    None => break,
                };
            }
            Ordering::Greater => {
                r_conn = match r_iter.next() {
                    Some(c) => c,
                    None => break,
                };
            }
            Ordering::Less => {
                l_conn = match l_iter.next() {
                    Some(c) => c,
                    None => break,
                };
            }
        }
    }

    if count == 0. {
        None
    } else {
        Some(diff / count)
    }
}

/// Compatibility distance between two genomes, restricted to enabled connections and aligned
/// by crossover key (see module docs). `l` and `r` must already be [`keyed_connections`] output,
/// sorted by key; disabled entries are dropped here before comparing.
pub fn delta(l: &[KeyedConnection], r: &[KeyedConnection], a: f64, b: f64, c: f64) -> f64 {
    let l: Vec<KeyedConnection> = l.iter().filter(|(_, c)| c.enabled).cloned().collect();
    let r: Vec<KeyedConnection> = r.iter().filter(|(_, c)| c.enabled).cloned().collect();

    let longest = l.len().max(r.len()) as f64;
    if longest == 0. {
        return 0.;
    }

    match mean_weight_diff(&l, &r) {
        None => f64::INFINITY,
        Some(w) => {
            let (disjoint, excess) = disjoint_excess_count(&l, &r);
            a * excess / longest + b * disjoint / longest + c * w
        }
    }
}

/// Merge two parents' connection lists for a child, where `l` is the fitter (or equally fit)
/// parent, both [`keyed_connections`] output sorted by key. Matching genes are kept from `l`
/// with a 50% chance of taking `r`'s weight instead; genes unique to `l` are kept as-is; genes
/// unique to `r` are dropped, since the child inherits the fitter parent's structure.
pub fn crossover_connections(l: &[KeyedConnection], r: &[KeyedConnection], rng: &mut impl RngCore) -> Vec<Connection> {
    let mut r_idx = 0;
    let mut child = Vec::with_capacity(l.len());
    for (l_key, l_conn) in l {
        while r.get(r_idx).is_some_and(|(r_key, _)| r_key < l_key) {
            r_idx += 1;
        }
        let mut gene = l_conn.clone();
        if let Some((_, r_conn)) = r.get(r_idx).filter(|(r_key, _)| r_key == l_key) {
            if rng.random_bool(0.5) {
                gene.weight = r_conn.weight;
            }
        }
        child.push(gene);
    }
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::steep_sigmoid;
    use crate::config::GenomeConfig;
    use crate::genome::Node;
    use crate::innovation::{ConnectionInnovation, NodeInnovation};
    use crate::random::seeded_rng;
    use crate::types::Value;

    fn keyed(key: u32, weight: f32) -> KeyedConnection {
        (key, Connection::new(key, 0, 1, 0, weight))
    }

    #[test]
    fn identical_genomes_have_zero_distance() {
        let l = vec![keyed(0, 1.0), keyed(1, 2.0)];
        let r = l.clone();
        assert_eq!(delta(&l, &r, 1.0, 1.0, 0.4), 0.0);
    }

    #[test]
    fn disjoint_and_excess_increase_distance() {
        let l = vec![keyed(0, 1.0), keyed(1, 1.0)];
        let r = vec![keyed(0, 1.0), keyed(2, 1.0), keyed(3, 1.0)];
        let d = delta(&l, &r, 1.0, 1.0, 0.4);
        assert!(d > 0.0);
    }

    #[test]
    fn no_shared_genes_is_infinite_distance() {
        let l = vec![keyed(0, 1.0)];
        let r = vec![keyed(1, 1.0)];
        assert_eq!(delta(&l, &r, 1.0, 1.0, 0.4), f64::INFINITY);
    }

    #[test]
    fn empty_genomes_are_identical() {
        let l: Vec<KeyedConnection> = vec![];
        let r: Vec<KeyedConnection> = vec![];
        assert_eq!(delta(&l, &r, 1.0, 1.0, 0.4), 0.0);
    }

    #[test]
    fn crossover_keeps_fitter_parents_structure() {
        let l = vec![keyed(0, 1.0), keyed(1, 2.0), keyed(2, 3.0)];
        let r = vec![keyed(0, 10.0), keyed(1, 20.0)];
        let mut rng = seeded_rng(7);
        let child = crossover_connections(&l, &r, &mut rng);
        assert_eq!(child.len(), 3);
        assert_eq!(child[2].innov_id, 2);
    }

    #[test]
    fn crossover_carries_disabled_genes_forward() {
        let mut disabled = keyed(0, 1.0);
        disabled.1.enabled = false;
        let l = vec![disabled, keyed(1, 2.0)];
        let r = vec![keyed(1, 20.0)];
        let mut rng = seeded_rng(3);
        let child = crossover_connections(&l, &r, &mut rng);
        assert_eq!(child.len(), 2);
        assert!(!child[0].enabled);
    }

    fn base_genome() -> Genome {
        let cfg = GenomeConfig { n_conn_init: 0, ..GenomeConfig::default() };
        let mut conn_innov = ConnectionInnovation::default();
        let mut node_innov = NodeInnovation::default();
        let mut rng = seeded_rng(9);
        Genome::new(
            &[1],
            &[1],
            &[1],
            &[],
            &[Value::F32(1.0)],
            vec![Value::F32(0.0)],
            vec![vec![vec![steep_sigmoid()]]],
            0,
            &cfg,
            &mut conn_innov,
            &mut node_innov,
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn keyed_connections_align_by_node_innovation_not_position() {
        let base = base_genome();

        // genome_a's hidden node (node innovation id 10) sits at position 3.
        let mut genome_a = base.clone();
        genome_a.nodes.push(Node::identity(3, 10, 1, 0, Value::F32(0.0)));
        genome_a.connections = vec![Connection::new(100, 0, 3, 0, 1.0), Connection::new(101, 3, 2, 0, 1.0)];

        // genome_b grew a different (now-irrelevant) hidden node first, so the node carrying
        // the same innovation id (10) ended up at position 4 instead — a different mutation
        // history producing the same logical structure.
        let mut genome_b = base.clone();
        genome_b.nodes.push(Node::identity(3, 77, 1, 0, Value::F32(0.0)));
        genome_b.nodes.push(Node::identity(4, 10, 1, 0, Value::F32(0.0)));
        genome_b.connections = vec![Connection::new(200, 0, 4, 0, 2.0), Connection::new(201, 4, 2, 0, 2.0)];

        let mut registry = CrossoverConnectionInnovation::default();
        let keyed_a = keyed_connections(&genome_a, &mut registry);
        let keyed_b = keyed_connections(&genome_b, &mut registry);

        let keys_a: Vec<u32> = keyed_a.iter().map(|(k, _)| *k).collect();
        let keys_b: Vec<u32> = keyed_b.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys_a, keys_b);
    }
}
