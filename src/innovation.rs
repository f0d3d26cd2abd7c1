//! Innovation-number bookkeeping.
//!
//! Structural mutations (new connections, new nodes) are tagged with a monotonically
//! increasing innovation id the first time a given structural signature is seen, and reuse
//! that same id every later time the same signature recurs — in the same generation or
//! across genomes — so that homologous genes can be aligned during crossover and
//! compatibility-distance computation.
//!
//! The source keeps this as three lazily-growing nested vectors; a genome's node/connection
//! ids are small dense integers there. Here the same lazy "first time wins" assignment is
//! expressed over [`FxHashMap`], which needs no upfront sizing and reads the same either way.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Assigns connection innovation ids keyed by the endpoints' positions within a single genome
/// (`(in_node_id, out_node_id, in_node_recu)`). Used while constructing and mutating a genome.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionInnovation {
    seen: FxHashMap<(u32, u32, u32), u32>,
    head: u32,
}

impl ConnectionInnovation {
    pub fn new(head: u32) -> Self {
        Self {
            seen: FxHashMap::default(),
            head,
        }
    }

    pub fn head(&self) -> u32 {
        self.head
    }

    pub fn get_or_assign(&mut self, in_node_id: u32, out_node_id: u32, in_node_recu: u32) -> u32 {
        *self
            .seen
            .entry((in_node_id, out_node_id, in_node_recu))
            .or_insert_with(|| {
                let id = self.head;
                self.head += 1;
                id
            })
    }
}

/// Assigns connection innovation ids keyed by the endpoints' own innovation ids rather than
/// their positional ids, so two genomes that diverged structurally can still recognize the
/// same edge for crossover alignment (`(in_node_innov, out_node_innov, in_node_recu)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossoverConnectionInnovation {
    seen: FxHashMap<(u32, u32, u32), u32>,
    head: u32,
}

impl CrossoverConnectionInnovation {
    pub fn new(head: u32) -> Self {
        Self {
            seen: FxHashMap::default(),
            head,
        }
    }

    pub fn head(&self) -> u32 {
        self.head
    }

    pub fn get_or_assign(&mut self, in_node_innov: u32, out_node_innov: u32, in_node_recu: u32) -> u32 {
        *self
            .seen
            .entry((in_node_innov, out_node_innov, in_node_recu))
            .or_insert_with(|| {
                let id = self.head;
                self.head += 1;
                id
            })
    }
}

/// Assigns node innovation ids keyed by `(t_in, t_out, activation_fn_index, repetition)`,
/// where `repetition` disambiguates the Nth time this exact (type, activation) combination is
/// introduced, since distinct hidden nodes can otherwise share every other coordinate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeInnovation {
    seen: FxHashMap<(usize, usize, usize, u32), u32>,
    reps: FxHashMap<(usize, usize, usize), u32>,
    head: u32,
}

impl NodeInnovation {
    pub fn new(head: u32) -> Self {
        Self {
            seen: FxHashMap::default(),
            reps: FxHashMap::default(),
            head,
        }
    }

    pub fn head(&self) -> u32 {
        self.head
    }

    pub fn get_or_assign(
        &mut self,
        t_in: usize,
        t_out: usize,
        activation_fn: usize,
        repetition: u32,
    ) -> u32 {
        *self
            .seen
            .entry((t_in, t_out, activation_fn, repetition))
            .or_insert_with(|| {
                let id = self.head;
                self.head += 1;
                id
            })
    }

    /// Assign a fresh node id for the next occurrence of `(t_in, t_out, activation_fn)`, one
    /// past whatever repetition was last handed out for that signature.
    pub fn next(&mut self, t_in: usize, t_out: usize, activation_fn: usize) -> u32 {
        let rep = self.reps.entry((t_in, t_out, activation_fn)).or_insert(0);
        let repetition = *rep;
        *rep += 1;
        self.get_or_assign(t_in, t_out, activation_fn, repetition)
    }
}

/// The full set of innovation tables a population carries: one for local (positional)
/// connection endpoints, one for crossover (innovation-id) connection endpoints, and one for
/// nodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InnovationRegistry {
    pub connections: ConnectionInnovation,
    pub crossover_connections: CrossoverConnectionInnovation,
    pub nodes: NodeInnovation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_signature_reuses_id() {
        let mut reg = ConnectionInnovation::default();
        let a = reg.get_or_assign(0, 1, 0);
        let b = reg.get_or_assign(0, 1, 0);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_signatures_get_distinct_ids() {
        let mut reg = ConnectionInnovation::default();
        let a = reg.get_or_assign(0, 1, 0);
        let b = reg.get_or_assign(0, 2, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn node_innovation_disambiguates_by_repetition() {
        let mut reg = NodeInnovation::default();
        let a = reg.get_or_assign(0, 0, 0, 0);
        let b = reg.get_or_assign(0, 0, 0, 1);
        assert_ne!(a, b);
        assert_eq!(reg.get_or_assign(0, 0, 0, 0), a);
    }

    #[test]
    fn head_starts_from_supplied_value() {
        let mut reg = ConnectionInnovation::new(42);
        assert_eq!(reg.get_or_assign(0, 0, 0), 42);
        assert_eq!(reg.head(), 43);
    }

    #[test]
    fn fresh_registry_assigns_in_first_sighting_order() {
        let mut reg = ConnectionInnovation::default();
        assert_eq!(reg.get_or_assign(0, 3, 0), 0);
        assert_eq!(reg.get_or_assign(0, 3, 0), 0);
        assert_eq!(reg.get_or_assign(1, 3, 0), 1);
    }
}
