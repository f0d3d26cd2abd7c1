//! A genome: a heterogeneous, recurrent, typed computation graph that mutates structurally
//! and by weight, and is evaluated layer by layer.
//!
//! Node ids are stable positions within [`Genome::nodes`]; the fixed prefix
//! `[0, n_bias) ∪ [n_bias, n_bias+n_input) ∪ [n_bias+n_input, n_bias+n_input+n_output)` carries
//! the bias, input, and output roles respectively, with everything after that hidden.

pub mod connection;
pub mod node;

pub use connection::Connection;
pub use node::{Node, UNASSIGNED_LAYER};

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::activation::{ActivationFn, Builtin};
use crate::buffer::CircularBuffer;
use crate::config::GenomeConfig;
use crate::error::{ConfigError, SerializationError};
use crate::innovation::{ConnectionInnovation, NodeInnovation};
use crate::random::{roll, uniform_signed};
use crate::types::Value;

/// `activation_fns[t_in][t_out]` lists the activation functions a hidden or transtype node of
/// that (input type, output type) pair may be constructed with.
pub type ActivationTable = Vec<Vec<Vec<Builtin>>>;

#[derive(Debug)]
enum ConnectionCheck {
    Invalid,
    Valid,
    Reactivate(usize),
}

/// A node's position for a layout renderer: which layer it sits in, and its rank among the
/// other nodes sharing that layer (insertion order, not meaningful beyond distinguishing them).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePosition {
    pub layer: i32,
    pub rank: u32,
}

/// Styling hints for a single edge: whether to draw it at all, whether to mark it recurrent,
/// and an alpha proportional to its weight relative to the genome's largest-magnitude weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHint {
    pub in_node: u32,
    pub out_node: u32,
    pub enabled: bool,
    pub recurrent: bool,
    pub alpha: f32,
}

/// Everything an external renderer needs to draw one genome, extracted without performing any
/// drawing here.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutHints {
    pub node_positions: Vec<NodePosition>,
    pub edge_hints: Vec<EdgeHint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    pub n_bias: u32,
    pub n_input: u32,
    pub n_output: u32,
    pub weight_extremum_init: f32,
    pub n_types: usize,
    #[serde(skip)]
    pub activation_fns: ActivationTable,
    #[serde(skip)]
    pub reset_values: Vec<Value>,
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    #[serde(skip)]
    pub prev_outputs: CircularBuffer<Vec<Value>>,
    pub rec_max: u32,
    pub fitness: f64,
    pub species_id: Option<u32>,
}

impl Genome {
    /// Build a fresh genome from per-type node schemas, allocating nodes bias -> input ->
    /// output -> hidden, then wiring `cfg.n_conn_init` random initial connections.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bias_sch: &[usize],
        inputs_sch: &[usize],
        outputs_sch: &[usize],
        hiddens_sch_init: &[Vec<usize>],
        bias_init: &[Value],
        reset_values: Vec<Value>,
        activation_fns: ActivationTable,
        rec_max: u32,
        cfg: &GenomeConfig,
        conn_innov: &mut ConnectionInnovation,
        node_innov: &mut NodeInnovation,
        rng: &mut impl RngCore,
    ) -> Result<Self, ConfigError> {
        let n_types = activation_fns.len();
        if n_types == 0 {
            return Err(ConfigError::EmptySchema { n_types: 0 });
        }
        for &t in bias_sch.iter().chain(inputs_sch).chain(outputs_sch) {
            if t >= n_types {
                return Err(ConfigError::TypeIndexOutOfRange { index: t, n_types });
            }
        }

        let mut nodes = Vec::new();

        let mut n_bias = 0u32;
        for (t, &count) in bias_sch.iter().enumerate() {
            for _ in 0..count {
                let id = nodes.len() as u32;
                let mut node = Node::identity(id, id, 0, t, bias_init[t]);
                node.load_input(bias_init[t]);
                node.process();
                nodes.push(node);
                n_bias += 1;
            }
        }

        let mut n_input = 0u32;
        for (t, &count) in inputs_sch.iter().enumerate() {
            for _ in 0..count {
                let id = nodes.len() as u32;
                nodes.push(Node::identity(id, id, 0, t, reset_values[t]));
                n_input += 1;
            }
        }

        let output_layer = if hiddens_sch_init.is_empty() { 1 } else { 2 };
        let mut n_output = 0u32;
        for (t, &count) in outputs_sch.iter().enumerate() {
            for _ in 0..count {
                let id = nodes.len() as u32;
                nodes.push(Node::identity(id, id, output_layer, t, reset_values[t]));
                n_output += 1;
            }
        }

        for (t_in, row) in hiddens_sch_init.iter().enumerate() {
            if t_in >= n_types {
                return Err(ConfigError::TypeIndexOutOfRange { index: t_in, n_types });
            }
            for (t_out, &count) in row.iter().enumerate() {
                if t_out >= n_types {
                    return Err(ConfigError::TypeIndexOutOfRange { index: t_out, n_types });
                }
                if count > 0 && activation_fns[t_in][t_out].is_empty() {
                    return Err(ConfigError::EmptyActivationTable { t_in, t_out });
                }
                for _ in 0..count {
                    let id = nodes.len() as u32;
                    let idx = rng.random_range(0..activation_fns[t_in][t_out].len());
                    let act = activation_fns[t_in][t_out][idx];
                    let innov_id = node_innov.next(t_in, t_out, idx);
                    nodes.push(Node::new(id, innov_id, 1, t_in, t_out, act, reset_values[t_in]));
                }
            }
        }

        let mut genome = Genome {
            n_bias,
            n_input,
            n_output,
            weight_extremum_init: cfg.weight_extremum_init,
            n_types,
            activation_fns,
            reset_values,
            nodes,
            connections: Vec::new(),
            prev_outputs: CircularBuffer::new(rec_max as usize),
            rec_max,
            fitness: 0.0,
            species_id: None,
        };

        // Bounded by attempts rather than successes: a schema with few legal (in, out, recu)
        // signatures (e.g. a handful of nodes) can exhaust them well short of `n_conn_init`, and
        // without a cap the search below would spin forever re-drawing already-enabled edges.
        let max_attempts = cfg.n_conn_init.max(1) * cfg.max_iterations_find_connection_thresh.max(1);
        let mut i_conn = 0u32;
        let mut attempt = 0u32;
        while i_conn < cfg.n_conn_init && attempt < max_attempts {
            attempt += 1;
            let n = genome.nodes.len() as u32;
            let in_node = rng.random_range(0..n);
            let out_node = rng.random_range(0..n);
            let mut in_node_recu = 0;
            if cfg.max_recu_init > 0 && roll(rng, cfg.prob_recu_init as f64) {
                in_node_recu = rng.random_range(1..=cfg.max_recu_init);
            }
            if let ConnectionCheck::Valid = genome.check_connection_validity(in_node, out_node, in_node_recu) {
                let innov_id = conn_innov.get_or_assign(in_node, out_node, in_node_recu);
                let weight = uniform_signed(rng, genome.weight_extremum_init);
                genome
                    .connections
                    .push(Connection::new(innov_id, in_node, out_node, in_node_recu, weight));

                if in_node_recu == 0
                    && genome.nodes[out_node as usize].layer == genome.nodes[in_node as usize].layer
                {
                    genome.nodes[out_node as usize].layer = genome.nodes[in_node as usize].layer + 1;
                    genome.update_layers(out_node as usize);
                }
                i_conn += 1;
            }
        }

        Ok(genome)
    }

    pub fn io_range_bias(&self) -> std::ops::Range<u32> {
        0..self.n_bias
    }

    pub fn io_range_input(&self) -> std::ops::Range<u32> {
        self.n_bias..(self.n_bias + self.n_input)
    }

    pub fn io_range_output(&self) -> std::ops::Range<u32> {
        (self.n_bias + self.n_input)..(self.n_bias + self.n_input + self.n_output)
    }

    pub fn load_inputs(&mut self, inputs: &[Value]) {
        for (i, &v) in inputs.iter().enumerate() {
            self.load_input(v, i);
        }
    }

    pub fn load_input(&mut self, input: Value, input_id: usize) {
        self.nodes[input_id + self.n_bias as usize].load_input(input);
    }

    /// Evaluate the network layer by layer, from inputs through to outputs, resolving
    /// recurrent edges against the previous step's snapshot.
    pub fn run_network(&mut self) {
        let io_end = (self.n_bias + self.n_input) as usize;
        for node in self.nodes[io_end..].iter_mut() {
            node.reset();
        }
        for node in self.nodes[..io_end].iter_mut() {
            node.process();
        }

        let last_layer = self.nodes[io_end].layer;
        for ilayer in 1..=last_layer {
            let contributions: Vec<(usize, Value, f32)> = self
                .connections
                .iter()
                .filter(|c| c.enabled && self.nodes[c.out_node as usize].layer == ilayer)
                .filter_map(|c| {
                    if c.in_node_recu == 0 {
                        Some((c.out_node as usize, self.nodes[c.in_node as usize].output(), c.weight))
                    } else {
                        self.prev_outputs
                            .get((c.in_node_recu - 1) as usize)
                            .map(|hist| (c.out_node as usize, hist[c.in_node as usize], c.weight))
                    }
                })
                .collect();

            for (idx, value, weight) in contributions {
                self.nodes[idx].add_to_input(value, weight as f64);
            }
            for node in self.nodes.iter_mut() {
                if node.layer == ilayer {
                    node.process();
                }
            }
        }

        let snapshot = self.nodes.iter().map(Node::output).collect();
        self.prev_outputs.insert(snapshot);
    }

    pub fn outputs(&self) -> Vec<Value> {
        self.io_range_output().map(|i| self.nodes[i as usize].output()).collect()
    }

    pub fn output(&self, output_id: usize) -> Value {
        self.nodes[self.n_bias as usize + self.n_input as usize + output_id].output()
    }

    /// Roll each structural/weight mutation independently, in the order weights, add-node,
    /// add-transtype, add-connection. Activation parameters ride the weight-mutation roll,
    /// since both tune existing structure rather than changing it.
    pub fn mutate(
        &mut self,
        cfg: &GenomeConfig,
        conn_innov: &mut ConnectionInnovation,
        node_innov: &mut NodeInnovation,
        rng: &mut impl RngCore,
    ) {
        if roll(rng, cfg.mutate_weight_thresh as f64) {
            self.mutate_weights(cfg, rng);
            self.mutate_activations(rng);
        }
        if roll(rng, cfg.add_node_thresh as f64) {
            self.add_node(cfg, conn_innov, node_innov, rng);
        }
        if roll(rng, cfg.add_transtype_thresh as f64) {
            self.add_transtype(cfg, conn_innov, node_innov, rng);
        }
        if roll(rng, cfg.add_connection_thresh as f64) {
            self.add_connection(cfg, conn_innov, rng);
        }
    }

    /// Perturb every node's activation parameters under fitness pressure. Built-in parameter-
    /// less shapes (`Identity`, `Relu`) no-op here, same as a bias/input/output node would.
    fn mutate_activations(&mut self, rng: &mut impl RngCore) {
        let fitness = self.fitness;
        for node in &mut self.nodes {
            node.activation.mutate(fitness, rng);
        }
    }

    fn check_connection_validity(&self, in_node: u32, out_node: u32, in_node_recu: u32) -> ConnectionCheck {
        if self.nodes[in_node as usize].t_out != self.nodes[out_node as usize].t_in {
            return ConnectionCheck::Invalid;
        }
        if out_node < self.n_bias + self.n_input {
            return ConnectionCheck::Invalid;
        }

        let mut disabled_idx = None;
        for (i, c) in self.connections.iter().enumerate() {
            if c.in_node == in_node && c.out_node == out_node && c.in_node_recu == in_node_recu {
                if c.enabled {
                    return ConnectionCheck::Invalid;
                }
                disabled_idx = Some(i);
            }
        }

        if in_node_recu > 0 {
            return match disabled_idx {
                Some(i) => ConnectionCheck::Reactivate(i),
                None => ConnectionCheck::Valid,
            };
        }

        if in_node >= self.n_bias + self.n_input && in_node < self.n_bias + self.n_input + self.n_output {
            return ConnectionCheck::Invalid;
        }
        if self.check_connection_circle(in_node, out_node) {
            return ConnectionCheck::Invalid;
        }

        match disabled_idx {
            Some(i) => ConnectionCheck::Reactivate(i),
            None => ConnectionCheck::Valid,
        }
    }

    fn check_connection_circle(&self, in_node: u32, out_node: u32) -> bool {
        if in_node == out_node {
            return true;
        }
        self.connections
            .iter()
            .filter(|c| c.enabled && c.in_node == out_node && c.in_node_recu == 0)
            .any(|c| self.check_connection_circle(in_node, c.out_node))
    }

    fn mutate_weights(&mut self, cfg: &GenomeConfig, rng: &mut impl RngCore) {
        let extremum = self.weight_extremum_init;
        for c in &mut self.connections {
            if roll(rng, cfg.mutate_weight_full_change_thresh as f64) {
                c.weight = uniform_signed(rng, extremum);
            } else {
                c.weight *= uniform_signed(rng, cfg.mutate_weight_factor);
            }
        }
    }

    /// Randomly sample a valid `(in, out, recu)` triple, retrying up to the configured cap;
    /// either reactivates a disabled twin or creates a new edge. Returns `false` if no valid
    /// triple turned up in time, leaving the genome unchanged.
    fn add_connection(&mut self, cfg: &GenomeConfig, conn_innov: &mut ConnectionInnovation, rng: &mut impl RngCore) -> bool {
        let n = self.nodes.len() as u32;
        let mut iteration = 0u32;
        let mut in_node = 0;
        let mut out_node = 0;
        let mut in_node_recu = 0;
        let mut check = ConnectionCheck::Invalid;
        while iteration < cfg.max_iterations_find_connection_thresh && matches!(check, ConnectionCheck::Invalid) {
            in_node = rng.random_range(0..n);
            out_node = rng.random_range(0..n);
            in_node_recu = rng.random_range(0..=self.rec_max);
            check = self.check_connection_validity(in_node, out_node, in_node_recu);
            iteration += 1;
        }

        if matches!(check, ConnectionCheck::Invalid) {
            return false;
        }

        match check {
            ConnectionCheck::Reactivate(idx) => {
                if roll(rng, cfg.reactivate_connection_thresh as f64) {
                    self.connections[idx].enabled = true;
                }
                true
            }
            ConnectionCheck::Valid => {
                let innov_id = conn_innov.get_or_assign(in_node, out_node, in_node_recu);
                let weight = uniform_signed(rng, self.weight_extremum_init);
                self.connections
                    .push(Connection::new(innov_id, in_node, out_node, in_node_recu, weight));
                true
            }
            ConnectionCheck::Invalid => false,
        }
    }

    /// Split a randomly chosen enabled connection with a fresh node, preserving the split
    /// edge's weight and recurrency on the upstream half.
    fn add_node(
        &mut self,
        cfg: &GenomeConfig,
        conn_innov: &mut ConnectionInnovation,
        node_innov: &mut NodeInnovation,
        rng: &mut impl RngCore,
    ) -> bool {
        if self.connections.is_empty() {
            return false;
        }
        let mut i_conn = rng.random_range(0..self.connections.len());
        let mut iteration = 0u32;
        while iteration < cfg.max_iterations_find_node_thresh && !self.connections[i_conn].enabled {
            i_conn = rng.random_range(0..self.connections.len());
            iteration += 1;
        }
        if iteration >= cfg.max_iterations_find_node_thresh {
            return false;
        }

        self.connections[i_conn].enabled = false;
        let (in_node, out_node, in_node_recu, weight) = {
            let c = &self.connections[i_conn];
            (c.in_node, c.out_node, c.in_node_recu, c.weight)
        };

        let t_in = self.nodes[in_node as usize].t_out;
        let t_out = self.nodes[out_node as usize].t_in;
        let new_node_id = self.nodes.len() as u32;
        let idx = rng.random_range(0..self.activation_fns[t_in][t_out].len());
        let act = self.activation_fns[t_in][t_out][idx];
        let innov_id = node_innov.next(t_in, t_out, idx);
        self.nodes
            .push(Node::new(new_node_id, innov_id, UNASSIGNED_LAYER, t_in, t_out, act, self.reset_values[t_in]));

        let innov1 = conn_innov.get_or_assign(in_node, new_node_id, in_node_recu);
        self.connections
            .push(Connection::new(innov1, in_node, new_node_id, in_node_recu, weight));

        let weight2 = uniform_signed(rng, self.weight_extremum_init);
        let innov2 = conn_innov.get_or_assign(new_node_id, out_node, 0);
        self.connections
            .push(Connection::new(innov2, new_node_id, out_node, 0, weight2));

        if in_node_recu > 0 {
            if self.nodes[out_node as usize].layer == 1 {
                self.nodes[new_node_id as usize].layer = 1;
                self.nodes[out_node as usize].layer = 2;
                self.update_layers(out_node as usize);
            } else {
                self.nodes[new_node_id as usize].layer = 1;
            }
        } else {
            self.nodes[new_node_id as usize].layer = self.nodes[in_node as usize].layer + 1;
            self.nodes[out_node as usize].layer = self.nodes[new_node_id as usize].layer + 1;
            self.update_layers(out_node as usize);
        }
        true
    }

    /// Add a node whose input type differs from its output type, bridging two declared value
    /// domains. On failure to find either edge, the new node is rolled back entirely rather
    /// than left orphaned.
    fn add_transtype(
        &mut self,
        cfg: &GenomeConfig,
        conn_innov: &mut ConnectionInnovation,
        node_innov: &mut NodeInnovation,
        rng: &mut impl RngCore,
    ) -> bool {
        if self.n_types <= 1 {
            return false;
        }
        let t_in = rng.random_range(0..self.n_types);
        let mut t_out = rng.random_range(0..self.n_types);
        while t_out == t_in {
            t_out = rng.random_range(0..self.n_types);
        }
        if self.activation_fns[t_in][t_out].is_empty() {
            return false;
        }

        let idx = rng.random_range(0..self.activation_fns[t_in][t_out].len());
        let act = self.activation_fns[t_in][t_out][idx];
        let new_node_id = self.nodes.len() as u32;
        let innov_id = node_innov.next(t_in, t_out, idx);
        self.nodes
            .push(Node::new(new_node_id, innov_id, UNASSIGNED_LAYER, t_in, t_out, act, self.reset_values[t_in]));

        let n = self.nodes.len() as u32;
        let mut in_node = rng.random_range(0..n);
        let mut in_node_recu = if self.rec_max > 0 { rng.random_range(0..self.rec_max) } else { 0 };
        let mut iteration = 0u32;
        let bad_source = |g: &Self, node: u32, recu: u32| {
            g.nodes[node as usize].t_out != t_in
                || (node >= g.n_bias + g.n_input && node < g.n_bias + g.n_input + g.n_output && recu == 0)
        };
        while iteration < cfg.max_iterations_find_node_thresh && bad_source(self, in_node, in_node_recu) {
            in_node = rng.random_range(0..n);
            in_node_recu = if self.rec_max > 0 { rng.random_range(0..self.rec_max) } else { 0 };
            iteration += 1;
        }
        if iteration >= cfg.max_iterations_find_node_thresh {
            self.nodes.pop();
            return false;
        }

        let innov1 = conn_innov.get_or_assign(in_node, new_node_id, in_node_recu);
        let weight1 = uniform_signed(rng, self.weight_extremum_init);
        self.connections
            .push(Connection::new(innov1, in_node, new_node_id, in_node_recu, weight1));

        let mut out_node = rng.random_range(0..n);
        let mut iteration2 = 0u32;
        while iteration2 < cfg.max_iterations_find_node_thresh
            && (self.nodes[out_node as usize].t_in != t_out || self.check_connection_circle(new_node_id, out_node))
        {
            out_node = rng.random_range(0..n);
            iteration2 += 1;
        }
        if iteration2 >= cfg.max_iterations_find_node_thresh {
            self.connections.pop();
            self.nodes.pop();
            return false;
        }

        let innov2 = conn_innov.get_or_assign(new_node_id, out_node, 0);
        let weight2 = uniform_signed(rng, self.weight_extremum_init);
        self.connections
            .push(Connection::new(innov2, new_node_id, out_node, 0, weight2));
        true
    }

    /// Propagate a layer change downstream via non-recurrent edges, breadth-first, then
    /// equalize every output node to the deepest layer reached (by any hidden node, plus one).
    /// Capped at `nodes.len()` visits; exceeding that means a cycle slipped past
    /// [`Genome::check_connection_circle`], which is a bug in mutation, not in input data.
    fn update_layers(&mut self, start: usize) {
        let cap = self.nodes.len().max(1);
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut visits = 0usize;
        while let Some(node_id) = queue.pop_front() {
            visits += 1;
            if visits > cap {
                panic!("update_layers exceeded {cap} visits; non-recurrent edges contain a cycle");
            }
            let layer = self.nodes[node_id].layer;
            let targets: Vec<u32> = self
                .connections
                .iter()
                .filter(|c| c.enabled && c.in_node_recu == 0 && c.in_node as usize == node_id)
                .map(|c| c.out_node)
                .collect();
            for out_node in targets {
                self.nodes[out_node as usize].layer = layer + 1;
                queue.push_back(out_node as usize);
            }
        }

        let io_start = (self.n_bias + self.n_input) as usize;
        let io_end = io_start + self.n_output as usize;
        let mut output_layer = self.nodes[io_start].layer;
        for node in &self.nodes[io_start..io_end] {
            output_layer = output_layer.max(node.layer);
        }
        for node in &self.nodes[io_end..] {
            if node.layer >= output_layer {
                output_layer = node.layer + 1;
            }
        }
        for node in &mut self.nodes[io_start..io_end] {
            node.layer = output_layer;
        }
    }

    /// Pure data extraction for an external renderer: node positions by (layer, rank within
    /// layer) and edge styling hints. The engine never draws anything itself.
    pub fn layout_hints(&self) -> LayoutHints {
        let mut rank_in_layer = vec![0u32; self.nodes.len()];
        let mut next_rank = std::collections::HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let rank = next_rank.entry(node.layer).or_insert(0u32);
            rank_in_layer[i] = *rank;
            *rank += 1;
        }

        let node_positions = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| NodePosition { layer: node.layer, rank: rank_in_layer[i] })
            .collect();

        let max_weight = self.connections.iter().map(|c| c.weight.abs()).fold(0.0f32, f32::max);
        let edge_hints = self
            .connections
            .iter()
            .map(|c| EdgeHint {
                in_node: c.in_node,
                out_node: c.out_node,
                enabled: c.enabled,
                recurrent: c.in_node_recu > 0,
                alpha: if max_weight > 0.0 { c.weight.abs() / max_weight } else { 0.0 },
            })
            .collect();

        LayoutHints { node_positions, edge_hints }
    }

    /// Serialize to JSON, for debugging and test fixtures. The byte-exact persistence
    /// contract is [`crate::serialize`]'s binary codec, not this.
    pub fn to_json(&self) -> Result<String, SerializationError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self, SerializationError> {
        let mut genome: Genome = serde_json::from_str(s)?;
        genome.prev_outputs = CircularBuffer::new(genome.rec_max as usize);
        Ok(genome)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SerializationError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SerializationError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::{steep_sigmoid, Builtin, Kind};
    use crate::random::seeded_rng;

    fn xor_genome() -> Genome {
        let cfg = GenomeConfig::default();
        let mut conn_innov = ConnectionInnovation::default();
        let mut node_innov = NodeInnovation::default();
        let mut rng = seeded_rng(0xC0FFEE);
        Genome::new(
            &[1],
            &[2],
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
    fn construction_allocates_expected_node_counts() {
        let g = xor_genome();
        assert_eq!(g.n_bias, 1);
        assert_eq!(g.n_input, 2);
        assert_eq!(g.n_output, 1);
        assert_eq!(g.nodes.len(), 4);
    }

    #[test]
    fn empty_activation_schema_is_rejected() {
        let cfg = GenomeConfig::default();
        let mut conn_innov = ConnectionInnovation::default();
        let mut node_innov = NodeInnovation::default();
        let mut rng = seeded_rng(1);
        let result = Genome::new(
            &[0],
            &[0],
            &[0],
            &[],
            &[],
            vec![],
            vec![],
            0,
            &cfg,
            &mut conn_innov,
            &mut node_innov,
            &mut rng,
        );
        assert!(matches!(result, Err(ConfigError::EmptySchema { .. })));
    }

    #[test]
    fn run_network_produces_bounded_output() {
        let mut g = xor_genome();
        g.load_inputs(&[Value::F32(1.0), Value::F32(0.0)]);
        g.run_network();
        let Value::F32(y) = g.output(0) else { panic!("wrong variant") };
        assert!((0.0..=1.0).contains(&y));
    }

    #[test]
    fn add_node_splits_a_connection_and_disables_it() {
        let mut g = xor_genome();
        let mut conn_innov = ConnectionInnovation::default();
        let mut node_innov = NodeInnovation::default();
        let cfg = GenomeConfig::default();
        let mut rng = seeded_rng(2);
        let before = g.connections.len();
        let before_nodes = g.nodes.len();
        let added = g.add_node(&cfg, &mut conn_innov, &mut node_innov, &mut rng);
        assert!(added);
        assert_eq!(g.nodes.len(), before_nodes + 1);
        assert_eq!(g.connections.len(), before + 2);
        assert!(g.connections.iter().filter(|c| !c.enabled).count() >= 1);
    }

    #[test]
    fn mutate_perturbs_hidden_node_activation_gain() {
        let mut g = xor_genome();
        let mut conn_innov = ConnectionInnovation::default();
        let mut node_innov = NodeInnovation::default();
        let cfg = GenomeConfig::default();
        let mut rng = seeded_rng(2);
        assert!(g.add_node(&cfg, &mut conn_innov, &mut node_innov, &mut rng));
        let hidden_idx = g.nodes.len() - 1;
        let Kind::Sigmoid { gain: before } = g.nodes[hidden_idx].activation.kind() else {
            panic!("expected a sigmoid hidden node");
        };

        let mutate_cfg = GenomeConfig {
            mutate_weight_thresh: 1.0,
            add_node_thresh: 0.0,
            add_transtype_thresh: 0.0,
            add_connection_thresh: 0.0,
            ..GenomeConfig::default()
        };
        g.fitness = 0.5;
        g.mutate(&mutate_cfg, &mut conn_innov, &mut node_innov, &mut rng);

        let Kind::Sigmoid { gain: after } = g.nodes[hidden_idx].activation.kind() else {
            panic!("expected a sigmoid hidden node");
        };
        assert_ne!(before, after);
    }

    #[test]
    fn add_node_with_no_connections_fails() {
        // n_conn_init = 0: a single-node genome has too few legal signatures (only self-loops
        // at nonzero recurrency) to ever satisfy the default init count.
        let cfg = GenomeConfig { n_conn_init: 0, ..GenomeConfig::default() };
        let mut conn_innov = ConnectionInnovation::default();
        let mut node_innov = NodeInnovation::default();
        let mut rng = seeded_rng(3);
        let mut g = Genome::new(
            &[0],
            &[0],
            &[1],
            &[],
            &[],
            vec![Value::F32(0.0)],
            vec![vec![vec![Builtin::new(Kind::Identity)]]],
            0,
            &cfg,
            &mut conn_innov,
            &mut node_innov,
            &mut rng,
        )
        .unwrap();
        g.connections.clear();
        assert!(!g.add_node(&cfg, &mut conn_innov, &mut node_innov, &mut rng));
    }

    #[test]
    fn add_transtype_rejects_single_type_genome() {
        let mut g = xor_genome();
        let cfg = GenomeConfig::default();
        let mut conn_innov = ConnectionInnovation::default();
        let mut node_innov = NodeInnovation::default();
        let mut rng = seeded_rng(4);
        assert!(!g.add_transtype(&cfg, &mut conn_innov, &mut node_innov, &mut rng));
    }

    #[test]
    fn check_connection_circle_detects_self_loop() {
        let g = xor_genome();
        assert!(g.check_connection_circle(0, 0));
    }

    #[test]
    fn check_connection_circle_ignores_disabled_edges() {
        let mut g = xor_genome();
        g.connections.clear();
        g.connections.push(Connection::new(0, 1, 3, 0, 1.0));
        let mut back_edge = Connection::new(1, 3, 1, 0, 1.0);
        back_edge.enabled = false;
        g.connections.push(back_edge);

        // the only path back from 3 to 1 runs through a disabled edge, so it must not count
        // as a cycle when proposing a fresh (1, 3) edge.
        assert!(!g.check_connection_circle(1, 3));
    }

    #[test]
    fn add_connection_with_zero_iterations_never_succeeds() {
        let mut g = xor_genome();
        let cfg = GenomeConfig { max_iterations_find_connection_thresh: 0, ..GenomeConfig::default() };
        let mut conn_innov = ConnectionInnovation::default();
        let mut rng = seeded_rng(11);
        let before = g.connections.len();
        assert!(!g.add_connection(&cfg, &mut conn_innov, &mut rng));
        assert_eq!(g.connections.len(), before);
    }

    #[test]
    fn add_connection_with_one_iteration_can_succeed() {
        // A single allowed draw must be honored when it lands on a valid triple, not discarded
        // by the retry-budget bookkeeping.
        let cfg = GenomeConfig { max_iterations_find_connection_thresh: 1, ..GenomeConfig::default() };
        let mut conn_innov = ConnectionInnovation::default();
        let mut succeeded = false;
        for seed in 0..200u64 {
            let mut g = xor_genome();
            g.connections.clear();
            let mut rng = seeded_rng(seed);
            if g.add_connection(&cfg, &mut conn_innov, &mut rng) {
                succeeded = true;
                break;
            }
        }
        assert!(succeeded);
    }

    #[test]
    fn mismatched_type_endpoints_are_rejected() {
        // n_conn_init = 0: with only one node per type, no valid initial edge exists, and the
        // construction-time wiring loop has no retry cap (see add_connection for the bounded
        // version used after construction).
        let cfg = GenomeConfig { n_conn_init: 0, ..GenomeConfig::default() };
        let mut conn_innov = ConnectionInnovation::default();
        let mut node_innov = NodeInnovation::default();
        let mut rng = seeded_rng(5);
        let g = Genome::new(
            &[0, 0],
            &[1, 0],
            &[0, 1],
            &[],
            &[],
            vec![Value::I32(0), Value::F32(0.0)],
            vec![
                vec![vec![Builtin::new(Kind::Identity)], vec![]],
                vec![vec![], vec![Builtin::new(Kind::Identity)]],
            ],
            0,
            &cfg,
            &mut conn_innov,
            &mut node_innov,
            &mut rng,
        )
        .unwrap();
        // node 0 is the i32 input (t_out=0), node 1 is the f32 output (t_in=1): incompatible.
        assert!(matches!(g.check_connection_validity(0, 1, 0), ConnectionCheck::Invalid));
    }

    #[test]
    fn recurrent_edge_contributes_nothing_until_history_fills() {
        // n_conn_init = 0: this 2-node schema has too few legal signatures to satisfy the
        // default init count, and construction's wiring loop has no retry cap.
        let cfg = GenomeConfig { n_conn_init: 0, ..GenomeConfig::default() };
        let mut conn_innov = ConnectionInnovation::default();
        let mut node_innov = NodeInnovation::default();
        let mut rng = seeded_rng(6);
        let mut g = Genome::new(
            &[0],
            &[1],
            &[1],
            &[],
            &[],
            vec![Value::F32(0.0)],
            vec![vec![vec![Builtin::new(Kind::Identity)]]],
            2,
            &cfg,
            &mut conn_innov,
            &mut node_innov,
            &mut rng,
        )
        .unwrap();
        g.connections.clear();
        g.connections.push(Connection::new(0, 0, 1, 2, 1.0));

        g.load_inputs(&[Value::F32(1.0)]);
        g.run_network();
        let Value::F32(y1) = g.output(0) else { panic!("wrong variant") };
        assert_eq!(y1, 0.0);

        g.load_inputs(&[Value::F32(2.0)]);
        g.run_network();
        let Value::F32(y2) = g.output(0) else { panic!("wrong variant") };
        assert_eq!(y2, 0.0);

        g.load_inputs(&[Value::F32(3.0)]);
        g.run_network();
        let Value::F32(y3) = g.output(0) else { panic!("wrong variant") };
        assert_eq!(y3, 1.0);
    }

    #[test]
    fn layout_hints_cover_every_node_and_connection() {
        let g = xor_genome();
        let hints = g.layout_hints();
        assert_eq!(hints.node_positions.len(), g.nodes.len());
        assert_eq!(hints.edge_hints.len(), g.connections.len());
        assert!(hints.edge_hints.iter().all(|e| (0.0..=1.0).contains(&e.alpha)));
    }

    #[test]
    fn json_round_trip_preserves_topology() {
        let g = xor_genome();
        let json = g.to_json().unwrap();
        let back = Genome::from_json(&json).unwrap();
        assert_eq!(back.nodes.len(), g.nodes.len());
        assert_eq!(back.connections.len(), g.connections.len());
    }
}
