//! A single vertex in a genome's computation graph.

use serde::{Deserialize, Serialize};

use crate::activation::{Builtin, Kind};
use crate::types::Value;

/// `layer` is unassigned (not yet placed by [`super::Genome::update_layers`]) when this value.
pub const UNASSIGNED_LAYER: i32 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// This node's position within its genome's node vector; stable across the genome's life.
    pub id: u32,
    /// Population-wide innovation id from [`crate::innovation::NodeInnovation`].
    pub innov_id: u32,
    pub layer: i32,
    pub t_in: usize,
    pub t_out: usize,
    pub activation: Builtin,
    pub reset_value: Value,
    pub current_input: Value,
    pub current_output: Value,
}

impl Node {
    pub fn new(
        id: u32,
        innov_id: u32,
        layer: i32,
        t_in: usize,
        t_out: usize,
        activation: Builtin,
        reset_value: Value,
    ) -> Self {
        let current_input = reset_value;
        let current_output = Value::zero(t_out.min(Value::TYPE_COUNT - 1));
        Self {
            id,
            innov_id,
            layer,
            t_in,
            t_out,
            activation,
            reset_value,
            current_input,
            current_output,
        }
    }

    /// An identity-activated node for bias/input/output roles, where `t_in == t_out`.
    pub fn identity(id: u32, innov_id: u32, layer: i32, t: usize, reset_value: Value) -> Self {
        Self::new(id, innov_id, layer, t, t, Builtin::new(Kind::Identity), reset_value)
    }

    pub fn reset(&mut self) {
        self.current_input = self.reset_value;
    }

    pub fn add_to_input(&mut self, value: Value, scalar: f64) {
        self.current_input = self.current_input.add_scaled(value, scalar);
    }

    pub fn load_input(&mut self, input: Value) {
        self.current_input = input;
    }

    pub fn process(&mut self) {
        self.current_output = self.activation.process(self.current_input);
    }

    pub fn output(&self) -> Value {
        self.current_output
    }
}
