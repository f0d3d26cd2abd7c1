//! An edge in a genome's computation graph: a weighted link between two node ids, with an
//! optional recurrency depth.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Population-wide innovation id from [`crate::innovation::ConnectionInnovation`].
    pub innov_id: u32,
    pub in_node: u32,
    pub out_node: u32,
    /// Evaluation steps this edge reaches into the past; `0` means same-step.
    pub in_node_recu: u32,
    pub weight: f32,
    pub enabled: bool,
}

impl Connection {
    pub fn new(innov_id: u32, in_node: u32, out_node: u32, in_node_recu: u32, weight: f32) -> Self {
        Self {
            innov_id,
            in_node,
            out_node,
            in_node_recu,
            weight,
            enabled: true,
        }
    }

    pub fn is_recurrent(&self) -> bool {
        self.in_node_recu > 0
    }
}
