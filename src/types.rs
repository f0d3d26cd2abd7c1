//! The value domain: a tagged union standing in for the type-erased `void*` payloads the
//! system this crate evolves from carries through its node graph.
//!
//! Every node and edge is tagged with a small non-negative integer, the T-index, naming one
//! of these variants. Edges are only legal where the source's output type matches the sink's
//! input type; see [`crate::genome::connection::check_connection_validity`].

use serde::{Deserialize, Serialize};

/// A value flowing through the computation graph, tagged by declared type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    F32(f32),
    F64(f64),
    I32(i32),
    I64(i64),
    Bool(bool),
}

impl Value {
    /// The T-index this value is tagged with. Order fixes the type table's indexing:
    /// callers declare `activationFns[t_in][t_out]` against this same order.
    pub const fn type_index(&self) -> usize {
        match self {
            Value::F32(_) => 0,
            Value::F64(_) => 1,
            Value::I32(_) => 2,
            Value::I64(_) => 3,
            Value::Bool(_) => 4,
        }
    }

    pub const TYPE_COUNT: usize = 5;

    /// The neutral ("reset") value for a type index, used when a caller doesn't supply an
    /// explicit reset value for that type.
    pub fn zero(type_index: usize) -> Self {
        match type_index {
            0 => Value::F32(0.0),
            1 => Value::F64(0.0),
            2 => Value::I32(0),
            3 => Value::I64(0),
            4 => Value::Bool(false),
            _ => Value::F32(0.0),
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::F32(v) => v as f64,
            Value::F64(v) => v,
            Value::I32(v) => v as f64,
            Value::I64(v) => v as f64,
            Value::Bool(v) => v as u8 as f64,
        }
    }

    /// Cast an `f64` back into this value's own type, for accumulation in
    /// `Node::add_to_input`.
    pub fn from_f64_as(&self, x: f64) -> Self {
        match self {
            Value::F32(_) => Value::F32(x as f32),
            Value::F64(_) => Value::F64(x),
            Value::I32(_) => Value::I32(x as i32),
            Value::I64(_) => Value::I64(x as i64),
            Value::Bool(_) => Value::Bool(x != 0.0),
        }
    }

    /// `self += value * scalar`, performed in `self`'s domain.
    pub fn add_scaled(&self, value: Value, scalar: f64) -> Self {
        self.from_f64_as(self.as_f64() + value.as_f64() * scalar)
    }
}
