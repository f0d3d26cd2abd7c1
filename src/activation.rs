//! Activation functions: parameterized, cloneable, mutable `T_in -> T_out` mappings.
//!
//! The engine treats an activation's parameter block as opaque — it only ever clones,
//! mutates, or serializes it through this trait. Concrete shapes live in [`Kind`], an
//! enum-of-parameter-shapes covering the built-ins; nothing downstream matches on `Kind`
//! directly.

use serde::{Deserialize, Serialize};

use crate::types::Value;

/// The parameter shape behind a built-in activation. New built-ins add a variant here and
/// a pair of arms in [`Builtin::process`]/[`Builtin::mutate`] — callers never see this enum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Kind {
    /// `f(x) = x`. The only legal activation for input/output nodes (`t_in == t_out`).
    Identity,
    /// `f(x) = 1 / (1 + e^{-gain * x})`.
    Sigmoid { gain: f64 },
    /// `f(x) = max(0, x)`.
    Relu,
    /// `f(x) = tanh(gain * x)`.
    Tanh { gain: f64 },
}

impl Kind {
    pub fn default_params(self) -> Self {
        match self {
            Kind::Identity => Kind::Identity,
            Kind::Sigmoid { .. } => Kind::Sigmoid { gain: 1.0 },
            Kind::Relu => Kind::Relu,
            Kind::Tanh { .. } => Kind::Tanh { gain: 1.0 },
        }
    }
}

/// A cloneable, mutable activation function operating on the tagged [`Value`] domain.
pub trait ActivationFn: std::fmt::Debug + Send + Sync {
    fn process(&self, input: Value) -> Value;

    /// Mutate parameters in place. `fitness` may scale perturbation magnitude; lower fitness
    /// conventionally licenses larger perturbations, to escape local optima more readily.
    fn mutate(&mut self, fitness: f64, rng: &mut dyn rand::RngCore);

    /// Independent copy. When `preserve_params` is false, parameters reset to their
    /// construction-time defaults rather than carrying the current mutated values forward.
    fn clone_fn(&self, preserve_params: bool) -> Box<dyn ActivationFn>;

    fn print(&self) -> String;

    fn kind(&self) -> Kind;
}

/// The built-in activation implementation, parameterized by [`Kind`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Builtin(pub Kind);

impl Builtin {
    pub fn new(kind: Kind) -> Self {
        Self(kind)
    }
}

impl ActivationFn for Builtin {
    fn process(&self, input: Value) -> Value {
        let x = input.as_f64();
        let y = match self.0 {
            Kind::Identity => x,
            Kind::Sigmoid { gain } => 1.0 / (1.0 + (-gain * x).exp()),
            Kind::Relu => x.max(0.0),
            Kind::Tanh { gain } => (gain * x).tanh(),
        };
        input.from_f64_as(y)
    }

    fn mutate(&mut self, fitness: f64, rng: &mut dyn rand::RngCore) {
        use rand::Rng;
        // Larger perturbations when fitness is low and positive; fitness <= 0 falls back to
        // the base scale rather than blowing up near zero.
        let scale = if fitness > 0.0 { 1.0 / fitness.max(1e-6) } else { 1.0 };
        let delta = rng.random_range(-0.1..=0.1) * scale.min(10.0);
        match &mut self.0 {
            Kind::Sigmoid { gain } | Kind::Tanh { gain } => {
                *gain = (*gain + delta).max(1e-3);
            }
            Kind::Identity | Kind::Relu => {}
        }
    }

    fn clone_fn(&self, preserve_params: bool) -> Box<dyn ActivationFn> {
        if preserve_params {
            Box::new(*self)
        } else {
            Box::new(Builtin(self.0.default_params()))
        }
    }

    fn print(&self) -> String {
        match self.0 {
            Kind::Identity => "identity".to_string(),
            Kind::Sigmoid { gain } => format!("sigmoid(gain={gain:.3})"),
            Kind::Relu => "relu".to_string(),
            Kind::Tanh { gain } => format!("tanh(gain={gain:.3})"),
        }
    }

    fn kind(&self) -> Kind {
        self.0
    }
}

/// Steep sigmoid with gain 4.9, the canonical XOR-scenario activation.
pub fn steep_sigmoid() -> Builtin {
    Builtin::new(Kind::Sigmoid { gain: 4.9 })
}

pub fn identity() -> Builtin {
    Builtin::new(Kind::Identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded_rng;

    #[test]
    fn identity_passes_through() {
        let f = identity();
        assert_eq!(f.process(Value::F32(2.5)), Value::F32(2.5));
    }

    #[test]
    fn steep_sigmoid_is_bounded() {
        let f = steep_sigmoid();
        let Value::F32(y) = f.process(Value::F32(100.0)) else {
            panic!("wrong variant");
        };
        assert!(y > 0.99 && y <= 1.0);
    }

    #[test]
    fn relu_clamps_negatives() {
        let f = Builtin::new(Kind::Relu);
        assert_eq!(f.process(Value::F64(-3.0)), Value::F64(0.0));
        assert_eq!(f.process(Value::F64(3.0)), Value::F64(3.0));
    }

    #[test]
    fn mutate_changes_gain_but_not_identity() {
        let mut rng = seeded_rng(7);
        let mut f = Builtin::new(Kind::Sigmoid { gain: 1.0 });
        f.mutate(0.5, &mut rng);
        let Kind::Sigmoid { gain } = f.kind() else {
            panic!("wrong variant");
        };
        assert_ne!(gain, 1.0);

        let mut id = identity();
        id.mutate(0.5, &mut rng);
        assert_eq!(id.kind(), Kind::Identity);
    }

    #[test]
    fn clone_without_preserve_resets_params() {
        let f = Builtin::new(Kind::Sigmoid { gain: 9.0 });
        let reset = f.clone_fn(false);
        assert_eq!(reset.kind(), Kind::Sigmoid { gain: 1.0 });
        let preserved = f.clone_fn(true);
        assert_eq!(preserved.kind(), Kind::Sigmoid { gain: 9.0 });
    }
}
