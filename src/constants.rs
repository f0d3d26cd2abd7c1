//! Default parameter values for genome and population configuration.
//!
//! These mirror the literal defaults of the system this crate evolves from; they're the
//! fallback values [`crate::config::GenomeConfig`] and [`crate::config::PopulationConfig`] use
//! when a field isn't present in a loaded TOML document.

// ============================================================================
// Genome initialization
// ============================================================================

pub const N_CONN_INIT: u32 = 10;
pub const PROB_RECU_INIT: f32 = 0.2;
pub const WEIGHT_EXTREMUM_INIT: f32 = 3.0;
pub const MAX_RECU_INIT: u32 = 3;

// ============================================================================
// Genome mutation
// ============================================================================

pub const MUTATE_WEIGHT_THRESH: f32 = 0.8;
pub const MUTATE_WEIGHT_FULL_CHANGE_THRESH: f32 = 0.1;
pub const MUTATE_WEIGHT_FACTOR: f32 = 1.2;
pub const ADD_CONNECTION_THRESH: f32 = 0.05;
pub const MAX_ITERATIONS_FIND_CONNECTION_THRESH: u32 = 20;
pub const REACTIVATE_CONNECTION_THRESH: f32 = 0.25;
pub const ADD_NODE_THRESH: f32 = 0.03;
pub const MAX_ITERATIONS_FIND_NODE_THRESH: u32 = 20;
pub const ADD_TRANSTYPE_THRESH: f32 = 0.02;

// ============================================================================
// Population / speciation
// ============================================================================

pub const POP_SIZE: u32 = 150;
pub const SPECIATION_THRESH_INIT: f64 = 3.0;
pub const THRESH_GENS_SINCE_IMPROVED: u32 = 15;
pub const SPECIATION_TARGET: u32 = 5;
pub const SPECIATION_TARGET_THRESH: u32 = 0;
pub const SPECIATION_STEP_THRESH: f64 = 0.5;
pub const ELITISM: usize = 1;

/// Compatibility-distance coefficients (excess, disjoint, weight-difference).
pub const COMPAT_COEFFICIENT_A: f64 = 1.0;
pub const COMPAT_COEFFICIENT_B: f64 = 1.0;
pub const COMPAT_COEFFICIENT_C: f64 = 0.4;
