//! Tunable parameters for genomes and populations, loadable from TOML or used as defaults.

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::ConfigError;

/// Genome-level tunables: initialization shape and mutation thresholds.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GenomeConfig {
    pub n_conn_init: u32,
    pub prob_recu_init: f32,
    pub weight_extremum_init: f32,
    pub max_recu_init: u32,
    pub mutate_weight_thresh: f32,
    pub mutate_weight_full_change_thresh: f32,
    pub mutate_weight_factor: f32,
    pub add_connection_thresh: f32,
    pub max_iterations_find_connection_thresh: u32,
    pub reactivate_connection_thresh: f32,
    pub add_node_thresh: f32,
    pub max_iterations_find_node_thresh: u32,
    pub add_transtype_thresh: f32,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            n_conn_init: constants::N_CONN_INIT,
            prob_recu_init: constants::PROB_RECU_INIT,
            weight_extremum_init: constants::WEIGHT_EXTREMUM_INIT,
            max_recu_init: constants::MAX_RECU_INIT,
            mutate_weight_thresh: constants::MUTATE_WEIGHT_THRESH,
            mutate_weight_full_change_thresh: constants::MUTATE_WEIGHT_FULL_CHANGE_THRESH,
            mutate_weight_factor: constants::MUTATE_WEIGHT_FACTOR,
            add_connection_thresh: constants::ADD_CONNECTION_THRESH,
            max_iterations_find_connection_thresh: constants::MAX_ITERATIONS_FIND_CONNECTION_THRESH,
            reactivate_connection_thresh: constants::REACTIVATE_CONNECTION_THRESH,
            add_node_thresh: constants::ADD_NODE_THRESH,
            max_iterations_find_node_thresh: constants::MAX_ITERATIONS_FIND_NODE_THRESH,
            add_transtype_thresh: constants::ADD_TRANSTYPE_THRESH,
        }
    }
}

/// Population-level tunables: size, speciation, and compatibility-distance coefficients.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PopulationConfig {
    pub pop_size: u32,
    pub speciation_thresh_init: f64,
    pub thresh_gens_since_improved: u32,
    pub speciation_target: u32,
    pub speciation_target_thresh: u32,
    pub speciation_step_thresh: f64,
    pub elitism: usize,
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            pop_size: constants::POP_SIZE,
            speciation_thresh_init: constants::SPECIATION_THRESH_INIT,
            thresh_gens_since_improved: constants::THRESH_GENS_SINCE_IMPROVED,
            speciation_target: constants::SPECIATION_TARGET,
            speciation_target_thresh: constants::SPECIATION_TARGET_THRESH,
            speciation_step_thresh: constants::SPECIATION_STEP_THRESH,
            elitism: constants::ELITISM,
            a: constants::COMPAT_COEFFICIENT_A,
            b: constants::COMPAT_COEFFICIENT_B,
            c: constants::COMPAT_COEFFICIENT_C,
        }
    }
}

impl GenomeConfig {
    /// Load from a TOML file, falling back to [`Default`] for any field it doesn't set.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}

impl PopulationConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let cfg = Config::builder()
            .add_source(File::with_name(path))
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}
