pub mod activation;
pub mod buffer;
pub mod config;
pub mod constants;
pub mod crossover;
pub mod error;
pub mod genome;
pub mod innovation;
pub mod population;
pub mod random;
pub mod reproduce;
pub mod serialize;
pub mod specie;
pub mod threadpool;
pub mod types;

pub use config::{GenomeConfig, PopulationConfig};
pub use error::{ConfigError, SerializationError};
pub use genome::{Connection, EdgeHint, Genome, LayoutHints, Node, NodePosition};
pub use population::Population;
pub use specie::Specie;
pub use types::Value;
