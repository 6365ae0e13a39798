//! Genetic-algorithm steering: a population of bubbles evolves per-tick force
//! sequences that carry it from a start point to a target around obstacles.

pub mod config;
pub mod dna;
pub mod environment;
pub mod individual;
pub mod population;

pub use config::{ConfigError, SimulationConfig};
pub use dna::Dna;
pub use environment::{Environment, Shape};
pub use individual::{Individual, Outcome};
pub use population::{FitnessSummary, GenerationStats, OverallStats, Population};
