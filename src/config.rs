//! Configuration constants and run configuration for the steering simulator

use thiserror::Error;

// ============================================================================
// POPULATION SETTINGS
// ============================================================================

/// Initial lifespan of a generation in ticks (grows when fitness stops improving)
pub const DEFAULT_LIFESPAN: u32 = 100;

/// Fraction of the current lifespan added when a generation fails to improve
pub const DEFAULT_LIFESPAN_GROWTH_RATE: f32 = 0.1;

/// Fixed number of individuals in every generation
pub const DEFAULT_POPULATION_SIZE: usize = 100;

/// Lifespan never drops below this many ticks
pub const MIN_LIFESPAN: u32 = 10;

/// Upper bound on how many ticks a single generation may add to the lifespan
pub const MAX_LIFESPAN_GROWTH: u32 = 100;

// ============================================================================
// GENETIC OPERATORS
// ============================================================================

/// Chance per gene to be replaced with a random gene when a child is bred
pub const DEFAULT_MUTATION_RATE: f32 = 0.03;

/// Chance that a below-average individual is kept anyway while pruning
pub const DEFAULT_PRUNE_SAVE_RATE: f32 = 0.4;

/// Chance that a kept individual gets an extra mutation pass while pruning
pub const DEFAULT_PRUNE_MUTATE_RATE: f32 = 0.01;

// ============================================================================
// PHYSICS
// ============================================================================

/// Upper bound on a gene's force magnitude; random genes are unit directions limited to it
pub const DEFAULT_MAX_FORCE: f32 = 0.8;

/// Velocity is multiplied by this every tick
pub const DEFAULT_VELOCITY_DAMPING: f32 = 0.99;

/// Radius of an individual; reaching within this distance of the target completes it
pub const AGENT_RADIUS: f32 = 15.0;

// ============================================================================
// FITNESS
// ============================================================================

/// Numerator of the distance fitness term (`scale / max(1, distance)`)
pub const DISTANCE_FITNESS_SCALE: f32 = 1000.0;

/// Fitness is divided by this when an individual hits a wall or obstacle
pub const DEFAULT_STUCK_PENALTY_DIVISOR: f32 = 5.0;

// ============================================================================
// PLAY FIELD
// ============================================================================

/// Width of the play field in field units
pub const FIELD_WIDTH: f32 = 1280.0;

/// Height of the play field in field units
pub const FIELD_HEIGHT: f32 = 720.0;

/// Distance of the start point and target from their field corners
pub const CORNER_INSET: f32 = 100.0;

/// Errors raised while validating a run before the first generation starts
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("population size must be at least 1")]
    EmptyPopulation,
    #[error("initial lifespan {lifespan} is below the minimum of {min} ticks")]
    LifespanTooShort { lifespan: u32, min: u32 },
    #[error("{name} must be a probability between 0.0 and 1.0, got {value}")]
    InvalidProbability { name: &'static str, value: f32 },
    #[error("{name} must be finite and positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },
    #[error("lifespan growth rate must be finite and non-negative, got {0}")]
    InvalidGrowthRate(f32),
    #[error("velocity damping must be in [0, 1], got {0}")]
    InvalidDamping(f32),
    #[error("play field bounds must be finite and positive, got {width}x{height}")]
    InvalidBounds { width: f32, height: f32 },
}

/// Options fixed for the duration of a run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub lifespan: u32,
    pub lifespan_growth_rate: f32,
    pub population_size: usize,
    pub max_force: f32,
    pub velocity_damping: f32,
    pub prune_save_rate: f32,
    pub prune_mutate_rate: f32,
    pub mutation_rate: f32,
    pub stuck_penalty_divisor: f32,
    pub agent_radius: f32,
    /// Seed for the shared random stream; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            lifespan: DEFAULT_LIFESPAN,
            lifespan_growth_rate: DEFAULT_LIFESPAN_GROWTH_RATE,
            population_size: DEFAULT_POPULATION_SIZE,
            max_force: DEFAULT_MAX_FORCE,
            velocity_damping: DEFAULT_VELOCITY_DAMPING,
            prune_save_rate: DEFAULT_PRUNE_SAVE_RATE,
            prune_mutate_rate: DEFAULT_PRUNE_MUTATE_RATE,
            mutation_rate: DEFAULT_MUTATION_RATE,
            stuck_penalty_divisor: DEFAULT_STUCK_PENALTY_DIVISOR,
            agent_radius: AGENT_RADIUS,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Checks every option, returning the first one out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.lifespan < MIN_LIFESPAN {
            return Err(ConfigError::LifespanTooShort {
                lifespan: self.lifespan,
                min: MIN_LIFESPAN,
            });
        }
        if !self.lifespan_growth_rate.is_finite() || self.lifespan_growth_rate < 0.0 {
            return Err(ConfigError::InvalidGrowthRate(self.lifespan_growth_rate));
        }

        for (name, value) in [
            ("mutation rate", self.mutation_rate),
            ("prune save rate", self.prune_save_rate),
            ("prune mutate rate", self.prune_mutate_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }

        if !(0.0..=1.0).contains(&self.velocity_damping) {
            return Err(ConfigError::InvalidDamping(self.velocity_damping));
        }

        for (name, value) in [
            ("max force", self.max_force),
            ("agent radius", self.agent_radius),
            ("stuck penalty divisor", self.stuck_penalty_divisor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        Ok(())
    }
}
