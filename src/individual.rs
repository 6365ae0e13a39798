use crate::config::*;
use crate::dna::Dna;
use crate::environment::Environment;
use bevy::math::Vec2;
use rand::Rng;

/// How an individual's run ended, if it has ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Active,
    /// Reached the target at this tick
    Completed(u32),
    /// Left the field or hit an obstacle at this tick
    Stuck(u32),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Active)
    }

    pub fn tick(&self) -> Option<u32> {
        match self {
            Outcome::Active => None,
            Outcome::Completed(tick) | Outcome::Stuck(tick) => Some(*tick),
        }
    }
}

/// A single simulated bubble: one DNA plus its physical state
#[derive(Debug, Clone)]
pub struct Individual {
    dna: Dna,
    position: Vec2,
    velocity: Vec2,
    acceleration: Vec2,
    pub(crate) fitness: f32,
    outcome: Outcome,
    /// Mutations applied when this individual was bred (informational)
    pub mutation_count: usize,
}

impl Individual {
    pub fn new(dna: Dna, start: Vec2) -> Self {
        Self {
            dna,
            position: start,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            fitness: 0.0,
            outcome: Outcome::Active,
            mutation_count: 0,
        }
    }

    /// Individual with `length` random genes
    pub fn random(length: usize, config: &SimulationConfig, start: Vec2, rng: &mut impl Rng) -> Self {
        Self::new(Dna::random(length, config.max_force, rng), start)
    }

    pub fn dna(&self) -> &Dna {
        &self.dna
    }

    pub fn dna_mut(&mut self) -> &mut Dna {
        &mut self.dna
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn completion_tick(&self) -> Option<u32> {
        match self.outcome {
            Outcome::Completed(tick) => Some(tick),
            _ => None,
        }
    }

    pub fn stuck_tick(&self) -> Option<u32> {
        match self.outcome {
            Outcome::Stuck(tick) => Some(tick),
            _ => None,
        }
    }

    /// Put the individual back on the start point; the DNA is kept
    pub fn reset(&mut self, start: Vec2) {
        self.position = start;
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
        self.fitness = 0.0;
        self.outcome = Outcome::Active;
    }

    /// Advance one tick. Frozen once completed or stuck.
    pub fn update(&mut self, tick: u32, env: &Environment, config: &SimulationConfig, rng: &mut impl Rng) {
        if self.outcome.is_terminal() {
            return;
        }

        if self.position.distance(env.target) < config.agent_radius {
            self.outcome = Outcome::Completed(tick);
            return;
        }

        if env.is_blocked(self.position) {
            self.velocity = Vec2::ZERO;
            self.acceleration = Vec2::ZERO;
            self.outcome = Outcome::Stuck(tick);
            return;
        }

        // The gene acts as a one-tick impulse
        self.acceleration += self.dna.gene(tick as usize, rng);
        self.velocity *= config.velocity_damping;
        self.velocity += self.acceleration;
        self.position += self.velocity;
        self.acceleration = Vec2::ZERO;
    }

    /// Score by distance to target, boosted by an early arrival and cut by
    /// getting stuck. Stores and returns the result.
    pub fn calc_fitness(&mut self, target: Vec2, stuck_penalty_divisor: f32) -> f32 {
        let distance_fitness = DISTANCE_FITNESS_SCALE / self.position.distance(target).max(1.0);

        self.fitness = match self.outcome {
            Outcome::Completed(tick) => {
                let time_bonus = 1.0 + 1.0 / tick.max(1) as f32;
                distance_fitness * time_bonus * time_bonus
            }
            Outcome::Stuck(_) => distance_fitness / stuck_penalty_divisor,
            Outcome::Active => distance_fitness,
        };
        self.fitness
    }

    /// Breed a child of `lifespan` genes with `partner`, then mutate it.
    /// Neither parent is modified.
    pub fn mate(
        &self,
        lifespan: usize,
        mutation_rate: f32,
        partner: &Individual,
        start: Vec2,
        rng: &mut impl Rng,
    ) -> Individual {
        let mut dna = self.dna.crossover(lifespan, &partner.dna, rng);
        let mutations = dna.mutate(mutation_rate, rng);
        let mut child = Individual::new(dna, start);
        child.mutation_count += mutations;
        child
    }
}
