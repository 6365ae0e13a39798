use crate::config::*;
use crate::environment::Environment;
use crate::individual::Individual;
use bevy::log::{debug, info, warn};
use bevy::prelude::Resource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Total, lowest and highest fitness over one evaluated population
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessSummary {
    pub total: f32,
    pub min: f32,
    pub max: f32,
}

impl Default for FitnessSummary {
    fn default() -> Self {
        Self {
            total: 0.0,
            min: 0.0,
            max: 0.0,
        }
    }
}

/// Archived record of one finished generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStats {
    pub generation: u32,
    /// Tick budget the generation ran with
    pub lifespan: u32,
    /// Tick budget handed to the following generation
    pub next_lifespan: u32,
    pub fitness: FitnessSummary,
    pub completed: usize,
    pub stuck: usize,
    pub survivors: usize,
    pub new_children: usize,
    pub mutations: usize,
    pub total_genes: usize,
}

/// Run-wide maxima, used to scale charts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverallStats {
    pub best_fitness: f32,
    pub highest_total_fitness: f32,
    pub max_mutations: usize,
}

/// Fitness-proportionate pick: subtract each fitness from `threshold` in
/// order and return the index where it first drops to zero or below.
///
/// Falls back to the last index when rounding keeps the remainder positive.
/// Returns `None` only for an empty pool.
pub fn roulette_select(fitness: impl IntoIterator<Item = f32>, threshold: f32) -> Option<usize> {
    let mut remaining = threshold;
    let mut last = None;
    for (index, value) in fitness.into_iter().enumerate() {
        remaining -= value;
        last = Some(index);
        if remaining <= 0.0 {
            return Some(index);
        }
    }
    last
}

/// Lifespan after a generation that did not improve on the best fitness
pub fn grown_lifespan(lifespan: u32, growth_rate: f32) -> u32 {
    let growth = ((lifespan as f32 * growth_rate).floor() as u32).min(MAX_LIFESPAN_GROWTH);
    lifespan.saturating_add(growth)
}

/// Owns every individual and drives the generation lifecycle: tick the
/// population until the lifespan runs out, then evaluate, prune and breed
/// the next cohort.
#[derive(Resource, Debug)]
pub struct Population {
    config: SimulationConfig,
    environment: Environment,
    individuals: Vec<Individual>,
    rng: StdRng,
    lifespan: u32,
    tick: u32,
    generation: u32,
    paused: bool,
    last_fitness: FitnessSummary,
    mutation_count: usize,
    new_children: usize,
    total_genes: usize,
    overall: OverallStats,
    history: Vec<GenerationStats>,
}

impl Population {
    /// Validate the run and seed the first generation with random DNA
    pub fn new(config: SimulationConfig, environment: Environment) -> Result<Self, ConfigError> {
        config.validate()?;
        environment.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let lifespan = config.lifespan;
        let individuals: Vec<Individual> = (0..config.population_size)
            .map(|_| Individual::random(lifespan as usize, &config, environment.start, &mut rng))
            .collect();

        info!(
            "Created population of {} individuals with lifespan {}",
            individuals.len(),
            lifespan
        );

        Ok(Self {
            total_genes: individuals.len() * lifespan as usize,
            new_children: individuals.len(),
            individuals,
            rng,
            lifespan,
            tick: 0,
            generation: 1,
            paused: false,
            last_fitness: FitnessSummary::default(),
            mutation_count: 0,
            overall: OverallStats::default(),
            history: Vec::new(),
            config,
            environment,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn population_size(&self) -> usize {
        self.config.population_size
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn lifespan(&self) -> u32 {
        self.lifespan
    }

    /// Fitness summary of the most recently evaluated generation
    pub fn last_fitness(&self) -> FitnessSummary {
        self.last_fitness
    }

    /// Mutations made while producing the current generation
    pub fn mutation_count(&self) -> usize {
        self.mutation_count
    }

    /// Children bred into the current generation
    pub fn new_children(&self) -> usize {
        self.new_children
    }

    /// Genes stored across the current generation
    pub fn total_genes(&self) -> usize {
        self.total_genes
    }

    pub fn overall(&self) -> OverallStats {
        self.overall
    }

    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Advance every individual one tick unless paused. Returns `false` once
    /// the lifespan is used up; the caller then calls [`Population::regenerate`].
    pub fn step(&mut self) -> bool {
        if self.paused {
            return true;
        }
        self.advance()
    }

    fn advance(&mut self) -> bool {
        let tick = self.tick;
        for individual in self.individuals.iter_mut() {
            individual.update(tick, &self.environment, &self.config, &mut self.rng);
        }
        self.tick += 1;
        self.tick < self.lifespan
    }

    /// Tick through the rest of the current generation, ignoring the pause
    /// flag, then regenerate
    pub fn run_generation(&mut self) -> GenerationStats {
        while self.tick < self.lifespan {
            self.advance();
        }
        self.regenerate()
    }

    /// Evaluate the finished generation, adapt the lifespan, prune, breed
    /// back up to the configured size and reset everyone for the next run
    pub fn regenerate(&mut self) -> GenerationStats {
        let ran_for = self.lifespan;
        let summary = self.evaluate();
        let completed = self.individuals.iter().filter(|i| i.completion_tick().is_some()).count();
        let stuck = self.individuals.iter().filter(|i| i.stuck_tick().is_some()).count();

        self.generation += 1;
        self.overall.highest_total_fitness = self.overall.highest_total_fitness.max(summary.total);
        if summary.max > self.overall.best_fitness {
            self.overall.best_fitness = summary.max;
        } else {
            let grown = grown_lifespan(self.lifespan, self.config.lifespan_growth_rate);
            debug!("Fitness did not improve, lifespan {} -> {}", self.lifespan, grown);
            self.lifespan = grown;
        }
        self.lifespan = self.lifespan.max(MIN_LIFESPAN);
        self.last_fitness = summary;
        self.tick = 0;
        self.mutation_count = 0;

        let mean = summary.total / self.individuals.len() as f32;
        let survivor_fitness = self.prune(mean);
        let survivors = self.individuals.len();
        self.reproduce(survivor_fitness);
        self.new_children = self.config.population_size - survivors;

        let start = self.environment.start;
        for individual in self.individuals.iter_mut() {
            individual.reset(start);
        }
        self.total_genes = self.individuals.iter().map(|i| i.dna().len()).sum();
        self.overall.max_mutations = self.overall.max_mutations.max(self.mutation_count);

        let stats = GenerationStats {
            generation: self.generation - 1,
            lifespan: ran_for,
            next_lifespan: self.lifespan,
            fitness: summary,
            completed,
            stuck,
            survivors,
            new_children: self.new_children,
            mutations: self.mutation_count,
            total_genes: self.total_genes,
        };
        info!(
            "Generation {} done: max fitness {:.2}, total {:.2}, {} completed, {} stuck, {} survivors, next lifespan {}",
            stats.generation,
            summary.max,
            summary.total,
            completed,
            stuck,
            survivors,
            self.lifespan
        );
        self.history.push(stats.clone());
        stats
    }

    /// Score everyone. If the whole population finished early, the next
    /// lifespan shrinks to the last terminal tick.
    fn evaluate(&mut self) -> FitnessSummary {
        let target = self.environment.target;
        let divisor = self.config.stuck_penalty_divisor;

        let mut summary = FitnessSummary {
            total: 0.0,
            min: f32::INFINITY,
            max: 0.0,
        };
        let mut done = 0;
        let mut last_tick = 0;

        for individual in self.individuals.iter_mut() {
            let fitness = individual.calc_fitness(target, divisor);
            if let Some(tick) = individual.outcome().tick() {
                done += 1;
                last_tick = last_tick.max(tick);
            }
            summary.total += fitness;
            summary.min = summary.min.min(fitness);
            summary.max = summary.max.max(fitness);
        }

        if done == self.individuals.len() {
            let shrunk = last_tick.max(MIN_LIFESPAN);
            debug!("Every individual finished by tick {}, lifespan {} -> {}", last_tick, self.lifespan, shrunk);
            self.lifespan = shrunk;
        }
        summary
    }

    /// Keep individuals above `mean` fitness plus a random share of the rest,
    /// occasionally mutating a keeper in place. Returns the survivors' total
    /// fitness.
    fn prune(&mut self, mean: f32) -> f32 {
        let mut total = 0.0;
        let candidates = std::mem::take(&mut self.individuals);
        for mut individual in candidates {
            let keep = individual.fitness() > mean || self.rng.r#gen::<f32>() < self.config.prune_save_rate;
            if !keep {
                continue;
            }
            total += individual.fitness();
            if self.rng.r#gen::<f32>() < self.config.prune_mutate_rate {
                self.mutation_count += individual.dna_mut().mutate(self.config.mutation_rate, &mut self.rng);
            }
            self.individuals.push(individual);
        }
        total
    }

    /// Breed children from the survivors until the population is full again
    fn reproduce(&mut self, survivor_fitness: f32) {
        let target = self.config.population_size;
        let survivors = self.individuals.len();
        let lifespan = self.lifespan as usize;
        let start = self.environment.start;

        if survivors == 0 {
            warn!("No individuals survived pruning, seeding {} random individuals", target);
            for _ in 0..target {
                let individual = Individual::random(lifespan, &self.config, start, &mut self.rng);
                self.individuals.push(individual);
            }
            return;
        }
        if survivor_fitness <= 0.0 || !survivor_fitness.is_finite() {
            warn!("Survivors have no usable fitness ({}), picking parents uniformly", survivor_fitness);
        }

        let mut children = Vec::with_capacity(target.saturating_sub(survivors));
        for _ in survivors..target {
            let a = self.pick_parent(survivors, survivor_fitness);
            let b = self.pick_parent(survivors, survivor_fitness);
            let child = self.individuals[a].mate(
                lifespan,
                self.config.mutation_rate,
                &self.individuals[b],
                start,
                &mut self.rng,
            );
            self.mutation_count += child.mutation_count;
            children.push(child);
        }
        self.individuals.extend(children);
    }

    /// Roulette-wheel pick among the first `count` individuals. Both parents
    /// of a child are picked independently, so an individual may mate with
    /// itself.
    fn pick_parent(&mut self, count: usize, total_fitness: f32) -> usize {
        if total_fitness > 0.0 && total_fitness.is_finite() {
            let threshold = self.rng.gen_range(0.0..total_fitness);
            roulette_select(self.individuals[..count].iter().map(Individual::fitness), threshold).unwrap_or(0)
        } else {
            self.rng.gen_range(0..count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dna::Dna;
    use crate::environment::Shape;
    use crate::individual::Outcome;

    fn seeded(size: usize, lifespan: u32) -> SimulationConfig {
        SimulationConfig {
            population_size: size,
            lifespan,
            seed: Some(42),
            ..Default::default()
        }
    }

    fn walled_in_start() -> Environment {
        let env = Environment::new(600.0, 600.0);
        let start = env.start;
        env.with_obstacle(Shape::rect(start.x - 20.0, start.y - 20.0, 40.0, 40.0))
    }

    #[test]
    fn roulette_walks_cumulative_fitness() {
        let pool = [10.0, 30.0, 60.0];
        for (threshold, expected) in [
            (0.0, 0),
            (5.0, 0),
            (10.0, 0),
            (10.5, 1),
            (15.0, 1),
            (40.0, 1),
            (40.5, 2),
            (99.9, 2),
        ] {
            assert_eq!(
                roulette_select(pool, threshold),
                Some(expected),
                "threshold {threshold}"
            );
        }
    }

    #[test]
    fn roulette_edge_cases() {
        assert_eq!(roulette_select([0.0f32; 0], 3.0), None);
        assert_eq!(roulette_select([1.0, 2.0], 50.0), Some(1));
        assert_eq!(roulette_select([0.0, 0.0, 0.0], 0.0), Some(0));
    }

    #[test]
    fn lifespan_growth_is_floored_and_capped() {
        assert_eq!(grown_lifespan(100, 0.1), 110);
        assert_eq!(grown_lifespan(15, 0.1), 16);
        assert_eq!(grown_lifespan(10, 0.05), 10);
        assert_eq!(grown_lifespan(2000, 0.1), 2100);
        assert_eq!(grown_lifespan(100, 0.0), 100);
    }

    #[test]
    fn new_population_is_full_and_fresh() {
        let population = Population::new(seeded(20, 30), Environment::default()).unwrap();
        assert_eq!(population.individuals().len(), 20);
        assert_eq!(population.generation(), 1);
        assert_eq!(population.tick(), 0);
        assert_eq!(population.lifespan(), 30);
        assert_eq!(population.total_genes(), 600);
        assert!(population.individuals().iter().all(|i| i.dna().len() == 30));
    }

    #[test]
    fn rejects_invalid_config() {
        let config = SimulationConfig {
            prune_save_rate: 1.5,
            ..Default::default()
        };
        assert!(Population::new(config, Environment::default()).is_err());
        assert!(Population::new(SimulationConfig::default(), Environment::new(-1.0, 10.0)).is_err());
    }

    #[test]
    fn step_reports_end_of_lifespan() {
        let mut population = Population::new(seeded(5, 10), Environment::default()).unwrap();
        for _ in 0..9 {
            assert!(population.step());
        }
        assert!(!population.step());
        assert_eq!(population.tick(), 10);
    }

    #[test]
    fn paused_step_changes_nothing() {
        let mut population = Population::new(seeded(5, 10), Environment::default()).unwrap();
        population.pause();
        let before: Vec<_> = population.individuals().iter().map(|i| i.position()).collect();
        for _ in 0..20 {
            assert!(population.step());
        }
        assert_eq!(population.tick(), 0);
        let after: Vec<_> = population.individuals().iter().map(|i| i.position()).collect();
        assert_eq!(before, after);

        assert!(!population.toggle_pause());
        population.step();
        assert_eq!(population.tick(), 1);
    }

    #[test]
    fn prune_keeps_above_mean_without_save_rate() {
        let config = SimulationConfig {
            prune_save_rate: 0.0,
            prune_mutate_rate: 0.0,
            ..seeded(5, 20)
        };
        let mut population = Population::new(config, Environment::default()).unwrap();
        for (individual, fitness) in population.individuals.iter_mut().zip([1.0, 2.0, 3.0, 4.0, 10.0]) {
            individual.fitness = fitness;
        }

        let survivor_fitness = population.prune(4.0);
        assert_eq!(survivor_fitness, 10.0);
        assert_eq!(population.individuals().len(), 1);
        assert_eq!(population.individuals()[0].fitness(), 10.0);
        assert_eq!(population.mutation_count(), 0);
    }

    #[test]
    fn prune_save_rate_one_keeps_everyone() {
        let config = SimulationConfig {
            prune_save_rate: 1.0,
            ..seeded(8, 20)
        };
        let mut population = Population::new(config, Environment::default()).unwrap();
        for individual in population.individuals.iter_mut() {
            individual.fitness = 1.0;
        }
        assert_eq!(population.prune(5.0), 8.0);
        assert_eq!(population.individuals().len(), 8);
    }

    #[test]
    fn prune_mutates_keepers_in_place() {
        let config = SimulationConfig {
            prune_save_rate: 1.0,
            prune_mutate_rate: 1.0,
            mutation_rate: 1.0,
            ..seeded(6, 20)
        };
        let mut population = Population::new(config, Environment::default()).unwrap();
        for individual in population.individuals.iter_mut() {
            individual.fitness = 1.0;
        }
        let before: Vec<Dna> = population.individuals().iter().map(|i| i.dna().clone()).collect();

        population.prune(5.0);
        assert_eq!(population.individuals().len(), 6);
        for (individual, original) in population.individuals().iter().zip(&before) {
            assert_eq!(individual.dna().len(), original.len());
            assert_ne!(individual.dna(), original);
        }
        assert_eq!(population.mutation_count(), 6 * 20);
    }

    #[test]
    fn single_survivor_mates_with_itself() {
        let config = SimulationConfig {
            mutation_rate: 0.0,
            ..seeded(6, 20)
        };
        let mut population = Population::new(config, Environment::default()).unwrap();
        population.individuals.truncate(1);
        population.individuals[0].fitness = 3.0;
        let parent = population.individuals()[0].dna().clone();

        population.reproduce(3.0);
        assert_eq!(population.individuals().len(), 6);
        for child in &population.individuals()[1..] {
            assert_eq!(child.dna(), &parent);
        }
        assert_eq!(population.mutation_count(), 0);
    }

    #[test]
    fn reproduce_with_zero_fitness_survivors_refills() {
        let mut population = Population::new(seeded(10, 20), Environment::default()).unwrap();
        population.individuals.truncate(3);
        for individual in population.individuals.iter_mut() {
            individual.fitness = 0.0;
        }
        population.reproduce(0.0);
        assert_eq!(population.individuals().len(), 10);
    }

    #[test]
    fn reproduce_without_survivors_reseeds() {
        let mut population = Population::new(seeded(10, 20), Environment::default()).unwrap();
        population.individuals.clear();
        population.reproduce(0.0);
        assert_eq!(population.individuals().len(), 10);
        assert!(population.individuals().iter().all(|i| i.dna().len() == 20));
    }

    #[test]
    fn children_match_current_lifespan() {
        let mut population = Population::new(seeded(10, 20), Environment::default()).unwrap();
        population.individuals.truncate(4);
        for individual in population.individuals.iter_mut() {
            individual.fitness = 2.5;
        }
        population.lifespan = 35;
        population.reproduce(10.0);
        assert_eq!(population.individuals().len(), 10);
        assert!(population.individuals()[4..].iter().all(|i| i.dna().len() == 35));
    }

    #[test]
    fn regenerate_restores_size_and_resets() {
        let mut population = Population::new(seeded(30, 40), Environment::default()).unwrap();
        for generation in 1..=6 {
            let stats = population.run_generation();
            assert_eq!(stats.generation, generation);
            assert_eq!(population.generation(), generation + 1);
            assert_eq!(population.individuals().len(), 30);
            assert_eq!(stats.survivors + stats.new_children, 30);
            assert_eq!(population.tick(), 0);
            assert!(population.lifespan() >= MIN_LIFESPAN);

            let start = population.environment().start;
            for individual in population.individuals() {
                assert_eq!(individual.position(), start);
                assert_eq!(individual.outcome(), Outcome::Active);
                assert_eq!(individual.fitness(), 0.0);
            }
        }
        assert_eq!(population.history().len(), 6);
        let best = population.history().iter().map(|s| s.fitness.max).fold(0.0, f32::max);
        assert_eq!(population.overall().best_fitness, best);
    }

    #[test]
    fn lifespan_shrinks_when_everyone_finishes_early() {
        let mut population = Population::new(seeded(10, 50), walled_in_start()).unwrap();
        let stats = population.run_generation();
        assert_eq!(stats.stuck, 10);
        assert_eq!(stats.lifespan, 50);
        assert_eq!(population.lifespan(), MIN_LIFESPAN);

        // Identical stuck scores do not beat the best, so the lifespan grows
        // again after shrinking.
        population.run_generation();
        assert_eq!(population.lifespan(), grown_lifespan(MIN_LIFESPAN, population.config().lifespan_growth_rate));
    }

    #[test]
    fn same_seed_same_history() {
        let run = || {
            let mut population = Population::new(seeded(15, 25), Environment::default()).unwrap();
            for _ in 0..4 {
                population.run_generation();
            }
            population.history().to_vec()
        };
        assert_eq!(run(), run());
    }
}
