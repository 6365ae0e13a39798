use bevy::math::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

/// A random gene: uniformly random unit direction limited to `max_force`
pub fn random_gene(rng: &mut impl Rng, max_force: f32) -> Vec2 {
    Vec2::from_angle(rng.gen_range(0.0..TAU)).clamp_length_max(max_force)
}

/// Per-tick force vectors driving one individual.
///
/// Reading past the end appends fresh random genes, so the sequence only
/// grows. Growth mutates the sequence through `&mut self`; a `Dna` must stay
/// owned by a single individual and is never shared between threads.
#[derive(Debug, Clone, PartialEq)]
pub struct Dna {
    genes: Vec<Vec2>,
    max_force: f32,
}

impl Dna {
    /// Create `length` independent random genes
    pub fn random(length: usize, max_force: f32, rng: &mut impl Rng) -> Self {
        let genes = (0..length).map(|_| random_gene(rng, max_force)).collect();
        Self { genes, max_force }
    }

    /// Wrap an existing gene sequence
    pub fn from_genes(genes: Vec<Vec2>, max_force: f32) -> Self {
        Self { genes, max_force }
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn genes(&self) -> &[Vec2] {
        &self.genes
    }

    pub fn max_force(&self) -> f32 {
        self.max_force
    }

    /// Gene for `tick`, growing the sequence with random genes up to and
    /// including `tick` if it is not long enough yet
    pub fn gene(&mut self, tick: usize, rng: &mut impl Rng) -> Vec2 {
        while self.genes.len() <= tick {
            self.genes.push(random_gene(rng, self.max_force));
        }
        self.genes[tick]
    }

    /// Single-point crossover producing a child of exactly `length` genes.
    ///
    /// Genes after a random split point (and inside this parent's length)
    /// come from `self`; every other position comes from `partner` when it
    /// has one, otherwise a fresh random gene fills the extension.
    pub fn crossover(&self, length: usize, partner: &Dna, rng: &mut impl Rng) -> Dna {
        let mid = if self.genes.is_empty() {
            0
        } else {
            rng.gen_range(0..self.genes.len())
        };

        let genes = (0..length)
            .map(|i| {
                if i > mid && i < self.genes.len() {
                    self.genes[i]
                } else if i < partner.genes.len() {
                    partner.genes[i]
                } else {
                    random_gene(rng, self.max_force)
                }
            })
            .collect();

        Dna {
            genes,
            max_force: self.max_force,
        }
    }

    /// Replace each gene with a random one at probability `rate`; returns how
    /// many genes were replaced
    pub fn mutate(&mut self, rate: f32, rng: &mut impl Rng) -> usize {
        let mut count = 0;
        for gene in self.genes.iter_mut() {
            if rng.r#gen::<f32>() < rate {
                *gene = random_gene(rng, self.max_force);
                count += 1;
            }
        }
        count
    }
}
