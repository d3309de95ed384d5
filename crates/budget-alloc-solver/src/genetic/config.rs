// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crate::{
    eval::fitness::{DEFAULT_FROZEN_REJECTION, DEFAULT_PENALTY_FACTOR},
    genetic::err::GeneticConfigError,
};
use budget_alloc_core::quantize::DEFAULT_STEP;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParentSelection {
    /// The fittest individuals, in fitness order.
    SteadyState,
    /// Sampling proportional to fitness rank.
    Rank,
    /// Sampling proportional to fitness shifted above zero.
    RouletteWheel,
    Tournament { size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Crossover {
    SinglePoint,
    TwoPoint,
    Uniform,
}

/// Configuration of one genetic run. Field defaults follow the production
/// setup the allocation engine was tuned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    pub population_size: usize,
    pub generations: usize,
    pub parents_mating: usize,
    /// Share of mutable genes perturbed in every offspring, in percent.
    pub mutation_percent_genes: f64,
    /// Uniform perturbation added to a mutated gene before snapping.
    pub mutation_range: (f64, f64),
    /// Stop after this many consecutive generations without improvement.
    pub saturation: Option<usize>,
    pub keep_elitism: usize,
    pub parent_selection: ParentSelection,
    pub crossover: Crossover,
    pub penalty_factor: f64,
    pub frozen_rejection: f64,
    pub step: f64,
    pub time_limit: Option<Duration>,
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 45,
            generations: 500,
            parents_mating: 20,
            mutation_percent_genes: 20.0,
            mutation_range: (-1.0, 1.0),
            saturation: Some(10),
            keep_elitism: 1,
            parent_selection: ParentSelection::SteadyState,
            crossover: Crossover::SinglePoint,
            penalty_factor: DEFAULT_PENALTY_FACTOR,
            frozen_rejection: DEFAULT_FROZEN_REJECTION,
            step: DEFAULT_STEP,
            time_limit: None,
            seed: None,
        }
    }
}

impl GeneticConfig {
    pub fn validate(&self) -> Result<(), GeneticConfigError> {
        if self.population_size < 2 {
            return Err(GeneticConfigError::PopulationTooSmall(self.population_size));
        }
        if self.parents_mating == 0 {
            return Err(GeneticConfigError::ZeroParents);
        }
        if self.parents_mating > self.population_size {
            return Err(GeneticConfigError::ParentsExceedPopulation {
                parents: self.parents_mating,
                population: self.population_size,
            });
        }
        if self.keep_elitism >= self.population_size {
            return Err(GeneticConfigError::ElitismExceedsPopulation {
                elitism: self.keep_elitism,
                population: self.population_size,
            });
        }
        let pct = self.mutation_percent_genes;
        if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
            return Err(GeneticConfigError::InvalidMutationPercent(pct));
        }
        let (lo, hi) = self.mutation_range;
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(GeneticConfigError::InvalidMutationRange { lo, hi });
        }
        if !self.penalty_factor.is_finite() || self.penalty_factor <= 0.0 {
            return Err(GeneticConfigError::InvalidPenaltyFactor(self.penalty_factor));
        }
        if !self.frozen_rejection.is_finite() || self.frozen_rejection >= 0.0 {
            return Err(GeneticConfigError::InvalidFrozenRejection(self.frozen_rejection));
        }
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(GeneticConfigError::InvalidStep(self.step));
        }
        if let ParentSelection::Tournament { size } = self.parent_selection
            && size == 0
        {
            return Err(GeneticConfigError::InvalidTournamentSize(size));
        }
        Ok(())
    }

    #[inline]
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }
    #[inline]
    pub fn with_generations(mut self, n: usize) -> Self {
        self.generations = n;
        self
    }
    #[inline]
    pub fn with_parents_mating(mut self, n: usize) -> Self {
        self.parents_mating = n;
        self
    }
    #[inline]
    pub fn with_mutation_percent_genes(mut self, pct: f64) -> Self {
        self.mutation_percent_genes = pct;
        self
    }
    #[inline]
    pub fn with_mutation_range(mut self, lo: f64, hi: f64) -> Self {
        self.mutation_range = (lo, hi);
        self
    }
    #[inline]
    pub fn with_saturation(mut self, generations: Option<usize>) -> Self {
        self.saturation = generations;
        self
    }
    #[inline]
    pub fn with_keep_elitism(mut self, n: usize) -> Self {
        self.keep_elitism = n;
        self
    }
    #[inline]
    pub fn with_parent_selection(mut self, s: ParentSelection) -> Self {
        self.parent_selection = s;
        self
    }
    #[inline]
    pub fn with_crossover(mut self, c: Crossover) -> Self {
        self.crossover = c;
        self
    }
    #[inline]
    pub fn with_penalty_factor(mut self, k: f64) -> Self {
        self.penalty_factor = k;
        self
    }
    #[inline]
    pub fn with_frozen_rejection(mut self, v: f64) -> Self {
        self.frozen_rejection = v;
        self
    }
    #[inline]
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }
    #[inline]
    pub fn with_time_limit(mut self, d: Option<Duration>) -> Self {
        self.time_limit = d;
        self
    }
    #[inline]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

impl fmt::Display for GeneticConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GeneticConfig{{ population: {}, generations: {}, parents: {}, mutation: {}%, \
             saturation: {:?}, elitism: {}, selection: {:?}, crossover: {:?}, seed: {:?} }}",
            self.population_size,
            self.generations,
            self.parents_mating,
            self.mutation_percent_genes,
            self.saturation,
            self.keep_elitism,
            self.parent_selection,
            self.crossover,
            self.seed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = GeneticConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.population_size, 45);
        assert_eq!(c.parents_mating, 20);
        assert_eq!(c.saturation, Some(10));
    }

    #[test]
    fn parents_cannot_exceed_population() {
        let c = GeneticConfig::default()
            .with_population_size(10)
            .with_parents_mating(11);
        assert!(matches!(
            c.validate(),
            Err(GeneticConfigError::ParentsExceedPopulation { .. })
        ));
    }

    #[test]
    fn rejects_degenerate_settings() {
        let base = GeneticConfig::default();
        assert!(base.clone().with_population_size(1).validate().is_err());
        assert!(base.clone().with_parents_mating(0).validate().is_err());
        assert!(base.clone().with_keep_elitism(45).validate().is_err());
        assert!(base.clone().with_mutation_percent_genes(120.0).validate().is_err());
        assert!(base.clone().with_mutation_range(1.0, -1.0).validate().is_err());
        assert!(base.clone().with_penalty_factor(0.0).validate().is_err());
        assert!(base.clone().with_frozen_rejection(5.0).validate().is_err());
        assert!(base.clone().with_step(0.0).validate().is_err());
        assert!(
            base.with_parent_selection(ParentSelection::Tournament { size: 0 })
                .validate()
                .is_err()
        );
    }

    #[test]
    fn round_trips_through_json() {
        let c = GeneticConfig::default()
            .with_seed(Some(42))
            .with_time_limit(Some(Duration::from_millis(250)))
            .with_parent_selection(ParentSelection::Tournament { size: 3 });
        let json = serde_json::to_string(&c).unwrap();
        let back: GeneticConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, c);
    }
}
