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

use crate::{genetic::config::GeneticConfig, tune::err::TuneError};
use serde::{Deserialize, Serialize};

/// Inclusive integer search range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntRange {
    pub lo: u64,
    pub hi: u64,
}

impl IntRange {
    #[inline]
    pub const fn new(lo: u64, hi: u64) -> Self {
        Self { lo, hi }
    }

    /// Maps `x ∈ [0, 1]` onto the range, rounding to the nearest integer.
    #[inline]
    pub fn decode(&self, x: f64) -> u64 {
        let span = self.hi.saturating_sub(self.lo) as f64;
        let offset = (x.clamp(0.0, 1.0) * span).round() as u64;
        (self.lo + offset).min(self.hi)
    }

    #[inline]
    pub fn encode(&self, v: u64) -> f64 {
        let span = self.hi.saturating_sub(self.lo);
        if span == 0 {
            return 0.5;
        }
        (v.clamp(self.lo, self.hi) - self.lo) as f64 / span as f64
    }

    #[inline]
    pub fn contains(&self, v: u64) -> bool {
        (self.lo..=self.hi).contains(&v)
    }
}

/// The genetic solver parameters explored by the tuner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneticParams {
    pub generations: usize,
    pub population_size: usize,
    pub parents_mating: usize,
    pub mutation_percent_genes: f64,
    pub seed: u64,
}

impl GeneticParams {
    /// `base` with the tuned fields replaced.
    pub fn apply(&self, base: &GeneticConfig) -> GeneticConfig {
        base.clone()
            .with_generations(self.generations)
            .with_population_size(self.population_size)
            .with_parents_mating(self.parents_mating)
            .with_mutation_percent_genes(self.mutation_percent_genes)
            .with_seed(Some(self.seed))
    }
}

impl std::fmt::Display for GeneticParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "generations={} population={} parents={} mutation={}% seed={}",
            self.generations,
            self.population_size,
            self.parents_mating,
            self.mutation_percent_genes,
            self.seed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpace {
    pub generations: IntRange,
    pub population_size: IntRange,
    pub parents_mating: IntRange,
    pub mutation_percent_genes: IntRange,
    pub seed: IntRange,
}

impl Default for ParamSpace {
    fn default() -> Self {
        Self {
            generations: IntRange::new(100, 1000),
            population_size: IntRange::new(20, 200),
            parents_mating: IntRange::new(5, 50),
            mutation_percent_genes: IntRange::new(5, 50),
            seed: IntRange::new(0, 10_000),
        }
    }
}

impl ParamSpace {
    pub const DIMENSIONS: usize = 5;

    fn ranges(&self) -> [(&'static str, IntRange); Self::DIMENSIONS] {
        [
            ("generations", self.generations),
            ("population_size", self.population_size),
            ("parents_mating", self.parents_mating),
            ("mutation_percent_genes", self.mutation_percent_genes),
            ("seed", self.seed),
        ]
    }

    pub fn validate(&self) -> Result<(), TuneError> {
        for (name, r) in self.ranges() {
            if r.lo > r.hi {
                return Err(TuneError::InvalidRange {
                    name,
                    lo: r.lo,
                    hi: r.hi,
                });
            }
        }
        Ok(())
    }

    /// Maps a point of the unit cube onto concrete parameters.
    pub fn decode(&self, x: &[f64]) -> GeneticParams {
        let at = |i: usize| x.get(i).copied().unwrap_or(0.5);
        GeneticParams {
            generations: self.generations.decode(at(0)) as usize,
            population_size: self.population_size.decode(at(1)) as usize,
            parents_mating: self.parents_mating.decode(at(2)) as usize,
            mutation_percent_genes: self.mutation_percent_genes.decode(at(3)) as f64,
            seed: self.seed.decode(at(4)),
        }
    }

    pub fn encode(&self, p: &GeneticParams) -> Vec<f64> {
        vec![
            self.generations.encode(p.generations as u64),
            self.population_size.encode(p.population_size as u64),
            self.parents_mating.encode(p.parents_mating as u64),
            self.mutation_percent_genes
                .encode(p.mutation_percent_genes.round().max(0.0) as u64),
            self.seed.encode(p.seed),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_hits_both_ends() {
        let s = ParamSpace::default();
        let lo = s.decode(&[0.0; 5]);
        let hi = s.decode(&[1.0; 5]);
        assert_eq!(lo.generations, 100);
        assert_eq!(hi.generations, 1000);
        assert_eq!(lo.population_size, 20);
        assert_eq!(hi.parents_mating, 50);
        assert_eq!(hi.mutation_percent_genes, 50.0);
        assert_eq!(hi.seed, 10_000);
    }

    #[test]
    fn encode_inverts_decode_on_grid_points() {
        let s = ParamSpace::default();
        let p = s.decode(&[0.25, 0.5, 0.75, 0.1, 0.9]);
        assert_eq!(s.decode(&s.encode(&p)), p);
    }

    #[test]
    fn degenerate_range_is_fixed() {
        let r = IntRange::new(7, 7);
        assert_eq!(r.decode(0.0), 7);
        assert_eq!(r.decode(1.0), 7);
        assert_eq!(r.encode(7), 0.5);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let s = ParamSpace {
            parents_mating: IntRange::new(10, 5),
            ..ParamSpace::default()
        };
        assert!(matches!(
            s.validate(),
            Err(TuneError::InvalidRange { name: "parents_mating", .. })
        ));
    }

    #[test]
    fn apply_overrides_tuned_fields_only() {
        let base = GeneticConfig::default().with_keep_elitism(2);
        let p = GeneticParams {
            generations: 120,
            population_size: 30,
            parents_mating: 10,
            mutation_percent_genes: 15.0,
            seed: 99,
        };
        let c = p.apply(&base);
        assert_eq!(c.generations, 120);
        assert_eq!(c.population_size, 30);
        assert_eq!(c.seed, Some(99));
        assert_eq!(c.keep_elitism, 2);
    }
}
