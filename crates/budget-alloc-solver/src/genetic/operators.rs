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

use crate::genetic::config::{Crossover, ParentSelection};
use budget_alloc_core::{interval::Bounds, quantize::Quantizer};
use budget_alloc_model::problem::prob::Problem;
use rand::{
    Rng,
    distr::{Distribution, weighted::WeightedIndex},
    seq::index,
};

/// Per-gene admissible grids derived from a problem.
#[derive(Debug, Clone)]
pub struct GeneSpace {
    bounds: Vec<Bounds>,
    max_steps: Vec<u32>,
    mutable: Vec<usize>,
    quantizer: Quantizer,
}

impl GeneSpace {
    pub fn new(problem: &Problem, quantizer: Quantizer) -> Self {
        let bounds = problem.bounds();
        let max_steps: Vec<u32> = bounds.iter().map(|b| quantizer.max_steps(b)).collect();
        let mutable = max_steps
            .iter()
            .enumerate()
            .filter(|(_, k)| **k > 0)
            .map(|(i, _)| i)
            .collect();
        Self {
            bounds,
            max_steps,
            mutable,
            quantizer,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Genes with at least one step of freedom.
    #[inline]
    pub fn mutable(&self) -> &[usize] {
        &self.mutable
    }

    #[inline]
    pub fn bounds(&self, gene: usize) -> &Bounds {
        &self.bounds[gene]
    }

    pub fn baseline(&self) -> Vec<f64> {
        self.bounds.iter().map(Bounds::lo).collect()
    }

    /// Uniformly random grid point per gene; frozen genes stay at their baseline.
    pub fn random_individual<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.bounds
            .iter()
            .zip(&self.max_steps)
            .map(|(b, &max)| {
                if max == 0 {
                    b.lo()
                } else {
                    self.quantizer.value_at(b, rng.random_range(0..=max))
                }
            })
            .collect()
    }

    #[inline]
    pub fn snap(&self, gene: usize, value: f64) -> f64 {
        self.quantizer.snap(&self.bounds[gene], value)
    }
}

/// Indices of individuals in descending fitness order, ties by index.
pub fn ranked(fitness: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]).then(a.cmp(&b)));
    order
}

fn weighted_draws<R: Rng + ?Sized>(weights: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
    match WeightedIndex::new(weights) {
        Ok(dist) => (0..count).map(|_| dist.sample(rng)).collect(),
        Err(_) => (0..count)
            .map(|_| rng.random_range(0..weights.len()))
            .collect(),
    }
}

pub fn select_parents<R: Rng + ?Sized>(
    selection: ParentSelection,
    fitness: &[f64],
    count: usize,
    rng: &mut R,
) -> Vec<usize> {
    let n = fitness.len();
    if n == 0 || count == 0 {
        return Vec::new();
    }

    match selection {
        ParentSelection::SteadyState => ranked(fitness).into_iter().take(count).collect(),
        ParentSelection::Rank => {
            let order = ranked(fitness);
            let mut weights = vec![0.0; n];
            for (pos, &i) in order.iter().enumerate() {
                weights[i] = (n - pos) as f64;
            }
            weighted_draws(&weights, count, rng)
        }
        ParentSelection::RouletteWheel => {
            let min = fitness.iter().copied().fold(f64::INFINITY, f64::min);
            let weights: Vec<f64> = fitness.iter().map(|f| f - min + 1e-9).collect();
            weighted_draws(&weights, count, rng)
        }
        ParentSelection::Tournament { size } => (0..count)
            .map(|_| {
                (0..size.max(1))
                    .map(|_| rng.random_range(0..n))
                    .max_by(|&a, &b| fitness[a].total_cmp(&fitness[b]).then(b.cmp(&a)))
                    .unwrap_or(0)
            })
            .collect(),
    }
}

pub fn crossover<R: Rng + ?Sized>(kind: Crossover, a: &[f64], b: &[f64], rng: &mut R) -> Vec<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return a.to_vec();
    }

    match kind {
        Crossover::SinglePoint => {
            let p = rng.random_range(1..n);
            a[..p].iter().chain(&b[p..n]).copied().collect()
        }
        Crossover::TwoPoint if n >= 3 => {
            let p = rng.random_range(1..n - 1);
            let q = rng.random_range(p + 1..n);
            a[..p]
                .iter()
                .chain(&b[p..q])
                .chain(&a[q..n])
                .copied()
                .collect()
        }
        Crossover::TwoPoint => {
            let p = rng.random_range(1..n);
            a[..p].iter().chain(&b[p..n]).copied().collect()
        }
        Crossover::Uniform => (0..n)
            .map(|i| if rng.random_bool(0.5) { a[i] } else { b[i] })
            .collect(),
    }
}

/// Perturbs `round(percent · mutable / 100)` distinct mutable genes (at least one)
/// by a uniform draw from `range` and snaps them back onto their grid.
pub fn mutate<R: Rng + ?Sized>(
    space: &GeneSpace,
    genes: &mut [f64],
    percent: f64,
    range: (f64, f64),
    rng: &mut R,
) {
    let mutable = space.mutable();
    if mutable.is_empty() || percent <= 0.0 {
        return;
    }
    let m = mutable.len();
    let count = ((percent / 100.0 * m as f64).round() as usize).clamp(1, m);

    for pick in index::sample(rng, m, count) {
        let gene = mutable[pick];
        let delta = rng.random_range(range.0..=range.1);
        genes[gene] = space.snap(gene, genes[gene] + delta);
    }
}
