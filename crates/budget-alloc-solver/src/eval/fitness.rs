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

use budget_alloc_core::tolerance::{VALUE_TOLERANCE, within_budget};
use budget_alloc_model::problem::prob::Problem;
use serde::{Deserialize, Serialize};

/// Multiplier applied to the budget overrun of an infeasible candidate.
pub const DEFAULT_PENALTY_FACTOR: f64 = 1000.0;

/// Fitness of a candidate that moves a frozen indicator.
pub const DEFAULT_FROZEN_REJECTION: f64 = -10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feasibility {
    Feasible,
    OverBudget,
    FrozenPerturbed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub fitness: f64,
    pub score: f64,
    pub resource_used: f64,
    pub feasibility: Feasibility,
}

impl Evaluation {
    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.feasibility == Feasibility::Feasible
    }
}

/// Soft-constraint fitness shared by the genetic solver and its callers.
///
/// Scores are non-negative for any in-bounds vector, so every over-budget or
/// frozen-violating candidate ranks strictly below every feasible one.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator<'p> {
    problem: &'p Problem,
    frozen: Vec<usize>,
    penalty_factor: f64,
    frozen_rejection: f64,
}

impl<'p> FitnessEvaluator<'p> {
    pub fn new(problem: &'p Problem) -> Self {
        let frozen = problem
            .iter()
            .enumerate()
            .filter(|(_, ind)| ind.is_frozen())
            .map(|(i, _)| i)
            .collect();
        Self {
            problem,
            frozen,
            penalty_factor: DEFAULT_PENALTY_FACTOR,
            frozen_rejection: DEFAULT_FROZEN_REJECTION,
        }
    }

    #[inline]
    pub fn with_penalty_factor(mut self, k: f64) -> Self {
        self.penalty_factor = k;
        self
    }

    #[inline]
    pub fn with_frozen_rejection(mut self, sentinel: f64) -> Self {
        self.frozen_rejection = sentinel;
        self
    }

    #[inline]
    pub fn problem(&self) -> &'p Problem {
        self.problem
    }

    pub fn evaluate(&self, values: &[f64]) -> Evaluation {
        debug_assert_eq!(values.len(), self.problem.len());
        let indicators = self.problem.indicators();

        let perturbed = self.frozen.iter().any(|&i| {
            let base = indicators[i].baseline();
            (values[i] - base).abs() > VALUE_TOLERANCE
        });

        let score = self.problem.score_of(values);
        let resource_used = self.problem.resource_of(values);

        if perturbed {
            return Evaluation {
                fitness: self.frozen_rejection,
                score,
                resource_used,
                feasibility: Feasibility::FrozenPerturbed,
            };
        }

        let budget = self.problem.budget();
        if !within_budget(resource_used, budget) {
            return Evaluation {
                fitness: -self.penalty_factor * (resource_used - budget),
                score,
                resource_used,
                feasibility: Feasibility::OverBudget,
            };
        }

        Evaluation {
            fitness: score,
            score,
            resource_used,
            feasibility: Feasibility::Feasible,
        }
    }

    #[inline]
    pub fn fitness(&self, values: &[f64]) -> f64 {
        self.evaluate(values).fitness
    }
}
