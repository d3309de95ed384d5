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
    problem::{
        indicator::{IndicatorKey, UnitCost},
        prob::Problem,
    },
    solution::err::SolutionError,
};
use budget_alloc_core::tolerance::{VALUE_TOLERANCE, within_budget};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionEntry {
    pub key: IndicatorKey,
    pub baseline: f64,
    pub value: f64,
    pub weight: f64,
    pub unit_cost: UnitCost,
}

impl SolutionEntry {
    #[inline]
    pub fn delta(&self) -> f64 {
        self.value - self.baseline
    }

    #[inline]
    pub fn contribution(&self) -> f64 {
        self.value * self.weight
    }

    #[inline]
    pub fn cost(&self) -> f64 {
        self.unit_cost.cost_of(self.delta())
    }
}

/// New indicator values produced by a solver, in problem order, together with
/// the derived score and resource usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    entries: Vec<SolutionEntry>,
    score: f64,
    resource_used: f64,
}

impl Solution {
    /// Pairs `values` with the problem's indicators. Only shape and finiteness
    /// are checked here; see [`Solution::validate`] for feasibility.
    pub fn from_values(problem: &Problem, values: Vec<f64>) -> Result<Self, SolutionError> {
        if values.len() != problem.len() {
            return Err(SolutionError::LengthMismatch {
                expected: problem.len(),
                actual: values.len(),
            });
        }

        let mut entries = Vec::with_capacity(values.len());
        for (ind, value) in problem.iter().zip(values) {
            if !value.is_finite() {
                return Err(SolutionError::NonFiniteValue {
                    key: ind.key().clone(),
                    value,
                });
            }
            entries.push(SolutionEntry {
                key: ind.key().clone(),
                baseline: ind.baseline(),
                value,
                weight: ind.weight(),
                unit_cost: ind.unit_cost(),
            });
        }

        let score = entries.iter().map(SolutionEntry::contribution).sum();
        let resource_used = entries.iter().map(SolutionEntry::cost).sum();
        Ok(Self {
            entries,
            score,
            resource_used,
        })
    }

    /// The do-nothing solution: every indicator at its baseline.
    pub fn baseline(problem: &Problem) -> Self {
        let entries: Vec<SolutionEntry> = problem
            .iter()
            .map(|ind| SolutionEntry {
                key: ind.key().clone(),
                baseline: ind.baseline(),
                value: ind.baseline(),
                weight: ind.weight(),
                unit_cost: ind.unit_cost(),
            })
            .collect();
        Self {
            score: problem.current_score(),
            resource_used: 0.0,
            entries,
        }
    }

    #[inline]
    pub fn entries(&self) -> &[SolutionEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[inline]
    pub fn resource_used(&self) -> f64 {
        self.resource_used
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.value).collect()
    }

    pub fn value_of(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.key.as_str() == key)
            .map(|e| e.value)
    }

    /// Keys of the indicators this solution actually raises.
    pub fn changed_keys(&self) -> Vec<IndicatorKey> {
        self.entries
            .iter()
            .filter(|e| e.delta() > VALUE_TOLERANCE)
            .map(|e| e.key.clone())
            .collect()
    }

    #[inline]
    pub fn is_within_budget(&self, budget: f64) -> bool {
        within_budget(self.resource_used, budget)
    }

    /// Checks every feasibility rule of `problem`: frozen indicators sit exactly
    /// at their baseline, every value lies in its admissible interval and the
    /// resource usage fits the budget.
    pub fn validate(&self, problem: &Problem) -> Result<(), SolutionError> {
        if self.entries.len() != problem.len() {
            return Err(SolutionError::LengthMismatch {
                expected: problem.len(),
                actual: self.entries.len(),
            });
        }

        for (position, (ind, entry)) in problem.iter().zip(&self.entries).enumerate() {
            if ind.key() != &entry.key {
                return Err(SolutionError::KeyMismatch {
                    position,
                    expected: ind.key().clone(),
                    found: entry.key.clone(),
                });
            }
            if ind.is_frozen() && entry.value != ind.baseline() {
                return Err(SolutionError::FrozenPerturbed {
                    key: entry.key.clone(),
                    baseline: ind.baseline(),
                    value: entry.value,
                });
            }
            let bounds = ind.bounds();
            if entry.value < bounds.lo() - VALUE_TOLERANCE
                || entry.value > bounds.hi() + VALUE_TOLERANCE
            {
                return Err(SolutionError::OutOfBounds {
                    key: entry.key.clone(),
                    value: entry.value,
                    bounds,
                });
            }
        }

        let used = problem.resource_of(&self.values());
        if !within_budget(used, problem.budget()) {
            return Err(SolutionError::OverBudget {
                resource_used: used,
                budget: problem.budget(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Solution(score: {:.4}, resource used: {:.2}, changed: {})",
            self.score,
            self.resource_used,
            self.changed_keys().len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::university_scenario;

    fn with_value(p: &Problem, key: &str, value: f64) -> Vec<f64> {
        let mut v = p.baseline_values();
        v[p.position(key).unwrap()] = value;
        v
    }

    #[test]
    fn baseline_solution_is_valid_and_free() {
        let p = university_scenario();
        let s = Solution::baseline(&p);
        assert!(s.validate(&p).is_ok());
        assert_eq!(s.resource_used(), 0.0);
        assert_eq!(s.score(), p.current_score());
        assert!(s.changed_keys().is_empty());
    }

    #[test]
    fn derived_quantities_match_problem() {
        let p = university_scenario();
        let s = Solution::from_values(&p, with_value(&p, "AR", 7.0)).unwrap();
        assert!((s.resource_used() - 50.0).abs() < 1e-9);
        assert!((s.score() - (p.current_score() + 0.5 * 0.3)).abs() < 1e-9);
        assert_eq!(s.value_of("AR"), Some(7.0));
        assert_eq!(s.changed_keys(), vec![IndicatorKey::from("AR")]);
        assert!(s.validate(&p).is_ok());
    }

    #[test]
    fn rejects_wrong_length_and_nan() {
        let p = university_scenario();
        assert!(matches!(
            Solution::from_values(&p, vec![1.0]),
            Err(SolutionError::LengthMismatch { .. })
        ));
        assert!(matches!(
            Solution::from_values(&p, with_value(&p, "ER", f64::NAN)),
            Err(SolutionError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn validate_flags_frozen_perturbation() {
        let p = university_scenario();
        let s = Solution::from_values(&p, with_value(&p, "ISR", 20.2)).unwrap();
        assert!(matches!(
            s.validate(&p),
            Err(SolutionError::FrozenPerturbed { .. })
        ));
    }

    #[test]
    fn validate_flags_out_of_bounds_and_over_budget() {
        let p = university_scenario();
        let s = Solution::from_values(&p, with_value(&p, "AR", 8.0)).unwrap();
        assert!(matches!(s.validate(&p), Err(SolutionError::OutOfBounds { .. })));

        let tight = p.with_budget(10.0).unwrap();
        let s = Solution::from_values(&tight, with_value(&tight, "AR", 7.0)).unwrap();
        assert!(matches!(
            s.validate(&tight),
            Err(SolutionError::OverBudget { .. })
        ));
        assert!(!s.is_within_budget(10.0));
    }

    #[test]
    fn solution_serializes_immutable_cost() {
        let p = university_scenario();
        let s = Solution::baseline(&p);
        let json = serde_json::to_string(&s).unwrap();
        let back: Solution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
