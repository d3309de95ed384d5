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
    problem::{indicator::IndicatorKey, prob::Problem},
    solution::sol::Solution,
};
use serde::{Deserialize, Serialize};

/// How a solution compares with leaving every indicator at its baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolutionMetrics {
    pub current_score: f64,
    pub score: f64,
    pub improvement: f64,
    /// Zero when the current score is zero.
    pub improvement_percent: f64,
    pub resource_used: f64,
    /// Score gained per resource unit; zero when nothing is spent.
    pub efficiency: f64,
    /// Share of the budget consumed; zero for an empty budget.
    pub budget_utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorChange {
    pub key: IndicatorKey,
    pub baseline: f64,
    pub value: f64,
    pub delta: f64,
    pub contribution: f64,
    pub cost: f64,
}

impl Solution {
    pub fn metrics(&self, problem: &Problem) -> SolutionMetrics {
        let current_score = problem.current_score();
        let improvement = self.score() - current_score;
        let resource_used = self.resource_used();
        let budget = problem.budget();

        SolutionMetrics {
            current_score,
            score: self.score(),
            improvement,
            improvement_percent: if current_score != 0.0 {
                improvement / current_score * 100.0
            } else {
                0.0
            },
            resource_used,
            efficiency: if resource_used > 0.0 {
                improvement / resource_used
            } else {
                0.0
            },
            budget_utilization: if budget > 0.0 {
                resource_used / budget
            } else {
                0.0
            },
        }
    }

    /// One row per indicator, in problem order.
    pub fn changes(&self) -> Vec<IndicatorChange> {
        self.entries()
            .iter()
            .map(|e| IndicatorChange {
                key: e.key.clone(),
                baseline: e.baseline,
                value: e.value,
                delta: e.delta(),
                contribution: e.contribution(),
                cost: e.cost(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::university_scenario;
    use proptest::prelude::*;

    #[test]
    fn baseline_has_zero_metrics() {
        let p = university_scenario();
        let m = Solution::baseline(&p).metrics(&p);
        assert_eq!(m.improvement, 0.0);
        assert_eq!(m.efficiency, 0.0);
        assert_eq!(m.budget_utilization, 0.0);
        assert_eq!(m.current_score, m.score);
    }

    #[test]
    fn metrics_for_single_raise() {
        let p = university_scenario();
        let mut v = p.baseline_values();
        v[p.position("SUS").unwrap()] = 2.6;
        let m = Solution::from_values(&p, v).unwrap().metrics(&p);
        assert!((m.improvement - 0.05).abs() < 1e-9);
        assert!((m.resource_used - 10.0).abs() < 1e-9);
        assert!((m.efficiency - 0.005).abs() < 1e-9);
        assert!((m.budget_utilization - 0.05).abs() < 1e-9);
        assert!((m.improvement_percent - 0.05 / p.current_score() * 100.0).abs() < 1e-9);
    }

    #[test]
    fn immutable_rows_cost_nothing() {
        let p = university_scenario();
        let s = Solution::baseline(&p);
        let isr = s
            .changes()
            .into_iter()
            .find(|c| c.key.as_str() == "ISR")
            .unwrap();
        assert_eq!(isr.delta, 0.0);
        assert_eq!(isr.cost, 0.0);
        assert!((isr.contribution - 20.1 * 0.05).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn row_costs_sum_to_resource_used(raise in proptest::collection::vec(0.0f64..1.0, 9)) {
            let p = university_scenario();
            let values: Vec<f64> = p
                .bounds()
                .iter()
                .zip(&raise)
                .map(|(b, r)| b.lo() + r * b.width())
                .collect();
            let s = Solution::from_values(&p, values).unwrap();
            let total: f64 = s.changes().iter().map(|c| c.cost).sum();
            prop_assert!((total - s.resource_used()).abs() < 1e-9);
            let contrib: f64 = s.changes().iter().map(|c| c.contribution).sum();
            prop_assert!((contrib - s.score()).abs() < 1e-9);
        }
    }
}
