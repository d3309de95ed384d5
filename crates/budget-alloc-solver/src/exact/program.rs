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

use crate::exact::err::ExactSolverError;
use budget_alloc_core::{quantize::Quantizer, tolerance::budget_limit};
use budget_alloc_model::problem::prob::Problem;
use good_lp::{Expression, Solution, SolverModel, default_solver, variable, variables};

/// Integer count of quantization steps applied to one eligible indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepVariable {
    /// Index of the indicator in problem order.
    pub position: usize,
    pub max_steps: u32,
    pub gain_per_step: f64,
    pub cost_per_step: f64,
}

/// `max Σ gain·k  s.t.  Σ cost·k <= budget,  0 <= k <= max_steps,  k ∈ ℤ`.
///
/// Frozen indicators and indicators without a full step of room have no
/// variable; they are implicitly fixed at zero steps.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerProgram {
    variables: Vec<StepVariable>,
    budget: f64,
}

impl IntegerProgram {
    pub fn new(variables: Vec<StepVariable>, budget: f64) -> Self {
        Self { variables, budget }
    }

    pub fn from_problem(problem: &Problem, quantizer: Quantizer) -> Self {
        let step = quantizer.step();
        let variables = problem
            .iter()
            .enumerate()
            .filter_map(|(position, ind)| {
                let cost = ind.unit_cost().finite()?;
                if ind.is_frozen() {
                    return None;
                }
                let max_steps = quantizer.max_steps(&ind.bounds());
                (max_steps > 0).then_some(StepVariable {
                    position,
                    max_steps,
                    gain_per_step: ind.weight() * step,
                    cost_per_step: cost * step,
                })
            })
            .collect();
        Self::new(variables, problem.budget())
    }

    #[inline]
    pub fn variables(&self) -> &[StepVariable] {
        &self.variables
    }

    #[inline]
    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn spend(&self, steps: &[u32]) -> f64 {
        self.variables
            .iter()
            .zip(steps)
            .map(|(v, &k)| v.cost_per_step * k as f64)
            .sum()
    }

    /// Optimal step counts, one per variable in order.
    pub fn solve(&self) -> Result<Vec<u32>, ExactSolverError> {
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(ExactSolverError::Infeasible);
        }
        if self.variables.is_empty() {
            return Ok(Vec::new());
        }

        let mut vars = variables!();
        let ks: Vec<_> = self
            .variables
            .iter()
            .enumerate()
            .map(|(i, v)| {
                vars.add(
                    variable()
                        .integer()
                        .min(0.0)
                        .max(v.max_steps as f64)
                        .name(format!("k_{i}")),
                )
            })
            .collect();

        let objective = ks
            .iter()
            .zip(&self.variables)
            .fold(Expression::from(0.0), |acc, (k, v)| acc + v.gain_per_step * *k);
        let spend = ks
            .iter()
            .zip(&self.variables)
            .fold(Expression::from(0.0), |acc, (k, v)| acc + v.cost_per_step * *k);

        let mut prob = vars.maximise(objective).using(default_solver);
        prob.add_constraint(spend.leq(budget_limit(self.budget)));
        let solution = prob.solve()?;

        let steps: Vec<u32> = ks
            .iter()
            .zip(&self.variables)
            .map(|(k, v)| {
                let raw = solution.value(*k).round();
                if raw <= 0.0 {
                    0
                } else {
                    (raw as u32).min(v.max_steps)
                }
            })
            .collect();
        Ok(self.repair(steps))
    }

    // Backend tolerances can leave a rounded assignment marginally over budget.
    fn repair(&self, mut steps: Vec<u32>) -> Vec<u32> {
        let limit = budget_limit(self.budget);
        while self.spend(&steps) > limit && self.drop_least_efficient(&mut steps) {}
        steps
    }

    /// Removes one step from the variable with the lowest gain per unit cost.
    /// Returns `false` when no costly step is left to remove.
    pub fn drop_least_efficient(&self, steps: &mut [u32]) -> bool {
        let worst = self
            .variables
            .iter()
            .enumerate()
            .filter(|(i, v)| steps[*i] > 0 && v.cost_per_step > 0.0)
            .min_by(|(_, a), (_, b)| {
                (a.gain_per_step / a.cost_per_step).total_cmp(&(b.gain_per_step / b.cost_per_step))
            })
            .map(|(i, _)| i);
        match worst {
            Some(i) => {
                steps[i] -= 1;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budget_alloc_model::fixtures::university_scenario;

    fn var(position: usize, max_steps: u32, gain: f64, cost: f64) -> StepVariable {
        StepVariable {
            position,
            max_steps,
            gain_per_step: gain,
            cost_per_step: cost,
        }
    }

    #[test]
    fn formulation_skips_frozen_indicators() {
        let p = university_scenario();
        let ip = IntegerProgram::from_problem(&p, Quantizer::default());
        assert_eq!(ip.variables().len(), 8);
        let isr = p.position("ISR").unwrap();
        assert!(ip.variables().iter().all(|v| v.position != isr));

        let ar = ip.variables().iter().find(|v| v.position == 0).unwrap();
        assert_eq!(ar.max_steps, 10);
        assert!((ar.cost_per_step - 10.0).abs() < 1e-12);
        assert!((ar.gain_per_step - 0.03).abs() < 1e-12);

        let cpf = ip.variables().iter().find(|v| v.position == 3).unwrap();
        assert_eq!(cpf.max_steps, 3);
    }

    #[test]
    fn negative_budget_is_infeasible() {
        let ip = IntegerProgram::new(vec![var(0, 3, 1.0, 1.0)], -1.0);
        assert_eq!(ip.solve(), Err(ExactSolverError::Infeasible));
    }

    #[test]
    fn empty_program_is_trivially_solved() {
        let ip = IntegerProgram::new(Vec::new(), 10.0);
        assert_eq!(ip.solve(), Ok(Vec::new()));
    }

    #[test]
    fn knapsack_prefers_value_density() {
        // 4 RU: item 0 gives 3 per 2 RU, item 1 gives 1 per 1 RU.
        let ip = IntegerProgram::new(vec![var(0, 5, 3.0, 2.0), var(1, 5, 1.0, 1.0)], 4.0);
        assert_eq!(ip.solve().unwrap(), vec![2, 0]);
    }

    #[test]
    fn repair_drops_least_efficient_steps() {
        let ip = IntegerProgram::new(vec![var(0, 5, 3.0, 2.0), var(1, 5, 1.0, 1.0)], 4.0);
        assert_eq!(ip.repair(vec![2, 2]), vec![2, 0]);
    }

    #[test]
    fn budget_just_below_a_step_buys_nothing() {
        let ip = IntegerProgram::new(vec![var(0, 10, 0.1, 1.0)], 0.9999995);
        assert_eq!(ip.solve().unwrap(), vec![0]);
        assert_eq!(ip.repair(vec![1]), vec![0]);
    }

    #[test]
    fn free_steps_are_always_taken() {
        let ip = IntegerProgram::new(vec![var(0, 4, 0.5, 0.0)], 0.0);
        assert_eq!(ip.solve().unwrap(), vec![4]);
    }
}
