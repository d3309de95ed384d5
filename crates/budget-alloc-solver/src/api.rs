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

//! Stateless entry points over an explicit [`Problem`].

use crate::{
    exact::{err::ExactSolverError, solver::ExactSolver},
    genetic::{
        config::GeneticConfig,
        err::GeneticConfigError,
        solver::{GeneticOutcome, GeneticSolver},
    },
    subset::{
        err::SubsetSearchError,
        search::{SubsetEvaluator, SubsetSearch, SubsetSearchReport},
    },
    tune::{err::TuneError, tuner::AutoTuner, tuner::TuningResult},
};
use budget_alloc_model::{problem::prob::Problem, solution::sol::Solution};

/// Runs the genetic solver; `None` uses [`GeneticConfig::default`].
pub fn solve_genetic(
    problem: &Problem,
    config: Option<GeneticConfig>,
) -> Result<GeneticOutcome, GeneticConfigError> {
    let solver = GeneticSolver::new(config.unwrap_or_default())?;
    Ok(solver.solve(problem))
}

pub fn tune_genetic(problem: &Problem, trials: usize) -> Result<TuningResult, TuneError> {
    AutoTuner::default().with_trials(trials).tune(problem)
}

/// Solves the integer program, optionally restricted to `subset` with every
/// other indicator frozen.
pub fn solve_exact<K: AsRef<str>>(
    problem: &Problem,
    subset: Option<&[K]>,
) -> Result<Solution, ExactSolverError> {
    let solver = ExactSolver::default();
    match subset {
        Some(keys) => solver.solve_subset(problem, keys),
        None => solver.solve(problem),
    }
}

pub fn search_top_subsets(
    problem: &Problem,
    k: usize,
    evaluator: SubsetEvaluator,
) -> Result<SubsetSearchReport, SubsetSearchError> {
    SubsetSearch::new(k, evaluator).search(problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use budget_alloc_model::fixtures::university_scenario;

    #[test]
    fn exact_respects_scenario_expectations() {
        let p = university_scenario();
        let s = solve_exact::<&str>(&p, None).unwrap();
        assert!(s.validate(&p).is_ok());
        assert!(s.score() >= p.current_score());
        assert!(s.resource_used() <= 200.0 + 1e-6);
        assert_eq!(s.value_of("ISR"), Some(20.1));
    }

    #[test]
    fn exact_bounds_genetic() {
        let p = university_scenario();
        let ga = solve_genetic(
            &p,
            Some(
                GeneticConfig::default()
                    .with_generations(60)
                    .with_seed(Some(11)),
            ),
        )
        .unwrap();
        let exact = solve_exact::<&str>(&p, None).unwrap();
        assert!(exact.score() >= ga.best.score() - 1e-9);
        assert!(ga.best.validate(&p).is_ok());
        assert_eq!(ga.best.value_of("ISR"), Some(20.1));
    }

    #[test]
    fn exact_subset_only_moves_the_subset() {
        let p = university_scenario();
        let s = solve_exact(&p, Some(&["AR", "CPF"][..])).unwrap();
        for e in s.entries() {
            if e.key.as_str() != "AR" && e.key.as_str() != "CPF" {
                assert_eq!(e.value, e.baseline);
            }
        }
    }

    #[test]
    fn invalid_genetic_config_is_rejected() {
        let p = university_scenario();
        let bad = GeneticConfig::default().with_population_size(0);
        assert!(solve_genetic(&p, Some(bad)).is_err());
    }

    #[test]
    fn zero_trial_budget_is_rejected() {
        let p = university_scenario();
        assert_eq!(tune_genetic(&p, 0), Err(TuneError::EmptyTrialBudget));
    }

    #[test]
    fn top_subsets_with_exact_evaluator() {
        let p = university_scenario();
        let report =
            search_top_subsets(&p, 3, SubsetEvaluator::Exact(ExactSolver::default())).unwrap();
        assert_eq!(report.total_combinations, 56);
        let best = report.best().unwrap();
        let direct = solve_exact(&p, Some(&best.keys[..])).unwrap();
        assert!((best.score - direct.score()).abs() < 1e-9);
    }
}
