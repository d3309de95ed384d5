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

use budget_alloc_core::tolerance::within_budget;
use budget_alloc_model::prelude::*;
use budget_alloc_solver::prelude::*;
use proptest::prelude::*;

fn small_ga(seed: u64) -> GeneticConfig {
    GeneticConfig::default()
        .with_generations(30)
        .with_population_size(16)
        .with_parents_mating(6)
        .with_seed(Some(seed))
}

prop_compose! {
    fn arb_indicator(i: usize)(
        baseline in 0.0f64..20.0,
        weight in 0.0f64..1.0,
        headroom in 0.0f64..5.0,
        max_increase in prop_oneof![Just(0.0), 0.1f64..3.0],
        cost in prop_oneof![4 => (1.0f64..100.0).prop_map(UnitCost::Finite), 1 => Just(UnitCost::Immutable)],
    ) -> Indicator {
        Indicator::new(format!("I{i}"), baseline, weight, baseline + headroom, max_increase, cost)
            .unwrap()
    }
}

fn arb_problem() -> impl Strategy<Value = Problem> {
    (1usize..=5, 0.0f64..300.0).prop_flat_map(|(n, budget)| {
        (0..n)
            .map(arb_indicator)
            .collect::<Vec<_>>()
            .prop_map(move |indicators| {
                ProblemBuilder::new()
                    .with_indicators(indicators)
                    .with_budget(budget)
                    .build()
                    .unwrap()
            })
    })
}

fn assert_respects(problem: &Problem, solution: &Solution) -> Result<(), TestCaseError> {
    for (ind, entry) in problem.iter().zip(solution.entries()) {
        if ind.is_frozen() {
            prop_assert_eq!(entry.value, ind.baseline());
        }
        let b = ind.bounds();
        prop_assert!(entry.value >= b.lo() - 1e-9 && entry.value <= b.hi() + 1e-9);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn exact_solutions_are_admissible(problem in arb_problem()) {
        let s = ExactSolver::default().solve(&problem).unwrap();
        assert_respects(&problem, &s)?;
        prop_assert!(within_budget(s.resource_used(), problem.budget()));
        prop_assert!(s.validate(&problem).is_ok());
    }

    #[test]
    fn genetic_best_is_admissible_and_feasible(problem in arb_problem(), seed in any::<u64>()) {
        let out = GeneticSolver::new(small_ga(seed)).unwrap().solve(&problem);
        assert_respects(&problem, &out.best)?;
        prop_assert!(within_budget(out.best.resource_used(), problem.budget()));
    }

    #[test]
    fn exact_never_loses_to_genetic(problem in arb_problem(), seed in any::<u64>()) {
        let ga = GeneticSolver::new(small_ga(seed)).unwrap().solve(&problem);
        let exact = ExactSolver::default().solve(&problem).unwrap();
        prop_assert!(exact.score() >= ga.best.score() - 1e-6);
    }

    #[test]
    fn more_budget_never_hurts(problem in arb_problem(), extra in 0.0f64..100.0) {
        let richer = problem.with_budget(problem.budget() + extra).unwrap();
        let a = ExactSolver::default().solve(&problem).unwrap();
        let b = ExactSolver::default().solve(&richer).unwrap();
        prop_assert!(b.score() >= a.score() - 1e-9);
    }

    #[test]
    fn genetic_runs_replay_bit_for_bit(problem in arb_problem(), seed in any::<u64>()) {
        let solver = GeneticSolver::new(small_ga(seed)).unwrap();
        let a = solver.solve(&problem);
        let b = solver.solve(&problem);
        prop_assert_eq!(a.best, b.best);
        prop_assert_eq!(a.fitness_history, b.fitness_history);
    }

    #[test]
    fn best_subset_matches_direct_solve(problem in arb_problem()) {
        prop_assume!(problem.eligible_count() >= 1);
        let report = SubsetSearch::new(1, SubsetEvaluator::Exact(ExactSolver::default()))
            .with_workers(Some(2))
            .search(&problem)
            .unwrap();
        let best = report.best().unwrap();
        let direct = ExactSolver::default().solve_subset(&problem, &best.keys[..]).unwrap();
        prop_assert!((best.score - direct.score()).abs() < 1e-9);
    }
}
