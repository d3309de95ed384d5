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
    exact::solver::ExactSolver,
    genetic::{config::GeneticConfig, solver::GeneticSolver},
    monitor::{stop::StopToken, termination::Termination},
    subset::{
        combinations::{Combinations, binomial},
        err::SubsetSearchError,
    },
    support::rng::{SeedSequencer, resolve_seed},
    tune::tuner::AutoTuner,
};
use budget_alloc_model::{
    problem::{indicator::IndicatorKey, prob::Problem},
    solution::sol::Solution,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    panic::{AssertUnwindSafe, catch_unwind},
    time::{Duration, Instant},
};

/// Solver run on every derived sub-problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubsetEvaluator {
    Genetic(GeneticConfig),
    /// Tunes the genetic solver on each sub-problem before the final run.
    TunedGenetic(AutoTuner),
    Exact(ExactSolver),
}

impl Default for SubsetEvaluator {
    fn default() -> Self {
        SubsetEvaluator::Exact(ExactSolver::default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetResult {
    /// Position of the combination in lexicographic enumeration order.
    pub combination: usize,
    pub keys: Vec<IndicatorKey>,
    pub solution: Solution,
    pub score: f64,
    pub resource_used: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsetFailure {
    pub combination: usize,
    pub keys: Vec<IndicatorKey>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetSearchReport {
    pub k: usize,
    /// Ranked by score (desc), resource usage (asc), enumeration order.
    /// Combinations that reproduce an already ranked solution are dropped.
    pub results: Vec<SubsetResult>,
    pub failures: Vec<SubsetFailure>,
    pub duplicates: usize,
    /// Combinations never started because of cancellation or the overall limit.
    pub skipped: usize,
    pub total_combinations: u64,
    pub evaluated: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
    pub leaderboard_size: usize,
    pub seed: u64,
}

impl SubsetSearchReport {
    #[inline]
    pub fn best(&self) -> Option<&SubsetResult> {
        self.results.first()
    }

    #[inline]
    pub fn leaderboard(&self) -> &[SubsetResult] {
        &self.results[..self.leaderboard_size.min(self.results.len())]
    }

    #[inline]
    pub fn top(&self, n: usize) -> &[SubsetResult] {
        &self.results[..n.min(self.results.len())]
    }
}

/// Ranks every `k`-subset of eligible indicators by the score reachable when
/// all other indicators are frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetSearch {
    pub k: usize,
    pub evaluator: SubsetEvaluator,
    /// Per-combination wall-clock limit. An exact evaluator that times out
    /// leaves its worker running until the backend returns; at most
    /// [`MAX_DETACHED_WORKERS`] such workers exist, and combinations beyond
    /// that fail with [`ExactSolverError::WorkerLimit`].
    ///
    /// [`MAX_DETACHED_WORKERS`]: crate::exact::solver::MAX_DETACHED_WORKERS
    /// [`ExactSolverError::WorkerLimit`]: crate::exact::err::ExactSolverError::WorkerLimit
    pub time_limit_per_combination: Option<Duration>,
    pub time_limit: Option<Duration>,
    pub leaderboard_size: usize,
    /// Worker threads; `None` uses one per available core.
    pub workers: Option<usize>,
    /// Base seed for per-combination seeds when the evaluator has none.
    pub seed: Option<u64>,
}

impl Default for SubsetSearch {
    fn default() -> Self {
        Self {
            k: 3,
            evaluator: SubsetEvaluator::default(),
            time_limit_per_combination: None,
            time_limit: None,
            leaderboard_size: 3,
            workers: None,
            seed: None,
        }
    }
}

enum Outcome {
    Solved(Solution),
    Failed(String),
    Skipped,
}

impl SubsetSearch {
    pub fn new(k: usize, evaluator: SubsetEvaluator) -> Self {
        Self {
            k,
            evaluator,
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }
    #[inline]
    pub fn with_evaluator(mut self, evaluator: SubsetEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }
    #[inline]
    pub fn with_time_limit_per_combination(mut self, d: Option<Duration>) -> Self {
        self.time_limit_per_combination = d;
        self
    }
    #[inline]
    pub fn with_time_limit(mut self, d: Option<Duration>) -> Self {
        self.time_limit = d;
        self
    }
    #[inline]
    pub fn with_leaderboard_size(mut self, n: usize) -> Self {
        self.leaderboard_size = n;
        self
    }
    #[inline]
    pub fn with_workers(mut self, n: Option<usize>) -> Self {
        self.workers = n;
        self
    }
    #[inline]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn search(&self, problem: &Problem) -> Result<SubsetSearchReport, SubsetSearchError> {
        self.search_with(problem, &StopToken::new())
    }

    /// Evaluates combinations on a dedicated pool. `stop` and the overall time
    /// limit are checked before each combination starts; the report then holds
    /// the ranked results gathered so far.
    #[tracing::instrument(level = "info", name = "Subset Search", skip_all, fields(k = self.k))]
    pub fn search_with(
        &self,
        problem: &Problem,
        stop: &StopToken,
    ) -> Result<SubsetSearchReport, SubsetSearchError> {
        if self.k == 0 {
            return Err(SubsetSearchError::ZeroSubsetSize);
        }
        let eligible = problem.eligible_keys();
        if eligible.len() < self.k {
            return Err(SubsetSearchError::NotEnoughEligible {
                eligible: eligible.len(),
                k: self.k,
            });
        }
        if self.workers == Some(0) {
            return Err(SubsetSearchError::ZeroWorkers);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers.unwrap_or(0))
            .thread_name(|i| format!("subset-worker-{i}"))
            .build()
            .map_err(|e| SubsetSearchError::ThreadPool(e.to_string()))?;

        let start = Instant::now();
        let seed = resolve_seed(self.seed);
        let seeds = SeedSequencer::new(seed);
        let termination = Termination::new(stop.clone()).with_time_limit(self.time_limit);
        let total = binomial(eligible.len(), self.k);

        tracing::info!(
            eligible = eligible.len(),
            combinations = total,
            "Subset search: starting"
        );

        let mut outcomes: Vec<(usize, Vec<IndicatorKey>, Outcome)> = pool.install(|| {
            Combinations::new(eligible.len(), self.k)
                .enumerate()
                .par_bridge()
                .map(|(idx, combo)| {
                    let keys: Vec<IndicatorKey> =
                        combo.iter().map(|&i| eligible[i].clone()).collect();
                    if termination.should_stop() {
                        return (idx, keys, Outcome::Skipped);
                    }
                    let outcome = match self.evaluate(
                        problem,
                        &keys,
                        seeds.for_index(idx),
                        &termination,
                    ) {
                        Ok(solution) => Outcome::Solved(solution),
                        Err(reason) => Outcome::Failed(reason),
                    };
                    (idx, keys, outcome)
                })
                .collect()
        });
        outcomes.sort_by_key(|(idx, _, _)| *idx);

        let mut results = Vec::new();
        let mut failures = Vec::new();
        let mut skipped = 0usize;
        for (combination, keys, outcome) in outcomes {
            match outcome {
                Outcome::Solved(solution) => {
                    tracing::debug!(
                        combination,
                        score = solution.score(),
                        resource_used = solution.resource_used(),
                        "Subset search: combination solved"
                    );
                    results.push(SubsetResult {
                        combination,
                        keys,
                        score: solution.score(),
                        resource_used: solution.resource_used(),
                        solution,
                    });
                }
                Outcome::Failed(reason) => {
                    tracing::warn!(combination, reason = %reason, "Subset search: combination failed");
                    failures.push(SubsetFailure {
                        combination,
                        keys,
                        reason,
                    });
                }
                Outcome::Skipped => skipped += 1,
            }
        }
        let evaluated = results.len() + failures.len();

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.resource_used.total_cmp(&b.resource_used))
                .then(a.combination.cmp(&b.combination))
        });
        let mut seen: HashSet<Vec<u64>> = HashSet::with_capacity(results.len());
        let before = results.len();
        results.retain(|r| {
            let bits = r.solution.values().iter().map(|v| v.to_bits()).collect();
            seen.insert(bits)
        });
        let duplicates = before - results.len();

        let report = SubsetSearchReport {
            k: self.k,
            results,
            failures,
            duplicates,
            skipped,
            total_combinations: total,
            evaluated,
            cancelled: skipped > 0,
            elapsed: start.elapsed(),
            leaderboard_size: self.leaderboard_size,
            seed,
        };

        match report.best() {
            Some(best) => tracing::info!(
                best = ?best.keys.iter().map(IndicatorKey::as_str).collect::<Vec<_>>(),
                score = best.score,
                resource_used = best.resource_used,
                evaluated = report.evaluated,
                failed = report.failures.len(),
                skipped = report.skipped,
                "Subset search: finished"
            ),
            None => tracing::warn!(
                evaluated = report.evaluated,
                failed = report.failures.len(),
                skipped = report.skipped,
                "Subset search: no combination produced a solution"
            ),
        }

        Ok(report)
    }

    fn evaluate(
        &self,
        problem: &Problem,
        keys: &[IndicatorKey],
        seed: u64,
        termination: &Termination,
    ) -> Result<Solution, String> {
        let derived = problem.freeze_all_except(keys).map_err(|e| e.to_string())?;
        let limit = termination
            .clone()
            .with_time_limit(self.time_limit_per_combination);

        match &self.evaluator {
            SubsetEvaluator::Genetic(config) => {
                let config = config.clone().with_seed(Some(config.seed.unwrap_or(seed)));
                run_genetic(&derived, config, &limit)
            }
            SubsetEvaluator::TunedGenetic(tuner) => {
                let tuner = tuner.clone().with_seed(Some(tuner.seed.unwrap_or(seed)));
                let tuned = catch_unwind(AssertUnwindSafe(|| tuner.tune_with(&derived, &limit)))
                    .map_err(|_| "tuner panicked".to_string())?
                    .map_err(|e| e.to_string())?;
                run_genetic(&derived, tuned.config, &limit)
            }
            SubsetEvaluator::Exact(exact) => {
                let time_limit = match (exact.time_limit, limit.remaining()) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                exact
                    .with_time_limit(time_limit)
                    .solve(&derived)
                    .map_err(|e| e.to_string())
            }
        }
    }
}

fn run_genetic(
    problem: &Problem,
    config: GeneticConfig,
    termination: &Termination,
) -> Result<Solution, String> {
    let solver = GeneticSolver::new(config).map_err(|e| e.to_string())?;
    catch_unwind(AssertUnwindSafe(|| solver.solve_with(problem, termination)))
        .map(|outcome| outcome.best)
        .map_err(|_| "genetic run panicked".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tune::space::{IntRange, ParamSpace};
    use budget_alloc_model::fixtures::university_scenario;

    fn exact_search(k: usize) -> SubsetSearch {
        SubsetSearch::new(k, SubsetEvaluator::Exact(ExactSolver::default())).with_seed(Some(42))
    }

    fn ranked(report: &SubsetSearchReport) -> bool {
        report.results.windows(2).all(|w| {
            w[0].score > w[1].score
                || (w[0].score == w[1].score && w[0].resource_used <= w[1].resource_used)
        })
    }

    #[test]
    fn rejects_bad_subset_sizes() {
        let p = university_scenario();
        assert_eq!(
            exact_search(0).search(&p),
            Err(SubsetSearchError::ZeroSubsetSize)
        );
        assert_eq!(
            exact_search(9).search(&p),
            Err(SubsetSearchError::NotEnoughEligible { eligible: 8, k: 9 })
        );
        assert_eq!(
            exact_search(2).with_workers(Some(0)).search(&p),
            Err(SubsetSearchError::ZeroWorkers)
        );
    }

    #[test]
    fn exact_search_covers_every_pair() {
        let p = university_scenario();
        let report = exact_search(2).search(&p).unwrap();
        assert_eq!(report.total_combinations, 28);
        assert_eq!(report.evaluated, 28);
        assert!(report.failures.is_empty());
        assert_eq!(report.skipped, 0);
        assert!(!report.cancelled);
        assert_eq!(report.results.len() + report.duplicates, 28);
        assert!(ranked(&report));
        assert_eq!(report.leaderboard().len(), 3);
    }

    #[test]
    fn best_subset_matches_direct_exact_solve() {
        let p = university_scenario();
        let report = exact_search(2).search(&p).unwrap();
        let best = report.best().unwrap();
        let direct = ExactSolver::default().solve_subset(&p, &best.keys[..]).unwrap();
        assert!((best.score - direct.score()).abs() < 1e-9);
        assert!(best.solution.validate(&p).is_ok());
        assert_eq!(best.solution.value_of("ISR"), Some(20.1));
    }

    #[test]
    fn only_the_subset_moves() {
        let p = university_scenario();
        let report = exact_search(1).search(&p).unwrap();
        for r in &report.results {
            for e in r.solution.entries() {
                if !r.keys.contains(&e.key) {
                    assert_eq!(e.value, e.baseline);
                }
            }
        }
    }

    #[test]
    fn genetic_results_respect_the_problem() {
        let p = university_scenario();
        let config = GeneticConfig::default()
            .with_generations(20)
            .with_population_size(20)
            .with_parents_mating(8);
        let report = SubsetSearch::new(2, SubsetEvaluator::Genetic(config))
            .with_seed(Some(3))
            .with_workers(Some(2))
            .search(&p)
            .unwrap();
        assert_eq!(report.evaluated, 28);
        assert!(ranked(&report));
        for r in &report.results {
            assert!(r.solution.validate(&p).is_ok());
        }
    }

    #[test]
    fn genetic_search_is_reproducible() {
        let p = university_scenario();
        let config = GeneticConfig::default()
            .with_generations(15)
            .with_population_size(16)
            .with_parents_mating(6);
        let search = SubsetSearch::new(2, SubsetEvaluator::Genetic(config)).with_seed(Some(8));
        let a = search.search(&p).unwrap();
        let b = search.search(&p).unwrap();
        assert_eq!(a.results, b.results);
    }

    #[test]
    fn failing_combinations_are_recorded_not_fatal() {
        let p = university_scenario();
        let broken = GeneticConfig::default()
            .with_population_size(5)
            .with_parents_mating(10);
        let report = SubsetSearch::new(2, SubsetEvaluator::Genetic(broken))
            .search(&p)
            .unwrap();
        assert!(report.results.is_empty());
        assert_eq!(report.failures.len(), 28);
        assert_eq!(report.evaluated, 28);
        assert!(report.best().is_none());
    }

    #[test]
    fn stop_before_start_skips_everything() {
        let p = university_scenario();
        let stop = StopToken::new();
        stop.request_stop();
        let report = exact_search(3).search_with(&p, &stop).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.skipped, 56);
        assert!(report.results.is_empty());
    }

    #[test]
    fn stop_mid_run_keeps_finished_combinations() {
        let p = university_scenario();
        // Each combination runs until its own 20ms deadline.
        let config = GeneticConfig::default()
            .with_generations(1_000_000)
            .with_saturation(None)
            .with_population_size(8)
            .with_parents_mating(4);
        let search = SubsetSearch::new(4, SubsetEvaluator::Genetic(config))
            .with_seed(Some(5))
            .with_workers(Some(1))
            .with_time_limit_per_combination(Some(Duration::from_millis(20)));

        let stop = StopToken::new();
        let remote = stop.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(200));
            remote.request_stop();
        });
        let report = search.search_with(&p, &stop).unwrap();
        stopper.join().unwrap();

        assert_eq!(report.total_combinations, 70);
        assert!(report.cancelled);
        assert!(report.skipped > 0);
        assert!(!report.results.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(report.evaluated + report.skipped, 70);
        assert!(ranked(&report));
        for r in &report.results {
            assert!(r.solution.validate(&p).is_ok());
        }
    }

    #[test]
    fn exact_combination_timeouts_are_recorded_as_failures() {
        let p = university_scenario();
        let report = exact_search(1)
            .with_workers(Some(1))
            .with_time_limit_per_combination(Some(Duration::ZERO))
            .search(&p)
            .unwrap();
        assert!(!report.cancelled);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.evaluated, 8);
        assert!(!report.failures.is_empty());
        for f in &report.failures {
            assert!(f.reason.contains("not solved within"), "{}", f.reason);
        }
    }

    #[test]
    fn zero_overall_limit_skips_everything() {
        let p = university_scenario();
        let report = exact_search(2)
            .with_time_limit(Some(Duration::ZERO))
            .search(&p)
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.skipped, 28);
    }

    #[test]
    fn tuned_genetic_evaluator_runs() {
        let p = university_scenario();
        let tuner = AutoTuner::default()
            .with_trials(3)
            .with_repeats(1)
            .with_startup_trials(3)
            .with_space(ParamSpace {
                generations: IntRange::new(5, 10),
                population_size: IntRange::new(10, 12),
                parents_mating: IntRange::new(2, 4),
                mutation_percent_genes: IntRange::new(10, 30),
                seed: IntRange::new(0, 100),
            });
        let report = SubsetSearch::new(1, SubsetEvaluator::TunedGenetic(tuner))
            .with_seed(Some(1))
            .search(&p)
            .unwrap();
        assert_eq!(report.evaluated, 8);
        assert!(report.failures.is_empty());
        assert!(report.best().unwrap().score >= p.current_score());
    }
}
