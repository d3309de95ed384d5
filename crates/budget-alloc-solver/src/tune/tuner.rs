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
    genetic::{config::GeneticConfig, solver::GeneticSolver},
    monitor::termination::{Interrupt, Termination},
    support::rng::{SeedSequencer, resolve_seed},
    tune::{
        err::TuneError,
        space::{GeneticParams, ParamSpace},
        tpe::{Observation, TreeParzen},
    },
};
use budget_alloc_model::problem::prob::Problem;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Completed,
    /// The sampled configuration could not be run; the trial scores zero.
    Failed(String),
    /// Termination fired while the runs were in progress, so the scores come
    /// from truncated runs.
    Interrupted(Interrupt),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub index: usize,
    pub params: GeneticParams,
    pub status: TrialStatus,
    /// Best feasible score of every repeat.
    pub runs: Vec<f64>,
    pub mean_score: f64,
}

impl TrialRecord {
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == TrialStatus::Completed
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, TrialStatus::Failed(_))
    }

    #[inline]
    pub fn is_interrupted(&self) -> bool {
        matches!(self.status, TrialStatus::Interrupted(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningResult {
    /// Base configuration with the best trial's parameters applied.
    pub config: GeneticConfig,
    pub params: GeneticParams,
    pub mean_score: f64,
    pub trials: Vec<TrialRecord>,
    pub seed: u64,
}

impl TuningResult {
    /// Trials by mean score, best first; interrupted trials follow the
    /// completed ones and failed trials come last.
    pub fn leaderboard(&self, n: usize) -> Vec<&TrialRecord> {
        let rank = |t: &TrialRecord| match t.status {
            TrialStatus::Completed => 0,
            TrialStatus::Interrupted(_) => 1,
            TrialStatus::Failed(_) => 2,
        };
        let mut v: Vec<&TrialRecord> = self.trials.iter().collect();
        v.sort_by(|a, b| {
            rank(a)
                .cmp(&rank(b))
                .then(b.mean_score.total_cmp(&a.mean_score))
                .then(a.index.cmp(&b.index))
        });
        v.truncate(n);
        v
    }

    pub fn failed_trials(&self) -> usize {
        self.trials.iter().filter(|t| t.is_failed()).count()
    }

    pub fn interrupted_trials(&self) -> usize {
        self.trials.iter().filter(|t| t.is_interrupted()).count()
    }
}

/// Sequential model-based search over [`GeneticParams`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoTuner {
    pub trials: usize,
    /// Genetic runs per trial; their scores are averaged.
    pub repeats: usize,
    /// Trials sampled uniformly before the density model takes over.
    pub startup_trials: usize,
    pub gamma: f64,
    pub candidates: usize,
    pub seed: Option<u64>,
    pub space: ParamSpace,
    /// Template for every non-tuned field of the genetic configuration.
    pub base: GeneticConfig,
}

impl Default for AutoTuner {
    fn default() -> Self {
        Self {
            trials: 30,
            repeats: 3,
            startup_trials: 10,
            gamma: 0.25,
            candidates: 24,
            seed: None,
            space: ParamSpace::default(),
            base: GeneticConfig::default(),
        }
    }
}

impl AutoTuner {
    #[inline]
    pub fn with_trials(mut self, n: usize) -> Self {
        self.trials = n;
        self
    }
    #[inline]
    pub fn with_repeats(mut self, n: usize) -> Self {
        self.repeats = n;
        self
    }
    #[inline]
    pub fn with_startup_trials(mut self, n: usize) -> Self {
        self.startup_trials = n;
        self
    }
    #[inline]
    pub fn with_gamma(mut self, g: f64) -> Self {
        self.gamma = g;
        self
    }
    #[inline]
    pub fn with_candidates(mut self, n: usize) -> Self {
        self.candidates = n;
        self
    }
    #[inline]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
    #[inline]
    pub fn with_space(mut self, space: ParamSpace) -> Self {
        self.space = space;
        self
    }
    #[inline]
    pub fn with_base(mut self, base: GeneticConfig) -> Self {
        self.base = base;
        self
    }

    pub fn validate(&self) -> Result<(), TuneError> {
        if self.trials == 0 {
            return Err(TuneError::EmptyTrialBudget);
        }
        if self.repeats == 0 {
            return Err(TuneError::ZeroRepeats);
        }
        if self.candidates == 0 {
            return Err(TuneError::ZeroCandidates);
        }
        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(TuneError::InvalidGamma(self.gamma));
        }
        self.space.validate()
    }

    pub fn tune(&self, problem: &Problem) -> Result<TuningResult, TuneError> {
        self.tune_with(problem, &Termination::unbounded())
    }

    /// Runs up to `trials` trials; `termination` is checked between trials and
    /// handed to every genetic run. The best completed trial wins; interrupted
    /// trials are only considered when none completed.
    #[tracing::instrument(level = "info", name = "Auto Tune", skip_all, fields(trials = self.trials))]
    pub fn tune_with(
        &self,
        problem: &Problem,
        termination: &Termination,
    ) -> Result<TuningResult, TuneError> {
        self.validate()?;

        let seed = resolve_seed(self.seed);
        let mut rng = SeedSequencer::rng(seed);
        let sampler = TreeParzen {
            gamma: self.gamma,
            candidates: self.candidates,
            startup_trials: self.startup_trials,
        };

        let mut history: Vec<Observation> = Vec::with_capacity(self.trials);
        let mut records: Vec<TrialRecord> = Vec::with_capacity(self.trials);

        for index in 0..self.trials {
            if let Some(interrupt) = termination.check() {
                tracing::info!(index, %interrupt, "Tuner: stopping early");
                break;
            }

            let point = sampler.propose(ParamSpace::DIMENSIONS, &history, &mut rng);
            let params = self.space.decode(&point);
            let record = self.run_trial(problem, index, params, termination);

            match &record.status {
                TrialStatus::Completed => tracing::debug!(
                    index,
                    %params,
                    mean_score = record.mean_score,
                    "Tuner: trial completed"
                ),
                TrialStatus::Failed(reason) => {
                    tracing::warn!(index, %params, reason = %reason, "Tuner: trial failed")
                }
                TrialStatus::Interrupted(interrupt) => tracing::info!(
                    index,
                    %params,
                    %interrupt,
                    mean_score = record.mean_score,
                    "Tuner: trial interrupted"
                ),
            }

            // Truncated scores would mislead the density model.
            if !record.is_interrupted() {
                history.push(Observation {
                    point: self.space.encode(&params),
                    score: record.mean_score,
                });
            }
            records.push(record);
        }

        let best_of = |keep: fn(&TrialRecord) -> bool| {
            records
                .iter()
                .filter(|r| keep(r))
                .fold(None::<&TrialRecord>, |acc, r| match acc {
                    Some(b) if b.mean_score >= r.mean_score => Some(b),
                    _ => Some(r),
                })
        };
        let best = best_of(TrialRecord::is_completed)
            .or_else(|| best_of(TrialRecord::is_interrupted))
            .cloned()
            .ok_or(TuneError::NoSuccessfulTrial {
                trials: records.len(),
            })?;

        tracing::info!(
            best_trial = best.index,
            mean_score = best.mean_score,
            params = %best.params,
            failed = records.iter().filter(|r| r.is_failed()).count(),
            interrupted = records.iter().filter(|r| r.is_interrupted()).count(),
            "Tuner: finished"
        );

        Ok(TuningResult {
            config: best.params.apply(&self.base),
            params: best.params,
            mean_score: best.mean_score,
            trials: records,
            seed,
        })
    }

    fn run_trial(
        &self,
        problem: &Problem,
        index: usize,
        params: GeneticParams,
        termination: &Termination,
    ) -> TrialRecord {
        let failed = |reason: String| TrialRecord {
            index,
            params,
            status: TrialStatus::Failed(reason),
            runs: Vec::new(),
            mean_score: 0.0,
        };

        let config = params.apply(&self.base);
        if let Err(e) = config.validate() {
            return failed(e.to_string());
        }

        // Repeat 0 uses the sampled seed itself so the reported config replays it.
        let seeds = SeedSequencer::new(params.seed);
        let runs: Result<Vec<f64>, String> = (0..self.repeats)
            .into_par_iter()
            .map(|r| -> Result<f64, String> {
                let seed = if r == 0 { params.seed } else { seeds.for_index(r) };
                let cfg = config.clone().with_seed(Some(seed));
                let solver = GeneticSolver::new(cfg).map_err(|e| e.to_string())?;
                let outcome = catch_unwind(AssertUnwindSafe(|| {
                    solver.solve_with(problem, termination)
                }))
                .map_err(|_| "genetic run panicked".to_string())?;
                Ok(if outcome.best.is_within_budget(problem.budget()) {
                    outcome.best.score()
                } else {
                    0.0
                })
            })
            .collect();

        match runs {
            Ok(runs) => {
                let mean_score = runs.iter().sum::<f64>() / runs.len() as f64;
                let status = match termination.check() {
                    Some(interrupt) => TrialStatus::Interrupted(interrupt),
                    None => TrialStatus::Completed,
                };
                TrialRecord {
                    index,
                    params,
                    status,
                    runs,
                    mean_score,
                }
            }
            Err(reason) => failed(reason),
        }
    }
}
