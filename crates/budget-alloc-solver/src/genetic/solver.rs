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
    eval::fitness::{Evaluation, Feasibility, FitnessEvaluator},
    genetic::{
        config::GeneticConfig,
        err::GeneticConfigError,
        operators::{GeneSpace, crossover, mutate, ranked, select_parents},
    },
    monitor::termination::{Interrupt, Termination},
    support::rng::{SeedSequencer, resolve_seed},
};
use budget_alloc_core::quantize::Quantizer;
use budget_alloc_model::{problem::prob::Problem, solution::sol::Solution};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopReason {
    GenerationBudget,
    Saturated,
    Deadline,
    Cancelled,
}

impl From<Interrupt> for StopReason {
    fn from(i: Interrupt) -> Self {
        match i {
            Interrupt::Cancelled => StopReason::Cancelled,
            Interrupt::Deadline => StopReason::Deadline,
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopReason::GenerationBudget => "generation budget exhausted",
            StopReason::Saturated => "fitness saturated",
            StopReason::Deadline => "deadline reached",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One member of the final population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub solution: Solution,
    pub fitness: f64,
    pub feasibility: Feasibility,
}

impl Candidate {
    #[inline]
    pub fn is_feasible(&self) -> bool {
        self.feasibility == Feasibility::Feasible
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticOutcome {
    /// Fittest within-budget individual observed over the whole run.
    pub best: Solution,
    pub best_fitness: f64,
    /// Best fitness of every generation; entry 0 is the initial population.
    pub fitness_history: Vec<f64>,
    pub final_population: Vec<Candidate>,
    pub generations_run: usize,
    pub stop_reason: StopReason,
    pub seed: u64,
}

impl GeneticOutcome {
    /// Up to `n` distinct feasible strategies from the final population, best
    /// first, cheaper first among equal fitness.
    pub fn top_solutions(&self, n: usize) -> Vec<Candidate> {
        let mut feasible: Vec<&Candidate> = self
            .final_population
            .iter()
            .filter(|c| c.is_feasible())
            .collect();
        feasible.sort_by(|a, b| {
            b.fitness
                .total_cmp(&a.fitness)
                .then(a.solution.resource_used().total_cmp(&b.solution.resource_used()))
        });

        let mut out: Vec<Candidate> = Vec::with_capacity(n.min(feasible.len()));
        for c in feasible {
            if out.len() == n {
                break;
            }
            if out.iter().any(|o| o.solution == c.solution) {
                continue;
            }
            out.push(c.clone());
        }
        out
    }
}

/// Population-based search over quantized indicator values.
#[derive(Debug, Clone)]
pub struct GeneticSolver {
    config: GeneticConfig,
}

impl GeneticSolver {
    pub fn new(config: GeneticConfig) -> Result<Self, GeneticConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    #[inline]
    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    pub fn solve(&self, problem: &Problem) -> GeneticOutcome {
        self.solve_with(problem, &Termination::unbounded())
    }

    /// Runs until the generation budget, saturation, `termination` or the
    /// configured time limit stops it. The best individual seen so far is
    /// always returned.
    #[tracing::instrument(level = "debug", name = "Genetic Search", skip_all, fields(indicators = problem.len()))]
    pub fn solve_with(&self, problem: &Problem, termination: &Termination) -> GeneticOutcome {
        let cfg = &self.config;
        let seed = resolve_seed(cfg.seed);
        let mut rng = SeedSequencer::rng(seed);
        let quantizer = Quantizer::new(cfg.step).unwrap_or_default();
        let space = GeneSpace::new(problem, quantizer);
        let evaluator = FitnessEvaluator::new(problem)
            .with_penalty_factor(cfg.penalty_factor)
            .with_frozen_rejection(cfg.frozen_rejection);
        let termination = termination.clone().with_time_limit(cfg.time_limit);

        let mut population: Vec<Vec<f64>> = Vec::with_capacity(cfg.population_size);
        population.push(space.baseline());
        while population.len() < cfg.population_size {
            population.push(space.random_individual(&mut rng));
        }
        let mut evals = evaluate_all(&evaluator, &population);

        // Slot 0 holds the all-baseline individual, which is always feasible.
        let first = fittest_feasible(&evals).unwrap_or(0);
        let mut best_values = population[first].clone();
        let mut best_fitness = evals[first].fitness;
        let mut history = vec![evals[ranked(&fitness_of(&evals))[0]].fitness];
        let mut stale = 0usize;
        let mut generation = 0usize;

        let stop_reason = loop {
            if generation >= cfg.generations {
                break StopReason::GenerationBudget;
            }
            if let Some(limit) = cfg.saturation
                && stale >= limit
            {
                break StopReason::Saturated;
            }
            if let Some(interrupt) = termination.check() {
                break interrupt.into();
            }

            let fitness = fitness_of(&evals);
            let parents = select_parents(
                cfg.parent_selection,
                &fitness,
                cfg.parents_mating,
                &mut rng,
            );

            let mut next: Vec<Vec<f64>> = ranked(&fitness)
                .into_iter()
                .take(cfg.keep_elitism)
                .map(|i| population[i].clone())
                .collect();

            let offspring = cfg.population_size - next.len();
            for k in 0..offspring {
                let a = &population[parents[k % parents.len()]];
                let b = &population[parents[(k + 1) % parents.len()]];
                let mut child = crossover(cfg.crossover, a, b, &mut rng);
                mutate(
                    &space,
                    &mut child,
                    cfg.mutation_percent_genes,
                    cfg.mutation_range,
                    &mut rng,
                );
                next.push(child);
            }

            population = next;
            evals = evaluate_all(&evaluator, &population);
            generation += 1;

            let generation_best = evals[ranked(&fitness_of(&evals))[0]].fitness;
            history.push(generation_best);

            match fittest_feasible(&evals) {
                Some(i) if evals[i].fitness > best_fitness => {
                    best_fitness = evals[i].fitness;
                    best_values = population[i].clone();
                    stale = 0;
                }
                _ => stale += 1,
            }

            tracing::trace!(generation, generation_best, best_fitness, "GA: generation done");
        };

        let best = Solution::from_values(problem, best_values)
            .unwrap_or_else(|_| Solution::baseline(problem));
        let final_population = population
            .into_iter()
            .zip(&evals)
            .filter_map(|(values, e)| {
                Solution::from_values(problem, values)
                    .ok()
                    .map(|solution| Candidate {
                        solution,
                        fitness: e.fitness,
                        feasibility: e.feasibility,
                    })
            })
            .collect();

        tracing::debug!(
            best_fitness,
            score = best.score(),
            resource_used = best.resource_used(),
            generations = generation,
            %stop_reason,
            seed,
            "GA: finished"
        );

        GeneticOutcome {
            best,
            best_fitness,
            fitness_history: history,
            final_population,
            generations_run: generation,
            stop_reason,
            seed,
        }
    }
}

// Order-preserving, so results do not depend on the thread schedule.
fn evaluate_all(evaluator: &FitnessEvaluator<'_>, population: &[Vec<f64>]) -> Vec<Evaluation> {
    population
        .par_iter()
        .map(|values| evaluator.evaluate(values))
        .collect()
}

fn fittest_feasible(evals: &[Evaluation]) -> Option<usize> {
    evals
        .iter()
        .enumerate()
        .filter(|(_, e)| e.feasibility == Feasibility::Feasible)
        .max_by(|(i, a), (j, b)| a.fitness.total_cmp(&b.fitness).then(j.cmp(i)))
        .map(|(i, _)| i)
}

#[inline]
fn fitness_of(evals: &[Evaluation]) -> Vec<f64> {
    evals.iter().map(|e| e.fitness).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetic::config::{Crossover, ParentSelection};
    use crate::monitor::stop::StopToken;
    use budget_alloc_model::fixtures::university_scenario;
    use std::time::Duration;

    fn quick(seed: u64) -> GeneticConfig {
        GeneticConfig::default()
            .with_generations(60)
            .with_saturation(None)
            .with_seed(Some(seed))
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(GeneticSolver::new(GeneticConfig::default().with_parents_mating(100)).is_err());
    }

    #[test]
    fn scenario_keeps_frozen_and_budget() {
        let p = university_scenario();
        let out = GeneticSolver::new(quick(42)).unwrap().solve(&p);
        assert_eq!(out.best.value_of("ISR"), Some(20.1));
        assert!(out.best.resource_used() <= p.budget() + 1e-6);
        assert!(out.best.validate(&p).is_ok());
        assert!(out.best.score() >= p.current_score());
        assert_eq!(out.seed, 42);
    }

    #[test]
    fn same_seed_same_outcome() {
        let p = university_scenario();
        let solver = GeneticSolver::new(quick(7)).unwrap();
        let a = solver.solve(&p);
        let b = solver.solve(&p);
        assert_eq!(a.best, b.best);
        assert_eq!(a.fitness_history, b.fitness_history);
        assert_eq!(a.final_population, b.final_population);
    }

    #[test]
    fn history_is_monotone_with_elitism() {
        let p = university_scenario();
        let out = GeneticSolver::new(quick(3)).unwrap().solve(&p);
        assert_eq!(out.fitness_history.len(), out.generations_run + 1);
        assert!(out.fitness_history.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(out.stop_reason, StopReason::GenerationBudget);
        assert_eq!(out.final_population.len(), 45);
    }

    #[test]
    fn saturation_stops_early() {
        let p = university_scenario();
        let cfg = GeneticConfig::default()
            .with_generations(10_000)
            .with_saturation(Some(5))
            .with_seed(Some(11));
        let out = GeneticSolver::new(cfg).unwrap().solve(&p);
        assert_eq!(out.stop_reason, StopReason::Saturated);
        assert!(out.generations_run < 10_000);
    }

    #[test]
    fn cancelled_run_returns_baseline_or_better() {
        let p = university_scenario();
        let stop = StopToken::new();
        stop.request_stop();
        let out = GeneticSolver::new(quick(1))
            .unwrap()
            .solve_with(&p, &Termination::new(stop));
        assert_eq!(out.stop_reason, StopReason::Cancelled);
        assert_eq!(out.generations_run, 0);
        assert!(out.best.validate(&p).is_ok());
    }

    #[test]
    fn zero_time_limit_hits_deadline() {
        let p = university_scenario();
        let cfg = quick(1).with_time_limit(Some(Duration::ZERO));
        let out = GeneticSolver::new(cfg).unwrap().solve(&p);
        assert_eq!(out.stop_reason, StopReason::Deadline);
    }

    #[test]
    fn all_frozen_problem_converges_on_baseline() {
        let p = university_scenario().freeze_all_except(&["ISR"]).unwrap();
        let out = GeneticSolver::new(quick(5)).unwrap().solve(&p);
        assert_eq!(out.best.values(), p.baseline_values());
        assert_eq!(out.best.score(), p.current_score());
    }

    #[test]
    fn top_solutions_are_distinct_feasible_and_ranked() {
        let p = university_scenario();
        let out = GeneticSolver::new(quick(9)).unwrap().solve(&p);
        let top = out.top_solutions(5);
        assert!(!top.is_empty() && top.len() <= 5);
        assert!(top.iter().all(Candidate::is_feasible));
        assert!(top.windows(2).all(|w| w[0].fitness >= w[1].fitness));
        for (i, a) in top.iter().enumerate() {
            for b in &top[i + 1..] {
                assert_ne!(a.solution, b.solution);
            }
        }
    }

    #[test]
    fn every_operator_combination_respects_bounds() {
        let p = university_scenario();
        for sel in [
            ParentSelection::SteadyState,
            ParentSelection::Rank,
            ParentSelection::RouletteWheel,
            ParentSelection::Tournament { size: 3 },
        ] {
            for cx in [Crossover::SinglePoint, Crossover::TwoPoint, Crossover::Uniform] {
                let cfg = quick(21)
                    .with_generations(15)
                    .with_parent_selection(sel)
                    .with_crossover(cx);
                let out = GeneticSolver::new(cfg).unwrap().solve(&p);
                assert!(out.best.validate(&p).is_ok());
            }
        }
    }
}
