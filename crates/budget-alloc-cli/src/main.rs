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

use anyhow::Context;
use budget_alloc_model::{
    fixtures::university_scenario,
    prelude::{IndicatorChange, Problem, ProblemDocument, Solution, SolutionMetrics},
};
use budget_alloc_solver::prelude::*;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "budget-alloc", version, about = "Budget-constrained indicator allocation")]
struct Cli {
    /// Write the JSON report here instead of stdout.
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evolve an allocation with the genetic solver.
    SolveGenetic {
        #[arg(long)]
        problem: PathBuf,
        #[command(flatten)]
        genetic: GeneticArgs,
        /// Distinct alternatives to report from the final population.
        #[arg(long, default_value_t = 3)]
        alternatives: usize,
    },
    /// Solve the integer program to optimality.
    SolveExact {
        #[arg(long)]
        problem: PathBuf,
        /// Only these indicators may move; all others are frozen.
        #[arg(long, value_delimiter = ',')]
        subset: Vec<String>,
        #[arg(long)]
        time_limit_secs: Option<f64>,
    },
    /// Search the genetic solver's parameters, then run the best configuration.
    Tune {
        #[arg(long)]
        problem: PathBuf,
        #[command(flatten)]
        tuner: TunerArgs,
    },
    /// Rank every k-subset of eligible indicators.
    TopSubsets {
        #[arg(long)]
        problem: PathBuf,
        #[arg(short, long, default_value_t = 3)]
        k: usize,
        #[arg(long, value_enum, default_value_t = SolverKind::Exact)]
        solver: SolverKind,
        #[command(flatten)]
        genetic: GeneticArgs,
        #[command(flatten)]
        tuner: TunerArgs,
        #[arg(long)]
        time_limit_per_combination_secs: Option<f64>,
        #[arg(long)]
        time_limit_secs: Option<f64>,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long, default_value_t = 3)]
        leaderboard: usize,
    },
    /// Print the built-in university scenario as a problem document.
    Scenario,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SolverKind {
    Genetic,
    TunedGenetic,
    Exact,
}

#[derive(Args)]
struct GeneticArgs {
    /// JSON file holding a full genetic configuration; flags override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    generations: Option<usize>,
    #[arg(long)]
    population: Option<usize>,
    #[arg(long)]
    parents: Option<usize>,
    #[arg(long)]
    mutation_percent: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    ga_time_limit_secs: Option<f64>,
}

impl GeneticArgs {
    fn build(&self) -> anyhow::Result<GeneticConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let file = File::open(path)
                    .with_context(|| format!("opening genetic config {}", path.display()))?;
                serde_json::from_reader(file)
                    .with_context(|| format!("parsing genetic config {}", path.display()))?
            }
            None => GeneticConfig::default(),
        };
        if let Some(n) = self.generations {
            cfg = cfg.with_generations(n);
        }
        if let Some(n) = self.population {
            cfg = cfg.with_population_size(n);
        }
        if let Some(n) = self.parents {
            cfg = cfg.with_parents_mating(n);
        }
        if let Some(p) = self.mutation_percent {
            cfg = cfg.with_mutation_percent_genes(p);
        }
        if self.seed.is_some() {
            cfg = cfg.with_seed(self.seed);
        }
        if let Some(limit) = secs(self.ga_time_limit_secs)? {
            cfg = cfg.with_time_limit(Some(limit));
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Args)]
struct TunerArgs {
    #[arg(long, default_value_t = 30)]
    trials: usize,
    #[arg(long, default_value_t = 3)]
    repeats: usize,
    #[arg(long)]
    tuner_seed: Option<u64>,
}

impl TunerArgs {
    fn build(&self) -> anyhow::Result<AutoTuner> {
        let tuner = AutoTuner::default()
            .with_trials(self.trials)
            .with_repeats(self.repeats)
            .with_startup_trials(self.trials.min(10))
            .with_seed(self.tuner_seed);
        tuner.validate()?;
        Ok(tuner)
    }
}

fn secs(value: Option<f64>) -> anyhow::Result<Option<Duration>> {
    value
        .map(|s| Duration::try_from_secs_f64(s).with_context(|| format!("invalid duration {s}")))
        .transpose()
}

fn load(path: &Path) -> anyhow::Result<Problem> {
    let problem =
        Problem::load(path).with_context(|| format!("loading problem {}", path.display()))?;
    tracing::info!(
        "Loaded {} with {} indicators ({} eligible), budget {} RU",
        path.display(),
        problem.len(),
        problem.eligible_count(),
        problem.budget()
    );
    Ok(problem)
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Serialize)]
struct RunRecord<T> {
    command: &'static str,
    start_ts: DateTime<Utc>,
    end_ts: DateTime<Utc>,
    runtime_ms: u128,
    report: T,
}

#[derive(Serialize)]
struct SolutionReport {
    solution: Solution,
    metrics: SolutionMetrics,
    changes: Vec<IndicatorChange>,
}

impl SolutionReport {
    fn new(problem: &Problem, solution: Solution) -> Self {
        Self {
            metrics: solution.metrics(problem),
            changes: solution.changes(),
            solution,
        }
    }
}

#[derive(Serialize)]
struct GeneticReport {
    config: GeneticConfig,
    best: SolutionReport,
    best_fitness: f64,
    fitness_history: Vec<f64>,
    generations_run: usize,
    stop_reason: StopReason,
    seed: u64,
    alternatives: Vec<Candidate>,
}

#[derive(Serialize)]
struct TuneReport {
    tuning: TuningResult,
    best: SolutionReport,
}

fn emit<T: Serialize>(
    out: Option<&Path>,
    command: &'static str,
    start_ts: DateTime<Utc>,
    t0: Instant,
    report: T,
) -> anyhow::Result<()> {
    let record = RunRecord {
        command,
        start_ts,
        end_ts: Utc::now(),
        runtime_ms: t0.elapsed().as_millis(),
        report,
    };
    let json = serde_json::to_string_pretty(&record)?;
    match out {
        Some(path) => {
            let mut f =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            f.write_all(json.as_bytes())?;
            f.write_all(b"\n")?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_genetic(
    problem: &Problem,
    config: GeneticConfig,
    alternatives: usize,
) -> anyhow::Result<GeneticReport> {
    let outcome = GeneticSolver::new(config.clone())?.solve(problem);
    let alternatives = outcome.top_solutions(alternatives);
    Ok(GeneticReport {
        config,
        best_fitness: outcome.best_fitness,
        generations_run: outcome.generations_run,
        stop_reason: outcome.stop_reason,
        seed: outcome.seed,
        best: SolutionReport::new(problem, outcome.best),
        fitness_history: outcome.fitness_history,
        alternatives,
    })
}

fn main() -> anyhow::Result<()> {
    enable_tracing();
    let cli = Cli::parse();
    let out = cli.out.as_deref();
    let start_ts = Utc::now();
    let t0 = Instant::now();

    match cli.command {
        Command::SolveGenetic {
            problem,
            genetic,
            alternatives,
        } => {
            let problem = load(&problem)?;
            let report = run_genetic(&problem, genetic.build()?, alternatives)?;
            emit(out, "solve-genetic", start_ts, t0, report)
        }
        Command::SolveExact {
            problem,
            subset,
            time_limit_secs,
        } => {
            let problem = load(&problem)?;
            let solver = ExactSolver::default().with_time_limit(secs(time_limit_secs)?);
            let solution = if subset.is_empty() {
                solver.solve(&problem)?
            } else {
                solver.solve_subset(&problem, &subset[..])?
            };
            emit(
                out,
                "solve-exact",
                start_ts,
                t0,
                SolutionReport::new(&problem, solution),
            )
        }
        Command::Tune { problem, tuner } => {
            let problem = load(&problem)?;
            let tuning = tuner.build()?.tune(&problem)?;
            let best = GeneticSolver::new(tuning.config.clone())?.solve(&problem).best;
            let report = TuneReport {
                best: SolutionReport::new(&problem, best),
                tuning,
            };
            emit(out, "tune", start_ts, t0, report)
        }
        Command::TopSubsets {
            problem,
            k,
            solver,
            genetic,
            tuner,
            time_limit_per_combination_secs,
            time_limit_secs,
            workers,
            leaderboard,
        } => {
            let problem = load(&problem)?;
            let evaluator = match solver {
                SolverKind::Genetic => SubsetEvaluator::Genetic(genetic.build()?),
                SolverKind::TunedGenetic => {
                    SubsetEvaluator::TunedGenetic(tuner.build()?.with_base(genetic.build()?))
                }
                SolverKind::Exact => SubsetEvaluator::Exact(ExactSolver::default()),
            };
            let report = SubsetSearch::new(k, evaluator)
                .with_time_limit_per_combination(secs(time_limit_per_combination_secs)?)
                .with_time_limit(secs(time_limit_secs)?)
                .with_workers(workers)
                .with_leaderboard_size(leaderboard)
                .with_seed(genetic.seed)
                .search(&problem)?;
            emit(out, "top-subsets", start_ts, t0, report)
        }
        Command::Scenario => {
            let json = ProblemDocument::from(university_scenario()).to_json_pretty()?;
            match out {
                Some(path) => std::fs::write(path, json + "\n")
                    .with_context(|| format!("writing {}", path.display()))?,
                None => println!("{json}"),
            }
            Ok(())
        }
    }
}
