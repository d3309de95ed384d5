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

use crate::exact::{err::ExactSolverError, program::IntegerProgram};
use budget_alloc_core::{
    quantize::{DEFAULT_STEP, Quantizer},
    tolerance::within_budget,
};
use budget_alloc_model::{problem::prob::Problem, solution::sol::Solution};
use serde::{Deserialize, Serialize};
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc::{RecvTimeoutError, channel},
    },
    thread,
    time::Duration,
};

/// Solves the quantized allocation to global optimality as an integer program.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExactSolver {
    pub step: f64,
    /// Wall-clock limit on the backend; `None` waits for it to finish.
    pub time_limit: Option<Duration>,
}

impl Default for ExactSolver {
    fn default() -> Self {
        Self {
            step: DEFAULT_STEP,
            time_limit: None,
        }
    }
}

impl ExactSolver {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    #[inline]
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    #[tracing::instrument(level = "debug", name = "Exact Solve", skip_all, fields(indicators = problem.len()))]
    pub fn solve(&self, problem: &Problem) -> Result<Solution, ExactSolverError> {
        let quantizer = Quantizer::new(self.step)?;
        let program = IntegerProgram::from_problem(problem, quantizer);

        let mut steps = match self.time_limit {
            None => program.solve()?,
            Some(limit) => solve_detached(program.clone(), limit)?,
        };

        let bounds = problem.bounds();
        let mut values = problem.baseline_values();
        // Grid values drift from `k * step` by a few ulps; the hard budget is
        // checked on the values actually returned.
        loop {
            for (var, &k) in program.variables().iter().zip(&steps) {
                values[var.position] = quantizer.value_at(&bounds[var.position], k);
            }
            if within_budget(problem.resource_of(&values), problem.budget())
                || !program.drop_least_efficient(&mut steps)
            {
                break;
            }
        }

        let solution = Solution::from_values(problem, values)
            .map_err(|e| ExactSolverError::Backend(e.to_string()))?;
        tracing::debug!(
            score = solution.score(),
            resource_used = solution.resource_used(),
            variables = program.variables().len(),
            "Exact: solved"
        );
        Ok(solution)
    }

    /// Solves the problem with every indicator outside `keys` frozen.
    pub fn solve_subset<K: AsRef<str>>(
        &self,
        problem: &Problem,
        keys: &[K],
    ) -> Result<Solution, ExactSolverError> {
        let derived = problem.freeze_all_except(keys)?;
        self.solve(&derived)
    }
}

/// Upper bound on time-limited workers alive at once, timed-out ones included.
pub const MAX_DETACHED_WORKERS: usize = 16;

static DETACHED_WORKERS: WorkerSlots = WorkerSlots::new(MAX_DETACHED_WORKERS);

/// Counting cap on live worker threads.
#[derive(Debug)]
struct WorkerSlots {
    live: AtomicUsize,
    max: usize,
}

impl WorkerSlots {
    const fn new(max: usize) -> Self {
        Self {
            live: AtomicUsize::new(0),
            max,
        }
    }

    fn try_acquire(&'static self) -> Option<WorkerSlot> {
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max).then_some(n + 1)
            })
            .ok()
            .map(|_| WorkerSlot { slots: self })
    }

    fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

/// Held by a worker thread until it exits.
#[derive(Debug)]
struct WorkerSlot {
    slots: &'static WorkerSlots,
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.slots.live.fetch_sub(1, Ordering::AcqRel);
    }
}

// The backend has no interrupt hook: on timeout the worker is left to finish
// on its own and its result is discarded. It keeps its slot until then.
fn solve_detached(program: IntegerProgram, limit: Duration) -> Result<Vec<u32>, ExactSolverError> {
    let slot = DETACHED_WORKERS
        .try_acquire()
        .ok_or(ExactSolverError::WorkerLimit(MAX_DETACHED_WORKERS))?;
    tracing::trace!(live = DETACHED_WORKERS.live(), "Exact: worker slot acquired");

    let (tx, rx) = channel();
    thread::Builder::new()
        .name("exact-worker".into())
        .spawn(move || {
            let _slot = slot;
            let res = catch_unwind(AssertUnwindSafe(|| program.solve()));
            let _ = tx.send(res);
        })
        .map_err(|e| ExactSolverError::Backend(e.to_string()))?;

    match rx.recv_timeout(limit) {
        Ok(Ok(res)) => res,
        Ok(Err(_)) => Err(ExactSolverError::Backend("MIP worker panicked".into())),
        Err(RecvTimeoutError::Timeout) => Err(ExactSolverError::TimedOut(limit)),
        Err(RecvTimeoutError::Disconnected) => {
            Err(ExactSolverError::Backend("MIP worker disconnected".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budget_alloc_model::{fixtures::university_scenario, problem::indicator::Indicator};

    fn small() -> Problem {
        Problem::new(
            vec![
                Indicator::new("A", 1.0, 0.5, 5.0, 0.5, 10.0).unwrap(),
                Indicator::new("B", 2.0, 0.3, 5.0, 0.4, 5.0).unwrap(),
                Indicator::new("C", 0.0, 0.2, 5.0, 0.3, 1.0).unwrap(),
                Indicator::new("D", 3.0, 0.9, 5.0, 1.0, f64::INFINITY).unwrap(),
            ],
            6.0,
        )
        .unwrap()
    }

    fn brute_force(problem: &Problem) -> f64 {
        let q = Quantizer::default();
        let bounds = problem.bounds();
        let max: Vec<u32> = bounds.iter().map(|b| q.max_steps(b)).collect();
        let mut best = f64::NEG_INFINITY;
        for a in 0..=max[0] {
            for b in 0..=max[1] {
                for c in 0..=max[2] {
                    let mut v = problem.baseline_values();
                    v[0] = q.value_at(&bounds[0], a);
                    v[1] = q.value_at(&bounds[1], b);
                    v[2] = q.value_at(&bounds[2], c);
                    if within_budget(problem.resource_of(&v), problem.budget()) {
                        best = best.max(problem.score_of(&v));
                    }
                }
            }
        }
        best
    }

    #[test]
    fn matches_brute_force() {
        let p = small();
        let s = ExactSolver::default().solve(&p).unwrap();
        assert!((s.score() - brute_force(&p)).abs() < 1e-9);
        assert!(s.validate(&p).is_ok());
        assert_eq!(s.value_of("D"), Some(3.0));
    }

    #[test]
    fn scenario_respects_every_rule() {
        let p = university_scenario();
        let s = ExactSolver::default().solve(&p).unwrap();
        assert_eq!(s.value_of("ISR"), Some(20.1));
        assert!(within_budget(s.resource_used(), p.budget()));
        assert!(s.score() >= p.current_score());
        assert!(s.validate(&p).is_ok());
    }

    #[test]
    fn budget_just_below_one_step_is_never_overspent() {
        let p = Problem::new(
            vec![Indicator::new("A", 0.0, 1.0, 5.0, 1.0, 10.0).unwrap()],
            0.9999995,
        )
        .unwrap();
        let s = ExactSolver::default().solve(&p).unwrap();
        assert_eq!(s.value_of("A"), Some(0.0));
        assert!(s.resource_used() <= p.budget());
    }

    #[test]
    fn expired_time_limit_reports_timeout() {
        let p = university_scenario();
        let err = ExactSolver::default()
            .with_time_limit(Some(Duration::ZERO))
            .solve(&p)
            .unwrap_err();
        assert_eq!(err, ExactSolverError::TimedOut(Duration::ZERO));
    }

    #[test]
    fn worker_slots_cap_live_workers() {
        static SLOTS: WorkerSlots = WorkerSlots::new(2);
        let a = SLOTS.try_acquire().unwrap();
        let b = SLOTS.try_acquire().unwrap();
        assert!(SLOTS.try_acquire().is_none());
        assert_eq!(SLOTS.live(), 2);

        drop(a);
        let c = SLOTS.try_acquire().unwrap();
        assert!(SLOTS.try_acquire().is_none());
        drop((b, c));
        assert_eq!(SLOTS.live(), 0);
    }

    #[test]
    fn worker_slot_is_released_when_the_thread_exits() {
        static SLOTS: WorkerSlots = WorkerSlots::new(1);
        let slot = SLOTS.try_acquire().unwrap();
        thread::spawn(move || {
            let _slot = slot;
            panic!("worker failure");
        })
        .join()
        .unwrap_err();
        assert_eq!(SLOTS.live(), 0);
        assert!(SLOTS.try_acquire().is_some());
    }

    #[test]
    fn zero_budget_keeps_baseline() {
        let p = university_scenario().with_budget(0.0).unwrap();
        let s = ExactSolver::default().solve(&p).unwrap();
        assert_eq!(s.values(), p.baseline_values());
    }

    #[test]
    fn subset_solve_only_moves_the_subset() {
        let p = university_scenario();
        let s = ExactSolver::default().solve_subset(&p, &["SUS", "EO"]).unwrap();
        for e in s.entries() {
            if e.key.as_str() != "SUS" && e.key.as_str() != "EO" {
                assert_eq!(e.value, e.baseline);
            }
        }
        assert!(s.value_of("SUS").unwrap() > 1.6);
    }

    #[test]
    fn unknown_subset_key_is_reported() {
        let p = university_scenario();
        let err = ExactSolver::default().solve_subset(&p, &["XX"]).unwrap_err();
        assert!(matches!(err, ExactSolverError::InvalidSubset(_)));
    }

    #[test]
    fn invalid_step_is_rejected() {
        let p = university_scenario();
        let err = ExactSolver::default().with_step(0.0).solve(&p).unwrap_err();
        assert!(matches!(err, ExactSolverError::InvalidStep(_)));
    }

    #[test]
    fn generous_time_limit_matches_unbounded_solve() {
        let p = university_scenario();
        let a = ExactSolver::default().solve(&p).unwrap();
        let b = ExactSolver::default()
            .with_time_limit(Some(Duration::from_secs(30)))
            .solve(&p)
            .unwrap();
        assert!((a.score() - b.score()).abs() < 1e-9);
    }
}
