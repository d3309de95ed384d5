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

use budget_alloc_core::quantize::InvalidStepError;
use budget_alloc_model::problem::err::ProblemError;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ExactSolverError {
    /// No assignment satisfies the constraint set, e.g. a negative budget.
    Infeasible,
    Unbounded,
    Backend(String),
    TimedOut(Duration),
    /// Too many time-limited workers are still running.
    WorkerLimit(usize),
    InvalidStep(InvalidStepError),
    InvalidSubset(ProblemError),
}

impl std::fmt::Display for ExactSolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExactSolverError::Infeasible => write!(f, "The integer program is infeasible"),
            ExactSolverError::Unbounded => write!(f, "The integer program is unbounded"),
            ExactSolverError::Backend(msg) => write!(f, "MIP backend failed: {msg}"),
            ExactSolverError::TimedOut(d) => {
                write!(f, "The integer program was not solved within {d:?}")
            }
            ExactSolverError::WorkerLimit(n) => {
                write!(f, "All {n} exact worker slots are busy")
            }
            ExactSolverError::InvalidStep(e) => write!(f, "{e}"),
            ExactSolverError::InvalidSubset(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ExactSolverError {}

impl From<InvalidStepError> for ExactSolverError {
    fn from(e: InvalidStepError) -> Self {
        ExactSolverError::InvalidStep(e)
    }
}

impl From<ProblemError> for ExactSolverError {
    fn from(e: ProblemError) -> Self {
        ExactSolverError::InvalidSubset(e)
    }
}

impl From<good_lp::ResolutionError> for ExactSolverError {
    fn from(e: good_lp::ResolutionError) -> Self {
        match e {
            good_lp::ResolutionError::Infeasible => ExactSolverError::Infeasible,
            good_lp::ResolutionError::Unbounded => ExactSolverError::Unbounded,
            other => ExactSolverError::Backend(other.to_string()),
        }
    }
}
