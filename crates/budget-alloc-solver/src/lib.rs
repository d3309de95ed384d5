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

pub mod api;
pub mod eval;
pub mod exact;
pub mod genetic;
pub mod monitor;
pub mod subset;
pub mod support;
pub mod tune;

pub mod prelude {
    pub use crate::api::{search_top_subsets, solve_exact, solve_genetic, tune_genetic};
    pub use crate::eval::fitness::{Evaluation, Feasibility, FitnessEvaluator};
    pub use crate::exact::{ExactSolver, ExactSolverError};
    pub use crate::genetic::{
        Candidate, Crossover, GeneticConfig, GeneticConfigError, GeneticOutcome, GeneticSolver,
        ParentSelection, StopReason,
    };
    pub use crate::monitor::{
        stop::StopToken,
        termination::{Interrupt, Termination},
    };
    pub use crate::subset::{
        SubsetEvaluator, SubsetFailure, SubsetResult, SubsetSearch, SubsetSearchError,
        SubsetSearchReport,
    };
    pub use crate::tune::{
        AutoTuner, GeneticParams, IntRange, ParamSpace, TrialRecord, TrialStatus, TuneError,
        TuningResult,
    };
}
