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

#[derive(Debug, Clone, PartialEq)]
pub enum TuneError {
    EmptyTrialBudget,
    ZeroRepeats,
    ZeroCandidates,
    InvalidGamma(f64),
    InvalidRange {
        name: &'static str,
        lo: u64,
        hi: u64,
    },
    /// Every trial failed, or cancellation came before the first one finished.
    NoSuccessfulTrial {
        trials: usize,
    },
}

impl std::fmt::Display for TuneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TuneError::EmptyTrialBudget => write!(f, "The tuner needs at least one trial"),
            TuneError::ZeroRepeats => write!(f, "Each trial needs at least one repeat"),
            TuneError::ZeroCandidates => {
                write!(f, "The sampler needs at least one candidate per proposal")
            }
            TuneError::InvalidGamma(g) => {
                write!(f, "Good-set fraction {g} must lie strictly between 0 and 1")
            }
            TuneError::InvalidRange { name, lo, hi } => {
                write!(f, "Search range for {name} is empty: [{lo}, {hi}]")
            }
            TuneError::NoSuccessfulTrial { trials } => {
                write!(f, "None of the {trials} tuning trials completed successfully")
            }
        }
    }
}

impl std::error::Error for TuneError {}
