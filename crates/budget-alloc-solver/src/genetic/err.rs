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
pub enum GeneticConfigError {
    PopulationTooSmall(usize),
    ZeroParents,
    ParentsExceedPopulation { parents: usize, population: usize },
    ElitismExceedsPopulation { elitism: usize, population: usize },
    InvalidMutationPercent(f64),
    InvalidMutationRange { lo: f64, hi: f64 },
    InvalidPenaltyFactor(f64),
    InvalidFrozenRejection(f64),
    InvalidStep(f64),
    InvalidTournamentSize(usize),
}

impl std::fmt::Display for GeneticConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneticConfigError::PopulationTooSmall(n) => {
                write!(f, "Population size {n} is too small; at least 2 individuals are required")
            }
            GeneticConfigError::ZeroParents => write!(f, "At least one mating parent is required"),
            GeneticConfigError::ParentsExceedPopulation {
                parents,
                population,
            } => write!(
                f,
                "Cannot select {parents} mating parents from a population of {population}"
            ),
            GeneticConfigError::ElitismExceedsPopulation {
                elitism,
                population,
            } => write!(
                f,
                "Cannot keep {elitism} elites in a population of {population}"
            ),
            GeneticConfigError::InvalidMutationPercent(p) => {
                write!(f, "Mutation percentage {p} is outside 0..=100")
            }
            GeneticConfigError::InvalidMutationRange { lo, hi } => {
                write!(f, "Invalid mutation range [{lo}, {hi}]")
            }
            GeneticConfigError::InvalidPenaltyFactor(k) => {
                write!(f, "Penalty factor {k} must be finite and positive")
            }
            GeneticConfigError::InvalidFrozenRejection(v) => {
                write!(f, "Frozen rejection fitness {v} must be finite and negative")
            }
            GeneticConfigError::InvalidStep(s) => {
                write!(f, "Gene step {s} must be finite and positive")
            }
            GeneticConfigError::InvalidTournamentSize(k) => {
                write!(f, "Tournament size {k} must be at least 1")
            }
        }
    }
}

impl std::error::Error for GeneticConfigError {}
