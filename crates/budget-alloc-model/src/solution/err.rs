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

use crate::problem::indicator::IndicatorKey;
use budget_alloc_core::interval::Bounds;

#[derive(Debug, Clone, PartialEq)]
pub enum SolutionError {
    LengthMismatch { expected: usize, actual: usize },
    KeyMismatch { position: usize, expected: IndicatorKey, found: IndicatorKey },
    NonFiniteValue { key: IndicatorKey, value: f64 },
    OutOfBounds { key: IndicatorKey, value: f64, bounds: Bounds },
    FrozenPerturbed { key: IndicatorKey, baseline: f64, value: f64 },
    OverBudget { resource_used: f64, budget: f64 },
}

impl std::fmt::Display for SolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolutionError::LengthMismatch { expected, actual } => write!(
                f,
                "Solution has {actual} values but the problem has {expected} indicators"
            ),
            SolutionError::KeyMismatch {
                position,
                expected,
                found,
            } => write!(
                f,
                "Solution entry {position} is {found} but the problem expects {expected}"
            ),
            SolutionError::NonFiniteValue { key, value } => {
                write!(f, "Indicator {key} has non-finite value {value}")
            }
            SolutionError::OutOfBounds { key, value, bounds } => {
                write!(f, "Indicator {key} value {value} lies outside {bounds}")
            }
            SolutionError::FrozenPerturbed {
                key,
                baseline,
                value,
            } => write!(
                f,
                "Frozen indicator {key} moved from its baseline {baseline} to {value}"
            ),
            SolutionError::OverBudget {
                resource_used,
                budget,
            } => write!(
                f,
                "Solution uses {resource_used} RU which exceeds the budget of {budget} RU"
            ),
        }
    }
}

impl std::error::Error for SolutionError {}
