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

use crate::problem::{
    err::{IndicatorError, ProblemError},
    indicator::{Indicator, IndicatorKey, UnitCost},
    prob::Problem,
};

/// Incremental construction of a [`Problem`]; indicator order is insertion order.
#[derive(Debug, Clone, Default)]
pub struct ProblemBuilder {
    indicators: Vec<Indicator>,
    budget: f64,
}

impl ProblemBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_capacity(indicators: usize) -> Self {
        Self {
            indicators: Vec::with_capacity(indicators),
            budget: 0.0,
        }
    }

    #[inline]
    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = budget;
        self
    }

    #[inline]
    pub fn with_indicators<I>(mut self, indicators: I) -> Self
    where
        I: IntoIterator<Item = Indicator>,
    {
        self.indicators.clear();
        self.indicators.extend(indicators);
        self
    }

    #[inline]
    pub fn add_indicator(&mut self, indicator: Indicator) -> &mut Self {
        self.indicators.push(indicator);
        self
    }

    #[inline]
    pub fn extend_indicators<I>(&mut self, it: I) -> &mut Self
    where
        I: IntoIterator<Item = Indicator>,
    {
        self.indicators.extend(it);
        self
    }

    /// Validates and appends one indicator from its raw fields.
    pub fn indicator(
        &mut self,
        key: impl Into<IndicatorKey>,
        baseline: f64,
        weight: f64,
        cap: f64,
        max_increase: f64,
        unit_cost: impl Into<UnitCost>,
    ) -> Result<&mut Self, IndicatorError> {
        let ind = Indicator::new(key, baseline, weight, cap, max_increase, unit_cost)?;
        self.indicators.push(ind);
        Ok(self)
    }

    #[inline]
    pub fn set_budget(&mut self, budget: f64) -> &mut Self {
        self.budget = budget;
        self
    }

    #[inline]
    pub fn build(self) -> Result<Problem, ProblemError> {
        Problem::new(self.indicators, self.budget)
    }
}
