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

/// Absolute tolerance used when comparing indicator values.
pub const VALUE_TOLERANCE: f64 = 1e-9;

/// Relative slack on budget comparisons. Only absorbs rounding in `Σ delta·cost`
/// (`(54.4 - 54.3) * 40.0` is `4.000000000000057`); it never admits a whole step.
pub const BUDGET_RELATIVE_TOLERANCE: f64 = 1e-12;

#[inline]
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= VALUE_TOLERANCE
}

/// Largest resource usage still accepted for `budget`.
#[inline]
pub fn budget_limit(budget: f64) -> f64 {
    budget + budget.abs() * BUDGET_RELATIVE_TOLERANCE
}

#[inline]
pub fn within_budget(resource_used: f64, budget: f64) -> bool {
    resource_used <= budget_limit(budget)
}
