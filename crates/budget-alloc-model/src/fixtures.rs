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

use crate::problem::{builder::ProblemBuilder, prob::Problem};

/// `(key, baseline, weight, cap, max_increase, unit_cost)`
pub const UNIVERSITY_INDICATORS: [(&str, f64, f64, f64, f64, f64); 9] = [
    ("AR", 6.5, 0.30, 15.0, 1.0, 100.0),
    ("ER", 10.6, 0.15, 20.0, 1.0, 90.0),
    ("FSR", 54.3, 0.10, 70.0, 1.0, 40.0),
    ("CPF", 1.3, 0.20, 3.0, 0.3, 30.0),
    ("IFR", 1.7, 0.05, 12.0, 2.0, 60.0),
    ("ISR", 20.1, 0.05, 25.0, 0.0, f64::INFINITY),
    ("IRN", 11.4, 0.05, 30.0, 5.0, 20.0),
    ("EO", 4.0, 0.05, 15.0, 2.0, 20.0),
    ("SUS", 1.6, 0.05, 10.0, 1.0, 10.0),
];

pub const UNIVERSITY_BUDGET: f64 = 200.0;

/// Nine ranking indicators with a 200 RU budget. `ISR` is frozen twice over:
/// zero allowed increase and an infinite unit cost.
pub fn university_scenario() -> Problem {
    let mut builder = ProblemBuilder::with_capacity(UNIVERSITY_INDICATORS.len());
    for &(key, baseline, weight, cap, max_inc, cost) in &UNIVERSITY_INDICATORS {
        builder
            .indicator(key, baseline, weight, cap, max_inc, cost)
            .expect("fixture indicator is valid");
    }
    builder
        .with_budget(UNIVERSITY_BUDGET)
        .build()
        .expect("fixture problem is valid")
}
