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

use crate::interval::Bounds;
use serde::{Deserialize, Serialize};

/// Granularity, in the indicator's native unit, to which increases are rounded.
pub const DEFAULT_STEP: f64 = 0.1;

// Guards `floor(width / step)` against results like 2.9999999999999996.
const STEP_COUNT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidStepError {
    value: f64,
}

impl InvalidStepError {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl std::fmt::Display for InvalidStepError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid quantization step {}. The step must be finite and positive.",
            self.value
        )
    }
}

impl std::error::Error for InvalidStepError {}

/// Maps values inside a [`Bounds`] onto an integer grid anchored at the lower end.
///
/// Grid point `k` is `lo + k * step`, and `k` ranges over `0..=max_steps(bounds)`.
/// Values are clamped to `hi`, so the top grid point never leaves the interval
/// because of floating-point drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantizer {
    step: f64,
}

impl Default for Quantizer {
    fn default() -> Self {
        Self { step: DEFAULT_STEP }
    }
}

impl Quantizer {
    #[inline]
    pub fn new(step: f64) -> Result<Self, InvalidStepError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(InvalidStepError::new(step));
        }
        Ok(Self { step })
    }

    #[inline]
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of whole steps that fit into a span of length `span`.
    #[inline]
    pub fn steps_in(&self, span: f64) -> u32 {
        if span.is_nan() || span <= 0.0 {
            return 0;
        }
        let raw = (span / self.step + STEP_COUNT_EPSILON).floor();
        if raw >= u32::MAX as f64 {
            u32::MAX
        } else {
            raw as u32
        }
    }

    #[inline]
    pub fn max_steps(&self, bounds: &Bounds) -> u32 {
        self.steps_in(bounds.width())
    }

    /// Value of grid point `steps`; the zero step is exactly `lo`.
    #[inline]
    pub fn value_at(&self, bounds: &Bounds, steps: u32) -> f64 {
        if steps == 0 {
            return bounds.lo();
        }
        let steps = steps.min(self.max_steps(bounds));
        (bounds.lo() + steps as f64 * self.step).min(bounds.hi())
    }

    /// Index of the grid point nearest to `value`, clamped into the grid.
    #[inline]
    pub fn steps_of(&self, bounds: &Bounds, value: f64) -> u32 {
        if value.is_nan() || value <= bounds.lo() {
            return 0;
        }
        let max = self.max_steps(bounds);
        let k = ((value - bounds.lo()) / self.step).round();
        if k >= max as f64 { max } else { k as u32 }
    }

    /// Snaps `value` onto the nearest admissible grid point.
    #[inline]
    pub fn snap(&self, bounds: &Bounds, value: f64) -> f64 {
        self.value_at(bounds, self.steps_of(bounds, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn b(lo: f64, hi: f64) -> Bounds {
        Bounds::new(lo, hi).unwrap()
    }

    #[test]
    fn rejects_non_positive_steps() {
        assert!(Quantizer::new(0.0).is_err());
        assert!(Quantizer::new(-0.1).is_err());
        assert!(Quantizer::new(f64::NAN).is_err());
        assert!(Quantizer::new(0.5).is_ok());
    }

    #[test]
    fn counts_steps_despite_decimal_noise() {
        let q = Quantizer::default();
        // 0.3 / 0.1 == 2.9999999999999996 in binary floating point.
        assert_eq!(q.steps_in(0.3), 3);
        assert_eq!(q.steps_in(1.0), 10);
        assert_eq!(q.steps_in(2.0), 20);
        assert_eq!(q.steps_in(0.05), 0);
        assert_eq!(q.steps_in(0.0), 0);
        assert_eq!(q.steps_in(-1.0), 0);
    }

    #[test]
    fn top_grid_point_stays_inside_bounds() {
        let q = Quantizer::default();
        let bounds = b(1.3, 1.6);
        let top = q.value_at(&bounds, q.max_steps(&bounds));
        assert!(top <= bounds.hi());
        assert!((top - 1.6).abs() < 1e-12);
    }

    #[test]
    fn zero_steps_is_exactly_the_lower_end() {
        let q = Quantizer::default();
        let bounds = b(20.1, 20.1);
        assert_eq!(q.max_steps(&bounds), 0);
        assert_eq!(q.value_at(&bounds, 0), 20.1);
        assert_eq!(q.snap(&bounds, 23.0), 20.1);
    }

    #[test]
    fn off_grid_upper_end_is_not_reachable() {
        let q = Quantizer::default();
        let bounds = b(1.0, 1.25);
        assert_eq!(q.max_steps(&bounds), 2);
        assert!((q.snap(&bounds, 1.25) - 1.2).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn snap_always_lands_inside_bounds(
            lo in 0.0f64..100.0,
            width in 0.0f64..10.0,
            value in -50.0f64..150.0,
        ) {
            let q = Quantizer::default();
            let bounds = b(lo, lo + width);
            let snapped = q.snap(&bounds, value);
            prop_assert!(bounds.contains(snapped));
        }
    }
}
