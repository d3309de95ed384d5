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

use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidBoundsError<F> {
    lo: F,
    hi: F,
}

impl<F: Copy> InvalidBoundsError<F> {
    pub fn new(lo: F, hi: F) -> Self {
        Self { lo, hi }
    }

    pub fn lo(&self) -> F {
        self.lo
    }

    pub fn hi(&self) -> F {
        self.hi
    }
}

impl<F: Display> std::fmt::Display for InvalidBoundsError<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid bounds [{}, {}]: both ends must be finite and lo <= hi.",
            self.lo, self.hi
        )
    }
}

impl<F: Debug + Display> std::error::Error for InvalidBoundsError<F> {}

/// A closed interval `[lo, hi]` of admissible values.
///
/// A degenerate interval (`lo == hi`) is a single admissible point; this is how
/// frozen indicators are represented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<F = f64> {
    lo: F,
    hi: F,
}

impl<F: Float> Bounds<F> {
    #[inline]
    pub fn new(lo: F, hi: F) -> Result<Self, InvalidBoundsError<F>> {
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(InvalidBoundsError::new(lo, hi));
        }
        Ok(Self { lo, hi })
    }

    #[inline]
    pub fn point(value: F) -> Self {
        Self { lo: value, hi: value }
    }

    #[inline]
    pub fn lo(&self) -> F {
        self.lo
    }

    #[inline]
    pub fn hi(&self) -> F {
        self.hi
    }

    #[inline]
    pub fn width(&self) -> F {
        self.hi - self.lo
    }

    #[inline]
    pub fn is_point(&self) -> bool {
        self.lo == self.hi
    }

    #[inline]
    pub fn contains(&self, value: F) -> bool {
        value >= self.lo && value <= self.hi
    }

    /// Clamps `value` into the interval. NaN collapses to `lo`.
    #[inline]
    pub fn clamp(&self, value: F) -> F {
        if value.is_nan() || value < self.lo {
            self.lo
        } else if value > self.hi {
            self.hi
        } else {
            value
        }
    }
}

impl<F: Display> std::fmt::Display for Bounds<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lo, self.hi)
    }
}
