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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorField {
    Baseline,
    Weight,
    Cap,
    MaxIncrease,
    UnitCost,
}

impl std::fmt::Display for IndicatorField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IndicatorField::Baseline => "baseline",
            IndicatorField::Weight => "weight",
            IndicatorField::Cap => "cap",
            IndicatorField::MaxIncrease => "max increase",
            IndicatorField::UnitCost => "unit cost",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvalidFieldError {
    key: IndicatorKey,
    field: IndicatorField,
    value: f64,
}

impl InvalidFieldError {
    pub fn new(key: IndicatorKey, field: IndicatorField, value: f64) -> Self {
        Self { key, field, value }
    }

    pub fn key(&self) -> &IndicatorKey {
        &self.key
    }

    pub fn field(&self) -> IndicatorField {
        self.field
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl std::fmt::Display for InvalidFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Indicator {} has invalid {} {}: expected a finite, non-negative number.",
            self.key, self.field, self.value
        )
    }
}

impl std::error::Error for InvalidFieldError {}

#[derive(Debug, Clone, PartialEq)]
pub struct BaselineAboveCapError {
    key: IndicatorKey,
    baseline: f64,
    cap: f64,
}

impl BaselineAboveCapError {
    pub fn new(key: IndicatorKey, baseline: f64, cap: f64) -> Self {
        Self { key, baseline, cap }
    }

    pub fn key(&self) -> &IndicatorKey {
        &self.key
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }
}

impl std::fmt::Display for BaselineAboveCapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Indicator {} has baseline {} above its cap {}.",
            self.key, self.baseline, self.cap
        )
    }
}

impl std::error::Error for BaselineAboveCapError {}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorError {
    InvalidField(InvalidFieldError),
    BaselineAboveCap(BaselineAboveCapError),
}

impl IndicatorError {
    pub fn key(&self) -> &IndicatorKey {
        match self {
            IndicatorError::InvalidField(e) => e.key(),
            IndicatorError::BaselineAboveCap(e) => e.key(),
        }
    }
}

impl std::fmt::Display for IndicatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndicatorError::InvalidField(e) => write!(f, "{e}"),
            IndicatorError::BaselineAboveCap(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for IndicatorError {}

impl From<InvalidFieldError> for IndicatorError {
    fn from(e: InvalidFieldError) -> Self {
        IndicatorError::InvalidField(e)
    }
}

impl From<BaselineAboveCapError> for IndicatorError {
    fn from(e: BaselineAboveCapError) -> Self {
        IndicatorError::BaselineAboveCap(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DuplicateIndicatorError {
    key: IndicatorKey,
}

impl DuplicateIndicatorError {
    pub fn new(key: IndicatorKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &IndicatorKey {
        &self.key
    }
}

impl std::fmt::Display for DuplicateIndicatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Indicator {} appears more than once.", self.key)
    }
}

impl std::error::Error for DuplicateIndicatorError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidBudgetError {
    value: f64,
}

impl InvalidBudgetError {
    pub fn new(value: f64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl std::fmt::Display for InvalidBudgetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Invalid budget {}: expected a finite, non-negative number of resource units.",
            self.value
        )
    }
}

impl std::error::Error for InvalidBudgetError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnknownIndicatorError {
    key: IndicatorKey,
}

impl UnknownIndicatorError {
    pub fn new(key: IndicatorKey) -> Self {
        Self { key }
    }

    pub fn key(&self) -> &IndicatorKey {
        &self.key
    }
}

impl std::fmt::Display for UnknownIndicatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown indicator {}.", self.key)
    }
}

impl std::error::Error for UnknownIndicatorError {}

/// Raised before any solver runs when a problem definition is malformed.
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemError {
    Indicator(IndicatorError),
    DuplicateIndicator(DuplicateIndicatorError),
    InvalidBudget(InvalidBudgetError),
    UnknownIndicator(UnknownIndicatorError),
    EmptySubset,
}

impl std::fmt::Display for ProblemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProblemError::Indicator(e) => write!(f, "Invalid problem: {e}"),
            ProblemError::DuplicateIndicator(e) => write!(f, "Invalid problem: {e}"),
            ProblemError::InvalidBudget(e) => write!(f, "Invalid problem: {e}"),
            ProblemError::UnknownIndicator(e) => write!(f, "Invalid problem: {e}"),
            ProblemError::EmptySubset => {
                write!(f, "Invalid problem: the indicator subset is empty.")
            }
        }
    }
}

impl std::error::Error for ProblemError {}

impl From<IndicatorError> for ProblemError {
    fn from(e: IndicatorError) -> Self {
        ProblemError::Indicator(e)
    }
}

impl From<InvalidFieldError> for ProblemError {
    fn from(e: InvalidFieldError) -> Self {
        ProblemError::Indicator(e.into())
    }
}

impl From<BaselineAboveCapError> for ProblemError {
    fn from(e: BaselineAboveCapError) -> Self {
        ProblemError::Indicator(e.into())
    }
}

impl From<DuplicateIndicatorError> for ProblemError {
    fn from(e: DuplicateIndicatorError) -> Self {
        ProblemError::DuplicateIndicator(e)
    }
}

impl From<InvalidBudgetError> for ProblemError {
    fn from(e: InvalidBudgetError) -> Self {
        ProblemError::InvalidBudget(e)
    }
}

impl From<UnknownIndicatorError> for ProblemError {
    fn from(e: UnknownIndicatorError) -> Self {
        ProblemError::UnknownIndicator(e)
    }
}
