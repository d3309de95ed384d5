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

use crate::problem::{err::ProblemError, indicator::Indicator, prob::Problem};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

/// Serialized form of a [`Problem`]:
///
/// ```json
/// { "budget": 200.0,
///   "indicators": [
///     { "key": "AR", "baseline": 6.5, "weight": 0.3, "cap": 15.0,
///       "max_increase": 1.0, "unit_cost": 100.0 },
///     { "key": "ISR", "baseline": 20.1, "weight": 0.05, "cap": 25.0,
///       "max_increase": 0.0, "unit_cost": "inf" } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDocument {
    pub budget: f64,
    pub indicators: Vec<Indicator>,
}

#[derive(Debug)]
pub enum ProblemLoaderError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Problem(ProblemError),
}

impl std::fmt::Display for ProblemLoaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProblemLoaderError::Io(e) => write!(f, "Failed to read problem: {e}"),
            ProblemLoaderError::Json(e) => write!(f, "Malformed problem document: {e}"),
            ProblemLoaderError::Problem(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ProblemLoaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProblemLoaderError::Io(e) => Some(e),
            ProblemLoaderError::Json(e) => Some(e),
            ProblemLoaderError::Problem(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ProblemLoaderError {
    fn from(e: std::io::Error) -> Self {
        ProblemLoaderError::Io(e)
    }
}

impl From<serde_json::Error> for ProblemLoaderError {
    fn from(e: serde_json::Error) -> Self {
        ProblemLoaderError::Json(e)
    }
}

impl From<ProblemError> for ProblemLoaderError {
    fn from(e: ProblemError) -> Self {
        ProblemLoaderError::Problem(e)
    }
}

impl ProblemDocument {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ProblemLoaderError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ProblemLoaderError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn into_problem(self) -> Result<Problem, ProblemError> {
        Problem::try_from(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Problem {
    /// Reads and validates a JSON problem document.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProblemLoaderError> {
        Ok(ProblemDocument::from_path(path)?.into_problem()?)
    }
}
