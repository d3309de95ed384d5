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

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubsetSearchError {
    ZeroSubsetSize,
    NotEnoughEligible { eligible: usize, k: usize },
    ZeroWorkers,
    ThreadPool(String),
}

impl std::fmt::Display for SubsetSearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubsetSearchError::ZeroSubsetSize => write!(f, "Subset size must be at least 1"),
            SubsetSearchError::NotEnoughEligible { eligible, k } => write!(
                f,
                "Cannot choose subsets of {k} from only {eligible} eligible indicators"
            ),
            SubsetSearchError::ZeroWorkers => write!(f, "At least one worker is required"),
            SubsetSearchError::ThreadPool(msg) => {
                write!(f, "Failed to start the worker pool: {msg}")
            }
        }
    }
}

impl std::error::Error for SubsetSearchError {}
