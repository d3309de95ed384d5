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

use crate::monitor::stop::StopToken;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Why a cooperative check asked the caller to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interrupt {
    Cancelled,
    Deadline,
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupt::Cancelled => write!(f, "cancelled"),
            Interrupt::Deadline => write!(f, "deadline reached"),
        }
    }
}

/// An external stop token combined with an optional wall-clock deadline.
#[derive(Debug, Clone, Default)]
pub struct Termination {
    stop: StopToken,
    deadline: Option<Instant>,
}

impl Termination {
    #[inline]
    pub fn new(stop: StopToken) -> Self {
        Self {
            stop,
            deadline: None,
        }
    }

    /// Never interrupts on its own.
    #[inline]
    pub fn unbounded() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Deadline `limit` from now; `None` keeps the current deadline.
    #[inline]
    pub fn with_time_limit(self, limit: Option<Duration>) -> Self {
        match limit {
            Some(d) => {
                let deadline = Instant::now().checked_add(d);
                let earliest = match (self.deadline, deadline) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                self.with_deadline(earliest)
            }
            None => self,
        }
    }

    #[inline]
    pub fn stop_token(&self) -> &StopToken {
        &self.stop
    }

    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[inline]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// External cancellation wins over the deadline.
    #[inline]
    pub fn check(&self) -> Option<Interrupt> {
        if self.stop.is_requested() {
            return Some(Interrupt::Cancelled);
        }
        if let Some(d) = self.deadline
            && Instant::now() >= d
        {
            return Some(Interrupt::Deadline);
        }
        None
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.check().is_some()
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Termination{{ stop_set: {}, deadline: {} }}",
            self.stop.is_requested(),
            self.deadline.is_some()
        )
    }
}
