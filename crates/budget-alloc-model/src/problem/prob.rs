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
    builder::ProblemBuilder,
    document::ProblemDocument,
    err::{DuplicateIndicatorError, InvalidBudgetError, ProblemError, UnknownIndicatorError},
    indicator::{Indicator, IndicatorKey},
};
use budget_alloc_core::interval::Bounds;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// An ordered, key-unique set of indicators plus the global budget.
///
/// Indicator order is the index order every solver uses for its value vectors.
/// A `Problem` is immutable once built; derived problems are fresh values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProblemDocument", into = "ProblemDocument")]
pub struct Problem {
    indicators: Vec<Indicator>,
    positions: HashMap<IndicatorKey, usize>,
    budget: f64,
}

#[inline]
fn check_budget(budget: f64) -> Result<(), InvalidBudgetError> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(InvalidBudgetError::new(budget));
    }
    Ok(())
}

impl Problem {
    pub fn new(indicators: Vec<Indicator>, budget: f64) -> Result<Self, ProblemError> {
        check_budget(budget)?;

        let mut positions = HashMap::with_capacity(indicators.len());
        for (i, ind) in indicators.iter().enumerate() {
            if positions.insert(ind.key().clone(), i).is_some() {
                return Err(DuplicateIndicatorError::new(ind.key().clone()).into());
            }
        }

        Ok(Self {
            indicators,
            positions,
            budget,
        })
    }

    #[inline]
    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Indicator> {
        self.indicators.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    #[inline]
    pub fn budget(&self) -> f64 {
        self.budget
    }

    #[inline]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Indicator> {
        self.position(key).map(|i| &self.indicators[i])
    }

    pub fn keys(&self) -> impl Iterator<Item = &IndicatorKey> + '_ {
        self.indicators.iter().map(Indicator::key)
    }

    /// Admissible interval of every indicator, in problem order.
    pub fn bounds(&self) -> Vec<Bounds> {
        self.indicators.iter().map(Indicator::bounds).collect()
    }

    pub fn eligible_keys(&self) -> Vec<IndicatorKey> {
        self.indicators
            .iter()
            .filter(|i| i.is_eligible())
            .map(|i| i.key().clone())
            .collect()
    }

    pub fn eligible_count(&self) -> usize {
        self.indicators.iter().filter(|i| i.is_eligible()).count()
    }

    pub fn baseline_values(&self) -> Vec<f64> {
        self.indicators.iter().map(Indicator::baseline).collect()
    }

    /// `Σ value·weight` over a vector in problem order.
    pub fn score_of(&self, values: &[f64]) -> f64 {
        self.indicators
            .iter()
            .zip(values)
            .map(|(ind, &v)| ind.contribution(v))
            .sum()
    }

    /// `Σ max(0, value − baseline)·unit_cost` over finite-cost indicators.
    pub fn resource_of(&self, values: &[f64]) -> f64 {
        self.indicators
            .iter()
            .zip(values)
            .map(|(ind, &v)| ind.cost_of(v))
            .sum()
    }

    /// Score of leaving every indicator at its baseline.
    pub fn current_score(&self) -> f64 {
        self.indicators
            .iter()
            .map(|i| i.contribution(i.baseline()))
            .sum()
    }

    /// Derives a problem in which every indicator outside `keep` is frozen.
    pub fn freeze_all_except<K>(&self, keep: &[K]) -> Result<Self, ProblemError>
    where
        K: AsRef<str>,
    {
        if keep.is_empty() {
            return Err(ProblemError::EmptySubset);
        }
        let mut kept = HashSet::with_capacity(keep.len());
        for k in keep {
            let pos = self
                .position(k.as_ref())
                .ok_or_else(|| UnknownIndicatorError::new(IndicatorKey::new(k.as_ref())))?;
            kept.insert(pos);
        }

        let indicators = self
            .indicators
            .iter()
            .enumerate()
            .map(|(i, ind)| {
                if kept.contains(&i) {
                    ind.clone()
                } else {
                    ind.frozen()
                }
            })
            .collect();

        Ok(Self {
            indicators,
            positions: self.positions.clone(),
            budget: self.budget,
        })
    }

    pub fn with_budget(&self, budget: f64) -> Result<Self, ProblemError> {
        check_budget(budget)?;
        Ok(Self {
            budget,
            ..self.clone()
        })
    }
}

impl TryFrom<ProblemDocument> for Problem {
    type Error = ProblemError;

    fn try_from(doc: ProblemDocument) -> Result<Self, Self::Error> {
        ProblemBuilder::with_capacity(doc.indicators.len())
            .with_indicators(doc.indicators)
            .with_budget(doc.budget)
            .build()
    }
}

impl From<Problem> for ProblemDocument {
    fn from(p: Problem) -> Self {
        ProblemDocument {
            budget: p.budget,
            indicators: p.indicators,
        }
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Problem(indicators: {}, eligible: {}, budget: {})",
            self.len(),
            self.eligible_count(),
            self.budget
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::university_scenario;

    fn ind(key: &str, base: f64, max_inc: f64, cost: f64) -> Indicator {
        Indicator::new(key, base, 1.0, base + 10.0, max_inc, cost).unwrap()
    }

    #[test]
    fn rejects_negative_budget() {
        let err = Problem::new(vec![ind("A", 1.0, 1.0, 1.0)], -1.0).unwrap_err();
        assert!(matches!(err, ProblemError::InvalidBudget(_)));
        assert!(Problem::new(vec![], f64::NAN).is_err());
    }

    #[test]
    fn rejects_duplicate_keys() {
        let err = Problem::new(
            vec![ind("A", 1.0, 1.0, 1.0), ind("A", 2.0, 1.0, 1.0)],
            10.0,
        )
        .unwrap_err();
        assert!(matches!(err, ProblemError::DuplicateIndicator(_)));
    }

    #[test]
    fn scenario_current_score() {
        let p = university_scenario();
        assert!((p.current_score() - 11.17).abs() < 1e-9);
        assert_eq!(p.score_of(&p.baseline_values()), p.current_score());
        assert_eq!(p.resource_of(&p.baseline_values()), 0.0);
    }

    #[test]
    fn eligible_keys_skip_frozen() {
        let p = university_scenario();
        let keys = p.eligible_keys();
        assert_eq!(keys.len(), 8);
        assert!(!keys.iter().any(|k| k.as_str() == "ISR"));
    }

    #[test]
    fn freeze_all_except_freezes_the_rest() {
        let p = university_scenario();
        let d = p.freeze_all_except(&["AR", "SUS"]).unwrap();
        assert_eq!(d.eligible_keys().len(), 2);
        assert!(d.get("ER").unwrap().is_frozen());
        assert!(d.get("AR").unwrap().is_eligible());
        assert_eq!(d.budget(), p.budget());
        assert_eq!(d.position("SUS"), p.position("SUS"));
    }

    #[test]
    fn freeze_all_except_rejects_unknown_and_empty() {
        let p = university_scenario();
        assert!(matches!(
            p.freeze_all_except(&["NOPE"]),
            Err(ProblemError::UnknownIndicator(_))
        ));
        let none: [&str; 0] = [];
        assert!(matches!(
            p.freeze_all_except(&none),
            Err(ProblemError::EmptySubset)
        ));
    }

    #[test]
    fn resource_ignores_immutable_and_decreases() {
        let p = Problem::new(
            vec![ind("A", 1.0, 1.0, 10.0), ind("B", 1.0, 1.0, f64::INFINITY)],
            5.0,
        )
        .unwrap();
        assert!((p.resource_of(&[1.5, 2.0]) - 5.0).abs() < 1e-12);
        assert_eq!(p.resource_of(&[0.5, 1.0]), 0.0);
    }

    #[test]
    fn with_budget_revalidates() {
        let p = university_scenario();
        assert_eq!(p.with_budget(300.0).unwrap().budget(), 300.0);
        assert!(p.with_budget(-0.5).is_err());
    }

    #[test]
    fn serde_round_trip_keeps_order_and_sentinel() {
        let p = university_scenario();
        let json = serde_json::to_string(&p).unwrap();
        let back: Problem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert!(back.get("ISR").unwrap().unit_cost().is_immutable());
    }
}
