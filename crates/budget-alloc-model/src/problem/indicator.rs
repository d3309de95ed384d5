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

use crate::problem::err::{BaselineAboveCapError, IndicatorError, IndicatorField, InvalidFieldError};
use budget_alloc_core::interval::Bounds;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;

/// Stable identifier of an indicator inside a problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorKey(String);

impl IndicatorKey {
    #[inline]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IndicatorKey {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for IndicatorKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for IndicatorKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Borrow<str> for IndicatorKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Cost, in resource units, of raising an indicator by one unit.
///
/// `Immutable` is the infinite-cost sentinel: the indicator cannot be moved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitCost {
    Finite(f64),
    Immutable,
}

impl UnitCost {
    #[inline]
    pub fn is_immutable(&self) -> bool {
        matches!(self, UnitCost::Immutable)
    }

    #[inline]
    pub fn finite(&self) -> Option<f64> {
        match self {
            UnitCost::Finite(c) => Some(*c),
            UnitCost::Immutable => None,
        }
    }

    /// Cost as a float, with `Immutable` mapped to positive infinity.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self {
            UnitCost::Finite(c) => *c,
            UnitCost::Immutable => f64::INFINITY,
        }
    }

    /// Resource consumed by raising the indicator by `delta`.
    /// Immutable indicators never consume resources.
    #[inline]
    pub fn cost_of(&self, delta: f64) -> f64 {
        match self {
            UnitCost::Finite(c) if delta > 0.0 => delta * c,
            _ => 0.0,
        }
    }
}

impl From<f64> for UnitCost {
    fn from(value: f64) -> Self {
        if value == f64::INFINITY {
            UnitCost::Immutable
        } else {
            UnitCost::Finite(value)
        }
    }
}

impl std::fmt::Display for UnitCost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitCost::Finite(c) => write!(f, "{c}"),
            UnitCost::Immutable => f.write_str("inf"),
        }
    }
}

const INFINITY_SPELLINGS: [&str; 4] = ["inf", "+inf", "infinity", "+infinity"];

impl Serialize for UnitCost {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UnitCost::Finite(c) => serializer.serialize_f64(*c),
            UnitCost::Immutable => serializer.serialize_str("inf"),
        }
    }
}

impl<'de> Deserialize<'de> for UnitCost {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(c) => Ok(UnitCost::from(c)),
            Raw::Text(s) => {
                let lowered = s.trim().to_ascii_lowercase();
                if INFINITY_SPELLINGS.contains(&lowered.as_str()) {
                    Ok(UnitCost::Immutable)
                } else {
                    lowered
                        .parse::<f64>()
                        .map(UnitCost::from)
                        .map_err(|_| serde::de::Error::custom(format!("invalid unit cost `{s}`")))
                }
            }
        }
    }
}

#[derive(Deserialize)]
struct IndicatorRecord {
    key: IndicatorKey,
    baseline: f64,
    weight: f64,
    cap: f64,
    max_increase: f64,
    unit_cost: UnitCost,
}

/// One weighted quantity subject to optimization.
///
/// Construction validates every field, so an `Indicator` value always satisfies
/// `0 <= baseline <= cap` with non-negative weight, increase and cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndicatorRecord")]
pub struct Indicator {
    key: IndicatorKey,
    baseline: f64,
    weight: f64,
    cap: f64,
    max_increase: f64,
    unit_cost: UnitCost,
}

impl TryFrom<IndicatorRecord> for Indicator {
    type Error = IndicatorError;

    fn try_from(r: IndicatorRecord) -> Result<Self, Self::Error> {
        Indicator::new(r.key, r.baseline, r.weight, r.cap, r.max_increase, r.unit_cost)
    }
}

fn check_non_negative(
    key: &IndicatorKey,
    field: IndicatorField,
    value: f64,
) -> Result<(), IndicatorError> {
    if !value.is_finite() || value < 0.0 {
        return Err(InvalidFieldError::new(key.clone(), field, value).into());
    }
    Ok(())
}

impl Indicator {
    pub fn new(
        key: impl Into<IndicatorKey>,
        baseline: f64,
        weight: f64,
        cap: f64,
        max_increase: f64,
        unit_cost: impl Into<UnitCost>,
    ) -> Result<Self, IndicatorError> {
        let key = key.into();
        let unit_cost = unit_cost.into();

        check_non_negative(&key, IndicatorField::Baseline, baseline)?;
        check_non_negative(&key, IndicatorField::Weight, weight)?;
        check_non_negative(&key, IndicatorField::Cap, cap)?;
        check_non_negative(&key, IndicatorField::MaxIncrease, max_increase)?;
        if let UnitCost::Finite(c) = unit_cost {
            check_non_negative(&key, IndicatorField::UnitCost, c)?;
        }
        if baseline > cap {
            return Err(BaselineAboveCapError::new(key, baseline, cap).into());
        }

        Ok(Self {
            key,
            baseline,
            weight,
            cap,
            max_increase,
            unit_cost,
        })
    }

    #[inline]
    pub fn key(&self) -> &IndicatorKey {
        &self.key
    }

    #[inline]
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    #[inline]
    pub fn cap(&self) -> f64 {
        self.cap
    }

    #[inline]
    pub fn max_increase(&self) -> f64 {
        self.max_increase
    }

    #[inline]
    pub fn unit_cost(&self) -> UnitCost {
        self.unit_cost
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.max_increase == 0.0 || self.unit_cost.is_immutable()
    }

    #[inline]
    pub fn is_eligible(&self) -> bool {
        !self.is_frozen()
    }

    /// Admissible values: `[baseline, min(baseline + max_increase, cap)]`,
    /// or the single point `baseline` when frozen.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        if self.is_frozen() {
            return Bounds::point(self.baseline);
        }
        let hi = (self.baseline + self.max_increase).min(self.cap);
        Bounds::new(self.baseline, hi).unwrap_or_else(|_| Bounds::point(self.baseline))
    }

    /// Copy of this indicator that can no longer move.
    #[inline]
    pub fn frozen(&self) -> Self {
        Self {
            max_increase: 0.0,
            ..self.clone()
        }
    }

    #[inline]
    pub fn contribution(&self, value: f64) -> f64 {
        value * self.weight
    }

    #[inline]
    pub fn cost_of(&self, value: f64) -> f64 {
        self.unit_cost.cost_of(value - self.baseline)
    }
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Indicator({}, baseline: {}, weight: {}, bounds: {}, unit cost: {})",
            self.key,
            self.baseline,
            self.weight,
            self.bounds(),
            self.unit_cost
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ind(max_inc: f64, cost: f64) -> Indicator {
        Indicator::new("AR", 6.5, 0.3, 10.0, max_inc, cost).unwrap()
    }

    #[test]
    fn bounds_respect_cap_and_max_increase() {
        let a = ind(1.0, 100.0);
        assert_eq!(a.bounds(), Bounds::new(6.5, 7.5).unwrap());

        let capped = Indicator::new("CPF", 1.3, 0.2, 1.5, 0.3, 30.0).unwrap();
        assert_eq!(capped.bounds(), Bounds::new(1.3, 1.5).unwrap());
    }

    #[test]
    fn frozen_by_zero_increase_or_infinite_cost() {
        assert!(ind(0.0, 100.0).is_frozen());
        assert!(ind(1.0, f64::INFINITY).is_frozen());
        assert!(ind(1.0, 100.0).is_eligible());
        assert!(ind(1.0, f64::INFINITY).bounds().is_point());
        assert!(ind(1.0, 100.0).frozen().is_frozen());
    }

    #[test]
    fn rejects_baseline_above_cap() {
        let err = Indicator::new("ISR", 20.1, 0.05, 20.0, 0.0, f64::INFINITY).unwrap_err();
        assert!(matches!(err, IndicatorError::BaselineAboveCap(_)));
    }

    #[test]
    fn rejects_negative_and_non_finite_fields() {
        assert!(Indicator::new("X", -1.0, 0.1, 2.0, 1.0, 1.0).is_err());
        assert!(Indicator::new("X", 1.0, -0.1, 2.0, 1.0, 1.0).is_err());
        assert!(Indicator::new("X", 1.0, 0.1, f64::NAN, 1.0, 1.0).is_err());
        assert!(Indicator::new("X", 1.0, 0.1, 2.0, -1.0, 1.0).is_err());
        assert!(Indicator::new("X", 1.0, 0.1, 2.0, 1.0, -5.0).is_err());
        assert!(Indicator::new("X", 1.0, 0.1, 2.0, 1.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn immutable_cost_round_trips_through_json() {
        let a = ind(1.0, f64::INFINITY);
        let json = serde_json::to_string(&a).unwrap();
        assert!(json.contains("\"unit_cost\":\"inf\""));
        let back: Indicator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        assert_eq!(back.unit_cost().as_f64(), f64::INFINITY);
    }

    #[test]
    fn unit_cost_accepts_infinity_spellings_and_integers() {
        for s in ["\"inf\"", "\"+inf\"", "\"Infinity\"", "\"infinity\""] {
            let c: UnitCost = serde_json::from_str(s).unwrap();
            assert!(c.is_immutable());
        }
        let c: UnitCost = serde_json::from_str("100").unwrap();
        assert_eq!(c, UnitCost::Finite(100.0));
        assert!(serde_json::from_str::<UnitCost>("\"cheap\"").is_err());
    }

    #[test]
    fn deserialization_validates_fields() {
        let json = r#"{"key":"X","baseline":5.0,"weight":0.1,"cap":4.0,"max_increase":1.0,"unit_cost":1.0}"#;
        assert!(serde_json::from_str::<Indicator>(json).is_err());
    }

    #[test]
    fn immutable_cost_is_free() {
        assert_eq!(UnitCost::Immutable.cost_of(3.0), 0.0);
        assert_eq!(UnitCost::Finite(20.0).cost_of(0.5), 10.0);
        assert_eq!(UnitCost::Finite(20.0).cost_of(-0.5), 0.0);
    }
}
