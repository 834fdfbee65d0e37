//! Nagios range thresholds.
//!
//! A threshold is written as `[@][min:][max]`. `min` may be `~` for negative infinity, a missing
//! `min` defaults to `0` and a missing `max` to positive infinity. By default a value alerts when
//! it lies *outside* of `min..=max`; a leading `@` inverts this so the value alerts when it lies
//! *inside* of the range.
//!
//! ```rust
//! # use check_jitsi::Threshold;
//! let threshold: Threshold = "5:10".parse().unwrap();
//! assert!(!threshold.check(7.0));
//! assert!(threshold.check(11.0));
//!
//! let threshold: Threshold = "@5:10".parse().unwrap();
//! assert!(threshold.check(7.0));
//! assert_eq!(threshold.to_string(), "@5:10");
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static THRESHOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(@)?(?:(~|-?\d+(?:\.\d+)?)?:)?(-?\d+(?:\.\d+)?)?$").unwrap());

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ThresholdError {
    #[error("invalid threshold `{0}`")]
    Malformed(String),
    #[error("invalid threshold `{spec}`: min {min} is greater than max {max}")]
    MinExceedsMax { spec: String, min: f64, max: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Threshold {
    spec: String,
    min: f64,
    max: f64,
    inclusive: bool,
}

impl Threshold {
    /// Parses a threshold. An empty string never alerts for non-negative values.
    pub fn new(spec: &str) -> Result<Self, ThresholdError> {
        let captures = THRESHOLD_RE
            .captures(spec)
            .ok_or_else(|| ThresholdError::Malformed(spec.to_owned()))?;

        let number = |s: &str| {
            s.parse::<f64>()
                .map_err(|_| ThresholdError::Malformed(spec.to_owned()))
        };

        let inclusive = captures.get(1).is_some();
        let min = match captures.get(2).map(|m| m.as_str()) {
            Some("~") => f64::NEG_INFINITY,
            Some(s) => number(s)?,
            None => 0.0,
        };
        let max = match captures.get(3) {
            Some(m) => number(m.as_str())?,
            None => f64::INFINITY,
        };

        if min > max {
            return Err(ThresholdError::MinExceedsMax {
                spec: spec.to_owned(),
                min,
                max,
            });
        }

        Ok(Threshold {
            spec: spec.to_owned(),
            min,
            max,
            inclusive,
        })
    }

    /// Returns true if `value` should raise an alert.
    pub fn check(&self, value: f64) -> bool {
        if self.inclusive {
            self.min <= value && value <= self.max
        } else {
            value < self.min || value > self.max
        }
    }

    pub fn as_str(&self) -> &str {
        &self.spec
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_inclusive(&self) -> bool {
        self.inclusive
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold {
            spec: String::new(),
            min: 0.0,
            max: f64::INFINITY,
            inclusive: false,
        }
    }
}

impl FromStr for Threshold {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Threshold::new(s)
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}
