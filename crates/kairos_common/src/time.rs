//! Time values in picoseconds with unit parsing and display.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A duration stored in picoseconds.
///
/// Parses strings like `"4ns"`, `"4000ps"`, `"1.5us"`, and bare numbers
/// (interpreted as ps). A frequency such as `"250MHz"` parses as its period,
/// which is how clock requirements are usually written.
#[derive(Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct TimeValue(f64);

impl TimeValue {
    /// Creates a time value from picoseconds.
    pub fn from_ps(ps: f64) -> Self {
        Self(ps)
    }

    /// Returns the value in picoseconds.
    pub fn ps(&self) -> f64 {
        self.0
    }

    /// Returns the value in nanoseconds.
    pub fn ns(&self) -> f64 {
        self.0 / 1_000.0
    }
}

impl fmt::Debug for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeValue({self})")
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ps = self.0;
        if ps.abs() >= 1_000_000.0 {
            write!(f, "{}us", ps / 1_000_000.0)
        } else if ps.abs() >= 1_000.0 {
            write!(f, "{}ns", ps / 1_000.0)
        } else {
            write!(f, "{ps}ps")
        }
    }
}

/// Error type for parsing time strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time value: '{input}'")]
pub struct ParseTimeError {
    /// The input string that failed to parse.
    pub input: String,
}

impl FromStr for TimeValue {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseTimeError {
            input: s.to_string(),
        };
        let number = |num: &str| -> Result<f64, ParseTimeError> {
            let v: f64 = num.trim().parse().map_err(|_| err())?;
            if v.is_finite() {
                Ok(v)
            } else {
                Err(err())
            }
        };
        let period = |hz: f64| -> Result<TimeValue, ParseTimeError> {
            if hz <= 0.0 {
                return Err(err());
            }
            Ok(TimeValue(1e12 / hz))
        };

        let lower = s.to_ascii_lowercase();
        // Frequencies first: "mhz" would otherwise never be reached.
        if let Some(num) = lower.strip_suffix("ghz") {
            return period(number(num)? * 1e9);
        }
        if let Some(num) = lower.strip_suffix("mhz") {
            return period(number(num)? * 1e6);
        }
        if let Some(num) = lower.strip_suffix("khz") {
            return period(number(num)? * 1e3);
        }
        if let Some(num) = lower.strip_suffix("hz") {
            return period(number(num)?);
        }
        if let Some(num) = lower.strip_suffix("ps") {
            return Ok(TimeValue(number(num)?));
        }
        if let Some(num) = lower.strip_suffix("ns") {
            return Ok(TimeValue(number(num)? * 1_000.0));
        }
        if let Some(num) = lower.strip_suffix("us") {
            return Ok(TimeValue(number(num)? * 1_000_000.0));
        }

        Ok(TimeValue(number(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ns() {
        let t: TimeValue = "4ns".parse().unwrap();
        assert_eq!(t.ps(), 4_000.0);
        assert_eq!(t.ns(), 4.0);
    }

    #[test]
    fn parse_ps_and_bare() {
        assert_eq!("4000ps".parse::<TimeValue>().unwrap().ps(), 4_000.0);
        assert_eq!("1250".parse::<TimeValue>().unwrap().ps(), 1_250.0);
    }

    #[test]
    fn parse_us() {
        assert_eq!("1.5us".parse::<TimeValue>().unwrap().ps(), 1_500_000.0);
    }

    #[test]
    fn frequency_parses_as_period() {
        let t: TimeValue = "250MHz".parse().unwrap();
        assert!((t.ps() - 4_000.0).abs() < 1e-6);
        let g: TimeValue = "1GHz".parse().unwrap();
        assert!((g.ps() - 1_000.0).abs() < 1e-6);
    }

    #[test]
    fn case_insensitive() {
        assert_eq!("4NS".parse::<TimeValue>().unwrap().ps(), 4_000.0);
    }

    #[test]
    fn rejects_garbage_and_zero_frequency() {
        assert!("soon".parse::<TimeValue>().is_err());
        assert!("0MHz".parse::<TimeValue>().is_err());
        let e = "x ns".parse::<TimeValue>().unwrap_err();
        assert_eq!(e.to_string(), "invalid time value: 'x ns'");
    }

    #[test]
    fn display_selects_unit() {
        assert_eq!(TimeValue::from_ps(4_000.0).to_string(), "4ns");
        assert_eq!(TimeValue::from_ps(250.0).to_string(), "250ps");
        assert_eq!(TimeValue::from_ps(2_000_000.0).to_string(), "2us");
    }
}
