//! Shared types used across smapstack.
//! Includes the `GeoTransform` alias, the requested `TimeRange`, and the CLI `LogLevel`.
use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Affine geotransform coefficients ([origin_x, pixel_width, rot_x, origin_y, rot_y, pixel_height])
pub type GeoTransform = [f64; 6];

/// Inclusive date range sent as the `time` query parameter (`start,end`).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TimeRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, String> {
        if start > end {
            return Err(format!("start {} is after end {}", start, end));
        }
        Ok(Self { start, end })
    }

    /// Parse `YYYY-MM-DD,YYYY-MM-DD`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let (start, end) = s
            .split_once(',')
            .ok_or_else(|| format!("expected `start,end`, got `{}`", s))?;
        let parse = |d: &str| {
            NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                .map_err(|e| format!("invalid date `{}`: {}", d.trim(), e))
        };
        Self::new(parse(start)?, parse(end)?)
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

impl std::str::FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TimeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimeRange::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_range_parses_and_renders() {
        let range = TimeRange::parse("2015-03-31, 2015-04-01").unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2015, 3, 31).unwrap());
        assert_eq!(range.to_string(), "2015-03-31,2015-04-01");
    }

    #[test]
    fn time_range_rejects_reversed_and_malformed() {
        assert!(TimeRange::parse("2015-04-02,2015-04-01").is_err());
        assert!(TimeRange::parse("2015-04-01").is_err());
        assert!(TimeRange::parse("2015-13-01,2015-13-02").is_err());
    }

    #[test]
    fn time_range_serde_as_string() {
        let range: TimeRange = serde_json::from_str("\"2016-01-01,2016-01-05\"").unwrap();
        assert_eq!(serde_json::to_string(&range).unwrap(), "\"2016-01-01,2016-01-05\"");
    }
}
