//! Media-time offsets as submitted by clients.

use super::error::ValidationError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

/// `SS[.frac]`, `MM:SS[.frac]` or `HH:MM:SS[.frac]`.
fn timestamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(?:(?P<h>\d+):)?(?P<m>\d{1,2}):)?(?P<s>\d+(?:\.\d+)?)$")
            .expect("timestamp pattern is valid")
    })
}

/// A media-time offset into the source file.
///
/// The submitted text is kept verbatim and handed to ffmpeg as-is; the parsed
/// value in seconds is only used for validation and ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Timestamp {
    raw: String,
    seconds: f64,
}

impl Timestamp {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let raw = input.trim();
        let invalid = || ValidationError::InvalidTimestamp(input.to_string());

        let caps = timestamp_pattern().captures(raw).ok_or_else(invalid)?;
        let field = |name: &str| -> Result<Option<f64>, ValidationError> {
            caps.name(name)
                .map(|m| m.as_str().parse::<f64>().map_err(|_| invalid()))
                .transpose()
        };

        let hours = field("h")?;
        let minutes = field("m")?;
        let seconds = field("s")?.ok_or_else(invalid)?;

        if let Some(m) = minutes {
            if m >= 60.0 || seconds >= 60.0 {
                return Err(invalid());
            }
        }

        let total = hours.unwrap_or(0.0) * 3600.0 + minutes.unwrap_or(0.0) * 60.0 + seconds;
        Ok(Self {
            raw: raw.to_string(),
            seconds: total,
        })
    }

    pub fn from_seconds(seconds: f64) -> Result<Self, ValidationError> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(ValidationError::InvalidTimestamp(seconds.to_string()));
        }
        Ok(Self {
            raw: seconds.to_string(),
            seconds,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn seconds(&self) -> f64 {
        self.seconds
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Seconds(f64),
            Text(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Seconds(s) => Timestamp::from_seconds(s),
            Wire::Text(t) => Timestamp::parse(&t),
        }
        .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_seconds() {
        let ts = Timestamp::parse("12.5").unwrap();
        assert_eq!(ts.seconds(), 12.5);
        assert_eq!(ts.as_str(), "12.5");
    }

    #[test]
    fn test_parse_clock_forms() {
        assert_eq!(Timestamp::parse("01:30").unwrap().seconds(), 90.0);
        assert_eq!(Timestamp::parse("1:02:03.25").unwrap().seconds(), 3723.25);
        assert_eq!(Timestamp::parse(" 00:00:05 ").unwrap().as_str(), "00:00:05");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "abc", "1:2:3:4", "00:75", "01:61:00", "-3"] {
            assert!(Timestamp::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_minutes_over_an_hour_need_hours_field() {
        assert!(Timestamp::parse("75:00").is_err());
        assert!(Timestamp::parse("59:59.5").is_ok());
        assert_eq!(Timestamp::parse("01:15:00").unwrap().seconds(), 4500.0);
        assert_eq!(Timestamp::parse("4500").unwrap().seconds(), 4500.0);
    }

    #[test]
    fn test_deserialize_number_or_string() {
        let ts: Timestamp = serde_json::from_str("7").unwrap();
        assert_eq!(ts.seconds(), 7.0);
        let ts: Timestamp = serde_json::from_str("\"00:00:07.5\"").unwrap();
        assert_eq!(ts.seconds(), 7.5);
        assert!(serde_json::from_str::<Timestamp>("-1").is_err());
    }
}
