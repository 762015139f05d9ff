//! Human-readable durations for configuration files
//!
//! Accepts integer seconds (`90`) or `humantime` strings (`"500ms"`,
//! `"10m"`, `"1h30m"`, `"2d"`). Serializes with `humantime`'s formatter,
//! which keeps sub-millisecond precision.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::fmt;
use std::time::Duration;

/// Parse a duration such as `"1h30m"`; a bare integer means seconds
pub fn parse_duration(input: &str) -> Result<Duration, humantime::DurationError> {
    let input = input.trim();
    match input.parse::<u64>() {
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(_) => humantime::parse_duration(input),
    }
}

pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&humantime::format_duration(*duration))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("seconds as an integer or a duration string like \"10m\"")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Duration, E> {
        Ok(Duration::from_secs(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Duration, E> {
        u64::try_from(value)
            .map(Duration::from_secs)
            .map_err(|_| E::custom(format!("negative duration {value}")))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
        parse_duration(value).map_err(|e| E::custom(format!("invalid duration '{value}': {e}")))
    }
}

/// Serde adapter for prefix -> duration maps
pub mod map {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;
    use std::time::Duration;

    #[derive(Serialize, Deserialize)]
    struct Value(#[serde(with = "super")] Duration);

    pub fn serialize<S>(map: &BTreeMap<String, Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let wrapped: BTreeMap<&str, Value> =
            map.iter().map(|(k, v)| (k.as_str(), Value(*v))).collect();
        wrapped.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wrapped = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(wrapped.into_iter().map(|(k, v)| (k, v.0)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper(#[serde(with = "super")] Duration);

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("10m").unwrap(), Duration::from_secs(600));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1h 30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("2d").unwrap(), Duration::from_secs(172_800));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ten minutes").is_err());
        assert!(parse_duration("10 parsecs").is_err());
        assert!(parse_duration("m10").is_err());
        assert!(parse_duration("-5s").is_err());
    }

    #[test]
    fn test_sub_millisecond_durations_survive_serialization() {
        for duration in [
            Duration::ZERO,
            Duration::from_nanos(1),
            Duration::from_micros(1500),
            Duration::from_millis(1500),
            Duration::from_secs(93_784),
            Duration::new(5400, 123_456_789),
        ] {
            let json = serde_json::to_string(&Wrapper(duration)).unwrap();
            let back: Wrapper = serde_json::from_str(&json).unwrap();
            assert_eq!(back.0, duration, "{json}");
        }
    }

    #[test]
    fn test_integer_seconds_deserialize() {
        let wrapper: Wrapper = serde_json::from_str("42").unwrap();
        assert_eq!(wrapper.0, Duration::from_secs(42));
        assert!(serde_json::from_str::<Wrapper>("-1").is_err());
    }
}
