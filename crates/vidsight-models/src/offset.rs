//! Time offsets within a video.
//!
//! The REST API encodes offsets as protobuf JSON durations (`"5.500s"`).
//! Some tooling emits the structured `{seconds, nanos}` form instead, so both
//! are accepted and normalized to fractional seconds.

use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOffset {
    Text(String),
    Seconds(f64),
    Parts {
        #[serde(default, deserialize_with = "lenient_i64")]
        seconds: i64,
        #[serde(default)]
        nanos: i32,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawInt {
    Int(i64),
    Text(String),
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawInt::deserialize(deserializer)? {
        RawInt::Int(v) => Ok(v),
        RawInt::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Parse a protobuf JSON duration such as `"1.5s"` or `"-0.25s"`.
pub fn parse_duration(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let number = trimmed.strip_suffix('s')?;
    let value: f64 = number.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Format seconds as a protobuf JSON duration.
pub fn format_duration(seconds: f64) -> String {
    let text = format!("{:.9}", seconds);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{}s", text)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawOffset::deserialize(deserializer)? {
        RawOffset::Text(text) => parse_duration(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration: {}", text))),
        RawOffset::Seconds(v) => Ok(v),
        RawOffset::Parts { seconds, nanos } => Ok(seconds as f64 + f64::from(nanos) / 1e9),
    }
}

pub fn serialize<S>(seconds: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_duration(*seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "crate::offset")]
        at: f64,
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5.500s"), Some(5.5));
        assert_eq!(parse_duration("0s"), Some(0.0));
        assert_eq!(parse_duration("12s"), Some(12.0));
        assert_eq!(parse_duration("12"), None);
        assert_eq!(parse_duration("abcs"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5.5), "5.5s");
        assert_eq!(format_duration(0.0), "0s");
        assert_eq!(format_duration(1.000000001), "1.000000001s");
    }

    #[test]
    fn test_deserialize_forms() {
        let h: Holder = serde_json::from_str(r#"{"at": "2.250s"}"#).unwrap();
        assert_eq!(h.at, 2.25);

        let h: Holder = serde_json::from_str(r#"{"at": {"seconds": "3", "nanos": 500000000}}"#).unwrap();
        assert_eq!(h.at, 3.5);

        let h: Holder = serde_json::from_str(r#"{"at": {"nanos": 250000000}}"#).unwrap();
        assert_eq!(h.at, 0.25);

        let h: Holder = serde_json::from_str(r#"{"at": 4.0}"#).unwrap();
        assert_eq!(h.at, 4.0);

        assert!(serde_json::from_str::<Holder>(r#"{"at": "soon"}"#).is_err());
    }
}
