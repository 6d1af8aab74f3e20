//! Serialization utilities for common data types
//!
//! Reusable serde helpers shared by configuration types across crates.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// Serialize a [`Duration`] as whole milliseconds (u64)
///
/// Schedules are written by hand in TOML and JSON files, so intervals travel
/// as plain integers rather than serde's default `{secs, nanos}` struct.
///
/// # Usage
/// ```rust
/// use std::time::Duration;
///
/// use cadence_common::duration_millis;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Example {
///     #[serde(with = "duration_millis")]
///     period: Duration,
/// }
/// ```
pub mod duration_millis {
    use super::*;

    /// Serde serialization result type
    type SerializeResult<S> = Result<<S as Serializer>::Ok, <S as Serializer>::Error>;

    /// Serialize a Duration as milliseconds (u64), saturating at `u64::MAX`
    pub fn serialize<S>(duration: &Duration, serializer: S) -> SerializeResult<S>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    /// Deserialize milliseconds (u64) into a Duration
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Tick {
        #[serde(with = "duration_millis")]
        period: Duration,
        #[serde(with = "duration_millis", default)]
        delay: Duration,
    }

    /// Tests that Duration serializes to milliseconds as u64
    #[test]
    fn test_duration_millis_serialize() {
        let tick = Tick { period: Duration::from_millis(1500), delay: Duration::ZERO };

        let json = serde_json::to_string(&tick).expect("Should serialize valid struct");
        assert_eq!(json, r#"{"period":1500,"delay":0}"#);
    }

    /// Tests that milliseconds deserialize to Duration and missing defaulted
    /// fields fall back to zero
    #[test]
    fn test_duration_millis_deserialize_with_default() {
        let tick: Tick =
            serde_json::from_str(r#"{"period":250}"#).expect("Should deserialize valid JSON");

        assert_eq!(tick.period, Duration::from_millis(250));
        assert_eq!(tick.delay, Duration::ZERO);
    }

    /// Sub-millisecond precision is truncated on the wire
    #[test]
    fn test_duration_millis_truncates_sub_millisecond() {
        let tick = Tick { period: Duration::from_micros(2_999), delay: Duration::ZERO };

        let json = serde_json::to_string(&tick).unwrap();
        let back: Tick = serde_json::from_str(&json).unwrap();
        assert_eq!(back.period, Duration::from_millis(2));
    }

    #[test]
    fn test_duration_millis_rejects_negative_and_text() {
        assert!(serde_json::from_str::<Tick>(r#"{"period":-5}"#).is_err());
        assert!(serde_json::from_str::<Tick>(r#"{"period":"soon"}"#).is_err());
    }
}
