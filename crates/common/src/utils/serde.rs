//! Serialization helpers for configuration values
//!
//! Client configuration is exchanged as JSON/TOML where every time budget is
//! an integer count of milliseconds (`base_delay_ms`, `total_timeout_ms`, ...).

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

/// Serde adapter storing a [`Duration`] as whole milliseconds.
///
/// # Usage
/// ```rust
/// use std::time::Duration;
///
/// use quill_common::duration_millis;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct RetrySettings {
///     #[serde(rename = "base_delay_ms", with = "duration_millis")]
///     base_delay: Duration,
/// }
/// ```
pub mod duration_millis {
    use super::{Deserialize, Deserializer, Duration, Serializer};

    /// Serialize as milliseconds, saturating at `u64::MAX`.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    /// Deserialize a non-negative integer of milliseconds.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Budget {
        #[serde(rename = "total_timeout_ms", with = "duration_millis")]
        total_timeout: Duration,
        max_retries: u32,
    }

    #[test]
    fn serializes_as_integer_millis() {
        let budget = Budget { total_timeout: Duration::from_millis(12_000), max_retries: 3 };

        let json = serde_json::to_string(&budget).expect("serialize budget");
        assert_eq!(json, r#"{"total_timeout_ms":12000,"max_retries":3}"#);
    }

    #[test]
    fn deserializes_from_integer_millis() {
        let budget: Budget = serde_json::from_str(r#"{"total_timeout_ms":250,"max_retries":0}"#)
            .expect("deserialize budget");

        assert_eq!(budget.total_timeout, Duration::from_millis(250));
        assert_eq!(budget.max_retries, 0);
    }

    #[test]
    fn sub_millisecond_precision_is_truncated() {
        let budget = Budget { total_timeout: Duration::from_micros(1_999), max_retries: 1 };

        let json = serde_json::to_string(&budget).expect("serialize budget");
        assert!(json.contains(r#""total_timeout_ms":1"#));
    }

    #[test]
    fn rejects_negative_and_textual_values() {
        assert!(serde_json::from_str::<Budget>(r#"{"total_timeout_ms":-5,"max_retries":1}"#)
            .is_err());
        assert!(serde_json::from_str::<Budget>(r#"{"total_timeout_ms":"soon","max_retries":1}"#)
            .is_err());
    }
}
