use serde::Deserialize;
use std::time::Duration;

/// Deserializes a duration written as `{ unit = "secs", value = 10 }`.
///
/// Accepted units are seconds, milliseconds, microseconds and nanoseconds, each under its long
/// name, its short name (`secs`, `millis`, ...) or its symbol (`s`, `ms`, `us`, `ns`).
pub fn duration_from_toml<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Helper {
        unit: String,
        value: u64,
    }

    let helper = Helper::deserialize(deserializer)?;
    match helper.unit.as_str() {
        "seconds" | "secs" | "s" => Ok(Duration::from_secs(helper.value)),
        "milliseconds" | "millis" | "ms" => Ok(Duration::from_millis(helper.value)),
        "microseconds" | "micros" | "us" => Ok(Duration::from_micros(helper.value)),
        "nanoseconds" | "nanos" | "ns" => Ok(Duration::from_nanos(helper.value)),
        other => Err(serde::de::Error::custom(format!(
            "Unsupported duration unit `{}`",
            other
        ))),
    }
}
