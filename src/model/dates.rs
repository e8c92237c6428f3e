use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/**
 * Normalizes a date-like document value into a UTC timestamp.
 *
 * Accepted shapes:
 * - RFC 3339 strings (`2024-01-01T10:00:00Z`, with or without offset)
 * - naive date time strings (`2024-01-01T10:00:00`, `2024-01-01 10:00:00`), read as UTC
 * - plain dates (`2024-01-01`), read as midnight UTC
 * - numbers, read as milliseconds since the epoch
 * - store timestamp objects `{ "seconds": .., "nanoseconds": .. }`, also with leading underscores
 *
 * Anything else, including out of range values, gives `None`.
 */
pub fn normalize_to_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_date_string(text.trim()),
        Value::Number(number) => {
            let millis = number.as_i64().or_else(|| number.as_f64().filter(|float| float.is_finite()).map(|float| float.trunc() as i64))?;
            Utc.timestamp_millis_opt(millis).single()
        }
        Value::Object(object) => {
            let seconds = object.get("seconds").or_else(|| object.get("_seconds")).and_then(Value::as_i64)?;
            let nanoseconds = object.get("nanoseconds").or_else(|| object.get("_nanoseconds")).and_then(Value::as_u64).unwrap_or(0);
            Utc.timestamp_opt(seconds, u32::try_from(nanoseconds).ok()?).single()
        }
        _ => None,
    }
}

fn parse_date_string(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }
    if let Ok(date_time) = DateTime::parse_from_rfc3339(text) {
        return Some(date_time.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().and_then(|date| date.and_hms_opt(0, 0, 0)).map(|naive| naive.and_utc())
}
