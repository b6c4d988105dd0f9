//! CF time coordinate decoding.
//!
//! Handles units of the form `<unit> since <reference>` on the standard
//! (proleptic Gregorian) calendar, e.g. `minutes since 2025-02-03 00:30:00`.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::{DatasetError, DatasetResult};

/// ISO-8601 rendering used for decoded time values.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parsed `<unit> since <reference>` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    /// Length of one unit in milliseconds.
    pub unit_millis: i64,
    pub reference: NaiveDateTime,
}

impl TimeUnits {
    pub fn parse(units: &str) -> DatasetResult<Self> {
        let (unit, reference) = units
            .split_once(" since ")
            .ok_or_else(|| DatasetError::InvalidFormat(format!("not CF time units: '{}'", units)))?;

        let unit_millis = match unit.trim().to_ascii_lowercase().as_str() {
            "milliseconds" | "millisecond" | "msec" | "ms" => 1,
            "seconds" | "second" | "secs" | "sec" | "s" => 1_000,
            "minutes" | "minute" | "mins" | "min" => 60_000,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3_600_000,
            "days" | "day" | "d" => 86_400_000,
            other => {
                return Err(DatasetError::InvalidFormat(format!(
                    "unsupported time unit '{}'",
                    other
                )))
            }
        };

        Ok(Self {
            unit_millis,
            reference: parse_reference(reference)?,
        })
    }

    pub fn decode(&self, value: f64) -> DatasetResult<NaiveDateTime> {
        if !value.is_finite() {
            return Err(DatasetError::InvalidFormat(format!(
                "non-finite time value {}",
                value
            )));
        }
        let millis = (value * self.unit_millis as f64).round();
        // `as` saturates, so bound the float before converting
        Some(millis)
            .filter(|m| m.abs() < i64::MAX as f64)
            .and_then(|m| Duration::try_milliseconds(m as i64))
            .and_then(|d| self.reference.checked_add_signed(d))
            .ok_or_else(|| DatasetError::InvalidFormat(format!("time value {} out of range", value)))
    }

    pub fn decode_all(&self, values: &[f64]) -> DatasetResult<Vec<NaiveDateTime>> {
        values.iter().map(|&v| self.decode(v)).collect()
    }
}

/// Whether a units attribute looks like a CF time encoding.
pub fn is_time_units(units: &str) -> bool {
    units.contains(" since ")
}

fn parse_reference(reference: &str) -> DatasetResult<NaiveDateTime> {
    let trimmed = reference
        .trim()
        .trim_end_matches("UTC")
        .trim_end_matches('Z')
        .trim();

    const FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for format in FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            DatasetError::InvalidFormat(format!("unparseable time reference '{}'", reference))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, ISO_FORMAT).unwrap()
    }

    #[test]
    fn test_parse_minutes_since() {
        let units = TimeUnits::parse("minutes since 2025-02-03 00:30:00").unwrap();
        assert_eq!(units.unit_millis, 60_000);
        assert_eq!(units.reference, dt("2025-02-03T00:30:00"));
        assert_eq!(units.decode(90.0).unwrap(), dt("2025-02-03T02:00:00"));
    }

    #[test]
    fn test_parse_reference_variants() {
        for reference in [
            "2025-02-03",
            "2025-02-03 00:00",
            "2025-02-03T00:00:00Z",
            "2025-02-03 00:00:00.0 UTC",
        ] {
            let units = TimeUnits::parse(&format!("hours since {}", reference)).unwrap();
            assert_eq!(units.reference, dt("2025-02-03T00:00:00"), "{}", reference);
        }
    }

    #[test]
    fn test_decode_days_fractional() {
        let units = TimeUnits::parse("days since 2000-01-01").unwrap();
        let decoded = units.decode_all(&[0.0, 0.5, 1.0]).unwrap();
        assert_eq!(
            decoded,
            [
                dt("2000-01-01T00:00:00"),
                dt("2000-01-01T12:00:00"),
                dt("2000-01-02T00:00:00"),
            ]
        );
    }

    #[test]
    fn test_rejects_bad_units() {
        assert!(TimeUnits::parse("K").is_err());
        assert!(TimeUnits::parse("fortnights since 2000-01-01").is_err());
        assert!(TimeUnits::parse("hours since yesterday").is_err());
        assert!(!is_time_units("ppmv"));
    }

    #[test]
    fn test_decode_rejects_nan() {
        let units = TimeUnits::parse("hours since 2000-01-01").unwrap();
        assert!(units.decode(f64::NAN).is_err());
    }

    #[test]
    fn test_decode_out_of_range_is_error() {
        let units = TimeUnits::parse("days since 2000-01-01").unwrap();
        for value in [-1e300, 1e300, -1e17, 1e17] {
            let err = units.decode(value).unwrap_err();
            assert!(matches!(err, DatasetError::InvalidFormat(_)), "{}", value);
        }
    }
}
