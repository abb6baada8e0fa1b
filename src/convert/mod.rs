//! Timestamp <-> date conversion of confirmed copies
//!
//! Integers in a plausible range are read as Unix seconds or milliseconds and
//! rendered as a local date-time. Anything else is tried as a date and turned
//! into its Unix timestamp.

pub mod date;

use chrono::{DateTime, Local, TimeZone};
use std::fmt::Write;

use crate::storage::ConvertConfig;

pub use date::parse_date;

/// Why an input was not converted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("input is {len} characters, longer than {max}")]
    TooLong { len: usize, max: usize },

    #[error("{0} is outside the accepted timestamp range")]
    OutOfRange(i64),

    #[error("could not parse {0:?} as a date")]
    Unparseable(String),

    #[error("invalid date format {0:?}")]
    InvalidFormat(String),
}

/// Successful conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// A Unix timestamp rendered as a local date-time
    Timestamp { seconds: i64, formatted: String },
    /// A date resolved to its Unix timestamp in seconds
    Date { timestamp: i64 },
}

impl Conversion {
    /// Human readable result
    pub fn display(&self) -> String {
        match self {
            Conversion::Timestamp { formatted, .. } => formatted.clone(),
            Conversion::Date { timestamp } => timestamp.to_string(),
        }
    }

    /// Text to put back on the clipboard, if any
    pub fn clipboard_text(&self) -> Option<String> {
        match self {
            Conversion::Timestamp { .. } => None,
            Conversion::Date { timestamp } => Some(timestamp.to_string()),
        }
    }
}

/// Converts confirmed clipboard text
#[derive(Debug, Clone)]
pub struct Converter {
    config: ConvertConfig,
}

impl Converter {
    pub fn new(config: ConvertConfig) -> Self {
        Converter { config }
    }

    /// Convert `input` relative to the local time zone
    pub fn convert(&self, input: &str) -> Result<Conversion, ConvertError> {
        self.convert_at(input, &Local::now())
    }

    /// Convert `input` in the zone of `now`
    pub fn convert_at<Tz>(&self, input: &str, now: &DateTime<Tz>) -> Result<Conversion, ConvertError>
    where
        Tz: TimeZone,
        Tz::Offset: Copy + std::fmt::Display,
    {
        let len = input.chars().count();
        if len > self.config.max_input_len {
            return Err(ConvertError::TooLong {
                len,
                max: self.config.max_input_len,
            });
        }

        let trimmed = input.trim();
        match trimmed.parse::<i64>() {
            Ok(number) if number > 0 => self.convert_number(number, &now.timezone()),
            _ => parse_date(trimmed, now)
                .map(|parsed| Conversion::Date {
                    timestamp: parsed.timestamp(),
                })
                .ok_or_else(|| ConvertError::Unparseable(trimmed.to_string())),
        }
    }

    fn convert_number<Tz>(&self, number: i64, tz: &Tz) -> Result<Conversion, ConvertError>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let seconds = self
            .timestamp_seconds(number)
            .ok_or(ConvertError::OutOfRange(number))?;
        let datetime = tz
            .timestamp_opt(seconds, 0)
            .single()
            .ok_or(ConvertError::OutOfRange(number))?;

        // A bad strftime pattern surfaces as a fmt error, not a panic
        let mut formatted = String::new();
        write!(formatted, "{}", datetime.format(&self.config.date_format))
            .map_err(|_| ConvertError::InvalidFormat(self.config.date_format.clone()))?;
        Ok(Conversion::Timestamp { seconds, formatted })
    }

    /// Interpret `number` as Unix seconds or milliseconds
    /// Both bounds are exclusive
    pub fn timestamp_seconds(&self, number: i64) -> Option<i64> {
        let ConvertConfig {
            seconds_min,
            seconds_max,
            millis_max,
            ..
        } = self.config;

        if number > seconds_min && number < seconds_max {
            Some(number)
        } else if number > seconds_max && number < millis_max {
            Some(number / 1000)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn converter() -> Converter {
        Converter::new(ConvertConfig::default())
    }

    fn utc_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_timestamp_ranges() {
        let converter = converter();
        assert_eq!(converter.timestamp_seconds(10_000_000), None);
        assert_eq!(converter.timestamp_seconds(10_000_001), Some(10_000_001));
        assert_eq!(converter.timestamp_seconds(1_701_322_102), Some(1_701_322_102));
        assert_eq!(converter.timestamp_seconds(10_013_221_020), None);
        assert_eq!(converter.timestamp_seconds(1_701_322_102_000), Some(1_701_322_102));
        assert_eq!(converter.timestamp_seconds(2_101_322_102_000), None);
    }

    #[test]
    fn test_seconds_to_local_date() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();

        let conversion = converter().convert_at("1701322102", &now).unwrap();
        assert_eq!(
            conversion,
            Conversion::Timestamp {
                seconds: 1_701_322_102,
                formatted: "2023-11-30 13:28:22".to_string(),
            }
        );
        assert_eq!(conversion.clipboard_text(), None);
    }

    #[test]
    fn test_millis_to_date() {
        let conversion = converter().convert_at("1701322102999", &utc_now()).unwrap();
        assert_eq!(conversion.display(), "2023-11-30 05:28:22");
    }

    #[test]
    fn test_out_of_range_number() {
        assert_eq!(
            converter().convert_at("42", &utc_now()),
            Err(ConvertError::OutOfRange(42))
        );
    }

    #[test]
    fn test_date_to_timestamp() {
        let conversion = converter()
            .convert_at("2023-11-30 05:28:22", &utc_now())
            .unwrap();
        assert_eq!(conversion, Conversion::Date { timestamp: 1_701_322_102 });
        assert_eq!(conversion.clipboard_text(), Some("1701322102".to_string()));
    }

    #[test]
    fn test_too_long_input() {
        let input = "x".repeat(41);
        assert_eq!(
            converter().convert_at(&input, &utc_now()),
            Err(ConvertError::TooLong { len: 41, max: 40 })
        );
    }

    #[test]
    fn test_unparseable_text() {
        assert!(matches!(
            converter().convert_at("just some words", &utc_now()),
            Err(ConvertError::Unparseable(_))
        ));
    }

    #[test]
    fn test_invalid_date_format() {
        let converter = Converter::new(ConvertConfig {
            date_format: "%Q".to_string(),
            ..ConvertConfig::default()
        });
        assert_eq!(
            converter.convert_at("1701322102", &utc_now()),
            Err(ConvertError::InvalidFormat("%Q".to_string()))
        );
    }

    #[test]
    fn test_custom_date_format() {
        let converter = Converter::new(ConvertConfig {
            date_format: "%d/%m/%Y".to_string(),
            ..ConvertConfig::default()
        });
        let conversion = converter.convert_at("1701322102", &utc_now()).unwrap();
        assert_eq!(conversion.display(), "30/11/2023");
    }
}
