use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_english::{Dialect, parse_date_string};

/// Date-time layouts tried before falling back to natural language
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%b %d, %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%d/%m/%Y", "%b %d, %Y", "%d %b %Y"];

/// Parse free-form date text, interpreting zone-less input in `now`'s zone
pub fn parse_date<Tz>(input: &str, now: &DateTime<Tz>) -> Option<DateTime<Tz>>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    let tz = now.timezone();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&tz));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(input) {
        return Some(parsed.with_timezone(&tz));
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            if let Some(local) = tz.from_local_datetime(&naive).earliest() {
                return Some(local);
            }
        }
    }

    for format in DATE_FORMATS {
        let midnight = NaiveDate::parse_from_str(input, format)
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0));
        if let Some(naive) = midnight {
            if let Some(local) = tz.from_local_datetime(&naive).earliest() {
                return Some(local);
            }
        }
    }

    match parse_date_string(input, now.clone(), Dialect::Uk) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::debug!("Could not parse {:?} as a date: {}", input, e);
            None
        }
    }
}
