//! resume-after parsing
//!
//! rate-limited responses carry the point in time after which the caller may
//! send again. the remote api uses rfc 3339 timestamps, proxies in front of it
//! tend to use http-dates. formats are tried in a fixed order and the first
//! match wins; nothing falls back to "now".

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

/// accepted timestamp formats, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampFormat {
    /// `2021-05-10T11:00:00Z`, `2021-05-10T13:00:00+02:00`
    Rfc3339,
    /// `2021-05-10T11:00:00` (no offset, read as utc)
    Iso8601Naive,
    /// `Mon, 10 May 2021 11:00:00 GMT`
    HttpDate,
    /// `Monday, 10-May-21 11:00:00 GMT`
    Rfc850,
    /// `Mon May 10 11:00:00 2021`
    Asctime,
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimestampFormat::Rfc3339 => "rfc3339",
            TimestampFormat::Iso8601Naive => "iso8601",
            TimestampFormat::HttpDate => "http-date",
            TimestampFormat::Rfc850 => "rfc850",
            TimestampFormat::Asctime => "asctime",
        };
        f.write_str(name)
    }
}

/// a successfully parsed resume point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeAt {
    /// absolute resume time in utc
    pub at: DateTime<Utc>,
    /// which format matched
    pub format: TimestampFormat,
}

/// resume header could not be turned into a point in time
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("resume header is missing")]
    Missing,

    #[error("resume header is empty")]
    Empty,

    #[error("unable to parse resume header: {0}")]
    Unrecognized(String),
}

/// parse a `Retry-After`-style header value into an absolute time
pub fn parse_resume_after(value: &str) -> Result<ResumeAt, TimestampError> {
    let candidate = value.trim();
    if candidate.is_empty() {
        return Err(TimestampError::Empty);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(candidate) {
        return Ok(ResumeAt {
            at: parsed.with_timezone(&Utc),
            format: TimestampFormat::Rfc3339,
        });
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(candidate, pattern) {
            return Ok(ResumeAt {
                at: naive.and_utc(),
                format: TimestampFormat::Iso8601Naive,
            });
        }
    }

    if let Ok(parsed) = DateTime::parse_from_rfc2822(candidate) {
        return Ok(ResumeAt {
            at: parsed.with_timezone(&Utc),
            format: TimestampFormat::HttpDate,
        });
    }

    // obsolete http-date forms still emitted by some gateways
    if let Ok(naive) = NaiveDateTime::parse_from_str(candidate, "%A, %d-%b-%y %H:%M:%S GMT") {
        return Ok(ResumeAt {
            at: naive.and_utc(),
            format: TimestampFormat::Rfc850,
        });
    }

    let collapsed = candidate.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Ok(naive) = NaiveDateTime::parse_from_str(&collapsed, "%a %b %d %H:%M:%S %Y") {
        return Ok(ResumeAt {
            at: naive.and_utc(),
            format: TimestampFormat::Asctime,
        });
    }

    Err(TimestampError::Unrecognized(candidate.to_string()))
}

/// parse an optional header value; absence is its own failure
pub fn parse_optional_resume_after(value: Option<&str>) -> Result<ResumeAt, TimestampError> {
    match value {
        Some(value) => parse_resume_after(value),
        None => Err(TimestampError::Missing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_rfc3339_zulu() {
        let parsed = parse_resume_after("2021-05-10T11:00:00Z").unwrap();
        assert_eq!(parsed.at, utc(2021, 5, 10, 11, 0, 0));
        assert_eq!(parsed.format, TimestampFormat::Rfc3339);
    }

    #[test]
    fn test_rfc3339_offset_normalized_to_utc() {
        let parsed = parse_resume_after("2021-05-10T13:00:00+02:00").unwrap();
        assert_eq!(parsed.at, utc(2021, 5, 10, 11, 0, 0));
    }

    #[test]
    fn test_naive_iso_assumed_utc() {
        let parsed = parse_resume_after(" 2021-05-10T11:00:00.250 ").unwrap();
        assert_eq!(parsed.format, TimestampFormat::Iso8601Naive);
        assert_eq!(parsed.at.timestamp(), utc(2021, 5, 10, 11, 0, 0).timestamp());
        assert_eq!(parsed.at.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_http_date() {
        let parsed = parse_resume_after("Mon, 10 May 2021 11:00:00 GMT").unwrap();
        assert_eq!(parsed.at, utc(2021, 5, 10, 11, 0, 0));
        assert_eq!(parsed.format, TimestampFormat::HttpDate);
    }

    #[test]
    fn test_obsolete_http_dates() {
        let rfc850 = parse_resume_after("Monday, 10-May-21 11:00:00 GMT").unwrap();
        assert_eq!(rfc850.at, utc(2021, 5, 10, 11, 0, 0));
        assert_eq!(rfc850.format, TimestampFormat::Rfc850);

        let asctime = parse_resume_after("Sun Nov  6 08:49:37 1994").unwrap();
        assert_eq!(asctime.at, utc(1994, 11, 6, 8, 49, 37));
        assert_eq!(asctime.format, TimestampFormat::Asctime);
    }

    #[test]
    fn test_rejects_garbage_and_empty() {
        assert_eq!(parse_resume_after("   "), Err(TimestampError::Empty));
        assert!(matches!(
            parse_resume_after("soon"),
            Err(TimestampError::Unrecognized(value)) if value == "soon"
        ));
        // delta-seconds is not a timestamp
        assert!(parse_resume_after("120").is_err());
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(
            parse_optional_resume_after(None),
            Err(TimestampError::Missing)
        );
        assert!(parse_optional_resume_after(Some("2021-05-10T11:00:00Z")).is_ok());
    }
}
