//! Codec for the `/Date(<unix-seconds>)/` timestamps used throughout the LoanPro API.
//!
//! Values that do not carry the vendor encoding are assumed to be formatted
//! already and pass through untouched, so decoding is idempotent.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

static VENDOR_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/Date\((-?\d+)\)/").expect("valid vendor date regex"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("embedded timestamp '{0}' is not a 64-bit second count")]
    InvalidSeconds(String),
    #[error("embedded timestamp {0} is outside the supported calendar range")]
    OutOfRange(i64),
}

/// Strict parse of a vendor-encoded value.
///
/// `Ok(None)` means the input does not carry the vendor encoding at all.
pub fn parse_vendor_date(raw: &str) -> Result<Option<DateTime<Utc>>, DateError> {
    let Some(captures) = VENDOR_DATE_RE.captures(raw) else {
        return Ok(None);
    };
    let digits = &captures[1];
    let seconds: i64 = digits
        .parse()
        .map_err(|_| DateError::InvalidSeconds(digits.to_string()))?;
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(Some)
        .ok_or(DateError::OutOfRange(seconds))
}

/// Renders a second count in the vendor encoding.
pub fn encode_vendor_date(seconds: i64) -> String {
    format!("/Date({seconds})/")
}

/// Calendar date (`YYYY-MM-DD`) for display. Never fails: anything that cannot
/// be decoded is returned as received.
pub fn decode_date(raw: &str) -> String {
    decode_with(raw, DATE_FORMAT)
}

/// Date-time (`YYYY-MM-DD HH:MM:SS UTC`) for display, with the same fallback
/// policy as [`decode_date`].
pub fn decode_date_time(raw: &str) -> String {
    decode_with(raw, DATE_TIME_FORMAT)
}

fn decode_with(raw: &str, format: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    match parse_vendor_date(raw) {
        Ok(Some(instant)) => instant.format(format).to_string(),
        Ok(None) | Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_vendor_dates_in_utc() {
        assert_eq!(decode_date("/Date(1427829732)/"), "2015-03-31");
        assert_eq!(decode_date("/Date(1430421732)/"), "2015-04-30");
        assert_eq!(decode_date("/Date(1764892800)/"), "2025-12-05");
        assert_eq!(decode_date("/Date(0)/"), "1970-01-01");
    }

    #[test]
    fn decodes_date_time_with_utc_suffix() {
        assert_eq!(
            decode_date_time("/Date(1427829732)/"),
            "2015-03-31 19:22:12 UTC"
        );
        assert_eq!(decode_date_time("/Date(0)/"), "1970-01-01 00:00:00 UTC");
    }

    #[test]
    fn negative_second_counts_are_pre_epoch() {
        assert_eq!(decode_date("/Date(-86400)/"), "1969-12-31");
        assert_eq!(
            decode_date_time("/Date(-1)/"),
            "1969-12-31 23:59:59 UTC"
        );
    }

    #[test]
    fn encoded_values_decode_back_to_their_calendar_day() {
        for seconds in [-2_208_988_800_i64, -1, 0, 86_399, 86_400, 1_700_000_000] {
            let expected = DateTime::<Utc>::from_timestamp(seconds, 0)
                .unwrap()
                .format(DATE_FORMAT)
                .to_string();
            assert_eq!(decode_date(&encode_vendor_date(seconds)), expected);
        }
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(decode_date(""), "");
        assert_eq!(decode_date_time(""), "");
    }

    #[test]
    fn formatted_values_pass_through_unchanged() {
        assert_eq!(decode_date("2025-01-15"), "2025-01-15");
        assert_eq!(
            decode_date_time("2015-03-31 19:22:12 UTC"),
            "2015-03-31 19:22:12 UTC"
        );
        let once = decode_date("/Date(1427829732)/");
        assert_eq!(decode_date(&once), once);
    }

    #[test]
    fn non_numeric_payload_is_not_vendor_encoded() {
        assert_eq!(parse_vendor_date("/Date(invalid)/"), Ok(None));
        assert_eq!(decode_date("/Date(invalid)/"), "/Date(invalid)/");
    }

    #[test]
    fn overflowing_seconds_fall_back_to_raw_text() {
        let raw = "/Date(99999999999999999999)/";
        assert_eq!(
            parse_vendor_date(raw),
            Err(DateError::InvalidSeconds("99999999999999999999".to_string()))
        );
        assert_eq!(decode_date(raw), raw);

        let far = encode_vendor_date(i64::MAX);
        assert_eq!(parse_vendor_date(&far), Err(DateError::OutOfRange(i64::MAX)));
        assert_eq!(decode_date_time(&far), far);
    }
}
