//! Journal entry numbering.
//!
//! Numbers follow `JE-<YYYYMM>-<NNNN>` with a strictly monotonic suffix
//! per company and month.

use chrono::{Datelike, NaiveDate};

/// The `YYYYMM` month prefix for a date.
#[must_use]
pub fn month_prefix(date: NaiveDate) -> String {
    format!("{:04}{:02}", date.year(), date.month())
}

/// Formats an entry number from a month prefix and sequence value.
#[must_use]
pub fn format_entry_number(prefix: &str, sequence: u32) -> String {
    format!("JE-{prefix}-{sequence:04}")
}

/// Parses an entry number into its month prefix and sequence.
///
/// Returns `None` for anything that does not match `JE-<YYYYMM>-<NNNN>`.
#[must_use]
pub fn parse_entry_number(number: &str) -> Option<(String, u32)> {
    let rest = number.strip_prefix("JE-")?;
    let (prefix, seq) = rest.split_once('-')?;
    if prefix.len() != 6 || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if seq.len() < 4 || !seq.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((prefix.to_string(), seq.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_prefix() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(month_prefix(date), "202501");
        let date = NaiveDate::from_ymd_opt(2025, 12, 1).unwrap();
        assert_eq!(month_prefix(date), "202512");
    }

    #[test]
    fn test_format() {
        assert_eq!(format_entry_number("202501", 1), "JE-202501-0001");
        assert_eq!(format_entry_number("202501", 42), "JE-202501-0042");
        // Sequences past 9999 widen rather than wrap.
        assert_eq!(format_entry_number("202501", 12345), "JE-202501-12345");
    }

    #[test]
    fn test_parse_round_trip() {
        let (prefix, seq) = parse_entry_number("JE-202501-0007").unwrap();
        assert_eq!(prefix, "202501");
        assert_eq!(seq, 7);
        assert_eq!(format_entry_number(&prefix, seq), "JE-202501-0007");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_entry_number("JE-2025-0001").is_none());
        assert!(parse_entry_number("JX-202501-0001").is_none());
        assert!(parse_entry_number("JE-202501-01").is_none());
        assert!(parse_entry_number("JE-202501-").is_none());
        assert!(parse_entry_number("").is_none());
    }
}
