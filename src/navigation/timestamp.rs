//! Timestamp extraction from log lines
//!
//! Parsers look at the head of a line only. A line that does not start with a
//! timestamp is treated by navigation as a continuation of the previous record
//! (stack traces, wrapped messages).

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDateTime, Utc};

/// Configuration value selecting RFC 3339 parsing
pub const RFC3339: &str = "rfc3339";

/// Parses the timestamp a log line starts with
pub trait TimestampParser: Send + Sync {
    fn parse(&self, line: &str) -> Option<DateTime<Utc>>;
}

/// strftime-style pattern, interpreted as UTC
///
/// `"%Y-%m-%d %H:%M:%S"` matches `2024-03-01 12:00:00 INFO started`; the rest of
/// the line after the timestamp is ignored.
#[derive(Debug, Clone)]
pub struct PatternParser {
    format: String,
}

impl PatternParser {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }
}

impl TimestampParser for PatternParser {
    fn parse(&self, line: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_and_remainder(line, &self.format)
            .ok()
            .map(|(naive, _)| naive.and_utc())
    }
}

/// RFC 3339 timestamp as the first whitespace-delimited token
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc3339Parser;

impl TimestampParser for Rfc3339Parser {
    fn parse(&self, line: &str) -> Option<DateTime<Utc>> {
        let token = line.split_whitespace().next()?;
        DateTime::parse_from_rfc3339(token)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

/// Whether `format` is [`RFC3339`] or a strftime pattern chrono accepts
pub fn is_valid_format(format: &str) -> bool {
    if format.eq_ignore_ascii_case(RFC3339) {
        return true;
    }
    !format.is_empty() && StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

/// Builds the parser for a configured format
pub fn parser_for(format: &str) -> Box<dyn TimestampParser> {
    if format.eq_ignore_ascii_case(RFC3339) {
        Box::new(Rfc3339Parser)
    } else {
        Box::new(PatternParser::new(format))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pattern_parser_ignores_remainder() {
        let parser = PatternParser::new("%Y-%m-%d %H:%M:%S");
        let ts = parser.parse("2024-03-01 12:30:45 INFO service started").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap());
    }

    #[test]
    fn test_pattern_parser_rejects_continuation_lines() {
        let parser = PatternParser::new("%Y-%m-%d %H:%M:%S");
        assert!(parser.parse("    at com.example.Main(Main.java:10)").is_none());
        assert!(parser.parse("").is_none());
    }

    #[test]
    fn test_rfc3339_parser() {
        let parser = Rfc3339Parser;
        let ts = parser.parse("2024-03-01T12:00:00+02:00 WARN disk").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        assert!(parser.parse("WARN 2024-03-01T12:00:00Z").is_none());
    }

    #[test]
    fn test_format_validation() {
        assert!(is_valid_format("rfc3339"));
        assert!(is_valid_format("%d/%b/%Y:%H:%M:%S"));
        assert!(!is_valid_format("%Y-%m-%d %Q"));
        assert!(!is_valid_format(""));
    }
}
