//! Error types for calendar construction.
//!
//! Every variant is an invalid-argument error: the builder itself is pure
//! and cannot fail once its inputs are accepted.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// A span whose start lies after its end.
    #[error("span start {from} is after span end {till}")]
    ReversedSpan { from: NaiveDate, till: NaiveDate },

    /// A weekday-name override that is not exactly seven names long.
    #[error("expected 7 weekday names, got {len}")]
    WeekdayNames { len: usize },

    /// A month-name override that is not exactly twelve names long.
    #[error("expected 12 month names, got {len}")]
    MonthNames { len: usize },

    #[error("first weekday must be between 0 (Monday) and 6 (Sunday), got {index}")]
    FirstWeekdayIndex { index: u8 },

    #[error("invalid date {input:?}: {reason}")]
    InvalidDate { input: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_argument() {
        let e = CalendarError::WeekdayNames { len: 3 };
        assert_eq!(e.to_string(), "expected 7 weekday names, got 3");

        let e = CalendarError::FirstWeekdayIndex { index: 9 };
        assert_eq!(
            e.to_string(),
            "first weekday must be between 0 (Monday) and 6 (Sunday), got 9"
        );

        let e = CalendarError::InvalidDate {
            input: "2015-13-01".into(),
            reason: "input is out of range".into(),
        };
        assert_eq!(
            e.to_string(),
            "invalid date \"2015-13-01\": input is out of range"
        );
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: std::error::Error + Send + Sync + 'static>() {}
        assert_impl::<CalendarError>();
    }
}
