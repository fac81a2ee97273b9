//! Localised weekday and month names.

use std::fmt::Write as _;

use chrono::{Locale, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::{debug, warn};

use crate::calendar::date::CalendarDate;

/// Names and date formatting for one locale.
pub trait LocaleFormatter {
    /// Seven weekday names, Monday first.
    fn weekday_names(&self, format: &str) -> [String; 7];

    /// Twelve month names, January first.
    fn month_names(&self, format: &str) -> [String; 12];

    fn format_date(&self, date: CalendarDate, format: &str) -> String;

    fn iso_week_label(&self, date: CalendarDate) -> String {
        date.iso_week_label()
    }
}

/// [`LocaleFormatter`] backed by chrono's localised strftime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChronoLocale {
    locale: Locale,
}

impl ChronoLocale {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn posix() -> Self {
        Self::new(Locale::POSIX)
    }

    /// Looks up a locale such as `de_DE`, accepting `de-DE` and an
    /// encoding suffix (`de_DE.UTF-8`).
    pub fn from_name(name: &str) -> Option<Self> {
        let base = name.trim().split('.').next().unwrap_or_default().replace('-', "_");
        if base.is_empty() || base.eq_ignore_ascii_case("C") {
            return Some(Self::posix());
        }
        Locale::try_from(base.as_str()).ok().map(Self::new)
    }

    /// Like [`ChronoLocale::from_name`], falling back to POSIX names.
    pub fn from_name_or_posix(name: &str) -> Self {
        match Self::from_name(name) {
            Some(locale) => {
                debug!(locale = %name, "using locale");
                locale
            }
            None => {
                warn!(locale = %name, "unknown locale; falling back to POSIX names");
                Self::posix()
            }
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    fn format_naive(&self, date: NaiveDate, format: &str) -> String {
        let stamp = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        let mut out = String::new();
        if write!(out, "{}", stamp.format_localized(format, self.locale)).is_err() {
            warn!(format, "could not format date");
            return String::new();
        }
        out
    }
}

impl Default for ChronoLocale {
    fn default() -> Self {
        Self::posix()
    }
}

// 2014-01-06 is a Monday.
const REFERENCE_MONDAY: (i32, u32, u32) = (2014, 1, 6);

impl LocaleFormatter for ChronoLocale {
    fn weekday_names(&self, format: &str) -> [String; 7] {
        let (year, month, day) = REFERENCE_MONDAY;
        std::array::from_fn(|offset| {
            NaiveDate::from_ymd_opt(year, month, day + offset as u32)
                .map(|date| self.format_naive(date, format))
                .unwrap_or_default()
        })
    }

    fn month_names(&self, format: &str) -> [String; 12] {
        let (year, _, _) = REFERENCE_MONDAY;
        std::array::from_fn(|offset| {
            NaiveDate::from_ymd_opt(year, offset as u32 + 1, 1)
                .map(|date| self.format_naive(date, format))
                .unwrap_or_default()
        })
    }

    fn format_date(&self, date: CalendarDate, format: &str) -> String {
        self.format_naive(date.naive(), format)
    }
}
