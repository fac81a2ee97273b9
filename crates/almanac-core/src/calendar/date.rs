use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::CalendarError;

/// A day without a time component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, CalendarError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| CalendarError::InvalidDate {
                input: format!("{year:04}-{month:02}-{day:02}"),
                reason: "no such day".to_string(),
            })
    }

    /// Parses `YYYY-MM-DD`.
    pub fn parse(input: &str) -> Result<Self, CalendarError> {
        NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|err| CalendarError::InvalidDate {
                input: input.to_string(),
                reason: err.to_string(),
            })
    }

    pub fn naive(self) -> NaiveDate {
        self.0
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }

    /// 1 for Monday through 7 for Sunday.
    pub fn iso_weekday(self) -> u32 {
        self.0.weekday().number_from_monday()
    }

    pub fn days_in_month(self) -> u32 {
        let (next_year, next_month) = if self.month() == 12 {
            (self.year() + 1, 1)
        } else {
            (self.year(), self.month() + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|first| first.pred_opt())
            .map(|last| last.day())
            .unwrap_or(31)
    }

    pub fn is_last_of_month(self) -> bool {
        self.day() == self.days_in_month()
    }

    /// The following day, `None` past the end of the supported range.
    pub fn succ(self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }

    pub fn add_days(self, days: i64) -> Option<Self> {
        self.0.checked_add_signed(Duration::days(days)).map(Self)
    }

    /// ISO 8601 week-numbering year and week.
    pub fn iso_week(self) -> (i32, u32) {
        let week = self.0.iso_week();
        (week.year(), week.week())
    }

    /// `YYYY-Www`, using the ISO week-year.
    pub fn iso_week_label(self) -> String {
        let (year, week) = self.iso_week();
        format!("{year:04}-W{week:02}")
    }

    pub fn iso_string(self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for CalendarDate {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Half-open range of days `[from, till)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSpan {
    from: CalendarDate,
    till: CalendarDate,
}

impl DateSpan {
    /// Rejects reversed spans; `from == till` is a valid empty span.
    pub fn new(from: CalendarDate, till: CalendarDate) -> Result<Self, CalendarError> {
        if from > till {
            return Err(CalendarError::ReversedSpan {
                from: from.naive(),
                till: till.naive(),
            });
        }
        Ok(Self { from, till })
    }

    pub fn parse(from: &str, till: &str) -> Result<Self, CalendarError> {
        Self::new(CalendarDate::parse(from)?, CalendarDate::parse(till)?)
    }

    pub fn from(&self) -> CalendarDate {
        self.from
    }

    pub fn till(&self) -> CalendarDate {
        self.till
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.till
    }

    pub fn len_days(&self) -> i64 {
        (self.till.naive() - self.from.naive()).num_days()
    }

    pub fn days(&self) -> impl Iterator<Item = CalendarDate> {
        let till = self.till;
        std::iter::successors(Some(self.from), |day| day.succ()).take_while(move |day| *day != till)
    }
}
