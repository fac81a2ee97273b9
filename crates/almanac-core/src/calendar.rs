//! Month/week/day grid computation.
//!
//! [`Calendar::build`] walks a [`DateSpan`] one day at a time and groups the
//! days into years, months and week rows, padding each row to seven columns.
//! [`Calendar::render`] realises that grid through a
//! [`MarkupBuilder`](crate::markup::MarkupBuilder).

pub mod date;
pub mod entries;
mod render;
pub mod weekday;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub use date::{CalendarDate, DateSpan};
pub use entries::{Entries, Entry, EntrySource, expand_link};
pub use weekday::{FirstWeekday, WEEKDAY_CLASSES, resolve_first_weekday, rotate};

use crate::error::CalendarError;
use crate::locale::LocaleFormatter;

/// Whether to show a leading ISO week-number column, optionally with a
/// header label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeekNumbers {
    Flag(bool),
    Label(String),
}

impl WeekNumbers {
    /// Header text of the week column, `None` when the column is hidden.
    /// An empty label hides the column like `Flag(false)`.
    pub fn header(&self) -> Option<&str> {
        match self {
            Self::Flag(true) => Some(""),
            Self::Flag(false) => None,
            Self::Label(label) if label.is_empty() => None,
            Self::Label(label) => Some(label.as_str()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.header().is_some()
    }
}

impl Default for WeekNumbers {
    fn default() -> Self {
        Self::Flag(false)
    }
}

/// A caller-supplied `<col>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    #[serde(default = "Column::default_span")]
    pub span: u32,
    #[serde(default)]
    pub class: Option<String>,
}

impl Column {
    fn default_span() -> u32 {
        1
    }
}

/// Column markup emitted at the top of every month table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnGroups {
    #[default]
    None,
    /// Groups the columns around a `col.sunday`.
    MarkSundays,
    Custom(Vec<Column>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarOptions {
    pub first_weekday: FirstWeekday,
    /// Seven names, Monday first, replacing the locale's.
    pub weekday_names: Option<Vec<String>>,
    /// Twelve names, January first, replacing the locale's.
    pub month_names: Option<Vec<String>>,
    pub weekday_format: String,
    pub month_format: String,
    /// Format of the year heading; empty omits the heading.
    pub year_format: String,
    pub week_numbers: WeekNumbers,
    /// List every entry of a day instead of decorating the date with the
    /// first one.
    pub list_entries: bool,
    pub columns: ColumnGroups,
}

impl Default for CalendarOptions {
    fn default() -> Self {
        Self {
            first_weekday: FirstWeekday::default(),
            weekday_names: None,
            month_names: None,
            weekday_format: "%a".to_string(),
            month_format: "%B".to_string(),
            year_format: "%Y".to_string(),
            week_numbers: WeekNumbers::default(),
            list_entries: false,
            columns: ColumnGroups::default(),
        }
    }
}

/// Options resolved against the locale, with the week rotated to start at
/// `first_weekday`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub first_weekday: u8,
    pub weekday_names: [String; 7],
    pub weekday_classes: [&'static str; 7],
    pub month_names: [String; 12],
    pub week_header: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridCell {
    pub date: CalendarDate,
    pub iso: String,
    pub day: u32,
    pub weekday_class: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekRow {
    pub leading_blanks: u32,
    pub cells: Vec<GridCell>,
    pub trailing_blanks: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso_week: Option<String>,
}

impl WeekRow {
    /// Day columns covered by the row, blanks included.
    pub fn width(&self) -> u32 {
        self.leading_blanks + self.cells.len() as u32 + self.trailing_blanks
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthTable {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub weeks: Vec<WeekRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearSection {
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub months: Vec<MonthTable>,
}

/// Calendar generator bound to a locale and, optionally, an entry source.
pub struct Calendar<'a> {
    options: CalendarOptions,
    formatter: &'a dyn LocaleFormatter,
    entries: Option<&'a dyn EntrySource>,
}

impl<'a> Calendar<'a> {
    pub fn new(options: CalendarOptions, formatter: &'a dyn LocaleFormatter) -> Self {
        Self {
            options,
            formatter,
            entries: None,
        }
    }

    pub fn with_entries(mut self, entries: &'a dyn EntrySource) -> Self {
        self.entries = Some(entries);
        self
    }

    pub fn options(&self) -> &CalendarOptions {
        &self.options
    }

    /// Validates the options and resolves names and column order.
    pub fn layout(&self) -> Result<Layout, CalendarError> {
        let first_weekday = self.options.first_weekday.resolve()?;

        let weekday_names: [String; 7] = match &self.options.weekday_names {
            Some(names) => names
                .clone()
                .try_into()
                .map_err(|names: Vec<String>| CalendarError::WeekdayNames { len: names.len() })?,
            None => self.formatter.weekday_names(&self.options.weekday_format),
        };
        let month_names: [String; 12] = match &self.options.month_names {
            Some(names) => names
                .clone()
                .try_into()
                .map_err(|names: Vec<String>| CalendarError::MonthNames { len: names.len() })?,
            None => self.formatter.month_names(&self.options.month_format),
        };

        Ok(Layout {
            first_weekday,
            weekday_names: rotate(&weekday_names, first_weekday),
            weekday_classes: rotate(&WEEKDAY_CLASSES, first_weekday),
            month_names,
            week_header: self.options.week_numbers.header().map(str::to_string),
        })
    }

    /// Computes the grid for `span`.
    #[instrument(level = "debug", skip(self, span), fields(from = %span.from(), till = %span.till()))]
    pub fn build(&self, span: &DateSpan) -> Result<Vec<YearSection>, CalendarError> {
        let layout = self.layout()?;
        Ok(self.build_with(&layout, span))
    }

    fn build_with(&self, layout: &Layout, span: &DateSpan) -> Vec<YearSection> {
        let mut years: Vec<YearSection> = Vec::new();
        let mut first = true;

        for day in span.days() {
            let column = column_of(day, layout.first_weekday);
            let day_of_month = day.day();

            if first || (day_of_month == 1 && day.month() == 1) {
                years.push(YearSection {
                    year: day.year(),
                    label: self.year_label(day),
                    months: Vec::new(),
                });
            }

            if first || day_of_month == 1 {
                if let Some(section) = years.last_mut() {
                    section.months.push(MonthTable {
                        year: day.year(),
                        month: day.month(),
                        label: layout.month_names[day.month() as usize - 1].clone(),
                        weeks: Vec::new(),
                    });
                }
            }

            if first || column == 0 || day_of_month == 1 {
                if let Some(table) = current_month(&mut years) {
                    table.weeks.push(WeekRow {
                        leading_blanks: column,
                        cells: Vec::new(),
                        trailing_blanks: 0,
                        iso_week: layout
                            .week_header
                            .as_ref()
                            .map(|_| self.formatter.iso_week_label(day)),
                    });
                }
            }

            let cell = GridCell {
                date: day,
                iso: day.iso_string(),
                day: day_of_month,
                weekday_class: layout.weekday_classes[column as usize],
                entries: self
                    .entries
                    .map(|source| source.entries_for(day))
                    .unwrap_or_default(),
            };

            let ends_row = day.is_last_of_month()
                || day.succ().is_none_or(|next| next == span.till());
            if let Some(row) = current_month(&mut years).and_then(|table| table.weeks.last_mut()) {
                row.cells.push(cell);
                if column != 6 && ends_row {
                    row.trailing_blanks = 6 - column;
                }
            }

            first = false;
        }

        debug!(years = years.len(), "built calendar grid");
        years
    }

    fn year_label(&self, day: CalendarDate) -> Option<String> {
        if self.options.year_format.is_empty() {
            return None;
        }
        Some(self.formatter.format_date(day, &self.options.year_format))
    }
}

/// Zero-based column of `day` in a week starting at `first_weekday`.
pub fn column_of(day: CalendarDate, first_weekday: u8) -> u32 {
    (day.iso_weekday() + 6 - u32::from(first_weekday % 7)) % 7
}

fn current_month(years: &mut [YearSection]) -> Option<&mut MonthTable> {
    years.last_mut()?.months.last_mut()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::ChronoLocale;

    fn span(from: &str, till: &str) -> DateSpan {
        DateSpan::parse(from, till).expect("valid span")
    }

    fn build(options: CalendarOptions, from: &str, till: &str) -> Vec<YearSection> {
        let locale = ChronoLocale::posix();
        Calendar::new(options, &locale)
            .build(&span(from, till))
            .expect("grid")
    }

    fn shape(row: &WeekRow) -> (u32, Vec<(u32, &'static str)>, u32) {
        (
            row.leading_blanks,
            row.cells
                .iter()
                .map(|cell| (cell.day, cell.weekday_class))
                .collect(),
            row.trailing_blanks,
        )
    }

    #[test]
    fn september_into_october() {
        let years = build(CalendarOptions::default(), "2015-09-29", "2015-10-02");
        assert_eq!(years.len(), 1);
        assert_eq!(years[0].label.as_deref(), Some("2015"));

        let months = &years[0].months;
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].label, "September");
        assert_eq!(months[1].label, "October");

        assert_eq!(months[0].weeks.len(), 1);
        assert_eq!(
            shape(&months[0].weeks[0]),
            (1, vec![(29, "tue"), (30, "wed")], 4)
        );
        assert_eq!(months[1].weeks.len(), 1);
        assert_eq!(shape(&months[1].weeks[0]), (3, vec![(1, "thu")], 3));
    }

    #[test]
    fn sunday_first_shifts_the_blanks() {
        let options = CalendarOptions {
            first_weekday: FirstWeekday::Territory("US".into()),
            ..CalendarOptions::default()
        };
        let years = build(options, "2015-09-29", "2015-10-02");
        let months = &years[0].months;
        assert_eq!(
            shape(&months[0].weeks[0]),
            (2, vec![(29, "tue"), (30, "wed")], 3)
        );
        assert_eq!(shape(&months[1].weeks[0]), (4, vec![(1, "thu")], 2));
    }

    #[test]
    fn empty_span_builds_nothing() {
        assert!(build(CalendarOptions::default(), "2015-09-29", "2015-09-29").is_empty());
    }

    #[test]
    fn every_row_is_seven_columns_wide() {
        for first in 0..7u8 {
            let options = CalendarOptions {
                first_weekday: FirstWeekday::Index(first),
                week_numbers: WeekNumbers::Flag(true),
                ..CalendarOptions::default()
            };
            let years = build(options, "2015-11-17", "2017-01-09");
            for month in years.iter().flat_map(|year| &year.months) {
                for row in &month.weeks {
                    assert_eq!(row.width(), 7, "first weekday {first}, {month:?}");
                    assert!(row.iso_week.is_some());
                }
            }
        }
    }

    #[test]
    fn full_months_have_only_complete_inner_rows() {
        let years = build(CalendarOptions::default(), "2015-02-01", "2015-03-01");
        let february = &years[0].months[0];
        // 2015-02-01 is a Sunday, 2015-02-28 a Saturday.
        assert_eq!(february.weeks.len(), 5);
        assert_eq!(february.weeks[0].leading_blanks, 6);
        assert_eq!(february.weeks[4].trailing_blanks, 1);
        for row in &february.weeks[1..4] {
            assert_eq!(row.cells.len(), 7);
        }
    }

    #[test]
    fn week_labels_use_the_iso_week_year() {
        let options = CalendarOptions {
            week_numbers: WeekNumbers::Label("Wk".into()),
            ..CalendarOptions::default()
        };
        let locale = ChronoLocale::posix();
        let calendar = Calendar::new(options, &locale);
        assert_eq!(
            calendar.layout().expect("layout").week_header.as_deref(),
            Some("Wk")
        );

        let years = calendar.build(&span("2016-01-01", "2016-01-04")).expect("grid");
        let row = &years[0].months[0].weeks[0];
        assert_eq!(row.iso_week.as_deref(), Some("2015-W53"));
        assert_eq!(shape(row), (4, vec![(1, "fri"), (2, "sat"), (3, "sun")], 0));
    }

    #[test]
    fn crossing_new_year_opens_a_section() {
        let years = build(CalendarOptions::default(), "2015-12-30", "2016-01-02");
        let labels: Vec<_> = years.iter().map(|year| year.year).collect();
        assert_eq!(labels, [2015, 2016]);
        assert_eq!(years[0].months[0].weeks[0].trailing_blanks, 3);
        assert_eq!(years[1].months[0].weeks[0].leading_blanks, 4);
    }

    #[test]
    fn empty_year_format_drops_the_label() {
        let options = CalendarOptions {
            year_format: String::new(),
            ..CalendarOptions::default()
        };
        let years = build(options, "2015-09-29", "2015-10-02");
        assert_eq!(years[0].label, None);
    }

    #[test]
    fn building_twice_is_identical() {
        let locale = ChronoLocale::posix();
        let entries: Entries = [Entry::new(CalendarDate::parse("2015-09-30").expect("date"))]
            .into_iter()
            .collect();
        let calendar = Calendar::new(CalendarOptions::default(), &locale).with_entries(&entries);
        let span = span("2015-09-01", "2015-11-01");
        assert_eq!(
            calendar.build(&span).expect("grid"),
            calendar.build(&span).expect("grid")
        );
    }

    #[test]
    fn entries_attach_to_their_day() {
        let locale = ChronoLocale::posix();
        let day = CalendarDate::parse("2015-09-30").expect("date");
        let entries: Entries = [
            Entry::new(day).with_title("one"),
            Entry::new(day).with_title("two"),
        ]
        .into_iter()
        .collect();
        let years = Calendar::new(CalendarOptions::default(), &locale)
            .with_entries(&entries)
            .build(&span("2015-09-29", "2015-10-01"))
            .expect("grid");
        let cells = &years[0].months[0].weeks[0].cells;
        assert!(cells[0].entries.is_empty());
        let titles: Vec<_> = cells[1]
            .entries
            .iter()
            .filter_map(|entry| entry.title.as_deref())
            .collect();
        assert_eq!(titles, ["one", "two"]);
    }

    #[test]
    fn overrides_must_have_the_right_length() {
        let locale = ChronoLocale::posix();
        let short = CalendarOptions {
            weekday_names: Some(vec!["M".into(), "T".into()]),
            ..CalendarOptions::default()
        };
        assert_eq!(
            Calendar::new(short, &locale).build(&span("2015-09-29", "2015-10-02")),
            Err(CalendarError::WeekdayNames { len: 2 })
        );

        let long = CalendarOptions {
            month_names: Some(vec![String::new(); 13]),
            ..CalendarOptions::default()
        };
        assert_eq!(
            Calendar::new(long, &locale).layout(),
            Err(CalendarError::MonthNames { len: 13 })
        );
    }

    #[test]
    fn overrides_are_rotated_after_resolving_the_territory() {
        let locale = ChronoLocale::posix();
        let options = CalendarOptions {
            first_weekday: FirstWeekday::Territory("sy".into()),
            weekday_names: Some(
                ["M", "T", "W", "T", "F", "S", "S"]
                    .map(String::from)
                    .to_vec(),
            ),
            ..CalendarOptions::default()
        };
        let calendar = Calendar::new(options, &locale);
        assert_eq!(
            calendar.options().first_weekday,
            FirstWeekday::Territory("sy".into())
        );
        let layout = calendar.layout().expect("layout");
        assert_eq!(layout.first_weekday, 5);
        assert_eq!(layout.weekday_names, ["S", "S", "M", "T", "W", "T", "F"]);
        assert_eq!(layout.weekday_classes[0], "sat");
    }

    #[test]
    fn bad_first_weekday_index_is_rejected() {
        let locale = ChronoLocale::posix();
        let options = CalendarOptions {
            first_weekday: FirstWeekday::Index(7),
            ..CalendarOptions::default()
        };
        assert_eq!(
            Calendar::new(options, &locale).layout(),
            Err(CalendarError::FirstWeekdayIndex { index: 7 })
        );
    }

    #[test]
    fn week_number_header_variants() {
        assert_eq!(WeekNumbers::Flag(false).header(), None);
        assert_eq!(WeekNumbers::Flag(true).header(), Some(""));
        assert_eq!(WeekNumbers::Label(String::new()).header(), None);
        assert!(WeekNumbers::Label("KW".into()).enabled());
    }

    #[test]
    fn column_formula() {
        let sunday = CalendarDate::parse("2015-10-04").expect("date");
        assert_eq!(column_of(sunday, 0), 6);
        assert_eq!(column_of(sunday, 6), 0);
        assert_eq!(column_of(sunday, 5), 1);
    }
}
