use std::collections::HashMap;
use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::date::CalendarDate;

/// Annotation attached to one calendar day, such as a birthday or a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub date: CalendarDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Target of the day's link. May contain strftime specifiers
    /// (`/archive/%Y/%m/`) that are filled in from `date`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub css_class: Option<String>,
}

impl Entry {
    pub fn new(date: CalendarDate) -> Self {
        Self {
            date,
            title: None,
            link: None,
            css_class: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.css_class = Some(class.into());
        self
    }

    /// The link with date specifiers expanded.
    pub fn resolved_link(&self) -> Option<String> {
        self.link
            .as_deref()
            .filter(|link| !link.is_empty())
            .map(|link| expand_link(link, self.date))
    }
}

/// Expands strftime specifiers in `template` against `date`. Templates
/// that chrono cannot format are returned unchanged.
pub fn expand_link(template: &str, date: CalendarDate) -> String {
    if !template.contains('%') {
        return template.to_string();
    }

    let items: Vec<Item<'_>> = StrftimeItems::new(template).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        warn!(template, "link template has invalid specifiers; using it verbatim");
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len() + 8);
    let formatted = date.naive().format_with_items(items.into_iter());
    if write!(out, "{formatted}").is_err() {
        warn!(template, "link template needs more than a date; using it verbatim");
        return template.to_string();
    }
    out
}

/// Supplies the entries of a day.
pub trait EntrySource {
    fn entries_for(&self, date: CalendarDate) -> Vec<Entry>;
}

impl<F> EntrySource for F
where
    F: Fn(CalendarDate) -> Vec<Entry>,
{
    fn entries_for(&self, date: CalendarDate) -> Vec<Entry> {
        self(date)
    }
}

/// Entries grouped by day, insertion order kept within a day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entries {
    by_date: HashMap<CalendarDate, Vec<Entry>>,
}

impl Entries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.by_date.entry(entry.date).or_default().push(entry);
    }

    pub fn get(&self, date: CalendarDate) -> &[Entry] {
        self.by_date
            .get(&date)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of entries over all days.
    pub fn len(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

impl FromIterator<Entry> for Entries {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut entries = Self::new();
        entries.extend(iter);
        entries
    }
}

impl Extend<Entry> for Entries {
    fn extend<I: IntoIterator<Item = Entry>>(&mut self, iter: I) {
        for entry in iter {
            self.push(entry);
        }
    }
}

impl EntrySource for Entries {
    fn entries_for(&self, date: CalendarDate) -> Vec<Entry> {
        self.get(date).to_vec()
    }
}
