use tracing::{instrument, trace};

use super::{
    Calendar, CalendarOptions, ColumnGroups, DateSpan, Entry, GridCell, Layout, MonthTable,
    WeekRow, YearSection,
};
use crate::error::CalendarError;
use crate::markup::MarkupBuilder;

impl Calendar<'_> {
    /// Builds the grid for `span` and writes it to `out` as one `section`
    /// per year holding one `table` per month.
    ///
    /// Options are validated before anything is written.
    #[instrument(level = "debug", skip(self, span, out), fields(from = %span.from(), till = %span.till()))]
    pub fn render<B: MarkupBuilder + ?Sized>(
        &self,
        span: &DateSpan,
        out: &mut B,
    ) -> Result<(), CalendarError> {
        let layout = self.layout()?;
        let years = self.build_with(&layout, span);
        emit_years(out, &layout, self.options(), &years);
        Ok(())
    }
}

fn emit_years<B: MarkupBuilder + ?Sized>(
    out: &mut B,
    layout: &Layout,
    options: &CalendarOptions,
    years: &[YearSection],
) {
    for section in years {
        out.append_element("section");
        out.set_class(&format!("calendar year-{}", section.year));
        if let Some(label) = &section.label {
            leaf(out, "h1", label);
        }
        for month in &section.months {
            emit_month(out, layout, options, month);
        }
        out.close_element();
    }
}

fn emit_month<B: MarkupBuilder + ?Sized>(
    out: &mut B,
    layout: &Layout,
    options: &CalendarOptions,
    month: &MonthTable,
) {
    trace!(year = month.year, month = month.month, "rendering month");
    out.append_element("table");
    out.set_class(&format!("month-{:02}", month.month));

    emit_columns(out, layout, &options.columns);

    out.append_element("thead");
    out.append_element("tr");
    out.set_class("month");
    out.append_element("th");
    let width = if layout.week_header.is_some() { 8 } else { 7 };
    out.set_attribute("colspan", &width.to_string());
    out.append_text(&month.label);
    out.close_element();
    out.close_element();

    out.append_element("tr");
    out.set_class("weekdays");
    if let Some(header) = &layout.week_header {
        out.append_element("th");
        out.set_class("week");
        out.append_text(header);
        out.close_element();
    }
    for name in &layout.weekday_names {
        leaf(out, "th", name);
    }
    out.close_element();
    out.close_element();

    out.append_element("tbody");
    for row in &month.weeks {
        emit_week(out, options, row);
    }
    out.close_element();

    out.close_element();
}

fn emit_columns<B: MarkupBuilder + ?Sized>(out: &mut B, layout: &Layout, columns: &ColumnGroups) {
    match columns {
        ColumnGroups::None => {}
        ColumnGroups::MarkSundays => {
            if layout.week_header.is_some() {
                column(out, "col", 1, Some("week"));
            }
            let first = u32::from(layout.first_weekday);
            column(out, "colgroup", 6 - first, None);
            column(out, "col", 1, Some("sunday"));
            column(out, "colgroup", first, None);
        }
        ColumnGroups::Custom(columns) => {
            for col in columns {
                column(out, "col", col.span, col.class.as_deref());
            }
        }
    }
}

fn column<B: MarkupBuilder + ?Sized>(out: &mut B, tag: &str, span: u32, class: Option<&str>) {
    if span == 0 {
        return;
    }
    out.append_element(tag);
    if span > 1 {
        out.set_attribute("span", &span.to_string());
    }
    if let Some(class) = class {
        out.set_class(class);
    }
    out.close_element();
}

fn emit_week<B: MarkupBuilder + ?Sized>(out: &mut B, options: &CalendarOptions, row: &WeekRow) {
    out.append_element("tr");
    if let Some(label) = &row.iso_week {
        out.append_element("td");
        out.set_class("week");
        out.append_text(label);
        out.close_element();
    }
    blank(out, row.leading_blanks);
    for cell in &row.cells {
        emit_day(out, options, cell);
    }
    blank(out, row.trailing_blanks);
    out.close_element();
}

fn blank<B: MarkupBuilder + ?Sized>(out: &mut B, columns: u32) {
    if columns == 0 {
        return;
    }
    out.append_element("td");
    if columns > 1 {
        out.set_attribute("colspan", &columns.to_string());
    }
    out.close_element();
}

fn emit_day<B: MarkupBuilder + ?Sized>(out: &mut B, options: &CalendarOptions, cell: &GridCell) {
    out.append_element("td");
    out.set_class(cell.weekday_class);

    if options.list_entries {
        time(out, cell, None);
        if !cell.entries.is_empty() {
            out.append_element("ul");
            out.set_class("entries");
            for entry in &cell.entries {
                list_item(out, entry);
            }
            out.close_element();
        }
    } else {
        let first = cell.entries.first();
        match first.and_then(Entry::resolved_link) {
            Some(href) => {
                out.append_element("a");
                out.set_attribute("href", &href);
                time(out, cell, first);
                out.close_element();
            }
            None => time(out, cell, first),
        }
    }

    out.close_element();
}

fn time<B: MarkupBuilder + ?Sized>(out: &mut B, cell: &GridCell, entry: Option<&Entry>) {
    out.append_element("time");
    out.set_attribute("datetime", &cell.iso);
    if let Some(entry) = entry {
        if let Some(title) = entry.title.as_deref().filter(|title| !title.is_empty()) {
            out.set_attribute("title", title);
        }
        if let Some(class) = &entry.css_class {
            out.set_class(class);
        }
    }
    out.append_text(&cell.day.to_string());
    out.close_element();
}

fn list_item<B: MarkupBuilder + ?Sized>(out: &mut B, entry: &Entry) {
    out.append_element("li");
    if let Some(class) = &entry.css_class {
        out.set_class(class);
    }
    let title = entry.title.as_deref().unwrap_or_default();
    match entry.resolved_link() {
        Some(href) => {
            out.append_element("a");
            out.set_attribute("href", &href);
            out.append_text(if title.is_empty() { href.as_str() } else { title });
            out.close_element();
        }
        None => out.append_text(title),
    }
    out.close_element();
}

fn leaf<B: MarkupBuilder + ?Sized>(out: &mut B, tag: &str, text: &str) {
    out.append_element(tag);
    out.append_text(text);
    out.close_element();
}
