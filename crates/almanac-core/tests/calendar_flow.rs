use std::fs;

use almanac_core::calendar::{CalendarDate, Entries, Entry, EntrySource};
use almanac_core::commands::{load_entries, render_calendar, resolve_span};
use almanac_core::config::Config;
use almanac_core::locale::ChronoLocale;
use almanac_core::markup::{Document, OutputMode};
use almanac_core::{Calendar, CalendarOptions, DateSpan};
use chrono::NaiveDate;
use tempfile::tempdir;

#[test]
fn rc_file_and_entries_drive_the_markup() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("almanacrc");
    fs::write(
        &rc,
        "calendar.first_weekday = US\n\
         calendar.locale = de_DE\n\
         calendar.mark_sundays = on\n\
         output.pretty = off\n",
    )
    .expect("write rc");
    let days = temp.path().join("days.json");
    fs::write(
        &days,
        r#"[{"date": "2015-10-01", "title": "Tag der Einheit?", "link": "/%Y/%m/%d", "class": "holiday"}]"#,
    )
    .expect("write entries");

    let cfg = Config::from_file(&rc).expect("load rc");
    let today = NaiveDate::from_ymd_opt(2015, 9, 1).expect("today");
    let span = resolve_span("2015-09-29", "2015-10-02", today).expect("span");
    let entries = load_entries(&days).expect("entries");

    let html = render_calendar(&cfg, &span, &entries, false, None).expect("render");

    assert!(html.contains("<th colspan=\"7\">September</th>"));
    assert!(html.contains("<th colspan=\"7\">Oktober</th>"));
    assert!(html.contains("<tr class=\"weekdays\"><th>So</th><th>Mo</th>"));
    assert!(html.contains("<col class=\"sunday\"><colgroup span=\"6\"></colgroup>"));
    assert!(html.contains(
        "<td class=\"thu\"><a href=\"/2015/10/01\">\
         <time datetime=\"2015-10-01\" title=\"Tag der Einheit?\" class=\"holiday\">1</time>\
         </a></td><td colspan=\"2\"></td>"
    ));
}

#[test]
fn computed_entries_mark_every_sunday() {
    let sundays = |day: CalendarDate| {
        if day.iso_weekday() == 7 {
            vec![Entry::new(day).with_class("rest")]
        } else {
            Vec::new()
        }
    };
    let locale = ChronoLocale::posix();
    let span = DateSpan::parse("2015-02-01", "2015-03-01").expect("span");
    let years = Calendar::new(CalendarOptions::default(), &locale)
        .with_entries(&sundays)
        .build(&span)
        .expect("grid");

    let marked: Vec<u32> = years[0].months[0]
        .weeks
        .iter()
        .flat_map(|row| &row.cells)
        .filter(|cell| !cell.entries.is_empty())
        .map(|cell| cell.day)
        .collect();
    assert_eq!(marked, [1, 8, 15, 22]);
    assert_eq!(sundays.entries_for(span.from()).len(), 1);
}

#[test]
fn grid_serialises_for_tooling() {
    let locale = ChronoLocale::posix();
    let entries: Entries = [Entry::new(CalendarDate::parse("2015-09-30").expect("date"))
        .with_title("Lee")]
    .into_iter()
    .collect();
    let years = Calendar::new(CalendarOptions::default(), &locale)
        .with_entries(&entries)
        .build(&DateSpan::parse("2015-09-29", "2015-10-01").expect("span"))
        .expect("grid");

    let json = serde_json::to_value(&years).expect("json");
    let row = &json[0]["months"][0]["weeks"][0];
    assert_eq!(row["leading_blanks"], 1);
    assert_eq!(row["trailing_blanks"], 4);
    assert_eq!(row["cells"][0]["iso"], "2015-09-29");
    assert_eq!(row["cells"][1]["entries"][0]["title"], "Lee");
    assert!(row.get("iso_week").is_none());
}

#[test]
fn multi_year_pretty_output() {
    let locale = ChronoLocale::posix();
    let mut doc = Document::new(OutputMode::Html);
    Calendar::new(CalendarOptions::default(), &locale)
        .render(
            &DateSpan::parse("2015-12-31", "2016-01-01").expect("span"),
            &mut doc,
        )
        .expect("render");

    let expected = "\
<section class=\"calendar year-2015\">
\t<h1>2015</h1>
\t<table class=\"month-12\">
\t\t<thead>
\t\t\t<tr class=\"month\">
\t\t\t\t<th colspan=\"7\">December</th>
\t\t\t</tr>
\t\t\t<tr class=\"weekdays\">
\t\t\t\t<th>Mon</th>
\t\t\t\t<th>Tue</th>
\t\t\t\t<th>Wed</th>
\t\t\t\t<th>Thu</th>
\t\t\t\t<th>Fri</th>
\t\t\t\t<th>Sat</th>
\t\t\t\t<th>Sun</th>
\t\t\t</tr>
\t\t</thead>
\t\t<tbody>
\t\t\t<tr>
\t\t\t\t<td colspan=\"3\"></td>
\t\t\t\t<td class=\"thu\"><time datetime=\"2015-12-31\">31</time></td>
\t\t\t\t<td colspan=\"3\"></td>
\t\t\t</tr>
\t\t</tbody>
\t</table>
</section>";
    assert_eq!(doc.render_pretty("\t"), expected);
}
