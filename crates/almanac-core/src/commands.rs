use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow, bail};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::calendar::{Calendar, DateSpan, Entries, Entry, resolve_first_weekday};
use crate::cli::{Command, SpanArgs};
use crate::config::Config;
use crate::datetime::{parse_date_expr, today_in};
use crate::html5::Html5;
use crate::markup::Document;

#[instrument(skip(cfg, command))]
pub fn dispatch(cfg: &Config, command: Command) -> anyhow::Result<()> {
    debug!(?command, "dispatching command");

    match command {
        Command::Calendar {
            span,
            output,
            document,
            lang,
        } => cmd_calendar(cfg, &span, output.as_deref(), document, lang.as_deref()),
        Command::Grid { span } => cmd_grid(cfg, &span),
        Command::FirstWeekday { code } => cmd_first_weekday(&code),
        Command::Names => cmd_names(cfg),
        Command::Show => cmd_show(cfg),
    }
}

/// Markup for `span`: a fragment, or a complete page when `document` is set.
#[instrument(skip(cfg, entries))]
pub fn render_calendar(
    cfg: &Config,
    span: &DateSpan,
    entries: &Entries,
    document: bool,
    lang: Option<&str>,
) -> anyhow::Result<String> {
    let options = cfg.calendar_options()?;
    let locale = cfg.locale();
    let mode = cfg.output_mode()?;
    let pretty = cfg.pretty()?;
    let calendar = Calendar::new(options, &locale).with_entries(entries);

    if !document {
        let mut doc = Document::new(mode);
        calendar.render(span, &mut doc)?;
        return Ok(if pretty {
            doc.render_pretty("\t")
        } else {
            doc.render_compact()
        });
    }

    let mut page = Html5::create_html(mode, lang, None);
    {
        let mut root = page.root();
        {
            let mut head = root.head();
            head.child("meta").attrib("charset", Some("utf-8"));
            head.title(&format!("Calendar {} to {}", span.from(), span.till()));
        }
        let mut body = root.body();
        calendar.render(span, &mut body)?;
    }
    Ok(page.to_document_string(pretty))
}

/// Today in the configured `calendar.timezone`.
fn today(cfg: &Config) -> anyhow::Result<NaiveDate> {
    let today = today_in(&cfg.timezone()?, Utc::now());
    debug!(%today, "resolved today");
    Ok(today)
}

/// Resolves both ends of a span against `today`.
pub fn resolve_span(from: &str, till: &str, today: NaiveDate) -> anyhow::Result<DateSpan> {
    let from = parse_date_expr(from, today).context("invalid FROM date")?;
    let till = parse_date_expr(till, today).context("invalid TILL date")?;
    Ok(DateSpan::new(from, till)?)
}

#[derive(Debug, Default, Deserialize)]
struct EntryFile {
    #[serde(default)]
    entry: Vec<Entry>,
}

/// Reads entries from a `.toml` file of `[[entry]]` tables or a `.json`
/// array.
#[instrument]
pub fn load_entries(path: &Path) -> anyhow::Result<Entries> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let entries: Vec<Entry> = match extension.as_deref() {
        Some("toml") => {
            toml::from_str::<EntryFile>(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
                .entry
        }
        Some("json") => serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?,
        _ => bail!(
            "unsupported entries file {}: expected a .toml or .json extension",
            path.display()
        ),
    };

    info!(file = %path.display(), count = entries.len(), "loaded entries");
    Ok(entries.into_iter().collect())
}

fn entries_for(args: &SpanArgs) -> anyhow::Result<Entries> {
    match &args.entries {
        Some(path) => load_entries(path),
        None => Ok(Entries::new()),
    }
}

#[instrument(skip(cfg, args))]
fn cmd_calendar(
    cfg: &Config,
    args: &SpanArgs,
    output: Option<&Path>,
    document: bool,
    lang: Option<&str>,
) -> anyhow::Result<()> {
    info!("command calendar");

    let span = resolve_span(&args.from, &args.till, today(cfg)?)?;
    let entries = entries_for(args)?;
    let markup = render_calendar(cfg, &span, &entries, document, lang)?;

    match output {
        Some(path) => {
            fs::write(path, format!("{markup}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(file = %path.display(), "wrote calendar");
        }
        None => println!("{markup}"),
    }
    Ok(())
}

#[instrument(skip(cfg, args))]
fn cmd_grid(cfg: &Config, args: &SpanArgs) -> anyhow::Result<()> {
    info!("command grid");

    let span = resolve_span(&args.from, &args.till, today(cfg)?)?;
    let entries = entries_for(args)?;
    let locale = cfg.locale();
    let years = Calendar::new(cfg.calendar_options()?, &locale)
        .with_entries(&entries)
        .build(&span)?;

    let out = serde_json::to_string_pretty(&years)?;
    println!("{out}");
    Ok(())
}

fn cmd_first_weekday(code: &str) -> anyhow::Result<()> {
    if code.trim().is_empty() {
        return Err(anyhow!("first-weekday: empty territory code"));
    }
    println!("{}", resolve_first_weekday(code));
    Ok(())
}

fn cmd_names(cfg: &Config) -> anyhow::Result<()> {
    let locale = cfg.locale();
    let layout = Calendar::new(cfg.calendar_options()?, &locale).layout()?;
    println!("{}", layout.weekday_names.join(" "));
    println!("{}", layout.month_names.join(" "));
    Ok(())
}

fn cmd_show(cfg: &Config) -> anyhow::Result<()> {
    for path in &cfg.loaded_files {
        println!("# {}", path.display());
    }
    for (k, v) in cfg.iter() {
        println!("{k} = {v}");
    }
    Ok(())
}
