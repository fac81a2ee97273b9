use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "almanac",
    version,
    about = "Almanac: calendar markup generator",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "almanacrc", global = true)]
    pub almanacrc: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render calendar markup for the days FROM up to (not including) TILL.
    Calendar {
        #[command(flatten)]
        span: SpanArgs,

        /// Write to this file instead of stdout.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Wrap the calendar in a complete html document.
        #[arg(long = "document")]
        document: bool,

        /// Document language when rendering with --document.
        #[arg(long = "lang", requires = "document")]
        lang: Option<String>,
    },

    /// Print the computed grid as JSON.
    Grid {
        #[command(flatten)]
        span: SpanArgs,
    },

    /// Print the first weekday (0 = Monday .. 6 = Sunday) for a territory code.
    FirstWeekday { code: String },

    /// Print the weekday and month names of the configured locale.
    Names,

    /// Print the effective configuration.
    Show,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SpanArgs {
    /// First day: YYYY-MM-DD, today, a month or weekday name, +Nd ...
    #[arg(allow_hyphen_values = true)]
    pub from: String,

    /// Day after the last day shown.
    #[arg(allow_hyphen_values = true)]
    pub till: String,

    /// TOML (`[[entry]]` tables) or JSON (array) file of day entries.
    #[arg(short = 'e', long = "entries")]
    pub entries: Option<PathBuf>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Strips positional `rc.KEY=VALUE` / `rc.KEY:VALUE` arguments.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<OsString> {
        raw.iter().map(OsString::from).collect()
    }

    #[test]
    fn strips_positional_overrides() {
        let pre = preprocess_args(&args(&[
            "almanac",
            "rc.calendar.first_weekday=us",
            "calendar",
            "rc.output.mode:xhtml",
            "2015-09-29",
            "2015-10-02",
        ]))
        .expect("preprocess");

        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.calendar.first_weekday".to_string(), "us".to_string()),
                ("rc.output.mode".to_string(), "xhtml".to_string()),
            ]
        );
        assert_eq!(
            pre.cleaned_args,
            args(&["almanac", "calendar", "2015-09-29", "2015-10-02"])
        );
    }

    #[test]
    fn parses_calendar_subcommand() {
        let cli = GlobalCli::try_parse_from(args(&[
            "almanac",
            "-vv",
            "calendar",
            "today",
            "+1m",
            "--entries",
            "days.toml",
            "--rc",
            "calendar.list_entries=on",
            "--document",
        ]))
        .expect("parse");

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides.len(), 1);
        assert_eq!(cli.rc_overrides[0].key, "calendar.list_entries");
        match cli.command {
            Command::Calendar { span, document, output, .. } => {
                assert_eq!(span.from, "today");
                assert_eq!(span.till, "+1m");
                assert_eq!(span.entries, Some(PathBuf::from("days.toml")));
                assert!(document);
                assert_eq!(output, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn negative_offsets_are_positional() {
        let cli = GlobalCli::try_parse_from(args(&["almanac", "grid", "-1w", "+1w"]))
            .expect("parse");
        match cli.command {
            Command::Grid { span } => {
                assert_eq!(span.from, "-1w");
                assert_eq!(span.till, "+1w");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_rc_flag() {
        assert!("calendar.locale".parse::<KeyVal>().is_err());
        let kv: KeyVal = " output.pretty = off ".parse().expect("key=value");
        assert_eq!((kv.key.as_str(), kv.value.as_str()), ("output.pretty", "off"));
    }
}
