use std::collections::BTreeMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow,
  bail
};
use chrono_tz::Tz;
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::calendar::{
  CalendarOptions,
  ColumnGroups,
  FirstWeekday,
  WeekNumbers
};
use crate::datetime::parse_timezone;
use crate::locale::ChronoLocale;
use crate::markup::OutputMode;

pub const RC_ENV_VAR: &str = "ALMANACRC";
pub const RC_FILE_NAME: &str =
  ".almanacrc";

const DEFAULTS: &[(&str, &str)] = &[
  ("calendar.first_weekday", "0"),
  ("calendar.locale", "POSIX"),
  ("calendar.weekday_format", "%a"),
  ("calendar.month_format", "%B"),
  ("calendar.year_format", "%Y"),
  ("calendar.week_numbers", "off"),
  ("calendar.list_entries", "off"),
  ("calendar.mark_sundays", "off"),
  ("calendar.timezone", "UTC"),
  ("output.mode", "html"),
  ("output.pretty", "on")
];

#[derive(Debug, Clone)]
pub struct Config {
  map: BTreeMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      map:          DEFAULTS
        .iter()
        .map(|(k, v)| {
          (k.to_string(), v.to_string())
        })
        .collect(),
      loaded_files: vec![]
    }
  }
}

impl Config {
  /// Defaults, then the first rc file
  /// found: `rc_override`, then
  /// `$ALMANACRC`, then `~/.almanacrc`.
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let env_value =
      std::env::var(RC_ENV_VAR).ok();
    let home = dirs::home_dir();
    let rc = resolve_rc_path(
      rc_override,
      env_value.as_deref(),
      home.as_deref()
    );

    let mut cfg = Config::default();
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading almanacrc");
      cfg.load_file(&path)?;
    } else {
      debug!(
        "no almanacrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  /// Defaults overlaid with a single
  /// file (and its includes).
  pub fn from_file(
    path: &Path
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();
    cfg.load_file(path)?;
    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn set(
    &mut self,
    key: &str,
    value: &str
  ) {
    self.map.insert(
      key.to_string(),
      value.to_string()
    );
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (&String, &String)>
  {
    self.map.iter()
  }

  /// Strict switch lookup; unset keys
  /// are `false`.
  pub fn get_bool(
    &self,
    key: &str
  ) -> anyhow::Result<bool> {
    match self.map.get(key) {
      | Some(value) => {
        parse_bool(value).ok_or_else(
          || {
            anyhow!(
              "{key}: expected on/off, \
               got {value:?}"
            )
          }
        )
      }
      | None => Ok(false)
    }
  }

  #[tracing::instrument(skip(self))]
  pub fn calendar_options(
    &self
  ) -> anyhow::Result<CalendarOptions> {
    let first_weekday = self
      .get("calendar.first_weekday")
      .map(|raw| raw.parse::<FirstWeekday>())
      .transpose()
      .context("calendar.first_weekday")?
      .unwrap_or_default();

    let weekday_names = self.name_list(
      "calendar.weekday_names",
      7
    )?;
    let month_names = self.name_list(
      "calendar.month_names",
      12
    )?;

    let week_numbers = match self
      .get("calendar.week_numbers")
    {
      | Some(raw) => {
        match parse_bool(&raw) {
          | Some(on) => {
            WeekNumbers::Flag(on)
          }
          | None => {
            WeekNumbers::Label(raw)
          }
        }
      }
      | None => WeekNumbers::default()
    };

    let columns = if self
      .get_bool("calendar.mark_sundays")?
    {
      ColumnGroups::MarkSundays
    } else {
      ColumnGroups::None
    };

    let defaults =
      CalendarOptions::default();
    Ok(CalendarOptions {
      first_weekday,
      weekday_names,
      month_names,
      weekday_format: self
        .get("calendar.weekday_format")
        .unwrap_or(
          defaults.weekday_format
        ),
      month_format: self
        .get("calendar.month_format")
        .unwrap_or(defaults.month_format),
      year_format: self
        .get("calendar.year_format")
        .unwrap_or(defaults.year_format),
      week_numbers,
      list_entries: self
        .get_bool("calendar.list_entries")?,
      columns
    })
  }

  pub fn locale(&self) -> ChronoLocale {
    let name = self
      .get("calendar.locale")
      .unwrap_or_default();
    ChronoLocale::from_name_or_posix(
      &name
    )
  }

  pub fn timezone(
    &self
  ) -> anyhow::Result<Tz> {
    let raw = self
      .get("calendar.timezone")
      .unwrap_or_else(|| {
        "UTC".to_string()
      });
    parse_timezone(
      &raw,
      "calendar.timezone"
    )
    .ok_or_else(|| {
      anyhow!(
        "calendar.timezone: unknown \
         timezone {raw:?}"
      )
    })
  }

  pub fn output_mode(
    &self
  ) -> anyhow::Result<OutputMode> {
    self
      .get("output.mode")
      .unwrap_or_default()
      .parse()
      .context("output.mode")
  }

  pub fn pretty(
    &self
  ) -> anyhow::Result<bool> {
    self.get_bool("output.pretty")
  }

  fn name_list(
    &self,
    key: &str,
    expected: usize
  ) -> anyhow::Result<Option<Vec<String>>>
  {
    let Some(raw) = self.get(key) else {
      return Ok(None);
    };
    if raw.trim().is_empty() {
      return Ok(None);
    }
    let names: Vec<String> = raw
      .split(',')
      .map(|name| name.trim().to_string())
      .collect();
    if names.len() != expected {
      bail!(
        "{key}: expected {expected} \
         comma-separated names, got {}",
        names.len()
      );
    }
    Ok(Some(names))
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if line.is_empty()
        || line.starts_with('#')
      {
        continue;
      }

      if let Some((before, _)) =
        line.split_once(" #")
      {
        line = before.trim();
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if self
          .loaded_files
          .contains(&include_path)
        {
          warn!(include = %include_path.display(), "include cycle; skipping");
        } else if include_path.exists() {
          self
            .load_file(&include_path)?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

fn resolve_rc_path(
  override_path: Option<&Path>,
  env_value: Option<&str>,
  home: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = override_path {
    return Some(path.to_path_buf());
  }

  if let Some(raw) = env_value {
    if raw == "/dev/null" {
      return None;
    }
    if !raw.trim().is_empty() {
      return Some(PathBuf::from(raw));
    }
  }

  let candidate =
    home?.join(RC_FILE_NAME);
  candidate.exists().then_some(candidate)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on"
    | "true" => Some(true),
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}
