use chrono::{
  DateTime,
  Datelike,
  Duration,
  Months,
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;

use crate::calendar::CalendarDate;
use crate::error::CalendarError;

const SUPPORTED_FORMATS: &str =
  "expected YYYY-MM-DD, YYYY-MM, \
   today/tomorrow/yesterday, a 4-digit \
   year, a weekday name (e.g. monday), a \
   month name (e.g. march) or +Nd/+Nw/+Nm";

/// The current day in `tz`.
#[must_use]
pub fn today_in(
  tz: &Tz,
  now: DateTime<Utc>
) -> NaiveDate {
  now.with_timezone(tz).date_naive()
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "configured timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

/// Resolves a calendar date expression
/// relative to `today`.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> Result<CalendarDate, CalendarError>
{
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();
  let invalid = |reason: &str| {
    CalendarError::InvalidDate {
      input:  input.to_string(),
      reason: reason.to_string()
    }
  };

  match lower.as_str() {
    | "today" => return Ok(today.into()),
    | "tomorrow" => {
      return shift_days(today, 1)
        .ok_or_else(|| {
          invalid("out of range")
        });
    }
    | "yesterday" => {
      return shift_days(today, -1)
        .ok_or_else(|| {
          invalid("out of range")
        });
    }
    | _ => {}
  }

  if token.len() == 4
    && token
      .chars()
      .all(|c| c.is_ascii_digit())
  {
    let year: i32 =
      token.parse().map_err(|_| {
        invalid("invalid 4-digit year")
      })?;
    return CalendarDate::from_ymd(
      year, 1, 1
    );
  }

  if let Some(target_weekday) =
    parse_weekday_name(&lower)
  {
    return Ok(
      next_weekday_date(
        today,
        target_weekday
      )
      .into()
    );
  }

  if let Some(target_month) =
    parse_month_name(&lower)
  {
    let mut year = today.year();
    let candidate_this_year =
      NaiveDate::from_ymd_opt(
        year,
        target_month,
        1
      )
      .ok_or_else(|| {
        invalid("invalid month value")
      })?;
    if candidate_this_year <= today {
      year = year.saturating_add(1);
    }
    return CalendarDate::from_ymd(
      year,
      target_month,
      1
    );
  }

  if let Some((sign, amount, unit)) =
    parse_relative(token)
  {
    let signed =
      if sign == '-' { -amount } else { amount };
    let shifted = match unit {
      | 'd' => shift_days(today, signed),
      | 'w' => {
        shift_days(
          today,
          signed.saturating_mul(7)
        )
      }
      | 'm' => {
        let months =
          Months::new(amount as u32);
        if sign == '-' {
          today
            .checked_sub_months(months)
            .map(CalendarDate::from)
        } else {
          today
            .checked_add_months(months)
            .map(CalendarDate::from)
        }
      }
      | _ => None
    };
    return shifted.ok_or_else(|| {
      invalid("relative date out of range")
    });
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return Ok(date.into());
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      &format!("{token}-01"),
      "%Y-%m-%d"
    )
  {
    return Ok(date.into());
  }

  Err(invalid(SUPPORTED_FORMATS))
}

fn shift_days(
  today: NaiveDate,
  days: i64
) -> Option<CalendarDate> {
  CalendarDate::from(today)
    .add_days(days)
}

fn parse_relative(
  token: &str
) -> Option<(char, i64, char)> {
  let rel_re = Regex::new(
    r"^(?P<sign>[+-])(?P<num>\d{1,6})(?P<unit>[dwm])$"
  )
  .ok()?;
  let caps = rel_re.captures(token)?;

  let sign = caps
    .name("sign")?
    .as_str()
    .chars()
    .next()?;
  let num = caps
    .name("num")?
    .as_str()
    .parse::<i64>()
    .ok()?;
  let unit = caps
    .name("unit")?
    .as_str()
    .chars()
    .next()?;
  Some((sign, num, unit))
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = from
    .weekday()
    .num_days_from_monday()
    as i64;
  let target_idx = target
    .num_days_from_monday()
    as i64;
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  from
    .checked_add_signed(Duration::days(
      delta
    ))
    .unwrap_or(from)
}

fn parse_month_name(
  token: &str
) -> Option<u32> {
  match token.trim() {
    | "january" | "jan" => Some(1),
    | "february" | "feb" => Some(2),
    | "march" | "mar" => Some(3),
    | "april" | "apr" => Some(4),
    | "may" => Some(5),
    | "june" | "jun" => Some(6),
    | "july" | "jul" => Some(7),
    | "august" | "aug" => Some(8),
    | "september" | "sep" | "sept" => {
      Some(9)
    }
    | "october" | "oct" => Some(10),
    | "november" | "nov" => Some(11),
    | "december" | "dec" => Some(12),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    TimeZone,
    Utc
  };

  use super::{
    parse_date_expr,
    parse_timezone,
    today_in
  };
  use crate::error::CalendarError;

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 17)
      .expect("valid today")
  }

  fn parsed(input: &str) -> String {
    parse_date_expr(input, today())
      .expect("parse expression")
      .to_string()
  }

  #[test]
  fn parses_plain_dates() {
    assert_eq!(
      parsed("2015-09-29"),
      "2015-09-29"
    );
    assert_eq!(
      parsed(" 2015-09 "),
      "2015-09-01"
    );
  }

  #[test]
  fn parses_relative_days() {
    assert_eq!(
      parsed("today"),
      "2026-02-17"
    );
    assert_eq!(
      parsed("Tomorrow"),
      "2026-02-18"
    );
    assert_eq!(
      parsed("yesterday"),
      "2026-02-16"
    );
  }

  #[test]
  fn parses_four_digit_year() {
    assert_eq!(
      parsed("2028"),
      "2028-01-01"
    );
  }

  #[test]
  fn parses_weekday_name() {
    assert_eq!(
      parsed("wednesday"),
      "2026-02-18"
    );
    assert_eq!(
      parsed("tue"),
      "2026-02-24"
    );
  }

  #[test]
  fn parses_month_name() {
    assert_eq!(
      parsed("march"),
      "2026-03-01"
    );
    assert_eq!(
      parsed("feb"),
      "2027-02-01"
    );
  }

  #[test]
  fn parses_offsets() {
    assert_eq!(parsed("+3d"), "2026-02-20");
    assert_eq!(parsed("-2w"), "2026-02-03");
    assert_eq!(parsed("+1m"), "2026-03-17");
    assert_eq!(parsed("-12m"), "2025-02-17");
  }

  #[test]
  fn rejects_unknown_expressions() {
    let err =
      parse_date_expr("someday", today())
        .expect_err("unknown expression");
    assert!(matches!(
      err,
      CalendarError::InvalidDate { .. }
    ));
    assert!(
      err.to_string().contains("+Nd")
    );
    assert!(
      parse_date_expr("2015-02-30", today())
        .is_err()
    );
  }

  #[test]
  fn today_follows_the_timezone() {
    let now = Utc
      .with_ymd_and_hms(
        2026, 2, 17, 3, 0, 0
      )
      .single()
      .expect("valid now");
    let utc = parse_timezone("UTC", "test")
      .expect("utc");
    let mexico = parse_timezone(
      "America/Mexico_City",
      "test"
    )
    .expect("mexico city");
    assert_eq!(
      today_in(&utc, now).to_string(),
      "2026-02-17"
    );
    assert_eq!(
      today_in(&mexico, now).to_string(),
      "2026-02-16"
    );
    assert!(
      parse_timezone("Mars/Olympus", "test")
        .is_none()
    );
  }
}
