use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CalendarError;

/// Class names of the weekday columns, Monday first.
pub const WEEKDAY_CLASSES: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

// First day of the week per territory, after CLDR supplemental data.
// Anything not listed starts on Monday.
const MONDAY_FIRST: &[&str] = &[
    "AD", "AI", "AL", "AM", "AN", "AT", "AX", "AZ", "BA", "BE", "BG", "BM", "BN", "BY", "CH", "CL",
    "CM", "CR", "CY", "CZ", "DE", "DK", "EC", "EE", "ES", "FI", "FJ", "FO", "FR", "GB", "GE", "GF",
    "GP", "GR", "HR", "HU", "IS", "IT", "KG", "KZ", "LB", "LI", "LK", "LT", "LU", "LV", "MC", "MD",
    "ME", "MK", "MN", "MQ", "MY", "NL", "NO", "PL", "PT", "RE", "RO", "RS", "RU", "SE", "SI", "SK",
    "SM", "TJ", "TM", "TR", "UA", "UY", "UZ", "VA", "VN", "XK",
];

const FRIDAY_FIRST: &[&str] = &["BD", "MV"];

const SATURDAY_FIRST: &[&str] = &[
    "AE", "AF", "BH", "DJ", "DZ", "EG", "IQ", "IR", "JO", "KW", "LY", "MA", "OM", "QA", "SD", "SY",
];

const SUNDAY_FIRST: &[&str] = &[
    "AG", "AR", "AS", "AU", "BR", "BS", "BT", "BW", "BZ", "CA", "CN", "CO", "DM", "DO", "ET", "GT",
    "GU", "HK", "HN", "ID", "IE", "IL", "IN", "JM", "JP", "KE", "KH", "KR", "LA", "MH", "MM", "MO",
    "MT", "MX", "MZ", "NI", "NP", "NZ", "PA", "PE", "PH", "PK", "PR", "PY", "SA", "SG", "SV", "TH",
    "TN", "TT", "TW", "UM", "US", "VE", "VI", "WS", "YE", "ZA", "ZW",
];

const TERRITORY_BUCKETS: [(u8, &[&str]); 4] = [
    (0, MONDAY_FIRST),
    (4, FRIDAY_FIRST),
    (5, SATURDAY_FIRST),
    (6, SUNDAY_FIRST),
];

/// First column of a calendar week: 0 for Monday through 6 for Sunday.
pub fn resolve_first_weekday(country_code: &str) -> u8 {
    let code = country_code.trim().to_ascii_uppercase();
    let index = TERRITORY_BUCKETS
        .iter()
        .find(|(_, codes)| codes.contains(&code.as_str()))
        .map(|(index, _)| *index)
        .unwrap_or(0);
    debug!(code = %code, index, "resolved first weekday");
    index
}

/// Rotates a Monday-first week so that index 0 is `first_weekday`.
pub fn rotate<T: Clone>(week: &[T; 7], first_weekday: u8) -> [T; 7] {
    let offset = usize::from(first_weekday % 7);
    std::array::from_fn(|i| week[(offset + i) % 7].clone())
}

/// Either a weekday index or a territory code to look one up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FirstWeekday {
    Index(u8),
    Territory(String),
}

impl FirstWeekday {
    pub fn resolve(&self) -> Result<u8, CalendarError> {
        match self {
            Self::Index(index) if *index <= 6 => Ok(*index),
            Self::Index(index) => Err(CalendarError::FirstWeekdayIndex { index: *index }),
            Self::Territory(code) => Ok(resolve_first_weekday(code)),
        }
    }
}

impl Default for FirstWeekday {
    fn default() -> Self {
        Self::Index(0)
    }
}

impl FromStr for FirstWeekday {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.parse::<u8>() {
            Ok(index) => {
                let parsed = Self::Index(index);
                parsed.resolve()?;
                Ok(parsed)
            }
            Err(_) => Ok(Self::Territory(trimmed.to_string())),
        }
    }
}

impl fmt::Display for FirstWeekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Territory(code) => f.write_str(code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn territory_buckets() {
        assert_eq!(resolve_first_weekday("FR"), 0);
        assert_eq!(resolve_first_weekday("us"), 6);
        assert_eq!(resolve_first_weekday("Sy"), 5);
        assert_eq!(resolve_first_weekday("mv"), 4);
        assert_eq!(resolve_first_weekday("BD"), 4);
    }

    #[test]
    fn unknown_territory_defaults_to_monday() {
        assert_eq!(resolve_first_weekday("XX"), 0);
        assert_eq!(resolve_first_weekday(""), 0);
    }

    #[test]
    fn buckets_do_not_overlap() {
        for (i, (_, left)) in TERRITORY_BUCKETS.iter().enumerate() {
            for (_, right) in TERRITORY_BUCKETS.iter().skip(i + 1) {
                assert!(left.iter().all(|code| !right.contains(code)));
            }
        }
    }

    #[test]
    fn rotation_for_every_start() {
        for first in 0..7u8 {
            let rotated = rotate(&WEEKDAY_CLASSES, first);
            for (i, class) in rotated.iter().enumerate() {
                assert_eq!(*class, WEEKDAY_CLASSES[(usize::from(first) + i) % 7]);
            }
        }
        assert_eq!(rotate(&WEEKDAY_CLASSES, 6)[0], "sun");
    }

    #[test]
    fn parses_index_or_territory() {
        assert_eq!("3".parse::<FirstWeekday>(), Ok(FirstWeekday::Index(3)));
        assert_eq!(
            "us".parse::<FirstWeekday>(),
            Ok(FirstWeekday::Territory("us".into()))
        );
        assert_eq!(
            "7".parse::<FirstWeekday>(),
            Err(CalendarError::FirstWeekdayIndex { index: 7 })
        );
    }

    #[test]
    fn resolves_through_the_table() {
        assert_eq!(FirstWeekday::Territory("ca".into()).resolve(), Ok(6));
        assert_eq!(FirstWeekday::default().resolve(), Ok(0));
        assert!(FirstWeekday::Index(12).resolve().is_err());
    }
}
