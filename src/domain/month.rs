use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{FlexstayError, Result};

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// A month named without a year, as it appears in flexible-date searches
/// (`flexible_trip_dates[]=june`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthToken(u8);

impl MonthToken {
    /// Build from a zero-based month index (0 = January).
    pub fn from_index(index: u32) -> Option<Self> {
        u8::try_from(index).ok().filter(|i| *i < 12).map(Self)
    }

    /// Zero-based month index.
    pub fn index(self) -> u32 {
        u32::from(self.0)
    }

    pub fn name(self) -> &'static str {
        MONTH_NAMES[usize::from(self.0)]
    }

    /// True when `next` is the calendar month right after this one
    /// (December is followed by January).
    pub fn is_followed_by(self, next: Self) -> bool {
        next.index() == (self.index() + 1) % 12
    }

    /// Pin the token to a year relative to `today`: a month earlier than the
    /// current real-world month refers to next year.
    pub fn resolve(self, today: NaiveDate) -> YearMonth {
        let year = if self.index() < today.month0() {
            today.year() + 1
        } else {
            today.year()
        };
        YearMonth { year, month: self }
    }
}

impl FromStr for MonthToken {
    type Err = FlexstayError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        MONTH_NAMES
            .iter()
            .position(|name| {
                *name == lower || (lower.len() >= 3 && name.starts_with(lower.as_str()))
            })
            .and_then(|i| u32::try_from(i).ok())
            .and_then(Self::from_index)
            .ok_or_else(|| FlexstayError::InvalidRequest {
                reason: format!("invalid month name '{s}'"),
            })
    }
}

impl TryFrom<String> for MonthToken {
    type Error = FlexstayError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<MonthToken> for String {
    fn from(value: MonthToken) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for MonthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A month pinned to a year. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: MonthToken,
}

impl YearMonth {
    pub fn new(year: i32, month: MonthToken) -> Self {
        Self { year, month }
    }

    /// Parse a calendar header such as `"October 2025"`.
    pub fn parse_title(title: &str) -> Result<Self> {
        let mut parts = title.split_whitespace();
        let (Some(name), Some(year)) = (parts.next(), parts.next()) else {
            return Err(FlexstayError::SurfaceNotReady {
                reason: format!("unrecognised month title '{title}'"),
            });
        };
        let month = name
            .parse::<MonthToken>()
            .map_err(|_| FlexstayError::SurfaceNotReady {
                reason: format!("unrecognised month name in title '{title}'"),
            })?;
        let year = year
            .trim_end_matches(',')
            .parse::<i32>()
            .map_err(|_| FlexstayError::SurfaceNotReady {
                reason: format!("unrecognised year in title '{title}'"),
            })?;
        Ok(Self { year, month })
    }

    #[must_use]
    pub fn next(self) -> Self {
        if self.month.index() == 11 {
            Self {
                year: self.year + 1,
                month: MonthToken(0),
            }
        } else {
            Self {
                year: self.year,
                month: MonthToken(self.month.0 + 1),
            }
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.index() + 1, 1)
    }

    pub fn days_in_month(self) -> u32 {
        match (self.first_day(), self.next().first_day()) {
            (Some(start), Some(end)) => u32::try_from((end - start).num_days()).unwrap_or(0),
            _ => 0,
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.month.name();
        let mut chars = name.chars();
        if let Some(first) = chars.next() {
            write!(f, "{}{} {}", first.to_ascii_uppercase(), chars.as_str(), self.year)
        } else {
            write!(f, "{}", self.year)
        }
    }
}

/// Order months chronologically relative to `today`, dropping duplicates, so
/// that navigation through them only moves forward.
pub fn chronological(months: &[MonthToken], today: NaiveDate) -> Vec<MonthToken> {
    let mut resolved: Vec<YearMonth> = months.iter().map(|m| m.resolve(today)).collect();
    resolved.sort();
    resolved.dedup();
    resolved.into_iter().map(|ym| ym.month).collect()
}
