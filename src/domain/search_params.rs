use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::listing::ListingRef;
use crate::domain::month::{self, MonthToken};
use crate::error::{FlexstayError, Result};

pub const MIN_NIGHTS: u32 = 1;
pub const MAX_NIGHTS: u32 = 7;

/// Trip-length rule deciding which check-in/check-out pairs are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StayPolicy {
    /// Friday to Sunday.
    Weekend,
    /// Sunday to Friday.
    FullWeek,
    /// Any arrival day, fixed length.
    Nights(u32),
}

impl StayPolicy {
    pub fn nights(self) -> u32 {
        match self {
            Self::Weekend => 2,
            Self::FullWeek => 5,
            Self::Nights(n) => n,
        }
    }

    /// Weekday column (0 = Sunday) a stay must start on, if any.
    pub fn anchor_day(self) -> Option<usize> {
        match self {
            Self::Weekend => Some(5),
            Self::FullWeek => Some(0),
            Self::Nights(_) => None,
        }
    }

    fn context_label(self) -> String {
        match self {
            Self::Weekend => "weekend".into(),
            Self::FullWeek => "week".into(),
            Self::Nights(n) => format!("{n}-night"),
        }
    }
}

impl fmt::Display for StayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekend => write!(f, "weekend (Fri-Sun)"),
            Self::FullWeek => write!(f, "full week (Sun-Fri)"),
            Self::Nights(n) => write!(f, "{n} nights"),
        }
    }
}

/// Whether to follow the trip length chosen on the results page or the
/// caller's own night count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[serde(alias = "respect")]
    RespectFilters,
    #[serde(alias = "ignore")]
    IgnoreFilters,
}

/// `flexible_trip_lengths` value of a flexible-date search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TripLength {
    WeekendTrip,
    OneWeek,
    OneMonth,
}

impl FromStr for TripLength {
    type Err = FlexstayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "weekend_trip" => Ok(Self::WeekendTrip),
            "one_week" => Ok(Self::OneWeek),
            "one_month" => Ok(Self::OneMonth),
            other => Err(FlexstayError::InvalidRequest {
                reason: format!("unknown trip length '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceBounds {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub listing: ListingRef,
    pub mode: FilterMode,
    pub nights: u32,
    pub trip_length: Option<TripLength>,
    pub months: Vec<MonthToken>,
    #[serde(default)]
    pub price_bounds: PriceBounds,
}

impl SearchRequest {
    pub fn validate(&self) -> Result<()> {
        if self.months.is_empty() {
            return Err(FlexstayError::InvalidRequest {
                reason: "at least one month is required".into(),
            });
        }

        if self.mode == FilterMode::IgnoreFilters
            && !(MIN_NIGHTS..=MAX_NIGHTS).contains(&self.nights)
        {
            return Err(FlexstayError::InvalidRequest {
                reason: format!(
                    "nights must be between {MIN_NIGHTS} and {MAX_NIGHTS}, got {}",
                    self.nights
                ),
            });
        }

        if let PriceBounds {
            min: Some(min),
            max: Some(max),
        } = self.price_bounds
            && min > max
        {
            return Err(FlexstayError::InvalidRequest {
                reason: "price_min cannot be greater than price_max".into(),
            });
        }

        Ok(())
    }

    /// The stay policy this request asks for. Month-long stays have none.
    pub fn policy(&self) -> Option<StayPolicy> {
        match (self.mode, self.trip_length) {
            (FilterMode::IgnoreFilters, _) => Some(StayPolicy::Nights(self.nights)),
            (FilterMode::RespectFilters, Some(TripLength::WeekendTrip)) => {
                Some(StayPolicy::Weekend)
            }
            (FilterMode::RespectFilters, Some(TripLength::OneWeek)) => Some(StayPolicy::FullWeek),
            (FilterMode::RespectFilters, Some(TripLength::OneMonth) | None) => None,
        }
    }

    /// Series key stored with each price snapshot, e.g. `weekend|july,august`.
    pub fn search_context(&self) -> String {
        let label = self
            .policy()
            .map_or_else(|| "unsupported".to_string(), StayPolicy::context_label);
        let months: Vec<&str> = self.months.iter().map(|m| m.name()).collect();
        format!("{label}|{}", months.join(","))
    }

    /// Reorder the months so that navigation only moves forward.
    pub fn sort_months(&mut self, today: NaiveDate) {
        self.months = month::chronological(&self.months, today);
    }

    /// Build a request from an Airbnb flexible-date results URL
    /// (`flexible_trip_lengths[]`, `flexible_trip_dates[]`, `price_min`, `price_max`).
    pub fn from_results_url(
        listing: ListingRef,
        results_url: &str,
        mode: FilterMode,
        nights: u32,
    ) -> Result<Self> {
        let url = Url::parse(results_url)?;
        let mut months = Vec::new();
        let mut trip_length = None;
        let mut price_bounds = PriceBounds::default();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "flexible_trip_dates[]" | "flexible_trip_dates" => months.push(value.parse()?),
                "flexible_trip_lengths[]" | "flexible_trip_lengths" => {
                    trip_length = Some(value.parse()?);
                }
                "price_min" => price_bounds.min = value.parse().ok(),
                "price_max" => price_bounds.max = value.parse().ok(),
                _ => {}
            }
        }

        let request = Self {
            listing,
            mode,
            nights,
            trip_length,
            months,
            price_bounds,
        };
        request.validate()?;
        Ok(request)
    }
}
