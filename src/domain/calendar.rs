use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::month::YearMonth;
use crate::error::Result;

pub const DAYS_PER_WEEK: usize = 7;

/// One rendered day of the availability calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    /// Enabled button the guest can click right now.
    pub selectable: bool,
    /// The day advertises itself as a check-in boundary.
    pub check_in: bool,
    /// "N night minimum" annotation, when the host set one for this arrival day.
    pub min_nights: Option<u32>,
}

impl DayCell {
    pub fn open() -> Self {
        Self {
            selectable: true,
            check_in: true,
            min_nights: None,
        }
    }

    pub fn blocked() -> Self {
        Self {
            selectable: false,
            check_in: false,
            min_nights: None,
        }
    }

    /// A stay of `nights` may start here.
    pub fn is_legal_check_in(&self, nights: u32) -> bool {
        self.selectable && self.check_in && self.min_nights.is_none_or(|min| min <= nights)
    }
}

/// One table row, Sunday first. Empty slots are padding days that belong to
/// the neighbouring month.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CalendarWeek {
    pub cells: Vec<Option<DayCell>>,
}

impl CalendarWeek {
    pub fn cell(&self, day: usize) -> Option<&DayCell> {
        self.cells.get(day).and_then(Option::as_ref)
    }

    fn ends_with_padding(&self) -> bool {
        self.cells.len() < DAYS_PER_WEEK || self.cells.last().is_some_and(Option::is_none)
    }
}

/// Position of a day inside one displayed month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    pub week: usize,
    pub day: usize,
}

impl CellRef {
    pub fn new(week: usize, day: usize) -> Self {
        Self { week, day }
    }

    pub fn from_position(position: usize) -> Self {
        Self {
            week: position / DAYS_PER_WEEK,
            day: position % DAYS_PER_WEEK,
        }
    }

    /// Linear slot index, counting padding slots.
    pub fn position(self) -> usize {
        self.week * DAYS_PER_WEEK + self.day
    }
}

/// Snapshot of the month currently shown by the calendar widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedMonth {
    pub title: String,
    pub weeks: Vec<CalendarWeek>,
}

impl DisplayedMonth {
    /// Lay out `month` the way the widget does (Sunday-first rows, padded with
    /// empty slots), asking `cell_for` how each real day renders.
    pub fn layout(month: YearMonth, mut cell_for: impl FnMut(NaiveDate) -> DayCell) -> Self {
        let mut weeks = Vec::new();
        if let Some(first) = month.first_day() {
            let lead = first.weekday().num_days_from_sunday() as usize;
            let mut current = CalendarWeek {
                cells: vec![None; lead],
            };
            for offset in 0..month.days_in_month() {
                let date = first + chrono::Days::new(u64::from(offset));
                current.cells.push(Some(cell_for(date)));
                if current.cells.len() == DAYS_PER_WEEK {
                    weeks.push(std::mem::take(&mut current));
                }
            }
            if !current.cells.is_empty() {
                current.cells.resize(DAYS_PER_WEEK, None);
                weeks.push(current);
            }
        }
        Self {
            title: month.to_string(),
            weeks,
        }
    }

    pub fn year_month(&self) -> Result<YearMonth> {
        YearMonth::parse_title(&self.title)
    }

    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    pub fn cell(&self, at: CellRef) -> Option<&DayCell> {
        self.weeks.get(at.week).and_then(|w| w.cell(at.day))
    }

    /// Slot index, in this month's coordinates, at which the next month's
    /// first row begins. When this month ends mid-week, the next month's first
    /// row is the same calendar week and shares this month's last row index.
    pub fn next_month_origin(&self) -> usize {
        match self.weeks.last() {
            None => 0,
            Some(last) if last.ends_with_padding() => (self.weeks.len() - 1) * DAYS_PER_WEEK,
            Some(_) => self.weeks.len() * DAYS_PER_WEEK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::month::MonthToken;

    fn july_2026() -> DisplayedMonth {
        let july: MonthToken = "july".parse().unwrap();
        DisplayedMonth::layout(YearMonth::new(2026, july), |_| DayCell::open())
    }

    #[test]
    fn layout_pads_leading_and_trailing_days() {
        // July 1st 2026 is a Wednesday, July 31st a Friday.
        let month = july_2026();
        assert_eq!(month.title, "July 2026");
        assert_eq!(month.week_count(), 5);
        assert!(month.cell(CellRef::new(0, 2)).is_none());
        assert!(month.cell(CellRef::new(0, 3)).is_some());
        assert!(month.cell(CellRef::new(4, 5)).is_some());
        assert!(month.cell(CellRef::new(4, 6)).is_none());
        assert!(month.weeks.iter().all(|w| w.cells.len() == DAYS_PER_WEEK));
    }

    #[test]
    fn next_month_origin_shares_split_week() {
        let month = july_2026();
        assert_eq!(month.next_month_origin(), 4 * DAYS_PER_WEEK);
    }

    #[test]
    fn next_month_origin_after_full_last_week() {
        // October 2026 ends on a Saturday.
        let october: MonthToken = "october".parse().unwrap();
        let month = DisplayedMonth::layout(YearMonth::new(2026, october), |_| DayCell::open());
        let weeks = month.week_count();
        assert_eq!(month.next_month_origin(), weeks * DAYS_PER_WEEK);
    }

    #[test]
    fn legal_check_in_respects_minimum_stay() {
        let mut cell = DayCell::open();
        assert!(cell.is_legal_check_in(2));
        cell.min_nights = Some(3);
        assert!(!cell.is_legal_check_in(2));
        assert!(cell.is_legal_check_in(3));
        cell.check_in = false;
        assert!(!cell.is_legal_check_in(5));
        assert!(!DayCell::blocked().is_legal_check_in(7));
    }

    #[test]
    fn cell_ref_position_roundtrip() {
        let at = CellRef::new(3, 4);
        assert_eq!(at.position(), 25);
        assert_eq!(CellRef::from_position(25), at);
    }
}
