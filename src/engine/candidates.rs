//! Check-in/check-out pairs worth probing in one displayed month.
//!
//! Days are addressed by grid position (`week * 7 + day`). A stay of `N`
//! nights checks out `N` slots after it checks in. When that slot is a real
//! day of the same month the pair is probed in place; when it falls past the
//! month's last day, the check-out is translated into the next month's grid
//! and probed after navigating forward.

use crate::domain::calendar::{CellRef, DAYS_PER_WEEK, DisplayedMonth};
use crate::domain::search_params::StayPolicy;

/// A stay can only spill into the first rows of the following month.
const MAX_SPILL_WEEKS: usize = 2;

/// Where the check-out lands relative to the check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spill {
    SameWeek,
    NextWeek,
    /// Check-out lies in the following month; `check_out` is in that month's grid.
    NextMonth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub check_in: CellRef,
    pub check_out: CellRef,
    pub nights: u32,
    pub spill: Spill,
}

impl Candidate {
    /// Number of slots between check-in and check-out, measured across the
    /// month boundary when the stay spills.
    pub fn span(&self, month: &DisplayedMonth) -> usize {
        let out = match self.spill {
            Spill::NextMonth => self.check_out.position() + month.next_month_origin(),
            Spill::SameWeek | Spill::NextWeek => self.check_out.position(),
        };
        out - self.check_in.position()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub same_month: Vec<Candidate>,
    pub cross_month: Vec<Candidate>,
}

impl Candidates {
    pub fn len(&self) -> usize {
        self.same_month.len() + self.cross_month.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Enumerate, row by row, every legal stay starting in `month` under `policy`.
pub fn enumerate(policy: StayPolicy, month: &DisplayedMonth) -> Candidates {
    let nights = policy.nights();
    let Ok(span) = usize::try_from(nights) else {
        return Candidates::default();
    };
    if span == 0 {
        return Candidates::default();
    }

    let origin = month.next_month_origin();
    let anchored = policy.anchor_day().is_some();
    let days: Vec<usize> = match policy.anchor_day() {
        Some(day) => vec![day],
        None => (0..DAYS_PER_WEEK).collect(),
    };

    let mut found = Candidates::default();
    for week in 0..month.week_count() {
        for &day in &days {
            let check_in = CellRef::new(week, day);
            let Some(cell) = month.cell(check_in) else {
                continue;
            };
            if !cell.is_legal_check_in(nights) {
                continue;
            }
            if anchored && !nights_between_open(month, check_in, span) {
                continue;
            }

            let out = CellRef::from_position(check_in.position() + span);
            if let Some(out_cell) = month.cell(out) {
                if out_cell.selectable {
                    let spill = if out.week == week {
                        Spill::SameWeek
                    } else {
                        Spill::NextWeek
                    };
                    found.same_month.push(Candidate {
                        check_in,
                        check_out: out,
                        nights,
                        spill,
                    });
                }
            } else if let Some(next_pos) = out.position().checked_sub(origin) {
                let check_out = CellRef::from_position(next_pos);
                if check_out.week < MAX_SPILL_WEEKS {
                    found.cross_month.push(Candidate {
                        check_in,
                        check_out,
                        nights,
                        spill: Spill::NextMonth,
                    });
                }
            }
        }
    }
    found
}

/// Every day strictly inside the stay that this month still shows must be
/// enabled. Days past the month's end are checked by the site itself.
fn nights_between_open(month: &DisplayedMonth, check_in: CellRef, span: usize) -> bool {
    (1..span).all(|offset| {
        month
            .cell(CellRef::from_position(check_in.position() + offset))
            .is_none_or(|cell| cell.selectable)
    })
}
