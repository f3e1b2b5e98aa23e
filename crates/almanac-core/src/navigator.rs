use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::dates;

/// Displayed month; `month` is zero-based (`0` = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarCursor {
    pub year: i32,
    pub month: u32,
}

impl CalendarCursor {
    /// Normalizes an out-of-range month into the year.
    pub fn new(year: i32, month: i64) -> Self {
        shift(Self { year, month: 0 }, month)
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month0(),
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        dates::first_day_of_month(self.year, self.month)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month0() == self.month
    }

    /// Normalizes the month and pulls the cursor back inside the range whose
    /// whole six-week grid chrono can represent.
    pub fn clamped(self) -> Self {
        shift(self, 0)
    }
}

/// Earliest and latest cursors whose grid fits in `NaiveDate`. The edge
/// years are excluded since their grids spill past `MIN`/`MAX`.
pub fn cursor_bounds() -> (CalendarCursor, CalendarCursor) {
    (
        CalendarCursor {
            year: NaiveDate::MIN.year() + 1,
            month: 0,
        },
        CalendarCursor {
            year: NaiveDate::MAX.year() - 1,
            month: 11,
        },
    )
}

/// Moves `cursor` by `delta_months`, carrying whole years in either direction.
/// Results past the representable range stick to the nearest bound.
pub fn shift(cursor: CalendarCursor, delta_months: i64) -> CalendarCursor {
    let (lo, hi) = cursor_bounds();
    let total = month_index(cursor).saturating_add(delta_months);
    let total = total.clamp(month_index(lo), month_index(hi));
    CalendarCursor {
        year: i32::try_from(total.div_euclid(12)).unwrap_or(lo.year),
        month: u32::try_from(total.rem_euclid(12)).unwrap_or(0),
    }
}

fn month_index(cursor: CalendarCursor) -> i64 {
    i64::from(cursor.year) * 12 + i64::from(cursor.month)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarNavigator {
    cursor: CalendarCursor,
}

impl CalendarNavigator {
    pub fn new(cursor: CalendarCursor) -> Self {
        Self { cursor }
    }

    pub fn at_today() -> Self {
        Self::new(CalendarCursor::containing(dates::today()))
    }

    pub fn cursor(&self) -> CalendarCursor {
        self.cursor
    }

    pub fn shift_by(&mut self, delta_months: i64) -> CalendarCursor {
        self.cursor = shift(self.cursor, delta_months);
        debug!(
            year = self.cursor.year,
            month = self.cursor.month,
            delta_months,
            "moved calendar cursor"
        );
        self.cursor
    }

    pub fn prev(&mut self) -> CalendarCursor {
        self.shift_by(-1)
    }

    pub fn next(&mut self) -> CalendarCursor {
        self.shift_by(1)
    }
}
