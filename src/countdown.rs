//! Day counter: calendar distance between the current date and a target date

use chrono::{Datelike, Local, NaiveDate};

/// Calendar decomposition of the span between two dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateDiff {
    pub years: i32,
    pub months: u32,
    pub days: u32,
}

/// Decompose the span between two dates into years, months, and days.
///
/// Works on the chronologically ordered pair, so every component is
/// non-negative regardless of argument order. Day deficits borrow the length
/// of the calendar month preceding the later date (repeating when a short
/// month cannot cover the deficit), re-borrowing months into years as needed.
pub fn diff_between(a: NaiveDate, b: NaiveDate) -> DateDiff {
    let (earlier, later) = if a <= b { (a, b) } else { (b, a) };

    let mut years = later.year() - earlier.year();
    let mut months = later.month() as i32 - earlier.month() as i32;
    let mut days = later.day() as i32 - earlier.day() as i32;

    if months < 0 {
        months += 12;
        years -= 1;
    }

    let mut borrow_from = later.with_day(1).unwrap_or(later);
    while days < 0 {
        borrow_from = match borrow_from.pred_opt() {
            Some(last_of_previous) => {
                days += last_of_previous.day() as i32;
                last_of_previous.with_day(1).unwrap_or(last_of_previous)
            }
            None => break,
        };
        months -= 1;
        if months < 0 {
            months += 12;
            years -= 1;
        }
    }

    DateDiff {
        years,
        months: months.max(0) as u32,
        days: days.max(0) as u32,
    }
}

/// Caches the readout so the decomposition only reruns when the civil date or
/// the target changes.
pub struct CountdownClock {
    computed_for: Option<(NaiveDate, NaiveDate)>,
    diff: Option<DateDiff>,
}

impl CountdownClock {
    pub fn new() -> Self {
        Self {
            computed_for: None,
            diff: None,
        }
    }

    pub fn refresh(&mut self, target: Option<NaiveDate>) -> Option<DateDiff> {
        let Some(target) = target else {
            self.computed_for = None;
            self.diff = None;
            return None;
        };

        let today = Local::now().date_naive();
        if self.computed_for != Some((today, target)) {
            self.computed_for = Some((today, target));
            self.diff = Some(diff_between(target, today));
        }
        self.diff
    }
}
