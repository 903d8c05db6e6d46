use chrono::{Datelike, Days, Months, NaiveDate};

use crate::config::Render;
use crate::model::{first_of_month, last_day_of_month};

/// Dates to display for one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grid {
    /// Month render: one row per week.
    Weeks(Vec<Vec<NaiveDate>>),
    /// Timeline render: one column per day.
    Days(Vec<NaiveDate>),
}

impl Grid {
    pub fn days(&self) -> Vec<NaiveDate> {
        match self {
            Grid::Weeks(weeks) => weeks.iter().flatten().copied().collect(),
            Grid::Days(days) => days.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Grid::Weeks(weeks) => weeks.iter().map(Vec::len).sum(),
            Grid::Days(days) => days.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the grid for the month containing `month`.
///
/// Unless `strict`, the grid starts with the trailing days of the previous
/// month so that it begins on a Monday, and ends with the first days of the
/// next month so that it ends on a Sunday.
pub fn grid(month: NaiveDate, render: Render, strict: bool) -> Grid {
    let first = first_of_month(month);
    let last = last_day_of_month(first);
    let (start, end) = if strict {
        (first, last)
    } else {
        let lead = first.weekday().num_days_from_monday() as u64;
        let tail = 6 - last.weekday().num_days_from_monday() as u64;
        (
            first.checked_sub_days(Days::new(lead)).unwrap_or(first),
            last.checked_add_days(Days::new(tail)).unwrap_or(last),
        )
    };
    let days: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= end).collect();
    match render {
        Render::Timeline => Grid::Days(days),
        Render::Month => Grid::Weeks(days.chunks(7).map(<[NaiveDate]>::to_vec).collect()),
    }
}

/// `YYYY/MM`, the month id used in requests.
pub fn month_id(date: NaiveDate) -> String {
    date.format("%Y/%m").to_string()
}

/// Months selectable around the current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurroundingMonths {
    pub previous: Option<NaiveDate>,
    pub next: Option<NaiveDate>,
    /// First days of every selectable month, current one included, in order.
    pub all: Vec<NaiveDate>,
}

/// Walk up to `selectable` months on each side of `first`, stopping at the
/// calendar bounds. Bounds are widened to whole months.
pub fn surrounding_months(
    first: NaiveDate,
    selectable: u32,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> SurroundingMonths {
    let first = first_of_month(first);
    let start = start.map(first_of_month);
    let end = end.map(last_day_of_month);

    let mut after = Vec::new();
    let mut month = first;
    for _ in 0..selectable {
        let Some(next) = month.checked_add_months(Months::new(1)) else { break };
        if end.is_some_and(|end| next > end) {
            break;
        }
        after.push(next);
        month = next;
    }

    let mut before = Vec::new();
    let mut month = first;
    for _ in 0..selectable {
        let Some(prev) = month.checked_sub_months(Months::new(1)) else { break };
        if start.is_some_and(|start| prev < start) {
            break;
        }
        before.push(prev);
        month = prev;
    }

    let previous = before.first().copied();
    let next = after.first().copied();
    before.reverse();
    before.push(first);
    before.extend(after);
    SurroundingMonths {
        previous,
        next,
        all: before,
    }
}

/// Header cell of a timeline: one month and the number of grid days it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineMonth {
    /// First grid day falling in this month.
    pub first: NaiveDate,
    pub colspan: usize,
}

impl TimelineMonth {
    /// Narrow headers get a one-letter abbreviation.
    pub fn is_narrow(&self) -> bool {
        self.colspan < 6
    }
}

/// A [`TimelineMonth`] with its translated `"<month> <year>"` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthHeader {
    pub month: TimelineMonth,
    pub text: String,
}

impl MonthHeader {
    /// What fits in the header cell: the first letter when narrow.
    pub fn shown(&self) -> &str {
        match (self.month.is_narrow(), self.text.chars().next()) {
            (true, Some(c)) => &self.text[..c.len_utf8()],
            _ => &self.text,
        }
    }
}

/// Split consecutive grid days into month headers.
pub fn timeline_months(days: &[NaiveDate]) -> Vec<TimelineMonth> {
    let mut r: Vec<TimelineMonth> = Vec::new();
    for day in days {
        match r.last_mut() {
            Some(current) if current.first.month() == day.month() && current.first.year() == day.year() => {
                current.colspan += 1
            }
            _ => r.push(TimelineMonth { first: *day, colspan: 1 }),
        }
    }
    r
}
