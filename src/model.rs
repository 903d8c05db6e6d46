use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Id of the timeslot covering the whole day.
pub const MAIN_SLOT: &str = "main";

/// A calendar event as stored at a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    pub timeslot: String,
}

impl Event {
    pub fn new(event_type: impl Into<String>, timeslot: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timeslot: timeslot.into(),
        }
    }

    pub fn main(event_type: impl Into<String>) -> Self {
        Self::new(event_type, MAIN_SLOT)
    }

    pub fn is_main(&self) -> bool {
        self.timeslot == MAIN_SLOT
    }

    /// Same type in the same slot.
    pub fn same_as(&self, other: &Event) -> bool {
        self.event_type == other.event_type && self.timeslot == other.timeslot
    }

    /// `name`, prefixed with `[slot] ` unless the event takes the whole day.
    pub fn display_name(&self, name: &str) -> String {
        if self.is_main() {
            name.to_string()
        } else {
            format!("[{}] {name}", self.timeslot)
        }
    }
}

fn full_day() -> f64 {
    1.0
}

/// A named subdivision of a day. The first timeslot of a calendar is always `main`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeslot {
    pub id: String,
    #[serde(default)]
    pub start: Option<NaiveTime>,
    #[serde(default)]
    pub end: Option<NaiveTime>,
    #[serde(default)]
    pub name: Option<String>,
    /// Event types allowed in this slot; `None` means all of them.
    #[serde(default)]
    pub event_types: Option<Vec<String>>,
    /// Fraction of the day taken by this slot, set when the config is built.
    #[serde(skip, default = "full_day")]
    pub day_part: f64,
}

impl Timeslot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            start: None,
            end: None,
            name: None,
            event_types: None,
            day_part: 1.0,
        }
    }

    pub fn main() -> Self {
        Self::new(MAIN_SLOT)
    }

    pub fn with_range(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_event_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn is_main(&self) -> bool {
        self.id == MAIN_SLOT
    }

    pub fn allows(&self, event_type: &str) -> bool {
        match &self.event_types {
            Some(types) if !types.is_empty() => types.iter().any(|t| t == event_type),
            _ => true,
        }
    }
}

/// Identifies one calendar: the object holding it plus the field name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarRef {
    pub object: Ulid,
    pub field: String,
}

impl CalendarRef {
    pub fn new(object: Ulid, field: impl Into<String>) -> Self {
        Self {
            object,
            field: field.into(),
        }
    }

    /// Id of the timeline cell for this calendar at `date`: `<object>_<field>_<YYYYMMDD>`.
    pub fn cell_id(&self, date: NaiveDate) -> String {
        format!("{self}_{}", date_key(date))
    }
}

impl fmt::Display for CalendarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.object, self.field)
    }
}

impl FromStr for CalendarRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (object, field) = s
            .split_once('_')
            .ok_or_else(|| format!("bad calendar reference: {s}"))?;
        if field.is_empty() {
            return Err(format!("bad calendar reference: {s}"));
        }
        let object = Ulid::from_string(object).map_err(|e| format!("bad ULID: {e}"))?;
        Ok(Self::new(object, field))
    }
}

/// Range restricting a walk over stored days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    Year(i32),
    Month(i32, u32),
    Between(NaiveDate, NaiveDate),
}

impl DateRange {
    /// Inclusive first and last day. `None` for an impossible year or month.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match *self {
            DateRange::Year(year) => Some((
                NaiveDate::from_ymd_opt(year, 1, 1)?,
                NaiveDate::from_ymd_opt(year, 12, 31)?,
            )),
            DateRange::Month(year, month) => {
                let first = NaiveDate::from_ymd_opt(year, month, 1)?;
                Some((first, last_day_of_month(first)))
            }
            DateRange::Between(start, end) => Some((start, end)),
        }
    }
}

/// `YYYYMMDD`, the day format used in request keys.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Parse `YYYYMMDD`, `YYYY/MM/DD` or `YYYY-MM-DD`.
pub fn parse_date_key(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    ["%Y%m%d", "%Y/%m/%d", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse a month id `YYYY/MM` (or `YYYY-MM`) into the first day of that month.
pub fn parse_month(s: &str) -> Option<NaiveDate> {
    let (year, month) = s.trim().split_once(['/', '-'])?;
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn display_name_prefixes_partial_slots() {
        assert_eq!(Event::main("leave").display_name("Leave"), "Leave");
        assert_eq!(Event::new("leave", "AM").display_name("Leave"), "[AM] Leave");
    }

    #[test]
    fn same_as_compares_type_and_slot() {
        let a = Event::new("leave", "AM");
        assert!(a.same_as(&Event::new("leave", "AM")));
        assert!(!a.same_as(&Event::new("leave", "PM")));
        assert!(!a.same_as(&Event::new("sick", "AM")));
    }

    #[test]
    fn timeslot_allows() {
        let open = Timeslot::new("AM");
        assert!(open.allows("anything"));

        let empty = Timeslot::new("AM").with_event_types(Vec::<String>::new());
        assert!(empty.allows("anything"));

        let restricted = Timeslot::new("PM").with_event_types(["meeting"]);
        assert!(restricted.allows("meeting"));
        assert!(!restricted.allows("leave"));
        assert_eq!(restricted.name(), "PM");
        assert_eq!(restricted.clone().with_name("Afternoon").name(), "Afternoon");
    }

    #[test]
    fn calendar_ref_parse_and_cell_id() {
        let object = Ulid::from_string("01ARZ3NDEKTSV4RRFFQ69G5FAV").unwrap();
        let cal = CalendarRef::new(object, "leave_plan");
        assert_eq!(cal.to_string(), "01ARZ3NDEKTSV4RRFFQ69G5FAV_leave_plan");
        assert_eq!(cal.to_string().parse::<CalendarRef>().unwrap(), cal);
        assert_eq!(
            cal.cell_id(d(2024, 3, 9)),
            "01ARZ3NDEKTSV4RRFFQ69G5FAV_leave_plan_20240309"
        );
        assert!("nounderscore".parse::<CalendarRef>().is_err());
        assert!("01ARZ3NDEKTSV4RRFFQ69G5FAV_".parse::<CalendarRef>().is_err());
    }

    #[test]
    fn date_keys() {
        assert_eq!(date_key(d(2024, 1, 5)), "20240105");
        assert_eq!(parse_date_key("20240105"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_key("2024/01/05"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_key("2024-01-05"), Some(d(2024, 1, 5)));
        assert_eq!(parse_date_key("2024-13-05"), None);
        assert_eq!(parse_month("2024/02"), Some(d(2024, 2, 1)));
        assert_eq!(parse_month("2024"), None);
    }

    #[test]
    fn range_bounds() {
        assert_eq!(
            DateRange::Year(2024).bounds(),
            Some((d(2024, 1, 1), d(2024, 12, 31)))
        );
        assert_eq!(
            DateRange::Month(2024, 2).bounds(),
            Some((d(2024, 2, 1), d(2024, 2, 29)))
        );
        assert_eq!(
            DateRange::Month(2023, 12).bounds(),
            Some((d(2023, 12, 1), d(2023, 12, 31)))
        );
        assert_eq!(DateRange::Month(2023, 13).bounds(), None);
    }
}
