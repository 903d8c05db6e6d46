use std::ops::ControlFlow;

use chrono::{Datelike, NaiveDate};

use crate::config::Applicable;
use crate::grid::{self, Grid, MonthHeader, SurroundingMonths};
use crate::model::*;

use super::store::{EventQuery, TypedEvents};
use super::timeslot;
use super::{read, Calendar, ConfigError, Engine, EngineError};

impl Calendar {
    pub fn events_at(&self, date: NaiveDate) -> Option<&[Event]> {
        self.store.events_at(date)
    }

    pub fn event_type_at(&self, date: NaiveDate) -> Option<&str> {
        self.store.event_type_at(date)
    }

    pub fn has_events_at(&self, date: NaiveDate, events: &[Event]) -> bool {
        self.store.has_events_at(date, events)
    }

    pub fn walk<F>(&self, range: Option<DateRange>, f: F)
    where
        F: FnMut(NaiveDate, &[Event]) -> ControlFlow<()>,
    {
        self.store.walk(range, f)
    }

    pub fn events_by_type(&self, query: &EventQuery) -> Result<TypedEvents, ConfigError> {
        self.store.events_by_type(query)
    }

    pub fn free_slots_at(&self, date: NaiveDate) -> Vec<String> {
        timeslot::free_slots_at(&self.config, self.events_at(date).unwrap_or_default())
    }

    pub fn day_is_full(&self, date: NaiveDate) -> bool {
        timeslot::day_is_full(&self.config, self.events_at(date).unwrap_or_default())
    }

    pub fn date_in_range(&self, date: NaiveDate) -> bool {
        self.config.date_in_range(date)
    }

    /// Event types of this calendar, static or computed.
    pub fn event_types(&self) -> Vec<String> {
        self.config.event_types.resolve(&self.reference)
    }

    /// The subset of event types `actor` may create.
    pub fn allowed_event_types(&self, actor: &str) -> Vec<String> {
        self.config.allowed_event_types(actor, self.event_types())
    }

    pub fn applicable_event_types_at(&self, date: NaiveDate, actor: &str) -> Option<Applicable> {
        self.config
            .applicable_event_types_at(date, &self.allowed_event_types(actor))
    }

    /// Whether the events at `date` may be deleted. `false` on an empty day.
    pub fn may_delete(&self, date: NaiveDate) -> bool {
        self.events_at(date)
            .is_some_and(|events| !events.is_empty() && self.config.may_delete(events))
    }

    pub fn event_name(&self, event_type: &str) -> String {
        self.config.event_name(self.translator(), event_type)
    }

    pub fn grid(&self, month: NaiveDate) -> Grid {
        grid::grid(month, self.config.render(), self.config.settings.strict_months)
    }

    pub fn surrounding_months(&self, month: NaiveDate) -> SurroundingMonths {
        let settings = &self.config.settings;
        grid::surrounding_months(
            month,
            settings.selectable_months,
            settings.start_date,
            settings.end_date,
        )
    }
}

impl Engine {
    pub fn events_at(&self, calendar: &CalendarRef, date: NaiveDate) -> Result<Vec<Event>, EngineError> {
        self.read(calendar, |cal| cal.events_at(date).map(<[Event]>::to_vec).unwrap_or_default())
    }

    pub fn events_by_type(&self, calendar: &CalendarRef, query: &EventQuery) -> Result<TypedEvents, EngineError> {
        self.read(calendar, |cal| cal.events_by_type(query))?
            .map_err(EngineError::from)
    }

    pub fn free_slots_at(&self, calendar: &CalendarRef, date: NaiveDate) -> Result<Vec<String>, EngineError> {
        self.read(calendar, |cal| cal.free_slots_at(date))
    }

    pub fn day_is_full(&self, calendar: &CalendarRef, date: NaiveDate) -> Result<bool, EngineError> {
        self.read(calendar, |cal| cal.day_is_full(date))
    }

    pub fn grid(&self, calendar: &CalendarRef, month: NaiveDate) -> Result<Grid, EngineError> {
        self.read(calendar, |cal| cal.grid(month))
    }

    pub fn surrounding_months(&self, calendar: &CalendarRef, month: NaiveDate) -> Result<SurroundingMonths, EngineError> {
        self.read(calendar, |cal| cal.surrounding_months(month))
    }

    /// Month headers above a timeline grid.
    pub fn timeline_months(&self, calendar: &CalendarRef, month: NaiveDate) -> Result<Vec<MonthHeader>, EngineError> {
        let days = self.grid(calendar, month)?.days();
        Ok(grid::timeline_months(&days)
            .into_iter()
            .map(|month| {
                let name = self
                    .translator
                    .translate(&format!("month_{}", month.first.format("%b")), &[]);
                let text = format!("{name} {}", month.first.year());
                MonthHeader { month, text }
            })
            .collect())
    }

    /// Day a calendar opens on.
    pub fn default_date(&self, calendar: &CalendarRef) -> Result<NaiveDate, EngineError> {
        let today = chrono::Local::now().date_naive();
        self.read(calendar, |cal| cal.config.default_date(today))
    }

    /// Number of stored events across every calendar.
    pub fn event_count(&self) -> usize {
        self.calendar_refs()
            .iter()
            .filter_map(|r| self.calendar(r))
            .map(|cal| {
                let guard = read(&cal);
                guard.store.event_count()
            })
            .sum()
    }
}
