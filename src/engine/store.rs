use std::collections::BTreeMap;
use std::ops::ControlFlow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::*;

use super::ConfigError;

/// Sparse day index: one ordered event list per occupied day.
///
/// Buckets are created on first insert and are never pruned when they
/// become empty, except by a whole-day deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventStore {
    days: BTreeMap<NaiveDate, Vec<Event>>,
}

/// Filter for [`EventStore::events_by_type`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// `None` keeps every type.
    pub types: Option<Vec<String>>,
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
    pub sorted: bool,
    /// Merge runs of consecutive days holding the same type.
    pub group_spanned: bool,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            types: None,
            min: None,
            max: None,
            sorted: true,
            group_spanned: false,
        }
    }
}

impl EventQuery {
    pub fn of_type(event_type: impl Into<String>) -> Self {
        Self {
            types: Some(vec![event_type.into()]),
            ..Self::default()
        }
    }

    pub fn of_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: Some(types.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn between(mut self, min: Option<NaiveDate>, max: Option<NaiveDate>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn unsorted(mut self) -> Self {
        self.sorted = false;
        self
    }

    pub fn grouped(mut self) -> Self {
        self.group_spanned = true;
        self
    }

    fn keeps(&self, event: &Event) -> bool {
        self.types
            .as_ref()
            .is_none_or(|types| types.iter().any(|t| *t == event.event_type))
    }
}

/// An event repeated on every day from `start` to `end` inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSpan {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub event: Event,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedEvents {
    Days(Vec<(NaiveDate, Event)>),
    Spans(Vec<EventSpan>),
}

impl TypedEvents {
    pub fn len(&self) -> usize {
        match self {
            TypedEvents::Days(v) => v.len(),
            TypedEvents::Spans(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Point lookup ─────────────────────────────────────────

    /// Events at `date`, or `None` when the day was never touched.
    pub fn events_at(&self, date: NaiveDate) -> Option<&[Event]> {
        self.days.get(&date).map(Vec::as_slice)
    }

    pub fn has_bucket(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&date)
    }

    /// Type of the first event of the day.
    pub fn event_type_at(&self, date: NaiveDate) -> Option<&str> {
        self.events_at(date)
            .and_then(|events| events.first())
            .map(|e| e.event_type.as_str())
    }

    /// Whether `date` holds exactly `events`, pairwise same type and slot.
    pub fn has_events_at(&self, date: NaiveDate, events: &[Event]) -> bool {
        if events.is_empty() {
            return false;
        }
        match self.events_at(date) {
            Some(others) => {
                others.len() == events.len() && events.iter().zip(others).all(|(a, b)| a.same_as(b))
            }
            None => false,
        }
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn event_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    // ── Mutation ─────────────────────────────────────────────

    /// The bucket for `date`, created empty if absent.
    pub(crate) fn bucket_mut(&mut self, date: NaiveDate) -> &mut Vec<Event> {
        self.days.entry(date).or_default()
    }

    pub(crate) fn get_mut(&mut self, date: NaiveDate) -> Option<&mut Vec<Event>> {
        self.days.get_mut(&date)
    }

    pub(crate) fn remove_day(&mut self, date: NaiveDate) -> Option<Vec<Event>> {
        self.days.remove(&date)
    }

    // ── Walks ────────────────────────────────────────────────

    /// Visit every stored day in chronological order, restricted to `range`.
    /// The walk stops as soon as `f` breaks.
    pub fn walk<F>(&self, range: Option<DateRange>, mut f: F)
    where
        F: FnMut(NaiveDate, &[Event]) -> ControlFlow<()>,
    {
        let days: Box<dyn Iterator<Item = (&NaiveDate, &Vec<Event>)>> = match range {
            None => Box::new(self.days.iter()),
            Some(range) => match range.bounds() {
                Some((start, end)) if start <= end => Box::new(self.days.range(start..=end)),
                _ => return,
            },
        };
        for (date, events) in days {
            if f(*date, events).is_break() {
                return;
            }
        }
    }

    pub fn events_by_type(&self, query: &EventQuery) -> Result<TypedEvents, ConfigError> {
        if query.group_spanned && !query.sorted {
            return Err(ConfigError::UnsortedEvents);
        }
        let found = self
            .days
            .iter()
            .filter(|(date, _)| query.min.is_none_or(|min| **date >= min))
            .filter(|(date, _)| query.max.is_none_or(|max| **date <= max))
            .flat_map(|(date, events)| events.iter().filter(|e| query.keeps(e)).map(|e| (*date, e.clone())));

        if !query.group_spanned {
            return Ok(TypedEvents::Days(found.collect()));
        }

        let mut spans: Vec<EventSpan> = found
            .map(|(date, event)| EventSpan { start: date, end: date, event })
            .collect();
        // Walk backwards, folding each entry into its predecessor when it
        // starts the day after it with the same type.
        let mut i = spans.len();
        while i > 1 {
            i -= 1;
            let (current, previous) = (&spans[i], &spans[i - 1]);
            if previous.start.succ_opt() == Some(current.start)
                && previous.event.event_type == current.event.event_type
            {
                let end = current.end;
                spans.remove(i);
                spans[i - 1].end = end;
            }
        }
        Ok(TypedEvents::Spans(spans))
    }
}
