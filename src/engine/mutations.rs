use chrono::{Days, NaiveDate};

use crate::config::Verdict;
use crate::limits::*;
use crate::model::*;
use crate::request::Command;

use super::timeslot::{check_create_event, merge_event, sort_day};
use super::{write, Calendar, Engine, EngineError, PlacementError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// No event at that day or in that slot.
    Nothing,
    /// The before-delete hook refused.
    Vetoed,
    /// `count` events removed on the first day, plus `cascaded` following days cleared.
    Deleted { count: usize, cascaded: usize },
}

/// What a processed request tells the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Done,
    Message(String),
    /// The request was refused with a user-facing message; nothing changed.
    Rejected(String),
}

impl Calendar {
    /// Store one event at `date`, then the same event on each of the `span`
    /// following days. Days of the span where the event does not fit are
    /// skipped. `span` is clamped to the calendar's maximum event length.
    pub fn create_event(
        &mut self,
        date: NaiveDate,
        event_type: &str,
        timeslot: &str,
        span: u32,
    ) -> Result<(), PlacementError> {
        let span = span.min(self.config.settings.max_event_length);
        self.insert_event(date, event_type, timeslot)?;
        let mut stored = 1u64;
        for offset in 1..=span {
            let Some(day) = date.checked_add_days(Days::new(offset as u64)) else { break };
            match self.insert_event(day, event_type, timeslot) {
                Ok(()) => stored += 1,
                Err(e) => tracing::debug!(calendar = %self.reference, %day, "span day skipped: {e}"),
            }
        }
        metrics::counter!(crate::observability::EVENTS_CREATED_TOTAL).increment(stored);

        let suffix = if span > 0 { format!(", span+{span}") } else { String::new() };
        self.audit(date, &format!("added {event_type}, slot {timeslot}{suffix}"));
        Ok(())
    }

    /// Like [`Calendar::create_event`], after removing every event already
    /// stored at `date`. Following days of the span are left as they are.
    pub fn replace_event(
        &mut self,
        date: NaiveDate,
        event_type: &str,
        timeslot: &str,
        span: u32,
    ) -> Result<(), PlacementError> {
        let cleared = std::mem::take(self.store.bucket_mut(date));
        if !cleared.is_empty() {
            metrics::counter!(crate::observability::EVENTS_DELETED_TOTAL).increment(cleared.len() as u64);
            self.audit(date, &format!("cleared {} event(s) before adding {event_type}", cleared.len()));
        }
        self.create_event(date, event_type, timeslot, span)
    }

    /// Check, insert or merge, then reorder one day. The day's bucket is
    /// created even when the check fails.
    fn insert_event(&mut self, date: NaiveDate, event_type: &str, timeslot: &str) -> Result<(), PlacementError> {
        let config = self.config.clone();
        let events = self.store.bucket_mut(date);
        check_create_event(&config, event_type, timeslot, events)?;
        if !merge_event(&config, event_type, timeslot, events) {
            events.push(Event::new(event_type, timeslot));
            sort_day(&config, events);
        }
        Ok(())
    }

    /// Delete the event at `timeslot`, or the whole day for `main`. With
    /// `cascade`, following days holding exactly the same events are cleared
    /// too, up to the first day that differs.
    pub fn delete_event(&mut self, date: NaiveDate, timeslot: &str, cascade: bool) -> DeleteOutcome {
        let events = match self.store.events_at(date) {
            Some(events) if !events.is_empty() => events.to_vec(),
            _ => return DeleteOutcome::Nothing,
        };
        if !self.config.before_delete(date, timeslot) {
            tracing::debug!(calendar = %self.reference, %date, timeslot, "deletion vetoed");
            return DeleteOutcome::Vetoed;
        }

        if timeslot != MAIN_SLOT {
            let Some(day) = self.store.get_mut(date) else {
                return DeleteOutcome::Nothing;
            };
            let Some(i) = day.iter().rposition(|e| e.timeslot == timeslot) else {
                return DeleteOutcome::Nothing;
            };
            let removed = day.remove(i);
            metrics::counter!(crate::observability::EVENTS_DELETED_TOTAL).increment(1);
            let name = self.config.event_name(self.translator(), &removed.event_type);
            self.audit(date, &format!("{} deleted at slot {timeslot}.", removed.display_name(&name)));
            return DeleteOutcome::Deleted { count: 1, cascaded: 0 };
        }

        self.store.remove_day(date);
        let mut deleted = events.len();
        let mut cascaded = 0;
        if cascade {
            let mut day = date;
            while cascaded < MAX_CASCADE_DAYS {
                let Some(next) = day.succ_opt() else { break };
                if !self.store.has_events_at(next, &events) {
                    break;
                }
                self.store.remove_day(next);
                deleted += events.len();
                cascaded += 1;
                day = next;
            }
        }
        metrics::counter!(crate::observability::EVENTS_DELETED_TOTAL).increment(deleted as u64);

        let names = events
            .iter()
            .map(|e| e.display_name(&self.config.event_name(self.translator(), &e.event_type)))
            .collect::<Vec<_>>()
            .join(", ");
        let suffix = if cascaded > 0 { format!(", span+{cascaded}") } else { String::new() };
        self.audit(date, &format!("{names} deleted ({}){suffix}.", events.len()));
        DeleteOutcome::Deleted {
            count: events.len(),
            cascaded,
        }
    }
}

impl Engine {
    pub fn create_event(
        &self,
        calendar: &CalendarRef,
        date: NaiveDate,
        event_type: &str,
        timeslot: &str,
        span: u32,
    ) -> Result<(), EngineError> {
        self.place(calendar, date, event_type, timeslot, span, false)
    }

    /// Create an event at `date` after clearing that day.
    pub fn replace_event(
        &self,
        calendar: &CalendarRef,
        date: NaiveDate,
        event_type: &str,
        timeslot: &str,
        span: u32,
    ) -> Result<(), EngineError> {
        self.place(calendar, date, event_type, timeslot, span, true)
    }

    fn place(
        &self,
        calendar: &CalendarRef,
        date: NaiveDate,
        event_type: &str,
        timeslot: &str,
        span: u32,
        replace: bool,
    ) -> Result<(), EngineError> {
        if event_type.is_empty() || event_type.len() > MAX_EVENT_TYPE_LEN {
            return Err(EngineError::LimitExceeded("bad event type length"));
        }
        let cal = self.resolve(calendar)?;
        let mut guard = write(&cal);
        let result = if replace {
            guard.replace_event(date, event_type, timeslot, span)
        } else {
            guard.create_event(date, event_type, timeslot, span)
        };
        result.map_err(|e| {
            metrics::counter!(crate::observability::PLACEMENTS_REJECTED_TOTAL).increment(1);
            EngineError::Placement(e)
        })
    }

    pub fn delete_event(
        &self,
        calendar: &CalendarRef,
        date: NaiveDate,
        timeslot: &str,
        cascade: bool,
    ) -> Result<DeleteOutcome, EngineError> {
        let cal = self.resolve(calendar)?;
        let mut guard = write(&cal);
        Ok(guard.delete_event(date, timeslot, cascade))
    }

    /// User-facing text for a refused placement.
    pub fn placement_message(&self, error: &PlacementError) -> String {
        match error {
            PlacementError::TypeNotAllowed { slot } => {
                self.translator.translate("timeslot_misfit", &[("slot", slot)])
            }
            other => other.to_string(),
        }
    }

    /// Handle one request from the calendar widget on behalf of `actor`.
    pub fn process(&self, calendar: &CalendarRef, command: Command, actor: &str) -> Result<Reply, EngineError> {
        let label = crate::observability::command_label(&command);
        let result = self.dispatch(calendar, command, actor);
        let status = match &result {
            Ok(Reply::Rejected(_)) => "rejected",
            Ok(_) => "ok",
            Err(_) => "error",
        };
        metrics::counter!(crate::observability::REQUESTS_TOTAL, "command" => label, "status" => status)
            .increment(1);
        result
    }

    fn dispatch(&self, calendar: &CalendarRef, command: Command, actor: &str) -> Result<Reply, EngineError> {
        match command {
            Command::CreateEvent { date, event_type, timeslot, span, replace } => {
                let (config, _) = self.snapshot(calendar)?;
                self.check_edit(calendar, &config, actor)?;
                let span = span.min(config.settings.max_event_length);
                let rejection = match config.check(date, &event_type, &timeslot, span) {
                    Verdict::Valid => None,
                    Verdict::Invalid => Some(self.translator.translate("field_invalid", &[])),
                    Verdict::Message(msg) => Some(msg),
                };
                if let Some(msg) = rejection {
                    metrics::counter!(crate::observability::PLACEMENTS_REJECTED_TOTAL).increment(1);
                    return Ok(Reply::Rejected(msg));
                }
                match self.place(calendar, date, &event_type, &timeslot, span, replace) {
                    Ok(()) => Ok(Reply::Done),
                    Err(EngineError::Placement(e)) => Ok(Reply::Rejected(self.placement_message(&e))),
                    Err(e) => Err(e),
                }
            }
            Command::DeleteEvent { date, timeslot, cascade } => {
                let cal = self.resolve(calendar)?;
                let mut guard = write(&cal);
                let config = guard.config.clone();
                self.check_edit(calendar, &config, actor)?;
                let events = guard.store.events_at(date).unwrap_or_default();
                let allowed = if timeslot == MAIN_SLOT {
                    events.is_empty() || config.may_delete(events)
                } else {
                    events
                        .iter()
                        .rposition(|e| e.timeslot == timeslot)
                        .is_none_or(|i| config.may_delete(&events[i..=i]))
                };
                if !allowed {
                    return Err(EngineError::Unauthorized("delete"));
                }
                guard.delete_event(date, &timeslot, cascade);
                Ok(Reply::Done)
            }
            Command::Validate { validated, discarded } => {
                let request = super::ValidationRequest { validated, discarded };
                let outcome = self.validate(calendar, &request, actor)?;
                Ok(Reply::Message(outcome.message))
            }
            Command::ExecuteAction { name, month, selected, comment } => {
                let (config, _) = self.snapshot(calendar)?;
                self.check_edit(calendar, &config, actor)?;
                let selection = super::parse_selection(&selected)?;
                match self.execute_action(calendar, &name, month, &selection, comment.as_deref())? {
                    Some(msg) => Ok(Reply::Message(msg)),
                    None => Ok(Reply::Done),
                }
            }
        }
    }

    fn check_edit(
        &self,
        calendar: &CalendarRef,
        config: &crate::config::CalendarConfig,
        actor: &str,
    ) -> Result<(), EngineError> {
        if !config.settings.editable || !self.guard.may_edit(calendar, actor) {
            return Err(EngineError::Unauthorized("edit"));
        }
        Ok(())
    }
}
