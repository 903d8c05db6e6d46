use crate::config::CalendarConfig;
use crate::model::*;

use super::PlacementError;

/// Can an event of `event_type` go into `timeslot` on a day already holding `events`?
///
/// The order of the checks decides which error a request breaking several
/// rules gets back, and must not change.
pub(crate) fn check_create_event(
    config: &CalendarConfig,
    event_type: &str,
    timeslot: &str,
    events: &[Event],
) -> Result<(), PlacementError> {
    for e in events {
        if e.timeslot == timeslot {
            return Err(PlacementError::SlotInUse);
        } else if e.is_main() {
            return Err(PlacementError::DayFull);
        }
    }
    if !events.is_empty() && timeslot == MAIN_SLOT {
        return Err(PlacementError::DayFull);
    }
    match config.timeslot(timeslot) {
        Some(slot) if !slot.allows(event_type) => Err(PlacementError::TypeNotAllowed {
            slot: timeslot.to_string(),
        }),
        Some(_) => Ok(()),
        None => Err(PlacementError::UnknownTimeslot {
            slot: timeslot.to_string(),
        }),
    }
}

/// Timeslots still free on a day holding `events`. On an empty day, every
/// slot is free, `main` included.
pub(crate) fn free_slots_at(config: &CalendarConfig, events: &[Event]) -> Vec<String> {
    let ids = config.timeslots().iter().map(|t| t.id.clone());
    if events.is_empty() {
        return ids.collect();
    }
    ids.skip(1)
        .filter(|id| !events.iter().any(|e| e.timeslot == *id))
        .collect()
}

/// The day is full when `main` is taken or every other slot is.
pub(crate) fn day_is_full(config: &CalendarConfig, events: &[Event]) -> bool {
    if events.is_empty() {
        return false;
    }
    events.iter().any(Event::is_main) || events.len() == config.timeslots().len() - 1
}

/// Collapse the day into one `main` event when the new event would complete
/// the set of partial slots with events of a single type. Returns whether
/// the merge happened; the new event must not be inserted in that case.
pub(crate) fn merge_event(
    config: &CalendarConfig,
    event_type: &str,
    timeslot: &str,
    events: &mut Vec<Event>,
) -> bool {
    if timeslot == MAIN_SLOT {
        return false;
    }
    let Some(needed) = config.timeslots().len().checked_sub(2) else {
        return false;
    };
    if events.len() != needed || events.iter().any(|e| e.event_type != event_type) {
        return false;
    }
    events.clear();
    events.push(Event::main(event_type));
    true
}

/// Reorder a day's events to follow the configured timeslot order.
pub(crate) fn sort_day(config: &CalendarConfig, events: &mut [Event]) {
    if events.len() > 1 {
        events.sort_by_key(|e| config.timeslot_index(&e.timeslot));
    }
}
