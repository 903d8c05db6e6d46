use std::collections::HashSet;

use chrono::NaiveDate;

use crate::config::{CalendarConfig, Render};
use crate::limits::*;
use crate::model::*;
use crate::notify::{digest_line, Digest};

use super::{write, Engine, EngineError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Validated,
    Discarded,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Validated => "validated",
            Decision::Discarded => "discarded",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Decision::Validated => "event_validated",
            Decision::Discarded => "event_discarded",
        }
    }
}

/// What a validation checkbox points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationKey {
    /// Month render: one event of the calendar itself, `<YYYYMMDD>_<type>_<slot>`.
    Own {
        date: NaiveDate,
        event_type: String,
        timeslot: String,
    },
    /// Timeline render: every validable event of a foreign calendar at one
    /// day, `<objectId>_<field>_<YYYYMMDD>`.
    Other { calendar: CalendarRef, date: NaiveDate },
}

impl ValidationKey {
    pub fn parse(render: Render, key: &str) -> Result<Self, EngineError> {
        let bad = || EngineError::BadKey(key.to_string());
        let (head, rest) = key.split_once('_').ok_or_else(bad)?;
        let (middle, tail) = rest.rsplit_once('_').ok_or_else(bad)?;
        if middle.is_empty() || tail.is_empty() {
            return Err(bad());
        }
        match render {
            Render::Month => Ok(ValidationKey::Own {
                date: parse_date_key(head).ok_or_else(bad)?,
                event_type: middle.to_string(),
                timeslot: tail.to_string(),
            }),
            Render::Timeline => {
                let object = ulid::Ulid::from_string(head).map_err(|_| bad())?;
                Ok(ValidationKey::Other {
                    calendar: CalendarRef::new(object, middle),
                    date: parse_date_key(tail).ok_or_else(bad)?,
                })
            }
        }
    }
}

/// Checkbox ids ticked for validation and for discarding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationRequest {
    pub validated: Vec<String>,
    pub discarded: Vec<String>,
}

impl ValidationRequest {
    fn is_empty(&self) -> bool {
        self.validated.is_empty() && self.discarded.is_empty()
    }

    fn len(&self) -> usize {
        self.validated.len() + self.discarded.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub validated: usize,
    pub discarded: usize,
    /// Discarded events actually removed from their calendar.
    pub removed: usize,
    pub mails: usize,
    pub message: String,
}

/// Counters and digest shared by both renders.
struct Tally<'a> {
    config: &'a CalendarConfig,
    engine: &'a Engine,
    outcome: ValidationOutcome,
    digest: Digest,
}

impl Tally<'_> {
    fn record(
        &mut self,
        target: &CalendarRef,
        target_config: &CalendarConfig,
        date: NaiveDate,
        event: &Event,
        decision: Decision,
    ) {
        match decision {
            Decision::Validated => self.outcome.validated += 1,
            Decision::Discarded => self.outcome.discarded += 1,
        }
        metrics::counter!(crate::observability::EVENTS_VALIDATED_TOTAL, "action" => decision.as_str())
            .increment(1);
        let Some(recipient) = self.config.recipient_for(target) else { return };
        let translator = self.engine.translator.as_ref();
        let name = target_config.event_name(translator, &event.event_type);
        let status = translator.translate(decision.label(), &[]);
        let date_format = self
            .config
            .validation()
            .map_or(DEFAULT_DATE_FORMAT, |v| v.date_format.as_str());
        self.digest
            .add(recipient, digest_line(date, date_format, event, &name, &status));
    }
}

impl Engine {
    /// Validate or discard the events behind the ticked checkboxes of `viewer`.
    pub fn validate(
        &self,
        viewer: &CalendarRef,
        request: &ValidationRequest,
        actor: &str,
    ) -> Result<ValidationOutcome, EngineError> {
        let (config, _) = self.snapshot(viewer)?;
        let Some(settings) = config.validation() else {
            return Err(EngineError::MissingValidation);
        };
        if !self.guard.may_validate(viewer, actor) {
            return Err(EngineError::Unauthorized("validate"));
        }
        if request.len() > MAX_KEYS_PER_REQUEST {
            return Err(EngineError::LimitExceeded("too many validation keys"));
        }
        if request.is_empty() {
            return Ok(ValidationOutcome {
                message: self.translator.translate("action_null", &[]),
                ..ValidationOutcome::default()
            });
        }

        let mut keys = Vec::with_capacity(request.len());
        for (decision, raw) in request
            .validated
            .iter()
            .map(|k| (Decision::Validated, k))
            .chain(request.discarded.iter().map(|k| (Decision::Discarded, k)))
        {
            keys.push((decision, ValidationKey::parse(config.render(), raw)?));
        }

        let mut tally = Tally {
            config: &config,
            engine: self,
            outcome: ValidationOutcome::default(),
            digest: Digest::new(),
        };
        match config.render() {
            Render::Month => self.validate_own(viewer, &keys, &mut tally)?,
            Render::Timeline => self.validate_others(&keys, &mut tally)?,
        }

        let Tally { mut outcome, digest, .. } = tally;
        if outcome.validated == 0 && outcome.discarded == 0 {
            outcome.message = self.translator.translate("action_null", &[]);
            return Ok(outcome);
        }

        let part = if config.discard.removes() { "" } else { " (but not removed)" };
        tracing::info!(
            calendar = %viewer,
            "{} event(s) validated and {} discarded{part}.",
            outcome.validated,
            outcome.discarded
        );
        if !digest.is_empty() {
            outcome.mails = digest.send(
                self.mailer.as_ref(),
                self.translator.as_ref(),
                &settings.email_subject_label,
                &settings.email_body_label,
                actor,
            );
        }
        let validated = outcome.validated.to_string();
        let discarded = outcome.discarded.to_string();
        outcome.message = self.translator.translate(
            "validate_events_done",
            &[("validated", &validated), ("discarded", &discarded)],
        );
        Ok(outcome)
    }

    /// Month render: every key names one event of `viewer` itself. All keys
    /// are checked before anything changes.
    fn validate_own(
        &self,
        viewer: &CalendarRef,
        keys: &[(Decision, ValidationKey)],
        tally: &mut Tally<'_>,
    ) -> Result<(), EngineError> {
        let cal = self.resolve(viewer)?;
        let mut guard = write(&cal);
        let config = guard.config.clone();
        let schema = config
            .validation()
            .map(|v| &v.schema)
            .ok_or(EngineError::MissingValidation)?;

        // A slot may be named once per request: its type changes (or it is
        // removed) as soon as the first key applies.
        let mut seen = HashSet::with_capacity(keys.len());
        for (decision, key) in keys {
            let ValidationKey::Own { date, event_type, timeslot } = key else {
                return Err(EngineError::BadKey(format!("{key:?}")));
            };
            if !seen.insert((*date, timeslot.as_str())) {
                return Err(EngineError::Consistency(format!(
                    "wrong event type at {date} slot {timeslot}: named twice in one request"
                )));
            }
            for event in guard
                .store
                .events_at(*date)
                .unwrap_or_default()
                .iter()
                .filter(|e| e.timeslot == *timeslot)
            {
                if event.event_type != *event_type {
                    return Err(EngineError::Consistency(format!(
                        "wrong event type at {date} slot {timeslot}: expected {event_type}, found {}",
                        event.event_type
                    )));
                }
                if *decision == Decision::Validated && !schema.contains_key(event_type) {
                    return Err(EngineError::Consistency(format!(
                        "no validated type for {event_type}"
                    )));
                }
            }
        }

        for (decision, key) in keys {
            let ValidationKey::Own { date, timeslot, .. } = key else { continue };
            let Some(events) = guard.store.get_mut(*date) else { continue };
            let mut i = events.len();
            while i > 0 {
                i -= 1;
                if events[i].timeslot != *timeslot {
                    continue;
                }
                let event = match decision {
                    Decision::Validated => {
                        if let Some(validated) = schema.get(&events[i].event_type) {
                            events[i].event_type = validated.clone();
                        }
                        events[i].clone()
                    }
                    Decision::Discarded => {
                        let event = events[i].clone();
                        if config.discard.allows_removal(viewer, *date, &event) {
                            events.remove(i);
                            tally.outcome.removed += 1;
                            metrics::counter!(crate::observability::EVENTS_DELETED_TOTAL).increment(1);
                        }
                        event
                    }
                };
                tally.record(viewer, &config, *date, &event, *decision);
            }
        }
        Ok(())
    }

    /// Timeline render: every key names a day of a foreign calendar; all
    /// events there whose type is in that calendar's schema are processed.
    /// The viewer's discard policy applies.
    fn validate_others(&self, keys: &[(Decision, ValidationKey)], tally: &mut Tally<'_>) -> Result<(), EngineError> {
        let mut targets = Vec::with_capacity(keys.len());
        let mut seen = HashSet::with_capacity(keys.len());
        for (decision, key) in keys {
            let ValidationKey::Other { calendar, date } = key else {
                return Err(EngineError::BadKey(format!("{key:?}")));
            };
            if !seen.insert((calendar, *date)) {
                return Err(EngineError::Consistency(format!(
                    "wrong event type at {date} in {calendar}: named twice in one request"
                )));
            }
            let cal = self.resolve(calendar)?;
            let has_validation = super::read(&cal).config.validation().is_some();
            if !has_validation {
                return Err(EngineError::MissingValidation);
            }
            targets.push((*decision, calendar, *date, cal));
        }

        for (decision, calendar, date, cal) in targets {
            let mut guard = write(&cal);
            let config = guard.config.clone();
            let Some(schema) = config.validation().map(|v| &v.schema) else { continue };
            let Some(events) = guard.store.get_mut(date) else { continue };
            let mut i = events.len();
            while i > 0 {
                i -= 1;
                let Some(validated) = schema.get(&events[i].event_type) else { continue };
                let event = match decision {
                    Decision::Validated => {
                        events[i].event_type = validated.clone();
                        events[i].clone()
                    }
                    Decision::Discarded => {
                        let event = events[i].clone();
                        if tally.config.discard.allows_removal(calendar, date, &event) {
                            events.remove(i);
                            tally.outcome.removed += 1;
                            metrics::counter!(crate::observability::EVENTS_DELETED_TOTAL).increment(1);
                        }
                        event
                    }
                };
                tally.record(calendar, &config, date, &event, decision);
            }
        }
        Ok(())
    }
}
