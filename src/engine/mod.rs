mod actions;
mod aggregation;
mod error;
mod mutations;
mod others;
mod queries;
mod store;
mod timeslot;
mod validation;

pub use actions::{parse_selection, Action, Visibility};
pub use aggregation::{
    active_layers, validation_checkbox_status, CellContent, CellInfo, Layer, LegendEntry, Totals,
    TotalsCell, TotalsKind, SEVERAL_EVENTS_STYLE,
};
pub use error::{ConfigError, EngineError, PlacementError};
pub use mutations::{DeleteOutcome, Reply};
pub use others::{EventCatalog, Other, OtherEvent};
pub use store::{EventQuery, EventSpan, EventStore, TypedEvents};
pub use validation::{Decision, ValidationKey, ValidationOutcome, ValidationRequest};

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use dashmap::DashMap;

use crate::auth::Guard;
use crate::config::{CalendarConfig, CalendarFile};
use crate::i18n::Translator;
use crate::limits::*;
use crate::model::*;
use crate::notify::Mailer;

pub type SharedCalendar = Arc<RwLock<Calendar>>;

/// One calendar field on one object: its configuration and stored events.
pub struct Calendar {
    pub reference: CalendarRef,
    pub config: Arc<CalendarConfig>,
    pub store: EventStore,
    /// Groups of foreign calendars shown in this calendar's timeline.
    pub others: Vec<Vec<Other>>,
    labels: Arc<dyn Translator>,
}

impl std::fmt::Debug for Calendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calendar")
            .field("reference", &self.reference)
            .field("config", &self.config)
            .field("store", &self.store)
            .field("others", &self.others)
            .finish()
    }
}

impl Calendar {
    pub fn new(reference: CalendarRef, config: CalendarConfig, labels: Arc<dyn Translator>) -> Self {
        Self {
            reference,
            config: Arc::new(config),
            store: EventStore::new(),
            others: Vec::new(),
            labels,
        }
    }

    pub(crate) fn translator(&self) -> &dyn Translator {
        self.labels.as_ref()
    }

    /// Audit entry, prefixed with the calendar and the day concerned.
    pub(crate) fn audit(&self, date: NaiveDate, msg: &str) {
        tracing::info!(calendar = %self.reference, date = %date.format("%Y/%m/%d"), "{msg}");
    }
}

pub(crate) fn read(cal: &SharedCalendar) -> RwLockReadGuard<'_, Calendar> {
    cal.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write(cal: &SharedCalendar) -> RwLockWriteGuard<'_, Calendar> {
    cal.write().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of every calendar, plus the collaborators they share.
pub struct Engine {
    calendars: DashMap<CalendarRef, SharedCalendar>,
    pub(crate) translator: Arc<dyn Translator>,
    pub(crate) mailer: Arc<dyn Mailer>,
    pub(crate) guard: Arc<dyn Guard>,
}

impl Engine {
    pub fn new(translator: Arc<dyn Translator>, mailer: Arc<dyn Mailer>, guard: Arc<dyn Guard>) -> Self {
        Self {
            calendars: DashMap::new(),
            translator,
            mailer,
            guard,
        }
    }

    // ── Registry ─────────────────────────────────────────────

    pub fn register(&self, reference: CalendarRef, config: CalendarConfig) -> Result<SharedCalendar, EngineError> {
        if self.calendars.len() >= MAX_CALENDARS {
            return Err(EngineError::LimitExceeded("too many calendars"));
        }
        if reference.field.len() > MAX_FIELD_NAME_LEN {
            return Err(EngineError::LimitExceeded("field name too long"));
        }
        if self.calendars.contains_key(&reference) {
            return Err(EngineError::AlreadyExists(reference));
        }
        let calendar = Calendar::new(reference.clone(), config, self.translator.clone());
        let shared = Arc::new(RwLock::new(calendar));
        self.calendars.insert(reference, shared.clone());
        metrics::gauge!(crate::observability::CALENDARS_ACTIVE).set(self.calendars.len() as f64);
        Ok(shared)
    }

    pub fn unregister(&self, reference: &CalendarRef) -> Result<(), EngineError> {
        self.calendars
            .remove(reference)
            .ok_or_else(|| EngineError::NotFound(reference.clone()))?;
        metrics::gauge!(crate::observability::CALENDARS_ACTIVE).set(self.calendars.len() as f64);
        Ok(())
    }

    pub fn calendar(&self, reference: &CalendarRef) -> Option<SharedCalendar> {
        self.calendars.get(reference).map(|e| e.value().clone())
    }

    pub fn calendar_refs(&self) -> Vec<CalendarRef> {
        let mut refs: Vec<CalendarRef> = self.calendars.iter().map(|e| e.key().clone()).collect();
        refs.sort();
        refs
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    /// Set the foreign calendars shown in `reference`'s timeline.
    pub fn set_others(&self, reference: &CalendarRef, others: Vec<Vec<Other>>) -> Result<(), EngineError> {
        for other in others.iter().flatten() {
            if !self.calendars.contains_key(&other.calendar) {
                return Err(EngineError::NotFound(other.calendar.clone()));
            }
        }
        let cal = self.resolve(reference)?;
        write(&cal).others = others;
        Ok(())
    }

    /// Register every calendar of a startup file, then wire up their
    /// foreign calendars. Returns the number of calendars registered.
    pub fn load(&self, file: CalendarFile) -> Result<usize, EngineError> {
        let mut wiring = Vec::new();
        for entry in file.calendars {
            let reference = CalendarRef::new(entry.object, entry.field);
            let config = CalendarConfig::from_settings(entry.settings).build()?;
            self.register(reference.clone(), config)?;
            if !entry.others.is_empty() {
                wiring.push((reference, entry.others));
            }
        }
        let loaded = self.calendars.len();
        for (reference, groups) in wiring {
            let others = groups
                .into_iter()
                .map(|group| {
                    group
                        .into_iter()
                        .map(|o| {
                            let mut other = Other::new(CalendarRef::new(o.object, o.field)).excluding(o.excluded);
                            if let Some(color) = o.color {
                                other = other.with_color(color);
                            }
                            other.highlight = o.highlight;
                            other
                        })
                        .collect()
                })
                .collect();
            self.set_others(&reference, others)?;
        }
        tracing::info!(calendars = loaded, "calendars loaded");
        Ok(loaded)
    }

    pub(crate) fn resolve(&self, reference: &CalendarRef) -> Result<SharedCalendar, EngineError> {
        self.calendar(reference)
            .ok_or_else(|| EngineError::NotFound(reference.clone()))
    }

    /// Run `f` under a read lock of one calendar.
    pub fn read<R>(&self, reference: &CalendarRef, f: impl FnOnce(&Calendar) -> R) -> Result<R, EngineError> {
        let cal = self.resolve(reference)?;
        let guard = read(&cal);
        Ok(f(&guard))
    }

    /// Configuration and foreign calendars of `reference`, without holding its lock.
    pub(crate) fn snapshot(&self, reference: &CalendarRef) -> Result<(Arc<CalendarConfig>, Vec<Vec<Other>>), EngineError> {
        let cal = self.resolve(reference)?;
        let guard = read(&cal);
        Ok((guard.config.clone(), guard.others.clone()))
    }
}
