use chrono::NaiveDate;

use crate::config::{CalendarConfig, Gradient, Render};
use crate::i18n::Translator;
use crate::limits::*;
use crate::model::*;

use super::{read, Engine, EngineError};

/// A foreign calendar shown inside a timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Other {
    pub calendar: CalendarRef,
    /// Color of this calendar's events in a month render.
    pub color: String,
    /// Event types this view hides.
    pub excluded: Vec<String>,
    pub highlight: bool,
}

impl Other {
    pub fn new(calendar: CalendarRef) -> Self {
        Self {
            calendar,
            color: DEFAULT_OTHER_COLOR.to_string(),
            excluded: Vec::new(),
            highlight: false,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn excluding<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn highlighted(mut self) -> Self {
        self.highlight = true;
        self
    }

    pub fn excludes(&self, event_type: &str) -> bool {
        self.excluded.iter().any(|t| t == event_type)
    }
}

/// A foreign event as it shows in the viewing calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct OtherEvent {
    pub event: Event,
    pub name: String,
    /// Color of the owning [`Other`].
    pub color: String,
    /// Cell background, timeline only.
    pub bg_color: Option<String>,
    /// Set when the event covers part of the day and its slot has a gradient.
    pub gradient: Option<Gradient>,
    /// Shown for uncolored events when the viewer asks for it.
    pub symbol: Option<String>,
}

impl OtherEvent {
    /// Cell style for this event alone, if it has a color.
    pub fn style(&self) -> Option<String> {
        let color = self.bg_color.as_deref()?;
        Some(match &self.gradient {
            Some(gradient) => gradient.style(color),
            None => format!("background-color:{color}"),
        })
    }
}

/// Every event type known to a composite view, with display names, in
/// discovery order: the viewer's own types first, then each foreign calendar's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventCatalog {
    pub entries: Vec<(String, String)>,
}

impl EventCatalog {
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(t, _)| t.as_str())
    }

    pub fn name(&self, event_type: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(t, _)| t == event_type)
            .map(|(_, n)| n.as_str())
    }

    fn add(&mut self, event_type: String, name: impl FnOnce() -> String) {
        if self.name(&event_type).is_none() {
            let name = name();
            self.entries.push((event_type, name));
        }
    }
}

/// Project the events of `other` at one day into the viewer's display space.
pub(crate) fn project(
    viewer: &CalendarConfig,
    other: &Other,
    other_config: &CalendarConfig,
    events: &[Event],
    translator: &dyn Translator,
) -> Vec<OtherEvent> {
    let timeline = viewer.render() == Render::Timeline;
    events
        .iter()
        .filter(|e| !other.excludes(&e.event_type))
        .map(|event| {
            let name = other_config.event_name(translator, &event.event_type);
            let mut info = OtherEvent {
                event: event.clone(),
                name,
                color: other.color.clone(),
                bg_color: None,
                gradient: None,
                symbol: None,
            };
            if !timeline {
                return info;
            }
            match viewer.color_for(&event.event_type) {
                Some(color) => {
                    let day_part = other_config
                        .timeslot(&event.timeslot)
                        .map_or(1.0, |t| t.day_part);
                    if day_part < 1.0 {
                        info.gradient = viewer.settings.gradients.get(&event.timeslot).cloned();
                    }
                    info.bg_color = Some(color);
                }
                None if viewer.settings.show_uncolored => {
                    info.symbol = Some(UNCOLORED_SYMBOL.to_string());
                }
                None => {}
            }
            info
        })
        .collect()
}

impl Engine {
    /// Events of `other` at `date`, as seen from `viewer`.
    pub fn other_events_at(
        &self,
        viewer: &CalendarRef,
        other: &Other,
        date: NaiveDate,
    ) -> Result<Vec<OtherEvent>, EngineError> {
        let (config, _) = self.snapshot(viewer)?;
        let cal = self.resolve(&other.calendar)?;
        let guard = read(&cal);
        let events = guard.store.events_at(date).unwrap_or_default();
        Ok(project(&config, other, &guard.config, events, self.translator.as_ref()))
    }

    /// Events of every foreign calendar of `viewer` at `date`.
    pub fn all_other_events_at(&self, viewer: &CalendarRef, date: NaiveDate) -> Result<Vec<OtherEvent>, EngineError> {
        let (_, others) = self.snapshot(viewer)?;
        let mut r = Vec::new();
        for other in others.iter().flatten() {
            r.extend(self.other_events_at(viewer, other, date)?);
        }
        Ok(r)
    }

    /// Union of event types and names across `viewer` and its foreign calendars.
    pub fn all_events(&self, viewer: &CalendarRef) -> Result<EventCatalog, EngineError> {
        let mut catalog = EventCatalog::default();
        {
            let cal = self.resolve(viewer)?;
            let guard = read(&cal);
            for event_type in guard.event_types() {
                catalog.add(event_type.clone(), || guard.event_name(&event_type));
            }
        }
        let (_, others) = self.snapshot(viewer)?;
        for other in others.iter().flatten() {
            let cal = self.resolve(&other.calendar)?;
            let guard = read(&cal);
            for event_type in guard.event_types() {
                if other.excludes(&event_type) {
                    continue;
                }
                catalog.add(event_type.clone(), || guard.event_name(&event_type));
            }
        }
        Ok(catalog)
    }
}
