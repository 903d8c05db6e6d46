use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::engine::{Action, ConfigError, Layer, LegendEntry, Totals};
use crate::i18n::Translator;
use crate::limits::*;
use crate::model::{CalendarRef, Event, Timeslot, MAIN_SLOT};
use crate::notify::Recipient;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Render {
    #[default]
    Month,
    Timeline,
}

fn default_angle() -> String {
    DEFAULT_GRADIENT_ANGLE.to_string()
}

fn default_end_color() -> String {
    DEFAULT_GRADIENT_END_COLOR.to_string()
}

/// Linear gradient used instead of a flat color for partial-day events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gradient {
    #[serde(default = "default_angle")]
    pub angle: String,
    #[serde(default = "default_end_color")]
    pub end_color: String,
}

impl Default for Gradient {
    fn default() -> Self {
        Self {
            angle: default_angle(),
            end_color: default_end_color(),
        }
    }
}

impl Gradient {
    pub fn style(&self, start_color: &str) -> String {
        format!(
            "background: linear-gradient({}, {start_color}, {})",
            self.angle, self.end_color
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Wish event type → validated event type.
    pub schema: BTreeMap<String, String>,
    pub remove_discarded: bool,
    pub date_format: String,
    pub email_subject_label: String,
    pub email_body_label: String,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            schema: BTreeMap::new(),
            remove_discarded: false,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            email_subject_label: "calendar_validation_subject".to_string(),
            email_body_label: "calendar_validation_body".to_string(),
        }
    }
}

/// The static, deserializable part of a calendar configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    pub name: String,
    /// Prefix of event-name labels (`<label>_event_<type>`). Defaults to `name`.
    pub label: Option<String>,
    pub render: Render,
    pub event_types: Vec<String>,
    pub timeslots: Vec<Timeslot>,
    pub max_event_length: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Day shown when no month is requested. Today when unset.
    pub default_date: Option<NaiveDate>,
    pub strict_months: bool,
    pub selectable_months: u32,
    pub colors: BTreeMap<String, String>,
    /// Gradients keyed by timeslot id.
    pub gradients: BTreeMap<String, Gradient>,
    pub show_uncolored: bool,
    pub validation: Option<ValidationSettings>,
    pub editable: bool,
    pub delete: bool,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            label: None,
            render: Render::Month,
            event_types: Vec::new(),
            timeslots: vec![Timeslot::main()],
            max_event_length: DEFAULT_MAX_EVENT_LENGTH,
            start_date: None,
            end_date: None,
            default_date: None,
            strict_months: false,
            selectable_months: DEFAULT_SELECTABLE_MONTHS,
            colors: BTreeMap::new(),
            gradients: BTreeMap::new(),
            show_uncolored: false,
            validation: None,
            editable: true,
            delete: true,
        }
    }
}

// ── Startup file ─────────────────────────────────────────

/// A foreign calendar listed in a timeline's `others`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtherEntry {
    pub object: ulid::Ulid,
    pub field: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
    #[serde(default)]
    pub highlight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub object: ulid::Ulid,
    pub field: String,
    pub settings: CalendarSettings,
    /// Groups of foreign calendars shown in a timeline.
    #[serde(default)]
    pub others: Vec<Vec<OtherEntry>>,
}

/// Calendars declared in the JSON file loaded at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarFile {
    pub calendars: Vec<CalendarEntry>,
}

// ── Callable parts ───────────────────────────────────────

pub type EventTypesFn = Arc<dyn Fn(&CalendarRef) -> Vec<String> + Send + Sync>;
pub type EventNameFn = Arc<dyn Fn(&str) -> String + Send + Sync>;
pub type ColorFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;
/// Called before a discarded event is removed; `false` keeps the event.
pub type DiscardFn = Arc<dyn Fn(&CalendarRef, NaiveDate, &Event) -> bool + Send + Sync>;
pub type DeleteFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;
/// Receives the acting user and all event types; returns the ones they may create.
pub type AllowedFn = Arc<dyn Fn(&str, &[String]) -> Vec<String> + Send + Sync>;
/// May shrink the list in place; returns a message explaining what was removed.
pub type ApplicableFn = Arc<dyn Fn(NaiveDate, &mut Vec<String>) -> Option<String> + Send + Sync>;
pub type ValidatorFn = Arc<dyn Fn(NaiveDate, &str, &str, u32) -> Verdict + Send + Sync>;
/// Receives the date and timeslot; `false` vetoes the deletion.
pub type BeforeDeleteFn = Arc<dyn Fn(NaiveDate, &str) -> bool + Send + Sync>;
pub type RecipientFn = Arc<dyn Fn(&CalendarRef) -> Option<Recipient> + Send + Sync>;
/// Last say on a timeline legend once it is built.
pub type LegendFn = Arc<dyn Fn(&mut Vec<LegendEntry>) + Send + Sync>;

#[derive(Clone)]
pub enum EventTypes {
    Static(Vec<String>),
    Dynamic(EventTypesFn),
}

impl EventTypes {
    pub fn resolve(&self, calendar: &CalendarRef) -> Vec<String> {
        match self {
            EventTypes::Static(types) => types.clone(),
            EventTypes::Dynamic(f) => f(calendar),
        }
    }

    fn is_defined(&self) -> bool {
        match self {
            EventTypes::Static(types) => !types.is_empty(),
            EventTypes::Dynamic(_) => true,
        }
    }
}

#[derive(Clone)]
pub enum ColorPolicy {
    Fixed(BTreeMap<String, String>),
    Computed(ColorFn),
}

impl ColorPolicy {
    pub fn color_for(&self, event_type: &str) -> Option<String> {
        match self {
            ColorPolicy::Fixed(colors) => colors.get(event_type).cloned(),
            ColorPolicy::Computed(f) => f(event_type),
        }
    }
}

#[derive(Clone)]
pub enum DiscardPolicy {
    Keep,
    Remove,
    Computed(DiscardFn),
}

impl DiscardPolicy {
    pub fn removes(&self) -> bool {
        !matches!(self, DiscardPolicy::Keep)
    }

    pub fn allows_removal(&self, calendar: &CalendarRef, date: NaiveDate, event: &Event) -> bool {
        match self {
            DiscardPolicy::Keep => false,
            DiscardPolicy::Remove => true,
            DiscardPolicy::Computed(f) => f(calendar, date, event),
        }
    }
}

#[derive(Clone)]
pub enum DeletePolicy {
    Allowed,
    Denied,
    Computed(DeleteFn),
}

/// Outcome of the validator hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// Rejected without a specific message.
    Invalid,
    Message(String),
}

/// Event types applicable at some date, plus why some were removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applicable {
    pub event_types: Vec<String>,
    pub message: Option<String>,
}

/// Full configuration of one calendar, immutable once built.
pub struct CalendarConfig {
    pub settings: CalendarSettings,
    pub event_types: EventTypes,
    pub(crate) event_name: Option<EventNameFn>,
    pub colors: ColorPolicy,
    pub discard: DiscardPolicy,
    pub deletion: DeletePolicy,
    pub(crate) allowed_event_types: Option<AllowedFn>,
    pub(crate) applicable_events: Option<ApplicableFn>,
    pub(crate) validator: Option<ValidatorFn>,
    pub(crate) before_delete: Option<BeforeDeleteFn>,
    pub(crate) recipient: Option<RecipientFn>,
    pub(crate) legend_update: Option<LegendFn>,
    pub totals_rows: Vec<Totals>,
    pub totals_cols: Vec<Totals>,
    pub layers: Vec<Layer>,
    pub actions: Vec<Action>,
}

impl std::fmt::Debug for CalendarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarConfig")
            .field("settings", &self.settings)
            .field("layers", &self.layers.len())
            .field("actions", &self.actions.len())
            .finish_non_exhaustive()
    }
}

impl CalendarConfig {
    pub fn builder(name: impl Into<String>) -> CalendarConfigBuilder {
        CalendarConfigBuilder::new(CalendarSettings {
            name: name.into(),
            ..CalendarSettings::default()
        })
    }

    pub fn from_settings(settings: CalendarSettings) -> CalendarConfigBuilder {
        CalendarConfigBuilder::new(settings)
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn render(&self) -> Render {
        self.settings.render
    }

    pub fn timeslots(&self) -> &[Timeslot] {
        &self.settings.timeslots
    }

    pub fn timeslot(&self, id: &str) -> Option<&Timeslot> {
        self.settings.timeslots.iter().find(|t| t.id == id)
    }

    /// Position of a timeslot in the configured order. Unknown slots sort last.
    pub fn timeslot_index(&self, id: &str) -> usize {
        self.settings
            .timeslots
            .iter()
            .position(|t| t.id == id)
            .unwrap_or(usize::MAX)
    }

    pub fn validation(&self) -> Option<&ValidationSettings> {
        self.settings.validation.as_ref()
    }

    pub fn recipient_for(&self, calendar: &CalendarRef) -> Option<Recipient> {
        self.recipient.as_ref().and_then(|f| f(calendar))
    }

    pub fn event_name(&self, translator: &dyn Translator, event_type: &str) -> String {
        match &self.event_name {
            Some(f) => f(event_type),
            None => {
                let label = self.settings.label.as_deref().unwrap_or(&self.settings.name);
                translator.translate(&format!("{label}_event_{event_type}"), &[])
            }
        }
    }

    pub fn color_for(&self, event_type: &str) -> Option<String> {
        self.colors.color_for(event_type)
    }

    pub fn allowed_event_types(&self, actor: &str, event_types: Vec<String>) -> Vec<String> {
        match &self.allowed_event_types {
            Some(f) => f(actor, &event_types),
            None => event_types,
        }
    }

    /// `None` when there are no event types at all.
    pub fn applicable_event_types_at(&self, date: NaiveDate, event_types: &[String]) -> Option<Applicable> {
        if event_types.is_empty() {
            return None;
        }
        let mut event_types = event_types.to_vec();
        let message = match &self.applicable_events {
            Some(f) => f(date, &mut event_types),
            None => None,
        };
        Some(Applicable { event_types, message })
    }

    /// Deletion policy applied to the type of the first of `events`.
    pub fn may_delete(&self, events: &[Event]) -> bool {
        match &self.deletion {
            DeletePolicy::Allowed => true,
            DeletePolicy::Denied => false,
            DeletePolicy::Computed(f) => events.first().is_some_and(|e| f(&e.event_type)),
        }
    }

    pub fn default_date(&self, today: NaiveDate) -> NaiveDate {
        self.settings.default_date.unwrap_or(today)
    }

    pub fn date_in_range(&self, date: NaiveDate) -> bool {
        let too_early = self.settings.start_date.is_some_and(|start| date < start);
        let too_late = self.settings.end_date.is_some_and(|end| date > end);
        !too_early && !too_late
    }

    pub(crate) fn check(&self, date: NaiveDate, event_type: &str, timeslot: &str, span: u32) -> Verdict {
        match &self.validator {
            Some(f) => f(date, event_type, timeslot, span),
            None => Verdict::Valid,
        }
    }

    pub(crate) fn before_delete(&self, date: NaiveDate, timeslot: &str) -> bool {
        self.before_delete.as_ref().is_none_or(|f| f(date, timeslot))
    }
}

pub struct CalendarConfigBuilder {
    settings: CalendarSettings,
    dynamic_types: Option<EventTypesFn>,
    event_name: Option<EventNameFn>,
    colors: Option<ColorFn>,
    discard: Option<DiscardPolicy>,
    deletion: Option<DeleteFn>,
    allowed_event_types: Option<AllowedFn>,
    applicable_events: Option<ApplicableFn>,
    validator: Option<ValidatorFn>,
    before_delete: Option<BeforeDeleteFn>,
    recipient: Option<RecipientFn>,
    legend_update: Option<LegendFn>,
    totals_rows: Vec<Totals>,
    totals_cols: Vec<Totals>,
    layers: Vec<Layer>,
    actions: Vec<Action>,
}

impl CalendarConfigBuilder {
    fn new(settings: CalendarSettings) -> Self {
        Self {
            settings,
            dynamic_types: None,
            event_name: None,
            colors: None,
            discard: None,
            deletion: None,
            allowed_event_types: None,
            applicable_events: None,
            validator: None,
            before_delete: None,
            recipient: None,
            legend_update: None,
            totals_rows: Vec::new(),
            totals_cols: Vec::new(),
            layers: Vec::new(),
            actions: Vec::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.settings.label = Some(label.into());
        self
    }

    pub fn render(mut self, render: Render) -> Self {
        self.settings.render = render;
        self
    }

    pub fn event_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.event_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn dynamic_event_types(mut self, f: impl Fn(&CalendarRef) -> Vec<String> + Send + Sync + 'static) -> Self {
        self.dynamic_types = Some(Arc::new(f));
        self
    }

    pub fn event_name(mut self, f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.event_name = Some(Arc::new(f));
        self
    }

    pub fn timeslots(mut self, timeslots: Vec<Timeslot>) -> Self {
        self.settings.timeslots = timeslots;
        self
    }

    pub fn max_event_length(mut self, max: u32) -> Self {
        self.settings.max_event_length = max;
        self
    }

    pub fn bounds(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.settings.start_date = start;
        self.settings.end_date = end;
        self
    }

    pub fn default_date(mut self, date: NaiveDate) -> Self {
        self.settings.default_date = Some(date);
        self
    }

    pub fn strict_months(mut self, strict: bool) -> Self {
        self.settings.strict_months = strict;
        self
    }

    pub fn selectable_months(mut self, months: u32) -> Self {
        self.settings.selectable_months = months;
        self
    }

    pub fn color(mut self, event_type: impl Into<String>, color: impl Into<String>) -> Self {
        self.settings.colors.insert(event_type.into(), color.into());
        self
    }

    pub fn computed_colors(mut self, f: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        self.colors = Some(Arc::new(f));
        self
    }

    pub fn gradient(mut self, timeslot: impl Into<String>, gradient: Gradient) -> Self {
        self.settings.gradients.insert(timeslot.into(), gradient);
        self
    }

    pub fn show_uncolored(mut self, show: bool) -> Self {
        self.settings.show_uncolored = show;
        self
    }

    pub fn validation(mut self, validation: ValidationSettings) -> Self {
        self.settings.validation = Some(validation);
        self
    }

    /// Overrides `remove_discarded` from the validation settings.
    pub fn discard(mut self, policy: DiscardPolicy) -> Self {
        self.discard = Some(policy);
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.settings.editable = editable;
        self
    }

    pub fn deletable(mut self, delete: bool) -> Self {
        self.settings.delete = delete;
        self
    }

    pub fn computed_deletion(mut self, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.deletion = Some(Arc::new(f));
        self
    }

    pub fn allowed_event_types(
        mut self,
        f: impl Fn(&str, &[String]) -> Vec<String> + Send + Sync + 'static,
    ) -> Self {
        self.allowed_event_types = Some(Arc::new(f));
        self
    }

    pub fn applicable_events(
        mut self,
        f: impl Fn(NaiveDate, &mut Vec<String>) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.applicable_events = Some(Arc::new(f));
        self
    }

    pub fn validator(mut self, f: impl Fn(NaiveDate, &str, &str, u32) -> Verdict + Send + Sync + 'static) -> Self {
        self.validator = Some(Arc::new(f));
        self
    }

    pub fn before_delete(mut self, f: impl Fn(NaiveDate, &str) -> bool + Send + Sync + 'static) -> Self {
        self.before_delete = Some(Arc::new(f));
        self
    }

    pub fn recipient(mut self, f: impl Fn(&CalendarRef) -> Option<Recipient> + Send + Sync + 'static) -> Self {
        self.recipient = Some(Arc::new(f));
        self
    }

    pub fn total_row(mut self, totals: Totals) -> Self {
        self.totals_rows.push(totals);
        self
    }

    pub fn total_col(mut self, totals: Totals) -> Self {
        self.totals_cols.push(totals);
        self
    }

    pub fn legend_update(mut self, f: impl Fn(&mut Vec<LegendEntry>) + Send + Sync + 'static) -> Self {
        self.legend_update = Some(Arc::new(f));
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn build(self) -> Result<CalendarConfig, ConfigError> {
        let mut settings = self.settings;
        let timeline = settings.render == Render::Timeline;

        let event_types = match self.dynamic_types {
            Some(f) => EventTypes::Dynamic(f),
            None => EventTypes::Static(std::mem::take(&mut settings.event_types)),
        };
        if timeline && event_types.is_defined() {
            return Err(ConfigError::TimelineWithEvents);
        }
        if matches!(event_types, EventTypes::Dynamic(_)) && self.event_name.is_none() {
            return Err(ConfigError::MissingEventNameMethod);
        }
        if !timeline && (!self.totals_rows.is_empty() || !self.totals_cols.is_empty()) {
            return Err(ConfigError::TotalsMisused);
        }
        if !timeline && settings.strict_months {
            return Err(ConfigError::StrictMonthsMisused);
        }
        check_timeslots(&mut settings.timeslots)?;

        let colors = match self.colors {
            Some(f) => ColorPolicy::Computed(f),
            None => ColorPolicy::Fixed(settings.colors.clone()),
        };
        let discard = self.discard.unwrap_or_else(|| {
            match settings.validation.as_ref().is_some_and(|v| v.remove_discarded) {
                true => DiscardPolicy::Remove,
                false => DiscardPolicy::Keep,
            }
        });
        let deletion = match self.deletion {
            Some(f) => DeletePolicy::Computed(f),
            None if settings.delete => DeletePolicy::Allowed,
            None => DeletePolicy::Denied,
        };

        Ok(CalendarConfig {
            settings,
            event_types,
            event_name: self.event_name,
            colors,
            discard,
            deletion,
            allowed_event_types: self.allowed_event_types,
            applicable_events: self.applicable_events,
            validator: self.validator,
            before_delete: self.before_delete,
            recipient: self.recipient,
            legend_update: self.legend_update,
            totals_rows: self.totals_rows,
            totals_cols: self.totals_cols,
            layers: self.layers,
            actions: self.actions,
        })
    }
}

/// First slot must be `main`; every other slot takes an equal share of the day.
fn check_timeslots(timeslots: &mut Vec<Timeslot>) -> Result<(), ConfigError> {
    if timeslots.is_empty() {
        timeslots.push(Timeslot::main());
    }
    if timeslots[0].id != MAIN_SLOT {
        return Err(ConfigError::FirstTimeslotNotMain);
    }
    let mut seen = HashSet::new();
    for slot in timeslots.iter() {
        if !seen.insert(slot.id.as_str()) {
            return Err(ConfigError::DuplicateTimeslot(slot.id.clone()));
        }
    }
    let others = (timeslots.len() - 1).max(1) as f64;
    for slot in timeslots.iter_mut() {
        slot.day_part = if slot.is_main() { 1.0 } else { 1.0 / others };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Labels;
    use serde_json::json;
    use ulid::Ulid;

    fn slots() -> Vec<Timeslot> {
        vec![Timeslot::main(), Timeslot::new("AM"), Timeslot::new("PM")]
    }

    #[test]
    fn day_parts_are_shared_between_partial_slots() {
        let config = CalendarConfig::builder("plan").timeslots(slots()).build().unwrap();
        assert_eq!(config.timeslot("main").unwrap().day_part, 1.0);
        assert_eq!(config.timeslot("AM").unwrap().day_part, 0.5);
        assert_eq!(config.timeslot_index("PM"), 2);
        assert_eq!(config.timeslot_index("evening"), usize::MAX);
    }

    #[test]
    fn first_slot_must_be_main() {
        let err = CalendarConfig::builder("plan")
            .timeslots(vec![Timeslot::new("AM"), Timeslot::main()])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::FirstTimeslotNotMain);

        let err = CalendarConfig::builder("plan")
            .timeslots(vec![Timeslot::main(), Timeslot::new("AM"), Timeslot::new("AM")])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateTimeslot("AM".into()));
    }

    #[test]
    fn construction_errors() {
        let err = CalendarConfig::builder("t")
            .render(Render::Timeline)
            .event_types(["leave"])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::TimelineWithEvents);

        let err = CalendarConfig::builder("t")
            .dynamic_event_types(|_| vec!["x".into()])
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingEventNameMethod);

        let err = CalendarConfig::builder("t").strict_months(true).build().unwrap_err();
        assert_eq!(err, ConfigError::StrictMonthsMisused);

        let err = CalendarConfig::builder("t")
            .total_row(Totals::new("n", "Count", json!(0), |_, _| {}))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::TotalsMisused);

        assert!(
            CalendarConfig::builder("t")
                .render(Render::Timeline)
                .strict_months(true)
                .total_col(Totals::new("n", "Count", json!(0), |_, _| {}))
                .build()
                .is_ok()
        );
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let settings: CalendarSettings = serde_json::from_value(json!({
            "name": "leaves",
            "event_types": ["wish", "leave"],
            "timeslots": [{"id": "main"}, {"id": "AM", "event_types": ["wish"]}],
            "start_date": "2024-01-01",
            "validation": {"schema": {"wish": "leave"}, "remove_discarded": true}
        }))
        .unwrap();
        assert_eq!(settings.max_event_length, DEFAULT_MAX_EVENT_LENGTH);
        assert_eq!(settings.selectable_months, DEFAULT_SELECTABLE_MONTHS);
        assert_eq!(settings.validation.as_ref().unwrap().date_format, "%d/%m/%Y");

        let config = CalendarConfig::from_settings(settings).build().unwrap();
        assert!(config.discard.removes());
        assert_eq!(config.timeslot("AM").unwrap().day_part, 1.0);
        let cal = CalendarRef::new(Ulid::new(), "leaves");
        assert_eq!(config.event_types.resolve(&cal), ["wish", "leave"]);
    }

    #[test]
    fn event_names_and_policies() {
        let labels = Labels::empty().with("hr_event_leave", "Leave");
        let config = CalendarConfig::builder("leaves")
            .label("hr")
            .color("leave", "red")
            .computed_deletion(|ty| ty != "leave")
            .bounds(NaiveDate::from_ymd_opt(2024, 1, 1), None)
            .build()
            .unwrap();
        assert_eq!(config.event_name(&labels, "leave"), "Leave");
        assert_eq!(config.color_for("leave").as_deref(), Some("red"));
        assert_eq!(config.color_for("sick"), None);
        assert!(!config.may_delete(&[Event::main("leave")]));
        assert!(config.may_delete(&[Event::main("sick")]));
        assert!(!config.may_delete(&[]));
        assert!(!config.date_in_range(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
        assert!(config.date_in_range(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()));

        let dynamic = CalendarConfig::builder("d")
            .dynamic_event_types(|_| vec!["a".into()])
            .event_name(|ty| ty.to_uppercase())
            .build()
            .unwrap();
        assert_eq!(dynamic.event_name(&labels, "a"), "A");
    }

    #[test]
    fn applicable_and_allowed_filters() {
        let config = CalendarConfig::builder("leaves")
            .applicable_events(|date, types| {
                if chrono::Datelike::weekday(&date) == chrono::Weekday::Sun {
                    types.retain(|t| t != "work");
                    return Some("No work on sundays".into());
                }
                None
            })
            .allowed_event_types(|actor, types| {
                types.iter().filter(|t| actor == "boss" || *t != "bonus").cloned().collect()
            })
            .build()
            .unwrap();
        let types = vec!["work".to_string(), "bonus".to_string()];
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 3).unwrap();
        let applicable = config.applicable_event_types_at(sunday, &types).unwrap();
        assert_eq!(applicable.event_types, ["bonus"]);
        assert_eq!(applicable.message.as_deref(), Some("No work on sundays"));
        assert!(config.applicable_event_types_at(sunday, &[]).is_none());

        assert_eq!(config.allowed_event_types("bob", types.clone()), ["work"]);
        assert_eq!(config.allowed_event_types("boss", types).len(), 2);
    }
}
