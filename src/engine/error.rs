use crate::model::CalendarRef;

/// Construction-time configuration mistakes. Never recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    TimelineWithEvents,
    MissingEventNameMethod,
    TotalsMisused,
    StrictMonthsMisused,
    FirstTimeslotNotMain,
    DuplicateTimeslot(String),
    UnsortedEvents,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::TimelineWithEvents => write!(
                f,
                "a timeline calendar displays other calendars; it cannot define event types of its own"
            ),
            ConfigError::MissingEventNameMethod => {
                write!(f, "dynamic event types require an event name function")
            }
            ConfigError::TotalsMisused => {
                write!(f, "totals can only be specified for timeline calendars")
            }
            ConfigError::StrictMonthsMisused => {
                write!(f, "strict months can only be used with timeline calendars")
            }
            ConfigError::FirstTimeslotNotMain => write!(
                f,
                "the first timeslot must have id \"main\" and represent the whole day"
            ),
            ConfigError::DuplicateTimeslot(id) => write!(f, "duplicate timeslot: {id}"),
            ConfigError::UnsortedEvents => write!(
                f,
                "events must be sorted if you want to get spanned events to be grouped"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A create request that the timeslot policy refuses. Recoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    SlotInUse,
    DayFull,
    TypeNotAllowed { slot: String },
    UnknownTimeslot { slot: String },
}

impl std::fmt::Display for PlacementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementError::SlotInUse => write!(f, "An event is already defined at this timeslot."),
            PlacementError::DayFull => write!(f, "No more place for adding this event."),
            PlacementError::TypeNotAllowed { slot } => {
                write!(f, "This event type can't be added at slot {slot}.")
            }
            PlacementError::UnknownTimeslot { slot } => write!(f, "Unknown timeslot: {slot}."),
        }
    }
}

impl std::error::Error for PlacementError {}

#[derive(Debug)]
pub enum EngineError {
    NotFound(CalendarRef),
    AlreadyExists(CalendarRef),
    Config(ConfigError),
    Placement(PlacementError),
    /// Stored data contradicts the request (wrong event type behind a key, missing schema entry).
    Consistency(String),
    ActionNotFound(String),
    Unauthorized(&'static str),
    MissingValidation,
    BadKey(String),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(cal) => write!(f, "calendar not found: {cal}"),
            EngineError::AlreadyExists(cal) => write!(f, "calendar already exists: {cal}"),
            EngineError::Config(e) => write!(f, "configuration error: {e}"),
            EngineError::Placement(e) => write!(f, "{e}"),
            EngineError::Consistency(msg) => write!(f, "inconsistent data: {msg}"),
            EngineError::ActionNotFound(name) => {
                write!(f, "Action \"{name}\" does not exist or is not visible.")
            }
            EngineError::Unauthorized(op) => write!(f, "not allowed: {op}"),
            EngineError::MissingValidation => {
                write!(f, "validation is not configured for this calendar")
            }
            EngineError::BadKey(key) => write!(f, "malformed key: {key}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::Config(e)
    }
}

impl From<PlacementError> for EngineError {
    fn from(e: PlacementError) -> Self {
        EngineError::Placement(e)
    }
}
