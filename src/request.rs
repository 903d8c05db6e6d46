use std::collections::HashMap;
use std::num::IntErrorKind;

use chrono::NaiveDate;
use url::form_urlencoded;

use crate::limits::*;
use crate::model::*;

/// Parsed request from the calendar widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateEvent {
        date: NaiveDate,
        event_type: String,
        timeslot: String,
        /// Number of following days the event also covers.
        span: u32,
        /// Clear the first day before creating.
        replace: bool,
    },
    DeleteEvent {
        date: NaiveDate,
        timeslot: String,
        /// Also clear following days holding the same events.
        cascade: bool,
    },
    Validate {
        validated: Vec<String>,
        discarded: Vec<String>,
    },
    ExecuteAction {
        name: String,
        month: NaiveDate,
        /// Comma-separated `<objectId>_<YYYYMMDD>` cells.
        selected: String,
        comment: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    MissingField(&'static str),
    BadValue(&'static str, String),
    UnknownAction(String),
    TooManyKeys(usize),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::MissingField(name) => write!(f, "missing field: {name}"),
            RequestError::BadValue(name, v) => write!(f, "bad value for {name}: {v}"),
            RequestError::UnknownAction(a) => write!(f, "unknown action type: {a}"),
            RequestError::TooManyKeys(n) => write!(f, "too many keys: {n}"),
        }
    }
}

impl std::error::Error for RequestError {}

/// Parse an urlencoded form (`actionType=createEvent&day=2024/03/04&...`).
pub fn parse_request(form: &str) -> Result<Command, RequestError> {
    let fields: HashMap<String, String> = form_urlencoded::parse(form.trim().as_bytes()).into_owned().collect();
    let field = |name: &'static str| fields.get(name).map(String::as_str).filter(|v| !v.is_empty());
    let required = |name: &'static str| field(name).ok_or(RequestError::MissingField(name));
    let day = || {
        let raw = required("day")?;
        parse_date_key(raw).ok_or_else(|| RequestError::BadValue("day", raw.to_string()))
    };
    let timeslot = || field("timeslot").unwrap_or(MAIN_SLOT).to_string();
    let flag = |name: &'static str| field(name).is_some_and(|v| matches!(v, "True" | "true" | "1"));

    let action = required("actionType")?;
    match action {
        "createEvent" => {
            let span = match field("eventSpan") {
                Some(raw) => parse_span(raw)?,
                None => 0,
            };
            Ok(Command::CreateEvent {
                date: day()?,
                event_type: required("eventType")?.to_string(),
                timeslot: timeslot(),
                span,
                replace: flag("deleteFirst"),
            })
        }
        "deleteEvent" => Ok(Command::DeleteEvent {
            date: day()?,
            timeslot: timeslot(),
            cascade: flag("deleteNext"),
        }),
        "validateEvents" => {
            let validated = split_keys(field("validated"));
            let discarded = split_keys(field("discarded"));
            let count = validated.len() + discarded.len();
            if count > MAX_KEYS_PER_REQUEST {
                return Err(RequestError::TooManyKeys(count));
            }
            Ok(Command::Validate { validated, discarded })
        }
        "executeAction" => {
            let raw = required("month")?;
            let month = parse_month(raw).ok_or_else(|| RequestError::BadValue("month", raw.to_string()))?;
            Ok(Command::ExecuteAction {
                name: required("actionName")?.to_string(),
                month,
                selected: field("selected").unwrap_or_default().to_string(),
                comment: field("comment").map(str::to_string),
            })
        }
        other => Err(RequestError::UnknownAction(other.to_string())),
    }
}

/// Spans too large for `u32` saturate; the engine clamps them to the
/// calendar's `max_event_length` anyway.
fn parse_span(raw: &str) -> Result<u32, RequestError> {
    match raw.trim().parse::<u32>() {
        Ok(span) => Ok(span),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(u32::MAX),
        Err(_) => Err(RequestError::BadValue("eventSpan", raw.to_string())),
    }
}

fn split_keys(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parse_create_event() {
        let cmd = parse_request("actionType=createEvent&day=2024%2F03%2F04&eventType=leave&eventSpan=2").unwrap();
        assert_eq!(
            cmd,
            Command::CreateEvent {
                date: d(2024, 3, 4),
                event_type: "leave".into(),
                timeslot: "main".into(),
                span: 2,
                replace: false,
            }
        );
    }

    #[test]
    fn parse_create_event_with_timeslot() {
        let cmd = parse_request("actionType=createEvent&day=20240304&eventType=leave&timeslot=AM&deleteFirst=False").unwrap();
        match cmd {
            Command::CreateEvent { timeslot, span, replace, .. } => {
                assert_eq!(timeslot, "AM");
                assert_eq!(span, 0);
                assert!(!replace);
            }
            _ => panic!("expected CreateEvent, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_delete_event() {
        let cmd = parse_request("actionType=deleteEvent&day=2024-03-04&deleteNext=True").unwrap();
        assert_eq!(
            cmd,
            Command::DeleteEvent {
                date: d(2024, 3, 4),
                timeslot: "main".into(),
                cascade: true,
            }
        );
        let cmd = parse_request("actionType=deleteEvent&day=2024-03-04&timeslot=PM").unwrap();
        match cmd {
            Command::DeleteEvent { cascade, timeslot, .. } => {
                assert!(!cascade);
                assert_eq!(timeslot, "PM");
            }
            _ => panic!("expected DeleteEvent, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_validate_events() {
        let cmd = parse_request("actionType=validateEvents&validated=20240304_wish_main%2C20240305_wish_AM&discarded=").unwrap();
        assert_eq!(
            cmd,
            Command::Validate {
                validated: vec!["20240304_wish_main".into(), "20240305_wish_AM".into()],
                discarded: vec![],
            }
        );
    }

    #[test]
    fn parse_execute_action() {
        let cmd = parse_request(
            "actionType=executeAction&actionName=export&month=2024%2F03&selected=01ARZ3NDEKTSV4RRFFQ69G5FAV_20240304&comment=for+review",
        )
        .unwrap();
        assert_eq!(
            cmd,
            Command::ExecuteAction {
                name: "export".into(),
                month: d(2024, 3, 1),
                selected: "01ARZ3NDEKTSV4RRFFQ69G5FAV_20240304".into(),
                comment: Some("for review".into()),
            }
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse_request("day=20240304"), Err(RequestError::MissingField("actionType")));
        assert_eq!(
            parse_request("actionType=createEvent&day=20240304"),
            Err(RequestError::MissingField("eventType"))
        );
        assert_eq!(
            parse_request("actionType=createEvent&day=someday&eventType=x"),
            Err(RequestError::BadValue("day", "someday".into()))
        );
        assert_eq!(
            parse_request("actionType=createEvent&day=20240304&eventType=x&eventSpan=-1"),
            Err(RequestError::BadValue("eventSpan", "-1".into()))
        );
        assert_eq!(
            parse_request("actionType=createEvent&day=20240304&eventType=x&eventSpan=two"),
            Err(RequestError::BadValue("eventSpan", "two".into()))
        );
        assert_eq!(
            parse_request("actionType=moveEvent"),
            Err(RequestError::UnknownAction("moveEvent".into()))
        );
    }

    #[test]
    fn oversized_span_saturates() {
        let cmd = parse_request("actionType=createEvent&day=20240304&eventType=leave&eventSpan=5000000000").unwrap();
        match cmd {
            Command::CreateEvent { span, replace, .. } => {
                assert_eq!(span, u32::MAX);
                assert!(!replace);
            }
            _ => panic!("expected CreateEvent, got {cmd:?}"),
        }
    }

    #[test]
    fn form_values_are_decoded() {
        let cmd = parse_request("actionType=executeAction&actionName=send+mail&month=2024%2F03&&comment=a%26b%3Dc").unwrap();
        match cmd {
            Command::ExecuteAction { name, comment, selected, .. } => {
                assert_eq!(name, "send mail");
                assert_eq!(comment.as_deref(), Some("a&b=c"));
                assert_eq!(selected, "");
            }
            _ => panic!("expected ExecuteAction, got {cmd:?}"),
        }
    }
}
