use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use ulid::Ulid;

use agenda::auth::Validators;
use agenda::config::CalendarFile;
use agenda::engine::{Engine, EngineError, Reply};
use agenda::i18n::Labels;
use agenda::model::{CalendarRef, Event};
use agenda::notify::Outbox;
use agenda::request::parse_request;

// ── Test infrastructure ──────────────────────────────────────

struct Fixture {
    engine: Engine,
    outbox: Arc<Outbox>,
    leaves: CalendarRef,
    team: CalendarRef,
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// One leave calendar and a timeline showing it, loaded the way the binary does.
fn fixture() -> Fixture {
    let object = Ulid::new();
    let file: CalendarFile = serde_json::from_value(json!({
        "calendars": [
            {
                "object": object,
                "field": "leaves",
                "settings": {
                    "name": "leaves",
                    "event_types": ["wish", "leave"],
                    "timeslots": [{"id": "main"}, {"id": "AM"}, {"id": "PM"}],
                    "max_event_length": 10,
                    "validation": {"schema": {"wish": "leave"}, "remove_discarded": true}
                }
            },
            {
                "object": object,
                "field": "team",
                "settings": {"name": "team", "render": "timeline", "strict_months": true, "colors": {"leave": "red"}},
                "others": [[{"object": object, "field": "leaves", "color": "blue"}]]
            }
        ]
    }))
    .unwrap();

    let outbox = Arc::new(Outbox::new());
    let labels = Labels::default().with("leaves_event_wish", "Wish").with("leaves_event_leave", "Leave");
    let engine = Engine::new(Arc::new(labels), outbox.clone(), Arc::new(Validators::new(["boss"])));
    assert_eq!(engine.load(file).unwrap(), 2);
    Fixture {
        engine,
        outbox,
        leaves: CalendarRef::new(object, "leaves"),
        team: CalendarRef::new(object, "team"),
    }
}

fn send(f: &Fixture, calendar: &CalendarRef, form: &str, actor: &str) -> Result<Reply, EngineError> {
    let command = parse_request(form).unwrap();
    f.engine.process(calendar, command, actor)
}

// ── Request flows ────────────────────────────────────────────

#[test]
fn create_merge_and_delete() {
    let f = fixture();
    let leaves = &f.leaves;

    let reply = send(&f, leaves, "actionType=createEvent&day=2024%2F03%2F04&eventType=leave&timeslot=AM", "ann");
    assert_eq!(reply.unwrap(), Reply::Done);
    let reply = send(&f, leaves, "actionType=createEvent&day=2024%2F03%2F04&eventType=leave&timeslot=PM", "ann");
    assert_eq!(reply.unwrap(), Reply::Done);
    assert_eq!(f.engine.events_at(leaves, d(2024, 3, 4)).unwrap(), vec![Event::main("leave")]);

    let reply = send(&f, leaves, "actionType=createEvent&day=20240304&eventType=wish", "ann");
    assert_eq!(reply.unwrap(), Reply::Rejected("An event is already defined at this timeslot.".into()));

    let reply = send(&f, leaves, "actionType=deleteEvent&day=20240304", "ann");
    assert_eq!(reply.unwrap(), Reply::Done);
    assert_eq!(f.engine.event_count(), 0);
}

#[test]
fn spanned_create_then_cascade_delete() {
    let f = fixture();
    let leaves = &f.leaves;

    // Clamped to the configured 10 following days.
    send(&f, leaves, "actionType=createEvent&day=20240304&eventType=leave&eventSpan=40", "ann").unwrap();
    assert_eq!(f.engine.event_count(), 11);

    send(&f, leaves, "actionType=deleteEvent&day=20240308&deleteNext=True", "ann").unwrap();
    assert_eq!(f.engine.event_count(), 4);
    assert!(f.engine.events_at(leaves, d(2024, 3, 14)).unwrap().is_empty());
}

#[test]
fn oversized_span_is_clamped() {
    let f = fixture();
    let form = "actionType=createEvent&day=20240304&eventType=leave&eventSpan=5000000000";
    assert_eq!(send(&f, &f.leaves, form, "ann").unwrap(), Reply::Done);
    assert_eq!(f.engine.event_count(), 11);
    assert!(f.engine.events_at(&f.leaves, d(2024, 3, 15)).unwrap().is_empty());
}

#[test]
fn repeated_validation_key_changes_nothing() {
    let f = fixture();
    let leaves = &f.leaves;
    send(&f, leaves, "actionType=createEvent&day=20240304&eventType=wish", "ann").unwrap();

    for form in [
        "actionType=validateEvents&validated=20240304_wish_main%2C20240304_wish_main",
        "actionType=validateEvents&validated=20240304_wish_main&discarded=20240304_wish_main",
    ] {
        let err = send(&f, leaves, form, "boss").unwrap_err();
        assert!(matches!(err, EngineError::Consistency(_)), "{form}: {err:?}");
    }
    assert_eq!(f.engine.events_at(leaves, d(2024, 3, 4)).unwrap(), vec![Event::main("wish")]);
    assert!(f.outbox.is_empty());
}

#[test]
fn validation_round_trip() {
    let f = fixture();
    let leaves = &f.leaves;
    send(&f, leaves, "actionType=createEvent&day=20240304&eventType=wish&eventSpan=1", "ann").unwrap();

    let form = "actionType=validateEvents&validated=20240304_wish_main&discarded=20240305_wish_main";
    let err = send(&f, leaves, form, "ann").unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized("validate")));

    let reply = send(&f, leaves, form, "boss").unwrap();
    assert_eq!(reply, Reply::Message("1 event(s) validated and 1 discarded.".into()));
    assert_eq!(f.engine.events_at(leaves, d(2024, 3, 4)).unwrap(), vec![Event::main("leave")]);
    assert!(f.engine.events_at(leaves, d(2024, 3, 5)).unwrap().is_empty());

    // No recipient resolver configured: nothing is mailed.
    assert!(f.outbox.is_empty());
}

#[test]
fn timeline_sees_loaded_others() {
    let f = fixture();
    send(&f, &f.leaves, "actionType=createEvent&day=20240304&eventType=leave", "ann").unwrap();

    let events = f.engine.all_other_events_at(&f.team, d(2024, 3, 4)).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "Leave");
    assert_eq!(events[0].color, "blue");
    assert_eq!(events[0].bg_color.as_deref(), Some("red"));

    let grid = f.engine.grid(&f.team, d(2024, 2, 10)).unwrap();
    assert_eq!(grid.len(), 29);
}

#[test]
fn unknown_action_is_reported() {
    let f = fixture();
    let form = format!("actionType=executeAction&actionName=export&month=2024%2F03&selected={}_20240304", f.leaves.object);
    let err = send(&f, &f.team, &form, "ann").unwrap_err();
    assert!(matches!(err, EngineError::ActionNotFound(_)));
}
