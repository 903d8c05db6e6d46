use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Days, NaiveDate};
use ulid::Ulid;

use agenda::auth::AllowAll;
use agenda::config::CalendarConfig;
use agenda::engine::{Engine, EventQuery, ValidationRequest};
use agenda::i18n::Labels;
use agenda::model::{date_key, CalendarRef, Timeslot};
use agenda::notify::Outbox;

const CALENDARS: usize = 200;
const DAYS: u64 = 365;
const THREADS: usize = 8;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    if latencies.is_empty() {
        return;
    }
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies[latencies.len() - 1].as_secs_f64() * 1000.0,
    );
}

fn setup() -> (Arc<Engine>, Vec<CalendarRef>) {
    let engine = Arc::new(Engine::new(
        Arc::new(Labels::default()),
        Arc::new(Outbox::new()),
        Arc::new(AllowAll),
    ));
    let mut calendars = Vec::with_capacity(CALENDARS);
    for _ in 0..CALENDARS {
        let config = CalendarConfig::builder("leaves")
            .event_types(["wish", "leave", "sick"])
            .timeslots(vec![Timeslot::main(), Timeslot::new("AM"), Timeslot::new("PM")])
            .validation(agenda::config::ValidationSettings {
                schema: [("wish".to_string(), "leave".to_string())].into(),
                remove_discarded: true,
                ..Default::default()
            })
            .build()
            .expect("bench config");
        let reference = CalendarRef::new(Ulid::new(), "leaves");
        engine.register(reference.clone(), config).expect("register");
        calendars.push(reference);
    }
    (engine, calendars)
}

fn main() {
    let (engine, calendars) = setup();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("start date");
    println!("agenda stress: {CALENDARS} calendars, {DAYS} days, {THREADS} threads");

    // ── Concurrent creates ─────────────────────────────────
    let t0 = Instant::now();
    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let engine = engine.clone();
            let calendars = calendars.clone();
            thread::spawn(move || {
                let mut latencies = Vec::new();
                let mut rejected = 0usize;
                for (i, cal) in calendars.iter().enumerate().filter(|(i, _)| i % THREADS == t) {
                    for day in 0..DAYS {
                        let date = start + Days::new(day);
                        let (event_type, slot) = match (day + i as u64) % 4 {
                            0 => ("leave", "main"),
                            1 => ("wish", "AM"),
                            2 => ("sick", "PM"),
                            _ => continue,
                        };
                        let begin = Instant::now();
                        if engine.create_event(cal, date, event_type, slot, 0).is_err() {
                            rejected += 1;
                        }
                        latencies.push(begin.elapsed());
                    }
                }
                (latencies, rejected)
            })
        })
        .collect();
    let mut creates = Vec::new();
    let mut rejected = 0;
    for h in handles {
        let (lat, rej) = h.join().expect("create thread");
        creates.extend(lat);
        rejected += rej;
    }
    let elapsed = t0.elapsed();
    println!(
        "\ncreate: {} ops in {:.2}s ({:.0} ops/s), {rejected} rejected",
        creates.len(),
        elapsed.as_secs_f64(),
        creates.len() as f64 / elapsed.as_secs_f64()
    );
    print_latency("create_event", &mut creates);

    // ── Spanned creates and grouped queries ────────────────
    let mut spans = Vec::new();
    let mut queries = Vec::new();
    let later = start + Days::new(DAYS + 30);
    for cal in &calendars {
        let begin = Instant::now();
        let _ = engine.create_event(cal, later, "leave", "main", 20);
        spans.push(begin.elapsed());

        let begin = Instant::now();
        let _ = engine.events_by_type(cal, &EventQuery::of_type("leave").grouped());
        queries.push(begin.elapsed());
    }
    println!();
    print_latency("create_event span+20", &mut spans);
    print_latency("events_by_type grouped", &mut queries);

    // ── Validation ─────────────────────────────────────────
    let mut validations = Vec::new();
    for cal in &calendars {
        let keys: Vec<String> = (0..DAYS)
            .map(|day| start + Days::new(day))
            .filter(|date| {
                engine
                    .events_at(cal, *date)
                    .is_ok_and(|events| events.iter().any(|e| e.event_type == "wish"))
            })
            .map(|date| format!("{}_wish_AM", date_key(date)))
            .collect();
        let request = ValidationRequest { validated: keys, discarded: Vec::new() };
        let begin = Instant::now();
        let _ = engine.validate(cal, &request, "bench");
        validations.push(begin.elapsed());
    }
    println!();
    print_latency("validate", &mut validations);

    // ── Cascade deletes ────────────────────────────────────
    let mut deletes = Vec::new();
    for cal in &calendars {
        let begin = Instant::now();
        let _ = engine.delete_event(cal, later, "main", true);
        deletes.push(begin.elapsed());
    }
    println!();
    print_latency("delete_event cascade", &mut deletes);
    println!("\n{} events left", engine.event_count());
}
