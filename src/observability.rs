use std::net::SocketAddr;

use crate::request::Command;

// ── Scheduling counters ─────────────────────────────────────────

/// Counter: events stored by create requests, span days included.
pub const EVENTS_CREATED_TOTAL: &str = "agenda_events_created_total";

/// Counter: events removed by delete requests and discards.
pub const EVENTS_DELETED_TOTAL: &str = "agenda_events_deleted_total";

/// Counter: create requests refused by the timeslot policy or the validator.
pub const PLACEMENTS_REJECTED_TOTAL: &str = "agenda_placements_rejected_total";

/// Counter: events processed by the validation workflow. Labels: action.
pub const EVENTS_VALIDATED_TOTAL: &str = "agenda_events_validated_total";

/// Counter: validation digests sent.
pub const MAILS_SENT_TOTAL: &str = "agenda_mails_sent_total";

// ── Registry ────────────────────────────────────────────────────

/// Gauge: calendars registered in the engine.
pub const CALENDARS_ACTIVE: &str = "agenda_calendars_active";

/// Counter: requests processed. Labels: command, status.
pub const REQUESTS_TOTAL: &str = "agenda_requests_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::CreateEvent { .. } => "create_event",
        Command::DeleteEvent { .. } => "delete_event",
        Command::Validate { .. } => "validate",
        Command::ExecuteAction { .. } => "execute_action",
    }
}
