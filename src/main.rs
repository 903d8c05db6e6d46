use std::io::{self, BufRead, Write};
use std::sync::Arc;

use tracing::info;

use agenda::auth::AllowAll;
use agenda::config::CalendarFile;
use agenda::engine::{Engine, Reply};
use agenda::i18n::Labels;
use agenda::model::CalendarRef;
use agenda::notify::Outbox;
use agenda::request::parse_request;

/// Reads one request per line, `<objectId>_<field> <urlencoded form>`, and
/// prints one reply per line followed by the mails it caused.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let metrics_port: Option<u16> = std::env::var("AGENDA_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    agenda::observability::init(metrics_port)?;

    let config_path = std::env::var("AGENDA_CONFIG").unwrap_or_else(|_| "agenda.json".into());
    let actor = std::env::var("AGENDA_ACTOR").unwrap_or_else(|_| "admin".into());

    let file: CalendarFile = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;
    let outbox = Arc::new(Outbox::new());
    let engine = Engine::new(Arc::new(Labels::default()), outbox.clone(), Arc::new(AllowAll));
    let loaded = engine.load(file)?;
    info!("agenda ready");
    info!("  config: {config_path} ({loaded} calendars)");
    info!("  actor: {actor}");
    info!("  metrics: {}", metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    let mut out = io::stdout().lock();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((reference, form)) = line.split_once(char::is_whitespace) else {
            writeln!(out, "error: expected '<calendar> <form>'")?;
            continue;
        };

        let reply = reference
            .parse::<CalendarRef>()
            .and_then(|r| parse_request(form.trim()).map(|c| (r, c)).map_err(|e| e.to_string()))
            .and_then(|(r, c)| engine.process(&r, c, &actor).map_err(|e| e.to_string()));
        match reply {
            Ok(Reply::Done) => writeln!(out, "ok")?,
            Ok(Reply::Message(msg)) => writeln!(out, "ok: {msg}")?,
            Ok(Reply::Rejected(msg)) => writeln!(out, "rejected: {msg}")?,
            Err(e) => {
                tracing::warn!("request failed: {e}");
                writeln!(out, "error: {e}")?;
            }
        }
        for mail in outbox.take() {
            writeln!(out, "mail to {}: {}", mail.recipient, mail.subject)?;
        }
    }

    info!("agenda stopped");
    Ok(())
}
