use std::sync::Mutex;

use chrono::NaiveDate;

use crate::i18n::Translator;
use crate::model::Event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// Mail transport collaborator.
pub trait Mailer: Send + Sync {
    fn send_mail(&self, mail: Mail);
}

/// Mailer that keeps every message in memory.
#[derive(Debug, Default)]
pub struct Outbox {
    sent: Mutex<Vec<Mail>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain and return everything sent so far.
    pub fn take(&self) -> Vec<Mail> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl Mailer for Outbox {
    fn send_mail(&self, mail: Mail) {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(mail);
    }
}

/// The user a validation digest goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub login: String,
    pub title: String,
    /// Mail address; the login is used when absent.
    pub address: Option<String>,
}

impl Recipient {
    pub fn new(login: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            title: title.into(),
            address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// Per-recipient list of processed events, flushed as one mail per recipient.
#[derive(Debug, Default)]
pub struct Digest {
    entries: Vec<(Recipient, Vec<String>)>,
}

impl Digest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn recipients(&self) -> usize {
        self.entries.len()
    }

    pub fn lines_for(&self, login: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(r, _)| r.login == login)
            .map(|(_, lines)| lines.as_slice())
    }

    pub fn add(&mut self, recipient: Recipient, line: String) {
        match self.entries.iter_mut().find(|(r, _)| r.login == recipient.login) {
            Some((_, lines)) => lines.push(line),
            None => self.entries.push((recipient, vec![line])),
        }
    }

    /// Send one mail per recipient. Returns the number of mails sent.
    pub fn send(
        self,
        mailer: &dyn Mailer,
        translator: &dyn Translator,
        subject_label: &str,
        body_label: &str,
        from_user: &str,
    ) -> usize {
        let subject = translator.translate(subject_label, &[]);
        let mut sent = 0;
        for (recipient, lines) in self.entries {
            let details = lines.join("\n");
            let body = translator.translate(
                body_label,
                &[
                    ("fromUser", from_user),
                    ("toUser", &recipient.title),
                    ("details", &details),
                ],
            );
            let to = recipient.address.unwrap_or(recipient.login);
            mailer.send_mail(Mail {
                recipient: to,
                subject: subject.clone(),
                body,
            });
            sent += 1;
        }
        metrics::counter!(crate::observability::MAILS_SENT_TOTAL).increment(sent as u64);
        sent
    }
}

/// One digest line: `<date> - [slot] <name> : <status>`.
pub fn digest_line(date: NaiveDate, date_format: &str, event: &Event, name: &str, status: &str) -> String {
    format!(
        "{} - {} : {status}",
        date.format(date_format),
        event.display_name(name)
    )
}
