use std::collections::HashSet;

use crate::model::CalendarRef;

/// Authorization collaborator consulted before every mutation.
pub trait Guard: Send + Sync {
    fn may_edit(&self, calendar: &CalendarRef, actor: &str) -> bool;
    fn may_validate(&self, calendar: &CalendarRef, actor: &str) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Guard for AllowAll {
    fn may_edit(&self, _calendar: &CalendarRef, _actor: &str) -> bool {
        true
    }

    fn may_validate(&self, _calendar: &CalendarRef, _actor: &str) -> bool {
        true
    }
}

/// Everybody may edit; only the listed users may validate wish events.
#[derive(Debug, Default, Clone)]
pub struct Validators {
    names: HashSet<String>,
}

impl Validators {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Guard for Validators {
    fn may_edit(&self, _calendar: &CalendarRef, _actor: &str) -> bool {
        true
    }

    fn may_validate(&self, _calendar: &CalendarRef, actor: &str) -> bool {
        self.names.contains(actor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn validators_only_grant_listed_users() {
        let cal = CalendarRef::new(Ulid::new(), "leaves");
        let guard = Validators::new(["boss"]);
        assert!(guard.may_edit(&cal, "anyone"));
        assert!(guard.may_validate(&cal, "boss"));
        assert!(!guard.may_validate(&cal, "anyone"));
    }
}
