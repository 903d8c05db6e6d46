use std::collections::HashMap;

/// Translation collaborator: turns a label id plus a mapping into user-facing text.
pub trait Translator: Send + Sync {
    fn translate(&self, key: &str, mapping: &[(&str, &str)]) -> String;
}

/// In-memory label table. Unknown labels translate to their own id.
/// `${name}` placeholders are replaced from the mapping.
#[derive(Debug, Clone)]
pub struct Labels {
    table: HashMap<String, String>,
}

impl Default for Labels {
    fn default() -> Self {
        let table = [
            ("field_invalid", "Please fill or correct this."),
            ("timeslot_misfit", "This event type can't be added at slot ${slot}."),
            ("event_validated", "validated"),
            ("event_discarded", "discarded"),
            ("action_null", "Nothing to do."),
            (
                "validate_events_done",
                "${validated} event(s) validated and ${discarded} discarded.",
            ),
            ("several_events", "Several events"),
            ("month_Jan", "January"),
            ("month_Feb", "February"),
            ("month_Mar", "March"),
            ("month_Apr", "April"),
            ("month_May", "May"),
            ("month_Jun", "June"),
            ("month_Jul", "July"),
            ("month_Aug", "August"),
            ("month_Sep", "September"),
            ("month_Oct", "October"),
            ("month_Nov", "November"),
            ("month_Dec", "December"),
            ("calendar_validation_subject", "Calendar validation"),
            (
                "calendar_validation_body",
                "Hello ${toUser},\n\n${fromUser} processed the following events:\n\n${details}",
            ),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { table }
    }
}

impl Labels {
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.table.insert(key.into(), text.into());
        self
    }
}

impl Translator for Labels {
    fn translate(&self, key: &str, mapping: &[(&str, &str)]) -> String {
        let mut text = self
            .table
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string());
        for (name, value) in mapping {
            text = text.replace(&format!("${{{name}}}"), value);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_placeholders() {
        let labels = Labels::default();
        assert_eq!(
            labels.translate("validate_events_done", &[("validated", "2"), ("discarded", "1")]),
            "2 event(s) validated and 1 discarded."
        );
    }

    #[test]
    fn unknown_label_is_its_own_id() {
        let labels = Labels::empty();
        assert_eq!(labels.translate("leave_event_sick", &[]), "leave_event_sick");
    }

    #[test]
    fn override_label() {
        let labels = Labels::default().with("event_validated", "accepted");
        assert_eq!(labels.translate("event_validated", &[]), "accepted");
    }
}
