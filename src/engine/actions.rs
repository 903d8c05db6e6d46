use std::sync::Arc;

use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::*;

use super::{Engine, EngineError};

pub type ShowFn = Arc<dyn Fn(NaiveDate) -> bool + Send + Sync>;
/// Receives the selected cells and the user's comment; may answer with a message.
pub type ActionFn = Arc<dyn Fn(&[(Ulid, NaiveDate)], Option<&str>) -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub enum Visibility {
    Always,
    Never,
    /// Decided from the first day of the displayed month.
    Computed(ShowFn),
}

/// Custom operation run on a selection of timeline cells.
#[derive(Clone)]
pub struct Action {
    pub name: String,
    pub label: String,
    pub show: Visibility,
    run: ActionFn,
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Action {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        run: impl Fn(&[(Ulid, NaiveDate)], Option<&str>) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            show: Visibility::Always,
            run: Arc::new(run),
        }
    }

    pub fn shown(mut self, show: Visibility) -> Self {
        self.show = show;
        self
    }

    pub fn is_visible(&self, month: NaiveDate) -> bool {
        match &self.show {
            Visibility::Always => true,
            Visibility::Never => false,
            Visibility::Computed(f) => f(first_of_month(month)),
        }
    }
}

/// Parse a comma-separated selection of `<objectId>_<YYYYMMDD>` cells.
pub fn parse_selection(selected: &str) -> Result<Vec<(Ulid, NaiveDate)>, EngineError> {
    selected
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|cell| {
            let bad = || EngineError::BadKey(cell.to_string());
            let (id, date) = cell.split_once('_').ok_or_else(bad)?;
            let id = Ulid::from_string(id).map_err(|_| bad())?;
            let date = parse_date_key(date).ok_or_else(bad)?;
            Ok((id, date))
        })
        .collect()
}

impl Engine {
    /// Names of the actions shown for the month starting at `month`.
    pub fn visible_actions(&self, calendar: &CalendarRef, month: NaiveDate) -> Result<Vec<String>, EngineError> {
        let (config, _) = self.snapshot(calendar)?;
        Ok(config
            .actions
            .iter()
            .filter(|a| a.is_visible(month))
            .map(|a| a.name.clone())
            .collect())
    }

    pub fn execute_action(
        &self,
        calendar: &CalendarRef,
        name: &str,
        month: NaiveDate,
        selected: &[(Ulid, NaiveDate)],
        comment: Option<&str>,
    ) -> Result<Option<String>, EngineError> {
        let (config, _) = self.snapshot(calendar)?;
        let action = config
            .actions
            .iter()
            .find(|a| a.name == name && a.is_visible(month))
            .ok_or_else(|| EngineError::ActionNotFound(name.to_string()))?;
        tracing::info!(calendar = %calendar, action = name, cells = selected.len(), "executing action");
        Ok((action.run)(selected, comment))
    }
}
