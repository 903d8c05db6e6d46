use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value;

use crate::model::*;

use super::others::{project, Other, OtherEvent};
use super::{read, Engine, EngineError};

/// Background of a timeline cell hiding several events.
pub const SEVERAL_EVENTS_STYLE: &str = "background-image: url(angled.png)";

// ── Totals ───────────────────────────────────────────────

/// What a totals fold function sees for one (calendar, date) cell.
#[derive(Debug)]
pub struct TotalsCell<'a> {
    pub date: NaiveDate,
    pub other: &'a Other,
    pub events: &'a [Event],
    /// This is the last calendar (row totals) or the last date (column totals).
    pub last: bool,
    /// State of the validation checkbox of the cell in the current request.
    pub checked: Option<bool>,
}

pub type FoldFn = Arc<dyn Fn(&TotalsCell<'_>, &mut Value) + Send + Sync>;

/// Running accumulator over a timeline.
#[derive(Clone)]
pub struct Totals {
    pub name: String,
    pub label: String,
    pub init: Value,
    on_cell: FoldFn,
}

impl std::fmt::Debug for Totals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Totals")
            .field("name", &self.name)
            .field("init", &self.init)
            .finish_non_exhaustive()
    }
}

impl Totals {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        init: Value,
        on_cell: impl Fn(&TotalsCell<'_>, &mut Value) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            init,
            on_cell: Arc::new(on_cell),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalsKind {
    /// One holder per date, folded over every calendar.
    Rows,
    /// One holder per calendar, folded over every date.
    Cols,
}

// ── Layers ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContent {
    Text(String),
    /// A symbol with a tooltip.
    Symbol { symbol: String, title: String },
    /// A validation checkbox for every validable event of the cell.
    Checkbox { id: String },
}

/// Structured content of a timeline cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellInfo {
    pub style: Option<String>,
    pub title: Option<String>,
    pub content: Option<CellContent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendEntry {
    pub name: String,
    pub style: String,
    pub content: String,
}

pub type LayerFn = Arc<dyn Fn(NaiveDate, &Other, &[OtherEvent]) -> Option<CellInfo> + Send + Sync>;

/// Overlay that can take over a timeline cell when active.
#[derive(Clone)]
pub struct Layer {
    pub name: String,
    pub label: String,
    pub active_by_default: bool,
    pub legend: Vec<LegendEntry>,
    on_cell: LayerFn,
}

impl std::fmt::Debug for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("name", &self.name)
            .field("active_by_default", &self.active_by_default)
            .finish_non_exhaustive()
    }
}

impl Layer {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        on_cell: impl Fn(NaiveDate, &Other, &[OtherEvent]) -> Option<CellInfo> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            active_by_default: false,
            legend: Vec::new(),
            on_cell: Arc::new(on_cell),
        }
    }

    pub fn active_by_default(mut self) -> Self {
        self.active_by_default = true;
        self
    }

    pub fn with_legend(mut self, legend: Vec<LegendEntry>) -> Self {
        self.legend = legend;
        self
    }
}

/// Layer names from the request (`activeLayers=a,b`), or the default-active
/// layers when the request says nothing.
pub fn active_layers(layers: &[Layer], requested: Option<&str>) -> Vec<String> {
    match requested {
        Some(names) => names
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect(),
        None => layers
            .iter()
            .filter(|l| l.active_by_default)
            .map(|l| l.name.clone())
            .collect(),
    }
}

/// Checkbox ids from the request: `validated` ones are `true`, `discarded` ones `false`.
pub fn validation_checkbox_status(validated: &[String], discarded: &[String]) -> HashMap<String, bool> {
    let mut status = HashMap::new();
    for id in validated {
        status.insert(id.clone(), true);
    }
    for id in discarded {
        status.insert(id.clone(), false);
    }
    status
}

/// First answer from the active layers, most recently declared first.
fn layer_cell(
    layers: &[Layer],
    active: &[String],
    date: NaiveDate,
    other: &Other,
    events: &[OtherEvent],
) -> Option<CellInfo> {
    layers
        .iter()
        .rev()
        .filter(|l| active.contains(&l.name))
        .find_map(|l| (l.on_cell)(date, other, events))
}

impl Engine {
    /// Fold every configured totals of `kind` over the grid of `viewer`.
    /// Returns, per totals name, one holder per date (rows) or per calendar (cols).
    pub fn compute_totals(
        &self,
        viewer: &CalendarRef,
        kind: TotalsKind,
        grid: &[NaiveDate],
        status: &HashMap<String, bool>,
    ) -> Result<BTreeMap<String, Vec<Value>>, EngineError> {
        let (config, others) = self.snapshot(viewer)?;
        let all_totals = match kind {
            TotalsKind::Rows => &config.totals_rows,
            TotalsKind::Cols => &config.totals_cols,
        };
        let mut r = BTreeMap::new();
        if all_totals.is_empty() {
            return Ok(r);
        }
        let others: Vec<&Other> = others.iter().flatten().collect();
        let holders = match kind {
            TotalsKind::Rows => grid.len(),
            TotalsKind::Cols => others.len(),
        };
        for totals in all_totals {
            r.insert(totals.name.clone(), vec![totals.init.clone(); holders]);
        }

        for (i, other) in others.iter().enumerate() {
            let cal = self.resolve(&other.calendar)?;
            let guard = read(&cal);
            for (j, date) in grid.iter().enumerate() {
                let events = guard.store.events_at(*date).unwrap_or_default();
                let (holder, last) = match kind {
                    TotalsKind::Rows => (j, i + 1 == others.len()),
                    TotalsKind::Cols => (i, j + 1 == grid.len()),
                };
                let cell = TotalsCell {
                    date: *date,
                    other,
                    events,
                    last,
                    checked: status.get(&other.calendar.cell_id(*date)).copied(),
                };
                for totals in all_totals {
                    if let Some(value) = r.get_mut(&totals.name).and_then(|v| v.get_mut(holder)) {
                        (totals.on_cell)(&cell, value);
                    }
                }
            }
        }
        Ok(r)
    }

    /// Content of the timeline cell of `other` at `date` in `viewer`.
    pub fn timeline_cell(
        &self,
        viewer: &CalendarRef,
        other: &Other,
        date: NaiveDate,
        active: &[String],
        actor: &str,
    ) -> Result<CellInfo, EngineError> {
        let (config, _) = self.snapshot(viewer)?;
        let cal = self.resolve(&other.calendar)?;
        let guard = read(&cal);
        let events = project(
            &config,
            other,
            &guard.config,
            guard.store.events_at(date).unwrap_or_default(),
            self.translator.as_ref(),
        );

        if let Some(info) = layer_cell(&config.layers, active, date, other, &events) {
            return Ok(info);
        }

        let style = match events.as_slice() {
            [] => None,
            [single] => single.style(),
            _ => Some(SEVERAL_EVENTS_STYLE.to_string()),
        };
        let title = (events.len() > 1).then(|| {
            events
                .iter()
                .map(|e| format!("{} ({})", e.name, e.event.timeslot))
                .collect::<Vec<_>>()
                .join(", ")
        });

        let may_validate = config.validation().is_some() && self.guard.may_validate(viewer, actor);
        let content = if !events.is_empty() && may_validate {
            let schema = guard.config.validation().map(|v| &v.schema);
            let validable = events
                .iter()
                .any(|e| schema.is_some_and(|s| s.contains_key(&e.event.event_type)));
            validable.then(|| CellContent::Checkbox {
                id: other.calendar.cell_id(date),
            })
        } else if let [single] = events.as_slice() {
            single.symbol.as_ref().map(|symbol| CellContent::Symbol {
                symbol: symbol.clone(),
                title: single.name.clone(),
            })
        } else {
            None
        };

        Ok(CellInfo { style, title, content })
    }

    /// Legend of `viewer`'s timeline: one entry per color, the several-events
    /// entry, then entries contributed by active layers.
    pub fn legend_entries(&self, viewer: &CalendarRef, active: &[String]) -> Result<Vec<LegendEntry>, EngineError> {
        let (config, _) = self.snapshot(viewer)?;
        let catalog = self.all_events(viewer)?;
        let mut r: Vec<LegendEntry> = Vec::new();

        fn merge(r: &mut Vec<LegendEntry>, key: impl Fn(&LegendEntry) -> String, entry: LegendEntry) {
            let k = key(&entry);
            match r.iter_mut().find(|e| key(e) == k) {
                Some(existing) => existing.name = format!("{}, {}", existing.name, entry.name),
                None => r.push(entry),
            }
        }

        for (event_type, name) in &catalog.entries {
            let Some(color) = config.color_for(event_type) else { continue };
            let entry = LegendEntry {
                name: name.clone(),
                style: format!("background-color:{color}"),
                content: String::new(),
            };
            merge(&mut r, |e| format!("{}{}", e.content, e.style), entry);
        }
        r.push(LegendEntry {
            name: self.translator.translate("several_events", &[]),
            style: SEVERAL_EVENTS_STYLE.to_string(),
            content: String::new(),
        });
        for layer in config.layers.iter().filter(|l| active.contains(&l.name)) {
            for entry in &layer.legend {
                merge(&mut r, |e| format!("{}{}", e.content, e.style), entry.clone());
            }
        }
        if let Some(update) = &config.legend_update {
            update(&mut r);
        }
        Ok(r)
    }
}
