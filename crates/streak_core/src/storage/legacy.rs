//! Name-keyed data written by earlier releases.
//!
//! Those releases stored tasks as bare strings and completions as
//! `date -> [task name]`; the single-streak calendar stored a flat list of
//! `streakDates`. [`LegacyState`] holds that shape until [`LegacyState::migrate`]
//! turns it into id-based tasks.

use crate::completions::CompletionStore;
use crate::date_key::DateKey;
use crate::error::AppError;
use crate::model::{Priority, Task, TaskId};
use crate::registry::TaskRegistry;
use crate::storage::TrackerState;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, warn};

/// Name given to the task that receives single-streak calendar days.
pub const STREAK_DAYS_TASK_NAME: &str = "Daily streak";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyState {
    pub tasks: Vec<String>,
    pub completions: BTreeMap<DateKey, Vec<String>>,
}

impl LegacyState {
    /// Builds from raw stored values. Unparseable dates are skipped, and
    /// `streak_dates` become completions of [`STREAK_DAYS_TASK_NAME`].
    pub fn from_raw(
        tasks: Vec<String>,
        completions: BTreeMap<String, Vec<String>>,
        streak_dates: Vec<String>,
    ) -> Self {
        let mut state = Self::default();
        for name in tasks {
            let name = name.trim();
            if !name.is_empty() && !state.tasks.iter().any(|known| known == name) {
                state.tasks.push(name.to_string());
            }
        }

        for (raw_date, names) in completions {
            let Some(date) = parse_date(&raw_date) else {
                continue;
            };
            state.completions.entry(date).or_default().extend(names);
        }

        if !streak_dates.is_empty() {
            if !state.tasks.iter().any(|name| name == STREAK_DAYS_TASK_NAME) {
                state.tasks.push(STREAK_DAYS_TASK_NAME.to_string());
            }
            for raw_date in streak_dates {
                if let Some(date) = parse_date(&raw_date) {
                    state
                        .completions
                        .entry(date)
                        .or_default()
                        .push(STREAK_DAYS_TASK_NAME.to_string());
                }
            }
        }

        state
    }

    /// Renames by string equality, rewriting every completion that matched
    /// the old name. Renaming onto an existing name merges the two tasks'
    /// histories; id-based tasks do not have this behavior.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<(), AppError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::validation("task name is required"));
        }
        let index = self
            .tasks
            .iter()
            .position(|name| name == old_name)
            .ok_or_else(|| AppError::not_found(format!("task '{old_name}' not found")))?;
        if new_name == old_name {
            return Ok(());
        }

        if self.tasks.iter().any(|name| name == new_name) {
            self.tasks.remove(index);
        } else {
            self.tasks[index] = new_name.to_string();
        }

        for names in self.completions.values_mut() {
            for name in names.iter_mut() {
                if name == old_name {
                    *name = new_name.to_string();
                }
            }
            let mut seen = BTreeSet::new();
            names.retain(|name| seen.insert(name.clone()));
        }
        Ok(())
    }

    /// Gives every task name its [`TaskId::for_legacy_name`] id and rewrites
    /// completions to reference ids. Completions naming an unknown task are
    /// dropped.
    pub fn migrate(self) -> TrackerState {
        let mut ids: HashMap<String, TaskId> = HashMap::new();
        let tasks: Vec<Task> = self
            .tasks
            .into_iter()
            .map(|name| {
                let id = TaskId::for_legacy_name(&name);
                ids.insert(name.clone(), id);
                Task {
                    id,
                    name,
                    color: None,
                    priority: Priority::default(),
                }
            })
            .collect();

        let mut dropped = 0usize;
        let days = self.completions.into_iter().map(|(date, names)| {
            let completed: BTreeSet<TaskId> = names
                .iter()
                .filter_map(|name| {
                    let id = ids.get(name.trim()).copied();
                    if id.is_none() {
                        dropped += 1;
                    }
                    id
                })
                .collect();
            (date, completed)
        });
        let completions = CompletionStore::from_days(days.collect::<Vec<_>>());

        if dropped > 0 {
            warn!(dropped, "legacy completions referenced unknown tasks");
        }
        info!(
            tasks = tasks.len(),
            days = completions.len(),
            "migrated name-keyed state"
        );

        TrackerState {
            registry: TaskRegistry::from_tasks(tasks),
            completions,
        }
    }
}

/// Folds single-streak calendar days stored next to id-keyed tasks into the
/// [`STREAK_DAYS_TASK_NAME`] task, creating it when missing.
pub fn fold_streak_dates(state: &mut TrackerState, streak_dates: Vec<String>) {
    let dates: Vec<DateKey> = streak_dates.iter().filter_map(|raw| parse_date(raw)).collect();
    if dates.is_empty() {
        return;
    }

    let existing = state
        .registry
        .iter()
        .find(|task| task.name == STREAK_DAYS_TASK_NAME)
        .map(|task| task.id);
    let id = match existing {
        Some(id) => id,
        None => {
            let task = Task {
                id: TaskId::for_legacy_name(STREAK_DAYS_TASK_NAME),
                name: STREAK_DAYS_TASK_NAME.to_string(),
                color: None,
                priority: Priority::default(),
            };
            let id = task.id;
            let mut tasks = state.registry.tasks().to_vec();
            tasks.push(task);
            state.registry = TaskRegistry::from_tasks(tasks);
            id
        }
    };

    for date in &dates {
        state.completions.mark_done(*date, id);
    }
    info!(days = dates.len(), "folded streak dates into task");
}

fn parse_date(raw: &str) -> Option<DateKey> {
    match DateKey::parse(raw) {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(date = raw, "skipping unparseable date key");
            None
        }
    }
}
