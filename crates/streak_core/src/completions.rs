use crate::date_key::DateKey;
use crate::model::TaskId;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Which tasks were completed on which day.
///
/// A day is present only while at least one task is completed on it; the
/// operations here remove a day as soon as its set empties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompletionStore {
    days: BTreeMap<DateKey, BTreeSet<TaskId>>,
}

impl CompletionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from raw entries, dropping days with no tasks.
    pub fn from_days<I>(days: I) -> Self
    where
        I: IntoIterator<Item = (DateKey, BTreeSet<TaskId>)>,
    {
        let days = days
            .into_iter()
            .filter(|(_, completed)| !completed.is_empty())
            .collect();
        Self { days }
    }

    /// Drops days whose set is empty.
    pub fn normalized(mut self) -> Self {
        self.days.retain(|_, completed| !completed.is_empty());
        self
    }

    /// Flips `task_id` on `date` and returns whether it is now completed.
    pub fn toggle(&mut self, date: DateKey, task_id: TaskId) -> bool {
        let done = !self.is_completed(date, task_id);
        self.set_completed(date, task_id, done);
        done
    }

    pub fn set_completed(&mut self, date: DateKey, task_id: TaskId, done: bool) {
        if done {
            self.days.entry(date).or_default().insert(task_id);
        } else if let Some(completed) = self.days.get_mut(&date) {
            completed.remove(&task_id);
            if completed.is_empty() {
                self.days.remove(&date);
            }
        }
        debug!(%date, %task_id, done, "completion set");
    }

    /// Marks done without ever un-marking.
    pub fn mark_done(&mut self, date: DateKey, task_id: TaskId) {
        self.set_completed(date, task_id, true);
    }

    pub fn is_completed(&self, date: DateKey, task_id: TaskId) -> bool {
        self.days
            .get(&date)
            .is_some_and(|completed| completed.contains(&task_id))
    }

    pub fn completed_on(&self, date: DateKey) -> Option<&BTreeSet<TaskId>> {
        self.days.get(&date)
    }

    pub fn is_day_empty(&self, date: DateKey) -> bool {
        !self.days.contains_key(&date)
    }

    /// All-or-nothing day toggle: a day with any completion is cleared,
    /// an empty day is filled with every id in `all_task_ids`.
    pub fn bulk_toggle_all(&mut self, date: DateKey, all_task_ids: &[TaskId]) {
        if self.days.remove(&date).is_some() {
            debug!(%date, "day cleared");
            return;
        }

        let filled: BTreeSet<TaskId> = all_task_ids.iter().copied().collect();
        if !filled.is_empty() {
            debug!(%date, count = filled.len(), "day filled");
            self.days.insert(date, filled);
        }
    }

    /// Removes `task_id` from every day and returns how many days held it.
    pub fn remove_task(&mut self, task_id: TaskId) -> usize {
        let mut touched = 0;
        self.days.retain(|_, completed| {
            if completed.remove(&task_id) {
                touched += 1;
            }
            !completed.is_empty()
        });
        touched
    }

    pub fn days(&self) -> impl Iterator<Item = (DateKey, &BTreeSet<TaskId>)> {
        self.days.iter().map(|(date, completed)| (*date, completed))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl<'de> Deserialize<'de> for CompletionStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let days = BTreeMap::<DateKey, BTreeSet<TaskId>>::deserialize(deserializer)?;
        Ok(Self { days }.normalized())
    }
}
