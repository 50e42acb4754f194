//! The entry point hosts talk to.
//!
//! Every mutating call validates, applies the change to a copy of the state,
//! persists it, swaps it in, and then broadcasts fresh streak counts. A call
//! that fails at any step leaves the tracker exactly as it was.

use crate::calendar::{MonthCursor, MonthView};
use crate::completions::CompletionStore;
use crate::config::StreakMode;
use crate::date_key::{Clock, DateKey};
use crate::error::AppError;
use crate::model::{Priority, Task, TaskColor, TaskEdit, TaskId};
use crate::notify::{EventBus, StreakEvent};
use crate::storage::{StateStore, TrackerState, load_with_fallback};
use crate::streak;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

pub struct Tracker {
    state: TrackerState,
    store: Box<dyn StateStore>,
    clock: Box<dyn Clock>,
    bus: EventBus,
    mode: StreakMode,
    load_error: Option<AppError>,
}

impl Tracker {
    /// Loads from `store` (an unreadable store yields an empty tracker) and
    /// publishes the initial counts.
    pub fn open(
        store: Box<dyn StateStore>,
        clock: Box<dyn Clock>,
        bus: EventBus,
        mode: StreakMode,
    ) -> Self {
        let loaded = load_with_fallback(store.as_ref());
        info!(
            tasks = loaded.state.registry.len(),
            days = loaded.state.completions.len(),
            %mode,
            "tracker opened"
        );

        let tracker = Self {
            state: loaded.state,
            store,
            clock,
            bus,
            mode,
            load_error: loaded.error,
        };
        tracker.publish();
        tracker
    }

    /// Why the stored state was discarded at open, if it was.
    pub fn load_error(&self) -> Option<&AppError> {
        self.load_error.as_ref()
    }

    pub fn mode(&self) -> StreakMode {
        self.mode
    }

    /// Switches the streak definition used by later reads and publishes.
    pub fn set_mode(&mut self, mode: StreakMode) {
        self.mode = mode;
    }

    pub fn today(&self) -> DateKey {
        self.clock.today()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn add_task(
        &mut self,
        name: &str,
        priority: Priority,
        color: Option<TaskColor>,
    ) -> Result<Task, AppError> {
        self.mutate(|state| state.registry.add(name, priority, color))
    }

    pub fn rename_task(&mut self, id: TaskId, new_name: &str) -> Result<Task, AppError> {
        self.mutate(|state| state.registry.rename(id, new_name))
    }

    pub fn edit_task(&mut self, id: TaskId, edit: TaskEdit) -> Result<Task, AppError> {
        if edit.is_empty() {
            return Err(AppError::validation("nothing to change"));
        }
        self.mutate(|state| state.registry.edit(id, edit))
    }

    /// Removes the task and its id from every completion day.
    pub fn delete_task(&mut self, id: TaskId) -> Result<Task, AppError> {
        self.mutate(|state| {
            let removed = state.registry.remove(id)?;
            let days = state.completions.remove_task(id);
            debug!(task_id = %id, days, "task deleted");
            Ok(removed)
        })
    }

    /// Flips completion of `id` on `date`; returns the new value.
    pub fn toggle_completion(&mut self, date: DateKey, id: TaskId) -> Result<bool, AppError> {
        self.mutate(|state| {
            ensure_task(state, id)?;
            Ok(state.completions.toggle(date, id))
        })
    }

    pub fn set_completion(
        &mut self,
        date: DateKey,
        id: TaskId,
        done: bool,
    ) -> Result<(), AppError> {
        self.mutate(|state| {
            ensure_task(state, id)?;
            state.completions.set_completed(date, id, done);
            Ok(())
        })
    }

    pub fn mark_done_today(&mut self, id: TaskId) -> Result<(), AppError> {
        let today = self.today();
        self.mutate(|state| {
            ensure_task(state, id)?;
            state.completions.mark_done(today, id);
            Ok(())
        })
    }

    /// Clears `date` if anything is completed on it, otherwise completes
    /// every task on it.
    pub fn toggle_all_on_date(&mut self, date: DateKey) -> Result<(), AppError> {
        self.mutate(|state| {
            let ids = state.registry.ids();
            state.completions.bulk_toggle_all(date, &ids);
            Ok(())
        })
    }

    pub fn tasks(&self) -> &[Task] {
        self.state.registry.tasks()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.state.registry.get(id)
    }

    pub fn completions(&self) -> &CompletionStore {
        &self.state.completions
    }

    pub fn is_completed(&self, date: DateKey, id: TaskId) -> bool {
        self.state.completions.is_completed(date, id)
    }

    pub fn completed_on(&self, date: DateKey) -> Option<&BTreeSet<TaskId>> {
        self.state.completions.completed_on(date)
    }

    pub fn streak_for(&self, id: TaskId) -> u32 {
        streak::streak_for(&self.state.completions, id, self.today())
    }

    pub fn streak_any(&self) -> u32 {
        streak::streak_any(&self.state.completions, self.today())
    }

    pub fn active_streak_count(&self) -> usize {
        streak::active_streak_count(&self.state.completions, &self.state.registry, self.today())
    }

    pub fn task_streaks(&self) -> BTreeMap<TaskId, u32> {
        streak::task_streaks(&self.state.completions, &self.state.registry, self.today())
    }

    /// The payload published for the configured streak mode.
    pub fn current_event(&self) -> StreakEvent {
        match self.mode {
            StreakMode::PerTask => StreakEvent::TaskStreaks {
                task_streaks: self
                    .task_streaks()
                    .into_iter()
                    .map(|(id, count)| (id.to_string(), count))
                    .collect(),
            },
            StreakMode::Any => StreakEvent::StreakCount {
                streak_count: self.streak_any(),
            },
        }
    }

    pub fn badge(&self) -> usize {
        match self.mode {
            StreakMode::PerTask => self.active_streak_count(),
            StreakMode::Any => self.streak_any() as usize,
        }
    }

    pub fn month_view(&self, cursor: MonthCursor) -> MonthView {
        MonthView::build(cursor, &self.state.completions, self.today())
    }

    pub fn current_month(&self) -> MonthCursor {
        MonthCursor::containing(self.today())
    }

    fn mutate<T, F>(&mut self, change: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut TrackerState) -> Result<T, AppError>,
    {
        let mut next = self.state.clone();
        let value = change(&mut next)?;
        self.store.save(&next)?;
        self.state = next;
        self.publish();
        Ok(value)
    }

    fn publish(&self) {
        let event = self.current_event();
        let delivered = self.bus.publish(&event);
        debug!(delivered, badge = event.badge_count(), "streaks published");
    }
}

fn ensure_task(state: &TrackerState, id: TaskId) -> Result<(), AppError> {
    if state.registry.contains(id) {
        Ok(())
    } else {
        Err(AppError::not_found(format!("task {id} not found")))
    }
}
