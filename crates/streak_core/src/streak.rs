//! Streak computations over a [`CompletionStore`].
//!
//! Every function walks backward from `today` and stops at the first day
//! that fails its predicate. Nothing is cached; callers recompute after each
//! change.

use crate::completions::CompletionStore;
use crate::date_key::DateKey;
use crate::model::TaskId;
use crate::registry::TaskRegistry;
use std::collections::BTreeMap;

/// Upper bound on any backward walk, roughly ten years of days.
pub const MAX_STREAK_DAYS: u32 = 3660;

/// Consecutive days ending at `today` on which `task_id` was completed.
pub fn streak_for(store: &CompletionStore, task_id: TaskId, today: DateKey) -> u32 {
    walk_back(today, |date| store.is_completed(date, task_id))
}

/// Consecutive days ending at `today` on which anything was completed.
pub fn streak_any(store: &CompletionStore, today: DateKey) -> u32 {
    walk_back(today, |date| !store.is_day_empty(date))
}

/// Number of registered tasks with a positive streak.
pub fn active_streak_count(
    store: &CompletionStore,
    registry: &TaskRegistry,
    today: DateKey,
) -> usize {
    registry
        .iter()
        .filter(|task| streak_for(store, task.id, today) > 0)
        .count()
}

/// Streak of every registered task, keyed by id.
pub fn task_streaks(
    store: &CompletionStore,
    registry: &TaskRegistry,
    today: DateKey,
) -> BTreeMap<TaskId, u32> {
    registry
        .iter()
        .map(|task| (task.id, streak_for(store, task.id, today)))
        .collect()
}

fn walk_back<F>(today: DateKey, mut completed: F) -> u32
where
    F: FnMut(DateKey) -> bool,
{
    let mut count = 0;
    let mut cursor = Some(today);

    while let Some(date) = cursor {
        if count >= MAX_STREAK_DAYS || !completed(date) {
            break;
        }
        count += 1;
        cursor = date.previous();
    }

    count
}
