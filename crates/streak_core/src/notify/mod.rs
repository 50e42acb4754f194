//! In-process "streak updated" broadcast.
//!
//! The bus is created by the host and handed to the tracker. Listeners stay
//! registered until their [`Subscription`] is dropped.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use tracing::warn;

pub const STREAK_UPDATED: &str = "streak_updated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreakEvent {
    StreakCount {
        #[serde(rename = "streakCount")]
        streak_count: u32,
    },
    TaskStreaks {
        #[serde(rename = "taskStreaks")]
        task_streaks: BTreeMap<String, u32>,
    },
}

impl StreakEvent {
    /// Number shown next to the flame in the status bar.
    pub fn badge_count(&self) -> usize {
        match self {
            Self::StreakCount { streak_count } => *streak_count as usize,
            Self::TaskStreaks { task_streaks } => {
                task_streaks.values().filter(|count| **count > 0).count()
            }
        }
    }
}

pub fn badge_label(count: usize) -> String {
    format!("🔥 {count}")
}

pub trait Listener {
    fn streak_updated(&self, event: &StreakEvent) -> Result<(), AppError>;
}

impl<F> Listener for F
where
    F: Fn(&StreakEvent) -> Result<(), AppError>,
{
    fn streak_updated(&self, event: &StreakEvent) -> Result<(), AppError> {
        self(event)
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Rc<dyn Listener>)>,
}

#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Rc<RefCell<Listeners>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "the listener is removed when the subscription is dropped"]
    pub fn subscribe<L>(&self, listener: L) -> Subscription
    where
        L: Listener + 'static,
    {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        let listener: Rc<dyn Listener> = Rc::new(listener);
        listeners.entries.push((id, listener));

        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    /// Delivers `event` to every current listener. A failing listener is
    /// logged and skipped; the returned count is the number that succeeded.
    pub fn publish(&self, event: &StreakEvent) -> usize {
        // Snapshot so listeners may subscribe or unsubscribe while handling.
        let snapshot: Vec<Rc<dyn Listener>> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        let mut delivered = 0;
        for listener in snapshot {
            match listener.streak_updated(event) {
                Ok(()) => delivered += 1,
                Err(err) => warn!(topic = STREAK_UPDATED, error = %err, "listener failed"),
            }
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners
                .borrow_mut()
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}
