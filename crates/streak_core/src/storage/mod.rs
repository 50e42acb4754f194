pub mod json_store;
pub mod legacy;

use crate::completions::CompletionStore;
use crate::error::AppError;
use crate::registry::TaskRegistry;
use std::cell::{Cell, RefCell};
use tracing::warn;

pub use json_store::JsonFileStore;

/// Everything that is persisted: the tasks and their completion days.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerState {
    pub registry: TaskRegistry,
    pub completions: CompletionStore,
}

/// Durable storage the tracker reads at startup and writes after every
/// mutation.
pub trait StateStore {
    fn load(&self) -> Result<TrackerState, AppError>;

    fn save(&self, state: &TrackerState) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct StateLoad {
    pub state: TrackerState,
    pub error: Option<AppError>,
}

/// Loads state, substituting an empty state when the stored data is
/// unreadable. The failure is kept on the result for the caller to report.
pub fn load_with_fallback(store: &dyn StateStore) -> StateLoad {
    match store.load() {
        Ok(state) => StateLoad { state, error: None },
        Err(err) => {
            warn!(error = %err, "stored state unreadable, starting empty");
            StateLoad {
                state: TrackerState::default(),
                error: Some(err),
            }
        }
    }
}

/// Non-durable store for hosts that do not persist, and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<TrackerState>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: TrackerState) -> Self {
        Self {
            state: RefCell::new(state),
            saves: Cell::new(0),
        }
    }

    pub fn snapshot(&self) -> TrackerState {
        self.state.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<TrackerState, AppError> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &TrackerState) -> Result<(), AppError> {
        *self.state.borrow_mut() = state.clone();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

impl<S: StateStore + ?Sized> StateStore for std::rc::Rc<S> {
    fn load(&self) -> Result<TrackerState, AppError> {
        (**self).load()
    }

    fn save(&self, state: &TrackerState) -> Result<(), AppError> {
        (**self).save(state)
    }
}
