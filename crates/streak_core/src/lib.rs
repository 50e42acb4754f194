//! Habit streak tracking: tasks, the days they were completed on, and the
//! streaks derived from those days.

pub mod calendar;
pub mod completions;
pub mod config;
pub mod date_key;
pub mod error;
pub mod model;
pub mod notify;
pub mod registry;
pub mod storage;
pub mod streak;
pub mod tracker;

pub use date_key::DateKey;
pub use error::AppError;
pub use model::{Priority, Task, TaskColor, TaskEdit, TaskId};
pub use tracker::Tracker;
